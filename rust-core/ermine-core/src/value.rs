//! # Column Values
//!
//! `DbValue` is the single scalar type flowing through both record mappers,
//! the JSON file store and typed route parameters.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A column value as read from, or written to, a storage backend
///
/// Serializes untagged, so a JSON store row looks like
/// `{"id": 1, "name": "Ada", "active": true, "email": null}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DbValue {
    /// Null value
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Float value
    Float(f64),
    /// String value
    String(String),
    /// Binary data
    Bytes(Vec<u8>),
}

impl DbValue {
    /// Check for `Null`
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get as i64 if Int variant
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64; integers widen
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get as bool; MySQL `tinyint(1)` comes back as 0/1
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int(0) => Some(false),
            Self::Int(1) => Some(true),
            _ => None,
        }
    }

    /// Borrow as str if String variant
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Render the value as a JSON store key (`"12"`, `"abc"`)
    ///
    /// Returns `None` for values that cannot identify a record.
    #[must_use]
    pub fn as_key(&self) -> Option<String> {
        match self {
            Self::Int(i) => Some(i.to_string()),
            Self::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Int(_) | Self::Float(_) => 2,
            Self::String(_) => 3,
            Self::Bytes(_) => 4,
        }
    }

    /// Total ordering used by in-memory sorting
    ///
    /// Null < Bool < numbers < String < Bytes. Int and Float compare
    /// numerically; NaN sorts as equal.
    #[must_use]
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::String(a), Self::String(b)) => a.cmp(b),
            (Self::Bytes(a), Self::Bytes(b)) => a.cmp(b),
            (a, b) if a.rank() == 2 && b.rank() == 2 => a
                .as_float()
                .partial_cmp(&b.as_float())
                .unwrap_or(Ordering::Equal),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }

    /// Loose equality used by in-memory filtering
    ///
    /// `Int(1)` matches `Float(1.0)`; everything else compares by variant.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(_) | Self::Float(_), Self::Int(_) | Self::Float(_)) => {
                self.sort_cmp(other) == Ordering::Equal
            }
            _ => self == other,
        }
    }
}

impl fmt::Display for DbValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => f.write_str(s),
            Self::Bytes(b) => f.write_str(&String::from_utf8_lossy(b)),
        }
    }
}

impl From<i64> for DbValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for DbValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for DbValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for DbValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<String> for DbValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for DbValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<Vec<u8>> for DbValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl<T: Into<Self>> From<Option<T>> for DbValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape_is_untagged() {
        let row = vec![
            DbValue::Int(1),
            DbValue::String("Ada".into()),
            DbValue::Bool(true),
            DbValue::Null,
            DbValue::Float(2.5),
        ];
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"[1,"Ada",true,null,2.5]"#);

        let back: Vec<DbValue> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn test_sort_cmp_orders_across_variants() {
        let mut values = vec![
            DbValue::String("b".into()),
            DbValue::Float(1.5),
            DbValue::Null,
            DbValue::Int(2),
            DbValue::Bool(false),
            DbValue::Int(1),
        ];
        values.sort_by(DbValue::sort_cmp);
        assert_eq!(
            values,
            vec![
                DbValue::Null,
                DbValue::Bool(false),
                DbValue::Int(1),
                DbValue::Float(1.5),
                DbValue::Int(2),
                DbValue::String("b".into()),
            ]
        );
    }

    #[test]
    fn test_matches_numeric_across_variants() {
        assert!(DbValue::Int(3).matches(&DbValue::Float(3.0)));
        assert!(!DbValue::Int(3).matches(&DbValue::String("3".into())));
        assert!(DbValue::Null.matches(&DbValue::Null));
    }

    #[test]
    fn test_as_key() {
        assert_eq!(DbValue::Int(7).as_key(), Some("7".to_string()));
        assert_eq!(DbValue::String("abc".into()).as_key(), Some("abc".to_string()));
        assert_eq!(DbValue::Null.as_key(), None);
        assert_eq!(DbValue::String(String::new()).as_key(), None);
    }

    #[test]
    fn test_from_option() {
        assert_eq!(DbValue::from(None::<i64>), DbValue::Null);
        assert_eq!(DbValue::from(Some("x")), DbValue::String("x".into()));
    }

    #[test]
    fn test_tinyint_as_bool() {
        assert_eq!(DbValue::Int(1).as_bool(), Some(true));
        assert_eq!(DbValue::Int(0).as_bool(), Some(false));
        assert_eq!(DbValue::Int(2).as_bool(), None);
    }
}
