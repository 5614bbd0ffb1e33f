//! Filter and ordering descriptions shared by both record mappers.

use super::column::TableDescriptor;
use crate::error::{Error, Result};
use crate::value::DbValue;
use std::fmt;

/// One predicate of a [`Filters`] conjunction
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Raw SQL fragment, inserted verbatim and never parameterized
    Raw(String),
    /// `column = value`; `Null` means "is null"
    Value {
        /// Column name
        column: String,
        /// Expected value
        value: DbValue,
    },
    /// `column in (values...)`
    In {
        /// Column name
        column: String,
        /// Accepted values
        values: Vec<DbValue>,
    },
}

impl Filter {
    /// Column the predicate applies to; `None` for raw fragments
    #[must_use]
    pub fn column(&self) -> Option<&str> {
        match self {
            Self::Raw(_) => None,
            Self::Value { column, .. } | Self::In { column, .. } => Some(column),
        }
    }

    /// Evaluate against one value in memory
    ///
    /// A raw fragment cannot be evaluated and never matches.
    #[must_use]
    pub fn accepts(&self, field: &DbValue) -> bool {
        match self {
            Self::Raw(_) => false,
            Self::Value { value, .. } => field.matches(value),
            Self::In { values, .. } => values.iter().any(|v| field.matches(v)),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw(fragment) => f.write_str(fragment),
            Self::Value { column, value } if value.is_null() => write!(f, "{column} is null"),
            Self::Value { column, value } => write!(f, "{column} = {value:?}"),
            Self::In { column, values } => write!(f, "{column} in {values:?}"),
        }
    }
}

/// Conjunction of predicates passed to `list` / `first`
///
/// ```ignore
/// let filters = Filters::new().eq("status", "active").is_in("id", [1, 2, 3]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters {
    filters: Vec<Filter>,
}

impl Filters {
    /// No predicate: every row matches
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `column = value`; passing a null value yields `column is null`
    #[must_use]
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<DbValue>) -> Self {
        self.filters.push(Filter::Value {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    /// `column is null`
    #[must_use]
    pub fn is_null(self, column: impl Into<String>) -> Self {
        self.eq(column, DbValue::Null)
    }

    /// `column in (...)`
    #[must_use]
    pub fn is_in<V, I>(mut self, column: impl Into<String>, values: I) -> Self
    where
        V: Into<DbValue>,
        I: IntoIterator<Item = V>,
    {
        self.filters.push(Filter::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Append a raw SQL fragment
    ///
    /// The fragment is concatenated into the statement as-is. Never build it
    /// from user input. File-backed stores reject it.
    #[must_use]
    pub fn raw_unchecked(mut self, fragment: impl Into<String>) -> Self {
        self.filters.push(Filter::Raw(fragment.into()));
        self
    }

    /// Predicates in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.filters.iter()
    }

    /// Check for the empty conjunction
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Check that every named column is declared by the table
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownColumn` on the first undeclared column.
    pub fn check_columns(&self, table: &TableDescriptor) -> Result<()> {
        for column in self.filters.iter().filter_map(Filter::column) {
            if table.index_of(column).is_none() {
                return Err(Error::unknown_column(table.qualified_name(), column));
            }
        }
        Ok(())
    }
}

impl FromIterator<Filter> for Filters {
    fn from_iter<T: IntoIterator<Item = Filter>>(iter: T) -> Self {
        Self {
            filters: iter.into_iter().collect(),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    /// Ascending
    #[default]
    Asc,
    /// Descending
    Desc,
}

impl Direction {
    /// SQL keyword
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// One `column direction` entry of an ordering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Column to sort on
    pub column: String,
    /// Sort direction
    pub direction: Direction,
}

impl Order {
    /// Ascending on `column`
    #[must_use]
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Asc,
        }
    }

    /// Descending on `column`
    #[must_use]
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Desc,
        }
    }

    /// Parse a `"column [asc|desc]"` fragment
    ///
    /// Returns `None` for an empty fragment or an unknown direction keyword.
    #[must_use]
    pub fn parse(fragment: &str) -> Option<Self> {
        let mut parts = fragment.split_whitespace();
        let column = parts.next()?;
        let direction = match parts.next().map(str::to_ascii_lowercase).as_deref() {
            None | Some("asc") => Direction::Asc,
            Some("desc") => Direction::Desc,
            Some(_) => return None,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            column: column.to_string(),
            direction,
        })
    }
}

/// Check that every ordering column is declared by the table
///
/// # Errors
///
/// Returns `Error::UnknownColumn` on the first undeclared column.
pub fn check_order(order: &[Order], table: &TableDescriptor) -> Result<()> {
    for entry in order {
        if table.index_of(&entry.column).is_none() {
            return Err(Error::unknown_column(table.qualified_name(), &entry.column));
        }
    }
    Ok(())
}
