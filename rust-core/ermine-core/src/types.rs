//! # Path Parameter Types
//!
//! Typed path parameters: `{id:int}` in a route pattern converts the matched
//! segment to a [`DbValue::Int`] before the controller sees it, so it can go
//! straight into a filter.

use crate::error::{Error, Result};
use crate::value::DbValue;
use std::fmt;

/// Conversion applied to a matched path segment
///
/// Untyped parameters stay text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParamType {
    /// Segment kept as text
    #[default]
    String,
    /// `int`, `integer`, `i64`
    Int,
    /// `float`, `f64`, `number`
    Float,
    /// `bool`, `boolean`: `true`/`false`, `1`/`0`, `yes`/`no`
    Bool,
}

impl ParamType {
    /// Type named after the colon of `{name:type}`; unknown names are text
    #[must_use]
    pub fn from_annotation(annotation: &str) -> Self {
        match annotation.to_ascii_lowercase().as_str() {
            "int" | "integer" | "i64" => Self::Int,
            "float" | "f64" | "number" => Self::Float,
            "bool" | "boolean" => Self::Bool,
            _ => Self::String,
        }
    }

    /// Short name used in route patterns and error messages
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
        }
    }

    /// Convert a matched segment to a typed value
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidParameter` if the segment does not parse.
    pub fn convert(self, name: &str, raw: &str) -> Result<DbValue> {
        let converted = match self {
            Self::String => Some(DbValue::String(raw.to_string())),
            Self::Int => raw.parse().ok().map(DbValue::Int),
            Self::Float => raw.parse().ok().map(DbValue::Float),
            Self::Bool => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Some(DbValue::Bool(true)),
                "false" | "0" | "no" => Some(DbValue::Bool(false)),
                _ => None,
            },
        };

        converted.ok_or_else(|| Error::InvalidParameter {
            name: name.to_string(),
            value: raw.to_string(),
            expected: self.as_str(),
        })
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `{name}`, `{name:type}` or `{*name}` segment of a route pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathParam {
    /// Parameter name
    pub name: String,
    /// Conversion of the matched value
    pub kind: ParamType,
    /// Whether the parameter swallows the rest of the path
    pub catch_all: bool,
}

impl PathParam {
    /// Parameter declared by a pattern segment; `None` for literal segments
    #[must_use]
    pub fn parse(segment: &str) -> Option<Self> {
        let inner = segment.strip_prefix('{')?.strip_suffix('}')?;
        let (inner, catch_all) = match inner.strip_prefix('*') {
            Some(rest) => (rest, true),
            None => (inner, false),
        };
        let (name, kind) = inner
            .split_once(':')
            .map_or((inner, ParamType::String), |(name, annotation)| {
                (name, ParamType::from_annotation(annotation))
            });

        Some(Self {
            name: name.to_string(),
            kind,
            catch_all,
        })
    }

    /// The segment as matchit expects it, type annotation removed
    #[must_use]
    pub fn matcher_segment(&self) -> String {
        if self.catch_all {
            format!("{{*{}}}", self.name)
        } else {
            format!("{{{}}}", self.name)
        }
    }
}
