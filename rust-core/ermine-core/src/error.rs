//! # Error Handling
//!
//! Centralized error types for Ermine core.
//! Uses `thiserror` for ergonomic error definitions.
//!
//! A lookup that finds nothing is not an error: `first`, `instantiate` and
//! `foreign_key` return `Option`.

use crate::validation::ValidationErrors;
use thiserror::Error;

/// Result type alias for Ermine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the Ermine runtime
#[derive(Error, Debug)]
pub enum Error {
    /// A filter, order or accessor referenced a column the table does not declare
    #[error("{column} is not a column of {table}")]
    UnknownColumn {
        /// Qualified table name
        table: String,
        /// The offending column name
        column: String,
    },

    /// A statement failed; carries the SQL text and the bound values
    #[error("Sql request generated an error: {source}\nRequest: {sql}\nBind: {binds}")]
    Query {
        /// The statement that failed
        sql: String,
        /// Debug rendering of the bound values
        binds: String,
        /// The driver error
        #[source]
        source: sqlx::Error,
    },

    /// Connection could not be established
    #[error("Database error: {message}")]
    Database {
        /// Error message from database
        message: String,
    },

    /// The storage backend cannot evaluate this filter
    #[error("Filter not supported by {table}: {filter}")]
    UnsupportedFilter {
        /// Table (or store) name
        table: String,
        /// Rendering of the rejected filter
        filter: String,
    },

    /// An update or delete was attempted on a table without a primary key
    #[error("Table {table} has no primary key")]
    MissingPrimaryKey {
        /// Qualified table name
        table: String,
    },

    /// No integer key is left above the largest one in a JSON store
    #[error("No key left after {last} in {store}")]
    KeyOverflow {
        /// Store file
        store: String,
        /// Largest key in use
        last: i64,
    },

    /// Missing or malformed configuration entry
    #[error("Configuration error for `{key}`: {reason}")]
    Config {
        /// Dotted configuration key
        key: String,
        /// What is wrong with it
        reason: String,
    },

    /// Router failed to match the requested path
    #[error("No route found for path: {path}")]
    RouteNotFound {
        /// The path that wasn't matched
        path: String,
    },

    /// Invalid route pattern provided
    #[error("Invalid route pattern: {pattern}: {reason}")]
    InvalidRoutePattern {
        /// The invalid pattern
        pattern: String,
        /// Reason for invalidity
        reason: String,
    },

    /// A typed path parameter did not parse
    #[error("Parameter {name} must be {expected}, got '{value}'")]
    InvalidParameter {
        /// Parameter name from the route pattern
        name: String,
        /// Raw path segment
        value: String,
        /// Expected type name
        expected: &'static str,
    },

    /// A route named a controller nobody registered
    #[error("Controller not found: {name}")]
    ControllerNotFound {
        /// Controller name from the route
        name: String,
    },

    /// View or layout template file is missing
    #[error("View file not found {path}")]
    ViewNotFound {
        /// Resolved template path
        path: String,
    },

    /// Record failed validation before save
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// A JSON or INI document could not be parsed
    #[error("Cannot parse {origin}: {reason}")]
    Parse {
        /// File path or other description of the input
        origin: String,
        /// Parser message
        reason: String,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn unknown_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::UnknownColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    pub(crate) fn config(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error should surface as an HTTP 404
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::RouteNotFound { .. }
                | Self::InvalidParameter { .. }
                | Self::ControllerNotFound { .. }
                | Self::ViewNotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_not_found_error() {
        let err = Error::RouteNotFound {
            path: "/unknown".to_string(),
        };
        assert!(err.to_string().contains("/unknown"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_unknown_column_message() {
        let err = Error::unknown_column("main.users", "nickname");
        assert_eq!(err.to_string(), "nickname is not a column of main.users");
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_query_error_carries_sql_and_binds() {
        let err = Error::Query {
            sql: "SELECT 1 FROM nowhere".to_string(),
            binds: "[Int(1)]".to_string(),
            source: sqlx::Error::RowNotFound,
        };
        let message = err.to_string();
        assert!(message.contains("SELECT 1 FROM nowhere"));
        assert!(message.contains("[Int(1)]"));
    }
}
