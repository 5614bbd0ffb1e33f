//! # Record Validation
//!
//! Checks a record against its table metadata before it is saved: NOT NULL
//! columns must hold a value (auto-increment columns are filled by the
//! storage) and every value must fit the column's Rust type.

use crate::model::{ColumnDescriptor, Record, RustType};
use serde::Serialize;
use std::fmt;

/// Why a column was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationCode {
    /// NULL in a NOT NULL column
    Required,
    /// Value of the wrong kind for the column type
    InvalidType,
}

/// One rejected column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnError {
    /// Column name
    pub column: String,
    /// Rejection reason
    pub code: ValidationCode,
    /// Message shown to users
    pub message: String,
}

impl ColumnError {
    fn required(column: &ColumnDescriptor) -> Self {
        Self {
            column: column.name.to_string(),
            code: ValidationCode::Required,
            message: format!("{} is required", column.name),
        }
    }

    fn invalid_type(column: &ColumnDescriptor, expected: RustType) -> Self {
        Self {
            column: column.name.to_string(),
            code: ValidationCode::InvalidType,
            message: format!("{} must be {}", column.name, expected.type_name()),
        }
    }
}

/// Every rejected column of a record, in column order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    /// Rejected columns
    pub errors: Vec<ColumnError>,
}

impl ValidationErrors {
    /// Whether nothing was rejected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of rejected columns
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Error of one column, if it was rejected
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnError> {
        self.errors.iter().find(|e| e.column == name)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            f.write_str(&error.message)?;
        }
        Ok(())
    }
}

/// Outcome of [`validate_record`]
pub type ValidationResult<T> = std::result::Result<T, ValidationErrors>;

/// Check a record against its table's column metadata
///
/// # Errors
///
/// Every rejected column, in column order.
pub fn validate_record(record: &Record) -> ValidationResult<()> {
    let errors: Vec<ColumnError> = record
        .iter()
        .filter_map(|(column, value)| {
            if value.is_null() {
                let required = !column.nullable && !column.auto_increment;
                return required.then(|| ColumnError::required(column));
            }
            let expected = column.rust_type();
            (!expected.accepts(value)).then(|| ColumnError::invalid_type(column, expected))
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors { errors })
    }
}
