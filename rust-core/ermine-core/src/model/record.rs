//! Records and the `Model` trait implemented by generated table wrappers.

use super::column::{ColumnDescriptor, TableDescriptor};
use crate::error::{Error, Result};
use crate::value::DbValue;
use indexmap::IndexMap;

/// One mapped row
///
/// Values are stored positionally, aligned with the table's columns, so the
/// legal keys are exactly the declared columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    table: &'static TableDescriptor,
    values: Vec<DbValue>,
    store_key: Option<String>,
}

impl Record {
    /// Empty record, every column at its declared default
    #[must_use]
    pub fn new(table: &'static TableDescriptor) -> Self {
        Self {
            table,
            values: table.columns.iter().map(ColumnDescriptor::default_value).collect(),
            store_key: None,
        }
    }

    /// Build a record from a retrieved row
    ///
    /// Columns missing from the row keep their default.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownColumn` if the row carries a key the table does
    /// not declare.
    pub fn hydrate<K, I>(table: &'static TableDescriptor, row: I) -> Result<Self>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, DbValue)>,
    {
        let mut record = Self::new(table);
        for (column, value) in row {
            record.set(column.as_ref(), value)?;
        }
        Ok(record)
    }

    /// Table this record belongs to
    #[must_use]
    pub const fn table(&self) -> &'static TableDescriptor {
        self.table
    }

    fn index(&self, column: &str) -> Result<usize> {
        self.table
            .index_of(column)
            .ok_or_else(|| Error::unknown_column(self.table.qualified_name(), column))
    }

    /// Read a column by name
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownColumn` for undeclared columns.
    pub fn get(&self, column: &str) -> Result<&DbValue> {
        let index = self.index(column)?;
        Ok(&self.values[index])
    }

    /// Write a column by name
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownColumn` for undeclared columns.
    pub fn set(&mut self, column: &str, value: impl Into<DbValue>) -> Result<&mut Self> {
        let index = self.index(column)?;
        self.values[index] = value.into();
        Ok(self)
    }

    /// Read by ordinal position; generated accessors use this
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range for the table.
    #[must_use]
    pub fn value(&self, index: usize) -> &DbValue {
        &self.values[index]
    }

    /// Write by ordinal position; generated accessors use this
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range for the table.
    pub fn set_value(&mut self, index: usize, value: impl Into<DbValue>) {
        self.values[index] = value.into();
    }

    /// Columns paired with their current values, in ordinal order
    pub fn iter(&self) -> impl Iterator<Item = (&ColumnDescriptor, &DbValue)> {
        self.table.columns.iter().zip(self.values.iter())
    }

    /// Ordered column → value map, the shape stored in JSON files
    #[must_use]
    pub fn to_map(&self) -> IndexMap<String, DbValue> {
        self.iter()
            .map(|(column, value)| (column.name.to_string(), value.clone()))
            .collect()
    }

    /// True when the table has a primary key and none of its columns is null
    #[must_use]
    pub fn has_primary_key(&self) -> bool {
        let mut any = false;
        for (column, value) in self.iter() {
            if column.primary {
                if value.is_null() {
                    return false;
                }
                any = true;
            }
        }
        any
    }

    /// Key of this record in a JSON file store
    #[must_use]
    pub fn store_key(&self) -> Option<&str> {
        self.store_key.as_deref()
    }

    /// Attach a JSON file store key
    pub fn set_store_key(&mut self, key: impl Into<String>) {
        self.store_key = Some(key.into());
    }
}

/// A typed wrapper around a [`Record`] of one table
///
/// Generated `*_mapper_trait.rs` units implement this for each table.
pub trait Model: Sized + Send + Sync {
    /// Metadata of the mapped table
    fn table() -> &'static TableDescriptor;

    /// Wrap an existing record
    fn from_record(record: Record) -> Self;

    /// Borrow the underlying record
    fn record(&self) -> &Record;

    /// Mutably borrow the underlying record
    fn record_mut(&mut self) -> &mut Record;

    /// Unwrap into the underlying record
    fn into_record(self) -> Record;

    /// Empty instance with column defaults
    fn new() -> Self {
        Self::from_record(Record::new(Self::table()))
    }

    /// Instance from a retrieved row
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownColumn` if the row has an undeclared column.
    fn hydrate<K, I>(row: I) -> Result<Self>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, DbValue)>,
    {
        Record::hydrate(Self::table(), row).map(Self::from_record)
    }
}
