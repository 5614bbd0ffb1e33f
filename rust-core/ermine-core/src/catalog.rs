//! # Catalog Reader
//!
//! Reads table, column and key-usage metadata from `information_schema`
//! through the same [`SqlMapper`] used for application tables.
//!
//! The three catalog tables are mapped like any generated model, with static
//! descriptors limited to the columns the reader needs.

use crate::database::Database;
use crate::error::Result;
use crate::model::{
    ColumnDescriptor, Filters, ForeignKey, Model, Order, Record, SqlMapper, TableDescriptor,
};
use crate::value::DbValue;
use std::borrow::Cow;
use tracing::debug;

const SCHEMA: &str = "information_schema";

const fn text(name: &'static str) -> ColumnDescriptor {
    ColumnDescriptor {
        name: Cow::Borrowed(name),
        sql_type: Cow::Borrowed("varchar"),
        nullable: true,
        default: None,
        primary: false,
        auto_increment: false,
        foreign: None,
    }
}

static TABLES_COLUMNS: [ColumnDescriptor; 2] = [text("TABLE_SCHEMA"), text("TABLE_NAME")];

static TABLES: TableDescriptor = TableDescriptor {
    schema: Cow::Borrowed(SCHEMA),
    name: Cow::Borrowed("TABLES"),
    columns: Cow::Borrowed(&TABLES_COLUMNS),
};

static COLUMNS_COLUMNS: [ColumnDescriptor; 10] = [
    text("TABLE_SCHEMA"),
    text("TABLE_NAME"),
    text("COLUMN_NAME"),
    ColumnDescriptor {
        name: Cow::Borrowed("ORDINAL_POSITION"),
        sql_type: Cow::Borrowed("int"),
        nullable: true,
        default: None,
        primary: false,
        auto_increment: false,
        foreign: None,
    },
    text("COLUMN_DEFAULT"),
    text("IS_NULLABLE"),
    text("DATA_TYPE"),
    text("COLUMN_TYPE"),
    text("COLUMN_KEY"),
    text("EXTRA"),
];

static COLUMNS: TableDescriptor = TableDescriptor {
    schema: Cow::Borrowed(SCHEMA),
    name: Cow::Borrowed("COLUMNS"),
    columns: Cow::Borrowed(&COLUMNS_COLUMNS),
};

static KEY_COLUMN_USAGE_COLUMNS: [ColumnDescriptor; 5] = [
    text("TABLE_SCHEMA"),
    text("TABLE_NAME"),
    text("COLUMN_NAME"),
    text("REFERENCED_TABLE_NAME"),
    text("REFERENCED_COLUMN_NAME"),
];

static KEY_COLUMN_USAGE: TableDescriptor = TableDescriptor {
    schema: Cow::Borrowed(SCHEMA),
    name: Cow::Borrowed("KEY_COLUMN_USAGE"),
    columns: Cow::Borrowed(&KEY_COLUMN_USAGE_COLUMNS),
};

/// Text value of a catalog field, empty when null
///
/// MySQL reports some catalog columns with a binary collation, so bytes are
/// read as UTF-8 too.
fn field(record: &Record, column: &str) -> String {
    record.get(column).map(ToString::to_string).unwrap_or_default()
}

struct TableRow(Record);

impl Model for TableRow {
    fn table() -> &'static TableDescriptor {
        &TABLES
    }

    fn from_record(record: Record) -> Self {
        Self(record)
    }

    fn record(&self) -> &Record {
        &self.0
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.0
    }

    fn into_record(self) -> Record {
        self.0
    }
}

struct ColumnRow(Record);

impl Model for ColumnRow {
    fn table() -> &'static TableDescriptor {
        &COLUMNS
    }

    fn from_record(record: Record) -> Self {
        Self(record)
    }

    fn record(&self) -> &Record {
        &self.0
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.0
    }

    fn into_record(self) -> Record {
        self.0
    }
}

impl ColumnRow {
    fn sql_type(&self) -> String {
        if field(&self.0, "COLUMN_TYPE").eq_ignore_ascii_case("tinyint(1)") {
            "tinyint(1)".to_string()
        } else {
            field(&self.0, "DATA_TYPE").to_ascii_lowercase()
        }
    }

    fn to_descriptor(&self, foreign: Option<ForeignKey>) -> ColumnDescriptor {
        let default = match self.0.get("COLUMN_DEFAULT") {
            Ok(DbValue::Null) | Err(_) => None,
            Ok(value) => Some(Cow::Owned(value.to_string())),
        };

        ColumnDescriptor {
            name: Cow::Owned(field(&self.0, "COLUMN_NAME")),
            sql_type: Cow::Owned(self.sql_type()),
            nullable: field(&self.0, "IS_NULLABLE") == "YES",
            default,
            primary: field(&self.0, "COLUMN_KEY") == "PRI",
            auto_increment: field(&self.0, "EXTRA").contains("auto_increment"),
            foreign,
        }
    }
}

struct KeyUsageRow(Record);

impl Model for KeyUsageRow {
    fn table() -> &'static TableDescriptor {
        &KEY_COLUMN_USAGE
    }

    fn from_record(record: Record) -> Self {
        Self(record)
    }

    fn record(&self) -> &Record {
        &self.0
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.0
    }

    fn into_record(self) -> Record {
        self.0
    }
}

impl KeyUsageRow {
    fn foreign(&self) -> Option<ForeignKey> {
        let referenced = |column: &str| {
            self.0
                .get(column)
                .ok()
                .filter(|value| !value.is_null())
                .map(ToString::to_string)
        };
        Some(ForeignKey {
            table: Cow::Owned(referenced("REFERENCED_TABLE_NAME")?),
            column: Cow::Owned(referenced("REFERENCED_COLUMN_NAME")?),
        })
    }
}

/// Reader over a database's `information_schema`
#[derive(Debug, Clone, Copy)]
pub struct Catalog<'db> {
    db: &'db Database,
}

impl<'db> Catalog<'db> {
    /// Reader over the handle's connection
    #[must_use]
    pub const fn new(db: &'db Database) -> Self {
        Self { db }
    }

    /// Table names of a schema, sorted by name
    ///
    /// # Errors
    ///
    /// Returns `Error::Query` if the catalog cannot be read.
    pub async fn tables(&self, schema: &str) -> Result<Vec<String>> {
        let rows = SqlMapper::<TableRow>::new(self.db)
            .list(
                &Filters::new().eq("TABLE_SCHEMA", schema),
                &[Order::asc("TABLE_NAME")],
                None,
                None,
            )
            .await?;

        debug!(schema, tables = rows.len(), "Catalog tables read");
        Ok(rows
            .iter()
            .map(|row| field(&row.0, "TABLE_NAME"))
            .collect())
    }

    /// Columns of a table in ordinal order, foreign keys resolved
    ///
    /// # Errors
    ///
    /// Returns `Error::Query` if the catalog cannot be read.
    pub async fn columns(&self, schema: &str, table: &str) -> Result<Vec<ColumnDescriptor>> {
        let rows = SqlMapper::<ColumnRow>::new(self.db)
            .list(
                &Filters::new()
                    .eq("TABLE_SCHEMA", schema)
                    .eq("TABLE_NAME", table),
                &[Order::asc("ORDINAL_POSITION")],
                None,
                None,
            )
            .await?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            let foreign = self
                .foreign_key(schema, table, &field(&row.0, "COLUMN_NAME"))
                .await?;
            columns.push(row.to_descriptor(foreign));
        }

        debug!(schema, table, columns = columns.len(), "Catalog columns read");
        Ok(columns)
    }

    /// Target of a column's foreign key, `None` when it has none
    ///
    /// # Errors
    ///
    /// Returns `Error::Query` if the catalog cannot be read.
    pub async fn foreign_key(
        &self,
        schema: &str,
        table: &str,
        column: &str,
    ) -> Result<Option<ForeignKey>> {
        let rows = SqlMapper::<KeyUsageRow>::new(self.db)
            .list(
                &Filters::new()
                    .eq("TABLE_SCHEMA", schema)
                    .eq("TABLE_NAME", table)
                    .eq("COLUMN_NAME", column),
                &[],
                None,
                None,
            )
            .await?;

        Ok(rows.iter().find_map(KeyUsageRow::foreign))
    }

    /// Full descriptor of one table
    ///
    /// # Errors
    ///
    /// Returns `Error::Query` if the catalog cannot be read.
    pub async fn table(&self, schema: &str, table: &str) -> Result<TableDescriptor> {
        Ok(TableDescriptor {
            schema: Cow::Owned(schema.to_string()),
            name: Cow::Owned(table.to_string()),
            columns: Cow::Owned(self.columns(schema, table).await?),
        })
    }
}
