//! Static column metadata shared by every record of a mapped table.

use crate::value::DbValue;
use std::borrow::Cow;

/// Target of a foreign-key column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    /// Referenced table name
    pub table: Cow<'static, str>,
    /// Referenced column name
    pub column: Cow<'static, str>,
}

/// Metadata for one column
///
/// Generated units declare these as `static` data, the catalog reader builds
/// them at runtime; both go through `Cow<'static, str>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Column name as stored
    pub name: Cow<'static, str>,
    /// SQL data type (`int`, `varchar`, `tinyint(1)`, ...)
    pub sql_type: Cow<'static, str>,
    /// Whether the column accepts NULL
    pub nullable: bool,
    /// Declared default, as the catalog reports it
    pub default: Option<Cow<'static, str>>,
    /// Part of the primary key
    pub primary: bool,
    /// Value assigned by the storage on insert
    pub auto_increment: bool,
    /// Foreign-key target, if any
    pub foreign: Option<ForeignKey>,
}

impl ColumnDescriptor {
    /// Plain nullable column without default, mostly for tests and fixtures
    #[must_use]
    pub fn new(name: impl Into<Cow<'static, str>>, sql_type: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            nullable: true,
            default: None,
            primary: false,
            auto_increment: false,
            foreign: None,
        }
    }

    /// Mark as (part of) the primary key
    #[must_use]
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self.nullable = false;
        self
    }

    /// Mark as auto-increment
    #[must_use]
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Mark as NOT NULL
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Set the declared default literal
    #[must_use]
    pub fn with_default(mut self, default: impl Into<Cow<'static, str>>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Language-level type of the column
    #[must_use]
    pub fn rust_type(&self) -> RustType {
        RustType::from_sql(&self.sql_type)
    }

    /// Declared default converted to a typed value
    ///
    /// A literal that does not parse as the column type is kept as text.
    #[must_use]
    pub fn default_value(&self) -> DbValue {
        let Some(raw) = self.default.as_deref() else {
            return DbValue::Null;
        };
        if raw.eq_ignore_ascii_case("null") {
            return DbValue::Null;
        }
        let unquoted = raw.trim_matches('\'');
        match self.rust_type() {
            RustType::Int => unquoted
                .parse::<i64>()
                .map_or_else(|_| DbValue::String(raw.to_string()), DbValue::Int),
            RustType::Float => unquoted
                .parse::<f64>()
                .map_or_else(|_| DbValue::String(raw.to_string()), DbValue::Float),
            RustType::Bool => match unquoted.to_ascii_lowercase().as_str() {
                "1" | "true" => DbValue::Bool(true),
                "0" | "false" => DbValue::Bool(false),
                _ => DbValue::String(raw.to_string()),
            },
            RustType::String | RustType::Any => DbValue::String(unquoted.to_string()),
        }
    }
}

/// Description of one mapped table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    /// Schema (database) name; `main` for SQLite
    pub schema: Cow<'static, str>,
    /// Table name
    pub name: Cow<'static, str>,
    /// Columns in ordinal order
    pub columns: Cow<'static, [ColumnDescriptor]>,
}

impl TableDescriptor {
    /// `schema.table`, as used in error messages and SQL
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    /// Position of a column, if declared
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Look up a column by name
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Primary-key columns, in ordinal order
    pub fn primary_keys(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter().filter(|c| c.primary)
    }

    /// The first auto-increment column
    #[must_use]
    pub fn auto_increment_column(&self) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.auto_increment)
    }
}

/// Rust type a SQL type maps to in generated accessors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RustType {
    /// `i64`
    Int,
    /// `f64`
    Float,
    /// `bool`
    Bool,
    /// `String`
    String,
    /// untyped, exposed as `DbValue`
    Any,
}

impl RustType {
    /// Fixed SQL-type lookup; matching is case-insensitive on the whole type
    #[must_use]
    pub fn from_sql(sql_type: &str) -> Self {
        match sql_type.trim().to_ascii_lowercase().as_str() {
            "bool" | "boolean" | "tinyint(1)" => Self::Bool,
            "bit" | "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint"
            | "year" => Self::Int,
            "dec" | "decimal" | "numeric" | "float" | "double" | "real" => Self::Float,
            "date" | "time" | "datetime" | "timestamp" | "char" | "varchar" | "text" | "enum" | "set"
            | "binary" | "varbinary" | "blob" | "tinytext" | "tinyblob" | "mediumtext"
            | "mediumblob" | "longtext" | "longblob" => Self::String,
            _ => Self::Any,
        }
    }

    /// Owned type name used by generated getters
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Int => "i64",
            Self::Float => "f64",
            Self::Bool => "bool",
            Self::String => "String",
            Self::Any => "DbValue",
        }
    }

    /// Whether a stored value is acceptable for this type
    #[must_use]
    pub const fn accepts(self, value: &DbValue) -> bool {
        match (self, value) {
            (_, DbValue::Null) | (Self::Any, _) => true,
            (Self::Int, DbValue::Int(_))
            | (Self::Float, DbValue::Float(_) | DbValue::Int(_))
            | (Self::Bool, DbValue::Bool(_) | DbValue::Int(0 | 1))
            | (Self::String, DbValue::String(_) | DbValue::Bytes(_)) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> TableDescriptor {
        TableDescriptor {
            schema: "main".into(),
            name: "users".into(),
            columns: vec![
                ColumnDescriptor::new("id", "int").primary().auto_increment(),
                ColumnDescriptor::new("name", "varchar").not_null().with_default("''"),
                ColumnDescriptor::new("score", "decimal").with_default("1.5"),
                ColumnDescriptor::new("active", "tinyint(1)").with_default("1"),
            ]
            .into(),
        }
    }

    #[test]
    fn test_sql_type_lookup() {
        assert_eq!(RustType::from_sql("INT"), RustType::Int);
        assert_eq!(RustType::from_sql("tinyint(1)"), RustType::Bool);
        assert_eq!(RustType::from_sql("tinyint"), RustType::Int);
        assert_eq!(RustType::from_sql("double"), RustType::Float);
        assert_eq!(RustType::from_sql("longblob"), RustType::String);
        assert_eq!(RustType::from_sql("json"), RustType::Any);
    }

    #[test]
    fn test_default_values_are_typed() {
        let table = users();
        assert_eq!(table.columns[0].default_value(), DbValue::Null);
        assert_eq!(table.columns[1].default_value(), DbValue::String(String::new()));
        assert_eq!(table.columns[2].default_value(), DbValue::Float(1.5));
        assert_eq!(table.columns[3].default_value(), DbValue::Bool(true));
    }

    #[test]
    fn test_unparsable_default_kept_as_text() {
        let col = ColumnDescriptor::new("created", "int").with_default("CURRENT_TIMESTAMP");
        assert_eq!(
            col.default_value(),
            DbValue::String("CURRENT_TIMESTAMP".to_string())
        );
    }

    #[test]
    fn test_table_lookups() {
        let table = users();
        assert_eq!(table.qualified_name(), "main.users");
        assert_eq!(table.index_of("score"), Some(2));
        assert!(table.column("nickname").is_none());
        assert_eq!(table.primary_keys().count(), 1);
        assert_eq!(table.auto_increment_column().map(|c| &*c.name), Some("id"));
    }

    #[test]
    fn test_accepts() {
        assert!(RustType::Int.accepts(&DbValue::Null));
        assert!(RustType::Float.accepts(&DbValue::Int(2)));
        assert!(!RustType::Int.accepts(&DbValue::String("2".into())));
        assert!(RustType::Any.accepts(&DbValue::Bytes(vec![1])));
    }
}
