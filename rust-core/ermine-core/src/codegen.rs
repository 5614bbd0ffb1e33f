//! # Mapper Generator
//!
//! Reads a schema through the [`Catalog`] and writes one Rust unit per table:
//! a static [`TableDescriptor`], a `<Table>MapperTrait` with typed getters and
//! setters, and a `<Table>` record wrapper implementing [`Model`].
//!
//! Generation is destructive: existing units are overwritten without any
//! merge with manual edits, and every unit says so in its header.
//!
//! [`Model`]: crate::model::Model

use crate::catalog::Catalog;
use crate::database::Database;
use crate::error::Result;
use crate::model::{ColumnDescriptor, RustType, TableDescriptor};
use heck::{ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase};
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Header written at the top of every generated file
pub const GENERATED_HEADER: &str =
    "Generated by ermine from the database catalog. Regenerating overwrites this file; manual changes are lost.";

const RESERVED: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub",
    "ref", "return", "static", "struct", "trait", "true", "type", "unsafe", "use", "where",
    "while", "abstract", "become", "box", "do", "final", "gen", "macro", "override", "priv",
    "try", "typeof", "unsized", "virtual", "yield",
];

// Keywords that cannot be raw identifiers
const PATH_KEYWORDS: &[&str] = &["crate", "self", "super", "_"];

// Names already taken by `Model` methods
const MODEL_METHODS: &[&str] = &[
    "table",
    "from_record",
    "record",
    "record_mut",
    "into_record",
    "new",
    "hydrate",
];

/// Writes `<table>_mapper_trait.rs` units for a schema
#[derive(Debug, Clone)]
pub struct ModelTraitGenerator {
    schema: String,
    module_path: String,
    destination: PathBuf,
    skip_tables: Vec<String>,
    skip_columns: Vec<String>,
    crate_path: String,
}

impl ModelTraitGenerator {
    /// Generator for `schema`, writing into `destination`, whose units are
    /// mounted at `module_path` (e.g. `crate::models`)
    pub fn new(
        schema: impl Into<String>,
        module_path: impl Into<String>,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self {
            schema: schema.into(),
            module_path: module_path.into(),
            destination: destination.into(),
            skip_tables: Vec::new(),
            skip_columns: Vec::new(),
            crate_path: "ermine_core".to_string(),
        }
    }

    /// Tables left out of the generation
    #[must_use]
    pub fn skip_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_tables = tables.into_iter().map(Into::into).collect();
        self
    }

    /// Columns left out, as `column` (every table) or `table.column`
    #[must_use]
    pub fn skip_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Path of the `ermine-core` crate in generated `use` items
    #[must_use]
    pub fn crate_path(mut self, path: impl Into<String>) -> Self {
        self.crate_path = path.into();
        self
    }

    /// Schema being generated
    #[must_use]
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Output directory
    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    fn skips_table(&self, table: &str) -> bool {
        self.skip_tables.iter().any(|t| t == table)
    }

    fn skips_column(&self, table: &str, column: &str) -> bool {
        self.skip_columns.iter().any(|entry| match entry.split_once('.') {
            Some((t, c)) => t == table && c == column,
            None => entry == column,
        })
    }

    /// Read the catalog and write every unit plus `mod.rs`
    ///
    /// Returns the written files, `mod.rs` last.
    ///
    /// # Errors
    ///
    /// Returns `Error::Query` if the catalog cannot be read and `Error::Io`
    /// if a file cannot be written.
    pub async fn generate(&self, db: &Database) -> Result<Vec<PathBuf>> {
        let catalog = Catalog::new(db);
        tokio::fs::create_dir_all(&self.destination).await?;

        let mut written = Vec::new();
        let mut tables = Vec::new();
        for name in catalog.tables(&self.schema).await? {
            if self.skips_table(&name) {
                debug!(table = %name, "Table skipped");
                continue;
            }

            let mut table = catalog.table(&self.schema, &name).await?;
            let columns: Vec<ColumnDescriptor> = table
                .columns
                .iter()
                .filter(|c| !self.skips_column(&name, &c.name))
                .cloned()
                .collect();
            table.columns = columns.into();

            let path = self.destination.join(format!("{}.rs", unit_name(&name)));
            tokio::fs::write(&path, self.render_unit(&table)).await?;
            info!(table = %name, path = %path.display(), "Mapper unit written");

            written.push(path);
            tables.push(name);
        }

        let mod_path = self.destination.join("mod.rs");
        tokio::fs::write(&mod_path, self.render_mod(&tables)).await?;
        written.push(mod_path);

        info!(
            schema = %self.schema,
            units = tables.len(),
            destination = %self.destination.display(),
            "Mapper generation finished"
        );
        Ok(written)
    }

    /// Source of `mod.rs` for the given tables
    #[must_use]
    pub fn render_mod(&self, tables: &[String]) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "//! Mappers of schema `{}`, mounted at `{}`.",
            self.schema, self.module_path
        );
        let _ = writeln!(out, "//!\n//! {GENERATED_HEADER}\n");

        for table in tables {
            let _ = writeln!(out, "pub mod {};", unit_name(table));
        }
        if !tables.is_empty() {
            out.push('\n');
        }
        for table in tables {
            let _ = writeln!(
                out,
                "pub use {}::{{{}, {}, {}}};",
                unit_name(table),
                struct_name(table),
                trait_name(table),
                static_name(table),
            );
        }
        out
    }

    /// Source of one table's unit
    #[must_use]
    pub fn render_unit(&self, table: &TableDescriptor) -> String {
        let struct_name = struct_name(&table.name);
        let trait_name = trait_name(&table.name);
        let static_name = static_name(&table.name);
        let columns_name = format!("{}_COLUMNS", table.name.to_shouty_snake_case());
        let has_foreign = table.columns.iter().any(|c| c.foreign.is_some());
        let has_any = table
            .columns
            .iter()
            .any(|c| c.rust_type() == RustType::Any);

        let mut out = String::new();
        let _ = writeln!(
            out,
            "//! Mapper of `{}.{}`, mounted at `{}::{}`.",
            table.schema,
            table.name,
            self.module_path,
            unit_name(&table.name)
        );
        let _ = writeln!(out, "//!\n//! {GENERATED_HEADER}\n");

        let mut imports = vec!["ColumnDescriptor"];
        if has_foreign {
            imports.push("ForeignKey");
        }
        imports.extend(["Model", "Record", "TableDescriptor"]);
        let _ = writeln!(out, "use {}::model::{{{}}};", self.crate_path, imports.join(", "));
        if has_any {
            let _ = writeln!(out, "use {}::value::DbValue;", self.crate_path);
        }
        out.push_str("use std::borrow::Cow;\n\n");

        let _ = writeln!(
            out,
            "static {columns_name}: [ColumnDescriptor; {}] = [",
            table.columns.len()
        );
        for column in table.columns.iter() {
            render_column(&mut out, column);
        }
        out.push_str("];\n\n");

        let _ = writeln!(out, "/// Metadata of `{}.{}`", table.schema, table.name);
        let _ = writeln!(out, "pub static {static_name}: TableDescriptor = TableDescriptor {{");
        let _ = writeln!(out, "    schema: Cow::Borrowed({:?}),", table.schema.as_ref());
        let _ = writeln!(out, "    name: Cow::Borrowed({:?}),", table.name.as_ref());
        let _ = writeln!(out, "    columns: Cow::Borrowed(&{columns_name}),");
        out.push_str("};\n\n");

        let _ = writeln!(out, "/// Typed accessors for `{}.{}`", table.schema, table.name);
        let _ = writeln!(out, "pub trait {trait_name}: Model {{");
        for (index, column) in table.columns.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            render_accessors(&mut out, index, column);
        }
        out.push_str("}\n\n");

        let _ = writeln!(out, "/// One row of `{}.{}`", table.schema, table.name);
        out.push_str("#[derive(Debug, Clone, PartialEq)]\n");
        let _ = writeln!(out, "pub struct {struct_name}(Record);\n");
        let _ = writeln!(out, "impl Model for {struct_name} {{");
        let _ = writeln!(
            out,
            "    fn table() -> &'static TableDescriptor {{\n        &{static_name}\n    }}\n"
        );
        out.push_str("    fn from_record(record: Record) -> Self {\n        Self(record)\n    }\n\n");
        out.push_str("    fn record(&self) -> &Record {\n        &self.0\n    }\n\n");
        out.push_str("    fn record_mut(&mut self) -> &mut Record {\n        &mut self.0\n    }\n\n");
        out.push_str("    fn into_record(self) -> Record {\n        self.0\n    }\n");
        out.push_str("}\n\n");
        let _ = writeln!(out, "impl {trait_name} for {struct_name} {{}}");

        out
    }
}

/// File stem of a table's unit: `<table>_mapper_trait`
#[must_use]
pub fn unit_name(table: &str) -> String {
    format!("{}_mapper_trait", table.to_snake_case())
}

/// `order_items` → `OrderItems`
#[must_use]
pub fn struct_name(table: &str) -> String {
    table.to_upper_camel_case()
}

/// `order_items` → `OrderItemsMapperTrait`
#[must_use]
pub fn trait_name(table: &str) -> String {
    format!("{}MapperTrait", struct_name(table))
}

/// `order_items` → `ORDER_ITEMS_TABLE`
#[must_use]
pub fn static_name(table: &str) -> String {
    format!("{}_TABLE", table.to_shouty_snake_case())
}

fn accessor_name(column: &str) -> String {
    let name = column.to_snake_case();
    let starts_like_ident = name
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_');
    if !starts_like_ident
        || MODEL_METHODS.contains(&name.as_str())
        || PATH_KEYWORDS.contains(&name.as_str())
    {
        format!("get_{name}")
    } else if RESERVED.contains(&name.as_str()) {
        format!("r#{name}")
    } else {
        name
    }
}

fn setter_name(column: &str) -> String {
    format!("set_{}", column.to_snake_case())
}

fn render_column(out: &mut String, column: &ColumnDescriptor) {
    out.push_str("    ColumnDescriptor {\n");
    let _ = writeln!(out, "        name: Cow::Borrowed({:?}),", column.name.as_ref());
    let _ = writeln!(out, "        sql_type: Cow::Borrowed({:?}),", column.sql_type.as_ref());
    let _ = writeln!(out, "        nullable: {},", column.nullable);
    match column.default.as_deref() {
        Some(default) => {
            let _ = writeln!(out, "        default: Some(Cow::Borrowed({default:?})),");
        }
        None => out.push_str("        default: None,\n"),
    }
    let _ = writeln!(out, "        primary: {},", column.primary);
    let _ = writeln!(out, "        auto_increment: {},", column.auto_increment);
    match &column.foreign {
        Some(foreign) => {
            let _ = writeln!(
                out,
                "        foreign: Some(ForeignKey {{\n            table: Cow::Borrowed({:?}),\n            column: Cow::Borrowed({:?}),\n        }}),",
                foreign.table.as_ref(),
                foreign.column.as_ref()
            );
        }
        None => out.push_str("        foreign: None,\n"),
    }
    out.push_str("    },\n");
}

fn render_accessors(out: &mut String, index: usize, column: &ColumnDescriptor) {
    let getter = accessor_name(&column.name);
    let setter = setter_name(&column.name);
    let rust_type = column.rust_type();

    let (getter_type, getter_body) = match rust_type {
        RustType::Int => ("Option<i64>", "as_int()"),
        RustType::Float => ("Option<f64>", "as_float()"),
        RustType::Bool => ("Option<bool>", "as_bool()"),
        RustType::String => ("Option<&str>", "as_str()"),
        RustType::Any => ("&DbValue", ""),
    };
    let setter_type = match (rust_type, column.nullable) {
        (RustType::Any, _) => "impl Into<DbValue>".to_string(),
        (RustType::String, false) => "impl Into<String>".to_string(),
        (RustType::String, true) => "Option<String>".to_string(),
        (other, false) => other.type_name().to_string(),
        (other, true) => format!("Option<{}>", other.type_name()),
    };
    let setter_value = match (rust_type, column.nullable) {
        (RustType::String, false) => "Into::<String>::into(value)",
        _ => "value",
    };

    let _ = writeln!(out, "    /// `{}` ({})", column.name, column.sql_type);
    let _ = writeln!(out, "    fn {getter}(&self) -> {getter_type} {{");
    if getter_body.is_empty() {
        let _ = writeln!(out, "        self.record().value({index})");
    } else {
        let _ = writeln!(out, "        self.record().value({index}).{getter_body}");
    }
    out.push_str("    }\n\n");

    let _ = writeln!(out, "    /// Set `{}`", column.name);
    let _ = writeln!(out, "    fn {setter}(&mut self, value: {setter_type}) -> &mut Self {{");
    let _ = writeln!(out, "        self.record_mut().set_value({index}, {setter_value});");
    out.push_str("        self\n    }\n");
}
