//! # Record Mapping
//!
//! Column metadata, records, filters and the two storage-backed mappers.
//!
//! - `column` - `ColumnDescriptor` / `TableDescriptor` and the SQL → Rust
//!   type lookup used by the generator
//! - `record` - `Record` and the `Model` trait generated wrappers implement
//! - `filter` - `Filters` and `Order`, evaluated as SQL or in memory
//! - `sql` - `SqlMapper`, CRUD over a SQL database
//! - `json_file` - `JsonFileMapper`, CRUD over one JSON file per table

pub mod column;
pub mod filter;
pub mod json_file;
pub mod record;
pub mod sql;

pub use column::{ColumnDescriptor, ForeignKey, RustType, TableDescriptor};
pub use filter::{Direction, Filter, Filters, Order};
pub use json_file::JsonFileMapper;
pub use record::{Model, Record};
pub use sql::SqlMapper;
