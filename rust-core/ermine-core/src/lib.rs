//! # Ermine Core
//!
//! Core library of the Ermine micro-framework: record mappers over SQL and
//! JSON files, a catalog reader and mapper generator, configuration, routing,
//! views and controller dispatch.
//!
//! ## Modules
//!
//! - `value` - `DbValue`, the value stored in a record column
//! - `model` - column metadata, records, filters, `SqlMapper`, `JsonFileMapper`
//! - `database` - SQLx executor for SQLite and MySQL, lazy `Database` handle
//! - `catalog` - `information_schema` reader
//! - `codegen` - `<Table>MapperTrait` generator
//! - `config` - INI/JSON configuration loading and merging
//! - `registry` - shared typed value store
//! - `types` / `route` / `router` - path parameters and routing with matchit
//! - `request` - request method, path, query, headers and body
//! - `view` - templates and layouts
//! - `controller` / `application` - controller trait and dispatch
//! - `validation` - record validation errors
//! - `format` - display helpers for views
//! - `json` - JSON parsing with simd-json
//! - `error` - Error types and handling

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod application;
pub mod catalog;
pub mod codegen;
pub mod config;
pub mod controller;
pub mod database;
pub mod error;
pub mod format;
pub mod json;
pub mod model;
pub mod registry;
pub mod request;
pub mod route;
pub mod router;
pub mod types;
pub mod validation;
pub mod value;
pub mod view;

pub use application::{Application, Response};
pub use catalog::Catalog;
pub use codegen::ModelTraitGenerator;
pub use config::Config;
pub use controller::{Controller, ControllerContext, TemplateController};
pub use database::{Database, DatabasePool, Dialect};
pub use error::{Error, Result};
pub use model::{
    ColumnDescriptor, Filter, Filters, ForeignKey, JsonFileMapper, Model, Order, Record,
    SqlMapper, TableDescriptor,
};
pub use registry::Registry;
pub use request::Request;
pub use route::Route;
pub use router::{Method, Router};
pub use types::{ParamType, PathParam};
pub use validation::{ColumnError, ValidationCode, ValidationErrors, ValidationResult};
pub use value::DbValue;
pub use view::View;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
