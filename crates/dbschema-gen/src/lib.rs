//! # dbschema-gen
//!
//! Generate schema documents from relational database catalogs.
//!
//! This library reads MySQL or PostgreSQL catalog metadata, either live or
//! from captured CSV dumps, into an engine-agnostic schema model and renders:
//!
//! - **IDL document** with `@model`, key, index and default annotations,
//!   reconciled non-destructively against a previously generated document
//! - **Builder document** in the `a.schema({ ... })` programmatic style
//! - **Enum handling** per engine: shared catalog enums (Postgres) and
//!   per-column inline enums (MySQL)
//!
//! ## Example
//!
//! ```rust,no_run
//! use dbschema_gen::{Engine, IdlGenerator, SchemaAdapter, TextAdapter, TextDump};
//!
//! #[tokio::main]
//! async fn main() -> dbschema_gen::Result<()> {
//!     let dump = TextDump::from_files("fields.csv", "indexes.csv", None)?;
//!     let mut adapter = TextAdapter::new(Engine::MySql, &dump)?;
//!     let schema = adapter.build_schema().await?;
//!     println!("{}", IdlGenerator::new().render(&schema, None)?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod dialect;
pub mod drivers;
pub mod error;
pub mod generate;
pub mod orchestrator;
pub mod source;

// Re-exports for convenient access
pub use config::{Config, DumpConfig, FilterConfig, OutputConfig, SourceConfig};
pub use crate::core::{
    CatalogExecutor, CatalogQuery, CatalogRow, DefaultValue, Engine, Field, Index, Model,
    QueryKind, Schema, SchemaAdapter,
};
pub use dialect::{EnumType, FieldType, ScalarType};
pub use error::{GenError, Result};
pub use generate::{ConnectionConfig, Document, DslGenerator, IdlGenerator, TableFilter};
pub use orchestrator::{GenerationResult, Orchestrator, Rendered};
pub use source::{LiveAdapter, TextAdapter, TextDump};
