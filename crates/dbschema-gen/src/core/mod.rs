//! Core abstractions for engine-agnostic schema ingestion.
//!
//! - [`identifier`]: raw database names to legal type and field names
//! - [`schema`]: the canonical Engine/Schema/Model/Field/Index graph
//! - [`catalog`]: the text row contract shared by all adapters
//! - [`traits`]: [`SchemaAdapter`] and the [`CatalogExecutor`] seam

pub mod catalog;
pub mod identifier;
pub mod schema;
pub mod traits;

pub use catalog::{CatalogRow, EnumRow, FieldRow, IndexRow};
pub use identifier::{is_valid_name, to_field_name, to_type_name};
pub use schema::{DefaultValue, Engine, Field, Index, Model, Schema};
pub use traits::{CatalogExecutor, CatalogQuery, QueryKind, SchemaAdapter};
