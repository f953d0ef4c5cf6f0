//! Engine dialect rules: canonical types, type mapping, enums and defaults.
//!
//! - [`canonical`]: the engine-agnostic [`FieldType`] every generator reads
//! - [`typemap`]: per-engine lookup from native column types
//! - [`enums`]: the [`EnumRegistry`] owned by one ingestion run
//! - [`defaults`]: literal vs. computed default classification

pub mod canonical;
pub mod defaults;
pub mod enums;
pub mod typemap;

pub use canonical::{EnumType, FieldType, ScalarType};
pub use defaults::{classify_default, is_computed_expression};
pub use enums::EnumRegistry;
pub use typemap::{parse_mysql_enum_values, TypeMapper};
