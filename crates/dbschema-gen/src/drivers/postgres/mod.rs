//! PostgreSQL catalog executor.
//!
//! Only available with the `postgres` feature.

mod executor;

pub use executor::PostgresExecutor;
