//! Live catalog executors.
//!
//! Each driver implements [`CatalogExecutor`](crate::core::CatalogExecutor)
//! over a connection pool and reads every selected column as text:
//!
//! - [`mysql`]: MySQL/MariaDB via SQLx (feature `mysql`)
//! - [`postgres`]: PostgreSQL via deadpool-postgres (feature `postgres`)
//!
//! Catalog SQL lives with the [`LiveAdapter`](crate::source::LiveAdapter);
//! drivers only bind text parameters and collect rows.

#[cfg(feature = "mysql")]
pub mod mysql;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "mysql")]
pub use mysql::MySqlExecutor;

#[cfg(feature = "postgres")]
pub use postgres::PostgresExecutor;
