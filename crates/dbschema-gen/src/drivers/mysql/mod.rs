//! MySQL/MariaDB catalog executor.
//!
//! # Feature Flag
//!
//! This module is only available when the `mysql` feature is enabled:
//!
//! ```toml
//! [dependencies]
//! dbschema-gen = { version = "0.3", features = ["mysql"] }
//! ```
//!
//! # Supported Versions
//!
//! - MySQL 5.7+, 8.0+
//! - MariaDB 10.2+

mod executor;

pub use executor::MySqlExecutor;
