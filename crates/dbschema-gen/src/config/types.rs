//! Configuration type definitions.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::schema::Engine;
use crate::generate::ConnectionConfig;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source database engine.
    pub engine: Engine,

    /// Live catalog connection. Exclusive with `dumps`.
    #[serde(default)]
    pub source: Option<SourceConfig>,

    /// Captured catalog dumps. Exclusive with `source`.
    #[serde(default)]
    pub dumps: Option<DumpConfig>,

    /// Output documents.
    pub output: OutputConfig,

    /// Table filter.
    #[serde(default)]
    pub filter: FilterConfig,

    /// Connection block for the builder document.
    #[serde(default)]
    pub connection: Option<ConnectionConfig>,
}

/// Live source database configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Database host.
    pub host: String,

    /// Database port (default: 3306 for MySQL, 5432 for Postgres).
    #[serde(default)]
    pub port: Option<u16>,

    /// Database name.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password.
    #[serde(default)]
    pub password: String,

    /// Postgres schema (default: "public"). Ignored for MySQL.
    #[serde(default)]
    pub schema: Option<String>,

    /// Pool size (default: 2).
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

impl SourceConfig {
    /// Port to connect to, falling back to the engine's default.
    pub fn port_for(&self, engine: Engine) -> u16 {
        self.port.unwrap_or(match engine {
            Engine::MySql => 3306,
            Engine::Postgres => 5432,
        })
    }
}

impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("schema", &self.schema)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// Paths of captured catalog dumps (CSV with a header row).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpConfig {
    /// Column rows.
    pub fields: PathBuf,

    /// Index rows.
    pub indexes: PathBuf,

    /// Postgres enum rows.
    #[serde(default)]
    pub enums: Option<PathBuf>,
}

/// Output paths. At least one must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// IDL document. An existing file at this path is reconciled, not
    /// overwritten blindly.
    #[serde(default)]
    pub idl: Option<PathBuf>,

    /// Builder document.
    #[serde(default)]
    pub dsl: Option<PathBuf>,
}

/// Table filter lists. At most one may be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub include: Option<Vec<String>>,

    #[serde(default)]
    pub exclude: Option<Vec<String>>,
}

fn default_max_connections() -> usize {
    2
}
