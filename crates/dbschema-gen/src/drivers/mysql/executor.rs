//! MySQL/MariaDB catalog executor.
//!
//! Uses SQLx for connection pooling. The catalog SQL casts every column to
//! `CHAR`, so each value decodes as an optional string.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow, MySqlSslMode};
use sqlx::{Column, Row};
use tracing::{debug, info};

use crate::config::SourceConfig;
use crate::core::catalog::CatalogRow;
use crate::core::schema::Engine;
use crate::core::traits::{CatalogExecutor, CatalogQuery};
use crate::error::{GenError, Result};

/// Connection pool timeout.
const POOL_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// [`CatalogExecutor`] over a MySQL pool.
pub struct MySqlExecutor {
    pool: MySqlPool,
}

impl MySqlExecutor {
    /// Connect using source configuration.
    pub async fn connect(config: &SourceConfig) -> Result<Self> {
        let port = config.port_for(Engine::MySql);
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(port)
            .database(&config.database)
            .username(&config.user)
            .password(&config.password)
            .ssl_mode(MySqlSslMode::Preferred);

        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections as u32)
            .acquire_timeout(POOL_CONNECTION_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(|e| GenError::catalog(e, "creating MySQL pool"))?;

        // Test connection
        sqlx::query("SELECT 1")
            .fetch_one(&pool)
            .await
            .map_err(|e| GenError::catalog(e, "testing MySQL connection"))?;

        info!(
            "Connected to MySQL: {}:{}/{}",
            config.host, port, config.database
        );

        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

fn to_catalog_row(row: &MySqlRow) -> Result<CatalogRow> {
    let mut out = CatalogRow::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let value: Option<String> = row
            .try_get(idx)
            .map_err(|e| GenError::catalog(e, format!("reading column {}", column.name())))?;
        out.insert(column.name(), value);
    }
    Ok(out)
}

#[async_trait]
impl CatalogExecutor for MySqlExecutor {
    async fn query(&self, query: &CatalogQuery) -> Result<Vec<CatalogRow>> {
        let mut statement = sqlx::query(&query.sql);
        for param in &query.params {
            statement = statement.bind(param.as_str());
        }

        let rows = statement
            .fetch_all(&self.pool)
            .await
            .map_err(|e| GenError::catalog(e, format!("running {:?} catalog query", query.kind)))?;
        debug!("{:?} catalog query: {} rows", query.kind, rows.len());

        rows.iter().map(to_catalog_row).collect()
    }
}
