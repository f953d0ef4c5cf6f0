//! PostgreSQL catalog executor.
//!
//! Uses deadpool-postgres for connection pooling. Catalog SQL casts every
//! column to `text` and every parameter is bound as text.

use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::types::ToSql;
use tokio_postgres::Config as PgConfig;
use tracing::{debug, info};

use crate::config::SourceConfig;
use crate::core::catalog::CatalogRow;
use crate::core::schema::Engine;
use crate::core::traits::{CatalogExecutor, CatalogQuery};
use crate::error::{GenError, Result};

/// [`CatalogExecutor`] over a PostgreSQL pool.
pub struct PostgresExecutor {
    pool: Pool,
}

impl PostgresExecutor {
    /// Connect using source configuration.
    pub async fn connect(config: &SourceConfig) -> Result<Self> {
        let port = config.port_for(Engine::Postgres);
        let mut pg_config = PgConfig::new();
        pg_config.host(&config.host);
        pg_config.port(port);
        pg_config.dbname(&config.database);
        pg_config.user(&config.user);
        pg_config.password(&config.password);

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let mgr = Manager::from_config(pg_config, tokio_postgres::NoTls, mgr_config);
        let pool = Pool::builder(mgr)
            .max_size(config.max_connections)
            .build()
            .map_err(|e| GenError::catalog(e, "creating PostgreSQL pool"))?;

        // Test connection
        let client = pool
            .get()
            .await
            .map_err(|e| GenError::catalog(e, "testing PostgreSQL connection"))?;
        client
            .simple_query("SELECT 1")
            .await
            .map_err(|e| GenError::catalog(e, "testing PostgreSQL connection"))?;

        info!(
            "Connected to PostgreSQL: {}:{}/{}",
            config.host, port, config.database
        );

        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }
}

#[async_trait]
impl CatalogExecutor for PostgresExecutor {
    async fn query(&self, query: &CatalogQuery) -> Result<Vec<CatalogRow>> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| GenError::catalog(e, "acquiring PostgreSQL connection"))?;

        let params: Vec<&(dyn ToSql + Sync)> = query
            .params
            .iter()
            .map(|p| p as &(dyn ToSql + Sync))
            .collect();

        let rows = client
            .query(query.sql.as_str(), &params)
            .await
            .map_err(|e| GenError::catalog(e, format!("running {:?} catalog query", query.kind)))?;
        debug!("{:?} catalog query: {} rows", query.kind, rows.len());

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut catalog_row = CatalogRow::new();
            for (idx, column) in row.columns().iter().enumerate() {
                let value: Option<String> = row.try_get(idx).map_err(|e| {
                    GenError::catalog(e, format!("reading column {}", column.name()))
                })?;
                catalog_row.insert(column.name(), value);
            }
            out.push(catalog_row);
        }
        Ok(out)
    }
}
