//! Core traits for catalog ingestion.
//!
//! - [`SchemaAdapter`]: per-table catalog primitives plus the shared
//!   composition that turns them into models
//! - [`CatalogExecutor`]: the seam to whatever actually runs catalog queries
//!
//! # Design Patterns
//!
//! - **Template Method**: [`SchemaAdapter::describe_table`] and
//!   [`SchemaAdapter::get_models`] are written once against the primitives
//! - **Strategy**: live and captured-text adapters implement the primitives

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::Result;

use super::catalog::CatalogRow;
use super::identifier::to_type_name;
use super::schema::{Engine, Field, Index, Model, Schema};

/// Produce canonical models from one engine's catalog.
///
/// Primitives take `&mut self` because an adapter owns the enum registry it
/// fills while mapping columns; one adapter serves one run at a time.
#[async_trait]
pub trait SchemaAdapter: Send {
    /// Engine whose catalog this adapter reads.
    fn engine(&self) -> Engine;

    /// Table names in catalog order.
    async fn list_tables(&mut self) -> Result<Vec<String>>;

    /// Fields of a table, ordered by ordinal position.
    async fn fields_of(&mut self, table: &str) -> Result<Vec<Field>>;

    /// Primary key of a table, members ordered by sequence in index.
    async fn primary_key_of(&mut self, table: &str) -> Result<Option<Index>>;

    /// Secondary indexes of a table, members ordered by sequence in index.
    async fn indexes_of(&mut self, table: &str) -> Result<Vec<Index>>;

    /// Build one model from the primitives.
    ///
    /// Fields are loaded first so enum registration happens before keys are
    /// checked against the field list.
    async fn describe_table(&mut self, table: &str) -> Result<Model> {
        let fields = self.fields_of(table).await?;
        let primary_key = self.primary_key_of(table).await?;
        let indexes = self.indexes_of(table).await?;

        debug!(
            "Described {}: {} fields, {} indexes, primary key: {}",
            table,
            fields.len(),
            indexes.len(),
            primary_key.is_some()
        );

        Ok(Model::new(to_type_name(table), table, fields)
            .with_primary_key(primary_key)
            .with_indexes(indexes))
    }

    /// Describe every table, preserving [`list_tables`](Self::list_tables) order.
    async fn get_models(&mut self) -> Result<Vec<Model>> {
        let tables = self.list_tables().await?;
        let mut models = Vec::with_capacity(tables.len());
        for table in &tables {
            models.push(self.describe_table(table).await?);
        }
        Ok(models)
    }

    /// Collect every model into a [`Schema`].
    async fn build_schema(&mut self) -> Result<Schema> {
        let models = self.get_models().await?;
        let mut schema = Schema::new(self.engine());
        for model in models {
            schema.add_model(model);
        }
        info!("Ingested {} models from {} catalog", schema.len(), schema.engine());
        Ok(schema)
    }
}

/// Which catalog relation a query reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Tables,
    Fields,
    Indexes,
    Enums,
}

/// One catalog query: engine-specific SQL plus positional text parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    pub kind: QueryKind,
    pub sql: String,
    pub params: Vec<String>,
}

/// Executes catalog queries and returns rows of text.
///
/// Implementations may talk to a pool, a remote proxy or canned fixtures;
/// transport is opaque to the adapter. Every returned column must be text or
/// null.
#[async_trait]
pub trait CatalogExecutor: Send + Sync {
    async fn query(&self, query: &CatalogQuery) -> Result<Vec<CatalogRow>>;
}
