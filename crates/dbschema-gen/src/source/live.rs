//! Adapter over a live catalog reached through a [`CatalogExecutor`].

use async_trait::async_trait;
use tracing::{debug, info};

use crate::core::catalog::{CatalogRow, EnumRow, FieldRow, IndexRow, RowRef};
use crate::core::schema::{Engine, Field, Index};
use crate::core::traits::{CatalogExecutor, CatalogQuery, QueryKind, SchemaAdapter};
use crate::error::{GenError, Result};

use super::Ingestor;

/// Default Postgres schema searched for tables.
const DEFAULT_PG_SCHEMA: &str = "public";

// Every selected column is cast to text so executors only ever read strings.

const MYSQL_TABLES: &str = r#"
    SELECT CAST(TABLE_NAME AS CHAR(255)) AS table_name
    FROM INFORMATION_SCHEMA.TABLES
    WHERE TABLE_SCHEMA = COALESCE(NULLIF(?, ''), DATABASE()) AND TABLE_TYPE = 'BASE TABLE'
    ORDER BY TABLE_NAME
"#;

const MYSQL_FIELDS: &str = r#"
    SELECT
        CAST(TABLE_NAME AS CHAR(255)) AS table_name,
        CAST(COLUMN_NAME AS CHAR(255)) AS column_name,
        CAST(COLUMN_DEFAULT AS CHAR) AS column_default,
        CAST(ORDINAL_POSITION AS CHAR) AS ordinal_position,
        CAST(DATA_TYPE AS CHAR(255)) AS data_type,
        CAST(COLUMN_TYPE AS CHAR) AS column_type,
        CAST(IS_NULLABLE AS CHAR(3)) AS is_nullable,
        CAST(CHARACTER_MAXIMUM_LENGTH AS CHAR) AS character_maximum_length
    FROM INFORMATION_SCHEMA.COLUMNS
    WHERE TABLE_SCHEMA = COALESCE(NULLIF(?, ''), DATABASE()) AND TABLE_NAME = ?
    ORDER BY ORDINAL_POSITION
"#;

const MYSQL_INDEXES: &str = r#"
    SELECT
        CAST(TABLE_NAME AS CHAR(255)) AS table_name,
        CAST(INDEX_NAME AS CHAR(255)) AS index_name,
        CAST(COLUMN_NAME AS CHAR(255)) AS column_name,
        CAST(SEQ_IN_INDEX AS CHAR) AS seq_in_index,
        CAST(NULLABLE AS CHAR(3)) AS nullable,
        CAST(NON_UNIQUE AS CHAR) AS non_unique
    FROM INFORMATION_SCHEMA.STATISTICS
    WHERE TABLE_SCHEMA = COALESCE(NULLIF(?, ''), DATABASE()) AND TABLE_NAME = ?
      AND COLUMN_NAME IS NOT NULL
    ORDER BY INDEX_NAME, SEQ_IN_INDEX
"#;

const PG_TABLES: &str = r#"
    SELECT table_name::text AS table_name
    FROM information_schema.tables
    WHERE table_schema = $1::text AND table_type = 'BASE TABLE'
    ORDER BY table_name
"#;

const PG_FIELDS: &str = r#"
    SELECT
        c.table_name::text AS table_name,
        c.column_name::text AS column_name,
        c.column_default::text AS column_default,
        c.ordinal_position::text AS ordinal_position,
        c.data_type::text AS data_type,
        c.udt_name::text AS column_type,
        c.is_nullable::text AS is_nullable,
        c.character_maximum_length::text AS character_maximum_length
    FROM information_schema.columns c
    WHERE c.table_schema = $1::text AND c.table_name = $2::text
    ORDER BY c.ordinal_position
"#;

const PG_INDEXES: &str = r#"
    SELECT
        t.relname::text AS table_name,
        i.relname::text AS index_name,
        a.attname::text AS column_name,
        k.ord::text AS seq_in_index,
        (NOT a.attnotnull)::text AS nullable,
        (NOT ix.indisunique)::text AS non_unique
    FROM pg_index ix
    JOIN pg_class t ON t.oid = ix.indrelid
    JOIN pg_class i ON i.oid = ix.indexrelid
    JOIN pg_namespace n ON n.oid = t.relnamespace
    CROSS JOIN LATERAL unnest(ix.indkey) WITH ORDINALITY AS k(attnum, ord)
    JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = k.attnum
    WHERE n.nspname = $1::text AND t.relname = $2::text
    ORDER BY i.relname, k.ord
"#;

const PG_ENUMS: &str = r#"
    SELECT
        t.typname::text AS enum_name,
        array_agg(e.enumlabel ORDER BY e.enumsortorder)::text AS enum_values
    FROM pg_type t
    JOIN pg_enum e ON e.enumtypid = t.oid
    JOIN pg_namespace n ON n.oid = t.typnamespace
    WHERE n.nspname = $1::text
    GROUP BY t.typname
    ORDER BY t.typname
"#;

/// Build the catalog query of `kind` for an engine.
///
/// `schema` is the MySQL database (defaults to the connection's current one)
/// or the Postgres schema (defaults to `public`). `table` is required for
/// field and index queries.
pub fn catalog_query(
    engine: Engine,
    kind: QueryKind,
    schema: Option<&str>,
    table: Option<&str>,
) -> Result<CatalogQuery> {
    let per_table = matches!(kind, QueryKind::Fields | QueryKind::Indexes);
    if per_table && table.is_none() {
        return Err(GenError::Config(format!(
            "{:?} catalog query requires a table name",
            kind
        )));
    }

    let sql = match (engine, kind) {
        (Engine::MySql, QueryKind::Tables) => MYSQL_TABLES,
        (Engine::MySql, QueryKind::Fields) => MYSQL_FIELDS,
        (Engine::MySql, QueryKind::Indexes) => MYSQL_INDEXES,
        (Engine::MySql, QueryKind::Enums) => {
            return Err(GenError::Config(
                "MySQL declares enums inline; there is no enum catalog".to_string(),
            ))
        }
        (Engine::Postgres, QueryKind::Tables) => PG_TABLES,
        (Engine::Postgres, QueryKind::Fields) => PG_FIELDS,
        (Engine::Postgres, QueryKind::Indexes) => PG_INDEXES,
        (Engine::Postgres, QueryKind::Enums) => PG_ENUMS,
    };

    // An empty MySQL database name selects the connection's current database
    let schema = match engine {
        Engine::MySql => schema.unwrap_or_default().to_string(),
        Engine::Postgres => schema.unwrap_or(DEFAULT_PG_SCHEMA).to_string(),
    };

    let mut params = vec![schema];
    if per_table {
        params.extend(table.map(str::to_string));
    }

    Ok(CatalogQuery {
        kind,
        sql: sql.trim().to_string(),
        params,
    })
}

/// [`SchemaAdapter`] that issues catalog queries through an executor.
///
/// Postgres enum rows are fetched once, before the first column lookup.
pub struct LiveAdapter<E> {
    executor: E,
    ingestor: Ingestor,
    schema: Option<String>,
    enums_loaded: bool,
}

impl<E: CatalogExecutor> LiveAdapter<E> {
    pub fn new(engine: Engine, executor: E) -> Self {
        Self {
            executor,
            ingestor: Ingestor::new(engine),
            schema: None,
            enums_loaded: false,
        }
    }

    /// Read from a specific database (MySQL) or schema (Postgres).
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    async fn run(&self, kind: QueryKind, table: Option<&str>) -> Result<Vec<(RowRef, CatalogRow)>> {
        let query = catalog_query(self.ingestor.engine(), kind, self.schema.as_deref(), table)?;
        let dump = match kind {
            QueryKind::Tables => "tables",
            QueryKind::Fields => "fields",
            QueryKind::Indexes => "indexes",
            QueryKind::Enums => "enums",
        };
        let rows = self.executor.query(&query).await?;
        debug!("{:?} query returned {} rows", kind, rows.len());
        Ok(rows
            .into_iter()
            .enumerate()
            .map(|(idx, row)| (RowRef::new(dump, idx as u64 + 1), row))
            .collect())
    }

    async fn ensure_enums(&mut self) -> Result<()> {
        if self.enums_loaded || self.ingestor.engine() != Engine::Postgres {
            return Ok(());
        }
        let rows = self
            .run(QueryKind::Enums, None)
            .await?
            .into_iter()
            .map(|(at, row)| EnumRow::from_row(&row, at))
            .collect::<Result<Vec<_>>>()?;
        info!("Loaded {} enum types from catalog", rows.len());
        self.ingestor.register_enums(rows);
        self.enums_loaded = true;
        Ok(())
    }

    async fn index_rows(&self, table: &str) -> Result<Vec<IndexRow>> {
        self.run(QueryKind::Indexes, Some(table))
            .await?
            .into_iter()
            .map(|(at, row)| IndexRow::from_row(&row, at))
            .collect()
    }
}

#[async_trait]
impl<E: CatalogExecutor> SchemaAdapter for LiveAdapter<E> {
    fn engine(&self) -> Engine {
        self.ingestor.engine()
    }

    async fn list_tables(&mut self) -> Result<Vec<String>> {
        let mut tables = Vec::new();
        for (at, row) in self.run(QueryKind::Tables, None).await? {
            let name = row.get("table_name").ok_or_else(|| {
                GenError::malformed(at.dump, at.line, "'table_name' must not be null")
            })?;
            tables.push(name.to_string());
        }
        Ok(tables)
    }

    async fn fields_of(&mut self, table: &str) -> Result<Vec<Field>> {
        self.ensure_enums().await?;
        let rows = self
            .run(QueryKind::Fields, Some(table))
            .await?
            .into_iter()
            .map(|(at, row)| FieldRow::from_row(&row, at))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.ingestor.build_fields(table, rows))
    }

    async fn primary_key_of(&mut self, table: &str) -> Result<Option<Index>> {
        let rows = self.index_rows(table).await?;
        Ok(self.ingestor.build_primary_key(table, &rows))
    }

    async fn indexes_of(&mut self, table: &str) -> Result<Vec<Index>> {
        let rows = self.index_rows(table).await?;
        Ok(self.ingestor.build_indexes(table, &rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mysql_queries() {
        let q = catalog_query(Engine::MySql, QueryKind::Fields, None, Some("todo")).unwrap();
        assert!(q.sql.contains("INFORMATION_SCHEMA.COLUMNS"));
        assert_eq!(q.params, vec!["".to_string(), "todo".to_string()]);

        let q = catalog_query(Engine::MySql, QueryKind::Tables, Some("app"), None).unwrap();
        assert_eq!(q.params, vec!["app".to_string()]);

        assert!(catalog_query(Engine::MySql, QueryKind::Enums, None, None).is_err());
    }

    #[test]
    fn test_postgres_queries() {
        let q = catalog_query(Engine::Postgres, QueryKind::Indexes, None, Some("todo")).unwrap();
        assert!(q.sql.contains("pg_index"));
        assert_eq!(q.params, vec!["public".to_string(), "todo".to_string()]);

        let q = catalog_query(Engine::Postgres, QueryKind::Enums, Some("app"), None).unwrap();
        assert!(q.sql.contains("pg_enum"));
        assert_eq!(q.params, vec!["app".to_string()]);
    }

    #[test]
    fn test_per_table_query_needs_table() {
        assert!(catalog_query(Engine::Postgres, QueryKind::Fields, None, None).is_err());
    }
}
