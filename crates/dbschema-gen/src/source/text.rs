//! Adapter over captured catalog dumps (CSV text).
//!
//! A dump is the result of running the catalog queries once and saving their
//! output. Cells spelled `NULL` or `null` are read as absent values.

use std::path::Path;

use async_trait::async_trait;
use indexmap::IndexMap;
use tracing::{debug, info};

use crate::core::catalog::{
    missing_columns, CatalogRow, EnumRow, FieldRow, IndexRow, RowRef, ENUM_COLUMNS,
    FIELD_COLUMNS, INDEX_COLUMNS,
};
use crate::core::schema::{Engine, Field, Index};
use crate::core::traits::SchemaAdapter;
use crate::error::{GenError, Result};

use super::Ingestor;

/// Raw CSV text of one catalog capture.
#[derive(Debug, Clone, Default)]
pub struct TextDump {
    pub fields: String,
    pub indexes: String,
    /// Postgres enum rows; ignored for MySQL.
    pub enums: Option<String>,
}

impl TextDump {
    pub fn new(fields: impl Into<String>, indexes: impl Into<String>) -> Self {
        Self {
            fields: fields.into(),
            indexes: indexes.into(),
            enums: None,
        }
    }

    pub fn with_enums(mut self, enums: impl Into<String>) -> Self {
        self.enums = Some(enums.into());
        self
    }

    /// Read a dump from files.
    pub fn from_files(
        fields: impl AsRef<Path>,
        indexes: impl AsRef<Path>,
        enums: Option<&Path>,
    ) -> Result<Self> {
        let mut dump = Self::new(
            std::fs::read_to_string(fields)?,
            std::fs::read_to_string(indexes)?,
        );
        if let Some(path) = enums {
            dump.enums = Some(std::fs::read_to_string(path)?);
        }
        Ok(dump)
    }
}

/// Parse CSV text into catalog rows, checking the header against the
/// required columns.
///
/// With `require_rows`, a header without any data rows is also empty.
fn parse_csv(
    dump: &'static str,
    text: &str,
    required: &[&str],
    require_rows: bool,
) -> Result<Vec<(RowRef, CatalogRow)>> {
    if text.trim().is_empty() {
        return Err(GenError::EmptyDump { dump });
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let missing = missing_columns(headers.iter(), required);
    if !missing.is_empty() {
        return Err(GenError::MissingColumns {
            dump,
            columns: missing,
        });
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let row = CatalogRow::from_pairs(headers.iter().zip(record.iter()).map(|(h, v)| {
            let value = if v.eq_ignore_ascii_case("null") {
                None
            } else {
                Some(v)
            };
            (h, value)
        }));
        rows.push((RowRef::new(dump, line), row));
    }

    if require_rows && rows.is_empty() {
        return Err(GenError::EmptyDump { dump });
    }
    debug!("Read {} rows from {} dump", rows.len(), dump);
    Ok(rows)
}

/// [`SchemaAdapter`] over a [`TextDump`].
///
/// All parsing and validation happens at construction; the primitives only
/// hand out rows already grouped by table.
#[derive(Debug)]
pub struct TextAdapter {
    ingestor: Ingestor,
    fields: IndexMap<String, Vec<FieldRow>>,
    indexes: IndexMap<String, Vec<IndexRow>>,
}

impl TextAdapter {
    pub fn new(engine: Engine, dump: &TextDump) -> Result<Self> {
        let mut ingestor = Ingestor::new(engine);

        let mut fields: IndexMap<String, Vec<FieldRow>> = IndexMap::new();
        for (at, row) in parse_csv("fields", &dump.fields, FIELD_COLUMNS, true)? {
            let row = FieldRow::from_row(&row, at)?;
            fields.entry(row.table_name.clone()).or_default().push(row);
        }

        let mut indexes: IndexMap<String, Vec<IndexRow>> = IndexMap::new();
        for (at, row) in parse_csv("indexes", &dump.indexes, INDEX_COLUMNS, false)? {
            let row = IndexRow::from_row(&row, at)?;
            indexes.entry(row.table_name.clone()).or_default().push(row);
        }

        if let (Engine::Postgres, Some(text)) = (engine, &dump.enums) {
            let rows = parse_csv("enums", text, ENUM_COLUMNS, false)?
                .into_iter()
                .map(|(at, row)| EnumRow::from_row(&row, at))
                .collect::<Result<Vec<_>>>()?;
            ingestor.register_enums(rows);
        }

        info!(
            "Loaded catalog dump: {} tables, {} indexed tables, {} enums",
            fields.len(),
            indexes.len(),
            ingestor.enums().len()
        );

        Ok(Self {
            ingestor,
            fields,
            indexes,
        })
    }

    fn index_rows(&self, table: &str) -> &[IndexRow] {
        self.indexes.get(table).map(Vec::as_slice).unwrap_or_default()
    }
}

#[async_trait]
impl SchemaAdapter for TextAdapter {
    fn engine(&self) -> Engine {
        self.ingestor.engine()
    }

    async fn list_tables(&mut self) -> Result<Vec<String>> {
        Ok(self.fields.keys().cloned().collect())
    }

    async fn fields_of(&mut self, table: &str) -> Result<Vec<Field>> {
        let rows = self.fields.get(table).cloned().unwrap_or_default();
        Ok(self.ingestor.build_fields(table, rows))
    }

    async fn primary_key_of(&mut self, table: &str) -> Result<Option<Index>> {
        Ok(self
            .ingestor
            .build_primary_key(table, self.index_rows(table)))
    }

    async fn indexes_of(&mut self, table: &str) -> Result<Vec<Index>> {
        Ok(self.ingestor.build_indexes(table, self.index_rows(table)))
    }
}
