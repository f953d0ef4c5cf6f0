//! Generation orchestrator - main workflow coordinator.
//!
//! Loads the catalog named by the configuration, renders every configured
//! document in memory, and only then writes files, so a failed run leaves
//! existing outputs untouched.

use std::path::PathBuf;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{Config, SourceConfig};
use crate::core::schema::{Engine, Schema};
use crate::core::traits::SchemaAdapter;
use crate::error::{GenError, Result};
use crate::generate::{carried_filter, Document, DslGenerator, IdlGenerator};
use crate::source::TextAdapter;

/// Generation orchestrator.
pub struct Orchestrator {
    config: Config,
}

/// Documents rendered for one schema, not yet written.
#[derive(Debug, Clone, Default)]
pub struct Rendered {
    pub idl: Option<String>,
    pub dsl: Option<String>,
}

/// Result of a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Source engine.
    pub engine: Engine,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Models ingested from the catalog.
    pub models: usize,

    /// Distinct enums referenced by the models.
    pub enums: usize,

    /// Tables without a primary key.
    pub tables_without_key: Vec<String>,

    /// Files written.
    pub written: Vec<PathBuf>,
}

impl GenerationResult {
    /// Serialize result to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Orchestrator {
    /// Create a new orchestrator. Connections are opened lazily by
    /// [`load_schema`](Self::load_schema).
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Ingest the configured catalog.
    pub async fn load_schema(&self) -> Result<Schema> {
        let engine = self.config.engine;
        match (&self.config.source, &self.config.dumps) {
            (None, Some(dumps)) => {
                let dump = dumps.read()?;
                let mut adapter = TextAdapter::new(engine, &dump)?;
                adapter.build_schema().await
            }
            (Some(source), None) => load_live(engine, source).await,
            _ => Err(GenError::Config(
                "exactly one of source or dumps is required".into(),
            )),
        }
    }

    /// Render every configured document without writing anything.
    ///
    /// Both documents see the same table filter: the configured one, else
    /// the one carried in the existing IDL document.
    pub fn render(&self, schema: &Schema) -> Result<Rendered> {
        let existing = match &self.config.output.idl {
            Some(path) if path.exists() => {
                debug!("Reconciling with existing document {}", path.display());
                Some(std::fs::read_to_string(path)?)
            }
            _ => None,
        };

        let filter = match self.config.table_filter()? {
            Some(filter) => Some(filter),
            None => match &existing {
                Some(text) => carried_filter(&Document::parse(text)?)?,
                None => None,
            },
        };
        if let Some(filter) = &filter {
            debug!("Filtering tables by {}: {:?}", filter.key(), filter.tables());
        }

        let mut rendered = Rendered::default();
        if self.config.output.idl.is_some() {
            rendered.idl = Some(
                IdlGenerator::new()
                    .with_filter(filter.clone())
                    .render(schema, existing.as_deref())?,
            );
        }

        if self.config.output.dsl.is_some() {
            rendered.dsl = Some(
                DslGenerator::new()
                    .with_filter(filter)
                    .render(schema, self.config.connection.as_ref())?,
            );
        }

        Ok(rendered)
    }

    /// Load, render and write.
    pub async fn run(&self) -> Result<GenerationResult> {
        let started = Instant::now();
        let schema = self.load_schema().await?;
        let rendered = self.render(&schema)?;

        let mut written = Vec::new();
        let outputs = [
            (&self.config.output.idl, rendered.idl),
            (&self.config.output.dsl, rendered.dsl),
        ];
        for (path, text) in outputs {
            if let (Some(path), Some(text)) = (path, text) {
                std::fs::write(path, text)?;
                info!("Wrote {}", path.display());
                written.push(path.clone());
            }
        }

        let tables_without_key = schema
            .models()
            .filter(|m| !m.has_primary_key())
            .map(|m| m.table.clone())
            .collect();

        Ok(GenerationResult {
            engine: schema.engine(),
            duration_seconds: started.elapsed().as_secs_f64(),
            models: schema.len(),
            enums: schema.enums().len(),
            tables_without_key,
            written,
        })
    }
}

/// Ingest a live catalog through the engine's driver.
#[allow(unused_variables)]
async fn load_live(engine: Engine, source: &SourceConfig) -> Result<Schema> {
    match engine {
        #[cfg(feature = "mysql")]
        Engine::MySql => {
            let executor = crate::drivers::MySqlExecutor::connect(source).await?;
            let mut adapter = crate::source::LiveAdapter::new(engine, executor);
            adapter.build_schema().await
        }
        #[cfg(feature = "postgres")]
        Engine::Postgres => {
            let executor = crate::drivers::PostgresExecutor::connect(source).await?;
            let mut adapter = crate::source::LiveAdapter::new(engine, executor);
            if let Some(schema) = &source.schema {
                adapter = adapter.with_schema(schema.clone());
            }
            adapter.build_schema().await
        }
        #[allow(unreachable_patterns)]
        other => Err(GenError::Config(format!(
            "reading a live {} catalog requires the '{}' feature",
            other,
            other.as_str()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DumpConfig, FilterConfig, OutputConfig};

    const FIELDS: &str = "\
table_name,column_name,column_default,ordinal_position,data_type,column_type,is_nullable,character_maximum_length
todo,id,NULL,1,int,int,NO,NULL
todo,title,NULL,2,varchar,varchar(255),NO,255
log,line,NULL,1,text,text,YES,65535
";

    const INDEXES: &str = "\
table_name,index_name,column_name,seq_in_index
todo,PRIMARY,id,1
";

    fn config(dir: &std::path::Path) -> Config {
        std::fs::write(dir.join("fields.csv"), FIELDS).unwrap();
        std::fs::write(dir.join("indexes.csv"), INDEXES).unwrap();
        Config {
            engine: Engine::MySql,
            source: None,
            dumps: Some(DumpConfig {
                fields: dir.join("fields.csv"),
                indexes: dir.join("indexes.csv"),
                enums: None,
            }),
            output: OutputConfig {
                idl: Some(dir.join("schema.graphql")),
                dsl: Some(dir.join("resource.ts")),
            },
            filter: FilterConfig::default(),
            connection: None,
        }
    }

    #[tokio::test]
    async fn test_run_writes_both_documents() {
        let dir = tempfile::tempdir().unwrap();
        let result = Orchestrator::new(config(dir.path())).run().await.unwrap();

        assert_eq!(result.models, 2);
        assert_eq!(result.tables_without_key, vec!["log"]);
        assert_eq!(result.written.len(), 2);

        let idl = std::fs::read_to_string(dir.path().join("schema.graphql")).unwrap();
        assert!(idl.contains("type Todo @model @refersTo(name: \"todo\") {"));
        let dsl = std::fs::read_to_string(dir.path().join("resource.ts")).unwrap();
        assert!(dsl.contains("\"todo\": a.model({"));
        assert!(!dsl.contains("\"log\""));
    }

    #[tokio::test]
    async fn test_failed_render_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.filter.include = Some(vec!["log".into()]);

        let err = Orchestrator::new(config).run().await.unwrap_err();
        assert!(matches!(err, GenError::NoPrimaryKey(1)));
        assert!(!dir.path().join("schema.graphql").exists());
        assert!(!dir.path().join("resource.ts").exists());
    }

    #[tokio::test]
    async fn test_filter_carried_in_document_applies_to_both_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        std::fs::write(
            dir.path().join("schema.graphql"),
            "input AMPLIFY {\n  include: [String] = [\"todo\"]\n}\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("fields.csv"),
            format!("{}note,id,NULL,1,int,int,NO,NULL\n", FIELDS),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("indexes.csv"),
            format!("{}note,PRIMARY,id,1\n", INDEXES),
        )
        .unwrap();

        let orchestrator = Orchestrator::new(config);
        let schema = orchestrator.load_schema().await.unwrap();
        let rendered = orchestrator.render(&schema).unwrap();

        let idl = rendered.idl.unwrap();
        assert!(idl.contains("type Todo @model"));
        assert!(!idl.contains("type Note"));
        let dsl = rendered.dsl.unwrap();
        assert!(dsl.contains("\"todo\": a.model({"));
        assert!(!dsl.contains("\"note\""));
    }

    #[tokio::test]
    async fn test_configured_filter_wins_over_carried_one() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.filter.exclude = Some(vec!["log".into()]);
        std::fs::write(
            dir.path().join("schema.graphql"),
            "input AMPLIFY {\n  include: [String] = [\"log\"]\n}\n",
        )
        .unwrap();

        let orchestrator = Orchestrator::new(config);
        let schema = orchestrator.load_schema().await.unwrap();
        let rendered = orchestrator.render(&schema).unwrap();

        let idl = rendered.idl.unwrap();
        assert!(idl.contains("exclude: [String] = [\"log\"]"));
        assert!(idl.contains("type Todo @model"));
        assert!(rendered.dsl.unwrap().contains("\"todo\": a.model({"));
    }

    #[test]
    fn test_result_to_json() {
        let result = GenerationResult {
            engine: Engine::Postgres,
            duration_seconds: 0.5,
            models: 3,
            enums: 1,
            tables_without_key: vec![],
            written: vec![PathBuf::from("schema.graphql")],
        };
        let json = result.to_json().unwrap();
        assert!(json.contains("\"engine\": \"postgres\""));
        assert!(json.contains("\"models\": 3"));
    }
}
