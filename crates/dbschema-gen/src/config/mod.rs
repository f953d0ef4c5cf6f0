//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::Result;
use crate::generate::TableFilter;
use crate::source::TextDump;
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }

    /// The configured table filter, if any.
    pub fn table_filter(&self) -> Result<Option<TableFilter>> {
        TableFilter::from_lists(self.filter.include.clone(), self.filter.exclude.clone())
    }
}

impl DumpConfig {
    /// Read the dump files.
    pub fn read(&self) -> Result<TextDump> {
        TextDump::from_files(&self.fields, &self.indexes, self.enums.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::Engine;

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
engine: postgresql
dumps:
  fields: fields.csv
  indexes: indexes.csv
  enums: enums.csv
output:
  idl: schema.graphql
  dsl: resource.ts
filter:
  exclude: [audit_log]
connection:
  identifier: AppDb
  connection_uri_secret: SQL_CONNECTION_STRING
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.engine, Engine::Postgres);
        assert_eq!(
            config.dumps.as_ref().and_then(|d| d.enums.as_deref()),
            Some(Path::new("enums.csv"))
        );
        assert_eq!(
            config.table_filter().unwrap(),
            Some(TableFilter::Exclude(vec!["audit_log".into()]))
        );
        assert_eq!(
            config.connection.unwrap().connection_uri_secret,
            "SQL_CONNECTION_STRING"
        );
    }

    #[test]
    fn test_from_yaml_live_source() {
        let yaml = r#"
engine: mysql
source:
  host: db.internal
  database: app
  user: reader
  password: hunter2
output:
  dsl: resource.ts
"#;
        let config = Config::from_yaml(yaml).unwrap();
        let source = config.source.unwrap();
        assert_eq!(source.port_for(config.engine), 3306);
        assert_eq!(source.max_connections, 2);
        assert!(!format!("{:?}", source).contains("hunter2"));
    }

    #[test]
    fn test_unknown_engine_rejected() {
        let yaml = "engine: oracle\ndumps: {fields: f.csv, indexes: i.csv}\noutput: {idl: s.graphql}\n";
        assert!(Config::from_yaml(yaml).is_err());
    }
}
