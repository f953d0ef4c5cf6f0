//! Canonical schema model: engine, models, fields, keys and enums.
//!
//! These types provide an engine-agnostic representation of catalog metadata.
//! Adapters populate them in a single pass; generators only read them.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::dialect::canonical::{EnumType, FieldType};
use crate::error::{GenError, Result};

/// Source database engine.
///
/// Deserializes through [`FromStr`], so config files accept the same
/// spellings as the command line in any case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Engine {
    MySql,
    Postgres,
}

impl Engine {
    /// Canonical engine tag, as written into generated documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::MySql => "mysql",
            Engine::Postgres => "postgres",
        }
    }

    /// Name of the index the catalog reports for a table's primary key.
    pub fn primary_key_index_name(&self, table: &str) -> String {
        match self {
            Engine::MySql => "PRIMARY".to_string(),
            Engine::Postgres => format!("{}_pkey", table),
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Engine {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Engine::MySql),
            "postgres" | "postgresql" | "pg" => Ok(Engine::Postgres),
            other => Err(GenError::Config(format!(
                "Unknown database engine: '{}'. Supported engines: mysql, postgres",
                other
            ))),
        }
    }
}

impl TryFrom<String> for Engine {
    type Error = GenError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// Column default after classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultValue {
    /// A constant the schema carries as a static default.
    Literal(String),
    /// An expression the engine evaluates at write time (kept for diagnostics).
    Computed(String),
}

/// One column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Name in the generated documents.
    pub name: String,
    /// Column name in the catalog.
    pub column: String,
    /// Canonical type.
    pub field_type: FieldType,
    /// Maximum character length, when the catalog bounds it.
    pub length: Option<u32>,
    /// Classified default.
    pub default: Option<DefaultValue>,
}

impl Field {
    /// Literal default text, if the default is a constant.
    pub fn literal_default(&self) -> Option<&str> {
        match &self.default {
            Some(DefaultValue::Literal(value)) => Some(value),
            _ => None,
        }
    }

    /// Whether the engine computes this column's default.
    pub fn has_computed_default(&self) -> bool {
        matches!(self.default, Some(DefaultValue::Computed(_)))
    }

    /// Whether the generated name differs from the column name.
    pub fn is_renamed(&self) -> bool {
        self.name != self.column
    }
}

/// Key or index: name plus ordered field names.
///
/// The first field is the lead (partition) key, the rest are sort keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub name: String,
    pub fields: Vec<String>,
}

impl Index {
    pub fn new(name: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// The lead field.
    pub fn lead(&self) -> Option<&str> {
        self.fields.first().map(String::as_str)
    }

    /// Fields after the lead, in order.
    pub fn sort_keys(&self) -> &[String] {
        if self.fields.is_empty() {
            &[]
        } else {
            &self.fields[1..]
        }
    }
}

/// One table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    /// Type name in the generated documents.
    pub name: String,
    /// Table name in the catalog.
    pub table: String,
    fields: Vec<Field>,
    primary_key: Option<Index>,
    indexes: Vec<Index>,
}

impl Model {
    /// Create a model from its fields in catalog column order.
    pub fn new(name: impl Into<String>, table: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            fields,
            primary_key: None,
            indexes: Vec::new(),
        }
    }

    /// Set the primary key. Members without a backing field are dropped.
    pub fn with_primary_key(mut self, key: Option<Index>) -> Self {
        self.primary_key = key.and_then(|k| self.checked_index(k));
        self
    }

    /// Add secondary indexes. Members without a backing field are dropped.
    pub fn with_indexes(mut self, indexes: Vec<Index>) -> Self {
        for index in indexes {
            if let Some(index) = self.checked_index(index) {
                self.indexes.push(index);
            }
        }
        self
    }

    fn checked_index(&self, mut index: Index) -> Option<Index> {
        let before = index.fields.len();
        index.fields.retain(|f| self.field(f).is_some());
        if index.fields.len() != before {
            warn!(
                "Index {} on {} references unknown fields; dropping them",
                index.name, self.table
            );
        }
        if index.fields.is_empty() {
            None
        } else {
            Some(index)
        }
    }

    /// Fields in catalog column order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up a field by generated name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Look up a field by catalog column name.
    pub fn field_by_column(&self, column: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.column == column)
    }

    pub fn primary_key(&self) -> Option<&Index> {
        self.primary_key.as_ref()
    }

    pub fn has_primary_key(&self) -> bool {
        self.primary_key.is_some()
    }

    /// Secondary indexes.
    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }

    /// Whether the type name differs from the table name.
    pub fn is_renamed(&self) -> bool {
        self.name != self.table
    }

    /// Enums referenced by this model's fields, in field order.
    pub fn enums(&self) -> impl Iterator<Item = (&Field, &EnumType)> {
        self.fields
            .iter()
            .filter_map(|f| f.field_type.enum_type().map(|e| (f, e)))
    }
}

/// The full canonical graph for one engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    engine: Engine,
    models: IndexMap<String, Model>,
}

impl Schema {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            models: IndexMap::new(),
        }
    }

    pub fn engine(&self) -> Engine {
        self.engine
    }

    /// Insert a model. A model with the same name is replaced in place.
    pub fn add_model(&mut self, model: Model) {
        if self.models.contains_key(&model.name) {
            debug!("Model {} replaced by table {}", model.name, model.table);
        }
        self.models.insert(model.name.clone(), model);
    }

    pub fn model(&self, name: &str) -> Option<&Model> {
        self.models.get(name)
    }

    /// Models in insertion order.
    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.models.values()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Every distinct enum referenced by any model, by first reference.
    pub fn enums(&self) -> Vec<&EnumType> {
        let mut seen: IndexMap<&str, &EnumType> = IndexMap::new();
        for model in self.models() {
            for (_, e) in model.enums() {
                seen.entry(e.name.as_str()).or_insert(e);
            }
        }
        seen.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::canonical::ScalarType;

    fn make_field(name: &str) -> Field {
        Field {
            name: name.to_string(),
            column: name.to_string(),
            field_type: FieldType::Scalar(ScalarType::Int).non_null(),
            length: None,
            default: None,
        }
    }

    #[test]
    fn test_engine_parsing() {
        assert_eq!("MySQL".parse::<Engine>().unwrap(), Engine::MySql);
        assert_eq!("mariadb".parse::<Engine>().unwrap(), Engine::MySql);
        assert_eq!("postgresql".parse::<Engine>().unwrap(), Engine::Postgres);
        assert_eq!("pg".parse::<Engine>().unwrap(), Engine::Postgres);
        assert!("mssql".parse::<Engine>().is_err());
        assert_eq!(Engine::Postgres.to_string(), "postgres");
    }

    #[test]
    fn test_engine_deserializes_like_from_str() {
        for (raw, engine) in [
            ("MySQL", Engine::MySql),
            ("mariadb", Engine::MySql),
            ("PostgreSQL", Engine::Postgres),
            ("pg", Engine::Postgres),
        ] {
            assert_eq!(serde_yaml::from_str::<Engine>(raw).unwrap(), engine);
        }
        let err = serde_yaml::from_str::<Engine>("mssql").unwrap_err();
        assert!(err.to_string().contains("Unknown database engine"));
        assert_eq!(serde_json::to_string(&Engine::MySql).unwrap(), "\"mysql\"");
    }

    #[test]
    fn test_primary_key_index_names() {
        assert_eq!(Engine::MySql.primary_key_index_name("todo"), "PRIMARY");
        assert_eq!(Engine::Postgres.primary_key_index_name("todo"), "todo_pkey");
    }

    #[test]
    fn test_index_lead_and_sort_keys() {
        let index = Index::new("by_owner", vec!["owner".into(), "createdAt".into()]);
        assert_eq!(index.lead(), Some("owner"));
        assert_eq!(index.sort_keys(), ["createdAt".to_string()]);

        let empty = Index::new("empty", vec![]);
        assert_eq!(empty.lead(), None);
        assert!(empty.sort_keys().is_empty());
    }

    #[test]
    fn test_model_drops_unknown_index_members() {
        let model = Model::new("Todo", "todo", vec![make_field("id"), make_field("owner")])
            .with_primary_key(Some(Index::new("PRIMARY", vec!["id".into(), "ghost".into()])))
            .with_indexes(vec![
                Index::new("by_owner", vec!["owner".into()]),
                Index::new("by_ghost", vec!["ghost".into()]),
            ]);

        assert_eq!(model.primary_key().unwrap().fields, vec!["id"]);
        assert_eq!(model.indexes().len(), 1);
        assert_eq!(model.indexes()[0].name, "by_owner");
    }

    #[test]
    fn test_schema_duplicate_insert_overwrites_in_place() {
        let mut schema = Schema::new(Engine::MySql);
        schema.add_model(Model::new("A", "a", vec![]));
        schema.add_model(Model::new("B", "b", vec![]));
        schema.add_model(Model::new("A", "as", vec![make_field("id")]));

        let names: Vec<&str> = schema.models().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(schema.model("A").unwrap().table, "as");
        assert_eq!(schema.len(), 2);
    }

    #[test]
    fn test_schema_enums_are_distinct() {
        let mood = EnumType::new("mood", vec!["happy".into()]);
        let mut a = make_field("mood");
        a.field_type = FieldType::Enum(mood.clone());
        let mut b = make_field("feeling");
        b.field_type = FieldType::Enum(mood).non_null();

        let mut schema = Schema::new(Engine::Postgres);
        schema.add_model(Model::new("Person", "person", vec![a]));
        schema.add_model(Model::new("Pet", "pet", vec![b]));

        let enums = schema.enums();
        assert_eq!(enums.len(), 1);
        assert_eq!(enums[0].name, "mood");
    }

    #[test]
    fn test_field_defaults() {
        let mut field = make_field("status");
        field.default = Some(DefaultValue::Literal("open".into()));
        assert_eq!(field.literal_default(), Some("open"));
        assert!(!field.has_computed_default());

        field.default = Some(DefaultValue::Computed("NOW()".into()));
        assert_eq!(field.literal_default(), None);
        assert!(field.has_computed_default());
    }
}
