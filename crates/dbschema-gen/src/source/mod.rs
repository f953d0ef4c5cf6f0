//! Source adapters: live catalog queries and captured text dumps.
//!
//! Both adapters funnel their rows through one [`Ingestor`], so naming,
//! typing and default classification happen in exactly one place and the
//! two produce identical models for row-equivalent input.

mod live;
mod text;

pub use live::{catalog_query, LiveAdapter};
pub use text::{TextAdapter, TextDump};

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::core::catalog::{EnumRow, FieldRow, IndexRow};
use crate::core::identifier::{is_valid_name, to_field_name};
use crate::core::schema::{DefaultValue, Engine, Field, Index};
use crate::dialect::{classify_default, EnumRegistry, TypeMapper};

/// Field name for a catalog column: verbatim when already legal.
pub fn field_name_for(column: &str) -> String {
    if is_valid_name(column) {
        column.to_string()
    } else {
        to_field_name(column)
    }
}

/// Unique field names for one table's columns, in the given order.
///
/// Legal column names are kept verbatim and claim their names first. A
/// normalized name that collides with one already taken gets the first free
/// `_<n>` suffix, so `due-date` next to `dueDate` becomes `dueDate_1`.
pub fn field_names_for<'a>(columns: impl IntoIterator<Item = &'a str> + Clone) -> Vec<String> {
    let mut taken: HashSet<String> = columns
        .clone()
        .into_iter()
        .filter(|c| is_valid_name(c))
        .map(str::to_string)
        .collect();

    columns
        .into_iter()
        .map(|column| {
            if is_valid_name(column) {
                return column.to_string();
            }
            let base = to_field_name(column);
            let mut name = base.clone();
            let mut suffix = 0;
            while taken.contains(&name) {
                suffix += 1;
                name = format!("{}_{}", base, suffix);
            }
            if suffix > 0 {
                warn!("Column '{}' normalizes to taken name {}; using {}", column, base, name);
            }
            taken.insert(name.clone());
            name
        })
        .collect()
}

/// Shared row-to-model conversion for one adapter instance.
///
/// Owns the engine's type mapper and the enum registry, so every column seen
/// by an adapter resolves enums against the same state. Field names chosen
/// for a table are remembered so its key members resolve to the same names.
#[derive(Debug, Clone)]
pub struct Ingestor {
    mapper: TypeMapper,
    enums: EnumRegistry,
    names: HashMap<String, HashMap<String, String>>,
}

impl Ingestor {
    pub fn new(engine: Engine) -> Self {
        Self {
            mapper: TypeMapper::new(engine),
            enums: EnumRegistry::new(),
            names: HashMap::new(),
        }
    }

    pub fn engine(&self) -> Engine {
        self.mapper.engine()
    }

    /// Enums registered so far.
    pub fn enums(&self) -> &EnumRegistry {
        &self.enums
    }

    /// Declare catalog-level enums (Postgres).
    pub fn register_enums(&mut self, rows: impl IntoIterator<Item = EnumRow>) {
        for row in rows {
            self.enums.declare(&row.enum_name, row.values);
        }
    }

    /// Convert one table's column rows into fields, ordered by ordinal position.
    pub fn build_fields(&mut self, table: &str, mut rows: Vec<FieldRow>) -> Vec<Field> {
        rows.sort_by_key(|r| r.ordinal_position);
        let names = field_names_for(rows.iter().map(|r| r.column_name.as_str()));
        self.names.insert(
            table.to_string(),
            rows.iter()
                .map(|r| r.column_name.clone())
                .zip(names.iter().cloned())
                .collect(),
        );

        let engine = self.engine();
        let mapper = self.mapper;
        let enums = &mut self.enums;

        rows.into_iter()
            .zip(names)
            .map(|(row, name)| {
                let default = classify_default(engine, row.column_default.as_deref());
                let computed = matches!(default, Some(DefaultValue::Computed(_)));
                if computed {
                    debug!(
                        "{}.{} has a computed default; field made optional",
                        table, row.column_name
                    );
                }

                let field_type = mapper.map_type(
                    &row.data_type,
                    row.is_nullable || computed,
                    table,
                    &row.column_name,
                    &row.column_type,
                    enums,
                );

                Field {
                    name,
                    column: row.column_name,
                    field_type,
                    length: row.character_maximum_length,
                    default,
                }
            })
            .collect()
    }

    /// The primary key among one table's index rows.
    pub fn build_primary_key(&self, table: &str, rows: &[IndexRow]) -> Option<Index> {
        let pk_name = self.engine().primary_key_index_name(table);
        self.group_indexes(table, rows)
            .into_iter()
            .find(|index| index.name == pk_name)
    }

    /// Every index except the primary key, in order of first appearance.
    pub fn build_indexes(&self, table: &str, rows: &[IndexRow]) -> Vec<Index> {
        let pk_name = self.engine().primary_key_index_name(table);
        self.group_indexes(table, rows)
            .into_iter()
            .filter(|index| index.name != pk_name)
            .collect()
    }

    /// Field name given to a column of `table` by [`build_fields`](Self::build_fields).
    fn field_name(&self, table: &str, column: &str) -> String {
        self.names
            .get(table)
            .and_then(|columns| columns.get(column))
            .cloned()
            .unwrap_or_else(|| field_name_for(column))
    }

    /// Group a table's index rows by index name, members ordered by sequence.
    fn group_indexes(&self, table: &str, rows: &[IndexRow]) -> Vec<Index> {
        let mut grouped: IndexMap<&str, Vec<&IndexRow>> = IndexMap::new();
        for row in rows.iter().filter(|r| r.table_name == table) {
            grouped.entry(row.index_name.as_str()).or_default().push(row);
        }
        grouped
            .into_iter()
            .map(|(name, mut members)| {
                members.sort_by_key(|m| m.seq_in_index);
                let fields = members
                    .iter()
                    .map(|m| self.field_name(table, &m.column_name))
                    .collect();
                Index::new(name, fields)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_row(column: &str, position: u32, data_type: &str, nullable: bool) -> FieldRow {
        FieldRow {
            table_name: "todo".to_string(),
            column_name: column.to_string(),
            column_default: None,
            ordinal_position: position,
            data_type: data_type.to_string(),
            column_type: data_type.to_string(),
            is_nullable: nullable,
            character_maximum_length: None,
        }
    }

    fn index_row(index: &str, column: &str, seq: u32) -> IndexRow {
        IndexRow {
            table_name: "todo".to_string(),
            index_name: index.to_string(),
            column_name: column.to_string(),
            seq_in_index: seq,
        }
    }

    #[test]
    fn test_field_name_for() {
        assert_eq!(field_name_for("due_date"), "due_date");
        assert_eq!(field_name_for("due-date"), "dueDate");
        assert_eq!(field_name_for("2fa"), "fa");
    }

    #[test]
    fn test_colliding_columns_get_distinct_names() {
        assert_eq!(
            field_names_for(["due-date", "dueDate", "due date"]),
            vec!["dueDate_1", "dueDate", "dueDate_2"]
        );
        assert_eq!(field_names_for(["id", "title"]), vec!["id", "title"]);
    }

    #[test]
    fn test_index_members_follow_collision_names() {
        let mut ingestor = Ingestor::new(Engine::MySql);
        let fields = ingestor.build_fields(
            "todo",
            vec![
                field_row("due-date", 1, "date", false),
                field_row("dueDate", 2, "date", true),
            ],
        );
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["dueDate_1", "dueDate"]);

        let pk = ingestor
            .build_primary_key("todo", &[index_row("PRIMARY", "due-date", 1)])
            .unwrap();
        assert_eq!(pk.fields, vec!["dueDate_1"]);
        let indexes = ingestor.build_indexes("todo", &[index_row("by_due", "dueDate", 1)]);
        assert_eq!(indexes[0].fields, vec!["dueDate"]);
    }

    #[test]
    fn test_fields_ordered_by_position() {
        let mut ingestor = Ingestor::new(Engine::MySql);
        let fields = ingestor.build_fields(
            "todo",
            vec![
                field_row("title", 2, "varchar", false),
                field_row("id", 1, "int", false),
            ],
        );
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "title"]);
    }

    #[test]
    fn test_computed_default_forces_optional() {
        let mut ingestor = Ingestor::new(Engine::MySql);
        let mut row = field_row("created_at", 1, "datetime", false);
        row.column_default = Some("CURRENT_TIMESTAMP".to_string());
        let fields = ingestor.build_fields("todo", vec![row]);

        assert!(!fields[0].field_type.is_required());
        assert!(fields[0].has_computed_default());
        assert_eq!(fields[0].literal_default(), None);
    }

    #[test]
    fn test_literal_default_keeps_required() {
        let mut ingestor = Ingestor::new(Engine::MySql);
        let mut row = field_row("status", 1, "varchar", false);
        row.column_default = Some("open".to_string());
        let fields = ingestor.build_fields("todo", vec![row]);

        assert!(fields[0].field_type.is_required());
        assert_eq!(fields[0].literal_default(), Some("open"));
    }

    #[test]
    fn test_index_grouping_and_primary_key() {
        let ingestor = Ingestor::new(Engine::MySql);
        let rows = vec![
            index_row("by_owner", "created_at", 2),
            index_row("PRIMARY", "id", 1),
            index_row("by_owner", "owner", 1),
            index_row("by_title", "title", 1),
        ];

        let pk = ingestor.build_primary_key("todo", &rows).unwrap();
        assert_eq!(pk.fields, vec!["id"]);

        let indexes = ingestor.build_indexes("todo", &rows);
        assert_eq!(indexes.len(), 2);
        assert_eq!(indexes[0].name, "by_owner");
        assert_eq!(indexes[0].fields, vec!["owner", "created_at"]);
        assert_eq!(indexes[1].name, "by_title");
    }

    #[test]
    fn test_postgres_primary_key_name() {
        let ingestor = Ingestor::new(Engine::Postgres);
        let rows = vec![index_row("todo_pkey", "id", 1), index_row("PRIMARY", "x", 1)];
        assert_eq!(ingestor.build_primary_key("todo", &rows).unwrap().name, "todo_pkey");
        assert_eq!(ingestor.build_indexes("todo", &rows)[0].name, "PRIMARY");
    }

    #[test]
    fn test_registered_enums_resolve_in_fields() {
        let mut ingestor = Ingestor::new(Engine::Postgres);
        ingestor.register_enums(vec![EnumRow {
            enum_name: "mood".to_string(),
            values: vec!["happy".to_string(), "sad".to_string()],
        }]);
        let mut row = field_row("mood", 1, "USER-DEFINED", true);
        row.column_type = "mood".to_string();
        let fields = ingestor.build_fields("person", vec![row]);
        assert_eq!(fields[0].field_type.to_string(), "mood");
        assert_eq!(ingestor.enums().len(), 1);
    }
}
