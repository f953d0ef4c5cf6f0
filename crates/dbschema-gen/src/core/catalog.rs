//! Catalog row contract.
//!
//! Both adapters see catalog metadata as rows of nullable text keyed by
//! column name. Live executors produce them from query results, the text
//! adapter from CSV records; from here on the two paths are identical.

use indexmap::IndexMap;

use crate::error::{GenError, Result};

/// Required columns of a field (column) row.
pub const FIELD_COLUMNS: &[&str] = &[
    "table_name",
    "column_name",
    "column_default",
    "ordinal_position",
    "data_type",
    "column_type",
    "is_nullable",
    "character_maximum_length",
];

/// Required columns of an index row.
pub const INDEX_COLUMNS: &[&str] = &["table_name", "index_name", "column_name", "seq_in_index"];

/// Required columns of a Postgres enum row.
pub const ENUM_COLUMNS: &[&str] = &["enum_name", "enum_values"];

/// One catalog record. Column names are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogRow {
    values: IndexMap<String, Option<String>>,
}

impl CatalogRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from `(column, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut row = Self::new();
        for (column, value) in pairs {
            row.insert(column.as_ref(), value.map(Into::into));
        }
        row
    }

    pub fn insert(&mut self, column: &str, value: Option<String>) {
        self.values.insert(column.trim().to_lowercase(), value);
    }

    /// Whether the row has the column at all (possibly null).
    pub fn has_column(&self, column: &str) -> bool {
        self.values.contains_key(&column.to_lowercase())
    }

    /// Non-null value of a column.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values
            .get(&column.to_lowercase())
            .and_then(|v| v.as_deref())
    }

    /// Column names in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

/// Required columns missing from a set of column names.
pub fn missing_columns<'a>(
    present: impl IntoIterator<Item = &'a str>,
    required: &[&str],
) -> Vec<String> {
    let present: Vec<String> = present.into_iter().map(|c| c.trim().to_lowercase()).collect();
    required
        .iter()
        .filter(|r| !present.iter().any(|p| p == *r))
        .map(|r| r.to_string())
        .collect()
}

/// Location of a row, used in error messages.
#[derive(Debug, Clone, Copy)]
pub struct RowRef {
    pub dump: &'static str,
    pub line: u64,
}

impl RowRef {
    pub fn new(dump: &'static str, line: u64) -> Self {
        Self { dump, line }
    }

    fn malformed(&self, message: impl Into<String>) -> GenError {
        GenError::malformed(self.dump, self.line, message)
    }
}

fn require<'r>(row: &'r CatalogRow, at: RowRef, column: &str) -> Result<&'r str> {
    if !row.has_column(column) {
        return Err(GenError::MissingColumns {
            dump: at.dump,
            columns: vec![column.to_string()],
        });
    }
    row.get(column)
        .ok_or_else(|| at.malformed(format!("'{}' must not be null", column)))
}

fn parse_position(row: &CatalogRow, at: RowRef, column: &str) -> Result<u32> {
    let raw = require(row, at, column)?;
    raw.trim()
        .parse::<u32>()
        .map_err(|_| at.malformed(format!("'{}' is not a position: '{}'", column, raw)))
}

/// Interpret the catalog's various spellings of a boolean.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "yes" | "y" | "true" | "t" | "1" => Some(true),
        "no" | "n" | "false" | "f" | "0" => Some(false),
        _ => None,
    }
}

/// A column of some table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRow {
    pub table_name: String,
    pub column_name: String,
    pub column_default: Option<String>,
    pub ordinal_position: u32,
    pub data_type: String,
    pub column_type: String,
    pub is_nullable: bool,
    pub character_maximum_length: Option<u32>,
}

impl FieldRow {
    pub fn from_row(row: &CatalogRow, at: RowRef) -> Result<Self> {
        let missing = missing_columns(row.columns(), FIELD_COLUMNS);
        if !missing.is_empty() {
            return Err(GenError::MissingColumns {
                dump: at.dump,
                columns: missing,
            });
        }

        let nullable_raw = require(row, at, "is_nullable")?;
        let is_nullable = parse_flag(nullable_raw).ok_or_else(|| {
            at.malformed(format!("'is_nullable' is not a flag: '{}'", nullable_raw))
        })?;

        // Unbounded lengths can exceed u32 in some catalogs (longtext)
        let character_maximum_length = match row.get("character_maximum_length") {
            Some(raw) if raw.trim().is_empty() => None,
            Some(raw) => {
                let len = raw.trim().parse::<u64>().map_err(|_| {
                    at.malformed(format!(
                        "'character_maximum_length' is not a number: '{}'",
                        raw
                    ))
                })?;
                Some(u32::try_from(len).unwrap_or(u32::MAX))
            }
            None => None,
        };

        Ok(Self {
            table_name: require(row, at, "table_name")?.to_string(),
            column_name: require(row, at, "column_name")?.to_string(),
            column_default: row.get("column_default").map(str::to_string),
            ordinal_position: parse_position(row, at, "ordinal_position")?,
            data_type: require(row, at, "data_type")?.to_string(),
            column_type: row.get("column_type").unwrap_or_default().to_string(),
            is_nullable,
            character_maximum_length,
        })
    }
}

/// One member of an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRow {
    pub table_name: String,
    pub index_name: String,
    pub column_name: String,
    pub seq_in_index: u32,
}

impl IndexRow {
    pub fn from_row(row: &CatalogRow, at: RowRef) -> Result<Self> {
        Ok(Self {
            table_name: require(row, at, "table_name")?.to_string(),
            index_name: require(row, at, "index_name")?.to_string(),
            column_name: require(row, at, "column_name")?.to_string(),
            seq_in_index: parse_position(row, at, "seq_in_index")?,
        })
    }
}

/// A Postgres enum type and its labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumRow {
    pub enum_name: String,
    pub values: Vec<String>,
}

impl EnumRow {
    pub fn from_row(row: &CatalogRow, at: RowRef) -> Result<Self> {
        let raw = require(row, at, "enum_values")?;
        let values = parse_array_literal(raw)
            .ok_or_else(|| at.malformed(format!("'enum_values' is not an array literal: '{}'", raw)))?;
        Ok(Self {
            enum_name: require(row, at, "enum_name")?.to_string(),
            values,
        })
    }
}

/// Parse a Postgres array literal such as `{a,b,"c d"}`.
///
/// Double-quoted elements may contain commas and backslash escapes.
pub fn parse_array_literal(raw: &str) -> Option<Vec<String>> {
    let body = raw.trim().strip_prefix('{')?.strip_suffix('}')?;
    if body.trim().is_empty() {
        return Some(Vec::new());
    }

    let mut values = Vec::new();
    let mut chars = body.chars().peekable();
    loop {
        while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
            chars.next();
        }

        let mut value = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            loop {
                match chars.next()? {
                    '"' => break,
                    '\\' => value.push(chars.next()?),
                    c => value.push(c),
                }
            }
            while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
                chars.next();
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c == ',' {
                    break;
                }
                value.push(c);
                chars.next();
            }
            value = value.trim().to_string();
        }
        values.push(value);

        match chars.next() {
            Some(',') => continue,
            None => break,
            Some(_) => return None,
        }
    }
    Some(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_row(pairs: &[(&str, Option<&str>)]) -> CatalogRow {
        CatalogRow::from_pairs(pairs.iter().map(|(k, v)| (*k, v.map(str::to_string))))
    }

    fn todo_id_row() -> CatalogRow {
        field_row(&[
            ("TABLE_NAME", Some("todo")),
            ("COLUMN_NAME", Some("id")),
            ("COLUMN_DEFAULT", None),
            ("ORDINAL_POSITION", Some("1")),
            ("DATA_TYPE", Some("varchar")),
            ("COLUMN_TYPE", Some("varchar(40)")),
            ("IS_NULLABLE", Some("NO")),
            ("CHARACTER_MAXIMUM_LENGTH", Some("40")),
        ])
    }

    #[test]
    fn test_column_names_are_case_insensitive() {
        let row = todo_id_row();
        assert_eq!(row.get("table_name"), Some("todo"));
        assert_eq!(row.get("Table_Name"), Some("todo"));
        assert!(row.has_column("column_default"));
        assert_eq!(row.get("column_default"), None);
    }

    #[test]
    fn test_field_row_parsing() {
        let row = FieldRow::from_row(&todo_id_row(), RowRef::new("fields", 2)).unwrap();
        assert_eq!(row.table_name, "todo");
        assert_eq!(row.column_name, "id");
        assert_eq!(row.ordinal_position, 1);
        assert!(!row.is_nullable);
        assert_eq!(row.character_maximum_length, Some(40));
        assert_eq!(row.column_default, None);
    }

    #[test]
    fn test_field_row_rejects_bad_flag() {
        let mut row = todo_id_row();
        row.insert("is_nullable", Some("maybe".into()));
        let err = FieldRow::from_row(&row, RowRef::new("fields", 7)).unwrap_err();
        assert!(matches!(err, GenError::MalformedRow { line: 7, .. }));
    }

    #[test]
    fn test_field_row_clamps_huge_lengths() {
        let mut row = todo_id_row();
        row.insert("character_maximum_length", Some("4294967296".into()));
        let parsed = FieldRow::from_row(&row, RowRef::new("fields", 2)).unwrap();
        assert_eq!(parsed.character_maximum_length, Some(u32::MAX));
    }

    #[test]
    fn test_missing_columns() {
        let missing = missing_columns(["table_name", "INDEX_NAME"], INDEX_COLUMNS);
        assert_eq!(missing, vec!["column_name", "seq_in_index"]);
    }

    #[test]
    fn test_index_row_parsing() {
        let row = field_row(&[
            ("table_name", Some("todo")),
            ("index_name", Some("PRIMARY")),
            ("column_name", Some("id")),
            ("seq_in_index", Some("1")),
            ("non_unique", Some("0")),
        ]);
        let parsed = IndexRow::from_row(&row, RowRef::new("indexes", 2)).unwrap();
        assert_eq!(parsed.index_name, "PRIMARY");
        assert_eq!(parsed.seq_in_index, 1);
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("YES"), Some(true));
        assert_eq!(parse_flag("f"), Some(false));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("perhaps"), None);
    }

    #[test]
    fn test_parse_array_literal() {
        assert_eq!(
            parse_array_literal("{happy,sad,\"so so\"}"),
            Some(vec!["happy".into(), "sad".into(), "so so".into()])
        );
        assert_eq!(
            parse_array_literal("{\"a,b\",\"c\\\"d\"}"),
            Some(vec!["a,b".into(), "c\"d".into()])
        );
        assert_eq!(parse_array_literal("{}"), Some(vec![]));
        assert_eq!(parse_array_literal("happy,sad"), None);
        assert_eq!(parse_array_literal("{\"open}"), None);
    }
}
