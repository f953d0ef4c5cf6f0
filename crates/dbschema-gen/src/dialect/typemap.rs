//! Native column type to canonical [`FieldType`] mapping, one table per engine.
//!
//! Mapping order:
//!
//! 1. Array detection (Postgres only: a leading `_` on the internal type name).
//! 2. Base type through the engine's lookup table.
//! 3. Enum resolution through the caller's [`EnumRegistry`].
//! 4. `NonNull` unless the column is nullable.
//! 5. `List` last, when array-ness was detected.

use tracing::{debug, warn};

use crate::core::schema::Engine;

use super::canonical::{FieldType, ScalarType};
use super::enums::EnumRegistry;

/// Per-engine type mapper.
#[derive(Debug, Clone, Copy)]
pub struct TypeMapper {
    engine: Engine,
}

impl TypeMapper {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> Engine {
        self.engine
    }

    /// Map one column.
    ///
    /// `data_type` is the catalog's coarse type (`varchar`, `USER-DEFINED`),
    /// `column_type` the detailed one: MySQL's `column_type`
    /// (`enum('a','b')`, `tinyint(1)`) or Postgres' `udt_name` (`_int4`).
    /// Deterministic for a given registry state.
    pub fn map_type(
        &self,
        data_type: &str,
        nullable: bool,
        table: &str,
        column: &str,
        column_type: &str,
        enums: &mut EnumRegistry,
    ) -> FieldType {
        let (base, is_array) = match self.engine {
            Engine::MySql => (self.mysql_base(data_type, table, column, column_type, enums), false),
            Engine::Postgres => self.postgres_base(data_type, column_type, enums),
        };

        let mut field_type = base;
        if !nullable {
            field_type = field_type.non_null();
        }
        if is_array {
            field_type = field_type.list();
        }
        field_type
    }

    fn mysql_base(
        &self,
        data_type: &str,
        table: &str,
        column: &str,
        column_type: &str,
        enums: &mut EnumRegistry,
    ) -> FieldType {
        let data_lower = data_type.trim().to_lowercase();
        let column_lower = column_type.trim().to_lowercase();

        if data_lower == "enum" || column_lower.starts_with("enum(") {
            return match parse_mysql_enum_values(column_type) {
                Some(values) => FieldType::Enum(enums.resolve_inline(table, column, values)),
                None => {
                    warn!(
                        "Column {}.{} is an enum without readable values ({}); using String",
                        table, column, column_type
                    );
                    FieldType::Scalar(ScalarType::String)
                }
            };
        }

        // MySQL reports BOOL columns as tinyint(1)
        if column_lower.starts_with("tinyint(1)") {
            return FieldType::Scalar(ScalarType::Boolean);
        }

        match mysql_scalar(&data_lower) {
            Some(scalar) => FieldType::Scalar(scalar),
            None => {
                debug!("Unknown MySQL type '{}' on {}.{}; using String", data_type, table, column);
                FieldType::Scalar(ScalarType::String)
            }
        }
    }

    fn postgres_base(
        &self,
        data_type: &str,
        udt_name: &str,
        enums: &mut EnumRegistry,
    ) -> (FieldType, bool) {
        let udt = udt_name.trim();
        let (udt, is_array) = match udt.strip_prefix('_') {
            Some(element) => (element, true),
            None => (udt, false),
        };

        let udt_lower = udt.to_lowercase();
        let scalar = postgres_scalar(&udt_lower).or_else(|| {
            // udt_name is empty in some captured dumps; fall back to data_type
            (!is_array).then(|| postgres_scalar(&data_type.trim().to_lowercase())).flatten()
        });

        let base = if let Some(scalar) = scalar {
            FieldType::Scalar(scalar)
        } else if let Some(e) = enums.get(udt) {
            FieldType::Enum(e.clone())
        } else {
            debug!("Unknown Postgres type '{}' ({}); using String", udt, data_type);
            FieldType::Scalar(ScalarType::String)
        };
        (base, is_array)
    }
}

/// MySQL lookup table, keyed by lower-cased `data_type`.
fn mysql_scalar(data_type: &str) -> Option<ScalarType> {
    let scalar = match data_type {
        // String types
        "char" | "varchar" | "tinytext" | "text" | "mediumtext" | "longtext" => ScalarType::String,
        "binary" | "varbinary" | "tinyblob" | "blob" | "mediumblob" | "longblob" => {
            ScalarType::String
        }
        "set" => ScalarType::String,

        // Boolean
        "bool" | "boolean" => ScalarType::Boolean,

        // Integer types
        "bit" | "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" | "year" => {
            ScalarType::Int
        }

        // Decimal/floating point
        "float" | "double" | "double precision" | "decimal" | "dec" | "numeric" | "fixed"
        | "real" => ScalarType::Float,

        // Date/time types
        "date" => ScalarType::AwsDate,
        "time" => ScalarType::AwsTime,
        "datetime" | "timestamp" => ScalarType::AwsDateTime,

        // JSON
        "json" => ScalarType::AwsJson,

        _ => return None,
    };
    Some(scalar)
}

/// Postgres lookup table, keyed by lower-cased `udt_name` or `data_type`.
fn postgres_scalar(type_name: &str) -> Option<ScalarType> {
    let scalar = match type_name {
        // String types
        "text" | "varchar" | "character varying" | "bpchar" | "char" | "character" | "name"
        | "citext" => ScalarType::String,
        "bytea" | "interval" | "xml" | "tsvector" | "tsquery" | "varbit" | "bit varying" => {
            ScalarType::String
        }
        "macaddr" | "macaddr8" => ScalarType::String,

        // Geometric types
        "point" | "line" | "lseg" | "box" | "path" | "polygon" | "circle" => ScalarType::String,

        // Boolean
        "bool" | "boolean" => ScalarType::Boolean,

        // Integer types
        "int2" | "int4" | "int8" | "smallint" | "integer" | "bigint" | "serial" | "serial2"
        | "serial4" | "serial8" | "smallserial" | "bigserial" | "oid" | "bit" => ScalarType::Int,

        // Decimal/floating point
        "float4" | "float8" | "real" | "double precision" | "numeric" | "decimal" | "money" => {
            ScalarType::Float
        }

        // Date/time types
        "date" => ScalarType::AwsDate,
        "time" | "timetz" | "time without time zone" | "time with time zone" => ScalarType::AwsTime,
        "timestamp"
        | "timestamptz"
        | "timestamp without time zone"
        | "timestamp with time zone" => ScalarType::AwsDateTime,

        // JSON
        "json" | "jsonb" => ScalarType::AwsJson,

        // Network
        "inet" | "cidr" => ScalarType::AwsIpAddress,

        "uuid" => ScalarType::Id,

        _ => return None,
    };
    Some(scalar)
}

/// Values of a MySQL `enum('a','b''c')` column type, in declaration order.
///
/// Quotes inside values are doubled (`''`) in the catalog. Returns `None`
/// when the text is not an enum declaration or declares no values.
pub fn parse_mysql_enum_values(column_type: &str) -> Option<Vec<String>> {
    let text = column_type.trim();
    let prefix = text.get(..5)?;
    if !prefix.eq_ignore_ascii_case("enum(") {
        return None;
    }
    let body = text[5..].strip_suffix(')')?;

    let mut values = Vec::new();
    let mut chars = body.chars().peekable();
    loop {
        while matches!(chars.peek(), Some(c) if c.is_whitespace() || *c == ',') {
            chars.next();
        }
        match chars.next() {
            None => break,
            Some('\'') => {}
            Some(_) => return None,
        }

        let mut value = String::new();
        loop {
            match chars.next() {
                None => return None,
                Some('\'') if chars.peek() == Some(&'\'') => {
                    chars.next();
                    value.push('\'');
                }
                Some('\'') => break,
                Some('\\') => {
                    if let Some(escaped) = chars.next() {
                        value.push(escaped);
                    }
                }
                Some(c) => value.push(c),
            }
        }
        values.push(value);
    }

    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(s: ScalarType) -> FieldType {
        FieldType::Scalar(s)
    }

    // =========================================================================
    // MySQL
    // =========================================================================

    #[test]
    fn test_mysql_scalars() {
        let mapper = TypeMapper::new(Engine::MySql);
        let mut enums = EnumRegistry::new();
        let cases = [
            ("varchar", "varchar(255)", ScalarType::String),
            ("longblob", "longblob", ScalarType::String),
            ("int", "int(11)", ScalarType::Int),
            ("bigint", "bigint unsigned", ScalarType::Int),
            ("tinyint", "tinyint(4)", ScalarType::Int),
            ("decimal", "decimal(10,2)", ScalarType::Float),
            ("date", "date", ScalarType::AwsDate),
            ("time", "time", ScalarType::AwsTime),
            ("timestamp", "timestamp", ScalarType::AwsDateTime),
            ("json", "json", ScalarType::AwsJson),
            ("set", "set('a','b')", ScalarType::String),
            ("geometry", "geometry", ScalarType::String),
        ];
        for (data_type, column_type, expected) in cases {
            let ty = mapper.map_type(data_type, true, "t", "c", column_type, &mut enums);
            assert_eq!(ty, scalar(expected), "{}", column_type);
        }
        assert!(enums.is_empty());
    }

    #[test]
    fn test_mysql_tinyint_one_is_boolean() {
        let mapper = TypeMapper::new(Engine::MySql);
        let mut enums = EnumRegistry::new();
        let ty = mapper.map_type("tinyint", false, "t", "done", "tinyint(1)", &mut enums);
        assert_eq!(ty, scalar(ScalarType::Boolean).non_null());
    }

    #[test]
    fn test_mysql_inline_enum() {
        let mapper = TypeMapper::new(Engine::MySql);
        let mut enums = EnumRegistry::new();
        let ty = mapper.map_type(
            "enum",
            false,
            "todo",
            "status",
            "enum('open','done')",
            &mut enums,
        );
        assert_eq!(ty.to_string(), "todo_status!");
        assert_eq!(ty.enum_type().unwrap().values, vec!["open", "done"]);
    }

    #[test]
    fn test_mysql_never_arrays() {
        let mapper = TypeMapper::new(Engine::MySql);
        let mut enums = EnumRegistry::new();
        let ty = mapper.map_type("varchar", true, "t", "c", "_varchar", &mut enums);
        assert!(!ty.is_list());
    }

    #[test]
    fn test_parse_mysql_enum_values() {
        assert_eq!(
            parse_mysql_enum_values("enum('a','b''c','d e')"),
            Some(vec!["a".to_string(), "b'c".to_string(), "d e".to_string()])
        );
        assert_eq!(
            parse_mysql_enum_values("ENUM('x', 'y')"),
            Some(vec!["x".to_string(), "y".to_string()])
        );
        assert_eq!(parse_mysql_enum_values("enum()"), None);
        assert_eq!(parse_mysql_enum_values("enum('open"), None);
        assert_eq!(parse_mysql_enum_values("varchar(10)"), None);
    }

    // =========================================================================
    // Postgres
    // =========================================================================

    #[test]
    fn test_postgres_scalars() {
        let mapper = TypeMapper::new(Engine::Postgres);
        let mut enums = EnumRegistry::new();
        let cases = [
            ("character varying", "varchar", ScalarType::String),
            ("integer", "int4", ScalarType::Int),
            ("bigint", "int8", ScalarType::Int),
            ("numeric", "numeric", ScalarType::Float),
            ("money", "money", ScalarType::Float),
            ("boolean", "bool", ScalarType::Boolean),
            ("date", "date", ScalarType::AwsDate),
            ("time with time zone", "timetz", ScalarType::AwsTime),
            ("timestamp with time zone", "timestamptz", ScalarType::AwsDateTime),
            ("jsonb", "jsonb", ScalarType::AwsJson),
            ("inet", "inet", ScalarType::AwsIpAddress),
            ("uuid", "uuid", ScalarType::Id),
            ("tsvector", "tsvector", ScalarType::String),
        ];
        for (data_type, udt, expected) in cases {
            let ty = mapper.map_type(data_type, true, "t", "c", udt, &mut enums);
            assert_eq!(ty, scalar(expected), "{}", udt);
        }
    }

    #[test]
    fn test_postgres_arrays_wrap_list_last() {
        let mapper = TypeMapper::new(Engine::Postgres);
        let mut enums = EnumRegistry::new();
        let ty = mapper.map_type("ARRAY", false, "t", "tags", "_text", &mut enums);
        assert_eq!(ty, scalar(ScalarType::String).non_null().list());
        assert_eq!(ty.to_string(), "[String!]");

        let ty = mapper.map_type("ARRAY", true, "t", "scores", "_int4", &mut enums);
        assert_eq!(ty.to_string(), "[Int]");
    }

    #[test]
    fn test_postgres_known_enum() {
        let mapper = TypeMapper::new(Engine::Postgres);
        let mut enums = EnumRegistry::new();
        enums.declare("mood", vec!["happy".into(), "sad".into()]);

        let ty = mapper.map_type("USER-DEFINED", false, "person", "mood", "mood", &mut enums);
        assert_eq!(ty.to_string(), "mood!");
        let arr = mapper.map_type("ARRAY", true, "person", "moods", "_mood", &mut enums);
        assert_eq!(arr.to_string(), "[mood]");
        assert_eq!(enums.len(), 1);
    }

    #[test]
    fn test_postgres_unknown_type_is_string() {
        let mapper = TypeMapper::new(Engine::Postgres);
        let mut enums = EnumRegistry::new();
        let ty = mapper.map_type("USER-DEFINED", true, "t", "shape", "geometry", &mut enums);
        assert_eq!(ty, scalar(ScalarType::String));
    }
}
