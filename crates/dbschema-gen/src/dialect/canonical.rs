//! Canonical field types shared by every engine and every generator.
//!
//! Each engine's [`TypeMapper`](super::TypeMapper) converts native column
//! types into a [`FieldType`]; generators only ever see this representation.
//!
//! ```text
//! MySQL    varchar(255) NOT NULL  →  NonNull(Scalar(String))  →  String!
//! Postgres _int4                  →  List(NonNull(Scalar(Int))) →  [Int!]
//! ```
//!
//! Wrapper kinds nest. Ingestion wraps `NonNull` first and `List` last, and
//! [`Display`](std::fmt::Display) unwraps in exactly the inverse order, so the
//! emitted syntax reads back through [`FieldType::parse`] to an equal value.

use std::fmt;

use crate::core::identifier::is_valid_name;
use crate::error::{GenError, Result};

/// Built-in scalar types of the generated schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    String,
    Int,
    Float,
    Boolean,
    Id,
    AwsDate,
    AwsTime,
    AwsDateTime,
    AwsTimestamp,
    AwsJson,
    AwsIpAddress,
    AwsEmail,
    AwsUrl,
    AwsPhone,
}

impl ScalarType {
    /// Every scalar, in declaration order.
    pub const ALL: [ScalarType; 14] = [
        ScalarType::String,
        ScalarType::Int,
        ScalarType::Float,
        ScalarType::Boolean,
        ScalarType::Id,
        ScalarType::AwsDate,
        ScalarType::AwsTime,
        ScalarType::AwsDateTime,
        ScalarType::AwsTimestamp,
        ScalarType::AwsJson,
        ScalarType::AwsIpAddress,
        ScalarType::AwsEmail,
        ScalarType::AwsUrl,
        ScalarType::AwsPhone,
    ];

    /// The scalar's name in the IDL document.
    pub fn name(&self) -> &'static str {
        match self {
            ScalarType::String => "String",
            ScalarType::Int => "Int",
            ScalarType::Float => "Float",
            ScalarType::Boolean => "Boolean",
            ScalarType::Id => "ID",
            ScalarType::AwsDate => "AWSDate",
            ScalarType::AwsTime => "AWSTime",
            ScalarType::AwsDateTime => "AWSDateTime",
            ScalarType::AwsTimestamp => "AWSTimestamp",
            ScalarType::AwsJson => "AWSJSON",
            ScalarType::AwsIpAddress => "AWSIPAddress",
            ScalarType::AwsEmail => "AWSEmail",
            ScalarType::AwsUrl => "AWSURL",
            ScalarType::AwsPhone => "AWSPhone",
        }
    }

    /// Look up a scalar by its IDL name.
    pub fn from_name(name: &str) -> Option<ScalarType> {
        Self::ALL.iter().copied().find(|s| s.name() == name)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Names that lex as identifiers but are literals, so never enum values.
const RESERVED_ENUM_VALUES: &[&str] = &["true", "false", "null"];

/// An enumeration discovered in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumType {
    /// Name in the generated documents.
    pub name: String,
    /// Values in catalog order.
    pub values: Vec<String>,
}

impl EnumType {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Values that are not legal identifiers in the output alphabet.
    pub fn invalid_values(&self) -> Vec<String> {
        self.values
            .iter()
            .filter(|v| !is_valid_name(v) || RESERVED_ENUM_VALUES.contains(&v.as_str()))
            .cloned()
            .collect()
    }

    /// Reject enums whose values can't be written as identifiers.
    ///
    /// Values are never rewritten: an application stores the raw value, so a
    /// sanitized enum would silently stop matching the data.
    pub fn validate(&self) -> Result<()> {
        let invalid = self.invalid_values();
        if invalid.is_empty() {
            Ok(())
        } else {
            Err(GenError::InvalidEnumValues {
                name: self.name.clone(),
                values: invalid,
            })
        }
    }
}

/// Canonical type of one field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Built-in scalar.
    Scalar(ScalarType),
    /// Reference to an enumeration.
    Enum(EnumType),
    /// List of the inner type.
    List(Box<FieldType>),
    /// Non-nullable inner type.
    NonNull(Box<FieldType>),
    /// Any other named type (hand-written types in an existing document).
    Custom(String),
}

impl FieldType {
    /// Wrap in `NonNull`.
    pub fn non_null(self) -> Self {
        FieldType::NonNull(Box::new(self))
    }

    /// Wrap in `List`.
    pub fn list(self) -> Self {
        FieldType::List(Box::new(self))
    }

    /// Whether the outermost wrapper is `NonNull`.
    pub fn is_required(&self) -> bool {
        matches!(self, FieldType::NonNull(_))
    }

    /// Whether a `List` appears anywhere in the wrapper chain.
    pub fn is_list(&self) -> bool {
        match self {
            FieldType::List(_) => true,
            FieldType::NonNull(inner) => inner.is_list(),
            _ => false,
        }
    }

    /// The innermost named type.
    pub fn base(&self) -> &FieldType {
        match self {
            FieldType::List(inner) | FieldType::NonNull(inner) => inner.base(),
            other => other,
        }
    }

    /// The enumeration referenced by this type, if any.
    pub fn enum_type(&self) -> Option<&EnumType> {
        match self.base() {
            FieldType::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// Name of the innermost named type.
    pub fn base_name(&self) -> &str {
        match self.base() {
            FieldType::Scalar(s) => s.name(),
            FieldType::Enum(e) => &e.name,
            FieldType::Custom(name) => name,
            FieldType::List(_) | FieldType::NonNull(_) => unreachable!("base() strips wrappers"),
        }
    }

    /// Parse IDL type syntax (`[Int!]!`).
    ///
    /// Named types resolve to a scalar first, then through `resolve_enum`,
    /// and otherwise become [`FieldType::Custom`]. Returns `None` for
    /// malformed syntax.
    pub fn parse<F>(text: &str, resolve_enum: F) -> Option<FieldType>
    where
        F: Fn(&str) -> Option<EnumType>,
    {
        let chars: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
        let mut pos = 0;
        let parsed = parse_type(&chars, &mut pos, &resolve_enum)?;
        if pos == chars.len() {
            Some(parsed)
        } else {
            None
        }
    }
}

fn parse_type<F>(chars: &[char], pos: &mut usize, resolve_enum: &F) -> Option<FieldType>
where
    F: Fn(&str) -> Option<EnumType>,
{
    let inner = if chars.get(*pos) == Some(&'[') {
        *pos += 1;
        let element = parse_type(chars, pos, resolve_enum)?;
        if chars.get(*pos) != Some(&']') {
            return None;
        }
        *pos += 1;
        element.list()
    } else {
        let start = *pos;
        while *pos < chars.len() && (chars[*pos] == '_' || chars[*pos].is_ascii_alphanumeric()) {
            *pos += 1;
        }
        let name: String = chars[start..*pos].iter().collect();
        if !is_valid_name(&name) {
            return None;
        }
        if let Some(scalar) = ScalarType::from_name(&name) {
            FieldType::Scalar(scalar)
        } else if let Some(e) = resolve_enum(&name) {
            FieldType::Enum(e)
        } else {
            FieldType::Custom(name)
        }
    };

    if chars.get(*pos) == Some(&'!') {
        *pos += 1;
        Some(inner.non_null())
    } else {
        Some(inner)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Scalar(s) => write!(f, "{}", s),
            FieldType::Enum(e) => write!(f, "{}", e.name),
            FieldType::Custom(name) => write!(f, "{}", name),
            FieldType::List(inner) => write!(f, "[{}]", inner),
            FieldType::NonNull(inner) => write!(f, "{}!", inner),
        }
    }
}
