//! Renderers from the canonical schema to text.
//!
//! - [`IdlGenerator`]: the annotated IDL document, reconciled against a
//!   previously generated one when given
//! - [`DslGenerator`]: the programmatic builder document
//! - [`Document`]: reader for existing IDL documents

pub mod document;
mod dsl;
mod idl;

pub use document::Document;
pub use dsl::{ConnectionConfig, DslGenerator, SubnetConfig, VpcConfig};
pub use idl::{carried_filter, IdlGenerator};

use serde::{Deserialize, Serialize};

use crate::core::schema::Model;
use crate::error::{GenError, Result};

/// Table-name filter applied before rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFilter {
    /// Keep only the listed tables.
    Include(Vec<String>),
    /// Drop the listed tables.
    Exclude(Vec<String>),
}

impl TableFilter {
    /// Build a filter from optional include and exclude lists.
    pub fn from_lists(include: Option<Vec<String>>, exclude: Option<Vec<String>>) -> Result<Option<Self>> {
        match (include, exclude) {
            (Some(_), Some(_)) => Err(GenError::ConflictingFilters),
            (Some(tables), None) => Ok(Some(TableFilter::Include(tables))),
            (None, Some(tables)) => Ok(Some(TableFilter::Exclude(tables))),
            (None, None) => Ok(None),
        }
    }

    /// Key under which the filter is written in the config block.
    pub fn key(&self) -> &'static str {
        match self {
            TableFilter::Include(_) => "include",
            TableFilter::Exclude(_) => "exclude",
        }
    }

    pub fn tables(&self) -> &[String] {
        match self {
            TableFilter::Include(tables) | TableFilter::Exclude(tables) => tables,
        }
    }

    pub fn allows(&self, table: &str) -> bool {
        let listed = self.tables().iter().any(|t| t == table);
        match self {
            TableFilter::Include(_) => listed,
            TableFilter::Exclude(_) => !listed,
        }
    }
}

/// Models passing an optional filter.
fn filtered<'a>(
    models: impl Iterator<Item = &'a Model>,
    filter: Option<&'a TableFilter>,
) -> impl Iterator<Item = &'a Model> {
    models.filter(move |m| filter.map_or(true, |f| f.allows(&m.table)))
}

/// A string literal with JSON escaping, valid in both output documents.
fn quote(value: &str) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Comma-separated quoted list: `"a", "b"`.
fn quote_list(values: &[String]) -> Result<String> {
    let quoted = values
        .iter()
        .map(|v| quote(v))
        .collect::<Result<Vec<_>>>()?;
    Ok(quoted.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_from_lists() {
        assert_eq!(TableFilter::from_lists(None, None).unwrap(), None);
        assert_eq!(
            TableFilter::from_lists(Some(vec!["todo".into()]), None).unwrap(),
            Some(TableFilter::Include(vec!["todo".into()]))
        );
        assert!(matches!(
            TableFilter::from_lists(Some(vec![]), Some(vec![])),
            Err(GenError::ConflictingFilters)
        ));
    }

    #[test]
    fn test_filter_allows() {
        let include = TableFilter::Include(vec!["todo".into()]);
        assert!(include.allows("todo"));
        assert!(!include.allows("note"));

        let exclude = TableFilter::Exclude(vec!["todo".into()]);
        assert!(!exclude.allows("todo"));
        assert!(exclude.allows("note"));
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("it's \"x\"").unwrap(), r#""it's \"x\"""#);
        assert_eq!(
            quote_list(&["a".to_string(), "b\\c".to_string()]).unwrap(),
            r#""a", "b\\c""#
        );
    }
}
