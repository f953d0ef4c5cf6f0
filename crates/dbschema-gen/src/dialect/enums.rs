//! Enum registry for one ingestion run.
//!
//! The registry is explicitly owned by a single adapter instance and passed
//! by `&mut` into type mapping, never stored globally, so two adapters
//! building schemas side by side cannot see each other's enums.
//!
//! Registry keys differ per engine:
//!
//! - **MySQL**: enums are declared inline on each column. The key is
//!   `<table>_<column>`; a key already owned by a different table/column pair
//!   gets a numeric suffix (`_1`, `_2`, ...). Inline enums are never shared.
//! - **Postgres**: enums are declared once in the catalog. The key is the
//!   catalog enum name and every referencing column shares the entry.

use indexmap::IndexMap;
use tracing::debug;

use crate::core::identifier::{is_valid_name, to_field_name, to_type_name};

use super::canonical::EnumType;

#[derive(Debug, Clone)]
struct RegisteredEnum {
    ty: EnumType,
    /// Owning table/column pair for inline enums.
    owner: Option<(String, String)>,
}

/// Keyed arena of [`EnumType`]s, in registration order.
#[derive(Debug, Clone, Default)]
pub struct EnumRegistry {
    entries: IndexMap<String, RegisteredEnum>,
}

impl EnumRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a catalog-level enum (Postgres).
    ///
    /// The first declaration for a key wins; later declarations return the
    /// existing entry unchanged.
    pub fn declare(&mut self, key: &str, values: Vec<String>) -> EnumType {
        if let Some(existing) = self.entries.get(key) {
            return existing.ty.clone();
        }

        let name = if is_valid_name(key) {
            key.to_string()
        } else {
            to_type_name(key)
        };
        let ty = EnumType::new(name, values);
        debug!("Registered enum {} ({} values)", ty.name, ty.values.len());
        self.entries.insert(
            key.to_string(),
            RegisteredEnum {
                ty: ty.clone(),
                owner: None,
            },
        );
        ty
    }

    /// Resolve the inline enum of one column (MySQL).
    ///
    /// The same table/column pair always resolves to its own entry, so
    /// ingesting a table twice does not mint a second enum.
    pub fn resolve_inline(&mut self, table: &str, column: &str, values: Vec<String>) -> EnumType {
        let base = format!("{}_{}", table, column);
        let owner = (table.to_string(), column.to_string());

        let mut key = base.clone();
        let mut suffix = 0;
        loop {
            match self.entries.get(&key) {
                Some(entry) if entry.owner.as_ref() == Some(&owner) => return entry.ty.clone(),
                Some(_) => {
                    suffix += 1;
                    key = format!("{}_{}", base, suffix);
                }
                None => break,
            }
        }

        let name = if is_valid_name(&key) {
            key.clone()
        } else {
            let mut name = format!("{}_{}", to_type_name(table), to_field_name(column));
            if suffix > 0 {
                name.push_str(&format!("_{}", suffix));
            }
            name
        };
        let ty = EnumType::new(name, values);
        debug!(
            "Registered inline enum {} for {}.{} ({} values)",
            ty.name,
            table,
            column,
            ty.values.len()
        );
        self.entries.insert(
            key,
            RegisteredEnum {
                ty: ty.clone(),
                owner: Some(owner),
            },
        );
        ty
    }

    /// Look up an enum by registry key.
    pub fn get(&self, key: &str) -> Option<&EnumType> {
        self.entries.get(key).map(|e| &e.ty)
    }

    /// Whether a registry key is known.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// All registered enums in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &EnumType> {
        self.entries.values().map(|e| &e.ty)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_declare_is_shared() {
        let mut registry = EnumRegistry::new();
        let first = registry.declare("mood", values(&["happy", "sad"]));
        let second = registry.declare("mood", values(&["other"]));
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("mood").unwrap().values, values(&["happy", "sad"]));
    }

    #[test]
    fn test_inline_enums_are_per_column() {
        let mut registry = EnumRegistry::new();
        let a = registry.resolve_inline("post", "status", values(&["draft", "live"]));
        let b = registry.resolve_inline("comment", "status", values(&["draft", "live"]));
        assert_eq!(a.name, "post_status");
        assert_eq!(b.name, "comment_status");
        assert_ne!(a, b);
    }

    #[test]
    fn test_inline_enum_same_column_reuses_entry() {
        let mut registry = EnumRegistry::new();
        let a = registry.resolve_inline("post", "status", values(&["draft"]));
        let b = registry.resolve_inline("post", "status", values(&["draft"]));
        assert_eq!(a, b);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_inline_enum_key_collision_gets_suffix() {
        let mut registry = EnumRegistry::new();
        let a = registry.resolve_inline("a_b", "c", values(&["x"]));
        let b = registry.resolve_inline("a", "b_c", values(&["y"]));
        let c = registry.resolve_inline("a_b_c", "1", values(&["z"]));
        assert_eq!(a.name, "a_b_c");
        assert_eq!(b.name, "a_b_c_1");
        assert_eq!(c.name, "a_b_c_1_1");
        // Resolving again is stable
        assert_eq!(registry.resolve_inline("a", "b_c", values(&["y"])).name, "a_b_c_1");
    }

    #[test]
    fn test_illegal_enum_names_are_normalized() {
        let mut registry = EnumRegistry::new();
        let ty = registry.resolve_inline("order-items", "state", values(&["new"]));
        assert_eq!(ty.name, "OrderItem_state");
        let pg = registry.declare("ticket priority", values(&["low"]));
        assert_eq!(pg.name, "TicketPriority");
        assert!(registry.contains("ticket priority"));
    }
}
