//! Tenant table registry.
//!
//! The registry maps qualified table names to the column holding the tenant
//! identifier. It is immutable once built and shared by every rewrite, so a
//! single instance can serve concurrent requests without locking.
//!
//! # Table Resolution
//!
//! A table reference is resolved against the registry by trying candidate
//! keys in order, first match wins:
//!
//! 1. `schema.table` when the reference carries an explicit schema
//! 2. bare `table`
//! 3. `{default_schema}.table` for each default schema, in order, only when
//!    the reference has no explicit schema
//!
//! Matching is case-insensitive unless the registry is case sensitive.
//!
//! # Document Format
//!
//! Either a flat mapping:
//!
//! ```yaml
//! orders: user_id
//! public.users: id
//! ```
//!
//! or a structured document:
//!
//! ```yaml
//! tables:
//!   orders: user_id
//!   public.users: id
//! default_schemas: [public]
//! case_sensitive: false
//! ```
//!
//! # Example
//!
//! ```
//! use sql_tenant_guard::registry::{TableMatcher, TenantRegistry};
//!
//! let registry = TenantRegistry::from_yaml_str("public.orders: client_id").unwrap();
//! let registry = registry.with_default_schemas(["public"]);
//!
//! let matched = registry.match_table(None, "ORDERS").unwrap();
//! assert_eq!(matched.key, "public.orders");
//! assert_eq!(matched.column, "client_id");
//! ```

use std::{fs, path::Path};

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{AppResult, file_read_error, registry_error};

/// A registry entry resolved for one table reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMatch {
    /// Registry key as written in the registry document
    pub key:    String,
    /// Column holding the tenant identifier
    pub column: String
}

/// Resolves table references to tenant columns.
///
/// Implemented by [`TenantRegistry`]; alternative resolution strategies can
/// be plugged into the rewriter through this trait.
pub trait TableMatcher: Send + Sync {
    /// Resolve `schema.name` (schema optional) to a registry entry.
    fn match_table(&self, schema: Option<&str>, name: &str) -> Option<TableMatch>;

    /// Normalize an identifier for comparisons within a scope.
    fn normalize(&self, ident: &str) -> String;
}

/// Read-only mapping of tenant tables.
#[derive(Debug, Clone, Default)]
pub struct TenantRegistry {
    tables:          IndexMap<String, String>,
    default_schemas: Vec<String>,
    case_sensitive:  bool,
    index:           IndexMap<String, usize>
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RegistryDocument {
    Structured {
        tables:          IndexMap<String, String>,
        #[serde(default)]
        default_schemas: Vec<String>,
        #[serde(default)]
        case_sensitive:  bool
    },
    Flat(IndexMap<String, String>)
}

impl TenantRegistry {
    /// Build a case-insensitive registry without default schemas
    pub fn new<K, V>(tables: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>
    {
        let tables = tables
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::build(tables, Vec::new(), false)
    }

    /// Set the ordered default-schema search list
    #[must_use]
    pub fn with_default_schemas<S: Into<String>>(
        self,
        schemas: impl IntoIterator<Item = S>
    ) -> Self {
        let schemas = schemas.into_iter().map(Into::into).collect();
        Self::build(self.tables, schemas, self.case_sensitive)
    }

    /// Switch between exact and case-insensitive matching
    #[must_use]
    pub fn with_case_sensitive(self, case_sensitive: bool) -> Self {
        Self::build(self.tables, self.default_schemas, case_sensitive)
    }

    /// Parse a registry document
    ///
    /// # Errors
    ///
    /// Returns error if the document is not valid YAML of either supported
    /// shape, or if a table or column name is empty.
    pub fn from_yaml_str(content: &str) -> AppResult<Self> {
        let doc: RegistryDocument = serde_yaml::from_str(content)
            .map_err(|e| registry_error(format!("invalid registry document: {}", e)))?;
        let (tables, default_schemas, case_sensitive) = match doc {
            RegistryDocument::Structured {
                tables,
                default_schemas,
                case_sensitive
            } => (tables, default_schemas, case_sensitive),
            RegistryDocument::Flat(tables) => (tables, Vec::new(), false)
        };
        for (table, column) in &tables {
            if table.trim().is_empty() || column.trim().is_empty() {
                return Err(registry_error(format!(
                    "empty table or column name in entry '{}: {}'",
                    table, column
                )));
            }
        }
        Ok(Self::build(tables, default_schemas, case_sensitive))
    }

    /// Load a registry document from disk
    pub fn from_yaml_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| file_read_error(&path.display().to_string(), e))?;
        Self::from_yaml_str(&content)
    }

    fn build(
        tables: IndexMap<String, String>,
        default_schemas: Vec<String>,
        case_sensitive: bool
    ) -> Self {
        let mut registry = Self {
            tables,
            default_schemas,
            case_sensitive,
            index: IndexMap::new()
        };
        // First entry wins when two keys collapse to the same normalized form
        let mut index = IndexMap::with_capacity(registry.tables.len());
        for (pos, key) in registry.tables.keys().enumerate() {
            index.entry(registry.normalize(key.trim())).or_insert(pos);
        }
        registry.index = index;
        registry
    }

    /// Registered tables in document order
    pub fn tables(&self) -> &IndexMap<String, String> {
        &self.tables
    }

    pub fn default_schemas(&self) -> &[String] {
        &self.default_schemas
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Candidate registry keys for a reference, highest precedence first
    pub fn candidate_keys(&self, schema: Option<&str>, name: &str) -> Vec<String> {
        let mut keys = Vec::with_capacity(2 + self.default_schemas.len());
        match schema {
            Some(schema) => {
                keys.push(format!("{}.{}", schema, name));
                keys.push(name.to_string());
            }
            None => {
                keys.push(name.to_string());
                for default in &self.default_schemas {
                    keys.push(format!("{}.{}", default, name));
                }
            }
        }
        keys
    }

    fn lookup(&self, key: &str) -> Option<TableMatch> {
        let pos = *self.index.get(&self.normalize(key))?;
        let (key, column) = self.tables.get_index(pos)?;
        Some(TableMatch {
            key:    key.clone(),
            column: column.clone()
        })
    }
}

impl TableMatcher for TenantRegistry {
    fn match_table(&self, schema: Option<&str>, name: &str) -> Option<TableMatch> {
        self.candidate_keys(schema, name)
            .iter()
            .find_map(|key| self.lookup(key))
    }

    fn normalize(&self, ident: &str) -> String {
        if self.case_sensitive {
            ident.to_string()
        } else {
            ident.to_lowercase()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_keys_explicit_schema() {
        let registry =
            TenantRegistry::new([("orders", "user_id")]).with_default_schemas(["public"]);
        assert_eq!(
            registry.candidate_keys(Some("sales"), "orders"),
            vec!["sales.orders".to_string(), "orders".to_string()]
        );
    }

    #[test]
    fn test_candidate_keys_default_schemas() {
        let registry =
            TenantRegistry::new([("orders", "user_id")]).with_default_schemas(["public", "app"]);
        assert_eq!(
            registry.candidate_keys(None, "orders"),
            vec![
                "orders".to_string(),
                "public.orders".to_string(),
                "app.orders".to_string()
            ]
        );
    }

    #[test]
    fn test_first_duplicate_wins() {
        let registry = TenantRegistry::new([("Orders", "user_id"), ("orders", "client_id")]);
        let matched = registry.match_table(None, "orders").unwrap();
        assert_eq!(matched.column, "user_id");
    }
}
