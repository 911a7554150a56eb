//! Configuration loading and management.
//!
//! Configuration is loaded from multiple sources with the following precedence
//! (highest to lowest):
//!
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. `.sql-tenant-guard.toml` in current directory
//! 4. `~/.config/sql-tenant-guard/config.toml`
//! 5. Default values
//!
//! # Configuration File Format
//!
//! ```toml
//! [registry]
//! path = "tenant-tables.yaml"     # or use TENANT_REGISTRY env var
//! default_schemas = ["public"]
//! case_sensitive = false
//!
//! [rewrite]
//! dialect = "postgresql"          # or use TENANT_SQL_DIALECT env var
//! scan_where = true
//!
//! [diagnostics.severity]
//! unresolved_table = "error"
//! ambiguous_split = "warning"
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `TENANT_REGISTRY` | Path to the tenant registry document |
//! | `TENANT_SQL_DIALECT` | SQL dialect name |

use std::{collections::HashMap, env, fs, path::PathBuf};

use serde::Deserialize;

use crate::{
    error::{AppResult, config_error},
    query::SqlDialect,
    report::SeverityOverrides,
    rewrite::RewriteOptions
};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub registry:    RegistryConfig,
    #[serde(default)]
    pub rewrite:     RewriteConfig,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig
}

/// Where the tenant registry lives and how it resolves names
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RegistryConfig {
    pub path:            Option<PathBuf>,
    /// Appended to the default schemas declared in the registry document
    #[serde(default)]
    pub default_schemas: Vec<String>,
    pub case_sensitive:  Option<bool>
}

/// Rewriter settings
#[derive(Debug, Clone, Deserialize)]
pub struct RewriteConfig {
    pub dialect:    Option<String>,
    #[serde(default = "default_scan_where")]
    pub scan_where: bool
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            dialect:    None,
            scan_where: default_scan_where()
        }
    }
}

fn default_scan_where() -> bool {
    true
}

/// Diagnostics configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DiagnosticsConfig {
    /// Severity overrides (diagnostic kind -> severity)
    #[serde(default)]
    pub severity: HashMap<String, String>
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. Config file in current directory (.sql-tenant-guard.toml)
    /// 3. Config file in home directory (~/.config/sql-tenant-guard/config.toml)
    /// 4. Default values
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(home) = env::var_os("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("sql-tenant-guard")
                .join("config.toml");
            if home_config.exists() {
                config = Self::from_file(&home_config)?;
            }
        }

        let local_config = PathBuf::from(".sql-tenant-guard.toml");
        if local_config.exists() {
            config = Self::from_file(&local_config)?;
        }

        if let Ok(path) = env::var("TENANT_REGISTRY") {
            config.registry.path = Some(PathBuf::from(path));
        }
        if let Ok(dialect) = env::var("TENANT_SQL_DIALECT") {
            config.rewrite.dialect = Some(dialect);
        }

        Ok(config)
    }

    /// Parse a TOML configuration document
    pub fn parse(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| config_error(format!("Invalid config file: {}", e)))
    }

    fn from_file(path: &PathBuf) -> AppResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| config_error(format!("Failed to read config file: {}", e)))?;
        Self::parse(&content)
    }

    /// Dialect named in the configuration
    ///
    /// # Errors
    ///
    /// Returns error for an unknown dialect name.
    pub fn dialect(&self) -> AppResult<Option<SqlDialect>> {
        match &self.rewrite.dialect {
            None => Ok(None),
            Some(name) => SqlDialect::from_name(name)
                .map(Some)
                .ok_or_else(|| config_error(format!("Unknown SQL dialect '{}'", name)))
        }
    }

    /// Rewrite options described by this configuration
    pub fn rewrite_options(&self) -> AppResult<RewriteOptions> {
        Ok(RewriteOptions {
            dialect:    self.dialect()?.unwrap_or_default(),
            scan_where: self.rewrite.scan_where,
            severities: SeverityOverrides::from_config(&self.diagnostics.severity)
        })
    }
}
