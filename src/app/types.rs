//! Application types for CLI commands.

use std::path::PathBuf;

use crate::cli::{Dialect, Format};

/// Parameters for the rewrite command.
///
/// # Example
///
/// ```
/// use sql_tenant_guard::{
///     app::RewriteParams,
///     cli::{Dialect, Format}
/// };
///
/// let params = RewriteParams {
///     registry_path:   Some("tenant-tables.yaml".into()),
///     tenant:          "42".to_string(),
///     raw_tenant:      false,
///     queries_path:    "query.sql".to_string(),
///     dialect:         Some(Dialect::Postgresql),
///     output_format:   Format::Text,
///     default_schemas: vec!["public".to_string()],
///     case_sensitive:  false,
///     strict:          false,
///     batch:           false,
///     no_color:        true
/// };
/// assert_eq!(params.tenant, "42");
/// ```
#[derive(Debug, Clone)]
pub struct RewriteParams {
    /// Registry document; falls back to the configured path
    pub registry_path:   Option<PathBuf>,
    pub tenant:          String,
    /// Render `tenant` verbatim instead of as a number or string literal
    pub raw_tenant:      bool,
    /// Path to queries file or "-" for stdin input.
    pub queries_path:    String,
    /// Overrides the configured dialect when set
    pub dialect:         Option<Dialect>,
    pub output_format:   Format,
    /// Searched after the schemas from the registry and configuration
    pub default_schemas: Vec<String>,
    pub case_sensitive:  bool,
    /// Promote unresolved tables to errors
    pub strict:          bool,
    /// Allow more than one statement
    pub batch:           bool,
    pub no_color:        bool
}

/// Result of a rewrite run.
#[derive(Debug, Clone)]
pub struct RewriteResult {
    /// Exit code based on diagnostic severity (0, 1, or 2).
    pub exit_code: i32,
    /// Formatted output for stdout.
    pub output:    String
}
