//! Helper functions for CLI operations.
//!
//! Command-line flags win over configuration; these helpers do the merging.

use std::{
    fs::read_to_string,
    io::{self, Read},
    path::Path
};

use super::convert::{convert_dialect, convert_format};
use crate::{
    cli::{Dialect, Format},
    config::Config,
    error::{AppResult, file_read_error},
    output::OutputOptions,
    registry::TenantRegistry,
    report::{DiagnosticKind, Severity},
    rewrite::{RewriteOptions, Rewritten}
};

/// Calculates the process exit code based on diagnostic severities.
///
/// Returns the exit code reflecting the highest severity over all
/// statements:
/// - `0` - No diagnostics or only informational messages
/// - `1` - At least one warning present
/// - `2` - At least one error present
pub fn calculate_exit_code(results: &[Rewritten]) -> i32 {
    match results
        .iter()
        .filter_map(|r| r.report.max_severity())
        .max()
    {
        Some(Severity::Error) => 2,
        Some(Severity::Warning) => 1,
        Some(Severity::Info) | None => 0
    }
}

/// Reads SQL queries from a file or stdin.
///
/// Supports reading from a file path or from standard input when the
/// path is "-".
///
/// # Errors
///
/// Returns an error if the file cannot be read or stdin fails.
pub fn read_queries_input(path: &str) -> AppResult<String> {
    if path == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| file_read_error("stdin", e))?;
        Ok(buffer)
    } else {
        read_to_string(path).map_err(|e| file_read_error(path, e))
    }
}

/// Creates output options from CLI parameters.
pub fn create_output_options(format: Format, no_color: bool) -> OutputOptions {
    OutputOptions {
        format:  convert_format(format),
        colored: !no_color
    }
}

/// Loads the registry and layers default schemas and case sensitivity.
///
/// Default schemas are searched in order: those from the registry document,
/// then configuration, then the command line. Case sensitivity is on when
/// any layer turns it on.
pub fn build_registry(
    path: &Path,
    config: &Config,
    extra_schemas: &[String],
    case_sensitive: bool
) -> AppResult<TenantRegistry> {
    let registry = TenantRegistry::from_yaml_file(path)?;
    let case_sensitive = case_sensitive
        || config
            .registry
            .case_sensitive
            .unwrap_or(registry.is_case_sensitive());
    let mut schemas = registry.default_schemas().to_vec();
    for schema in config.registry.default_schemas.iter().chain(extra_schemas) {
        if !schemas.contains(schema) {
            schemas.push(schema.clone());
        }
    }
    Ok(registry
        .with_default_schemas(schemas)
        .with_case_sensitive(case_sensitive))
}

/// Rewrite options from configuration, overridden by CLI flags.
pub fn effective_options(
    config: &Config,
    dialect: Option<Dialect>,
    strict: bool
) -> AppResult<RewriteOptions> {
    let mut options = config.rewrite_options()?;
    if let Some(dialect) = dialect {
        options.dialect = convert_dialect(dialect);
    }
    if strict {
        options.severities = options
            .severities
            .with(DiagnosticKind::UnresolvedTable, Severity::Error);
    }
    Ok(options)
}
