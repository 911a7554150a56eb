use colored::Colorize;
use serde::Serialize;

use crate::{
    report::{RewriteReport, Severity},
    rewrite::Rewritten
};

/// Output format for results
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml
}

/// Output options
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format:  OutputFormat,
    pub colored: bool
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            format:  OutputFormat::Text,
            colored: true
        }
    }
}

/// Rewrite results for serialization
#[derive(Debug, Serialize)]
pub struct RewriteOutput<'a> {
    pub tenant:     String,
    pub statements: &'a [Rewritten]
}

/// Format rewritten statements based on output options
pub fn format_rewrites(results: &[Rewritten], tenant: &str, opts: &OutputOptions) -> String {
    let output = RewriteOutput {
        tenant:     tenant.to_string(),
        statements: results
    };
    match opts.format {
        OutputFormat::Json => serde_json::to_string_pretty(&output).unwrap_or_default(),
        OutputFormat::Yaml => serde_yaml::to_string(&output).unwrap_or_default(),
        OutputFormat::Text => format_text(results, opts)
    }
}

/// Plain text: the SQL of every statement, separated by `;`, then the
/// diagnostics as SQL comments so the output stays executable
fn format_text(results: &[Rewritten], opts: &OutputOptions) -> String {
    let mut output = String::new();
    for result in results {
        output.push_str(&result.sql);
        output.push_str(";\n");
        output.push_str(&format_diagnostics(&result.report, opts));
    }
    output
}

/// One `-- SEVERITY [kind] message` line per diagnostic
pub fn format_diagnostics(report: &RewriteReport, opts: &OutputOptions) -> String {
    let mut lines = String::new();
    for diagnostic in &report.diagnostics {
        let label = format!("{}", diagnostic.severity);
        let label = if opts.colored {
            match diagnostic.severity {
                Severity::Error => label.red().bold().to_string(),
                Severity::Warning => label.yellow().bold().to_string(),
                Severity::Info => label.blue().to_string()
            }
        } else {
            label
        };
        lines.push_str(&format!(
            "-- {} [{}] {}\n",
            label, diagnostic.kind, diagnostic.message
        ));
    }
    lines
}
