//! Type definitions for rewrite diagnostics.
//!
//! This module defines the types that make non-fatal rewrite conditions
//! observable:
//! - [`Severity`] - Diagnostic severity levels (Info, Warning, Error)
//! - [`DiagnosticKind`] - What went wrong
//! - [`Diagnostic`] - A single condition with context
//! - [`RewriteReport`] - Everything recorded while rewriting one statement
//!
//! Unresolved tables pass through unfiltered; every one of them is recorded
//! here and logged.

use std::collections::HashMap;

use compact_str::CompactString;
use serde::Serialize;

use crate::rewrite::QueryKind;

/// Severity level of a diagnostic.
///
/// Ordered from lowest to highest severity for sorting purposes.
/// Exit codes are determined by the highest severity found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    /// Informational, does not affect exit code
    Info,
    /// May indicate a tenant isolation gap (exit code 1)
    Warning,
    /// Must be addressed before the SQL is executed (exit code 2)
    Error
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR")
        }
    }
}

/// Kind of non-fatal rewrite condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    /// A referenced table has no registry entry and passes through unfiltered
    UnresolvedTable,
    /// A construct could not be segmented into scopes
    AmbiguousSplit
}

impl DiagnosticKind {
    /// Stable identifier used in configuration
    pub fn id(self) -> &'static str {
        match self {
            Self::UnresolvedTable => "unresolved_table",
            Self::AmbiguousSplit => "ambiguous_split"
        }
    }

    /// Default severity before configuration overrides
    pub fn default_severity(self) -> Severity {
        match self {
            Self::UnresolvedTable | Self::AmbiguousSplit => Severity::Warning
        }
    }
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// A single non-fatal condition found while rewriting.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub kind:     DiagnosticKind,
    pub severity: Severity,
    pub message:  String,
    /// Table the diagnostic refers to, when there is one
    pub table:    Option<CompactString>,
    /// Nesting depth of the scope (0 = outermost query)
    pub depth:    usize
}

/// A predicate injected for one table reference.
#[derive(Debug, Clone, Serialize)]
pub struct FilteredTable {
    /// Registry key that matched
    pub table:     CompactString,
    /// Alias or table name the predicate qualifies
    pub qualifier: CompactString,
    pub column:    CompactString,
    pub depth:     usize
}

/// Severity overrides keyed by [`DiagnosticKind::id`].
#[derive(Debug, Clone, Default)]
pub struct SeverityOverrides {
    overrides: HashMap<DiagnosticKind, Severity>
}

impl SeverityOverrides {
    /// Build overrides from `kind id -> severity name` pairs
    ///
    /// Unknown kinds and severities are ignored.
    pub fn from_config(config: &HashMap<String, String>) -> Self {
        let mut overrides = HashMap::new();
        for kind in [DiagnosticKind::UnresolvedTable, DiagnosticKind::AmbiguousSplit] {
            if let Some(sev) = config.get(kind.id()).and_then(|s| parse_severity(s)) {
                overrides.insert(kind, sev);
            }
        }
        Self {
            overrides
        }
    }

    #[must_use]
    pub fn with(mut self, kind: DiagnosticKind, severity: Severity) -> Self {
        self.overrides.insert(kind, severity);
        self
    }

    pub fn severity_for(&self, kind: DiagnosticKind) -> Severity {
        self.overrides
            .get(&kind)
            .copied()
            .unwrap_or_else(|| kind.default_severity())
    }
}

/// Everything recorded while rewriting one statement.
#[derive(Debug, Clone, Serialize)]
pub struct RewriteReport {
    /// Classification of the outermost query
    pub kind:        QueryKind,
    /// Predicates injected, in injection order
    pub filtered:    Vec<FilteredTable>,
    /// Non-fatal conditions, most severe first after [`finish`](Self::finish)
    pub diagnostics: Vec<Diagnostic>,
    /// Number of independent scopes rewritten
    pub scopes:      usize
}

impl RewriteReport {
    pub fn new(kind: QueryKind) -> Self {
        Self {
            kind,
            filtered: Vec::new(),
            diagnostics: Vec::new(),
            scopes: 0
        }
    }

    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Sort diagnostics by severity (errors first) then by depth
    pub fn finish(&mut self) {
        self.diagnostics.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| a.depth.cmp(&b.depth))
        });
    }

    /// Highest severity recorded, if any
    pub fn max_severity(&self) -> Option<Severity> {
        self.diagnostics.iter().map(|d| d.severity).max()
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    /// Tables that passed through without a tenant predicate
    pub fn unresolved_tables(&self) -> Vec<&str> {
        self.diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::UnresolvedTable)
            .filter_map(|d| d.table.as_deref())
            .collect()
    }
}

/// Parse severity string to enum
pub fn parse_severity(s: &str) -> Option<Severity> {
    match s.to_lowercase().as_str() {
        "error" => Some(Severity::Error),
        "warning" | "warn" => Some(Severity::Warning),
        "info" => Some(Severity::Info),
        _ => None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagnostic(kind: DiagnosticKind, severity: Severity, depth: usize) -> Diagnostic {
        Diagnostic {
            kind,
            severity,
            message: "test".to_string(),
            table: Some("t".into()),
            depth
        }
    }

    #[test]
    fn test_finish_sorts_errors_first() {
        let mut report = RewriteReport::new(QueryKind::Plain);
        report.add_diagnostic(diagnostic(DiagnosticKind::AmbiguousSplit, Severity::Info, 0));
        report.add_diagnostic(diagnostic(DiagnosticKind::UnresolvedTable, Severity::Error, 2));
        report.add_diagnostic(diagnostic(DiagnosticKind::UnresolvedTable, Severity::Error, 1));
        report.finish();
        assert_eq!(report.diagnostics[0].severity, Severity::Error);
        assert_eq!(report.diagnostics[0].depth, 1);
        assert_eq!(report.max_severity(), Some(Severity::Error));
        assert_eq!(report.error_count(), 2);
    }

    #[test]
    fn test_overrides_from_config() {
        let mut config = HashMap::new();
        config.insert("unresolved_table".to_string(), "error".to_string());
        config.insert("ambiguous_split".to_string(), "bogus".to_string());
        let overrides = SeverityOverrides::from_config(&config);
        assert_eq!(
            overrides.severity_for(DiagnosticKind::UnresolvedTable),
            Severity::Error
        );
        assert_eq!(
            overrides.severity_for(DiagnosticKind::AmbiguousSplit),
            Severity::Warning
        );
    }

    #[test]
    fn test_parse_severity() {
        assert_eq!(parse_severity("WARN"), Some(Severity::Warning));
        assert_eq!(parse_severity("nope"), None);
    }
}
