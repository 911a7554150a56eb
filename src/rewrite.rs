//! Client-scoped SQL rewriting.
//!
//! [`TenantRewriter`] takes one SELECT-shaped statement and injects an
//! equality predicate on the tenant column of every registry table it
//! references, so the statement can only see a single tenant's rows.
//!
//! # Scopes
//!
//! Each SELECT body is an independent scope with its own
//! [`RewriteSession`]. The rewriter classifies a query and recurses:
//!
//! | Shape | Handling |
//! |-------|----------|
//! | `WITH ...` | Each CTE body is rewritten, then the main query with the CTE names bound |
//! | `UNION` / `INTERSECT` / `EXCEPT` | Each branch is rewritten independently |
//! | SELECT with subqueries | Each subquery is rewritten in place, then the outer SELECT |
//! | Plain SELECT | Extract references, match, build predicates, inject |
//!
//! Within a scope every matched table gets exactly one predicate per alias,
//! so a self-join is filtered on both sides.
//!
//! # Failure Semantics
//!
//! Everything that prevents a complete rewrite is an error: unparseable
//! input, more than one statement, statements other than queries, and query
//! bodies such as `TABLE t`. After rewriting, every relation in the tree is
//! enumerated; a registry table in a position the rewriter never walked
//! (for example a subquery inside `ORDER BY`) fails the rewrite instead of
//! passing through unfiltered.
//!
//! Tables without a registry entry are left alone and reported as
//! [`DiagnosticKind::UnresolvedTable`].
//!
//! # Example
//!
//! ```
//! use sql_tenant_guard::{
//!     registry::TenantRegistry,
//!     rewrite::{TenantId, TenantRewriter}
//! };
//!
//! let registry = TenantRegistry::new([("orders", "client_id")]);
//! let rewriter = TenantRewriter::new(&registry);
//!
//! let result = rewriter
//!     .rewrite("SELECT * FROM orders o", &TenantId::Integer(7))
//!     .unwrap();
//! assert!(result.sql.ends_with(r#"WHERE "o"."client_id" = 7"#));
//! ```

mod audit;
mod cte;
pub mod extract;
pub mod inject;
pub mod predicate;
mod session;
mod set_op;
pub mod subquery;
mod types;

use std::{collections::HashMap, ops::ControlFlow};

use compact_str::CompactString;
use rayon::prelude::*;
use serde::Serialize;
use smallvec::SmallVec;
use sqlparser::ast::{Expr, Query, Select, SetExpr, Statement, TableFactor, visit_expressions};
use tracing::{debug, info, warn};

pub use self::{
    predicate::{FilterPredicate, PredicateBuilder, QuotedPredicateBuilder, TenantId},
    session::RewriteSession,
    types::{QueryKind, RefOrigin, SubqueryPosition, TableReference}
};
use crate::{
    error::{AppResult, query_parse_error, unsupported_statement_error},
    query::{SqlDialect, parse_single_statement, parse_statements},
    registry::TableMatcher,
    report::{Diagnostic, DiagnosticKind, FilteredTable, RewriteReport, Severity, SeverityOverrides}
};

/// Knobs that change how statements are rewritten
#[derive(Debug, Clone)]
pub struct RewriteOptions {
    pub dialect:    SqlDialect,
    /// Also pick up `schema.table.column` references in WHERE clauses
    pub scan_where: bool,
    pub severities: SeverityOverrides
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            dialect:    SqlDialect::Generic,
            scan_where: true,
            severities: SeverityOverrides::default()
        }
    }
}

/// A rewritten statement and what happened to it
#[derive(Debug, Clone, Serialize)]
pub struct Rewritten {
    pub sql:    String,
    pub report: RewriteReport
}

/// Rewrites queries so they only see one tenant's rows.
///
/// The rewriter holds no per-call state and can be shared across threads.
pub struct TenantRewriter<'a> {
    matcher: &'a dyn TableMatcher,
    builder: Box<dyn PredicateBuilder>,
    options: RewriteOptions
}

impl<'a> TenantRewriter<'a> {
    pub fn new(matcher: &'a dyn TableMatcher) -> Self {
        Self::with_options(matcher, RewriteOptions::default())
    }

    /// Create a rewriter quoting predicates for `options.dialect`
    pub fn with_options(matcher: &'a dyn TableMatcher, options: RewriteOptions) -> Self {
        Self {
            matcher,
            builder: Box::new(QuotedPredicateBuilder::new(options.dialect)),
            options
        }
    }

    /// Replace the predicate builder
    #[must_use]
    pub fn with_predicate_builder(mut self, builder: impl PredicateBuilder + 'static) -> Self {
        self.builder = Box::new(builder);
        self
    }

    pub fn options(&self) -> &RewriteOptions {
        &self.options
    }

    /// Rewrite a single statement
    ///
    /// # Errors
    ///
    /// Returns error if the SQL does not parse, holds more than one
    /// statement, is not a query, or references a registry table in a
    /// position that cannot be scoped.
    pub fn rewrite(&self, sql: &str, tenant: &TenantId) -> AppResult<Rewritten> {
        let statement = parse_single_statement(sql, self.options.dialect)?;
        self.rewrite_statement(statement, tenant)
    }

    /// Rewrite an already parsed statement
    pub fn rewrite_statement(
        &self,
        statement: Statement,
        tenant: &TenantId
    ) -> AppResult<Rewritten> {
        let mut query = match statement {
            Statement::Query(query) => query,
            other => {
                return Err(unsupported_statement_error(format!(
                    "only queries can be scoped, got {}",
                    statement_keyword(&other)
                )));
            }
        };

        let kind = classify(&query);
        debug!(kind = %kind, "classified query");

        let mut walker = ScopeWalker {
            matcher: self.matcher,
            builder: self.builder.as_ref(),
            tenant,
            options: &self.options,
            report: RewriteReport::new(kind),
            walked: HashMap::new()
        };
        walker.rewrite_query(&mut query, RewriteSession::new())?;
        audit::audit_coverage(&query, self.matcher, &walker.walked)?;

        let mut report = walker.report;
        report.finish();
        info!(
            kind = %kind,
            filtered = report.filtered.len(),
            diagnostics = report.diagnostics.len(),
            "rewrote query"
        );
        Ok(Rewritten {
            sql: query.to_string(),
            report
        })
    }

    /// Rewrite every statement of a script, in parallel
    ///
    /// # Errors
    ///
    /// Fails as a whole if any statement fails.
    pub fn rewrite_script(&self, sql: &str, tenant: &TenantId) -> AppResult<Vec<Rewritten>> {
        let statements = parse_statements(sql, self.options.dialect)?;
        if statements.is_empty() {
            return Err(query_parse_error("No SQL statement found"));
        }
        statements
            .into_par_iter()
            .map(|statement| self.rewrite_statement(statement, tenant))
            .collect()
    }

    /// Rewrite independent requests in parallel, one result per request
    pub fn rewrite_batch<S>(&self, queries: &[S], tenant: &TenantId) -> Vec<AppResult<Rewritten>>
    where
        S: AsRef<str> + Sync
    {
        queries
            .par_iter()
            .map(|sql| self.rewrite(sql.as_ref(), tenant))
            .collect()
    }
}

/// Rewrite `sql` with default options
pub fn rewrite(sql: &str, matcher: &dyn TableMatcher, tenant: &TenantId) -> AppResult<Rewritten> {
    TenantRewriter::new(matcher).rewrite(sql, tenant)
}

/// Classify the outermost shape of a query
pub fn classify(query: &Query) -> QueryKind {
    if query.with.is_some() {
        return QueryKind::Cte;
    }
    match query.body.as_ref() {
        SetExpr::SetOperation {
            ..
        } => QueryKind::SetOperation,
        SetExpr::Query(inner) => classify(inner),
        SetExpr::Select(select) if select_has_subqueries(select) => QueryKind::WithSubqueries,
        _ => QueryKind::Plain
    }
}

fn select_has_subqueries(select: &Select) -> bool {
    let derived = select.from.iter().any(|table| {
        is_derived(&table.relation) || table.joins.iter().any(|join| is_derived(&join.relation))
    });
    derived
        || visit_expressions(select, |expr| match expr {
            Expr::Subquery(_)
            | Expr::InSubquery {
                ..
            }
            | Expr::Exists {
                ..
            } => ControlFlow::Break(()),
            _ => ControlFlow::Continue(())
        })
        .is_break()
}

fn is_derived(factor: &TableFactor) -> bool {
    match factor {
        TableFactor::Derived {
            ..
        } => true,
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => {
            is_derived(&table_with_joins.relation)
                || table_with_joins
                    .joins
                    .iter()
                    .any(|join| is_derived(&join.relation))
        }
        _ => false
    }
}

fn statement_keyword(statement: &Statement) -> String {
    statement
        .to_string()
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_uppercase()
}

/// Per-statement rewrite state shared by all scopes
pub(crate) struct ScopeWalker<'w> {
    matcher: &'w dyn TableMatcher,
    builder: &'w dyn PredicateBuilder,
    tenant:  &'w TenantId,
    options: &'w RewriteOptions,
    report:  RewriteReport,
    /// Relation names walked by the extractor, with occurrence counts
    walked:  HashMap<String, usize>
}

impl ScopeWalker<'_> {
    fn normalize(&self, ident: &str) -> String {
        self.matcher.normalize(ident)
    }

    fn rewrite_query(&mut self, query: &mut Query, session: RewriteSession) -> AppResult<()> {
        if query.with.is_some() {
            return cte::rewrite_with_query(self, query, session);
        }
        let mut session = session;
        self.rewrite_set_expr(&mut query.body, &mut session)
    }

    fn rewrite_set_expr(
        &mut self,
        body: &mut SetExpr,
        session: &mut RewriteSession
    ) -> AppResult<()> {
        match body {
            SetExpr::Select(select) => self.rewrite_select(select, session),
            SetExpr::SetOperation {
                op,
                left,
                right,
                ..
            } => set_op::rewrite_set_operation(self, op, left, right, session),
            SetExpr::Query(query) => self.rewrite_query(query, session.child()),
            SetExpr::Values(_) => Ok(()),
            other => Err(unsupported_statement_error(format!(
                "{} query body cannot be scoped",
                body_keyword(other)
            )))
        }
    }

    fn rewrite_select(
        &mut self,
        select: &mut Select,
        session: &mut RewriteSession
    ) -> AppResult<()> {
        subquery::for_each_subquery(select, |position, query| {
            debug!(?position, depth = session.depth() + 1, "rewriting subquery");
            self.rewrite_query(query, session.child())
        })?;
        self.filter_select(select, session);
        Ok(())
    }

    /// Filter the tables of one SELECT, ignoring its subqueries
    fn filter_select(&mut self, select: &mut Select, session: &mut RewriteSession) {
        let depth = session.depth();
        let extraction = extract::extract_table_references(select, self.options.scan_where);
        for relation in extraction.relations {
            *self.walked.entry(relation).or_insert(0) += 1;
        }
        for construct in &extraction.opaque {
            self.diagnose(
                DiagnosticKind::AmbiguousSplit,
                format!("cannot scope table construct `{}`", construct),
                None,
                depth
            );
        }

        let mut predicates: SmallVec<[FilterPredicate; 4]> = SmallVec::new();
        for reference in &extraction.references {
            if reference.schema.is_none() && session.is_bound_cte(&self.normalize(&reference.name))
            {
                debug!(cte = %reference.name, depth, "reference resolves to a CTE");
                continue;
            }
            let Some(matched) = self
                .matcher
                .match_table(reference.schema.as_deref(), &reference.name)
            else {
                if reference.origin != RefOrigin::WhereHeuristic {
                    let table = reference.qualified_name();
                    self.diagnose(
                        DiagnosticKind::UnresolvedTable,
                        format!("table '{}' is not in the tenant registry, left unfiltered", table),
                        Some(table.into()),
                        depth
                    );
                }
                continue;
            };
            let qualifier = reference.qualifier();
            if !session.mark_filtered(self.normalize(qualifier)) {
                continue;
            }
            let predicate = self.builder.build(qualifier, &matched, self.tenant);
            debug!(table = %matched.key, qualifier, depth, "injecting tenant predicate");
            self.report.filtered.push(FilteredTable {
                table: matched.key.as_str().into(),
                qualifier: qualifier.into(),
                column: matched.column.as_str().into(),
                depth
            });
            predicates.push(predicate);
        }

        self.report.scopes += 1;
        if !predicates.is_empty() {
            select.selection = inject::inject_predicates(select.selection.take(), predicates);
        }
    }

    fn diagnose(
        &mut self,
        kind: DiagnosticKind,
        message: String,
        table: Option<CompactString>,
        depth: usize
    ) {
        let severity = self.options.severities.severity_for(kind);
        match severity {
            Severity::Info => debug!(kind = %kind, depth, "{}", message),
            Severity::Warning | Severity::Error => warn!(kind = %kind, depth, "{}", message)
        }
        self.report.add_diagnostic(Diagnostic {
            kind,
            severity,
            message,
            table,
            depth
        });
    }
}

fn body_keyword(body: &SetExpr) -> &'static str {
    match body {
        SetExpr::Table(_) => "TABLE",
        SetExpr::Insert(_) => "INSERT",
        SetExpr::Update(_) => "UPDATE",
        SetExpr::Delete(_) => "DELETE",
        _ => "this"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TenantRegistry;

    fn kind_of(sql: &str) -> QueryKind {
        let Statement::Query(query) = parse_single_statement(sql, SqlDialect::Generic).unwrap()
        else {
            panic!("not a query");
        };
        classify(&query)
    }

    #[test]
    fn test_classify_order() {
        assert_eq!(
            kind_of("WITH s AS (SELECT 1) SELECT * FROM s UNION SELECT 2"),
            QueryKind::Cte
        );
        assert_eq!(
            kind_of("SELECT a FROM t UNION SELECT a FROM (SELECT a FROM u) x"),
            QueryKind::SetOperation
        );
        assert_eq!(
            kind_of("SELECT * FROM t WHERE EXISTS (SELECT 1 FROM u)"),
            QueryKind::WithSubqueries
        );
        assert_eq!(kind_of("SELECT * FROM (SELECT 1) d"), QueryKind::WithSubqueries);
        assert_eq!(kind_of("SELECT a FROM t WHERE a = 1"), QueryKind::Plain);
    }

    #[test]
    fn test_scope_count_and_depth() {
        let registry = TenantRegistry::new([("orders", "user_id"), ("users", "id")]);
        let result = TenantRewriter::new(&registry)
            .rewrite(
                "SELECT * FROM users WHERE id IN (SELECT user_id FROM orders)",
                &TenantId::Integer(3)
            )
            .unwrap();
        assert_eq!(result.report.scopes, 2);
        assert_eq!(result.report.filtered.len(), 2);
        assert_eq!(result.report.filtered[0].table, "orders");
        assert_eq!(result.report.filtered[0].depth, 1);
        assert_eq!(result.report.filtered[1].depth, 0);
    }

    #[test]
    fn test_statement_keyword() {
        let statement =
            parse_single_statement("DELETE FROM orders WHERE id = 1", SqlDialect::Generic).unwrap();
        assert_eq!(statement_keyword(&statement), "DELETE");
    }
}
