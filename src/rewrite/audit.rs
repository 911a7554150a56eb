use std::{collections::HashMap, ops::ControlFlow};

use sqlparser::ast::{ObjectName, Query, visit_relations};
use tracing::error;

use super::extract::split_object_name;
use crate::{
    error::{AppResult, uncovered_table_error},
    registry::TableMatcher
};

/// Check that every registry table in `query` went through a rewritten scope.
///
/// Relations are counted per rendered name: a tenant table that occurs more
/// often in the final tree than the extractor saw it sits somewhere the
/// rewriter does not descend into, and its rows would leak.
pub(super) fn audit_coverage(
    query: &Query,
    matcher: &dyn TableMatcher,
    walked: &HashMap<String, usize>
) -> AppResult<()> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let outcome = visit_relations(query, |name: &ObjectName| {
        let key = name.to_string();
        let count = seen.entry(key.clone()).or_insert(0);
        *count += 1;
        if *count > walked.get(&key).copied().unwrap_or(0) && is_tenant_table(name, matcher) {
            return ControlFlow::Break(key);
        }
        ControlFlow::Continue(())
    });
    match outcome {
        ControlFlow::Break(table) => {
            error!(table = %table, "tenant table escaped rewriting");
            Err(uncovered_table_error(&table))
        }
        ControlFlow::Continue(()) => Ok(())
    }
}

fn is_tenant_table(name: &ObjectName, matcher: &dyn TableMatcher) -> bool {
    split_object_name(name)
        .is_some_and(|(schema, table)| matcher.match_table(schema.as_deref(), &table).is_some())
}

#[cfg(test)]
mod tests {
    use sqlparser::ast::Statement;

    use super::*;
    use crate::{
        query::{SqlDialect, parse_single_statement},
        registry::TenantRegistry
    };

    fn query_of(sql: &str) -> Box<Query> {
        match parse_single_statement(sql, SqlDialect::Generic).unwrap() {
            Statement::Query(query) => query,
            other => panic!("not a query: {}", other)
        }
    }

    #[test]
    fn test_fully_walked_passes() {
        let registry = TenantRegistry::new([("orders", "user_id")]);
        let query = query_of("SELECT * FROM orders o JOIN orders p ON o.id = p.id");
        let walked = HashMap::from([("orders".to_string(), 2)]);
        assert!(audit_coverage(&query, &registry, &walked).is_ok());
    }

    #[test]
    fn test_unwalked_occurrence_fails() {
        let registry = TenantRegistry::new([("orders", "user_id")]);
        let query = query_of("SELECT * FROM orders o JOIN orders p ON o.id = p.id");
        let walked = HashMap::from([("orders".to_string(), 1)]);
        let err = audit_coverage(&query, &registry, &walked).unwrap_err();
        assert!(err.render_message().contains("'orders'"));
    }

    #[test]
    fn test_unregistered_tables_ignored() {
        let registry = TenantRegistry::new([("orders", "user_id")]);
        let query = query_of("SELECT * FROM audit_log");
        assert!(audit_coverage(&query, &registry, &HashMap::new()).is_ok());
    }
}
