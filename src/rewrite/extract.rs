use compact_str::CompactString;
use sqlparser::ast::{Expr, ObjectName, Select, TableFactor};

use super::types::{RefOrigin, TableReference};

/// Table references of one SELECT scope
#[derive(Debug, Default)]
pub struct Extraction {
    /// References in discovery order: FROM, JOIN, then WHERE heuristic
    pub references: Vec<TableReference>,
    /// Relation names walked, as rendered by the parser
    pub relations:  Vec<String>,
    /// Table factors that cannot be segmented into table references
    pub opaque:     Vec<String>
}

/// Collect table references from FROM/JOIN (and optionally WHERE)
///
/// Derived tables are nested scopes and are not collected here.
pub fn extract_table_references(select: &Select, scan_where: bool) -> Extraction {
    let mut extraction = Extraction::default();
    for table in &select.from {
        extract_from_table_factor(&table.relation, RefOrigin::From, &mut extraction);
        for join in &table.joins {
            extract_from_table_factor(&join.relation, RefOrigin::Join, &mut extraction);
        }
    }
    if scan_where && let Some(selection) = &select.selection {
        let mut found = Vec::new();
        extract_qualified_tables_from_expr(selection, &mut found);
        for reference in found {
            let duplicate = extraction.references.iter().any(|r| {
                r.name == reference.name && (r.schema.is_none() || r.schema == reference.schema)
            });
            if !duplicate {
                extraction.references.push(reference);
            }
        }
    }
    extraction
}

fn extract_from_table_factor(factor: &TableFactor, origin: RefOrigin, out: &mut Extraction) {
    match factor {
        TableFactor::Table {
            name,
            alias,
            ..
        } => {
            out.relations.push(name.to_string());
            if let Some((schema, table)) = split_object_name(name) {
                out.references.push(TableReference {
                    name: table,
                    schema,
                    alias: alias.as_ref().map(|a| a.name.value.as_str().into()),
                    origin
                });
            } else {
                out.opaque.push(factor.to_string());
            }
        }
        TableFactor::Derived {
            ..
        } => {}
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => {
            extract_from_table_factor(&table_with_joins.relation, origin, out);
            for join in &table_with_joins.joins {
                extract_from_table_factor(&join.relation, RefOrigin::Join, out);
            }
        }
        other => out.opaque.push(other.to_string())
    }
}

/// Split `[catalog.]schema.table` into schema and table
pub(crate) fn split_object_name(
    name: &ObjectName
) -> Option<(Option<CompactString>, CompactString)> {
    let parts: Vec<&str> = name
        .0
        .iter()
        .map(|part| part.as_ident().map(|ident| ident.value.as_str()))
        .collect::<Option<_>>()?;
    let (table, rest) = parts.split_last()?;
    Some((rest.last().map(|s| CompactString::from(*s)), (*table).into()))
}

/// Best-effort: `schema.table.column` identifiers in comparisons
fn extract_qualified_tables_from_expr(expr: &Expr, out: &mut Vec<TableReference>) {
    match expr {
        Expr::CompoundIdentifier(idents) if idents.len() >= 3 => {
            let n = idents.len();
            out.push(TableReference {
                name:   idents[n - 2].value.as_str().into(),
                schema: Some(idents[n - 3].value.as_str().into()),
                alias:  None,
                origin: RefOrigin::WhereHeuristic
            });
        }
        Expr::BinaryOp {
            left,
            right,
            ..
        } => {
            extract_qualified_tables_from_expr(left, out);
            extract_qualified_tables_from_expr(right, out);
        }
        Expr::UnaryOp {
            expr, ..
        }
        | Expr::Nested(expr)
        | Expr::IsNull(expr)
        | Expr::IsNotNull(expr) => extract_qualified_tables_from_expr(expr, out),
        Expr::InList {
            expr,
            list,
            ..
        } => {
            extract_qualified_tables_from_expr(expr, out);
            for item in list {
                extract_qualified_tables_from_expr(item, out);
            }
        }
        Expr::Between {
            expr,
            low,
            high,
            ..
        } => {
            extract_qualified_tables_from_expr(expr, out);
            extract_qualified_tables_from_expr(low, out);
            extract_qualified_tables_from_expr(high, out);
        }
        Expr::Like {
            expr,
            pattern,
            ..
        }
        | Expr::ILike {
            expr,
            pattern,
            ..
        } => {
            extract_qualified_tables_from_expr(expr, out);
            extract_qualified_tables_from_expr(pattern, out);
        }
        Expr::InSubquery {
            expr, ..
        } => extract_qualified_tables_from_expr(expr, out),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use sqlparser::ast::{SetExpr, Statement};

    use super::*;
    use crate::query::{SqlDialect, parse_single_statement};

    fn select_of(sql: &str) -> Select {
        let Statement::Query(query) = parse_single_statement(sql, SqlDialect::Generic).unwrap()
        else {
            panic!("not a query");
        };
        match *query.body {
            SetExpr::Select(select) => *select,
            other => panic!("unexpected body: {}", other)
        }
    }

    #[test]
    fn test_from_then_join_order() {
        let select = select_of("SELECT * FROM users u JOIN sales.orders AS o ON u.id = o.user_id");
        let refs = extract_table_references(&select, true).references;
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].name, "users");
        assert_eq!(refs[0].alias.as_deref(), Some("u"));
        assert_eq!(refs[0].origin, RefOrigin::From);
        assert_eq!(refs[1].schema.as_deref(), Some("sales"));
        assert_eq!(refs[1].qualifier(), "o");
        assert_eq!(refs[1].origin, RefOrigin::Join);
    }

    #[test]
    fn test_derived_table_not_collected() {
        let select =
            select_of("SELECT * FROM (SELECT id FROM users) AS u JOIN orders o ON o.id = u.id");
        let extraction = extract_table_references(&select, true);
        assert_eq!(extraction.references.len(), 1);
        assert_eq!(extraction.references[0].name, "orders");
    }

    #[test]
    fn test_where_heuristic() {
        let select = select_of("SELECT * FROM a WHERE billing.invoices.total > 10");
        let refs = extract_table_references(&select, true).references;
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[1].qualified_name(), "billing.invoices");
        assert_eq!(refs[1].origin, RefOrigin::WhereHeuristic);

        let refs = extract_table_references(&select, false).references;
        assert_eq!(refs.len(), 1);
    }

    #[test]
    fn test_where_heuristic_skips_from_duplicate() {
        let select = select_of("SELECT * FROM public.orders WHERE public.orders.status = 'x'");
        let refs = extract_table_references(&select, true).references;
        assert_eq!(refs.len(), 1);
    }

    #[test]
    fn test_nested_join_flattened() {
        let select = select_of("SELECT * FROM (users u JOIN orders o ON u.id = o.user_id)");
        let extraction = extract_table_references(&select, false);
        let names: Vec<&str> = extraction.references.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["users", "orders"]);
        assert_eq!(extraction.relations, vec!["users".to_string(), "orders".to_string()]);
    }
}
