use std::ops::ControlFlow;

use sqlparser::ast::{
    Expr, JoinConstraint, JoinOperator, Query, Select, SelectItem, TableFactor, VisitMut,
    VisitorMut
};

use super::types::SubqueryPosition;
use crate::error::{AppError, AppResult};

/// Call `f` on every subquery one level below `select`.
///
/// Subqueries nested inside a visited subquery are skipped; they belong to
/// that subquery's own scope and are reached when `f` rewrites it. The first
/// error returned by `f` stops the walk.
pub fn for_each_subquery<F>(select: &mut Select, mut f: F) -> AppResult<()>
where
    F: FnMut(SubqueryPosition, &mut Query) -> AppResult<()>
{
    let Select {
        projection,
        from,
        selection,
        having,
        ..
    } = select;
    for item in projection.iter_mut() {
        if let SelectItem::UnnamedExpr(expr)
        | SelectItem::ExprWithAlias {
            expr, ..
        } = item
        {
            visit_expr(expr, SubqueryPosition::SelectList, &mut f)?;
        }
    }
    for table in from.iter_mut() {
        visit_table_factor(&mut table.relation, SubqueryPosition::From, &mut f)?;
        for join in table.joins.iter_mut() {
            visit_table_factor(&mut join.relation, SubqueryPosition::Join, &mut f)?;
            visit_join_operator(&mut join.join_operator, &mut f)?;
        }
    }
    if let Some(selection) = selection {
        visit_expr(selection, SubqueryPosition::Scalar, &mut f)?;
    }
    if let Some(having) = having {
        visit_expr(having, SubqueryPosition::Scalar, &mut f)?;
    }
    Ok(())
}

fn visit_join_operator<F>(operator: &mut JoinOperator, f: &mut F) -> AppResult<()>
where
    F: FnMut(SubqueryPosition, &mut Query) -> AppResult<()>
{
    let constraint = match operator {
        JoinOperator::Join(constraint)
        | JoinOperator::Inner(constraint)
        | JoinOperator::Left(constraint)
        | JoinOperator::LeftOuter(constraint)
        | JoinOperator::Right(constraint)
        | JoinOperator::RightOuter(constraint)
        | JoinOperator::FullOuter(constraint)
        | JoinOperator::CrossJoin(constraint)
        | JoinOperator::Semi(constraint)
        | JoinOperator::LeftSemi(constraint)
        | JoinOperator::RightSemi(constraint)
        | JoinOperator::Anti(constraint)
        | JoinOperator::LeftAnti(constraint)
        | JoinOperator::RightAnti(constraint)
        | JoinOperator::StraightJoin(constraint) => constraint,
        JoinOperator::AsOf {
            match_condition,
            constraint
        } => {
            visit_expr(match_condition, SubqueryPosition::Join, f)?;
            constraint
        }
        JoinOperator::CrossApply | JoinOperator::OuterApply => return Ok(())
    };
    if let JoinConstraint::On(on) = constraint {
        visit_expr(on, SubqueryPosition::Join, f)?;
    }
    Ok(())
}

fn visit_table_factor<F>(
    factor: &mut TableFactor,
    position: SubqueryPosition,
    f: &mut F
) -> AppResult<()>
where
    F: FnMut(SubqueryPosition, &mut Query) -> AppResult<()>
{
    match factor {
        TableFactor::Derived {
            subquery, ..
        } => f(position, &mut **subquery),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => {
            let nested = &mut **table_with_joins;
            visit_table_factor(&mut nested.relation, position, f)?;
            for join in nested.joins.iter_mut() {
                visit_table_factor(&mut join.relation, SubqueryPosition::Join, f)?;
                visit_join_operator(&mut join.join_operator, f)?;
            }
            Ok(())
        }
        _ => Ok(())
    }
}

fn visit_expr<F>(expr: &mut Expr, base: SubqueryPosition, f: &mut F) -> AppResult<()>
where
    F: FnMut(SubqueryPosition, &mut Query) -> AppResult<()>
{
    let mut boundary = ScopeBoundary {
        base,
        labels: Vec::new(),
        depth: 0,
        f
    };
    match expr.visit(&mut boundary) {
        ControlFlow::Break(e) => Err(e),
        ControlFlow::Continue(()) => Ok(())
    }
}

/// Hands each outermost query of an expression tree to `f`.
///
/// `labels` mirrors the chain of enclosing expressions; the innermost one
/// that names its subquery (`IN`, `EXISTS`, `ANY`, `ALL`) decides the
/// reported position. Queries below `depth` 0 are already handled.
struct ScopeBoundary<'f, F> {
    base:   SubqueryPosition,
    labels: Vec<Option<SubqueryPosition>>,
    depth:  usize,
    f:      &'f mut F
}

impl<F> ScopeBoundary<'_, F> {
    fn label(&self, expr: &Expr) -> Option<SubqueryPosition> {
        match expr {
            Expr::InSubquery {
                negated, ..
            } => Some(if *negated {
                SubqueryPosition::NotIn
            } else {
                SubqueryPosition::In
            }),
            Expr::Exists {
                negated, ..
            } => Some(if *negated {
                SubqueryPosition::NotExists
            } else {
                SubqueryPosition::Exists
            }),
            Expr::AnyOp {
                ..
            } => Some(SubqueryPosition::Any),
            Expr::AllOp {
                ..
            } => Some(SubqueryPosition::All),
            // `= ANY ((SELECT ...))`
            Expr::Subquery(_) | Expr::Nested(_) => self
                .labels
                .last()
                .copied()
                .flatten()
                .filter(|p| matches!(p, SubqueryPosition::Any | SubqueryPosition::All)),
            _ => None
        }
    }

    fn position(&self) -> SubqueryPosition {
        match self.base {
            SubqueryPosition::SelectList | SubqueryPosition::Join => self.base,
            _ => self.labels.last().copied().flatten().unwrap_or(self.base)
        }
    }
}

impl<F> VisitorMut for ScopeBoundary<'_, F>
where
    F: FnMut(SubqueryPosition, &mut Query) -> AppResult<()>
{
    type Break = AppError;

    fn pre_visit_query(&mut self, query: &mut Query) -> ControlFlow<AppError> {
        if self.depth == 0 {
            let position = self.position();
            if let Err(e) = (self.f)(position, query) {
                return ControlFlow::Break(e);
            }
        }
        self.depth += 1;
        ControlFlow::Continue(())
    }

    fn post_visit_query(&mut self, _query: &mut Query) -> ControlFlow<AppError> {
        self.depth -= 1;
        ControlFlow::Continue(())
    }

    fn pre_visit_expr(&mut self, expr: &mut Expr) -> ControlFlow<AppError> {
        if self.depth == 0 {
            let label = self.label(expr);
            self.labels.push(label);
        }
        ControlFlow::Continue(())
    }

    fn post_visit_expr(&mut self, _expr: &mut Expr) -> ControlFlow<AppError> {
        if self.depth == 0 {
            self.labels.pop();
        }
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
mod tests {
    use sqlparser::ast::{SetExpr, Statement};

    use super::*;
    use crate::query::{SqlDialect, parse_single_statement};

    fn positions(sql: &str) -> Vec<SubqueryPosition> {
        let Statement::Query(mut query) = parse_single_statement(sql, SqlDialect::Generic).unwrap()
        else {
            panic!("not a query");
        };
        let SetExpr::Select(select) = query.body.as_mut() else {
            panic!("not a select");
        };
        let mut found = Vec::new();
        for_each_subquery(select, |position, _| {
            found.push(position);
            Ok(())
        })
        .unwrap();
        found
    }

    #[test]
    fn test_select_list_scalar_in_case() {
        let sql = "SELECT CASE WHEN (SELECT COUNT(*) FROM orders) > 0 THEN 1 END FROM users";
        assert_eq!(positions(sql), vec![SubqueryPosition::SelectList]);
    }

    #[test]
    fn test_from_and_join_derived() {
        let sql = "SELECT * FROM (SELECT 1 AS id) a JOIN (SELECT 1 AS id) b ON a.id = b.id";
        assert_eq!(
            positions(sql),
            vec![SubqueryPosition::From, SubqueryPosition::Join]
        );
    }

    #[test]
    fn test_every_join_operator_condition() {
        let joins = [
            "JOIN",
            "INNER JOIN",
            "LEFT JOIN",
            "LEFT OUTER JOIN",
            "RIGHT JOIN",
            "FULL JOIN"
        ];
        for join in joins {
            let sql = format!(
                "SELECT * FROM users u {} orders o ON o.id IN (SELECT id FROM orders)",
                join
            );
            assert_eq!(positions(&sql), vec![SubqueryPosition::Join], "{}", join);
        }
    }

    #[test]
    fn test_where_operators() {
        let sql = "SELECT * FROM t WHERE a IN (SELECT a FROM x) \
                   AND b NOT IN (SELECT b FROM y) \
                   AND EXISTS (SELECT 1 FROM z) \
                   AND NOT EXISTS (SELECT 1 FROM w) \
                   AND c > (SELECT MAX(c) FROM v)";
        assert_eq!(
            positions(sql),
            vec![
                SubqueryPosition::In,
                SubqueryPosition::NotIn,
                SubqueryPosition::Exists,
                SubqueryPosition::NotExists,
                SubqueryPosition::Scalar,
            ]
        );
    }

    #[test]
    fn test_quantified_comparisons() {
        let sql = "SELECT * FROM t WHERE a = ANY (SELECT a FROM x) AND b > ALL (SELECT b FROM y)";
        assert_eq!(
            positions(sql),
            vec![SubqueryPosition::Any, SubqueryPosition::All]
        );
    }

    #[test]
    fn test_less_common_expression_kinds() {
        let sql = "SELECT EXTRACT(YEAR FROM (SELECT MAX(created) FROM x)), \
                   SUM(n) FILTER (WHERE n IN (SELECT n FROM y)) \
                   FROM t WHERE (SELECT COUNT(*) FROM z) IS DISTINCT FROM 0";
        assert_eq!(
            positions(sql),
            vec![
                SubqueryPosition::SelectList,
                SubqueryPosition::SelectList,
                SubqueryPosition::Scalar,
            ]
        );
    }

    #[test]
    fn test_nested_subquery_not_returned() {
        let sql = "SELECT * FROM t WHERE a IN (SELECT a FROM x WHERE b IN (SELECT b FROM y))";
        assert_eq!(positions(sql), vec![SubqueryPosition::In]);
    }

    #[test]
    fn test_error_stops_walk() {
        let Statement::Query(mut query) = parse_single_statement(
            "SELECT (SELECT 1), (SELECT 2) FROM t",
            SqlDialect::Generic
        )
        .unwrap() else {
            panic!("not a query");
        };
        let SetExpr::Select(select) = query.body.as_mut() else {
            panic!("not a select");
        };
        let mut calls = 0;
        let result = for_each_subquery(select, |_, _| {
            calls += 1;
            Err(AppError::bad_request("stop"))
        });
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_plain_select_has_none() {
        assert!(positions("SELECT a, b FROM t WHERE a = 1 ORDER BY b").is_empty());
    }
}
