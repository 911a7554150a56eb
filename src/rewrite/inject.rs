use sqlparser::ast::{BinaryOperator, Expr};

use super::predicate::FilterPredicate;

/// Merge predicates into an optional WHERE expression.
///
/// Without predicates the selection is returned untouched. Otherwise an
/// existing expression whose root is an unparenthesized OR/XOR is wrapped in
/// parentheses before the predicates are conjoined.
pub fn inject_predicates(
    selection: Option<Expr>,
    predicates: impl IntoIterator<Item = FilterPredicate>
) -> Option<Expr> {
    let mut predicates = predicates.into_iter().map(|p| p.expr).peekable();
    if predicates.peek().is_none() {
        return selection;
    }
    let mut combined = match selection {
        Some(existing) => protect_disjunction(existing),
        None => predicates.next()?
    };
    for predicate in predicates {
        combined = Expr::BinaryOp {
            left:  Box::new(combined),
            op:    BinaryOperator::And,
            right: Box::new(predicate)
        };
    }
    Some(combined)
}

/// True when `expr` has an OR (or XOR) outside any parentheses
pub fn has_top_level_or(expr: &Expr) -> bool {
    match expr {
        Expr::BinaryOp {
            op: BinaryOperator::Or | BinaryOperator::Xor,
            ..
        } => true,
        Expr::BinaryOp {
            left,
            op: BinaryOperator::And,
            right
        } => has_top_level_or(left) || has_top_level_or(right),
        _ => false
    }
}

fn protect_disjunction(expr: Expr) -> Expr {
    if has_top_level_or(&expr) {
        Expr::Nested(Box::new(expr))
    } else {
        expr
    }
}
