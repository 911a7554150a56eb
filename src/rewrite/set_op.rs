use sqlparser::ast::{SetExpr, SetOperator};
use tracing::debug;

use super::{RewriteSession, ScopeWalker};
use crate::error::AppResult;

/// Rewrite both branches of a UNION, INTERSECT or EXCEPT.
///
/// Branches never share filtered state: each one is a scope of its own.
/// Operator, quantifier and any ORDER BY/LIMIT on the enclosing query stay
/// where they are.
pub(super) fn rewrite_set_operation(
    walker: &mut ScopeWalker<'_>,
    op: &SetOperator,
    left: &mut SetExpr,
    right: &mut SetExpr,
    session: &RewriteSession
) -> AppResult<()> {
    debug!(op = %op, depth = session.depth(), "rewriting set operation branches");
    for branch in [left, right] {
        let mut branch_session = session.child();
        walker.rewrite_set_expr(branch, &mut branch_session)?;
    }
    Ok(())
}
