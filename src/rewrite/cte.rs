use sqlparser::ast::Query;
use tracing::debug;

use super::{RewriteSession, ScopeWalker};
use crate::error::AppResult;

/// Rewrite a query that starts with `WITH`.
///
/// CTE bodies are rewritten in declaration order. Each body sees the names
/// of the CTEs declared before it; under `WITH RECURSIVE` it also sees its
/// own name. The main body sees every CTE name, and so do its subqueries.
pub(super) fn rewrite_with_query(
    walker: &mut ScopeWalker<'_>,
    query: &mut Query,
    mut session: RewriteSession
) -> AppResult<()> {
    if let Some(with) = query.with.as_mut() {
        let recursive = with.recursive;
        for cte in with.cte_tables.iter_mut() {
            let name = walker.normalize(&cte.alias.name.value);
            let mut body_session = session.child();
            if recursive {
                body_session.bind_cte(name.clone());
            }
            debug!(
                cte = %cte.alias.name.value,
                recursive,
                depth = body_session.depth(),
                "rewriting CTE body"
            );
            walker.rewrite_query(&mut cte.query, body_session)?;
            session.bind_cte(name);
        }
    }
    walker.rewrite_set_expr(&mut query.body, &mut session)
}
