use indexmap::IndexSet;

/// State of one independent table scope.
///
/// A session is created per SELECT body; nested scopes (CTE bodies,
/// set-operation branches, subqueries) get a [`child`](Self::child) with an
/// empty filtered set. CTE names bound by enclosing scopes are inherited so
/// they are never mistaken for registry tables further down.
#[derive(Debug, Clone, Default)]
pub struct RewriteSession {
    filtered:   IndexSet<String>,
    bound_ctes: IndexSet<String>,
    depth:      usize
}

impl RewriteSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh scope nested one level below this one
    pub fn child(&self) -> Self {
        Self {
            filtered:   IndexSet::new(),
            bound_ctes: self.bound_ctes.clone(),
            depth:      self.depth + 1
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Bind a CTE name (already normalized) as a virtual table
    pub fn bind_cte(&mut self, name: String) {
        self.bound_ctes.insert(name);
    }

    pub fn is_bound_cte(&self, name: &str) -> bool {
        self.bound_ctes.contains(name)
    }

    /// Record a qualifier as filtered; false if it already was
    pub fn mark_filtered(&mut self, qualifier: String) -> bool {
        self.filtered.insert(qualifier)
    }

    pub fn is_filtered(&self, qualifier: &str) -> bool {
        self.filtered.contains(qualifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_inherits_ctes_not_filtered() {
        let mut session = RewriteSession::new();
        session.bind_cte("s".to_string());
        assert!(session.mark_filtered("orders".to_string()));
        assert!(!session.mark_filtered("orders".to_string()));

        let child = session.child();
        assert!(child.is_bound_cte("s"));
        assert!(!child.is_filtered("orders"));
        assert_eq!(child.depth(), 1);
    }
}
