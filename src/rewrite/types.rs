use compact_str::CompactString;
use serde::Serialize;

/// Where a table reference was discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RefOrigin {
    From,
    Join,
    /// `schema.table.column` identifier found in the WHERE clause
    WhereHeuristic
}

/// One table reference within a single SELECT scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableReference {
    pub name:   CompactString,
    pub schema: Option<CompactString>,
    pub alias:  Option<CompactString>,
    pub origin: RefOrigin
}

impl TableReference {
    /// Name the injected predicate qualifies columns with
    pub fn qualifier(&self) -> &str {
        self.alias.as_deref().unwrap_or(self.name.as_str())
    }

    /// `schema.name` or `name`
    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.name),
            None => self.name.to_string()
        }
    }
}

/// Shape of a query, checked in this order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub enum QueryKind {
    /// Leading `WITH`
    Cte,
    /// Top-level UNION / INTERSECT / EXCEPT
    SetOperation,
    /// A SELECT carrying subqueries in its select list, FROM/JOIN or WHERE
    WithSubqueries,
    Plain
}

impl std::fmt::Display for QueryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cte => write!(f, "CTE"),
            Self::SetOperation => write!(f, "SET OPERATION"),
            Self::WithSubqueries => write!(f, "WITH SUBQUERIES"),
            Self::Plain => write!(f, "PLAIN")
        }
    }
}

/// Syntactic position of a located subquery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SubqueryPosition {
    SelectList,
    /// Derived table in FROM
    From,
    /// Derived table operand of a JOIN, or a subquery in its ON condition
    Join,
    In,
    NotIn,
    Exists,
    NotExists,
    Any,
    All,
    /// Scalar subquery inside a WHERE or HAVING expression
    Scalar
}
