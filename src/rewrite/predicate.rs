use std::{fmt, str::FromStr};

use serde::Serialize;
use sqlparser::ast::{BinaryOperator, Expr, Ident, Value};

use crate::{query::SqlDialect, registry::TableMatch};

/// Tenant identifier rendered into injected predicates.
///
/// The value is rendered into SQL text, never bound as a parameter. `Raw`
/// is inserted verbatim and must come from a trusted source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TenantId {
    Integer(i64),
    /// Rendered as a single-quoted string literal
    Text(String),
    /// Inserted verbatim
    Raw(String)
}

impl TenantId {
    pub fn to_expr(&self) -> Expr {
        match self {
            Self::Integer(n) => Expr::Value(Value::Number(n.to_string(), false).into()),
            Self::Text(s) => Expr::Value(Value::SingleQuotedString(s.clone()).into()),
            Self::Raw(s) => Expr::Identifier(Ident::new(s.clone()))
        }
    }
}

impl From<i64> for TenantId {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for TenantId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for TenantId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl FromStr for TenantId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Ok(match trimmed.parse::<i64>() {
            Ok(n) => Self::Integer(n),
            Err(_) => Self::Text(trimmed.to_string())
        })
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{}", n),
            Self::Text(s) | Self::Raw(s) => f.write_str(s)
        }
    }
}

/// Tenant equality predicate tied to the table it filters
#[derive(Debug, Clone)]
pub struct FilterPredicate {
    pub table_key: String,
    pub qualifier: String,
    pub column:    String,
    pub expr:      Expr
}

impl fmt::Display for FilterPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)
    }
}

/// Turns a matched table reference into a predicate expression
pub trait PredicateBuilder: Send + Sync {
    fn build(&self, qualifier: &str, matched: &TableMatch, tenant: &TenantId) -> FilterPredicate;
}

/// `"<qualifier>"."<column>" = <tenant>` with dialect-specific quoting
#[derive(Debug, Clone, Copy)]
pub struct QuotedPredicateBuilder {
    quote: char
}

impl QuotedPredicateBuilder {
    pub fn new(dialect: SqlDialect) -> Self {
        Self {
            quote: dialect.identifier_quote()
        }
    }
}

impl Default for QuotedPredicateBuilder {
    fn default() -> Self {
        Self::new(SqlDialect::Generic)
    }
}

impl PredicateBuilder for QuotedPredicateBuilder {
    fn build(&self, qualifier: &str, matched: &TableMatch, tenant: &TenantId) -> FilterPredicate {
        let column_ref = Expr::CompoundIdentifier(vec![
            Ident::with_quote(self.quote, qualifier),
            Ident::with_quote(self.quote, matched.column.as_str()),
        ]);
        FilterPredicate {
            table_key: matched.key.clone(),
            qualifier: qualifier.to_string(),
            column:    matched.column.clone(),
            expr:      Expr::BinaryOp {
                left:  Box::new(column_ref),
                op:    BinaryOperator::Eq,
                right: Box::new(tenant.to_expr())
            }
        }
    }
}
