use sqlparser::{
    ast::Statement,
    dialect::{
        ClickHouseDialect, Dialect, GenericDialect, MsSqlDialect, MySqlDialect, PostgreSqlDialect,
        SQLiteDialect
    },
    parser::Parser
};

use crate::error::{AppResult, query_parse_error, unsupported_statement_error};

/// SQL dialect for parsing and identifier quoting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum SqlDialect {
    #[default]
    Generic,
    MySQL,
    PostgreSQL,
    SQLite,
    ClickHouse,
    MsSql
}

impl SqlDialect {
    /// Convert to sqlparser dialect for parsing
    pub fn into_parser_dialect(self) -> Box<dyn Dialect> {
        match self {
            Self::Generic => Box::new(GenericDialect {}),
            Self::MySQL => Box::new(MySqlDialect {}),
            Self::PostgreSQL => Box::new(PostgreSqlDialect {}),
            Self::SQLite => Box::new(SQLiteDialect {}),
            Self::ClickHouse => Box::new(ClickHouseDialect {}),
            Self::MsSql => Box::new(MsSqlDialect {})
        }
    }

    /// Opening quote character used for injected identifiers
    pub fn identifier_quote(self) -> char {
        match self {
            Self::MySQL | Self::ClickHouse => '`',
            Self::MsSql => '[',
            Self::Generic | Self::PostgreSQL | Self::SQLite => '"'
        }
    }

    /// Parse a dialect name as used in config files and env vars
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "generic" | "ansi" => Some(Self::Generic),
            "mysql" | "mariadb" => Some(Self::MySQL),
            "postgres" | "postgresql" => Some(Self::PostgreSQL),
            "sqlite" | "csv" => Some(Self::SQLite),
            "clickhouse" => Some(Self::ClickHouse),
            "mssql" | "sqlserver" => Some(Self::MsSql),
            _ => None
        }
    }
}

/// Parse every statement in `sql`
pub fn parse_statements(sql: &str, dialect: SqlDialect) -> AppResult<Vec<Statement>> {
    let parser_dialect = dialect.into_parser_dialect();
    Parser::parse_sql(parser_dialect.as_ref(), sql).map_err(|e| query_parse_error(e.to_string()))
}

/// Parse exactly one statement
///
/// Trailing statements are an error, never ignored.
pub fn parse_single_statement(sql: &str, dialect: SqlDialect) -> AppResult<Statement> {
    let mut statements = parse_statements(sql, dialect)?;
    match statements.len() {
        1 => Ok(statements.remove(0)),
        0 => Err(query_parse_error("No SQL statement found")),
        n => Err(unsupported_statement_error(format!(
            "expected a single statement, found {}",
            n
        )))
    }
}
