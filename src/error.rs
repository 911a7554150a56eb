pub use masterror::{AppError, AppResult};

/// Create file read error
pub fn file_read_error(path: &str, source: std::io::Error) -> AppError {
    AppError::internal(format!("Failed to read file '{}': {}", path, source))
}

/// Create query parse error with optional position info
///
/// A parse failure is fatal: the original text must never be executed as a
/// fallback.
pub fn query_parse_error(message: impl Into<String>) -> AppError {
    let msg = message.into();
    AppError::bad_request(format_sql_error("Query parse error", &msg))
}

/// Create error for statements the rewriter refuses to scope
pub fn unsupported_statement_error(message: impl Into<String>) -> AppError {
    AppError::bad_request(format!("Unsupported statement: {}", message.into()))
}

/// Create error for a tenant table found outside every rewritten scope
pub fn uncovered_table_error(table: &str) -> AppError {
    AppError::bad_request(format!(
        "Tenant table '{}' appears in a position the rewriter cannot scope",
        table
    ))
}

/// Create tenant registry error
pub fn registry_error(message: impl Into<String>) -> AppError {
    AppError::bad_request(format!("Registry error: {}", message.into()))
}

/// Create config error
pub fn config_error(message: impl Into<String>) -> AppError {
    AppError::bad_request(message.into())
}

/// Format SQL error with position highlighting
fn format_sql_error(prefix: &str, message: &str) -> String {
    // sqlparser format: "... at Line: X, Column: Y"
    if let Some(pos) = extract_position(message) {
        format!(
            "{} at line {}, column {}:\n  {}",
            prefix, pos.line, pos.column, message
        )
    } else {
        format!("{}:\n  {}", prefix, message)
    }
}

struct SqlPosition {
    line:   usize,
    column: usize
}

fn extract_position(message: &str) -> Option<SqlPosition> {
    let line_marker = "Line: ";
    let line_start = message.find(line_marker)? + line_marker.len();
    let line_len = message[line_start..]
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(message.len() - line_start);
    let line = message[line_start..line_start + line_len].parse().ok()?;

    // Both "Column: 7" and "Column 7" occur across sqlparser releases
    let rest = &message[line_start + line_len..];
    let col_marker = rest.find("Column")? + "Column".len();
    let col_start = rest[col_marker..]
        .find(|c: char| c.is_ascii_digit())
        .map(|offset| col_marker + offset)?;
    let col_len = rest[col_start..]
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len() - col_start);
    let column = rest[col_start..col_start + col_len].parse().ok()?;

    Some(SqlPosition {
        line,
        column
    })
}
