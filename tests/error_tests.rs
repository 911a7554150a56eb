// SPDX-FileCopyrightText: 2025 RAprogramm
// SPDX-License-Identifier: MIT

use sql_tenant_guard::error::{
    config_error, file_read_error, query_parse_error, registry_error, uncovered_table_error,
    unsupported_statement_error
};

#[test]
fn test_file_read_error() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let error = file_read_error("/path/to/query.sql", io_error);
    let msg = error.render_message();
    assert!(msg.contains("/path/to/query.sql"));
    assert!(msg.contains("file not found"));
}

#[test]
fn test_query_parse_error() {
    let error = query_parse_error("Unexpected token");
    assert_eq!(error.render_message(), "Query parse error:\n  Unexpected token");
}

#[test]
fn test_query_parse_error_with_position() {
    let error = query_parse_error("Expected: an expression, found: EOF at Line: 1, Column: 14");
    let msg = error.render_message();
    assert!(msg.starts_with("Query parse error at line 1, column 14:"));
    assert!(msg.contains("found: EOF"));
}

#[test]
fn test_unsupported_statement_error() {
    let error = unsupported_statement_error("only queries can be scoped, got DELETE");
    assert_eq!(
        error.render_message(),
        "Unsupported statement: only queries can be scoped, got DELETE"
    );
}

#[test]
fn test_uncovered_table_error() {
    let error = uncovered_table_error("orders");
    assert_eq!(
        error.render_message(),
        "Tenant table 'orders' appears in a position the rewriter cannot scope"
    );
}

#[test]
fn test_registry_error() {
    let error = registry_error("invalid registry document");
    assert_eq!(error.render_message(), "Registry error: invalid registry document");
}

#[test]
fn test_config_error() {
    let error = config_error("Invalid configuration");
    assert_eq!(error.render_message(), "Invalid configuration");
}
