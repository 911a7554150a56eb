// SPDX-FileCopyrightText: 2025 RAprogramm
// SPDX-License-Identifier: MIT

use sql_tenant_guard::{
    output::{OutputFormat, OutputOptions, format_diagnostics, format_rewrites},
    registry::TenantRegistry,
    rewrite::{Rewritten, TenantId, TenantRewriter}
};

fn results() -> Vec<Rewritten> {
    let registry = TenantRegistry::new([("orders", "user_id")]);
    TenantRewriter::new(&registry)
        .rewrite_script(
            "SELECT * FROM orders; SELECT * FROM lookup_codes",
            &TenantId::Integer(5)
        )
        .unwrap()
}

fn options(format: OutputFormat) -> OutputOptions {
    OutputOptions {
        format,
        colored: false
    }
}

#[test]
fn test_default_options() {
    let opts = OutputOptions::default();
    assert!(matches!(opts.format, OutputFormat::Text));
    assert!(opts.colored);
}

#[test]
fn test_text_output_is_executable_sql() {
    let output = format_rewrites(&results(), "5", &options(OutputFormat::Text));
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines[0], r#"SELECT * FROM orders WHERE "orders"."user_id" = 5;"#);
    assert_eq!(lines[1], "SELECT * FROM lookup_codes;");
    assert!(lines[2].starts_with("-- WARN [unresolved_table]"));
    assert!(lines[2].contains("lookup_codes"));
}

#[test]
fn test_json_output() {
    let output = format_rewrites(&results(), "5", &options(OutputFormat::Json));
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    let statements = value["statements"].as_array().unwrap();
    assert_eq!(statements.len(), 2);
    assert_eq!(statements[0]["report"]["filtered"][0]["table"], "orders");
    assert_eq!(statements[0]["report"]["filtered"][0]["column"], "user_id");
    assert_eq!(statements[1]["report"]["diagnostics"][0]["severity"], "Warning");
}

#[test]
fn test_yaml_output() {
    let output = format_rewrites(&results(), "5", &options(OutputFormat::Yaml));
    assert!(output.contains("tenant: '5'"));
    assert!(output.contains("kind: Plain"));
}

#[test]
fn test_diagnostics_empty_for_clean_rewrite() {
    let results = results();
    assert!(format_diagnostics(&results[0].report, &options(OutputFormat::Text)).is_empty());
}
