//! # SQL Tenant Guard
//!
//! Scope SQL queries to a single tenant before they are executed.
//!
//! # Quick Start
//!
//! ```bash
//! # Rewrite one query for tenant 42
//! sql-tenant-guard rewrite -r tenant-tables.yaml -t 42 -q query.sql
//!
//! # Stream from stdin, PostgreSQL dialect, JSON report
//! echo "SELECT * FROM orders" | sql-tenant-guard rewrite -r tables.yaml -t 42 -q - \
//!     --dialect postgresql -f json
//!
//! # Rewrite every statement of a script, failing on unknown tables
//! sql-tenant-guard rewrite -r tables.yaml -t acme -q script.sql --batch --strict
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded from (in order of precedence):
//!
//! 1. Command-line arguments
//! 2. Environment variables (`TENANT_REGISTRY`, `TENANT_ID`, `TENANT_SQL_DIALECT`)
//! 3. `.sql-tenant-guard.toml` in current directory
//! 4. `~/.config/sql-tenant-guard/config.toml`
//!
//! # Exit Codes
//!
//! - `0` - Rewritten, no diagnostics or only informational ones
//! - `1` - Rewritten with warnings, or the rewrite failed
//! - `2` - Rewritten with error diagnostics (see `--strict`)
//!
//! # Logging
//!
//! Log events go to stderr and are filtered with `RUST_LOG`, for example
//! `RUST_LOG=sql_tenant_guard=debug`.

use std::{io, process};

use clap::Parser;
use sql_tenant_guard::{
    app::{RewriteParams, run_rewrite},
    cli::{Cli, Commands},
    config::Config,
    error::AppResult
};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    match run() {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e.render_message());
            process::exit(1);
        }
    }
}

fn run() -> AppResult<i32> {
    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Rewrite {
            registry,
            tenant,
            raw_tenant,
            queries,
            dialect,
            output_format,
            default_schemas,
            case_sensitive,
            strict,
            batch,
            no_color
        } => {
            let params = RewriteParams {
                registry_path: registry,
                tenant,
                raw_tenant,
                queries_path: queries.to_string_lossy().into_owned(),
                dialect,
                output_format,
                default_schemas,
                case_sensitive,
                strict,
                batch,
                no_color
            };
            let result = run_rewrite(params, &config)?;
            print!("{}", result.output);
            Ok(result.exit_code)
        }
    }
}
