use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// SQL Tenant Guard - Scope SQL queries to a single tenant
#[derive(Parser, Debug)]
#[command(name = "sql-tenant-guard")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inject tenant predicates into SQL queries
    Rewrite {
        /// Path to the tenant registry (YAML)
        #[arg(short, long, env = "TENANT_REGISTRY")]
        registry: Option<PathBuf>,

        /// Tenant identifier; integers are rendered as numbers, anything else
        /// as a quoted string literal unless --raw-tenant is given
        #[arg(short, long, env = "TENANT_ID")]
        tenant: String,

        /// Insert the tenant value into the SQL verbatim, without quoting or
        /// escaping (trusted input only, e.g. `current_setting('app.tenant')`)
        #[arg(long)]
        raw_tenant: bool,

        /// Path to SQL query file (use - for stdin)
        #[arg(short, long)]
        queries: PathBuf,

        /// SQL dialect for parsing and quoting
        #[arg(long, value_enum)]
        dialect: Option<Dialect>,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        output_format: Format,

        /// Schema searched for unqualified table names (repeatable)
        #[arg(long = "default-schema")]
        default_schemas: Vec<String>,

        /// Match table names exactly instead of case-insensitively
        #[arg(long)]
        case_sensitive: bool,

        /// Treat tables missing from the registry as errors
        #[arg(long)]
        strict: bool,

        /// Accept several statements and rewrite each of them
        #[arg(long)]
        batch: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Dialect {
    Generic,
    Mysql,
    Postgresql,
    Sqlite,
    Clickhouse,
    Mssql
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Format {
    Text,
    Json,
    Yaml
}
