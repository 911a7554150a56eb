//! # SQL Tenant Guard
//!
//! Rewrites SQL queries so they only see one tenant's rows.
//!
//! Given a [`registry::TenantRegistry`] mapping tables to their tenant
//! column, [`rewrite::TenantRewriter`] injects `"<alias>"."<column>" =
//! <tenant>` into the WHERE clause of every scope that reads a registry
//! table: plain queries, joins, subqueries, set operations and CTEs.
//!
//! # Modules
//!
//! - [`rewrite`] - Query classification and tenant predicate injection
//! - [`registry`] - Tenant table registry and name resolution
//! - [`report`] - Diagnostics recorded while rewriting
//! - [`query`] - SQL dialects and parsing
//! - [`config`] - Configuration loading
//! - [`output`] - Result formatting
//! - [`app`] - Command implementations behind the CLI
//! - [`error`] - Error types and constructors

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod query;
pub mod registry;
pub mod report;
pub mod rewrite;

pub use crate::{
    registry::{TableMatcher, TenantRegistry},
    rewrite::{Rewritten, TenantId, TenantRewriter, rewrite}
};
