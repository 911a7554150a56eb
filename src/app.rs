//! Application logic for the SQL Tenant Guard CLI.
//!
//! This module contains the core application logic separated from the main
//! entry point to enable testing.

mod convert;
mod helpers;
mod rewrite;
mod types;

pub use self::{
    convert::{convert_dialect, convert_format},
    helpers::{
        build_registry, calculate_exit_code, create_output_options, effective_options,
        read_queries_input
    },
    rewrite::run_rewrite,
    types::{RewriteParams, RewriteResult}
};
