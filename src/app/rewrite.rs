//! Core rewrite execution logic.

use tracing::debug;

use super::{
    helpers::{
        build_registry, calculate_exit_code, create_output_options, effective_options,
        read_queries_input
    },
    types::{RewriteParams, RewriteResult}
};
use crate::{
    config::Config,
    error::{AppResult, config_error},
    output::format_rewrites,
    rewrite::{TenantId, TenantRewriter}
};

/// Executes the rewrite pipeline.
///
/// 1. **Registry**: loads the registry named on the command line or in the
///    configuration
/// 2. **Input**: reads SQL from a file or stdin
/// 3. **Rewrite**: one statement, or every statement with `batch`
/// 4. **Output**: formats results and derives the exit code
///
/// # Errors
///
/// Returns an error if no registry is configured, a file cannot be read,
/// or any statement cannot be rewritten. Nothing is printed for a failed
/// rewrite, so the unscoped SQL never reaches stdout.
pub fn run_rewrite(params: RewriteParams, config: &Config) -> AppResult<RewriteResult> {
    let registry_path = params
        .registry_path
        .clone()
        .or_else(|| config.registry.path.clone())
        .ok_or_else(|| {
            config_error("No tenant registry given (use --registry or TENANT_REGISTRY)")
        })?;
    let registry = build_registry(
        &registry_path,
        config,
        &params.default_schemas,
        params.case_sensitive
    )?;
    debug!(
        path = %registry_path.display(),
        tables = registry.len(),
        "loaded tenant registry"
    );
    let options = effective_options(config, params.dialect, params.strict)?;
    let tenant = if params.raw_tenant {
        TenantId::Raw(params.tenant.clone())
    } else {
        let Ok(tenant) = params.tenant.parse::<TenantId>();
        tenant
    };
    let sql = read_queries_input(&params.queries_path)?;

    let rewriter = TenantRewriter::with_options(&registry, options);
    let results = if params.batch {
        rewriter.rewrite_script(&sql, &tenant)?
    } else {
        vec![rewriter.rewrite(&sql, &tenant)?]
    };

    let output_opts = create_output_options(params.output_format, params.no_color);
    Ok(RewriteResult {
        exit_code: calculate_exit_code(&results),
        output:    format_rewrites(&results, &params.tenant, &output_opts)
    })
}
