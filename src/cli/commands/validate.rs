//! `validate` command
//!
//! Loads the given files, prints every issue and fails with the
//! configuration exit code when errors (or, under `--strict`, warnings)
//! are present.

use serde_json::json;

use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::config::LoadResult;
use crate::error::ScopeError;
use crate::observability::{init_metrics, metrics};

/// Validate configuration files.
///
/// # Errors
///
/// Returns a load error, `ScopeError::Validation` when the configuration
/// fails validation, or an I/O error writing metrics.
pub fn run(args: &ValidateArgs) -> Result<(), ScopeError> {
    if args.metrics_out.is_some() {
        init_metrics()?;
    }

    let result = super::load(&args.config.files)?;

    match args.format {
        OutputFormat::Human => print_human(&result, args.strict),
        OutputFormat::Json => print_json(&result, args.strict)?,
    }

    if let Some(path) = &args.metrics_out {
        metrics::write_metrics(path)?;
    }

    let errors = result.error_count();
    let warnings = warning_count(&result);
    if fails(errors, warnings, args.strict) {
        return Err(ScopeError::Validation { errors, warnings });
    }

    tracing::info!("configuration valid");
    Ok(())
}

/// Validation issue warnings plus warnings raised while loading.
fn warning_count(result: &LoadResult) -> usize {
    result.warning_count() + result.warnings.len()
}

const fn fails(errors: usize, warnings: usize, strict: bool) -> bool {
    errors > 0 || (strict && warnings > 0)
}

fn print_human(result: &LoadResult, strict: bool) {
    for warning in &result.warnings {
        match &warning.location {
            Some(location) => println!("warning[load]: {} at {location}", warning.message),
            None => println!("warning[load]: {}", warning.message),
        }
    }
    for issue in &result.issues {
        println!("{issue}");
    }

    let config = &result.config;
    let errors = result.error_count();
    let warnings = warning_count(result);
    if fails(errors, warnings, strict) {
        println!("{errors} error(s), {warnings} warning(s)");
    } else {
        println!(
            "OK: {} microscope(s), {} device(s), {warnings} warning(s)",
            config.microscopes.len(),
            config.hardware.device_count(),
        );
    }
}

fn print_json(result: &LoadResult, strict: bool) -> Result<(), ScopeError> {
    let errors = result.error_count();
    let warnings = warning_count(result);
    let load_warnings: Vec<_> = result
        .warnings
        .iter()
        .map(|w| json!({ "message": w.message, "location": w.location }))
        .collect();
    let report = json!({
        "valid": !fails(errors, warnings, strict),
        "errors": errors,
        "warnings": warnings,
        "microscopes": result.config.microscope_names().collect::<Vec<_>>(),
        "load_warnings": load_warnings,
        "issues": result.issues,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
