//! CLI command dispatch and handlers
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod completions;
pub mod inventory;
pub mod microscopes;
pub mod show;
pub mod validate;
pub mod version;

use std::path::PathBuf;

use crate::cli::args::{Cli, Commands};
use crate::config::{ConfigLoader, LoadResult};
use crate::error::ScopeError;

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub fn dispatch(cli: Cli) -> Result<(), ScopeError> {
    match cli.command {
        Commands::Validate(args) => validate::run(&args),
        Commands::Show(args) => show::run(&args),
        Commands::Inventory(args) => inventory::run(&args),
        Commands::Microscopes(args) => microscopes::run(&args),
        Commands::Completions(args) => {
            completions::run(&args);
            Ok(())
        }
        Commands::Version(args) => {
            version::run(&args);
            Ok(())
        }
    }
}

/// Loads and merges `files`, logging load warnings.
fn load(files: &[PathBuf]) -> Result<LoadResult, ScopeError> {
    for path in files {
        tracing::info!(file = %path.display(), "loading configuration");
    }
    let result = ConfigLoader::with_defaults().load(files)?;
    for warning in &result.warnings {
        tracing::warn!(
            location = warning.location.as_deref().unwrap_or("<unknown>"),
            "{}",
            warning.message
        );
    }
    Ok(result)
}

/// Logs issues of a configuration that is being displayed rather than
/// validated.
fn log_issues(result: &LoadResult) {
    if result.has_errors() {
        tracing::warn!(
            errors = result.error_count(),
            "configuration has errors; run `scopecfg validate` for details"
        );
    }
}
