//! `microscopes` command

use crate::cli::args::MicroscopesArgs;
use crate::error::ScopeError;

/// List microscope names in declaration order, marking the default.
///
/// # Errors
///
/// Returns a load error.
pub fn run(args: &MicroscopesArgs) -> Result<(), ScopeError> {
    let result = super::load(&args.config.files)?;
    super::log_issues(&result);

    let config = &result.config;
    let default = config.default_microscope_name();
    for (name, microscope) in &config.microscopes {
        let mut line = name.clone();
        if let Some(parent) = &microscope.inherits {
            line.push_str(&format!(" (inherits {parent})"));
        }
        if Some(name.as_str()) == default {
            line.push_str(" *default");
        }
        println!("{line}");
    }
    Ok(())
}
