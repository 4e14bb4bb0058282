//! `show` command
//!
//! Prints the merged, normalized configuration, or one microscope of it.

use indexmap::IndexMap;
use serde::Serialize;

use crate::cli::args::{ShowArgs, ShowFormat};
use crate::config::MicroscopeConfig;
use crate::error::ScopeError;

/// Print the merged configuration.
///
/// # Errors
///
/// Returns a load error, `ScopeError::NotFound` for an unknown microscope,
/// or a serialization error.
pub fn run(args: &ShowArgs) -> Result<(), ScopeError> {
    let result = super::load(&args.config.files)?;
    super::log_issues(&result);

    let config = &result.config;
    let output = match &args.microscope {
        Some(name) => {
            let microscope = config
                .microscope(name)
                .ok_or_else(|| ScopeError::NotFound(format!("unknown microscope '{name}'")))?;
            let single: IndexMap<&str, &MicroscopeConfig> =
                std::iter::once((name.as_str(), microscope)).collect();
            render(&single, args.format)?
        }
        None => render(config.as_ref(), args.format)?,
    };

    print!("{output}");
    Ok(())
}

fn render<T: Serialize + ?Sized>(value: &T, format: ShowFormat) -> Result<String, ScopeError> {
    Ok(match format {
        ShowFormat::Yaml => serde_yaml::to_string(value)?,
        ShowFormat::Json => serde_json::to_string_pretty(value)? + "\n",
    })
}
