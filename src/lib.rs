//! `scopecfg` - microscope hardware configuration loader and validator
//!
//! Reads one or more YAML documents describing a light-sheet microscope's
//! hardware, merges them in order, and produces a typed, read-only
//! [`config::Config`] together with every schema, range, reference and
//! cardinality problem found in it.
//!
//! ```no_run
//! use std::path::PathBuf;
//! use scopecfg::config::ConfigLoader;
//!
//! let files = [PathBuf::from("configuration.yaml"), PathBuf::from("site.yaml")];
//! let result = ConfigLoader::with_defaults().load(&files)?;
//! for issue in &result.issues {
//!     eprintln!("{issue}");
//! }
//! if let Some(name) = result.config.default_microscope_name() {
//!     println!("default microscope: {name}");
//! }
//! # Ok::<(), scopecfg::error::ConfigError>(())
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod observability;
