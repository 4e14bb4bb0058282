//! Configuration module
//!
//! Loads, merges and validates microscope hardware configuration files and
//! exposes the result as a typed, read-only [`Config`].

pub mod devices;
pub mod inventory;
pub mod loader;
pub mod merge;
pub mod normalize;
pub mod overlay;
pub mod schema;
pub mod validation;

pub use devices::{DeviceCategory, DeviceKind, DeviceType};
pub use loader::{ConfigLimits, ConfigLoader, LoadResult, LoadWarning, LoaderOptions};
pub use overlay::{EffectiveConfig, Overrides};
pub use schema::*;
pub use validation::{ValidationResult, Validator, validate};
