//! Runtime overrides over a frozen configuration
//!
//! The loaded [`Config`] is never mutated. Values that change while an
//! instrument runs (the active microscope, live stage offsets) are kept in
//! an [`Overrides`] layer and read through an [`EffectiveConfig`] view that
//! applies them on top of the baseline.

use indexmap::IndexMap;

use crate::config::schema::{AxisSpec, Config, MicroscopeConfig};
use crate::error::{Result, ScopeError};

/// Runtime overrides for one configuration.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    active_microscope: Option<String>,
    /// `(microscope, axis)` to offset.
    stage_offsets: IndexMap<(String, String), f64>,
}

impl Overrides {
    /// Creates an empty override layer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if nothing is overridden.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active_microscope.is_none() && self.stage_offsets.is_empty()
    }

    /// Switches the active microscope.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::NotFound`] if `config` has no such microscope.
    pub fn set_active_microscope(&mut self, config: &Config, name: &str) -> Result<()> {
        if config.microscope(name).is_none() {
            return Err(ScopeError::NotFound(format!("unknown microscope '{name}'")));
        }
        tracing::debug!(microscope = name, "active microscope overridden");
        self.active_microscope = Some(name.to_string());
        Ok(())
    }

    /// Sets a live offset for one stage axis, replacing the configured one.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::NotFound`] if the microscope or axis does not
    /// exist in `config`.
    pub fn set_stage_offset(
        &mut self,
        config: &Config,
        microscope: &str,
        axis: &str,
        offset: f64,
    ) -> Result<()> {
        let scope = config
            .microscope(microscope)
            .ok_or_else(|| ScopeError::NotFound(format!("unknown microscope '{microscope}'")))?;
        if scope.axis(axis).is_none() {
            return Err(ScopeError::NotFound(format!(
                "microscope '{microscope}' has no axis '{axis}'"
            )));
        }
        self.stage_offsets
            .insert((microscope.to_string(), axis.to_string()), offset);
        Ok(())
    }

    /// Drops a stage offset override. Returns the removed value.
    pub fn clear_stage_offset(&mut self, microscope: &str, axis: &str) -> Option<f64> {
        self.stage_offsets
            .shift_remove(&(microscope.to_string(), axis.to_string()))
    }

    fn stage_offset(&self, microscope: &str, axis: &str) -> Option<f64> {
        self.stage_offsets
            .get(&(microscope.to_string(), axis.to_string()))
            .copied()
    }
}

/// Read-only view of a configuration with overrides applied.
#[derive(Debug, Clone, Copy)]
pub struct EffectiveConfig<'a> {
    baseline: &'a Config,
    overrides: &'a Overrides,
}

impl<'a> EffectiveConfig<'a> {
    /// Creates a view over `baseline` with `overrides` applied.
    #[must_use]
    pub const fn new(baseline: &'a Config, overrides: &'a Overrides) -> Self {
        Self {
            baseline,
            overrides,
        }
    }

    /// The unmodified configuration.
    #[must_use]
    pub const fn baseline(&self) -> &'a Config {
        self.baseline
    }

    /// Name of the active microscope: the override, else the default.
    #[must_use]
    pub fn active_microscope_name(&self) -> Option<&'a str> {
        self.overrides
            .active_microscope
            .as_deref()
            .and_then(|name| self.baseline.microscopes.get_key_value(name))
            .map(|(name, _)| name.as_str())
            .or_else(|| self.baseline.default_microscope_name())
    }

    /// The active microscope.
    #[must_use]
    pub fn active_microscope(&self) -> Option<&'a MicroscopeConfig> {
        self.active_microscope_name()
            .and_then(|name| self.baseline.microscope(name))
    }

    /// Axes of a microscope with live offsets applied.
    #[must_use]
    pub fn axes(&self, microscope: &str) -> Vec<AxisSpec> {
        let Some(scope) = self.baseline.microscope(microscope) else {
            return Vec::new();
        };
        scope
            .axes()
            .into_iter()
            .map(|mut axis| {
                if let Some(offset) = self.overrides.stage_offset(microscope, &axis.name) {
                    axis.offset = offset;
                }
                axis
            })
            .collect()
    }

    /// One axis of a microscope with its live offset applied.
    #[must_use]
    pub fn axis(&self, microscope: &str, axis: &str) -> Option<AxisSpec> {
        self.axes(microscope).into_iter().find(|a| a.name == axis)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::ConfigLoader;

    const YAML: &str = r"
microscopes:
  Mesoscale:
    stage:
      hardware: [{type: Synthetic, axes: [x, y, z]}]
      z_offset: 10
  Nanoscale:
    default: true
    stage:
      hardware: [{type: Synthetic, axes: [x, f]}]
";

    fn config() -> std::sync::Arc<Config> {
        ConfigLoader::with_defaults().load_from_str(YAML).unwrap().config
    }

    #[test]
    fn test_empty_overrides_match_baseline() {
        let config = config();
        let overrides = Overrides::new();
        let view = EffectiveConfig::new(&config, &overrides);
        assert!(overrides.is_empty());
        assert_eq!(view.active_microscope_name(), Some("Nanoscale"));
        assert_eq!(view.axes("Mesoscale"), config.microscopes["Mesoscale"].axes());
    }

    #[test]
    fn test_active_microscope_switch() {
        let config = config();
        let mut overrides = Overrides::new();
        overrides.set_active_microscope(&config, "Mesoscale").unwrap();
        let view = EffectiveConfig::new(&config, &overrides);
        assert_eq!(view.active_microscope().map(|m| m.name.as_str()), Some("Mesoscale"));
        // Baseline default is untouched.
        assert_eq!(config.default_microscope_name(), Some("Nanoscale"));
    }

    #[test]
    fn test_unknown_microscope_rejected() {
        let config = config();
        let mut overrides = Overrides::new();
        let err = overrides.set_active_microscope(&config, "Macroscale").unwrap_err();
        assert!(matches!(err, ScopeError::NotFound(_)));
        assert!(overrides.is_empty());
    }

    #[test]
    fn test_stage_offset_override() {
        let config = config();
        let mut overrides = Overrides::new();
        overrides.set_stage_offset(&config, "Mesoscale", "z", -2.5).unwrap();

        let view = EffectiveConfig::new(&config, &overrides);
        let z = view.axis("Mesoscale", "z").unwrap();
        assert!((z.offset + 2.5).abs() < f64::EPSILON);
        let baseline_z = config.microscopes["Mesoscale"].axis("z").unwrap();
        assert!((baseline_z.offset - 10.0).abs() < f64::EPSILON);

        assert_eq!(overrides.clear_stage_offset("Mesoscale", "z"), Some(-2.5));
        assert!(overrides.is_empty());
    }

    #[test]
    fn test_stage_offset_unknown_axis() {
        let config = config();
        let mut overrides = Overrides::new();
        assert!(overrides.set_stage_offset(&config, "Mesoscale", "theta", 1.0).is_err());
        assert!(overrides.set_stage_offset(&config, "Ghost", "x", 1.0).is_err());
    }
}
