//! Configuration validation
//!
//! Schema and semantic checks over a decoded [`Config`]. Validation collects
//! ALL issues (doesn't stop at first) so one run over a hand-edited document
//! reports everything that is wrong with it.

use std::collections::{BTreeMap, HashSet};

use crate::config::devices::{DeviceKind, DeviceType};
use crate::config::inventory::{contains_device, same_type};
use crate::config::loader::ConfigLimits;
use crate::config::schema::{
    Config, DeviceHardware, FilterWheelBlock, GUI_SECTIONS, GuiLimits, InventorySource,
    LaserLine, MicroscopeConfig, NumericRange, REQUIRED_BLOCKS, StageBlock, Wavelength,
};
use crate::error::{IssueKind, Severity, ValidationIssue};

// ============================================================================
// Public API
// ============================================================================

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Validation errors.
    pub errors: Vec<ValidationIssue>,

    /// Validation warnings (informational).
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// All issues, errors first.
    #[must_use]
    pub fn into_issues(self) -> Vec<ValidationIssue> {
        let mut issues = self.errors;
        issues.extend(self.warnings);
        issues
    }
}

/// Validates a configuration with default limits and returns every issue.
#[must_use]
pub fn validate(config: &Config) -> Vec<ValidationIssue> {
    Validator::new()
        .validate(config, &ConfigLimits::default())
        .into_issues()
}

/// Configuration validator.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    /// Creates a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a configuration and returns the result.
    ///
    /// Issues recorded while the document was decoded are included first.
    pub fn validate(&mut self, config: &Config, limits: &ConfigLimits) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        for issue in &config.decode_issues {
            self.push(issue.clone());
        }

        self.validate_inventory(config);
        self.validate_microscope_set(config, limits);
        for (name, microscope) in &config.microscopes {
            self.validate_microscope(config, name, microscope);
        }
        if let Some(gui) = &config.gui {
            self.validate_gui(gui);
        }

        tracing::debug!(
            errors = self.errors.len(),
            warnings = self.warnings.len(),
            "validation finished"
        );

        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    // ========================================================================
    // Top-level
    // ========================================================================

    fn validate_inventory(&mut self, config: &Config) {
        let inventory = &config.hardware;
        if inventory.source == InventorySource::Derived {
            return;
        }
        if let Some(daq) = &inventory.daq {
            self.check_type("hardware.daq.type", &daq.device_type, None);
        }
        let cameras = document_indices(config, "hardware.camera");
        for (i, entry) in cameras.zip(&inventory.camera) {
            self.check_type(&format!("hardware.camera[{i}].type"), &entry.device_type, None);
        }
        let wheels = document_indices(config, "hardware.filter_wheel");
        for (i, entry) in wheels.zip(&inventory.filter_wheel) {
            self.check_type(
                &format!("hardware.filter_wheel[{i}].type"),
                &entry.device_type,
                None,
            );
        }
        let stages = document_indices(config, "hardware.stage");
        for (i, entry) in stages.zip(&inventory.stage) {
            self.check_type(&format!("hardware.stage[{i}].type"), &entry.device_type, None);
        }
        if let Some(zoom) = &inventory.zoom {
            self.check_type("hardware.zoom.type", &zoom.device_type, None);
        }
        if let Some(mirror) = &inventory.mirror {
            self.check_type("hardware.mirror.type", &mirror.device_type, None);
        }
    }

    fn validate_microscope_set(&mut self, config: &Config, limits: &ConfigLimits) {
        if config.microscopes.is_empty() {
            self.add_error(
                IssueKind::Schema,
                "microscopes",
                "at least one microscope must be defined",
            );
            return;
        }

        if config.microscopes.len() > limits.max_microscopes {
            self.add_error(
                IssueKind::Cardinality,
                "microscopes",
                &format!(
                    "{} microscopes defined, limit is {}",
                    config.microscopes.len(),
                    limits.max_microscopes
                ),
            );
        }

        let flagged: Vec<&str> = config
            .microscopes
            .iter()
            .filter(|(_, m)| m.default)
            .map(|(name, _)| name.as_str())
            .collect();
        if flagged.len() > 1 {
            self.add_error(
                IssueKind::Cardinality,
                "microscopes",
                &format!(
                    "only one microscope may be marked default, found {}: {}",
                    flagged.len(),
                    flagged.join(", ")
                ),
            );
        }
    }

    // ========================================================================
    // Per-microscope
    // ========================================================================

    /// Checks one microscope. Blocks copied from a parent are checked once,
    /// at the microscope that declares them.
    fn validate_microscope(&mut self, config: &Config, name: &str, m: &MicroscopeConfig) {
        let base = format!("microscopes.{name}");
        let own = |block: &str| !m.is_inherited(block);

        for block in REQUIRED_BLOCKS {
            let path = format!("{base}.{block}");
            if !m.has_block(block) && own(block) && !Self::decode_failed(config, &path) {
                self.add_error(
                    IssueKind::Schema,
                    &path,
                    &format!("microscope '{name}' is missing required block '{block}'"),
                );
            }
        }

        let declared = config.hardware.source == InventorySource::Declared;

        if let Some(daq) = m.daq.as_ref().filter(|_| own("daq")) {
            let path = format!("{base}.daq.hardware");
            if self.check_hardware(&path, &daq.hardware, name) && declared {
                let listed = config
                    .hardware
                    .daq
                    .as_ref()
                    .is_some_and(|d| same_type(&d.device_type, &daq.hardware.device_type));
                self.require_listed(listed, &path, &daq.hardware.device_type, None);
            }
        }

        if let Some(camera) = m.camera.as_ref().filter(|_| own("camera")) {
            let path = format!("{base}.camera");
            if self.check_hardware(&format!("{path}.hardware"), &camera.hardware, name) && declared
            {
                let serial = camera.hardware.serial_number.as_deref();
                let listed = contains_device(
                    &config.hardware.camera,
                    &camera.hardware.device_type,
                    serial,
                    |e| e.serial_number.clone(),
                );
                self.require_listed(
                    listed,
                    &format!("{path}.hardware"),
                    &camera.hardware.device_type,
                    serial,
                );
            }
            self.check_percent(&format!("{path}.delay"), camera.delay);
            self.check_percent(&format!("{path}.delay_percent"), camera.delay_percent);
            self.check_percent(&format!("{path}.pulse_percent"), camera.pulse_percent);
            if let Some(range) = &camera.exposure_time_range {
                self.check_numeric_range(&format!("{path}.exposure_time_range"), range);
            }
            if let Some(count) = camera.count.filter(|c| *c < 1) {
                self.add_error(
                    IssueKind::Range,
                    &format!("{path}.count"),
                    &format!("camera channel count must be at least 1, got {count}"),
                );
            }
        }

        if let Some(rf) = m
            .remote_focus_device
            .as_ref()
            .filter(|_| own("remote_focus_device"))
        {
            let path = format!("{base}.remote_focus_device");
            self.check_hardware(&format!("{path}.hardware"), &rf.hardware, name);
            self.check_percent(&format!("{path}.delay"), rf.delay);
            self.check_percent(&format!("{path}.delay_percent"), rf.delay_percent);
            self.check_percent(
                &format!("{path}.ramp_rising_percent"),
                rf.ramp_rising_percent,
            );
            self.check_percent(&format!("{path}.ramp_falling"), rf.ramp_falling);
            self.check_percent(
                &format!("{path}.ramp_falling_percent"),
                rf.ramp_falling_percent,
            );
        }

        if let Some(galvos) = m.galvo.as_ref().filter(|_| own("galvo")) {
            let path = format!("{base}.galvo");
            for (i, galvo) in document_indices(config, &path).zip(galvos) {
                self.check_hardware(&format!("{path}[{i}].hardware"), &galvo.hardware, name);
            }
        }

        if let Some(wheels) = m.filter_wheel.as_ref().filter(|_| own("filter_wheel")) {
            let path = format!("{base}.filter_wheel");
            for (i, wheel) in document_indices(config, &path).zip(wheels) {
                let wheel_path = format!("{path}[{i}]");
                self.validate_filter_wheel(config, &wheel_path, wheel, name, declared);
            }
        }

        if let Some(stage) = m.stage.as_ref().filter(|_| own("stage")) {
            self.validate_stage(config, &format!("{base}.stage"), stage, name, declared);
        }

        if let Some(zoom) = m.zoom.as_ref().filter(|_| own("zoom")) {
            let path = format!("{base}.zoom");
            if self.check_hardware(&format!("{path}.hardware"), &zoom.hardware, name) && declared
            {
                let listed = config
                    .hardware
                    .zoom
                    .as_ref()
                    .is_some_and(|z| same_type(&z.device_type, &zoom.hardware.device_type));
                self.require_listed(
                    listed,
                    &format!("{path}.hardware"),
                    &zoom.hardware.device_type,
                    None,
                );
            }
            for label in zoom.position.keys() {
                if !zoom.pixel_size.contains_key(label) {
                    self.add_error(
                        IssueKind::Cardinality,
                        &format!("{path}.pixel_size"),
                        &format!("zoom '{label}' has a position but no pixel size"),
                    );
                }
            }
            for (label, size) in &zoom.pixel_size {
                if !zoom.position.contains_key(label) {
                    self.add_error(
                        IssueKind::Cardinality,
                        &format!("{path}.position"),
                        &format!("zoom '{label}' has a pixel size but no position"),
                    );
                }
                if !size.is_finite() || *size <= 0.0 {
                    self.add_error(
                        IssueKind::Range,
                        &format!("{path}.pixel_size.{label}"),
                        &format!("pixel size must be positive, got {size}"),
                    );
                }
            }
        }

        if let Some(shutter) = m.shutter.as_ref().filter(|_| own("shutter")) {
            self.check_hardware(&format!("{base}.shutter.hardware"), &shutter.hardware, name);
        }

        if let Some(mirror) = m.mirror.as_ref().filter(|_| own("mirror")) {
            let path = format!("{base}.mirror.hardware");
            if self.check_hardware(&path, &mirror.hardware, name) && declared {
                let listed = config
                    .hardware
                    .mirror
                    .as_ref()
                    .is_some_and(|e| same_type(&e.device_type, &mirror.hardware.device_type));
                self.require_listed(listed, &path, &mirror.hardware.device_type, None);
            }
        }

        if let Some(lasers) = m.lasers.as_ref().filter(|_| own("lasers")) {
            let path = format!("{base}.lasers");
            let indices = document_indices(config, &path);
            self.validate_lasers(&path, lasers, indices, name);
        }
    }

    fn validate_filter_wheel(
        &mut self,
        config: &Config,
        path: &str,
        wheel: &FilterWheelBlock,
        microscope: &str,
        declared: bool,
    ) {
        let hw_path = format!("{path}.hardware");
        if self.check_hardware(&hw_path, &wheel.hardware, microscope) && declared {
            let wheel_number = wheel.wheel_number().map(|n| n.to_string());
            let listed = contains_device(
                &config.hardware.filter_wheel,
                &wheel.hardware.device_type,
                wheel_number.as_deref(),
                |e| e.wheel_number.map(|n| n.to_string()),
            );
            self.require_listed(
                listed,
                &hw_path,
                &wheel.hardware.device_type,
                wheel_number.as_deref(),
            );
        }

        let slot_count = wheel.slot_count();
        let mut by_slot: BTreeMap<i64, Vec<&str>> = BTreeMap::new();
        for (filter, slot) in &wheel.available_filters {
            let slot_path = format!("{path}.available_filters.{filter}");
            if *slot < 0 {
                self.add_error(
                    IssueKind::Range,
                    &slot_path,
                    &format!("filter '{filter}' has negative slot {slot}"),
                );
                continue;
            }
            if let Some(count) = slot_count {
                if u64::try_from(*slot).is_ok_and(|s| s >= count) {
                    self.add_error(
                        IssueKind::Range,
                        &slot_path,
                        &format!(
                            "filter '{filter}' uses slot {slot}, but the wheel has {count} slots (0..{})",
                            count.saturating_sub(1)
                        ),
                    );
                }
            }
            by_slot.entry(*slot).or_default().push(filter);
        }

        for (slot, names) in by_slot {
            if names.len() > 1 {
                let quoted: Vec<String> = names.iter().map(|n| format!("'{n}'")).collect();
                self.add_error(
                    IssueKind::Schema,
                    &format!("{path}.available_filters"),
                    &format!("filters {} share slot {slot}", quoted.join(" and ")),
                );
            }
        }
    }

    fn validate_stage(
        &mut self,
        config: &Config,
        path: &str,
        stage: &StageBlock,
        microscope: &str,
        declared: bool,
    ) {
        if stage.hardware.is_empty() {
            self.add_error(
                IssueKind::Schema,
                &format!("{path}.hardware"),
                "stage must list at least one controller",
            );
        }

        for (i, hw) in stage.hardware.iter().enumerate() {
            let hw_path = format!("{path}.hardware[{i}]");
            let resolved = self.check_type(
                &format!("{hw_path}.type"),
                &hw.device_type,
                Some(("stage", microscope)),
            );
            if resolved && declared && !hw.device_type.is_synthetic() {
                let serial = hw.serial_number.as_deref();
                let listed = contains_device(
                    &config.hardware.stage,
                    &hw.device_type,
                    serial,
                    |e| e.serial_number.clone(),
                );
                self.require_listed(listed, &hw_path, &hw.device_type, serial);
            }
            self.check_min_max(&hw_path, hw.min, hw.max);

            if hw.axes.is_empty() {
                self.add_error(
                    IssueKind::Schema,
                    &format!("{hw_path}.axes"),
                    "stage controller declares no axes",
                );
            }
            if !hw.axes_mapping.is_empty() && hw.axes_mapping.len() != hw.axes.len() {
                self.add_error(
                    IssueKind::Cardinality,
                    &format!("{hw_path}.axes_mapping"),
                    &format!(
                        "axes lists {} axes but axes_mapping has {} entries",
                        hw.axes.len(),
                        hw.axes_mapping.len()
                    ),
                );
            }
        }

        let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
        for (i, hw) in stage.hardware.iter().enumerate() {
            for axis in &hw.axes {
                if let Some(first) = seen.get(axis.as_str()) {
                    self.add_error(
                        IssueKind::Schema,
                        &format!("{path}.hardware[{i}].axes"),
                        &format!(
                            "axis '{axis}' is already driven by stage controller {first}"
                        ),
                    );
                } else {
                    seen.insert(axis, i);
                }
            }
        }

        for (key, value) in &stage.limits {
            let is_limit = ["_min", "_max", "_step", "_offset"]
                .iter()
                .any(|suffix| key.ends_with(suffix));
            if is_limit && !value.is_number() && !value.is_null() {
                self.add_error(
                    IssueKind::Schema,
                    &format!("{path}.{key}"),
                    &format!("'{key}' must be a number"),
                );
            }
        }

        let axes = stage.axes();
        for axis in &axes {
            let axis_path = format!("{path}.{}", axis.name);
            self.check_bounds(
                (&format!("{axis_path}_min"), axis.min),
                (&format!("{axis_path}_max"), axis.max),
            );
            if let Some(step) = axis.step {
                self.check_step(&format!("{axis_path}_step"), step);
            }
        }

        let known: HashSet<&str> = axes.iter().map(|a| a.name.as_str()).collect();
        for (leader, follower) in &stage.coupled_axes {
            for axis in [leader, follower] {
                if !known.contains(axis.as_str()) {
                    self.add_error(
                        IssueKind::Reference,
                        &format!("{path}.coupled_axes.{leader}"),
                        &format!("coupled axis '{axis}' is not an axis of this stage"),
                    );
                }
            }
        }
        for axis in &stage.joystick_axes {
            if !known.contains(axis.as_str()) {
                self.add_error(
                    IssueKind::Reference,
                    &format!("{path}.joystick_axes"),
                    &format!("joystick axis '{axis}' is not an axis of this stage"),
                );
            }
        }
    }

    fn validate_lasers(
        &mut self,
        path: &str,
        lasers: &[LaserLine],
        indices: impl Iterator<Item = usize>,
        microscope: &str,
    ) {
        if lasers.is_empty() {
            self.add_error(IssueKind::Schema, path, "at least one laser must be listed");
        }

        let mut wavelengths: Vec<String> = Vec::new();
        for (i, laser) in indices.zip(lasers) {
            let laser_path = format!("{path}[{i}]");

            if let Wavelength::Nanometers(nm) = laser.wavelength {
                if !nm.is_finite() || nm <= 0.0 {
                    self.add_error(
                        IssueKind::Range,
                        &format!("{laser_path}.wavelength"),
                        &format!("wavelength must be a positive number, got {nm}"),
                    );
                }
            }
            let label = laser.wavelength.to_string();
            if wavelengths.contains(&label) {
                self.add_warning(
                    IssueKind::Schema,
                    &format!("{laser_path}.wavelength"),
                    &format!("wavelength {label} is listed more than once"),
                );
            }
            wavelengths.push(label);

            if let Some(onoff) = &laser.onoff {
                let hw_path = format!("{laser_path}.onoff.hardware");
                self.check_hardware(&hw_path, &onoff.hardware, microscope);
            }
            if let Some(power) = &laser.power {
                let hw_path = format!("{laser_path}.power.hardware");
                self.check_hardware(&hw_path, &power.hardware, microscope);
            }

            self.check_percent(&format!("{laser_path}.delay_percent"), laser.delay_percent);
            self.check_percent(&format!("{laser_path}.pulse_percent"), laser.pulse_percent);
            if let (Some(delay), Some(pulse)) = (laser.delay_percent, laser.pulse_percent) {
                if delay + pulse > 100.0 {
                    self.add_error(
                        IssueKind::Range,
                        &laser_path,
                        &format!(
                            "delay_percent ({delay}) + pulse_percent ({pulse}) exceeds 100"
                        ),
                    );
                }
            }
        }
    }

    // ========================================================================
    // GUI
    // ========================================================================

    fn validate_gui(&mut self, gui: &GuiLimits) {
        if let Some(channels) = &gui.channels {
            if channels.count() < 1 {
                self.add_error(
                    IssueKind::Range,
                    "gui.channels.count",
                    &format!("channel count must be at least 1, got {}", channels.count()),
                );
            }
            for (name, range) in &channels.ranges {
                self.check_numeric_range(&format!("gui.channels.{name}"), range);
            }
        }
        for (name, range) in &gui.stack_acquisition {
            self.check_numeric_range(&format!("gui.stack_acquisition.{name}"), range);
        }
        for (name, range) in &gui.timepoint {
            self.check_numeric_range(&format!("gui.timepoint.{name}"), range);
        }
        for section in gui.extra.keys() {
            let suggestion = suggest(section, &GUI_SECTIONS)
                .map(|s| format!("; did you mean '{s}'?"))
                .unwrap_or_default();
            self.add_warning(
                IssueKind::Schema,
                &format!("gui.{section}"),
                &format!("unknown gui section '{section}'{suggestion}"),
            );
        }
    }

    // ========================================================================
    // Checks
    // ========================================================================

    /// Checks a device block's hardware mapping. Returns `true` if the type
    /// resolved and is not synthetic, i.e. worth cross-referencing.
    fn check_hardware<K: DeviceKind>(
        &mut self,
        path: &str,
        hardware: &DeviceHardware<K>,
        microscope: &str,
    ) -> bool {
        let resolved = self.check_type(
            &format!("{path}.type"),
            &hardware.device_type,
            Some((K::CATEGORY.as_str(), microscope)),
        );
        self.check_min_max(path, hardware.min, hardware.max);
        resolved && !hardware.device_type.is_synthetic()
    }

    /// Reports an unsupported device type. Returns `true` if it resolved.
    fn check_type<K: DeviceKind>(
        &mut self,
        path: &str,
        device_type: &DeviceType<K>,
        context: Option<(&str, &str)>,
    ) -> bool {
        if device_type.kind().is_some() {
            return true;
        }
        let raw = device_type.raw();
        let location = context
            .map(|(section, microscope)| format!(" in microscope '{microscope}' ({section})"))
            .unwrap_or_default();
        let hint = K::suggest(raw).map_or_else(
            || format!("; supported: {}", K::supported_list()),
            |s| format!("; did you mean '{s}'?"),
        );
        self.add_error(
            IssueKind::Reference,
            path,
            &format!(
                "unsupported {} type '{raw}'{location}{hint}",
                K::CATEGORY
            ),
        );
        false
    }

    fn require_listed<K: DeviceKind>(
        &mut self,
        listed: bool,
        path: &str,
        device_type: &DeviceType<K>,
        identifier: Option<&str>,
    ) {
        if listed {
            return;
        }
        let id = identifier.map(|i| format!(" ({i})")).unwrap_or_default();
        self.add_error(
            IssueKind::Reference,
            path,
            &format!(
                "{} '{device_type}'{id} is not listed in the hardware inventory",
                K::CATEGORY
            ),
        );
    }

    fn check_min_max(&mut self, path: &str, min: Option<f64>, max: Option<f64>) {
        self.check_bounds(
            (&format!("{path}.min"), min),
            (&format!("{path}.max"), max),
        );
    }

    /// Bounds must be finite, and `min <= max` when both are given.
    fn check_bounds(&mut self, min: (&str, Option<f64>), max: (&str, Option<f64>)) {
        let mut finite = true;
        for (path, value) in [min, max] {
            if let Some(v) = value.filter(|v| !v.is_finite()) {
                finite = false;
                self.add_error(
                    IssueKind::Range,
                    path,
                    &format!("{} must be a finite number, got {v}", leaf(path)),
                );
            }
        }
        if let ((min_path, Some(lo)), (max_path, Some(hi))) = (min, max) {
            if finite && lo > hi {
                self.add_error(
                    IssueKind::Range,
                    min_path,
                    &format!(
                        "{} ({lo}) is greater than {} ({hi})",
                        leaf(min_path),
                        leaf(max_path)
                    ),
                );
            }
        }
    }

    fn check_step(&mut self, path: &str, step: f64) {
        if !step.is_finite() || step <= 0.0 {
            self.add_error(
                IssueKind::Range,
                path,
                &format!("step must be a positive number, got {step}"),
            );
        }
    }

    fn check_numeric_range(&mut self, path: &str, range: &NumericRange) {
        self.check_min_max(path, range.min, range.max);
        if let Some(step) = range.step {
            self.check_step(&format!("{path}.step"), step);
        }
    }

    fn check_percent(&mut self, path: &str, value: Option<f64>) {
        if let Some(v) = value {
            if !(0.0..=100.0).contains(&v) {
                self.add_error(
                    IssueKind::Range,
                    path,
                    &format!("percentage must be between 0 and 100, got {v}"),
                );
            }
        }
    }

    fn decode_failed(config: &Config, path: &str) -> bool {
        config
            .decode_issues
            .iter()
            .any(|i| i.is_error() && (i.path == path || i.path.starts_with(&format!("{path}["))))
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn push(&mut self, issue: ValidationIssue) {
        match issue.severity {
            Severity::Error => self.errors.push(issue),
            Severity::Warning => self.warnings.push(issue),
        }
    }

    /// Adds an error to the collection.
    fn add_error(&mut self, kind: IssueKind, path: &str, message: &str) {
        self.errors.push(ValidationIssue::error(kind, path, message));
    }

    /// Adds a warning to the collection.
    fn add_warning(&mut self, kind: IssueKind, path: &str, message: &str) {
        self.warnings.push(ValidationIssue::warning(kind, path, message));
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Document indices of the items of a decoded list at `path`.
///
/// Items that failed to decode are absent from the typed list, so their
/// indices are skipped to keep later items at their position in the document.
fn document_indices<'a>(config: &'a Config, path: &'a str) -> impl Iterator<Item = usize> + 'a {
    (0..).filter(move |i| {
        let item = format!("{path}[{i}]");
        !config
            .decode_issues
            .iter()
            .any(|issue| issue.is_error() && issue.path == item)
    })
}

/// Last segment of a dotted path.
fn leaf(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

/// Suggests the closest known name for `input`.
///
/// Returns the closest match if its Damerau-Levenshtein distance is ≤ 3.
#[must_use]
pub fn suggest<'a>(input: &str, known: &[&'a str]) -> Option<&'a str> {
    known
        .iter()
        .map(|name| (*name, strsim::damerau_levenshtein(input, name)))
        .filter(|(_, dist)| *dist <= 3)
        .min_by_key(|(_, dist)| *dist)
        .map(|(name, _)| name)
}

// ============================================================================
// Tests
// ============================================================================
