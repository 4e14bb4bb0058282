//! Configuration loader
//!
//! This module implements the configuration loading pipeline:
//! 1. Size check and BOM stripping
//! 2. Environment variable expansion (pre-parse, on raw text)
//! 3. YAML parsing, one document per input
//! 4. Layered merge, later documents overriding earlier ones
//! 5. Normalization (inheritance, legacy list forms)
//! 6. Block-by-block decoding into the typed [`Config`]
//! 7. Inventory derivation when no `hardware` section is given
//! 8. Validation
//! 9. Freeze with `Arc`
//!
//! Steps 1 to 3 fail fast with a [`ConfigError`]. From step 5 on, problems
//! are collected as [`ValidationIssue`]s and returned with the configuration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_yaml::Value;

use crate::config::normalize::{Normalized, describe, normalize};
use crate::config::schema::{
    Config, GuiLimits, HardwareInventory, InventorySource, MicroscopeConfig, OPTIONAL_BLOCKS,
    REQUIRED_BLOCKS,
};
use crate::config::validation::{Validator, suggest};
use crate::error::{ConfigError, IssueKind, ValidationIssue};
use crate::observability::metrics;

/// Known top-level sections.
const TOP_LEVEL_SECTIONS: [&str; 3] = ["hardware", "microscopes", "gui"];

/// Known `hardware` entries.
const INVENTORY_SECTIONS: [&str; 6] = ["daq", "camera", "filter_wheel", "stage", "zoom", "mirror"];

// ============================================================================
// Public API
// ============================================================================

/// Options for the configuration loader.
#[derive(Debug, Clone, Default)]
pub struct LoaderOptions {
    /// Limits for configuration size.
    pub config_limits: ConfigLimits,
}

/// Limits for configuration size to prevent resource exhaustion.
#[derive(Debug, Clone)]
pub struct ConfigLimits {
    /// Maximum size of one configuration document in bytes.
    pub max_config_size: usize,

    /// Maximum number of documents merged in one load.
    pub max_documents: usize,

    /// Maximum number of microscopes.
    pub max_microscopes: usize,
}

impl Default for ConfigLimits {
    fn default() -> Self {
        Self {
            max_config_size: env_or("SCOPECFG_MAX_CONFIG_SIZE", 10 * 1024 * 1024),
            max_documents: env_or("SCOPECFG_MAX_DOCUMENTS", 64),
            max_microscopes: env_or("SCOPECFG_MAX_MICROSCOPES", 32),
        }
    }
}

/// Result of loading a configuration.
#[derive(Debug)]
pub struct LoadResult {
    /// The merged configuration.
    pub config: Arc<Config>,

    /// Warnings encountered while reading the documents.
    pub warnings: Vec<LoadWarning>,

    /// Every issue found while decoding and validating, errors first.
    pub issues: Vec<ValidationIssue>,
}

impl LoadResult {
    /// Returns `true` if any issue is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(ValidationIssue::is_error)
    }

    /// Number of error-severity issues.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.issues.iter().filter(|i| i.is_error()).count()
    }

    /// Number of warning-severity issues.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.issues.len() - self.error_count()
    }
}

/// Warning during configuration loading.
#[derive(Debug, Clone)]
pub struct LoadWarning {
    /// Warning message.
    pub message: String,

    /// Location where the warning occurred.
    pub location: Option<String>,
}

/// Configuration loader.
///
/// Handles the full loading pipeline from YAML documents to a frozen
/// [`Config`].
#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: LoaderOptions,
}

impl ConfigLoader {
    /// Creates a new configuration loader with the given options.
    #[must_use]
    pub const fn new(options: LoaderOptions) -> Self {
        Self { options }
    }

    /// Creates a new configuration loader with default options.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(LoaderOptions::default())
    }

    /// Returns the loader's limits.
    #[must_use]
    pub const fn limits(&self) -> &ConfigLimits {
        &self.options.config_limits
    }

    /// Loads and merges configuration files, later files overriding earlier
    /// ones.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No paths are given, or more than the document limit
    /// - A file cannot be read or exceeds the size limit
    /// - YAML parsing fails, or a document is empty or not a mapping
    /// - A required environment variable is unset
    pub fn load(&self, paths: &[PathBuf]) -> Result<LoadResult, ConfigError> {
        self.check_document_count(paths.len())?;

        let mut warnings = Vec::new();
        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            let raw = read_file(path, self.options.config_limits.max_config_size)?;
            documents.push(self.parse_document(&raw, path, &mut warnings)?);
        }

        Ok(self.build(documents, warnings))
    }

    /// Loads a configuration from one YAML string.
    ///
    /// # Errors
    ///
    /// Same as [`ConfigLoader::load`], minus file access.
    pub fn load_from_str(&self, yaml: &str) -> Result<LoadResult, ConfigError> {
        self.load_from_strs(&[yaml])
    }

    /// Loads and merges YAML strings in order.
    ///
    /// # Errors
    ///
    /// Same as [`ConfigLoader::load`], minus file access.
    pub fn load_from_strs(&self, yamls: &[&str]) -> Result<LoadResult, ConfigError> {
        self.check_document_count(yamls.len())?;

        let mut warnings = Vec::new();
        let mut documents = Vec::with_capacity(yamls.len());
        for (i, yaml) in yamls.iter().enumerate() {
            let label = PathBuf::from(format!("<document {}>", i + 1));
            self.check_size(yaml.len(), &label)?;
            documents.push(self.parse_document(yaml, &label, &mut warnings)?);
        }

        Ok(self.build(documents, warnings))
    }

    fn check_document_count(&self, count: usize) -> Result<(), ConfigError> {
        if count == 0 {
            return Err(ConfigError::NoDocuments);
        }
        let max = self.options.config_limits.max_documents;
        if count > max {
            return Err(ConfigError::InvalidValue {
                field: "documents".to_string(),
                value: count.to_string(),
                expected: format!("at most {max} documents"),
            });
        }
        Ok(())
    }

    fn check_size(&self, size: usize, path: &Path) -> Result<(), ConfigError> {
        let max = self.options.config_limits.max_config_size;
        if size > max {
            return Err(ConfigError::InvalidValue {
                field: format!("size of {}", path.display()),
                value: format!("{size} bytes"),
                expected: format!("at most {max} bytes"),
            });
        }
        Ok(())
    }

    /// Runs stages 1 to 3 on one document.
    #[allow(clippy::unused_self)]
    fn parse_document(
        &self,
        raw: &str,
        path: &Path,
        warnings: &mut Vec<LoadWarning>,
    ) -> Result<Value, ConfigError> {
        // Handle UTF-8 BOM
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);

        let mut env_sub = EnvSubstitution::new();
        let substituted = env_sub.substitute(raw, path)?;
        warnings.extend(env_sub.warnings);

        let root: Value =
            serde_yaml::from_str(&substituted).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?;

        match root {
            Value::Null => Err(ConfigError::ParseError {
                path: path.to_path_buf(),
                line: None,
                message: "Configuration file is empty".to_string(),
            }),
            Value::Mapping(_) => {
                tracing::debug!(path = %path.display(), "parsed configuration document");
                Ok(root)
            }
            other => Err(ConfigError::ParseError {
                path: path.to_path_buf(),
                line: None,
                message: format!(
                    "top level of a configuration must be a mapping, got {}",
                    describe(&other)
                ),
            }),
        }
    }

    /// Runs stages 4 to 9 on the parsed documents.
    fn build(&self, documents: Vec<Value>, warnings: Vec<LoadWarning>) -> LoadResult {
        let document_count = documents.len();
        let config = decode(normalize(documents));

        let mut validator = Validator::new();
        let result = validator.validate(&config, &self.options.config_limits);

        metrics::record_documents_loaded(document_count);
        for issue in result.errors.iter().chain(&result.warnings) {
            metrics::record_validation_issue(issue);
        }

        tracing::info!(
            documents = document_count,
            microscopes = config.microscopes.len(),
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "configuration loaded"
        );

        LoadResult {
            config: Arc::new(config),
            warnings,
            issues: result.into_issues(),
        }
    }
}

/// Reads a configuration file, enforcing the size limit before reading.
fn read_file(path: &Path, max_size: usize) -> Result<String, ConfigError> {
    let metadata = std::fs::metadata(path).map_err(|_| ConfigError::MissingFile {
        path: path.to_path_buf(),
    })?;

    let file_size = usize::try_from(metadata.len()).unwrap_or(max_size.saturating_add(1));
    if file_size > max_size {
        return Err(ConfigError::InvalidValue {
            field: format!("size of {}", path.display()),
            value: format!("{file_size} bytes"),
            expected: format!("at most {max_size} bytes"),
        });
    }

    std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::InvalidData {
            ConfigError::ParseError {
                path: path.to_path_buf(),
                line: None,
                message: "file is not valid UTF-8".to_string(),
            }
        } else {
            ConfigError::MissingFile {
                path: path.to_path_buf(),
            }
        }
    })
}

// ============================================================================
// Decoding
// ============================================================================

/// Decodes a normalized document into a [`Config`].
///
/// Each block decodes on its own, so one malformed block produces one issue
/// and leaves the rest of the document usable.
fn decode(normalized: Normalized) -> Config {
    let Normalized {
        root,
        inherits,
        inherited_blocks,
        mut issues,
    } = normalized;

    let mut config = Config::default();
    let Value::Mapping(root) = root else {
        config.decode_issues = issues;
        return config;
    };

    let mut hardware_declared = false;
    for (key, value) in root {
        let Some(section) = key.as_str() else {
            issues.push(ValidationIssue::error(
                IssueKind::Schema,
                "",
                format!("top-level keys must be strings, got {}", describe(&key)),
            ));
            continue;
        };
        match section {
            "hardware" => {
                if !value.is_null() {
                    hardware_declared = true;
                    config.hardware = decode_inventory(value, &mut issues);
                }
            }
            "microscopes" => match value {
                Value::Mapping(map) => {
                    for (name, block) in map {
                        let name = name.as_str().unwrap_or_default().to_string();
                        let inherited = inherited_blocks.get(&name).cloned().unwrap_or_default();
                        let mut microscope =
                            decode_microscope(&name, block, inherited, &mut issues);
                        microscope.inherits = inherits.get(&name).cloned();
                        config.microscopes.insert(name, microscope);
                    }
                }
                Value::Null => {}
                other => issues.push(ValidationIssue::error(
                    IssueKind::Schema,
                    "microscopes",
                    format!("'microscopes' must be a mapping, got {}", describe(&other)),
                )),
            },
            "gui" => config.gui = decode_block::<GuiLimits>("gui", value, &mut issues),
            other => issues.push(unknown_key_warning(other, other, "section", &TOP_LEVEL_SECTIONS)),
        }
    }

    if !hardware_declared {
        config.hardware = HardwareInventory::derive_from(config.microscopes.values());
    }

    config.decode_issues = issues;
    config
}

fn decode_inventory(value: Value, issues: &mut Vec<ValidationIssue>) -> HardwareInventory {
    let mut inventory = HardwareInventory {
        source: InventorySource::Declared,
        ..HardwareInventory::default()
    };
    let Value::Mapping(map) = value else {
        issues.push(ValidationIssue::error(
            IssueKind::Schema,
            "hardware",
            format!("'hardware' must be a mapping, got {}", describe(&value)),
        ));
        return inventory;
    };

    for (key, value) in map {
        let key = key.as_str().unwrap_or_default().to_string();
        let path = format!("hardware.{key}");
        match key.as_str() {
            "daq" => inventory.daq = decode_block(&path, value, issues),
            "camera" => inventory.camera = decode_list(&path, value, issues).unwrap_or_default(),
            "filter_wheel" => {
                inventory.filter_wheel = decode_list(&path, value, issues).unwrap_or_default();
            }
            "stage" => inventory.stage = decode_list(&path, value, issues).unwrap_or_default(),
            "zoom" => inventory.zoom = decode_block(&path, value, issues),
            "mirror" => inventory.mirror = decode_block(&path, value, issues),
            other => issues.push(unknown_key_warning(
                &path,
                other,
                "hardware entry",
                &INVENTORY_SECTIONS,
            )),
        }
    }
    inventory
}

/// Decodes one microscope.
///
/// Blocks listed in `inherited` were copied from the parent, which reports
/// their problems itself, so their decode issues are dropped here.
fn decode_microscope(
    name: &str,
    value: Value,
    inherited: Vec<String>,
    issues: &mut Vec<ValidationIssue>,
) -> MicroscopeConfig {
    let base = format!("microscopes.{name}");
    let mut microscope = MicroscopeConfig {
        name: name.to_string(),
        inherited_blocks: inherited,
        ..MicroscopeConfig::default()
    };
    let mut dropped = Vec::new();

    let map = match value {
        Value::Mapping(map) => map,
        Value::Null => return microscope,
        other => {
            issues.push(ValidationIssue::error(
                IssueKind::Schema,
                &base,
                format!("microscope '{name}' must be a mapping, got {}", describe(&other)),
            ));
            return microscope;
        }
    };

    for (key, value) in map {
        let Some(block) = key.as_str() else {
            issues.push(ValidationIssue::error(
                IssueKind::Schema,
                &base,
                format!("block names must be strings, got {}", describe(&key)),
            ));
            continue;
        };
        let path = format!("{base}.{block}");
        let issues = if microscope.is_inherited(block) {
            &mut dropped
        } else {
            &mut *issues
        };
        match block {
            "default" => match value {
                Value::Bool(flag) => microscope.default = flag,
                other => issues.push(ValidationIssue::error(
                    IssueKind::Schema,
                    &path,
                    format!("'default' must be true or false, got {}", describe(&other)),
                )),
            },
            "daq" => microscope.daq = decode_block(&path, value, issues),
            "camera" => microscope.camera = decode_block(&path, value, issues),
            "remote_focus_device" => {
                microscope.remote_focus_device = decode_block(&path, value, issues);
            }
            "galvo" => microscope.galvo = decode_list(&path, value, issues),
            "filter_wheel" => microscope.filter_wheel = decode_list(&path, value, issues),
            "stage" => microscope.stage = decode_block(&path, value, issues),
            "zoom" => microscope.zoom = decode_block(&path, value, issues),
            "shutter" => microscope.shutter = decode_block(&path, value, issues),
            "lasers" => microscope.lasers = decode_list(&path, value, issues),
            "mirror" => microscope.mirror = decode_block(&path, value, issues),
            other => {
                let known: Vec<&str> = REQUIRED_BLOCKS
                    .iter()
                    .chain(OPTIONAL_BLOCKS.iter())
                    .copied()
                    .collect();
                issues.push(unknown_key_warning(&path, other, "block", &known));
            }
        }
    }
    if !dropped.is_empty() {
        tracing::debug!(
            microscope = name,
            issues = dropped.len(),
            "inherited block issues left to the parent"
        );
    }
    microscope
}

/// Decodes one block. A `null` block counts as absent.
fn decode_block<T: DeserializeOwned>(
    path: &str,
    value: Value,
    issues: &mut Vec<ValidationIssue>,
) -> Option<T> {
    if value.is_null() {
        return None;
    }
    match serde_yaml::from_value(value) {
        Ok(block) => Some(block),
        Err(e) => {
            tracing::debug!(path, error = %e, "block failed to decode");
            issues.push(ValidationIssue::error(IssueKind::Schema, path, e.to_string()));
            None
        }
    }
}

/// Decodes a list block item by item, keeping the items that decode.
fn decode_list<T: DeserializeOwned>(
    path: &str,
    value: Value,
    issues: &mut Vec<ValidationIssue>,
) -> Option<Vec<T>> {
    match value {
        Value::Null => None,
        Value::Sequence(items) => Some(
            items
                .into_iter()
                .enumerate()
                .filter_map(|(i, item)| decode_block(&format!("{path}[{i}]"), item, issues))
                .collect(),
        ),
        other => {
            issues.push(ValidationIssue::error(
                IssueKind::Schema,
                path,
                format!("expected a list, got {}", describe(&other)),
            ));
            None
        }
    }
}

fn unknown_key_warning(path: &str, key: &str, what: &str, known: &[&str]) -> ValidationIssue {
    let hint = suggest(key, known)
        .map(|s| format!("; did you mean '{s}'?"))
        .unwrap_or_default();
    ValidationIssue::warning(IssueKind::Schema, path, format!("unknown {what} '{key}'{hint}"))
}

// ============================================================================
// Environment Variable Substitution
// ============================================================================

/// Pre-parse environment variable substitution.
///
/// Runs on raw YAML text BEFORE parsing so substituted numbers keep their
/// YAML type.
struct EnvSubstitution {
    warnings: Vec<LoadWarning>,
}

impl EnvSubstitution {
    const fn new() -> Self {
        Self {
            warnings: Vec::new(),
        }
    }

    /// Substitutes environment variables in raw YAML text.
    ///
    /// Supports:
    /// - `${VAR}` - expand to value (empty string if unset with warning)
    /// - `${VAR:-default}` - expand to default if unset
    /// - `${VAR:?message}` - fail if unset
    /// - `$$` - literal `$`
    fn substitute(&mut self, raw_yaml: &str, source_path: &Path) -> Result<String, ConfigError> {
        let mut result = String::with_capacity(raw_yaml.len());
        let mut chars = raw_yaml.chars().peekable();
        let mut line = 1usize;

        while let Some(c) = chars.next() {
            if c == '\n' {
                line += 1;
            }
            if c != '$' {
                result.push(c);
                continue;
            }
            match chars.peek() {
                Some('$') => {
                    chars.next();
                    result.push('$');
                }
                Some('{') => {
                    chars.next();
                    let reference = Self::parse_reference(&mut chars).ok_or_else(|| {
                        ConfigError::ParseError {
                            path: source_path.to_path_buf(),
                            line: Some(line),
                            message: "unclosed environment variable reference".to_string(),
                        }
                    })?;
                    self.expand(reference, source_path, line, &mut result)?;
                }
                _ => result.push(c),
            }
        }

        Ok(result)
    }

    fn expand(
        &mut self,
        reference: VarRef,
        source_path: &Path,
        line: usize,
        out: &mut String,
    ) -> Result<(), ConfigError> {
        if let Ok(value) = std::env::var(&reference.name) {
            out.push_str(&value);
            return Ok(());
        }
        match reference.fallback {
            Fallback::Default(default) => out.push_str(&default),
            Fallback::Required(message) => {
                return Err(ConfigError::EnvVarNotSet {
                    var: reference.name,
                    location: format!("{}:{line}: {message}", source_path.display()),
                });
            }
            Fallback::Empty => {
                tracing::warn!(var = %reference.name, "environment variable not set");
                self.warnings.push(LoadWarning {
                    message: format!(
                        "Environment variable '{}' is not set, using empty string",
                        reference.name
                    ),
                    location: Some(format!("{}:{line}", source_path.display())),
                });
            }
        }
        Ok(())
    }

    /// Parses the body of `${...}` after the opening brace.
    ///
    /// Returns `None` when the closing brace is missing.
    fn parse_reference(chars: &mut std::iter::Peekable<std::str::Chars>) -> Option<VarRef> {
        let mut name = String::new();
        while let Some(c) = chars.next() {
            match c {
                '}' => {
                    return Some(VarRef {
                        name,
                        fallback: Fallback::Empty,
                    });
                }
                ':' if matches!(chars.peek(), Some('-' | '?')) => {
                    let required = chars.next() == Some('?');
                    let text = Self::read_until_close(chars)?;
                    let fallback = if required {
                        Fallback::Required(text)
                    } else {
                        Fallback::Default(text)
                    };
                    return Some(VarRef { name, fallback });
                }
                _ => name.push(c),
            }
        }
        None
    }

    /// Reads content until the matching `}`, allowing nested braces.
    fn read_until_close(chars: &mut std::iter::Peekable<std::str::Chars>) -> Option<String> {
        let mut value = String::new();
        let mut depth = 1;
        for c in chars.by_ref() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(value);
                    }
                }
                _ => {}
            }
            value.push(c);
        }
        None
    }
}

/// A parsed `${...}` reference.
struct VarRef {
    name: String,
    fallback: Fallback,
}

enum Fallback {
    Empty,
    Default(String),
    Required(String),
}

/// Parses an environment variable with a default value.
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SMALL: &str = r"
microscopes:
  Mesoscale:
    camera:
      hardware: {type: HamamatsuOrca, serial_number: 302158}
      delay: 5
    shutter:
      hardware: {type: NI, channel: line0}
";

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_env_substitution_default() {
        let mut sub = EnvSubstitution::new();
        let result = sub
            .substitute(
                "port: ${SCOPECFG_TEST_NONEXISTENT_PORT_XYZ123:-COM10}",
                Path::new("test.yaml"),
            )
            .unwrap();
        assert_eq!(result, "port: COM10");
    }

    #[test]
    fn test_env_substitution_set_var() {
        let mut sub = EnvSubstitution::new();
        let result = sub.substitute("path: ${PATH}", Path::new("test.yaml")).unwrap();
        assert!(!result.contains("${PATH}"));
        assert!(result.len() > "path: ".len());
    }

    #[test]
    fn test_env_substitution_required_missing() {
        let mut sub = EnvSubstitution::new();
        let result = sub.substitute(
            "a: 1\nport: ${SCOPECFG_TEST_REQUIRED_XYZ123:?serial port must be set}",
            Path::new("test.yaml"),
        );
        match result {
            Err(ConfigError::EnvVarNotSet { var, location }) => {
                assert_eq!(var, "SCOPECFG_TEST_REQUIRED_XYZ123");
                assert!(location.contains("test.yaml:2"));
                assert!(location.contains("serial port must be set"));
            }
            other => panic!("Expected EnvVarNotSet error, got {other:?}"),
        }
    }

    #[test]
    fn test_env_substitution_escaped_dollar() {
        let mut sub = EnvSubstitution::new();
        let result = sub.substitute("note: $$5 and $x", Path::new("t.yaml")).unwrap();
        assert_eq!(result, "note: $5 and $x");
    }

    #[test]
    fn test_env_substitution_missing_warning() {
        let mut sub = EnvSubstitution::new();
        let result = sub
            .substitute("value: ${SCOPECFG_TEST_WARN_XYZ123}", Path::new("t.yaml"))
            .unwrap();
        assert_eq!(result, "value: ");
        assert_eq!(sub.warnings.len(), 1);
        assert!(sub.warnings[0].message.contains("SCOPECFG_TEST_WARN_XYZ123"));
    }

    #[test]
    fn test_env_substitution_unclosed() {
        let mut sub = EnvSubstitution::new();
        let result = sub.substitute("value: ${OPEN", Path::new("t.yaml"));
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_env_substitution_nested_default_braces() {
        let mut sub = EnvSubstitution::new();
        let result = sub
            .substitute(
                "v: ${SCOPECFG_TEST_NESTED_XYZ123:-{a: 1}}",
                Path::new("t.yaml"),
            )
            .unwrap();
        assert_eq!(result, "v: {a: 1}");
    }

    #[test]
    fn test_empty_document_is_parse_error() {
        let err = ConfigLoader::with_defaults().load_from_str("   \n# nothing\n").unwrap_err();
        match err {
            ConfigError::ParseError { message, .. } => {
                assert_eq!(message, "Configuration file is empty");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_non_mapping_root_is_parse_error() {
        let err = ConfigLoader::with_defaults().load_from_str("- a\n- b").unwrap_err();
        assert!(err.to_string().contains("must be a mapping"), "{err}");
    }

    #[test]
    fn test_bad_yaml_reports_line() {
        let err = ConfigLoader::with_defaults()
            .load_from_str("microscopes:\n  a: [1, 2\n  b: 3\n")
            .unwrap_err();
        match err {
            ConfigError::ParseError { line, .. } => assert!(line.is_some()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_bom_is_stripped() {
        let yaml = format!("\u{feff}{SMALL}");
        let result = ConfigLoader::with_defaults().load_from_str(&yaml).unwrap();
        assert!(result.config.microscope("Mesoscale").is_some());
    }

    #[test]
    fn test_no_documents() {
        let loader = ConfigLoader::with_defaults();
        assert!(matches!(loader.load(&[]), Err(ConfigError::NoDocuments)));
        assert!(matches!(loader.load_from_strs(&[]), Err(ConfigError::NoDocuments)));
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigLoader::with_defaults()
            .load(&[PathBuf::from("/definitely/not/here.yaml")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile { .. }));
    }

    #[test]
    fn test_size_limit() {
        let loader = ConfigLoader::new(LoaderOptions {
            config_limits: ConfigLimits {
                max_config_size: 16,
                ..ConfigLimits::default()
            },
        });
        let file = write_temp(SMALL);
        let err = loader.load(&[file.path().to_path_buf()]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        assert!(loader.load_from_str(SMALL).is_err());
    }

    #[test]
    fn test_document_limit() {
        let loader = ConfigLoader::new(LoaderOptions {
            config_limits: ConfigLimits {
                max_documents: 1,
                ..ConfigLimits::default()
            },
        });
        assert!(loader.load_from_strs(&[SMALL, SMALL]).is_err());
    }

    #[test]
    fn test_load_files_in_order() {
        let base = write_temp(SMALL);
        let overlay = write_temp("microscopes: {Mesoscale: {camera: {delay: 9}}}");
        let result = ConfigLoader::with_defaults()
            .load(&[base.path().to_path_buf(), overlay.path().to_path_buf()])
            .unwrap();
        let camera = result.config.microscope("Mesoscale").unwrap().camera.as_ref().unwrap();
        assert_eq!(camera.delay, Some(9.0));
        assert_eq!(camera.hardware.serial_number.as_deref(), Some("302158"));
    }

    #[test]
    fn test_inventory_derived_when_absent() {
        let result = ConfigLoader::with_defaults().load_from_str(SMALL).unwrap();
        let inventory = result.config.hardware_inventory();
        assert_eq!(inventory.source, InventorySource::Derived);
        assert_eq!(inventory.camera.len(), 1);
        assert!(
            !result
                .issues
                .iter()
                .any(|i| i.message.contains("not listed in the hardware inventory"))
        );
    }

    #[test]
    fn test_inherits_recorded_on_microscope() {
        let yaml = format!("{SMALL}  Nanoscale (Mesoscale):\n    default: true\n");
        let result = ConfigLoader::with_defaults().load_from_str(&yaml).unwrap();
        let nano = result.config.microscope("Nanoscale").unwrap();
        assert_eq!(nano.inherits.as_deref(), Some("Mesoscale"));
        assert!(nano.camera.is_some());
        assert_eq!(result.config.default_microscope_name(), Some("Nanoscale"));
    }

    #[test]
    fn test_site_document_overrides_inheriting_microscope() {
        let base = format!(
            "{SMALL}  Nanoscale (Mesoscale):\n    camera: {{hardware: {{type: HamamatsuOrca, serial_number: 2}}}}\n"
        );
        let site = "microscopes: {Nanoscale: {camera: {hardware: {serial_number: 99}}}}";
        let result = ConfigLoader::with_defaults()
            .load_from_strs(&[&base, site])
            .unwrap();
        assert!(
            !result.issues.iter().any(|i| i.message.contains("more than once")),
            "{:#?}",
            result.issues
        );

        let nano = result.config.microscope("Nanoscale").unwrap();
        assert_eq!(nano.inherits.as_deref(), Some("Mesoscale"));
        let camera = nano.camera.as_ref().unwrap();
        assert_eq!(camera.hardware.serial_number.as_deref(), Some("99"));
        assert!(nano.shutter.is_some());
    }

    #[test]
    fn test_inherited_bad_block_reported_at_parent_only() {
        let yaml = r"
microscopes:
  Mesoscale:
    camera: {delay: 5}
  Nanoscale (Mesoscale): {}
";
        let result = ConfigLoader::with_defaults().load_from_str(yaml).unwrap();
        let camera: Vec<&ValidationIssue> = result
            .issues
            .iter()
            .filter(|i| i.path.ends_with(".camera"))
            .collect();
        assert_eq!(camera.len(), 1, "{camera:#?}");
        assert_eq!(camera[0].path, "microscopes.Mesoscale.camera");
        assert!(
            result
                .config
                .microscope("Nanoscale")
                .unwrap()
                .is_inherited("camera")
        );
    }

    #[test]
    fn test_bad_blocks_are_each_reported() {
        let yaml = r"
microscopes:
  Mesoscale:
    camera: {delay: 5}
    stage: {hardware: [{type: PI, axes: 7}]}
    shutter: {hardware: {type: NI}}
";
        let result = ConfigLoader::with_defaults().load_from_str(yaml).unwrap();
        let decode: Vec<&ValidationIssue> = result
            .config
            .decode_issues()
            .iter()
            .filter(|i| i.is_error())
            .collect();
        assert_eq!(decode.len(), 2, "{decode:#?}");
        assert_eq!(decode[0].path, "microscopes.Mesoscale.camera");
        assert_eq!(decode[1].path, "microscopes.Mesoscale.stage");
        // A block that failed to decode is not also reported as missing.
        assert!(
            !result
                .issues
                .iter()
                .any(|i| i.message.contains("missing required block 'camera'"))
        );
        assert!(result.config.microscope("Mesoscale").unwrap().shutter.is_some());
    }

    #[test]
    fn test_unknown_keys_warn_with_suggestion() {
        let yaml = format!("{SMALL}    camra: {{}}\nguii: {{}}\n");
        let result = ConfigLoader::with_defaults().load_from_str(&yaml).unwrap();
        let warnings: Vec<&ValidationIssue> =
            result.issues.iter().filter(|i| !i.is_error()).collect();
        assert!(
            warnings
                .iter()
                .any(|w| w.message.contains("'camra'") && w.message.contains("'camera'"))
        );
        assert!(warnings.iter().any(|w| w.message.contains("'guii'")));
    }

    #[test]
    fn test_load_result_counts() {
        let result = ConfigLoader::with_defaults()
            .load_from_str("microscopes: {}")
            .unwrap();
        assert!(result.has_errors());
        assert_eq!(result.error_count(), 1);
        assert_eq!(result.warning_count(), 0);
    }

    #[test]
    fn test_config_limits_default() {
        let limits = ConfigLimits::default();
        assert!(limits.max_config_size > 0);
        assert!(limits.max_documents > 0);
        assert!(limits.max_microscopes > 0);
    }
}
