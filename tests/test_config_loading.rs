mod common;

use std::io::Write;
use std::path::PathBuf;

use common::fixture_path;
use scopecfg::config::devices::{CameraKind, StageKind};
use scopecfg::config::{
    ConfigLoader, DeviceKind, EffectiveConfig, InventorySource, Overrides, validate,
};
use scopecfg::error::{IssueKind, ValidationIssue};

fn load(names: &[&str]) -> scopecfg::config::LoadResult {
    let paths: Vec<PathBuf> = names.iter().map(|n| fixture_path(n)).collect();
    ConfigLoader::with_defaults().load(&paths).unwrap()
}

fn errors_under<'a>(
    issues: &'a [ValidationIssue],
    prefix: &str,
    kind: IssueKind,
) -> Vec<&'a ValidationIssue> {
    issues
        .iter()
        .filter(|i| i.is_error() && i.kind == kind && i.path.starts_with(prefix))
        .collect()
}

#[test]
fn valid_fixture_has_no_issues() {
    let result = load(&["valid.yaml"]);
    assert!(result.issues.is_empty(), "{:#?}", result.issues);
    assert!(result.warnings.is_empty());

    let config = &result.config;
    assert_eq!(
        config.microscope_names().collect::<Vec<_>>(),
        ["Mesoscale", "Nanoscale"]
    );
    assert_eq!(config.default_microscope_name(), Some("Mesoscale"));
    assert_eq!(config.hardware_inventory().source, InventorySource::Declared);
}

#[test]
fn axes_are_merged_across_controllers() {
    let result = load(&["valid.yaml"]);
    let meso = result.config.microscope("Mesoscale").unwrap();
    let axes = meso.axes();
    let names: Vec<&str> = axes.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, ["x", "y", "z", "theta", "f"]);

    let f = meso.axis("f").unwrap();
    assert_eq!(f.stage_index, 1);
    assert_eq!(f.channel.as_deref(), Some("1"));
    assert_eq!(f.step, Some(1.0));
    assert!(meso.axis("y").unwrap().flip);

    let stage = meso.stage.as_ref().unwrap();
    assert_eq!(stage.hardware[1].device_type.kind(), Some(StageKind::Kim001));
}

#[test]
fn inherited_microscope_takes_missing_blocks() {
    let result = load(&["valid.yaml"]);
    let nano = result.config.microscope("Nanoscale").unwrap();
    assert_eq!(nano.inherits.as_deref(), Some("Mesoscale"));
    assert!(!nano.default);
    assert_eq!(nano.camera.as_ref().unwrap().delay, Some(4.0));
    assert!(nano.zoom.as_ref().unwrap().hardware.device_type.is_synthetic());
    assert_eq!(nano.lasers.as_ref().unwrap().len(), 2);
    assert_eq!(nano.axes().len(), 5);
}

#[test]
fn single_leaf_override_changes_only_that_leaf() {
    let base = load(&["valid.yaml"]);
    let layered = load(&["valid.yaml", "site_override.yaml"]);
    assert!(layered.issues.is_empty(), "{:#?}", layered.issues);

    let mut expected = serde_yaml::to_value(base.config.as_ref()).unwrap();
    // Nanoscale inherits the whole stage block, so it sees the new limit too.
    for scope in ["Mesoscale", "Nanoscale"] {
        expected["microscopes"][scope]["stage"]["x_max"] = serde_yaml::Value::from(5000);
    }
    expected["microscopes"]["Mesoscale"]["camera"]["delay"] = serde_yaml::Value::from(12.0);
    let actual = serde_yaml::to_value(layered.config.as_ref()).unwrap();
    assert_eq!(actual, expected);
}

#[test]
fn merging_a_document_with_itself_is_identity() {
    let once = load(&["valid.yaml"]);
    let twice = load(&["valid.yaml", "valid.yaml"]);
    assert_eq!(
        serde_yaml::to_value(once.config.as_ref()).unwrap(),
        serde_yaml::to_value(twice.config.as_ref()).unwrap()
    );
}

#[test]
fn mismatched_axes_is_one_cardinality_error() {
    let result = load(&["valid.yaml", "mismatched_axes.yaml"]);
    let meso = errors_under(
        &result.issues,
        "microscopes.Mesoscale.",
        IssueKind::Cardinality,
    );
    assert_eq!(meso.len(), 1, "{:#?}", result.issues);
    assert_eq!(result.error_count(), 1, "{:#?}", result.issues);
    assert!(meso[0].message.contains("4 axes"));
    assert!(meso[0].message.contains("3 entries"));
}

#[test]
fn min_greater_than_max_is_one_range_error() {
    let result = load(&["valid.yaml", "bad_range.yaml"]);
    // Nanoscale inherits the stage, so the error is reported at Mesoscale only.
    let ranges = errors_under(&result.issues, "microscopes.", IssueKind::Range);
    assert_eq!(ranges.len(), 1, "{:#?}", result.issues);
    assert_eq!(ranges[0].path, "microscopes.Mesoscale.stage.z_min");
    assert!(ranges[0].message.contains("z_min (500) is greater than z_max (-500)"));
    assert_eq!(result.error_count(), 1);
}

#[test]
fn plain_name_overrides_inheriting_microscope() {
    let result = load(&["valid.yaml", "child_override.yaml"]);
    assert!(result.issues.is_empty(), "{:#?}", result.issues);

    let nano = result.config.microscope("Nanoscale").unwrap();
    assert_eq!(nano.inherits.as_deref(), Some("Mesoscale"));
    assert_eq!(nano.camera.as_ref().unwrap().delay, Some(6.0));
    assert_eq!(
        nano.camera.as_ref().unwrap().hardware.serial_number.as_deref(),
        Some("302158")
    );
    assert!(nano.is_inherited("stage"));
    assert!(!nano.is_inherited("camera"));
}

#[test]
fn duplicate_filter_slot_names_both_filters() {
    let result = load(&["valid.yaml", "duplicate_filter_slot.yaml"]);
    let meso = errors_under(&result.issues, "microscopes.Mesoscale.", IssueKind::Schema);
    assert_eq!(meso.len(), 1, "{:#?}", result.issues);
    assert_eq!(result.error_count(), 1, "{:#?}", result.issues);
    assert!(meso[0].message.contains("'GFP'"));
    assert!(meso[0].message.contains("'mCherry'"));
    assert!(meso[0].message.contains("slot 1"));
}

#[test]
fn unknown_type_is_one_reference_error() {
    let result = load(&["valid.yaml", "unknown_type.yaml"]);
    assert_eq!(result.issues.len(), 1, "{:#?}", result.issues);
    let issue = &result.issues[0];
    assert_eq!(issue.kind, IssueKind::Reference);
    assert_eq!(issue.path, "microscopes.Mesoscale.camera.hardware.type");
    assert!(issue.message.contains("AndorZyla"));
    assert!(issue.message.contains("Mesoscale"));
    assert!(issue.message.contains(&CameraKind::supported_list()));
}

#[test]
fn legacy_document_derives_inventory() {
    let result = load(&["legacy.yaml"]);
    assert_eq!(result.error_count(), 0, "{:#?}", result.issues);
    // Single-mapping `galvo` and `filter_wheel` are accepted with a warning.
    assert_eq!(result.warning_count(), 2, "{:#?}", result.issues);

    let inventory = result.config.hardware_inventory();
    assert_eq!(inventory.source, InventorySource::Derived);
    assert_eq!(inventory.camera.len(), 1);
    assert_eq!(inventory.filter_wheel[0].wheel_number, Some(1));
    assert!(inventory.daq.as_ref().unwrap().device_type.is_synthetic());
}

#[test]
fn validate_is_pure_and_repeatable() {
    let result = load(&["valid.yaml", "bad_range.yaml"]);
    let first = validate(&result.config);
    let second = validate(&result.config);
    assert_eq!(first, second);
    assert_eq!(first, result.issues);
}

#[test]
fn environment_defaults_are_substituted() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(
        b"microscopes:\n  Bench:\n    filter_wheel:\n      - hardware:\n          type: SutterFilterWheel\n          port: ${SCOPECFG_IT_UNSET_PORT_XYZ:-COM7}\n",
    )
    .unwrap();

    let result = ConfigLoader::with_defaults()
        .load(&[file.path().to_path_buf()])
        .unwrap();
    let bench = result.config.microscope("Bench").unwrap();
    let wheel = &bench.filter_wheel.as_ref().unwrap()[0];
    assert_eq!(
        wheel.hardware.param("port"),
        Some(&serde_yaml::Value::from("COM7"))
    );
}

#[test]
fn overrides_leave_baseline_untouched() {
    let result = load(&["valid.yaml"]);
    let config = &result.config;

    let mut overrides = Overrides::new();
    overrides.set_active_microscope(config, "Nanoscale").unwrap();
    overrides
        .set_stage_offset(config, "Nanoscale", "f", 42.0)
        .unwrap();

    let view = EffectiveConfig::new(config, &overrides);
    assert_eq!(view.active_microscope_name(), Some("Nanoscale"));
    assert_eq!(view.axis("Nanoscale", "f").map(|a| a.offset), Some(42.0));
    assert_eq!(view.axis("Mesoscale", "f").map(|a| a.offset), Some(0.0));
    assert_eq!(config.default_microscope_name(), Some("Mesoscale"));
    assert!(validate(config).is_empty());
}
