//! Configuration schema types
//!
//! The typed model a microscope configuration document decodes into. The
//! document has three top-level sections:
//!
//! - `hardware`: the physical device inventory shared by all microscopes
//! - `microscopes`: one block per named microscope, in declaration order
//! - `gui`: numeric range tables for acquisition controls
//!
//! Device blocks keep every key they do not model in an `extra` map so a
//! round-trip through `show` loses nothing.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::config::devices::{
    CameraKind, DaqKind, DeviceKind, DeviceType, FilterWheelKind, GalvoKind, LaserChannelKind,
    MirrorKind, RemoteFocusKind, ShutterKind, StageKind, ZoomKind,
};
use crate::error::ValidationIssue;

/// Device blocks every microscope must define, directly or by inheritance.
pub const REQUIRED_BLOCKS: [&str; 8] = [
    "daq",
    "camera",
    "stage",
    "filter_wheel",
    "shutter",
    "remote_focus_device",
    "galvo",
    "lasers",
];

/// Device blocks a microscope may omit.
pub const OPTIONAL_BLOCKS: [&str; 2] = ["zoom", "mirror"];

// ============================================================================
// Top-Level Configuration
// ============================================================================

/// A fully merged and decoded microscope configuration.
///
/// Built once by the loader and shared read-only behind an `Arc`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Config {
    /// Physical devices available to the microscopes.
    pub hardware: HardwareInventory,

    /// Named microscope configurations, in declaration order.
    pub microscopes: IndexMap<String, MicroscopeConfig>,

    /// GUI range tables.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gui: Option<GuiLimits>,

    /// Issues found while normalizing and decoding the document.
    #[serde(skip)]
    pub(crate) decode_issues: Vec<ValidationIssue>,
}

impl Config {
    /// Returns the named microscope.
    #[must_use]
    pub fn microscope(&self, name: &str) -> Option<&MicroscopeConfig> {
        self.microscopes.get(name)
    }

    /// Returns the hardware inventory, declared or derived.
    #[must_use]
    pub const fn hardware_inventory(&self) -> &HardwareInventory {
        &self.hardware
    }

    /// Microscope names in declaration order.
    pub fn microscope_names(&self) -> impl Iterator<Item = &str> {
        self.microscopes.keys().map(String::as_str)
    }

    /// Name of the microscope that is active at startup.
    ///
    /// This is the first microscope flagged `default: true`, or the first one
    /// declared when none is flagged.
    #[must_use]
    pub fn default_microscope_name(&self) -> Option<&str> {
        self.microscopes
            .iter()
            .find(|(_, m)| m.default)
            .or_else(|| self.microscopes.first())
            .map(|(name, _)| name.as_str())
    }

    /// The microscope that is active at startup.
    #[must_use]
    pub fn default_microscope(&self) -> Option<&MicroscopeConfig> {
        self.default_microscope_name()
            .and_then(|name| self.microscope(name))
    }

    /// Number of channel rows the GUI shows.
    ///
    /// `gui.channels.count` (five when unset), raised to the largest camera
    /// `count` of any microscope.
    #[must_use]
    pub fn channel_count(&self) -> i64 {
        let configured = self
            .gui
            .as_ref()
            .and_then(|gui| gui.channels.as_ref())
            .map_or(ChannelLimits::DEFAULT_COUNT, ChannelLimits::count);
        self.microscopes
            .values()
            .filter_map(|m| m.camera.as_ref().and_then(|camera| camera.count))
            .fold(configured, i64::max)
    }

    /// Issues recorded while decoding, before semantic validation.
    #[must_use]
    pub fn decode_issues(&self) -> &[ValidationIssue] {
        &self.decode_issues
    }
}

// ============================================================================
// Hardware Inventory
// ============================================================================

/// Where the inventory came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InventorySource {
    /// Written in the document's `hardware` section
    #[default]
    Declared,
    /// Rebuilt from the devices the microscopes use
    Derived,
}

/// Global list of physical devices.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HardwareInventory {
    /// DAQ board.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daq: Option<InventoryEntry<DaqKind>>,

    /// Cameras.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub camera: Vec<InventoryEntry<CameraKind>>,

    /// Filter wheels.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filter_wheel: Vec<InventoryEntry<FilterWheelKind>>,

    /// Stage controllers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stage: Vec<InventoryEntry<StageKind>>,

    /// Zoom servo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<InventoryEntry<ZoomKind>>,

    /// Deformable mirror.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirror: Option<InventoryEntry<MirrorKind>>,

    /// Declared or derived.
    #[serde(skip)]
    pub source: InventorySource,
}

/// One physical device in the inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct InventoryEntry<K: DeviceKind> {
    /// Driver type.
    #[serde(rename = "type")]
    pub device_type: DeviceType<K>,

    /// Serial number, kept as text so `302158` and `"302158"` compare equal.
    #[serde(
        default,
        deserialize_with = "de::opt_scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub serial_number: Option<String>,

    /// Wheel index for filter wheels sharing one controller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wheel_number: Option<u32>,

    /// Connection parameters (`port`, `baudrate`, `servo_id`, ...).
    #[serde(flatten)]
    pub params: IndexMap<String, Value>,
}

impl<K: DeviceKind> InventoryEntry<K> {
    /// Creates an entry with only a type set.
    pub fn new(device_type: DeviceType<K>) -> Self {
        Self {
            device_type,
            serial_number: None,
            wheel_number: None,
            params: IndexMap::new(),
        }
    }

    /// Identity used for deduplication: type plus serial or wheel number.
    #[must_use]
    pub fn identity(&self) -> String {
        match (&self.serial_number, self.wheel_number) {
            (Some(serial), _) => format!("{}-{serial}", self.device_type),
            (None, Some(wheel)) => format!("{}-{wheel}", self.device_type),
            (None, None) => self.device_type.raw().to_string(),
        }
    }
}

// ============================================================================
// Microscope
// ============================================================================

/// One named microscope.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MicroscopeConfig {
    /// Name under `microscopes`.
    #[serde(skip)]
    pub name: String,

    /// Microscope this one inherited missing blocks from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inherits: Option<String>,

    /// Marks the microscope active at startup.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub default: bool,

    /// DAQ block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daq: Option<DaqBlock>,

    /// Camera block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera: Option<CameraBlock>,

    /// Remote-focus block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_focus_device: Option<RemoteFocusBlock>,

    /// Galvos, in declaration order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub galvo: Option<Vec<GalvoBlock>>,

    /// Filter wheels, in declaration order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_wheel: Option<Vec<FilterWheelBlock>>,

    /// Stage block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<StageBlock>,

    /// Zoom block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<ZoomBlock>,

    /// Shutter block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shutter: Option<ShutterBlock>,

    /// Laser lines, in declaration order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lasers: Option<Vec<LaserLine>>,

    /// Deformable mirror block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirror: Option<MirrorBlock>,

    /// Blocks copied from the parent rather than written for this microscope.
    #[serde(skip)]
    pub inherited_blocks: Vec<String>,
}

impl MicroscopeConfig {
    /// All axes across the microscope's stages, in declaration order.
    #[must_use]
    pub fn axes(&self) -> Vec<AxisSpec> {
        self.stage.as_ref().map(StageBlock::axes).unwrap_or_default()
    }

    /// Looks up one axis by name.
    #[must_use]
    pub fn axis(&self, name: &str) -> Option<AxisSpec> {
        self.axes().into_iter().find(|a| a.name == name)
    }

    /// Returns `true` if the named block came from the parent microscope.
    #[must_use]
    pub fn is_inherited(&self, block: &str) -> bool {
        self.inherited_blocks.iter().any(|b| b == block)
    }

    /// Returns `true` if the named block is present.
    #[must_use]
    pub fn has_block(&self, block: &str) -> bool {
        match block {
            "daq" => self.daq.is_some(),
            "camera" => self.camera.is_some(),
            "remote_focus_device" => self.remote_focus_device.is_some(),
            "galvo" => self.galvo.is_some(),
            "filter_wheel" => self.filter_wheel.is_some(),
            "stage" => self.stage.is_some(),
            "zoom" => self.zoom.is_some(),
            "shutter" => self.shutter.is_some(),
            "lasers" => self.lasers.is_some(),
            "mirror" => self.mirror.is_some(),
            _ => false,
        }
    }
}

// ============================================================================
// Device Hardware
// ============================================================================

/// The `hardware` mapping inside a device block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct DeviceHardware<K: DeviceKind> {
    /// Driver type.
    #[serde(rename = "type")]
    pub device_type: DeviceType<K>,

    /// Serial number.
    #[serde(
        default,
        deserialize_with = "de::opt_scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub serial_number: Option<String>,

    /// DAQ channel or line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,

    /// Lower output bound (volts).
    #[serde(
        default,
        deserialize_with = "de::lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub min: Option<f64>,

    /// Upper output bound (volts).
    #[serde(
        default,
        deserialize_with = "de::lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub max: Option<f64>,

    /// Everything else (`port`, `baudrate`, `wheel_number`, `servo_id`, ...).
    #[serde(flatten)]
    pub params: IndexMap<String, Value>,
}

impl<K: DeviceKind> DeviceHardware<K> {
    /// Resolved device kind, `None` for an unsupported type.
    #[must_use]
    pub fn kind(&self) -> Option<K> {
        self.device_type.kind()
    }

    /// Returns a connection parameter.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    /// Returns an unsigned integer connection parameter.
    #[must_use]
    pub fn param_u64(&self, key: &str) -> Option<u64> {
        self.param(key).and_then(Value::as_u64)
    }
}

// ============================================================================
// Device Blocks
// ============================================================================

/// `daq` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaqBlock {
    /// Board type.
    pub hardware: DeviceHardware<DaqKind>,

    /// Sample rate in Hz.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<f64>,

    /// Waveform sweep time in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sweep_time: Option<f64>,

    /// Master trigger output line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_trigger_out_line: Option<String>,

    /// Camera trigger output line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_trigger_out_line: Option<String>,

    /// Trigger source terminal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_source: Option<String>,

    /// Laser port switcher line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub laser_port_switcher: Option<String>,

    /// Laser switch state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub laser_switch_state: Option<bool>,

    /// Unmodelled keys.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// `camera` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraBlock {
    /// Camera type and serial number.
    pub hardware: DeviceHardware<CameraKind>,

    /// Trigger delay, in percent of the sweep.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<f64>,

    /// Legacy name for `delay`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_percent: Option<f64>,

    /// Exposure pulse width, in percent of the sweep.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pulse_percent: Option<f64>,

    /// Settle time after a trigger, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settle_down: Option<f64>,

    /// Sensor defect correction mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defect_correct_mode: Option<f64>,

    /// Mirror the image horizontally.
    #[serde(default)]
    pub flip_x: bool,

    /// Mirror the image vertically.
    #[serde(default)]
    pub flip_y: bool,

    /// Default exposure time in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposure_time: Option<f64>,

    /// Allowed exposure times.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposure_time_range: Option<NumericRange>,

    /// Channel rows this camera needs in the GUI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,

    /// Unmodelled keys.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl CameraBlock {
    /// Trigger delay, falling back to `delay_percent` and then 2%.
    #[must_use]
    pub fn delay(&self) -> f64 {
        self.delay.or(self.delay_percent).unwrap_or(2.0)
    }
}

/// `remote_focus_device` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteFocusBlock {
    /// Output channel and voltage bounds.
    pub hardware: DeviceHardware<RemoteFocusKind>,

    /// Ramp delay, in percent of the sweep.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<f64>,

    /// Legacy name for `delay`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_percent: Option<f64>,

    /// Rising ramp share, in percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ramp_rising_percent: Option<f64>,

    /// Falling ramp share, in percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ramp_falling: Option<f64>,

    /// Legacy name for `ramp_falling`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ramp_falling_percent: Option<f64>,

    /// Waveform smoothing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smoothing: Option<f64>,

    /// Unmodelled keys.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl RemoteFocusBlock {
    /// Ramp delay, falling back to `delay_percent` and then 0%.
    #[must_use]
    pub fn delay(&self) -> f64 {
        self.delay.or(self.delay_percent).unwrap_or(0.0)
    }

    /// Falling ramp, falling back to `ramp_falling_percent` and then 5%.
    #[must_use]
    pub fn ramp_falling(&self) -> f64 {
        self.ramp_falling
            .or(self.ramp_falling_percent)
            .unwrap_or(5.0)
    }
}

/// One entry of the `galvo` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalvoBlock {
    /// Output channel and voltage bounds.
    pub hardware: DeviceHardware<GalvoKind>,

    /// Waveform shape (`sawtooth`, `sine`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waveform: Option<String>,

    /// Phase offset in radians.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<f64>,

    /// Unmodelled keys.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// One entry of the `filter_wheel` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterWheelBlock {
    /// Wheel type, wheel number and port.
    pub hardware: DeviceHardware<FilterWheelKind>,

    /// Settle time after a move, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_wheel_delay: Option<f64>,

    /// Filter name to slot index.
    #[serde(default)]
    pub available_filters: IndexMap<String, i64>,

    /// Unmodelled keys.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl FilterWheelBlock {
    /// Number of physical slots: `hardware.slot_count`, else the kind default.
    #[must_use]
    pub fn slot_count(&self) -> Option<u64> {
        self.hardware.param_u64("slot_count").or_else(|| {
            self.hardware
                .device_type
                .kind()
                .and_then(FilterWheelKind::default_slot_count)
                .map(u64::from)
        })
    }

    /// Wheel number from the hardware block, if given.
    #[must_use]
    pub fn wheel_number(&self) -> Option<u64> {
        self.hardware.param_u64("wheel_number")
    }
}

/// `stage` block: one or more controllers merged into one axis set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageBlock {
    /// Physical stage controllers.
    pub hardware: Vec<StageHardware>,

    /// Axes driven by the joystick.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub joystick_axes: Vec<String>,

    /// Leader axis to follower axis.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub coupled_axes: IndexMap<String, String>,

    /// Flat per-axis keys (`x_min`, `x_max`, `x_step`, `x_offset`, `flip_x`) and
    /// anything else.
    #[serde(flatten)]
    pub limits: IndexMap<String, Value>,
}

impl StageBlock {
    /// Axes across every controller, in declaration order.
    #[must_use]
    pub fn axes(&self) -> Vec<AxisSpec> {
        let mut axes = Vec::new();
        for (stage_index, hardware) in self.hardware.iter().enumerate() {
            for (position, name) in hardware.axes.iter().enumerate() {
                axes.push(AxisSpec {
                    name: name.clone(),
                    stage_index,
                    channel: hardware.axes_mapping.get(position).and_then(scalar_text),
                    min: self.axis_number(name, "min"),
                    max: self.axis_number(name, "max"),
                    step: self.axis_number(name, "step"),
                    offset: self.axis_number(name, "offset").unwrap_or(0.0),
                    flip: self
                        .limits
                        .get(&format!("flip_{name}"))
                        .and_then(Value::as_bool)
                        .unwrap_or(false),
                });
            }
        }
        axes
    }

    /// Reads `<axis>_<suffix>` as a number.
    #[must_use]
    pub fn axis_number(&self, axis: &str, suffix: &str) -> Option<f64> {
        self.limits
            .get(&format!("{axis}_{suffix}"))
            .and_then(Value::as_f64)
    }
}

/// One stage controller under `stage.hardware`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageHardware {
    /// Controller type.
    #[serde(rename = "type")]
    pub device_type: DeviceType<StageKind>,

    /// Serial number.
    #[serde(
        default,
        deserialize_with = "de::opt_scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub serial_number: Option<String>,

    /// Axis names this controller drives.
    #[serde(default)]
    pub axes: Vec<String>,

    /// Controller channel for each entry of `axes`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub axes_mapping: Vec<Value>,

    /// Lower output bound for analog stages.
    #[serde(
        default,
        deserialize_with = "de::lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub min: Option<f64>,

    /// Upper output bound for analog stages.
    #[serde(
        default,
        deserialize_with = "de::lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub max: Option<f64>,

    /// Everything else (`controllername`, `stages`, `refmode`, `port`, ...).
    #[serde(flatten)]
    pub params: IndexMap<String, Value>,
}

/// `zoom` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoomBlock {
    /// Servo type and connection.
    pub hardware: DeviceHardware<ZoomKind>,

    /// Magnification label to servo position.
    #[serde(default)]
    pub position: IndexMap<String, f64>,

    /// Magnification label to pixel size in microns.
    #[serde(default)]
    pub pixel_size: IndexMap<String, f64>,

    /// Per-medium focus offsets.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub stage_positions: IndexMap<String, Value>,

    /// Unmodelled keys.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// `shutter` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShutterBlock {
    /// Shutter line.
    pub hardware: DeviceHardware<ShutterKind>,

    /// Unmodelled keys.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// `mirror` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorBlock {
    /// Mirror type.
    pub hardware: DeviceHardware<MirrorKind>,

    /// Unmodelled keys.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

// ============================================================================
// Lasers
// ============================================================================

/// Laser wavelength: nanometers, or a symbolic name for broadband sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Wavelength {
    /// Wavelength in nanometers.
    Nanometers(f64),
    /// Symbolic source name such as `LED`.
    Symbolic(String),
}

impl std::fmt::Display for Wavelength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nanometers(nm) => write!(f, "{nm}nm"),
            Self::Symbolic(name) => f.write_str(name),
        }
    }
}

/// A laser on/off or power channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaserChannel {
    /// Channel line and voltage bounds.
    pub hardware: DeviceHardware<LaserChannelKind>,
}

/// One entry of the `lasers` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaserLine {
    /// Emission wavelength.
    pub wavelength: Wavelength,

    /// Digital on/off channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onoff: Option<LaserChannel>,

    /// Analog power channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<LaserChannel>,

    /// Laser model (`LuxX`, `Obis`, ...).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Position in the laser list used by the acquisition software.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,

    /// Turn-on delay, in percent of the sweep.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_percent: Option<f64>,

    /// Pulse width, in percent of the sweep.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pulse_percent: Option<f64>,

    /// Unmodelled keys.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

// ============================================================================
// Axes and Ranges
// ============================================================================

/// Limits and mapping for one stage axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisSpec {
    /// Axis name (`x`, `y`, `z`, `f`, `theta`, ...).
    pub name: String,
    /// Index of the controller under `stage.hardware`.
    pub stage_index: usize,
    /// Controller channel from `axes_mapping`.
    pub channel: Option<String>,
    /// Soft lower limit.
    pub min: Option<f64>,
    /// Soft upper limit.
    pub max: Option<f64>,
    /// Step size.
    pub step: Option<f64>,
    /// Offset applied to reported positions.
    pub offset: f64,
    /// Invert the axis direction.
    pub flip: bool,
}

/// A `{min, max, step}` table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    /// Lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Increment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}

// ============================================================================
// GUI
// ============================================================================

/// Known `gui` sections.
pub const GUI_SECTIONS: [&str; 3] = ["channels", "stack_acquisition", "timepoint"];

/// `gui` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuiLimits {
    /// Channel settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<ChannelLimits>,

    /// Z-stack ranges (`step_size`, `start_pos`, `end_pos`).
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub stack_acquisition: IndexMap<String, NumericRange>,

    /// Time-lapse ranges (`timepoints`, `stack_pause`).
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub timepoint: IndexMap<String, NumericRange>,

    /// Unknown sections.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// `gui.channels` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelLimits {
    /// Number of channel rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,

    /// `laser_power`, `exposure_time`, `interval_time`, ...
    #[serde(flatten)]
    pub ranges: IndexMap<String, NumericRange>,
}

impl ChannelLimits {
    /// Default number of channel rows.
    pub const DEFAULT_COUNT: i64 = 5;

    /// Channel row count, defaulting to five.
    #[must_use]
    pub fn count(&self) -> i64 {
        self.count.unwrap_or(Self::DEFAULT_COUNT)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Renders a scalar YAML value as text.
#[must_use]
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

mod de {
    //! Lenient field deserializers for values hand-edited documents get wrong
    //! in harmless ways.

    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_yaml::Value;

    /// Accepts a number, a numeric string, `null`, `None` or an empty string.
    pub fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_f64()
                .map(Some)
                .ok_or_else(|| D::Error::custom("number out of range")),
            Some(Value::String(s)) => {
                let trimmed = s.trim();
                if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
                    Ok(None)
                } else {
                    trimmed
                        .parse::<f64>()
                        .map(Some)
                        .map_err(|_| D::Error::custom(format!("expected a number, got '{s}'")))
                }
            }
            Some(_) => Err(D::Error::custom("expected a number")),
        }
    }

    /// Accepts a string or a number and keeps it as text.
    pub fn opt_scalar_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(_) => Err(D::Error::custom("expected a string or number")),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_block_with_legacy_delay() {
        let yaml = r"
hardware:
  type: HamamatsuOrca
  serial_number: 302158
delay_percent: 7.5
flip_x: true
x_pixels: 2048
";
        let camera: CameraBlock = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(camera.hardware.device_type.kind(), Some(CameraKind::HamamatsuOrca));
        assert_eq!(camera.hardware.serial_number.as_deref(), Some("302158"));
        assert!((camera.delay() - 7.5).abs() < f64::EPSILON);
        assert!(camera.flip_x);
        assert!(!camera.flip_y);
        assert!(camera.extra.contains_key("x_pixels"));
    }

    #[test]
    fn test_camera_delay_default() {
        let camera: CameraBlock = serde_yaml::from_str("hardware: {type: Synthetic}").unwrap();
        assert!((camera.delay() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_remote_focus_defaults() {
        let rf: RemoteFocusBlock =
            serde_yaml::from_str("hardware: {type: NI, channel: PXI6259/ao2, min: -5, max: 5}")
                .unwrap();
        assert!((rf.delay() - 0.0).abs() < f64::EPSILON);
        assert!((rf.ramp_falling() - 5.0).abs() < f64::EPSILON);
        assert_eq!(rf.hardware.min, Some(-5.0));

        let rf: RemoteFocusBlock = serde_yaml::from_str(
            "hardware: {type: NI}\nramp_falling_percent: 2.5\ndelay_percent: 1",
        )
        .unwrap();
        assert!((rf.ramp_falling() - 2.5).abs() < f64::EPSILON);
        assert!((rf.delay() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_hardware_type_fails() {
        let result: Result<ShutterBlock, _> = serde_yaml::from_str("hardware: {channel: line0}");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("type"), "{err}");
    }

    #[test]
    fn test_stage_hardware_none_strings() {
        let yaml = r"
type: PI
serial_number: '119060508'
axes: [x, y, z, theta, f]
axes_mapping: [1, 2, 3, 4, 5]
volts_per_micron: None
min: None
max: None
controllername: C-884
";
        let stage: StageHardware = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(stage.min, None);
        assert_eq!(stage.max, None);
        assert_eq!(stage.axes.len(), 5);
        assert_eq!(stage.device_type.kind(), Some(StageKind::Pi));
        assert!(stage.params.contains_key("controllername"));
    }

    #[test]
    fn test_stage_axes_merge_controllers() {
        let yaml = r"
hardware:
  - type: ASI
    serial_number: 123
    axes: [x, y, z]
    axes_mapping: [X, Y, Z]
  - type: Thorlabs
    serial_number: 74000375
    axes: [f]
    axes_mapping: [1]
x_min: -1000
x_max: 1000
x_step: 5
z_offset: 12.5
flip_y: true
coupled_axes:
  z: f
";
        let stage: StageBlock = serde_yaml::from_str(yaml).unwrap();
        let axes = stage.axes();
        let names: Vec<&str> = axes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["x", "y", "z", "f"]);

        assert_eq!(axes[0].channel.as_deref(), Some("X"));
        assert_eq!(axes[0].min, Some(-1000.0));
        assert_eq!(axes[0].max, Some(1000.0));
        assert_eq!(axes[0].step, Some(5.0));
        assert!(axes[1].flip);
        assert!((axes[2].offset - 12.5).abs() < f64::EPSILON);
        assert_eq!(axes[3].stage_index, 1);
        assert_eq!(axes[3].channel.as_deref(), Some("1"));
        assert_eq!(stage.coupled_axes.get("z").map(String::as_str), Some("f"));
    }

    #[test]
    fn test_laser_wavelength_forms() {
        let laser: LaserLine = serde_yaml::from_str("wavelength: 488\ntype: LuxX").unwrap();
        assert_eq!(laser.wavelength, Wavelength::Nanometers(488.0));
        assert_eq!(laser.model.as_deref(), Some("LuxX"));

        let led: LaserLine = serde_yaml::from_str("wavelength: LED").unwrap();
        assert_eq!(led.wavelength, Wavelength::Symbolic("LED".to_string()));
        assert_eq!(led.wavelength.to_string(), "LED");
    }

    #[test]
    fn test_filter_wheel_slot_count() {
        let fw: FilterWheelBlock = serde_yaml::from_str(
            "hardware: {type: SutterFilterWheel, wheel_number: 1}\navailable_filters: {Empty: 0}",
        )
        .unwrap();
        assert_eq!(fw.slot_count(), Some(10));
        assert_eq!(fw.wheel_number(), Some(1));

        let fw: FilterWheelBlock =
            serde_yaml::from_str("hardware: {type: SutterFilterWheel, slot_count: 6}").unwrap();
        assert_eq!(fw.slot_count(), Some(6));
    }

    #[test]
    fn test_gui_limits() {
        let yaml = r"
channels:
  count: 5
  laser_power: {min: 0, max: 100, step: 10}
  exposure_time: {min: 1, max: 1000, step: 5}
stack_acquisition:
  step_size: {min: 0.2, max: 1000, step: 0.2}
timepoint:
  timepoints: {min: 1, max: 1000, step: 1}
";
        let gui: GuiLimits = serde_yaml::from_str(yaml).unwrap();
        let channels = gui.channels.unwrap();
        assert_eq!(channels.count(), 5);
        assert_eq!(channels.ranges["laser_power"].max, Some(100.0));
        assert_eq!(gui.stack_acquisition["step_size"].step, Some(0.2));
        assert!(gui.extra.is_empty());
    }

    #[test]
    fn test_inventory_entry_identity() {
        let entry: InventoryEntry<CameraKind> =
            serde_yaml::from_str("type: HamamatsuOrca\nserial_number: 302158").unwrap();
        assert_eq!(entry.identity(), "HamamatsuOrca-302158");

        let wheel: InventoryEntry<FilterWheelKind> =
            serde_yaml::from_str("type: SutterFilterWheel\nwheel_number: 2\nport: COM10").unwrap();
        assert_eq!(wheel.identity(), "SutterFilterWheel-2");
        assert!(wheel.params.contains_key("port"));
    }

    #[test]
    fn test_default_microscope_falls_back_to_first() {
        let mut config = Config::default();
        for name in ["Mesoscale", "Nanoscale"] {
            config.microscopes.insert(
                name.to_string(),
                MicroscopeConfig {
                    name: name.to_string(),
                    ..MicroscopeConfig::default()
                },
            );
        }
        assert_eq!(config.default_microscope_name(), Some("Mesoscale"));

        config.microscopes["Nanoscale"].default = true;
        assert_eq!(config.default_microscope_name(), Some("Nanoscale"));
    }

    #[test]
    fn test_channel_count_follows_largest_camera() {
        let mut config = Config::default();
        assert_eq!(config.channel_count(), ChannelLimits::DEFAULT_COUNT);

        for (name, count) in [("Mesoscale", "4"), ("Nanoscale", "8")] {
            let camera: CameraBlock = serde_yaml::from_str(&format!(
                "hardware: {{type: HamamatsuOrca, serial_number: 1}}\ncount: {count}"
            ))
            .unwrap();
            config.microscopes.insert(
                name.to_string(),
                MicroscopeConfig {
                    name: name.to_string(),
                    camera: Some(camera),
                    ..MicroscopeConfig::default()
                },
            );
        }
        assert_eq!(config.channel_count(), 8);

        config.gui = Some(serde_yaml::from_str("channels: {count: 10}").unwrap());
        assert_eq!(config.channel_count(), 10);
    }
}
