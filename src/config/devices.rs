//! Supported device kinds
//!
//! Every device block names its driver through a `type` string. Each device
//! category has a closed set of kinds it understands, and every category has
//! a `Synthetic` kind that stands in for missing hardware. Any type whose name
//! begins with `synthetic` (case-insensitive) resolves to it, so documents
//! may write `Synthetic`, `SyntheticCamera` or `synthetic_stage` alike.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ============================================================================
// Categories
// ============================================================================

/// The device categories a microscope is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceCategory {
    /// Data acquisition board
    Daq,
    /// Scientific camera
    Camera,
    /// Motorized stage controller
    Stage,
    /// Filter wheel or cube slider
    FilterWheel,
    /// Zoom servo
    Zoom,
    /// Shutter line
    Shutter,
    /// Galvo analog output
    Galvo,
    /// Remote-focus actuator
    RemoteFocus,
    /// Laser on/off or power channel
    LaserChannel,
    /// Deformable mirror
    Mirror,
}

impl DeviceCategory {
    /// Human-readable category name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daq => "daq",
            Self::Camera => "camera",
            Self::Stage => "stage",
            Self::FilterWheel => "filter wheel",
            Self::Zoom => "zoom",
            Self::Shutter => "shutter",
            Self::Galvo => "galvo",
            Self::RemoteFocus => "remote focus device",
            Self::LaserChannel => "laser channel",
            Self::Mirror => "mirror",
        }
    }
}

impl fmt::Display for DeviceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns `true` if `type_name` denotes a synthetic placeholder device.
#[must_use]
pub fn is_synthetic_name(type_name: &str) -> bool {
    type_name.trim().to_lowercase().starts_with("synthetic")
}

// ============================================================================
// DeviceKind trait
// ============================================================================

/// A closed enumeration of the drivers supported for one device category.
pub trait DeviceKind: Copy + Eq + fmt::Debug + 'static {
    /// Category this kind belongs to.
    const CATEGORY: DeviceCategory;

    /// The synthetic stand-in of this category.
    const SYNTHETIC: Self;

    /// Accepted type names. The first name listed for a kind is canonical.
    const NAMES: &'static [(&'static str, Self)];

    /// Resolves a document `type` string to a kind.
    fn from_type_name(type_name: &str) -> Option<Self> {
        let trimmed = type_name.trim();
        if is_synthetic_name(trimmed) {
            return Some(Self::SYNTHETIC);
        }
        Self::NAMES
            .iter()
            .find(|(name, _)| *name == trimmed)
            .map(|(_, kind)| *kind)
    }

    /// Canonical type name.
    fn name(self) -> &'static str {
        if self == Self::SYNTHETIC {
            return "Synthetic";
        }
        Self::NAMES
            .iter()
            .find(|(_, kind)| *kind == self)
            .map_or("Synthetic", |(name, _)| *name)
    }

    /// Returns `true` for the synthetic stand-in.
    fn is_synthetic(self) -> bool {
        self == Self::SYNTHETIC
    }

    /// Closest accepted type name for a misspelled one.
    ///
    /// Returns the best match if its Damerau-Levenshtein distance is ≤ 3.
    fn suggest(type_name: &str) -> Option<&'static str> {
        Self::NAMES
            .iter()
            .map(|(name, _)| (*name, strsim::damerau_levenshtein(type_name, name)))
            .filter(|(_, dist)| *dist <= 3)
            .min_by_key(|(_, dist)| *dist)
            .map(|(name, _)| name)
    }

    /// Comma-separated list of canonical names, for error messages.
    fn supported_list() -> String {
        let mut names: Vec<&str> = Vec::new();
        for (name, kind) in Self::NAMES {
            if !names.iter().any(|n| Self::from_type_name(n) == Some(*kind)) {
                names.push(*name);
            }
        }
        names.join(", ")
    }
}

// ============================================================================
// Per-category kinds
// ============================================================================

/// Data acquisition boards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DaqKind {
    /// National Instruments DAQmx board
    Ni,
    /// Synthetic DAQ
    Synthetic,
}

impl DeviceKind for DaqKind {
    const CATEGORY: DeviceCategory = DeviceCategory::Daq;
    const SYNTHETIC: Self = Self::Synthetic;
    const NAMES: &'static [(&'static str, Self)] = &[("NI", Self::Ni)];
}

/// Cameras.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraKind {
    /// Hamamatsu ORCA-Flash 4.0
    HamamatsuOrca,
    /// Hamamatsu ORCA-Lightning
    HamamatsuOrcaLightning,
    /// Hamamatsu ORCA-Fire
    HamamatsuOrcaFire,
    /// Teledyne Photometrics Iris
    Photometrics,
    /// Synthetic camera
    Synthetic,
}

impl DeviceKind for CameraKind {
    const CATEGORY: DeviceCategory = DeviceCategory::Camera;
    const SYNTHETIC: Self = Self::Synthetic;
    const NAMES: &'static [(&'static str, Self)] = &[
        ("HamamatsuOrca", Self::HamamatsuOrca),
        ("HamamatsuOrcaLightning", Self::HamamatsuOrcaLightning),
        ("HamamatsuOrcaFire", Self::HamamatsuOrcaFire),
        ("Photometrics", Self::Photometrics),
    ];
}

/// Stage controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// ASI Tiger controller
    Asi,
    /// ASI MS-2000
    Ms2000,
    /// ASI MFC-2000
    Mfc2000,
    /// Physik Instrumente controller
    Pi,
    /// Sutter MP-285
    Mp285,
    /// Mad City Labs Nano-Drive
    Mcl,
    /// Thorlabs KIM001 inertial motor
    Kim001,
    /// Thorlabs KST101 stepper
    Kst101,
    /// Galvo driven as a stage through a DAQ output
    GalvoNi,
    /// Analog stage driven through a DAQ output
    Ni,
    /// Synthetic stage
    Synthetic,
}

impl DeviceKind for StageKind {
    const CATEGORY: DeviceCategory = DeviceCategory::Stage;
    const SYNTHETIC: Self = Self::Synthetic;
    const NAMES: &'static [(&'static str, Self)] = &[
        ("ASI", Self::Asi),
        ("MS2000", Self::Ms2000),
        ("MFC2000", Self::Mfc2000),
        ("PI", Self::Pi),
        ("MP285", Self::Mp285),
        ("MCL", Self::Mcl),
        ("KIM001", Self::Kim001),
        ("Thorlabs", Self::Kim001),
        ("KST101", Self::Kst101),
        ("GalvoNIStage", Self::GalvoNi),
        ("NI", Self::Ni),
        ("NIStage", Self::Ni),
    ];
}

/// Filter wheels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterWheelKind {
    /// Sutter Lambda 10-B wheel
    Sutter,
    /// ASI FW-1000 wheel
    Asi,
    /// ASI C60 cube slider
    AsiCubeSlider,
    /// DAQ-switched filter set
    Ni,
    /// Synthetic filter wheel
    Synthetic,
}

impl FilterWheelKind {
    /// Number of physical positions, or `None` when unbounded.
    #[must_use]
    pub const fn default_slot_count(self) -> Option<u32> {
        match self {
            Self::Sutter => Some(10),
            Self::Asi => Some(8),
            Self::AsiCubeSlider => Some(6),
            Self::Ni => Some(4),
            Self::Synthetic => None,
        }
    }
}

impl DeviceKind for FilterWheelKind {
    const CATEGORY: DeviceCategory = DeviceCategory::FilterWheel;
    const SYNTHETIC: Self = Self::Synthetic;
    const NAMES: &'static [(&'static str, Self)] = &[
        ("SutterFilterWheel", Self::Sutter),
        ("Sutter", Self::Sutter),
        ("ASI", Self::Asi),
        ("ASIFilterWheel", Self::Asi),
        ("ASICubeSlider", Self::AsiCubeSlider),
        ("NI", Self::Ni),
    ];
}

/// Zoom servos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoomKind {
    /// Dynamixel servo
    Dynamixel,
    /// Synthetic zoom
    Synthetic,
}

impl DeviceKind for ZoomKind {
    const CATEGORY: DeviceCategory = DeviceCategory::Zoom;
    const SYNTHETIC: Self = Self::Synthetic;
    const NAMES: &'static [(&'static str, Self)] = &[
        ("DynamixelZoom", Self::Dynamixel),
        ("Dynamixel", Self::Dynamixel),
    ];
}

/// Shutters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShutterKind {
    /// TTL line on a DAQ board
    Ni,
    /// ASI TTL output
    Asi,
    /// Synthetic shutter
    Synthetic,
}

impl DeviceKind for ShutterKind {
    const CATEGORY: DeviceCategory = DeviceCategory::Shutter;
    const SYNTHETIC: Self = Self::Synthetic;
    const NAMES: &'static [(&'static str, Self)] = &[("NI", Self::Ni), ("ASI", Self::Asi)];
}

/// Galvo outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GalvoKind {
    /// DAQ analog output
    Ni,
    /// ASI analog output
    Asi,
    /// Synthetic galvo
    Synthetic,
}

impl DeviceKind for GalvoKind {
    const CATEGORY: DeviceCategory = DeviceCategory::Galvo;
    const SYNTHETIC: Self = Self::Synthetic;
    const NAMES: &'static [(&'static str, Self)] = &[("NI", Self::Ni), ("ASI", Self::Asi)];
}

/// Remote-focus actuators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteFocusKind {
    /// DAQ analog output
    Ni,
    /// Equipment Solutions voice coil over serial
    EquipmentSolutions,
    /// ASI analog output
    Asi,
    /// Synthetic remote focus
    Synthetic,
}

impl DeviceKind for RemoteFocusKind {
    const CATEGORY: DeviceCategory = DeviceCategory::RemoteFocus;
    const SYNTHETIC: Self = Self::Synthetic;
    const NAMES: &'static [(&'static str, Self)] = &[
        ("NI", Self::Ni),
        ("EquipmentSolutions", Self::EquipmentSolutions),
        ("ASI", Self::Asi),
    ];
}

/// Laser on/off and power channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaserChannelKind {
    /// DAQ digital or analog line
    Ni,
    /// Synthetic channel
    Synthetic,
}

impl DeviceKind for LaserChannelKind {
    const CATEGORY: DeviceCategory = DeviceCategory::LaserChannel;
    const SYNTHETIC: Self = Self::Synthetic;
    const NAMES: &'static [(&'static str, Self)] = &[("NI", Self::Ni)];
}

/// Deformable mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MirrorKind {
    /// Imagine Optics mirao
    ImagineOptics,
    /// Synthetic mirror
    Synthetic,
}

impl DeviceKind for MirrorKind {
    const CATEGORY: DeviceCategory = DeviceCategory::Mirror;
    const SYNTHETIC: Self = Self::Synthetic;
    const NAMES: &'static [(&'static str, Self)] = &[
        ("ImagineOpticsMirror", Self::ImagineOptics),
        ("ImagineOptics", Self::ImagineOptics),
    ];
}

// ============================================================================
// DeviceType
// ============================================================================

/// A device `type` as written in the document, resolved against `K`.
///
/// Unknown names are kept rather than rejected during decoding so the
/// validator can report them together with every other issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceType<K: DeviceKind> {
    raw: String,
    kind: Option<K>,
}

impl<K: DeviceKind> DeviceType<K> {
    /// Resolves `raw` against the supported kinds of `K`.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let kind = K::from_type_name(&raw);
        Self { raw, kind }
    }

    /// The type string exactly as written.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The resolved kind, or `None` if the name is not supported.
    #[must_use]
    pub const fn kind(&self) -> Option<K> {
        self.kind
    }

    /// Returns `true` if this is a synthetic placeholder.
    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        self.kind.is_some_and(DeviceKind::is_synthetic)
    }
}

impl<K: DeviceKind> fmt::Display for DeviceType<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl<'de, K: DeviceKind> Deserialize<'de> for DeviceType<K> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::new(raw))
    }
}

impl<K: DeviceKind> Serialize for DeviceType<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

// ============================================================================
// Tests
// ============================================================================
