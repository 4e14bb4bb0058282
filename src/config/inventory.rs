//! Hardware inventory derivation and lookup
//!
//! Older documents have no top-level `hardware` section. For those the
//! inventory is rebuilt from the devices the microscopes actually use, with
//! duplicates collapsed by identity (type plus serial or wheel number).

use crate::config::devices::{DeviceKind, DeviceType};
use crate::config::schema::{
    Config, DeviceHardware, FilterWheelBlock, HardwareInventory, InventoryEntry, InventorySource,
    MicroscopeConfig,
};

impl HardwareInventory {
    /// Rebuilds an inventory from the devices used by `microscopes`.
    pub fn derive_from<'a, I>(microscopes: I) -> Self
    where
        I: IntoIterator<Item = &'a MicroscopeConfig>,
    {
        let mut inventory = Self {
            source: InventorySource::Derived,
            ..Self::default()
        };

        for microscope in microscopes {
            if let Some(daq) = &microscope.daq {
                prefer_real(&mut inventory.daq, entry_from(&daq.hardware));
            }
            if let Some(camera) = &microscope.camera {
                push_unique(&mut inventory.camera, entry_from(&camera.hardware));
            }
            for wheel in microscope.filter_wheel.iter().flatten() {
                let mut entry = entry_from(&wheel.hardware);
                entry.wheel_number = wheel.wheel_number().and_then(|n| u32::try_from(n).ok());
                entry.params.shift_remove("wheel_number");
                push_unique(&mut inventory.filter_wheel, entry);
            }
            if let Some(stage) = &microscope.stage {
                for hardware in &stage.hardware {
                    let mut entry = InventoryEntry::new(hardware.device_type.clone());
                    entry.serial_number.clone_from(&hardware.serial_number);
                    entry.params = hardware.params.clone();
                    push_unique(&mut inventory.stage, entry);
                }
            }
            if let Some(zoom) = &microscope.zoom {
                prefer_real(&mut inventory.zoom, entry_from(&zoom.hardware));
            }
            if let Some(mirror) = &microscope.mirror {
                prefer_real(&mut inventory.mirror, entry_from(&mirror.hardware));
            }
        }

        tracing::debug!(
            cameras = inventory.camera.len(),
            filter_wheels = inventory.filter_wheel.len(),
            stages = inventory.stage.len(),
            "derived hardware inventory"
        );
        inventory
    }

    /// Total number of devices listed.
    #[must_use]
    pub fn device_count(&self) -> usize {
        usize::from(self.daq.is_some())
            + self.camera.len()
            + self.filter_wheel.len()
            + self.stage.len()
            + usize::from(self.zoom.is_some())
            + usize::from(self.mirror.is_some())
    }
}

impl Config {
    /// Filter wheels of `microscope`, aligned with the system's wheel order.
    ///
    /// When several microscopes are defined, every wheel in the system has a
    /// fixed position: the order in which microscopes first declare it. A
    /// wheel the microscope does not declare is filled in at that position
    /// from the first microscope that does, so all microscopes see the same
    /// sequence.
    #[must_use]
    pub fn filter_wheels(&self, microscope: &str) -> Vec<&FilterWheelBlock> {
        let Some(scope) = self.microscope(microscope) else {
            return Vec::new();
        };
        let mut wheels: Vec<&FilterWheelBlock> = scope.filter_wheel.iter().flatten().collect();
        if self.microscopes.len() < 2 {
            return wheels;
        }

        let mut sequence: Vec<(String, &FilterWheelBlock)> = Vec::new();
        for wheel in self
            .microscopes
            .values()
            .flat_map(|m| m.filter_wheel.iter().flatten())
        {
            let identity = wheel_identity(wheel);
            if !sequence.iter().any(|(seen, _)| *seen == identity) {
                sequence.push((identity, wheel));
            }
        }

        let declared: Vec<String> = wheels.iter().map(|w| wheel_identity(w)).collect();
        for (position, (identity, wheel)) in sequence.into_iter().enumerate() {
            if !declared.contains(&identity) {
                wheels.insert(position.min(wheels.len()), wheel);
            }
        }
        wheels
    }
}

/// Type plus wheel number, with type aliases collapsed.
fn wheel_identity(wheel: &FilterWheelBlock) -> String {
    let device_type = &wheel.hardware.device_type;
    let name = device_type
        .kind()
        .map_or_else(|| device_type.raw().to_string(), |kind| kind.name().to_string());
    let number = wheel.wheel_number().map(|n| n.to_string()).unwrap_or_default();
    format!("{name}-{number}")
}

/// Returns `true` if `entries` holds a device matching `device_type` and,
/// when both sides carry one, `identifier`.
pub fn contains_device<K: DeviceKind>(
    entries: &[InventoryEntry<K>],
    device_type: &DeviceType<K>,
    identifier: Option<&str>,
    identify: impl Fn(&InventoryEntry<K>) -> Option<String>,
) -> bool {
    entries.iter().any(|entry| {
        same_type(&entry.device_type, device_type)
            && match (identify(entry), identifier) {
                (Some(have), Some(want)) => have == want,
                _ => true,
            }
    })
}

/// Two device types match if they resolve to the same kind, or are spelled
/// identically when unresolved.
#[must_use]
pub fn same_type<K: DeviceKind>(a: &DeviceType<K>, b: &DeviceType<K>) -> bool {
    match (a.kind(), b.kind()) {
        (Some(x), Some(y)) => x == y,
        _ => a.raw() == b.raw(),
    }
}

fn entry_from<K: DeviceKind>(hardware: &DeviceHardware<K>) -> InventoryEntry<K> {
    let mut entry = InventoryEntry::new(hardware.device_type.clone());
    entry.serial_number.clone_from(&hardware.serial_number);
    entry.params = hardware
        .params
        .iter()
        .filter(|(key, _)| key.as_str() != "name")
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    entry
}

fn push_unique<K: DeviceKind>(entries: &mut Vec<InventoryEntry<K>>, entry: InventoryEntry<K>) {
    let identity = entry.identity();
    if !entries.iter().any(|e| e.identity() == identity) {
        entries.push(entry);
    }
}

/// Keeps a single slot, letting a real device replace a synthetic one.
fn prefer_real<K: DeviceKind>(slot: &mut Option<InventoryEntry<K>>, entry: InventoryEntry<K>) {
    match slot {
        None => *slot = Some(entry),
        Some(current) if current.device_type.is_synthetic() && !entry.device_type.is_synthetic() => {
            *slot = Some(entry);
        }
        Some(_) => {}
    }
}

// ============================================================================
// Tests
// ============================================================================
