//! `inventory` command

use serde_json::json;

use crate::cli::args::{InventoryArgs, OutputFormat};
use crate::config::{DeviceKind, HardwareInventory, InventoryEntry, InventorySource};
use crate::error::ScopeError;

/// Print the hardware inventory.
///
/// # Errors
///
/// Returns a load error or a serialization error.
pub fn run(args: &InventoryArgs) -> Result<(), ScopeError> {
    let result = super::load(&args.config.files)?;
    super::log_issues(&result);

    let inventory = result.config.hardware_inventory();
    let source = match inventory.source {
        InventorySource::Declared => "declared",
        InventorySource::Derived => "derived",
    };

    match args.format {
        OutputFormat::Human => {
            println!("Hardware inventory ({source}, {} devices)", inventory.device_count());
            for line in human_lines(inventory) {
                println!("  {line}");
            }
        }
        OutputFormat::Json => {
            let report = json!({
                "source": source,
                "devices": inventory.device_count(),
                "inventory": inventory,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

fn human_lines(inventory: &HardwareInventory) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(daq) = &inventory.daq {
        lines.push(format!("daq: {}", describe(daq)));
    }
    lines.extend(inventory.camera.iter().map(|e| format!("camera: {}", describe(e))));
    lines.extend(
        inventory
            .filter_wheel
            .iter()
            .map(|e| format!("filter_wheel: {}", describe(e))),
    );
    lines.extend(inventory.stage.iter().map(|e| format!("stage: {}", describe(e))));
    if let Some(zoom) = &inventory.zoom {
        lines.push(format!("zoom: {}", describe(zoom)));
    }
    if let Some(mirror) = &inventory.mirror {
        lines.push(format!("mirror: {}", describe(mirror)));
    }
    lines
}

fn describe<K: DeviceKind>(entry: &InventoryEntry<K>) -> String {
    let mut text = entry.device_type.to_string();
    if let Some(serial) = &entry.serial_number {
        text.push_str(&format!(" (serial {serial})"));
    }
    if let Some(wheel) = entry.wheel_number {
        text.push_str(&format!(" (wheel {wheel})"));
    }
    if entry.device_type.kind().is_none() {
        text.push_str(" [unsupported]");
    }
    text
}
