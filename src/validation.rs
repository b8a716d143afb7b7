//! Structural validation of project configurations.
//!
//! Validation is deliberately separate from mutation: the store's edit API
//! never runs this pass, so a pin collision can exist transiently in memory
//! while the user rearranges a panel. The pass runs on load and on explicit
//! request, and its walk order is fixed (inputs in list order with primary,
//! secondary, button pins, then displays' chip-select pins) so that the same
//! configuration always produces the same error message.

use crate::error::{AppResult, PanelError};
use crate::model::ProjectConfiguration;
use std::collections::HashSet;

/// Validate the structural invariants of a configuration.
///
/// Fails if the version field is empty or if any pin is claimed more than
/// once across all inputs and displays. The error names the duplicated pin
/// and the role in which it was encountered.
pub fn validate(config: &ProjectConfiguration) -> AppResult<()> {
    if config.version.is_empty() {
        return Err(PanelError::Validation(
            "Configuration version is missing".to_string(),
        ));
    }

    let mut used_pins = HashSet::new();

    for input in &config.inputs {
        claim(&mut used_pins, input.pin, "primary pin", &input.name)?;
        if let Some(pin2) = input.pin2 {
            claim(&mut used_pins, pin2, "secondary pin", &input.name)?;
        }
        if let Some(button_pin) = input.button_pin {
            claim(&mut used_pins, button_pin, "button pin", &input.name)?;
        }
    }

    for display in &config.displays {
        claim(&mut used_pins, display.cs_pin, "chip-select pin", &display.name)?;
    }

    Ok(())
}

fn claim(used: &mut HashSet<u8>, pin: u8, role: &str, owner: &str) -> AppResult<()> {
    if !used.insert(pin) {
        return Err(PanelError::Validation(format!(
            "Duplicate pin assignment: pin {pin} ({role} of '{owner}') is already in use"
        )));
    }
    Ok(())
}
