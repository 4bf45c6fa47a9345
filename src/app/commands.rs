//! Inbound commands to the control core.
//!
//! These represent actions requested by the outside world (socket relay,
//! serial console, provisioning) that the
//! [`BrewService`](super::service::BrewService) interprets and acts upon.
//! Any of them may arrive at any point in a brew.

use crate::config::BrewSettings;
use crate::io::OutputId;
use crate::recipe::record::StepRecord;

/// Commands that external adapters can send into the control core.
#[derive(Debug, Clone)]
pub enum BrewCommand {
    /// Begin executing the loaded recipe from its first incomplete step.
    StartBrew,

    /// Force-complete the current step and advance.
    CompleteStep { id: String },

    /// Mark a single todo inside the active step as done.
    CompleteTodo { id: String },

    /// Manually pin an output, or hand it back to automated control.
    SetOutput { output: OutputId, mode: OutputMode },

    /// Hot-reload the live settings (PID gains, limits, boil duty, ...).
    UpdateSettings(BrewSettings),

    /// Replace the running recipe. The previous recipe is quit (all
    /// outputs de-energized) before the new one is installed.
    LoadRecipe {
        recipe_id: String,
        steps: Vec<StepRecord>,
    },

    /// Shut the controller down: quit the recipe and release every output.
    Quit,
}

/// Manual override tri-state, using the wire convention of the frontend:
/// `-1` = force off, `1` = force on, `0` = return to automated control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    ForceOff,
    ForceOn,
    Auto,
}

impl OutputMode {
    /// Decode the `-1 / 0 / 1` wire value.
    pub fn from_wire(value: i8) -> Self {
        match value {
            -1 => Self::ForceOff,
            1 => Self::ForceOn,
            _ => Self::Auto,
        }
    }
}
