//! Outbound application events.
//!
//! The core emits these through the [`EventSink`](super::ports::EventSink)
//! port. Adapters on the other side decide what to do with them — log to
//! serial, push over a websocket, update a display. One typed enum replaces
//! the ad hoc named-event fan-out of older controller generations: a single
//! subscriber sees every notification the control loop raises.

use crate::recipe::record::StepRecord;
use crate::sensors::TempSnapshot;

/// Structured events emitted by the control core.
#[derive(Debug, Clone)]
pub enum BrewEvent {
    /// A physical output changed (automated write or manual override).
    OutputUpdate {
        name: &'static str,
        display_name: &'static str,
        value: bool,
    },

    /// Once per second while brewing: total / step / remaining, formatted
    /// `HH:MM:SS`.
    Time {
        total_time: String,
        step_time: String,
        remaining_time: String,
    },

    /// Once per second: the averaged reading of all three thermistors.
    NewTemperature(TempSnapshot),

    /// Duty output of the heating elements (% of each control interval).
    ElementDuty { rims: f32, boil: f32 },

    /// The recipe snapshot changed (step or todo completed) — outer layers
    /// persist it and sync the frontend.
    RecipeUpdated {
        recipe_id: String,
        steps: Vec<StepRecord>,
    },

    /// User-facing status text.
    Snackbar {
        message: String,
        variant: SnackbarVariant,
    },

    /// The full step list has completed.
    EndRecipe,
}

/// Severity tag for [`BrewEvent::Snackbar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnackbarVariant {
    Info,
    Success,
    Warning,
    Error,
}
