//! Event sink adapter that writes structured log lines.
//!
//! The default sink on the rig: every core notification becomes a log
//! record the serial console (or journal) can follow. A socket-relay sink
//! replaces or wraps this when a frontend is attached.

use log::{debug, info};

use crate::app::events::BrewEvent;
use crate::app::ports::EventSink;

/// Logs every [`BrewEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &BrewEvent) {
        match event {
            BrewEvent::OutputUpdate {
                name,
                display_name,
                value,
            } => info!("output {name} ({display_name}) -> {}", u8::from(*value)),

            // Once-per-second chatter stays out of the info log.
            BrewEvent::Time {
                total_time,
                step_time,
                remaining_time,
            } => debug!("time total={total_time} step={step_time} remaining={remaining_time}"),
            BrewEvent::NewTemperature(t) => debug!(
                "temps rims={:?} wort={:?} hlt={:?}",
                t.temp1, t.temp2, t.temp3
            ),
            BrewEvent::ElementDuty { rims, boil } => {
                debug!("element duty rims={rims:.1}% boil={boil:.1}%")
            }

            BrewEvent::RecipeUpdated { recipe_id, steps } => {
                let done = steps.iter().filter(|s| s.complete).count();
                info!("recipe {recipe_id} updated ({done}/{} steps done)", steps.len());
            }
            BrewEvent::Snackbar { message, variant } => info!("[{variant:?}] {message}"),
            BrewEvent::EndRecipe => info!("recipe ended"),
        }
    }
}
