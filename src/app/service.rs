//! Application service — the hardware-agnostic core.
//!
//! [`BrewService`] owns the shared I/O, the PID, the live settings and the
//! active [`Recipe`], and exposes exactly two entry points to the outside:
//! [`tick`](BrewService::tick), called once per loop iteration with the
//! monotonic clock, and [`handle_command`](BrewService::handle_command) for
//! the manual command surface.
//!
//! ```text
//!  AdcPort ──▶ ┌───────────────────────────┐ ──▶ EventSink
//!              │        BrewService         │
//! OutputPort ◀─│  Recipe · Step · PID · IO  │◀── BrewCommand
//!              └───────────────────────────┘
//! ```

use log::{info, warn};

use crate::config::BrewSettings;
use crate::control::{Millis, Pid};
use crate::io::BreweryIo;
use crate::recipe::record::StepRecord;
use crate::recipe::step::StepCx;
use crate::recipe::{Recipe, SavedTimes};

use super::commands::{BrewCommand, OutputMode};
use super::events::{BrewEvent, SnackbarVariant};
use super::ports::EventSink;

/// The application service orchestrating all domain logic.
pub struct BrewService {
    io: BreweryIo,
    pid: Pid,
    settings: BrewSettings,
    recipe: Option<Recipe>,
    /// Next once-per-second temperature broadcast.
    next_temp_at: Millis,
}

impl BrewService {
    /// Construct the service around the hardware abstraction. No recipe is
    /// loaded; the controller idles until one arrives.
    pub fn new(io: BreweryIo, settings: BrewSettings) -> Self {
        let mut pid = Pid::new();
        pid.set_time_interval(settings.rims.sample_time_ms);
        pid.set_tuning(
            settings.rims.proportional,
            settings.rims.integral,
            settings.rims.derivative,
        );
        pid.set_output_limits(0.0, settings.rims.max_output);

        Self {
            io,
            pid,
            settings,
            recipe: None,
            next_temp_at: 0,
        }
    }

    // ── Per-iteration orchestration ───────────────────────────

    /// One pass of the control loop: sample temperatures, broadcast the
    /// once-per-second reading, and drive the recipe.
    pub fn tick(&mut self, now: Millis, sink: &mut dyn EventSink) {
        self.io.poll_temps(now);

        if now >= self.next_temp_at {
            self.next_temp_at = now + 1000;
            sink.emit(&BrewEvent::NewTemperature(self.io.read_temps()));
        }

        let Self {
            io,
            pid,
            settings,
            recipe,
            ..
        } = self;
        if let Some(recipe) = recipe.as_mut() {
            let mut cx = StepCx {
                io,
                pid,
                settings,
                now,
                sink,
            };
            recipe.tick(&mut cx);
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process one external command. All of these may arrive at any time,
    /// from any adapter.
    pub fn handle_command(&mut self, cmd: BrewCommand, now: Millis, sink: &mut dyn EventSink) {
        match cmd {
            BrewCommand::StartBrew => {
                if self.recipe.is_none() {
                    warn!("start requested with no recipe loaded");
                    sink.emit(&BrewEvent::Snackbar {
                        message: "No recipe loaded.".into(),
                        variant: SnackbarVariant::Warning,
                    });
                    return;
                }
                self.with_recipe(now, sink, |recipe, cx| recipe.start(cx));
            }

            BrewCommand::CompleteStep { id } => {
                info!("completing step {id}");
                self.with_recipe(now, sink, |recipe, cx| recipe.next_step(cx));
            }

            BrewCommand::CompleteTodo { id } => {
                info!("completing todo {id}");
                self.with_recipe(now, sink, |recipe, cx| recipe.complete_todo(&id, cx));
            }

            BrewCommand::SetOutput { output, mode } => {
                info!("manual output update: {output} -> {mode:?}");
                match mode {
                    OutputMode::ForceOff => self.io.override_off(output, sink),
                    OutputMode::ForceOn => self.io.override_on(output, sink),
                    OutputMode::Auto => self.io.set_auto(output, sink),
                }
            }

            BrewCommand::UpdateSettings(settings) => {
                info!("settings updated");
                self.pid.set_tuning(
                    settings.rims.proportional,
                    settings.rims.integral,
                    settings.rims.derivative,
                );
                self.pid
                    .set_output_limits(self.pid.out_min(), settings.rims.max_output);
                self.settings = settings;
            }

            BrewCommand::LoadRecipe { recipe_id, steps } => {
                self.load_recipe(recipe_id, steps, None, now, sink);
            }

            BrewCommand::Quit => {
                info!("quit requested");
                if self.recipe.is_some() {
                    self.with_recipe(now, sink, |recipe, cx| recipe.quit(cx));
                } else {
                    self.io.unexport_all(sink);
                }
            }
        }
    }

    /// Replace the running recipe. The previous one is quit — every output
    /// de-energized and released — before the bank is re-armed for the new
    /// session.
    pub fn load_recipe(
        &mut self,
        recipe_id: String,
        steps: Vec<StepRecord>,
        resume: Option<SavedTimes>,
        now: Millis,
        sink: &mut dyn EventSink,
    ) {
        info!("new recipe '{recipe_id}' ({} steps)", steps.len());
        if self.recipe.is_some() {
            self.with_recipe(now, sink, |recipe, cx| recipe.quit(cx));
        }
        self.io.rearm(sink);
        self.recipe = Some(Recipe::new(recipe_id, steps, resume));

        // Sync the frontend: fresh timers and current output states.
        let zero = crate::recipe::time::Time::new(0).to_string();
        sink.emit(&BrewEvent::Time {
            total_time: zero.clone(),
            step_time: zero.clone(),
            remaining_time: zero,
        });
        self.emit_output_snapshot(sink);
    }

    /// Emit the current state of every output — used when a frontend
    /// (re)connects and after a recipe swap.
    pub fn emit_output_snapshot(&self, sink: &mut dyn EventSink) {
        for state in self.io.snapshot() {
            sink.emit(&BrewEvent::OutputUpdate {
                name: state.id.name(),
                display_name: state.id.display_name(),
                value: state.value,
            });
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn recipe(&self) -> Option<&Recipe> {
        self.recipe.as_ref()
    }

    pub fn settings(&self) -> &BrewSettings {
        &self.settings
    }

    pub fn pid(&self) -> &Pid {
        &self.pid
    }

    pub fn io(&self) -> &BreweryIo {
        &self.io
    }

    // ── Internal ──────────────────────────────────────────────

    fn with_recipe(
        &mut self,
        now: Millis,
        sink: &mut dyn EventSink,
        f: impl FnOnce(&mut Recipe, &mut StepCx),
    ) {
        let Self {
            io,
            pid,
            settings,
            recipe,
            ..
        } = self;
        if let Some(recipe) = recipe.as_mut() {
            let mut cx = StepCx {
                io,
                pid,
                settings,
                now,
                sink,
            };
            f(recipe, &mut cx);
        }
    }
}
