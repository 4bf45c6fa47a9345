//! The recipe orchestrator.
//!
//! Owns the ordered step records, the single live [`Step`], and the
//! transition protocol between steps. The protocol is what keeps the
//! hardware safe across step boundaries: the outgoing step is stopped (its
//! queued actions cancelled, heaters and contactors dropped), its pump
//! drain — when one is needed — is allowed to finish, and only then is the
//! incoming step constructed and started. Two steps never drive the
//! outputs concurrently.
//!
//! ```text
//!  current completes ──▶ mark record complete ──▶ stop + pump-down
//!        ▲                                             │ (drain)
//!        └────────────── start next ◀──────────────────┘
//! ```

pub mod record;
pub mod step;
pub mod time;

use log::{error, info};

use crate::app::events::{BrewEvent, SnackbarVariant};
use crate::control::{DelayedActions, Millis};
use crate::recipe::record::StepRecord;
use crate::recipe::step::{Step, StepCx};
use crate::recipe::time::Time;

/// Timer values persisted by an outer layer, restored after a restart.
#[derive(Debug, Clone, Copy)]
pub struct SavedTimes {
    pub total_secs: i64,
    pub step_secs: i64,
    pub remaining_secs: i64,
}

/// A step swap in flight: the outgoing step's drain actions finish firing
/// before the step at `index` is constructed and started.
struct PendingTransition {
    index: usize,
    ready_at: Millis,
    drain: DelayedActions,
    carry: Option<(i64, i64)>,
}

/// The recipe orchestrator. One per brew session.
pub struct Recipe {
    recipe_id: String,
    steps: Vec<StepRecord>,
    current: Option<Step>,
    total_time: Time,
    is_brewing: bool,
    ended: bool,
    pending: Option<PendingTransition>,
    next_second_at: Millis,
    resume: Option<SavedTimes>,
}

impl Recipe {
    /// Install a recipe. Nothing runs until [`start`](Self::start).
    /// `resume` restores timer values from a prior session; already
    /// complete steps are skipped naturally.
    pub fn new(
        recipe_id: impl Into<String>,
        steps: Vec<StepRecord>,
        resume: Option<SavedTimes>,
    ) -> Self {
        Self {
            recipe_id: recipe_id.into(),
            steps,
            current: None,
            total_time: Time::new(resume.map_or(0, |t| t.total_secs)),
            is_brewing: false,
            ended: false,
            pending: None,
            next_second_at: 0,
            resume,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Begin brewing: the total-time clock starts and the first incomplete
    /// step is entered.
    pub fn start(&mut self, cx: &mut StepCx) {
        if self.is_brewing || self.ended {
            return;
        }
        info!("starting recipe '{}'", self.recipe_id);
        self.is_brewing = true;
        self.next_second_at = cx.now + 1000;
        self.next_step(cx);
    }

    /// Graceful completion: de-energize, release, and announce.
    /// Idempotent.
    pub fn end(&mut self, cx: &mut StepCx) {
        if self.ended {
            return;
        }
        info!("recipe '{}' complete", self.recipe_id);
        self.ended = true;
        self.is_brewing = false;
        if let Some(mut p) = self.pending.take() {
            p.drain.cancel_all();
        }
        if let Some(mut cur) = self.current.take() {
            cur.stop(cx);
        }
        cx.pid.stop_loop();
        cx.io.unexport_all(cx.sink);
        cx.sink.emit(&BrewEvent::Snackbar {
            message: "All steps have been completed.".into(),
            variant: SnackbarVariant::Success,
        });
        cx.sink.emit(&BrewEvent::EndRecipe);
    }

    /// Abrupt termination (process signal, recipe replacement): identical
    /// de-energization to `end`, minus the graceful bookkeeping.
    /// Idempotent.
    pub fn quit(&mut self, cx: &mut StepCx) {
        if self.ended {
            return;
        }
        info!("quitting recipe '{}'", self.recipe_id);
        self.ended = true;
        self.is_brewing = false;
        if let Some(mut p) = self.pending.take() {
            p.drain.cancel_all();
        }
        if let Some(mut cur) = self.current.take() {
            cur.stop(cx);
        }
        cx.pid.stop_loop();
        cx.io.unexport_all(cx.sink);
    }

    // ── The control tick ──────────────────────────────────────

    /// One pass of the cooperative loop: finish any in-flight transition,
    /// advance the clocks, service the live step, and advance on
    /// completion.
    pub fn tick(&mut self, cx: &mut StepCx) {
        if self.ended {
            return;
        }

        // Drain an in-flight transition before anything else: the next
        // step must not start while the old one's pump is still clearing.
        let drained = if let Some(p) = self.pending.as_mut() {
            p.drain.poll(cx.now, cx.io, cx.pid, cx.sink);
            cx.now >= p.ready_at && p.drain.is_empty()
        } else {
            false
        };
        if drained {
            let p = self.pending.take().expect("pending checked above");
            self.enter_step(p, cx);
        }

        if self.is_brewing {
            while cx.now >= self.next_second_at {
                self.next_second_at += 1000;
                self.total_time.increment();
                self.emit_time(cx);
            }
        }

        let mut completed = false;
        if let Some(step) = self.current.as_mut() {
            step.service(cx);
            step.tick(cx);
            if let Some(output) = cx.pid.compute(cx.now) {
                step.pid_output(cx, output);
            }
            completed = step.check_complete(cx);
            if completed {
                info!("step '{}' complete", step.id);
            }
        }
        if completed {
            self.next_step(cx);
        }
    }

    // ── Step transitions ──────────────────────────────────────

    /// Advance to the next incomplete step. Also the handler for the
    /// external complete-step command.
    pub fn next_step(&mut self, cx: &mut StepCx) {
        if self.ended {
            return;
        }
        if self.pending.is_some() {
            // A transition is already draining; completing twice is a
            // no-op, not a double advance.
            return;
        }

        // 1. Mark the outgoing step's record complete and push the
        // mutated snapshot out for persistence.
        if let Some(cur) = &self.current {
            if let Some(rec) = self.steps.iter_mut().find(|r| r.id == cur.id) {
                rec.complete = true;
            }
        }
        self.emit_recipe_updated(cx);

        // 2. Find the first remaining incomplete record.
        let Some(index) = self.steps.iter().position(|r| !r.complete) else {
            self.end(cx);
            return;
        };
        let incoming_heats = self.steps[index].step_type.kind().is_heating();

        // 3. Stop the outgoing step; drain its pump when the incoming
        // kind no longer needs the RIMS loop.
        let mut ready_at = cx.now;
        let mut drain = DelayedActions::new();
        if let Some(mut cur) = self.current.take() {
            cur.stop(cx);
            if cur.kind.is_heating() && !incoming_heats {
                ready_at = cur.pump_down(cx);
            }
            drain = cur.take_actions();
        }

        let carry = self
            .resume
            .take()
            .map(|t| (t.step_secs, t.remaining_secs));
        self.pending = Some(PendingTransition {
            index,
            ready_at,
            drain,
            carry,
        });
    }

    fn enter_step(&mut self, p: PendingTransition, cx: &mut StepCx) {
        match Step::from_record(&self.steps[p.index]) {
            Ok(mut step) => {
                if let Some((step_secs, remaining_secs)) = p.carry {
                    step.seed_times(step_secs, remaining_secs);
                }
                step.start(cx);
                self.current = Some(step);
            }
            Err(e) => {
                // Never leave an undefined automated hardware state
                // behind an unbuildable step.
                error!("cannot construct next step: {e}");
                self.end(cx);
            }
        }
    }

    // ── External mutations ────────────────────────────────────

    /// Mark a todo inside any step record as complete.
    pub fn complete_todo(&mut self, id: &str, cx: &mut StepCx) {
        let mut found = false;
        for rec in &mut self.steps {
            for todo in &mut rec.todos {
                if todo.id == id {
                    todo.complete = true;
                    found = true;
                }
            }
        }
        if found {
            self.emit_recipe_updated(cx);
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn recipe_id(&self) -> &str {
        &self.recipe_id
    }

    pub fn is_brewing(&self) -> bool {
        self.is_brewing
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }

    pub fn current_step(&self) -> Option<&Step> {
        self.current.as_ref()
    }

    pub fn current_step_id(&self) -> Option<&str> {
        self.current.as_ref().map(|s| s.id.as_str())
    }

    pub fn total_time(&self) -> Time {
        self.total_time
    }

    // ── Internal ──────────────────────────────────────────────

    fn emit_time(&self, cx: &mut StepCx) {
        let (step_time, remaining_time) = match &self.current {
            Some(s) => (s.step_time.to_string(), s.remaining_time.to_string()),
            None => (Time::new(0).to_string(), Time::new(0).to_string()),
        };
        cx.sink.emit(&BrewEvent::Time {
            total_time: self.total_time.to_string(),
            step_time,
            remaining_time,
        });
    }

    fn emit_recipe_updated(&self, cx: &mut StepCx) {
        cx.sink.emit(&BrewEvent::RecipeUpdated {
            recipe_id: self.recipe_id.clone(),
            steps: self.steps.clone(),
        });
    }
}
