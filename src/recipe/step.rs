//! The step state machine.
//!
//! One flat [`Step`] struct tagged by [`StepKind`], with behavior supplied
//! by a per-kind table of plain `fn` pointers — no trait objects, no
//! subclass chains. Each tick the orchestrator calls into the current
//! kind's handlers with a [`StepCx`] carrying the shared I/O, the PID, the
//! live settings and the loop clock.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │  StepBehavior table                                            │
//! │  ┌───────────────┬──────────┬─────────┬──────────┬──────────┐  │
//! │  │ kind          │ on_start │ on_tick │ pid_out  │ complete │  │
//! │  ├───────────────┼──────────┼─────────┼──────────┼──────────┤  │
//! │  │ NoAction      │ all off  │    —    │    —     │  never   │  │
//! │  │ Heat          │ pump,PID │    —    │ interlock│  dwell   │  │
//! │  │ Rest          │ pump,PID │    —    │ interlock│  timer   │  │
//! │  │ RestAndConfirm│ pump,PID │    —    │ interlock│  never   │  │
//! │  │ Boil          │ contactor│  cycle  │    —     │  timer   │  │
//! │  │ Chill         │ pump     │ announce│    —     │  never   │  │
//! │  └───────────────┴──────────┴─────────┴──────────┴──────────┘  │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Safety sequencing is expressed as [`DelayedActions`] owned by the step:
//! a pump always primes before its contactor closes, and stopping a step
//! cancels everything it still had queued.

use log::info;

use crate::app::events::{BrewEvent, SnackbarVariant};
use crate::app::ports::EventSink;
use crate::config::BrewSettings;
use crate::control::{DelayedActions, Millis, Pid, PidMode, SeqAction};
use crate::error::RecipeError;
use crate::io::{BreweryIo, OutputId};
use crate::recipe::record::StepRecord;
use crate::recipe::time::Time;

// ───────────────────────────────────────────────────────────────
// Kind
// ───────────────────────────────────────────────────────────────

/// Runtime behavior class of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    NoAction,
    Heat,
    Rest,
    RestAndConfirm,
    Chill,
    Boil,
}

impl StepKind {
    /// Kinds that drive the RIMS loop (pump + element + PID).
    pub fn is_heating(self) -> bool {
        matches!(self, Self::Heat | Self::Rest | Self::RestAndConfirm)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::NoAction => "no-action",
            Self::Heat => "heat",
            Self::Rest => "rest",
            Self::RestAndConfirm => "rest-and-confirm",
            Self::Chill => "chill",
            Self::Boil => "boil",
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Context
// ───────────────────────────────────────────────────────────────

/// Everything a step handler may touch, threaded through every call.
pub struct StepCx<'a> {
    pub io: &'a mut BreweryIo,
    pub pid: &'a mut Pid,
    pub settings: &'a BrewSettings,
    pub now: Millis,
    pub sink: &'a mut dyn EventSink,
}

// ───────────────────────────────────────────────────────────────
// Behavior table
// ───────────────────────────────────────────────────────────────

type StepFn = fn(&mut Step, &mut StepCx);
type PidOutputFn = fn(&mut Step, &mut StepCx, f32);
type CompleteFn = fn(&mut Step, &mut StepCx) -> bool;

/// Strategy functions for one step kind.
struct StepBehavior {
    on_start: StepFn,
    /// Runs on every 1 s step tick, after the timers advance.
    on_tick: StepFn,
    /// Runs on every loop iteration (sub-second work, e.g. the boil cycle).
    on_service: StepFn,
    on_pid_output: PidOutputFn,
    on_stop: StepFn,
    check_complete: CompleteFn,
}

fn noop(_: &mut Step, _: &mut StepCx) {}
fn noop_pid(_: &mut Step, _: &mut StepCx, _: f32) {}
fn never_complete(_: &mut Step, _: &mut StepCx) -> bool {
    false
}

static NO_ACTION: StepBehavior = StepBehavior {
    on_start: no_action_start,
    on_tick: noop,
    on_service: noop,
    on_pid_output: noop_pid,
    on_stop: noop,
    check_complete: never_complete,
};

static HEAT: StepBehavior = StepBehavior {
    on_start: heat_start,
    on_tick: noop,
    on_service: noop,
    on_pid_output: heat_pid_output,
    on_stop: heat_stop,
    check_complete: heat_check_complete,
};

static REST: StepBehavior = StepBehavior {
    on_start: heat_start,
    on_tick: noop,
    on_service: noop,
    on_pid_output: heat_pid_output,
    on_stop: heat_stop,
    check_complete: rest_check_complete,
};

static REST_AND_CONFIRM: StepBehavior = StepBehavior {
    on_start: heat_start,
    on_tick: noop,
    on_service: noop,
    on_pid_output: heat_pid_output,
    on_stop: heat_stop,
    check_complete: never_complete,
};

static CHILL: StepBehavior = StepBehavior {
    on_start: chill_start,
    on_tick: chill_tick,
    on_service: noop,
    on_pid_output: noop_pid,
    on_stop: chill_stop,
    check_complete: never_complete,
};

static BOIL: StepBehavior = StepBehavior {
    on_start: boil_start,
    on_tick: noop,
    on_service: boil_service,
    on_pid_output: noop_pid,
    on_stop: boil_stop,
    check_complete: boil_check_complete,
};

fn behavior(kind: StepKind) -> &'static StepBehavior {
    match kind {
        StepKind::NoAction => &NO_ACTION,
        StepKind::Heat => &HEAT,
        StepKind::Rest => &REST,
        StepKind::RestAndConfirm => &REST_AND_CONFIRM,
        StepKind::Chill => &CHILL,
        StepKind::Boil => &BOIL,
    }
}

// ───────────────────────────────────────────────────────────────
// Step
// ───────────────────────────────────────────────────────────────

/// The live step. Exactly one exists per recipe at any instant.
pub struct Step {
    pub id: String,
    pub kind: StepKind,
    title: String,
    /// Target temperature (°F) for heating kinds; duty % for Boil.
    setpoint: Option<f32>,
    /// Declared duration in seconds, where the record carries one.
    duration_secs: Option<i64>,
    has_todos: bool,

    pub step_time: Time,
    pub remaining_time: Time,

    actions: DelayedActions,
    running: bool,
    next_tick_at: Millis,

    /// Heat: when the setpoint was first crossed (dwell anchor).
    reached_at: Option<Millis>,
    /// Boil: start of the next heater duty cycle.
    cycle_next_at: Option<Millis>,
    /// Chill: the one-shot "target reached" notice has been sent.
    target_announced: bool,
}

impl Step {
    /// Build a step from its record. Heating kinds without a setpoint and
    /// resting kinds without a duration are unconstructable — the
    /// orchestrator turns that into a recipe-fatal `end()`.
    pub fn from_record(record: &StepRecord) -> Result<Self, RecipeError> {
        let kind = record.step_type.kind();
        if kind.is_heating() && record.setpoint.is_none() {
            return Err(RecipeError::UnconstructableStep(
                "heating step without setpoint",
            ));
        }
        if kind == StepKind::Rest && record.step_time.is_none() {
            return Err(RecipeError::UnconstructableStep(
                "resting step without duration",
            ));
        }

        let duration_secs = record.step_time.map(|m| (m * 60.0) as i64);
        Ok(Self {
            id: record.id.clone(),
            kind,
            title: record.title.clone(),
            setpoint: record.setpoint,
            duration_secs,
            has_todos: !record.todos.is_empty(),
            step_time: Time::new(0),
            remaining_time: Time::new(duration_secs.unwrap_or(0)),
            actions: DelayedActions::new(),
            running: false,
            next_tick_at: 0,
            reached_at: None,
            cycle_next_at: None,
            target_announced: false,
        })
    }

    /// Seed timers from a persisted session (restart resume).
    pub fn seed_times(&mut self, step_secs: i64, remaining_secs: i64) {
        self.step_time = Time::new(step_secs);
        self.remaining_time = Time::new(remaining_secs);
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, cx: &mut StepCx) {
        info!("step '{}' ({}) starting", self.title, self.kind.name());
        self.running = true;
        self.next_tick_at = cx.now + 1000;
        (behavior(self.kind).on_start)(self, cx);
    }

    /// Halt the tick timer. Sequencing actions keep their deadlines; only
    /// `stop` cancels them. Not wired to a command — recipe transitions
    /// always go through `stop`.
    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn resume(&mut self, cx: &mut StepCx) {
        self.running = true;
        self.next_tick_at = cx.now + 1000;
    }

    /// Stop the step: cancel everything it still had queued, then run the
    /// kind's shutdown sequencing (heaters and contactors drop
    /// immediately; pump drain is a separate `pump_down`).
    pub fn stop(&mut self, cx: &mut StepCx) {
        self.running = false;
        self.actions.cancel_all();
        (behavior(self.kind).on_stop)(self, cx);
    }

    /// Queue the RIMS pump drain and return the deadline the orchestrator
    /// must wait for before starting a non-heating successor.
    pub fn pump_down(&mut self, cx: &mut StepCx) -> Millis {
        let deadline = cx.now + cx.settings.timing.pump_down_ms as Millis;
        self.actions.schedule(deadline, SeqAction::AutoOff(OutputId::Pump1));
        deadline
    }

    /// Hand the remaining delayed actions to the orchestrator so they can
    /// finish firing after the step object is discarded.
    pub fn take_actions(&mut self) -> DelayedActions {
        core::mem::take(&mut self.actions)
    }

    // ── Per-iteration servicing ───────────────────────────────

    /// Sub-second work: fire due delayed actions, run the kind's service
    /// hook (boil duty cycle).
    pub fn service(&mut self, cx: &mut StepCx) {
        self.actions.poll(cx.now, cx.io, cx.pid, cx.sink);
        (behavior(self.kind).on_service)(self, cx);
    }

    /// The 1 s step tick: advance `step_time`, count down `remaining_time`
    /// when a duration was declared, then run the kind's tick hook.
    pub fn tick(&mut self, cx: &mut StepCx) {
        if !self.running {
            return;
        }
        while cx.now >= self.next_tick_at {
            self.next_tick_at += 1000;
            self.step_time.increment();
            if self.duration_secs.is_some() {
                self.remaining_time.decrement();
            }
            (behavior(self.kind).on_tick)(self, cx);
        }
    }

    /// Feed one PID output event into the kind's consumer.
    pub fn pid_output(&mut self, cx: &mut StepCx, output: f32) {
        (behavior(self.kind).on_pid_output)(self, cx, output);
    }

    /// The kind's completion predicate. Defaults to never.
    pub fn check_complete(&mut self, cx: &mut StepCx) -> bool {
        (behavior(self.kind).check_complete)(self, cx)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Base setpoint plus the live adjustment.
    pub fn effective_setpoint(&self, settings: &BrewSettings) -> f32 {
        self.setpoint.unwrap_or(0.0) + settings.rims.setpoint_adjust
    }

    fn boil_duty_percent(&self, settings: &BrewSettings) -> f32 {
        self.setpoint
            .unwrap_or(settings.boil.duty_percent)
            .clamp(0.0, 100.0)
    }
}

// ───────────────────────────────────────────────────────────────
// NoAction
// ───────────────────────────────────────────────────────────────

fn no_action_start(step: &mut Step, cx: &mut StepCx) {
    // Elements and contactors drop instantly; the pumps run on briefly to
    // carry residual heat out of the RIMS tube.
    cx.io.auto_off(OutputId::Heat1, cx.sink);
    cx.io.auto_off(OutputId::Heat2, cx.sink);
    cx.io.auto_off(OutputId::Contactor1, cx.sink);
    cx.io.auto_off(OutputId::Contactor2, cx.sink);

    let off_at = cx.now + cx.settings.timing.no_action_pump_off_ms as Millis;
    step.actions.schedule(off_at, SeqAction::AutoOff(OutputId::Pump1));
    step.actions.schedule(off_at, SeqAction::AutoOff(OutputId::Pump2));
}

// ───────────────────────────────────────────────────────────────
// Heat / Rest / RestAndConfirm
// ───────────────────────────────────────────────────────────────

fn heat_start(step: &mut Step, cx: &mut StepCx) {
    let rims = &cx.settings.rims;
    cx.pid.set_time_interval(rims.sample_time_ms);
    cx.pid.set_tuning(rims.proportional, rims.integral, rims.derivative);
    cx.pid.set_output_limits(cx.pid.out_min(), rims.max_output);
    cx.pid.set_target(step.effective_setpoint(cx.settings));
    cx.pid.set_mode(PidMode::Auto);
    if let Some(t1) = cx.io.read_temps().temp1 {
        cx.pid.set_input(t1);
    }

    // Pump primes first; only then may the contactor close and the PID
    // start pulsing the element.
    let timing = &cx.settings.timing;
    step.actions.schedule(
        cx.now + timing.heat_pump_on_ms as Millis,
        SeqAction::AutoOn(OutputId::Pump1),
    );
    step.actions.schedule(
        cx.now + timing.heat_contactor_on_ms as Millis,
        SeqAction::AutoOn(OutputId::Contactor1),
    );
    step.actions.schedule(
        cx.now + timing.heat_contactor_on_ms as Millis,
        SeqAction::StartPid,
    );
}

fn heat_stop(_step: &mut Step, cx: &mut StepCx) {
    cx.pid.stop_loop();
    cx.io.auto_off(OutputId::Heat1, cx.sink);
    cx.io.auto_off(OutputId::Contactor1, cx.sink);
}

/// Consume one PID output: refresh the loop from live settings, then pulse
/// the element for `duty × interval`, gated by the dry-fire interlock.
fn heat_pid_output(step: &mut Step, cx: &mut StepCx, output: f32) {
    cx.sink.emit(&BrewEvent::ElementDuty {
        rims: output,
        boil: 0.0,
    });

    // Heating is always referenced to the RIMS tube probe.
    if let Some(t1) = cx.io.read_temps().temp1 {
        cx.pid.set_input(t1);
    }

    // The user may retune mid-step; pick the changes up every cycle.
    let rims = &cx.settings.rims;
    cx.pid.set_target(step.effective_setpoint(cx.settings));
    cx.pid.set_tuning(rims.proportional, rims.integral, rims.derivative);
    cx.pid.set_output_limits(cx.pid.out_min(), rims.max_output);
    if cx.pid.sample_time_ms() != rims.sample_time_ms {
        cx.pid.set_time_interval(rims.sample_time_ms);
    }

    // Dry-fire interlock: the element is never commanded on unless the
    // pump's *physical* line reads on, right now.
    let pump_live = cx.io.current_value(OutputId::Pump1).unwrap_or(false);
    if !pump_live {
        cx.io.auto_off(OutputId::Heat1, cx.sink);
        return;
    }

    let duty = output / 100.0;
    let interval = cx.pid.sample_time_ms() as f32;
    let margin = cx.settings.timing.heat_pulse_margin_ms as f32;
    let on_ms = (duty * interval - margin).max(0.0) as Millis;
    if on_ms > 0 {
        cx.io.auto_on(OutputId::Heat1, cx.sink);
        step.actions
            .schedule(cx.now + on_ms, SeqAction::AutoOff(OutputId::Heat1));
    } else {
        cx.io.auto_off(OutputId::Heat1, cx.sink);
    }
}

fn heat_check_complete(step: &mut Step, cx: &mut StepCx) -> bool {
    let Some(t1) = cx.io.read_temps().temp1 else {
        return false;
    };
    if step.reached_at.is_none() && t1 >= step.effective_setpoint(cx.settings) {
        info!("step '{}' reached setpoint, dwelling", step.title);
        step.reached_at = Some(cx.now);
    }
    match step.reached_at {
        Some(at) => cx.now.saturating_sub(at) >= cx.settings.timing.heat_dwell_secs as Millis * 1000,
        None => false,
    }
}

fn rest_check_complete(step: &mut Step, _cx: &mut StepCx) -> bool {
    step.duration_secs
        .is_some_and(|d| step.step_time.value() >= d)
}

// ───────────────────────────────────────────────────────────────
// Chill
// ───────────────────────────────────────────────────────────────

fn chill_start(step: &mut Step, cx: &mut StepCx) {
    step.actions.schedule(
        cx.now + cx.settings.timing.chill_pump_on_ms as Millis,
        SeqAction::AutoOn(OutputId::Pump2),
    );
}

fn chill_stop(_step: &mut Step, cx: &mut StepCx) {
    cx.io.auto_off(OutputId::Pump2, cx.sink);
}

fn chill_tick(step: &mut Step, cx: &mut StepCx) {
    // Informational only — chilling never auto-completes.
    if step.target_announced {
        return;
    }
    let (Some(target), Some(t2)) = (step.setpoint, cx.io.read_temps().temp2) else {
        return;
    };
    if t2 <= target {
        step.target_announced = true;
        cx.sink.emit(&BrewEvent::Snackbar {
            message: "Wort has reached the target temperature.".into(),
            variant: SnackbarVariant::Success,
        });
    }
}

// ───────────────────────────────────────────────────────────────
// Boil
// ───────────────────────────────────────────────────────────────

fn boil_start(step: &mut Step, cx: &mut StepCx) {
    let at = cx.now + cx.settings.timing.boil_contactor_on_ms as Millis;
    step.actions
        .schedule(at, SeqAction::AutoOn(OutputId::Contactor2));
    step.cycle_next_at = Some(at);
}

fn boil_stop(step: &mut Step, cx: &mut StepCx) {
    step.cycle_next_at = None;
    cx.io.auto_off(OutputId::Heat2, cx.sink);
    cx.io.auto_off(OutputId::Contactor2, cx.sink);
}

/// Fixed-period proportional duty cycle: the element is on for
/// `duty% × cycle − margin` out of every cycle.
fn boil_service(step: &mut Step, cx: &mut StepCx) {
    let Some(cycle_start) = step.cycle_next_at else {
        return;
    };
    if cx.now < cycle_start {
        return;
    }

    let duty = step.boil_duty_percent(cx.settings);
    let cycle = cx.settings.boil.cycle_ms as Millis;
    let on_ms = (duty / 100.0 * cycle as f32
        - cx.settings.boil.element_margin_ms as f32)
        .max(0.0) as Millis;

    if on_ms > 0 {
        cx.io.auto_on(OutputId::Heat2, cx.sink);
        step.actions
            .schedule(cycle_start + on_ms, SeqAction::AutoOff(OutputId::Heat2));
    } else {
        cx.io.auto_off(OutputId::Heat2, cx.sink);
    }
    cx.sink.emit(&BrewEvent::ElementDuty {
        rims: 0.0,
        boil: duty,
    });

    // Next cycle keeps the fixed period; missed cycles are skipped, not
    // replayed.
    let mut next = cycle_start + cycle;
    while next <= cx.now {
        next += cycle;
    }
    step.cycle_next_at = Some(next);
}

fn boil_check_complete(step: &mut Step, _cx: &mut StepCx) -> bool {
    // Outstanding todos hold the boil open even past its timer.
    !step.has_todos
        && step
            .duration_secs
            .is_some_and(|d| step.step_time.value() >= d)
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
