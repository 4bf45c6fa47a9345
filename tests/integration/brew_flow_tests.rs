//! Full brew-session flows: command in, physical levels out.

use crate::mock_hw::{mock_rig, HwHandles, RecordingSink, COLD_RAW, HOT_RAW};
use brewrig::app::commands::{BrewCommand, OutputMode};
use brewrig::app::events::BrewEvent;
use brewrig::app::service::BrewService;
use brewrig::config::BrewSettings;
use brewrig::io::OutputId;
use brewrig::recipe::record::{StepRecord, StepType, Todo};

// ── Harness ──────────────────────────────────────────────────

struct Harness {
    svc: BrewService,
    sink: RecordingSink,
    hw: HwHandles,
    now: u64,
}

impl Harness {
    fn new() -> Self {
        let (io, hw) = mock_rig();
        Self {
            svc: BrewService::new(io, BrewSettings::default()),
            sink: RecordingSink::new(),
            hw,
            now: 0,
        }
    }

    fn load_and_start(&mut self, steps: Vec<StepRecord>) {
        self.cmd(BrewCommand::LoadRecipe {
            recipe_id: "test-brew".into(),
            steps,
        });
        self.cmd(BrewCommand::StartBrew);
        self.run_for(100);
    }

    fn cmd(&mut self, cmd: BrewCommand) {
        self.svc.handle_command(cmd, self.now, &mut self.sink);
    }

    /// Advance simulated time in 50 ms strides.
    fn run_for(&mut self, ms: u64) {
        let end = self.now + ms;
        while self.now < end {
            self.now += 50;
            self.svc.tick(self.now, &mut self.sink);
        }
    }

    fn current_id(&self) -> Option<&str> {
        self.svc.recipe().and_then(|r| r.current_step_id())
    }

    fn complete_current(&mut self) {
        let id = self.current_id().unwrap_or("?").to_string();
        self.cmd(BrewCommand::CompleteStep { id });
        self.run_for(100);
    }
}

// ── The canonical session ────────────────────────────────────

#[test]
fn full_session_runs_every_step_kind() {
    let mut h = Harness::new();
    h.load_and_start(vec![
        StepRecord::new("prep", StepType::PrepareStrikeWater),
        StepRecord::new("strike", StepType::Heating).with_setpoint(150.0),
        StepRecord::new("mash", StepType::Resting)
            .with_setpoint(152.0)
            .with_step_time(1.0),
        StepRecord::new("sparge", StepType::Sparge).with_setpoint(168.0),
        StepRecord::new("boil", StepType::Boil)
            .with_setpoint(100.0)
            .with_step_time(1.0),
        StepRecord::new("chill", StepType::Chilling).with_setpoint(80.0),
    ]);

    // 1. NoAction prep step.
    assert_eq!(h.current_id(), Some("prep"));
    h.complete_current();

    // 2. Heat: pump primes at 5 s, contactor + PID at 8 s.
    assert_eq!(h.current_id(), Some("strike"));
    h.run_for(4000);
    assert!(!h.hw.level(OutputId::Pump1));
    h.run_for(1500);
    assert!(h.hw.level(OutputId::Pump1), "pump primed");
    assert!(!h.hw.level(OutputId::Contactor1));
    h.run_for(3000);
    assert!(h.hw.level(OutputId::Contactor1), "contactor closed");

    // The wort comes up to temperature; completion waits out the dwell.
    h.hw.set_raw(0, HOT_RAW);
    h.run_for(2000); // smoothing window fills
    h.run_for(30_000);
    assert_eq!(h.current_id(), Some("strike"), "still dwelling");
    h.run_for(35_000);

    // 3. Rest: heating→heating keeps the pump running, then the timer
    // completes the step on its own.
    assert_eq!(h.current_id(), Some("mash"));
    assert!(h.hw.level(OutputId::Pump1), "recirculation uninterrupted");
    h.run_for(62_000);

    // 4. RestAndConfirm holds until the operator confirms.
    assert_eq!(h.current_id(), Some("sparge"));
    h.run_for(10_000);
    assert_eq!(h.current_id(), Some("sparge"));
    h.complete_current();

    // 5. Heating→boil drains the RIMS pump before the boil step starts.
    h.run_for(4000);
    assert_eq!(h.current_id(), Some("boil"));
    assert!(!h.hw.level(OutputId::Pump1), "pump drained");
    h.run_for(5500);
    assert!(h.hw.level(OutputId::Contactor2));
    h.run_for(61_000);

    // 6. Chill: its pump starts after 2 s and the step waits for the
    // operator.
    assert_eq!(h.current_id(), Some("chill"));
    h.run_for(2500);
    assert!(h.hw.level(OutputId::Pump2));
    h.complete_current();

    // 7. Out of steps: the recipe ends and everything is de-energized.
    assert!(h.sink.ended());
    for id in OutputId::ALL {
        assert!(!h.hw.level(id), "{id:?} left energized after end");
    }
    let recipe = h.svc.recipe().unwrap();
    assert!(recipe.is_ended());
    assert!(recipe.steps().iter().all(|s| s.complete || s.id == "chill"));
}

// ── Step transition bookkeeping ──────────────────────────────

#[test]
fn completing_a_step_marks_its_record_and_advances() {
    let mut h = Harness::new();
    h.load_and_start(vec![
        StepRecord::new("A", StepType::PrepareStrikeWater),
        StepRecord::new("B", StepType::Heating).with_setpoint(150.0),
    ]);

    assert_eq!(h.current_id(), Some("A"));
    h.complete_current();

    assert_eq!(h.current_id(), Some("B"));
    let recipe = h.svc.recipe().unwrap();
    assert!(recipe.steps()[0].complete);
    assert!(!recipe.steps()[1].complete);

    // The transition pushed a recipe snapshot for persistence.
    let snapshot_shows_a_done = h.sink.events.iter().any(|e| match e {
        BrewEvent::RecipeUpdated { steps, .. } => steps[0].complete,
        _ => false,
    });
    assert!(snapshot_shows_a_done);
}

#[test]
fn next_step_never_starts_before_pump_down_resolves() {
    let mut h = Harness::new();
    h.load_and_start(vec![
        StepRecord::new("H", StepType::Heating).with_setpoint(150.0),
        StepRecord::new("N", StepType::PrepareForBoil),
    ]);

    h.run_for(9000); // pump on, loop running
    assert!(h.hw.level(OutputId::Pump1));

    let id = h.current_id().unwrap().to_string();
    h.cmd(BrewCommand::CompleteStep { id });

    // 4 s drain: no current step, pump still clearing the tube.
    h.run_for(3800);
    assert_eq!(h.current_id(), None, "successor started during drain");
    assert!(h.hw.level(OutputId::Pump1));

    h.run_for(500);
    assert_eq!(h.current_id(), Some("N"));
    assert!(!h.hw.level(OutputId::Pump1));
    let step = h.svc.recipe().unwrap().current_step().unwrap();
    assert_eq!(step.step_time.value(), 0, "fresh timer after the swap");
}

// ── Boil duty proportionality ────────────────────────────────

#[test]
fn boil_duty_tracks_setpoint_percentage() {
    let mut h = Harness::new();
    h.load_and_start(vec![
        StepRecord::new("boil", StepType::Boil).with_setpoint(60.0)
    ]);

    // Let the contactor close and the first cycles run.
    h.run_for(6000);

    // Sample the element at 10 ms resolution across three full cycles.
    let mut on_samples = 0u32;
    let mut total = 0u32;
    let end = h.now + 3000;
    while h.now < end {
        h.now += 10;
        h.svc.tick(h.now, &mut h.sink);
        total += 1;
        if h.hw.level(OutputId::Heat2) {
            on_samples += 1;
        }
    }

    // setpoint 60 → 0.60 × 1000 ms − 10 ms margin = 590 ms per cycle.
    let ratio = on_samples as f32 / total as f32;
    assert!(
        (ratio - 0.59).abs() < 0.05,
        "duty ratio {ratio} outside tolerance"
    );
}

// ── Todos ────────────────────────────────────────────────────

#[test]
fn complete_todo_flows_into_the_snapshot() {
    let mut h = Harness::new();
    let mut step = StepRecord::new("sparge", StepType::Sparge).with_setpoint(168.0);
    step.todos.push(Todo {
        id: "t-1".into(),
        title: "Add sparge water".into(),
        complete: false,
    });
    h.load_and_start(vec![step]);

    h.cmd(BrewCommand::CompleteTodo { id: "t-1".into() });

    let recipe = h.svc.recipe().unwrap();
    assert!(recipe.steps()[0].todos[0].complete);
    let snapshot_confirms = h.sink.events.iter().any(|e| match e {
        BrewEvent::RecipeUpdated { steps, .. } => {
            steps[0].todos.first().is_some_and(|t| t.complete)
        }
        _ => false,
    });
    assert!(snapshot_confirms);
}

// ── Manual overrides during a live step ──────────────────────

#[test]
fn override_pins_output_until_cleared() {
    let mut h = Harness::new();
    h.load_and_start(vec![
        StepRecord::new("H", StepType::Heating).with_setpoint(150.0)
    ]);
    h.run_for(9000);
    assert!(h.hw.level(OutputId::Pump1), "automated pump on");

    h.cmd(BrewCommand::SetOutput {
        output: OutputId::Pump1,
        mode: OutputMode::ForceOff,
    });
    assert!(!h.hw.level(OutputId::Pump1));

    // Returning to auto restores the automated value with no new
    // automated write.
    h.cmd(BrewCommand::SetOutput {
        output: OutputId::Pump1,
        mode: OutputMode::Auto,
    });
    assert!(h.hw.level(OutputId::Pump1));
}

// ── Time & temperature telemetry ─────────────────────────────

#[test]
fn telemetry_streams_while_brewing() {
    let mut h = Harness::new();
    h.load_and_start(vec![
        StepRecord::new("mash", StepType::Resting)
            .with_setpoint(152.0)
            .with_step_time(10.0),
    ]);
    h.run_for(10_000);

    let times = h
        .sink
        .events
        .iter()
        .filter(|e| matches!(e, BrewEvent::Time { .. }))
        .count();
    assert!((9..=11).contains(&times), "got {times} time events");

    let temps = h
        .sink
        .events
        .iter()
        .filter(|e| matches!(e, BrewEvent::NewTemperature(_)))
        .count();
    assert!(temps >= 9, "got {temps} temperature events");

    // Remaining time counts down from the declared duration.
    let counting_down = h.sink.events.iter().any(|e| match e {
        BrewEvent::Time { remaining_time, .. } => remaining_time.starts_with("00:09"),
        _ => false,
    });
    assert!(counting_down);
}

// ── Quit ─────────────────────────────────────────────────────

#[test]
fn quit_mid_heat_de_energizes_everything() {
    let mut h = Harness::new();
    h.load_and_start(vec![
        StepRecord::new("H", StepType::Heating).with_setpoint(150.0)
    ]);
    h.hw.set_raw(0, COLD_RAW);
    h.run_for(9500); // pump + contactor on, loop pulsing the element

    h.cmd(BrewCommand::Quit);

    for id in OutputId::ALL {
        assert!(!h.hw.level(id), "{id:?} energized after quit");
    }
    assert!(h.svc.recipe().unwrap().is_ended());
    assert!(!h.sink.ended(), "quit skips the graceful end notification");

    // A second quit is a no-op.
    let events_before = h.sink.events.len();
    h.cmd(BrewCommand::Quit);
    assert_eq!(h.sink.events.len(), events_before);
}
