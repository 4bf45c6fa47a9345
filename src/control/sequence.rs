//! One-shot delayed output actions with deterministic cancellation.
//!
//! Every start/stop sequencing delay ("pump on in 5 s", "heater off in
//! 590 ms") is a [`SeqAction`] queued here with an absolute deadline. Each
//! step owns exactly one `DelayedActions` set, and the orchestrator cancels
//! it when the step is stopped or superseded — a stale "turn pump off"
//! scheduled by a discarded step can never fire into the next step's
//! territory.

use heapless::Vec;
use log::{debug, warn};

use crate::app::ports::EventSink;
use crate::control::{Millis, Pid};
use crate::io::{BreweryIo, OutputId};

/// An action deferred to a deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqAction {
    /// Automated write: energize.
    AutoOn(OutputId),
    /// Automated write: de-energize.
    AutoOff(OutputId),
    /// Arm the PID compute loop.
    StartPid,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    fire_at: Millis,
    action: SeqAction,
}

/// Worst-case concurrent delays for any step kind (NoAction queues two
/// pump releases; Heat queues pump, contactor+PID, and a heater pulse).
const MAX_PENDING: usize = 8;

/// A step-owned set of pending one-shot actions.
#[derive(Debug, Default)]
pub struct DelayedActions {
    pending: Vec<Pending, MAX_PENDING>,
}

impl DelayedActions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `action` to fire at `fire_at`. A full set drops the action
    /// with a warning — this indicates a sequencing bug, not a runtime
    /// condition.
    pub fn schedule(&mut self, fire_at: Millis, action: SeqAction) {
        if self.pending.push(Pending { fire_at, action }).is_err() {
            warn!("delayed action set full, dropping {action:?}");
        }
    }

    /// Drop every pending action without firing it.
    pub fn cancel_all(&mut self) {
        if !self.pending.is_empty() {
            debug!("cancelling {} pending action(s)", self.pending.len());
        }
        self.pending.clear();
    }

    /// Fire every action whose deadline has passed, earliest first.
    pub fn poll(
        &mut self,
        now: Millis,
        io: &mut BreweryIo,
        pid: &mut Pid,
        sink: &mut dyn EventSink,
    ) {
        loop {
            // Earliest deadline first; ties fire in insertion order.
            let mut due: Option<(usize, Millis)> = None;
            for (i, p) in self.pending.iter().enumerate() {
                if p.fire_at <= now && due.is_none_or(|(_, t)| p.fire_at < t) {
                    due = Some((i, p.fire_at));
                }
            }

            let Some((i, _)) = due else { break };
            let Pending { action, .. } = self.pending.remove(i);
            match action {
                SeqAction::AutoOn(id) => io.auto_on(id, sink),
                SeqAction::AutoOff(id) => io.auto_off(id, sink),
                SeqAction::StartPid => pid.start_loop(now),
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Deadline of the latest pending action, if any.
    pub fn last_deadline(&self) -> Option<Millis> {
        self.pending.iter().map(|p| p.fire_at).max()
    }
}
