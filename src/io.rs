//! Brewery I/O: output arbitration and temperature sampling.
//!
//! The six outputs (two pumps, two heating elements, two contactors) are
//! process-wide singletons owned by one [`BreweryIo`]. Each output carries
//! an automated value, written only by the active step's logic, and an
//! optional manual override that always wins while asserted:
//!
//! ```text
//! physical level = override.unwrap_or(auto)
//! ```
//!
//! Every mutator performs the physical write through the [`OutputPort`] and
//! emits an `OutputUpdate` event. A failed write is logged and skipped; the
//! next write retries. `unexport_all` releases every line and is the single
//! shutdown path — idempotent, callable from any state.
//!
//! The three thermistor channels are sampled here too, at a fixed
//! sub-second cadence, so the rest of the core only ever sees smoothed
//! point-in-time readings via [`read_temps`](BreweryIo::read_temps).

use core::fmt;
use core::str::FromStr;

use log::{debug, info, warn};

use crate::app::events::BrewEvent;
use crate::app::ports::{AdcPort, EventSink, OutputPort};
use crate::control::Millis;
use crate::error::ActuatorError;
use crate::sensors::thermistor::ThermistorChannel;
use crate::sensors::TempSnapshot;

// ───────────────────────────────────────────────────────────────
// Output identity
// ───────────────────────────────────────────────────────────────

/// The six physical outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OutputId {
    Pump1 = 0,
    Pump2 = 1,
    Heat1 = 2,
    Heat2 = 3,
    Contactor1 = 4,
    Contactor2 = 5,
}

impl OutputId {
    pub const COUNT: usize = 6;

    pub const ALL: [OutputId; Self::COUNT] = [
        Self::Pump1,
        Self::Pump2,
        Self::Heat1,
        Self::Heat2,
        Self::Contactor1,
        Self::Contactor2,
    ];

    /// Wire name used by the frontend command surface.
    pub fn name(self) -> &'static str {
        match self {
            Self::Pump1 => "pump1",
            Self::Pump2 => "pump2",
            Self::Heat1 => "heat1",
            Self::Heat2 => "heat2",
            Self::Contactor1 => "contactor1",
            Self::Contactor2 => "contactor2",
        }
    }

    /// Human-readable label for the UI.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Pump1 => "RIMS Pump",
            Self::Pump2 => "Chill Pump",
            Self::Heat1 => "RIMS Element",
            Self::Heat2 => "Boil Element",
            Self::Contactor1 => "RIMS Contactor",
            Self::Contactor2 => "Boil Contactor",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OutputId::ALL
            .into_iter()
            .find(|id| id.name() == s)
            .ok_or(())
    }
}

// ───────────────────────────────────────────────────────────────
// Per-output arbitration state
// ───────────────────────────────────────────────────────────────

/// Automated intent plus optional manual override for one output.
#[derive(Debug, Clone, Copy, Default)]
struct Output {
    auto_value: bool,
    override_value: Option<bool>,
}

impl Output {
    fn live(self) -> bool {
        self.override_value.unwrap_or(self.auto_value)
    }
}

/// A point-in-time view of one output, for initial frontend sync.
#[derive(Debug, Clone, Copy)]
pub struct OutputState {
    pub id: OutputId,
    pub value: bool,
    pub overridden: bool,
}

// ───────────────────────────────────────────────────────────────
// BreweryIo
// ───────────────────────────────────────────────────────────────

/// The hardware abstraction the whole control loop writes through.
pub struct BreweryIo {
    outputs: [Output; OutputId::COUNT],
    port: Box<dyn OutputPort>,
    adc: Box<dyn AdcPort>,
    channels: [ThermistorChannel; 3],
    sample_interval_ms: u32,
    next_sample_at: Millis,
    released: bool,
}

impl BreweryIo {
    pub fn new(port: Box<dyn OutputPort>, adc: Box<dyn AdcPort>, sample_interval_ms: u32) -> Self {
        Self {
            outputs: [Output::default(); OutputId::COUNT],
            port,
            adc,
            channels: [
                ThermistorChannel::new(crate::pins::THERM_RIMS_CH),
                ThermistorChannel::new(crate::pins::THERM_WORT_CH),
                ThermistorChannel::new(crate::pins::THERM_HLT_CH),
            ],
            sample_interval_ms,
            next_sample_at: 0,
            released: false,
        }
    }

    // ── Automated writes (active step only) ───────────────────

    pub fn auto_on(&mut self, id: OutputId, sink: &mut dyn EventSink) {
        self.outputs[id.index()].auto_value = true;
        self.apply(id, sink);
    }

    pub fn auto_off(&mut self, id: OutputId, sink: &mut dyn EventSink) {
        self.outputs[id.index()].auto_value = false;
        self.apply(id, sink);
    }

    // ── Manual overrides (external command surface) ───────────

    pub fn override_on(&mut self, id: OutputId, sink: &mut dyn EventSink) {
        self.outputs[id.index()].override_value = Some(true);
        self.apply(id, sink);
    }

    pub fn override_off(&mut self, id: OutputId, sink: &mut dyn EventSink) {
        self.outputs[id.index()].override_value = Some(false);
        self.apply(id, sink);
    }

    /// Clear the override: the output snaps back to whatever the
    /// automated logic last asserted, without re-issuing `auto_on`/`auto_off`.
    pub fn set_auto(&mut self, id: OutputId, sink: &mut dyn EventSink) {
        self.outputs[id.index()].override_value = None;
        self.apply(id, sink);
    }

    // ── Queries ───────────────────────────────────────────────

    /// Physical read-back of one output. The heater interlock depends on
    /// this being the *actual* line level, not cached intent.
    pub fn current_value(&mut self, id: OutputId) -> Result<bool, ActuatorError> {
        if self.released {
            return Err(ActuatorError::Released);
        }
        self.port.read(id)
    }

    pub fn is_overridden(&self, id: OutputId) -> bool {
        self.outputs[id.index()].override_value.is_some()
    }

    pub fn auto_value(&self, id: OutputId) -> bool {
        self.outputs[id.index()].auto_value
    }

    /// The arbitrated level this output should be driving.
    pub fn intended_value(&self, id: OutputId) -> bool {
        self.outputs[id.index()].live()
    }

    /// Snapshot of all six outputs, for initial frontend sync.
    pub fn snapshot(&self) -> [OutputState; OutputId::COUNT] {
        OutputId::ALL.map(|id| OutputState {
            id,
            value: self.outputs[id.index()].live(),
            overridden: self.outputs[id.index()].override_value.is_some(),
        })
    }

    // ── Temperature sampling ──────────────────────────────────

    /// Sample every thermistor channel when the cadence deadline passes.
    /// Read failures are non-fatal: logged, skipped, retried next time.
    pub fn poll_temps(&mut self, now: Millis) {
        if now < self.next_sample_at {
            return;
        }
        self.next_sample_at = now + self.sample_interval_ms as Millis;
        for ch in &mut self.channels {
            if let Err(e) = ch.sample(self.adc.as_mut()) {
                debug!("thermistor sample skipped: {e}");
            }
        }
    }

    /// The smoothed point-in-time reading of all three probes.
    pub fn read_temps(&self) -> TempSnapshot {
        TempSnapshot {
            temp1: self.channels[0].read(),
            temp2: self.channels[1].read(),
            temp3: self.channels[2].read(),
        }
    }

    // ── Shutdown ──────────────────────────────────────────────

    /// De-energize and release every output. Idempotent: every shutdown
    /// path calls this, and only the first call does any work.
    pub fn unexport_all(&mut self, sink: &mut dyn EventSink) {
        if self.released {
            return;
        }
        info!("releasing all outputs");
        for id in OutputId::ALL {
            self.outputs[id.index()] = Output::default();
            self.apply(id, sink);
        }
        self.port.release_all();
        self.released = true;
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Re-acquire a released bank for a new brew session: every output
    /// starts over de-energized, un-overridden, and writable.
    pub fn rearm(&mut self, sink: &mut dyn EventSink) {
        if !self.released {
            return;
        }
        info!("re-arming output bank");
        self.released = false;
        for id in OutputId::ALL {
            self.outputs[id.index()] = Output::default();
            self.apply(id, sink);
        }
    }

    // ── Internal ──────────────────────────────────────────────

    /// Perform the arbitrated physical write and notify. A write failure
    /// skips the notification — the stored intent stands and the next
    /// write retries the hardware.
    fn apply(&mut self, id: OutputId, sink: &mut dyn EventSink) {
        if self.released {
            warn!("write to {id} after release ignored");
            return;
        }
        let level = self.outputs[id.index()].live();
        match self.port.write(id, level) {
            Ok(()) => sink.emit(&BrewEvent::OutputUpdate {
                name: id.name(),
                display_name: id.display_name(),
                value: level,
            }),
            Err(e) => warn!("write {id} <- {level} failed: {e}"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// In-crate test doubles
// ───────────────────────────────────────────────────────────────
