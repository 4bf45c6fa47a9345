//! Mock hardware adapter for integration tests.
//!
//! Records every physical level and event so tests can assert on the full
//! command history without touching real GPIO/SPI registers. The shared
//! handles let a test flip levels and temperatures behind the service's
//! back, exactly like the real world does.

use std::cell::RefCell;
use std::rc::Rc;

use brewrig::app::events::BrewEvent;
use brewrig::app::ports::{AdcPort, EventSink, OutputPort};
use brewrig::error::{ActuatorError, SensorError};
use brewrig::io::{BreweryIo, OutputId};

// ── Output bank double ───────────────────────────────────────

pub struct MockBank {
    levels: Rc<RefCell<[bool; OutputId::COUNT]>>,
}

impl OutputPort for MockBank {
    fn write(&mut self, id: OutputId, level: bool) -> Result<(), ActuatorError> {
        self.levels.borrow_mut()[id as usize] = level;
        Ok(())
    }

    fn read(&mut self, id: OutputId) -> Result<bool, ActuatorError> {
        Ok(self.levels.borrow()[id as usize])
    }

    fn release_all(&mut self) {
        *self.levels.borrow_mut() = [false; OutputId::COUNT];
    }
}

// ── ADC double ───────────────────────────────────────────────

pub struct MockAdc {
    raw: Rc<RefCell<[u16; 3]>>,
}

impl AdcPort for MockAdc {
    fn read_raw(&mut self, channel: u8) -> Result<u16, SensorError> {
        Ok(self.raw.borrow()[channel as usize])
    }
}

// ── Shared handles ───────────────────────────────────────────

/// Hooks into the mock rig's physical state.
pub struct HwHandles {
    pub levels: Rc<RefCell<[bool; OutputId::COUNT]>>,
    pub raw: Rc<RefCell<[u16; 3]>>,
}

#[allow(dead_code)]
impl HwHandles {
    pub fn level(&self, id: OutputId) -> bool {
        self.levels.borrow()[id as usize]
    }

    pub fn set_raw(&self, channel: usize, value: u16) {
        self.raw.borrow_mut()[channel] = value;
    }
}

/// Raw divider reading ≈ 160.7 °F — hot enough to cross mash setpoints.
#[allow(dead_code)]
pub const HOT_RAW: u16 = 150;
/// Raw divider reading ≈ 77.1 °F — strike-water-from-the-tap cold.
#[allow(dead_code)]
pub const COLD_RAW: u16 = 511;

/// Build a mock rig. Probes start at room temperature.
pub fn mock_rig() -> (BreweryIo, HwHandles) {
    let levels = Rc::new(RefCell::new([false; OutputId::COUNT]));
    let raw = Rc::new(RefCell::new([COLD_RAW; 3]));
    let io = BreweryIo::new(
        Box::new(MockBank {
            levels: levels.clone(),
        }),
        Box::new(MockAdc { raw: raw.clone() }),
        66,
    );
    (io, HwHandles { levels, raw })
}

// ── Recording event sink ─────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<BrewEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output_updates(&self) -> Vec<(&'static str, bool)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                BrewEvent::OutputUpdate { name, value, .. } => Some((*name, *value)),
                _ => None,
            })
            .collect()
    }

    pub fn ended(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, BrewEvent::EndRecipe))
    }

    pub fn snackbars(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                BrewEvent::Snackbar { message, .. } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &BrewEvent) {
        self.events.push(event.clone());
    }
}
