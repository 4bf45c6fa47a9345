//! GPIO output bank adapter.
//!
//! Implements [`OutputPort`] over any six `embedded-hal`
//! [`StatefulOutputPin`]s, so the same adapter drives ESP-IDF `PinDriver`s
//! on the rig and trivial fake pins in tests. The interlock's physical
//! read-back goes through the pin's output latch.

use embedded_hal::digital::StatefulOutputPin;

use crate::app::ports::OutputPort;
use crate::error::ActuatorError;
use crate::io::OutputId;

/// Six relay/SSR lines in [`OutputId`] order.
pub struct GpioOutputBank<P: StatefulOutputPin> {
    pins: [P; OutputId::COUNT],
}

impl<P: StatefulOutputPin> GpioOutputBank<P> {
    /// `pins` must be ordered `[pump1, pump2, heat1, heat2, contactor1,
    /// contactor2]` — the [`OutputId`] discriminant order.
    pub fn new(pins: [P; OutputId::COUNT]) -> Self {
        Self { pins }
    }
}

impl<P: StatefulOutputPin> OutputPort for GpioOutputBank<P> {
    fn write(&mut self, id: OutputId, level: bool) -> Result<(), ActuatorError> {
        let pin = &mut self.pins[id as usize];
        let result = if level { pin.set_high() } else { pin.set_low() };
        result.map_err(|_| ActuatorError::GpioWriteFailed)
    }

    fn read(&mut self, id: OutputId) -> Result<bool, ActuatorError> {
        self.pins[id as usize]
            .is_set_high()
            .map_err(|_| ActuatorError::GpioReadFailed)
    }

    fn release_all(&mut self) {
        for pin in &mut self.pins {
            // Best effort — a failed low write during shutdown is logged
            // by the caller's next access, not retried here.
            let _ = pin.set_low();
        }
    }
}
