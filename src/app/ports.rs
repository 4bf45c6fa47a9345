//! Port traits — the boundary between the control core and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ control core
//! ```
//!
//! Driven adapters (GPIO bank, ADC, event sinks) implement these traits.
//! The core consumes them through trait objects owned by
//! [`BreweryIo`](crate::io::BreweryIo), so the domain logic never touches
//! hardware directly and host tests substitute recording mocks.
//!
//! Port errors are typed and non-fatal: the core logs the failure, skips the
//! affected action for that cycle, and retries on the next tick.

use crate::error::{ActuatorError, SensorError};
use crate::io::OutputId;

// ───────────────────────────────────────────────────────────────
// Output port (domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the six brewery outputs.
pub trait OutputPort {
    /// Drive one output to the given level.
    fn write(&mut self, id: OutputId, level: bool) -> Result<(), ActuatorError>;

    /// Read the *physical* level of one output. The heater interlock uses
    /// this rather than any cached intent.
    fn read(&mut self, id: OutputId) -> Result<bool, ActuatorError>;

    /// Release every output line (drive low and unexport). Idempotent.
    fn release_all(&mut self);
}

// ───────────────────────────────────────────────────────────────
// ADC port (hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port for the thermistor ADC (10-bit, channels 0–2).
pub trait AdcPort {
    fn read_raw(&mut self, channel: u8) -> Result<u16, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → telemetry / UI relay)
// ───────────────────────────────────────────────────────────────

/// The core emits structured [`BrewEvent`](super::events::BrewEvent)s
/// through this port. Adapters decide where they go (serial log, socket
/// relay, display).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::BrewEvent);
}
