//! Closed-loop control: the PID regulator and the delayed-action sequencer.

pub mod pid;
pub mod sequence;

pub use pid::{Pid, PidDirection, PidMode};
pub use sequence::{DelayedActions, SeqAction};

/// Milliseconds on the control loop's monotonic clock. The loop injects
/// these into every poll — the core never reads a wall clock, so tests
/// drive synthetic time.
pub type Millis = u64;
