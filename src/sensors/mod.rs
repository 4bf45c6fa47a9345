//! Temperature sensing.
//!
//! Three thermistor probes: the RIMS tube outlet (`temp1`), the wort /
//! chiller return (`temp2`), and the hot-liquor tank (`temp3`). Conversion
//! and smoothing live in [`thermistor`]; the sampling cadence is driven by
//! [`BreweryIo`](crate::io::BreweryIo).

pub mod thermistor;

use serde::Serialize;

/// Point-in-time averaged reading of all three probes (°F). `None` means
/// the probe has produced no valid sample yet (open circuit or startup).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TempSnapshot {
    pub temp1: Option<f32>,
    pub temp2: Option<f32>,
    pub temp3: Option<f32>,
}
