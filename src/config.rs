//! System configuration parameters.
//!
//! All tunable parameters for the brewery controller. The RIMS and boil
//! sections are the "live settings" surface: the user can retune the PID or
//! nudge the setpoint mid-step, and the active step picks the change up on
//! its next control tick. Sequencing delays live here too so tests can
//! compress them.

use serde::{Deserialize, Serialize};

/// RIMS (recirculating heating) settings — consumed by Heat/Rest steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RimsSettings {
    /// PID proportional gain.
    pub proportional: f32,
    /// PID integral gain.
    pub integral: f32,
    /// PID derivative gain.
    pub derivative: f32,
    /// Upper PID output limit (%). Lower limit is fixed at 0.
    pub max_output: f32,
    /// Live offset added to the step's base setpoint (°F).
    pub setpoint_adjust: f32,
    /// PID sample interval (milliseconds).
    pub sample_time_ms: u32,
}

/// Boil settings — consumed by the Boil step's duty cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoilSettings {
    /// Fallback duty percentage when the step record carries no setpoint.
    pub duty_percent: f32,
    /// Fixed heater cycle period (milliseconds).
    pub cycle_ms: u32,
    /// Subtracted from every heater-on pulse so consecutive cycles
    /// cannot overlap (milliseconds).
    pub element_margin_ms: u32,
}

/// Hardware sequencing delays. These exist to stop a heating element from
/// ever being energized before its pump has primed, and to let the RIMS tube
/// dissipate heat into moving liquid after shutdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingSettings {
    /// Heat/Rest: delay before the recirculation pump starts (ms).
    pub heat_pump_on_ms: u32,
    /// Heat/Rest: total delay before the contactor closes and the PID
    /// loop starts (ms). Must exceed `heat_pump_on_ms`.
    pub heat_contactor_on_ms: u32,
    /// Heat/Rest pump-down: drain delay before the pump stops (ms).
    pub pump_down_ms: u32,
    /// NoAction: delay before both pumps are released (ms).
    pub no_action_pump_off_ms: u32,
    /// Chill: delay before the chill pump starts (ms).
    pub chill_pump_on_ms: u32,
    /// Boil: delay before the boil contactor closes (ms).
    pub boil_contactor_on_ms: u32,
    /// Heat: dwell after the setpoint is first reached before the step
    /// reports completion (seconds).
    pub heat_dwell_secs: u32,
    /// Subtracted from every PID-driven heater pulse so it cannot overlap
    /// the next sample interval (ms).
    pub heat_pulse_margin_ms: u32,
    /// Thermistor sampling cadence per channel (ms).
    pub temp_sample_ms: u32,
}

/// Core system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrewSettings {
    pub rims: RimsSettings,
    pub boil: BoilSettings,
    pub timing: TimingSettings,
}

impl Default for RimsSettings {
    fn default() -> Self {
        Self {
            proportional: 0.5,
            integral: 0.5,
            derivative: 10.0,
            max_output: 100.0,
            setpoint_adjust: 0.0,
            sample_time_ms: 1000,
        }
    }
}

impl Default for BoilSettings {
    fn default() -> Self {
        Self {
            duty_percent: 60.0,
            cycle_ms: 1000,
            element_margin_ms: 10,
        }
    }
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            heat_pump_on_ms: 5000,
            heat_contactor_on_ms: 8000,
            pump_down_ms: 4000,
            no_action_pump_off_ms: 5000,
            chill_pump_on_ms: 2000,
            boil_contactor_on_ms: 5000,
            heat_dwell_secs: 60,
            heat_pulse_margin_ms: 10,
            // 15 samples/second feeds the 15-sample moving average,
            // so the averaged reading spans roughly one second.
            temp_sample_ms: 66,
        }
    }
}

impl Default for BrewSettings {
    fn default() -> Self {
        Self {
            rims: RimsSettings::default(),
            boil: BoilSettings::default(),
            timing: TimingSettings::default(),
        }
    }
}
