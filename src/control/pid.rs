//! PID controller for the RIMS heating loop.
//!
//! Port of the Arduino-lineage controller the brewery has always run:
//! display gains are kept separate from working gains (which are scaled by
//! the sample interval and signed by the controller direction), the
//! integral accumulator and output are clamped to the output limits
//! (anti-windup), and switching from manual to automatic re-seeds the
//! accumulator from the current output so the transfer is bumpless.
//!
//! The proportional term is computed as `error / kp * 100` — dividing by
//! the gain, so a *larger* `kp` gives a *gentler* response. That inversion
//! is how this rig has been tuned for years and is preserved as-is.

use crate::control::Millis;

/// Controller mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PidMode {
    Auto,
    Manual,
}

/// Direction of the controlled process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PidDirection {
    /// +output leads to +input.
    Direct,
    /// +output leads to -input (the RIMS heater loop).
    Reverse,
}

impl PidDirection {
    /// Sign applied to the working gains. Reverse is the positive sense
    /// here — historical wiring of the source controller.
    fn sign(self) -> f32 {
        match self {
            Self::Direct => -1.0,
            Self::Reverse => 1.0,
        }
    }
}

/// The PID controller. One instance per recipe, shared across every
/// heating step; the compute loop is started and stopped per step.
#[derive(Debug)]
pub struct Pid {
    // Display gains: what the user entered, returned by the getters.
    disp_kp: f32,
    disp_ki: f32,
    disp_kd: f32,

    // Working gains: interval-scaled and direction-signed.
    kp: f32,
    ki: f32,
    kd: f32,

    sample_time_ms: u32,
    direction: PidDirection,
    in_auto: bool,

    out_min: f32,
    out_max: f32,

    input: f32,
    setpoint: f32,
    last_input: f32,
    /// Integral accumulator, clamped to the output limits.
    total_error: f32,
    output: f32,

    last_time: Millis,
    running: bool,
}

impl Pid {
    /// Defaults match the source controller: 1 s interval, reverse acting,
    /// gains (0.5, 0.5, 10), limits 0–100, automatic.
    pub fn new() -> Self {
        let mut pid = Self {
            disp_kp: 0.0,
            disp_ki: 0.0,
            disp_kd: 0.0,
            kp: 0.0,
            ki: 0.0,
            kd: 0.0,
            sample_time_ms: 1000,
            direction: PidDirection::Reverse,
            in_auto: true,
            out_min: 0.0,
            out_max: 100.0,
            input: 0.0,
            setpoint: 0.0,
            last_input: 0.0,
            total_error: 0.0,
            output: 0.0,
            last_time: 0,
            running: false,
        };
        pid.set_tuning(0.5, 0.5, 10.0);
        pid
    }

    // ── Loop lifecycle ────────────────────────────────────────

    /// Arm the periodic compute. The first output fires one full sample
    /// interval after this call.
    pub fn start_loop(&mut self, now: Millis) {
        self.running = true;
        self.last_time = now;
    }

    /// Disarm the periodic compute. State (accumulator, output) persists
    /// so the next heating step resumes where this one left off.
    pub fn stop_loop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Clear the accumulator and output. The next compute after `now`
    /// fires immediately.
    pub fn reset(&mut self, now: Millis) {
        self.total_error = 0.0;
        self.last_input = self.input;
        self.output = 0.0;
        self.last_time = now.saturating_sub(self.sample_time_ms as Millis);
    }

    // ── The control computation ───────────────────────────────

    /// Compute a new output if the sample interval has elapsed.
    ///
    /// Returns `Some(output)` exactly when a new value was produced; calling
    /// more often than the interval (or while stopped / in manual) is a
    /// no-op, which guards against double-invocation from overlapping
    /// timers.
    pub fn compute(&mut self, now: Millis) -> Option<f32> {
        if !self.running || !self.in_auto {
            return None;
        }
        if now.saturating_sub(self.last_time) < self.sample_time_ms as Millis {
            return None;
        }

        let input = self.input;
        let error = self.setpoint - input;
        let d_input = input - self.last_input;

        self.total_error += self.ki * error;
        self.total_error = self.total_error.clamp(self.out_min, self.out_max);

        // P term divides by kp — see module docs.
        let output = error / self.kp * 100.0 + self.total_error - self.kd * d_input;
        self.output = output.clamp(self.out_min, self.out_max);

        self.last_input = input;
        self.last_time = now;

        Some(self.output)
    }

    // ── Configuration ─────────────────────────────────────────

    /// Adjust the tuning. Negative gains are rejected and the previous
    /// tuning is kept — an invalid settings push must never destabilize a
    /// running loop.
    pub fn set_tuning(&mut self, kp: f32, ki: f32, kd: f32) {
        if kp < 0.0 || ki < 0.0 || kd < 0.0 {
            return;
        }

        self.disp_kp = kp;
        self.disp_ki = ki;
        self.disp_kd = kd;

        let sample_secs = self.sample_time_ms as f32 / 1000.0;
        let sign = self.direction.sign();
        self.kp = kp.abs() * sign;
        self.ki = (ki * sample_secs).abs() * sign;
        self.kd = (kd / sample_secs).abs() * sign;
    }

    /// Change the sample interval, rescaling `ki`/`kd` so the effective
    /// gains stay constant.
    pub fn set_time_interval(&mut self, ms: u32) {
        if ms == 0 {
            return;
        }
        let ratio = ms as f32 / self.sample_time_ms as f32;
        self.ki *= ratio;
        self.kd /= ratio;
        self.sample_time_ms = ms;
    }

    /// Set the output clamp range. `min >= max` is rejected. In automatic
    /// mode the current output and accumulator are re-clamped immediately.
    pub fn set_output_limits(&mut self, min: f32, max: f32) {
        if min >= max {
            return;
        }
        self.out_min = min;
        self.out_max = max;

        if self.in_auto {
            self.output = self.output.clamp(min, max);
            self.total_error = self.total_error.clamp(min, max);
        }
    }

    /// Switch between automatic and manual. The manual→auto edge
    /// re-initializes for bumpless transfer.
    pub fn set_mode(&mut self, mode: PidMode) {
        let new_auto = mode == PidMode::Auto;
        if new_auto && !self.in_auto {
            self.initialize();
        }
        self.in_auto = new_auto;
    }

    /// Flip the process direction, re-signing the working gains.
    pub fn set_direction(&mut self, direction: PidDirection) {
        self.direction = direction;
        let sign = direction.sign();
        self.kp = self.kp.abs() * sign;
        self.ki = self.ki.abs() * sign;
        self.kd = self.kd.abs() * sign;
    }

    /// Feed the latest measurement.
    pub fn set_input(&mut self, value: f32) {
        self.input = value;
    }

    /// Set the target value.
    pub fn set_target(&mut self, value: f32) {
        self.setpoint = value;
    }

    /// Drive the output directly while in manual mode (clamped).
    pub fn set_output(&mut self, value: f32) {
        self.output = value.clamp(self.out_min, self.out_max);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn kp(&self) -> f32 {
        self.disp_kp
    }

    pub fn ki(&self) -> f32 {
        self.disp_ki
    }

    pub fn kd(&self) -> f32 {
        self.disp_kd
    }

    pub fn mode(&self) -> PidMode {
        if self.in_auto {
            PidMode::Auto
        } else {
            PidMode::Manual
        }
    }

    pub fn direction(&self) -> PidDirection {
        self.direction
    }

    pub fn sample_time_ms(&self) -> u32 {
        self.sample_time_ms
    }

    pub fn output(&self) -> f32 {
        self.output
    }

    /// The clamped integral accumulator (diagnostics display).
    pub fn integral_accumulator(&self) -> f32 {
        self.total_error
    }

    pub fn out_min(&self) -> f32 {
        self.out_min
    }

    pub fn out_max(&self) -> f32 {
        self.out_max
    }

    pub fn input(&self) -> f32 {
        self.input
    }

    pub fn target(&self) -> f32 {
        self.setpoint
    }

    // ── Internal ──────────────────────────────────────────────

    /// Bumpless manual→auto transfer: seed the accumulator from the
    /// current output so the first automatic compute continues from it.
    fn initialize(&mut self) {
        self.total_error = self.output.clamp(self.out_min, self.out_max);
        self.last_input = self.input;
    }
}

impl Default for Pid {
    fn default() -> Self {
        Self::new()
    }
}
