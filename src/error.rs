//! Unified error types for the brewrig firmware.
//!
//! Follows embedded best practice: a single `Error` enum that every subsystem
//! can convert into, keeping the top-level control loop's error handling
//! uniform. All variants are `Copy` so they can be cheaply passed through the
//! control loop without allocation.
//!
//! Hardware faults are deliberately *not* fatal anywhere in the core: a failed
//! GPIO write or ADC read skips that action for the cycle and is retried on
//! the next tick. The only fatal condition is a recipe step the orchestrator
//! cannot construct, and that is fatal to the recipe, never to the process.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read or returned out-of-range data.
    Sensor(SensorError),
    /// An actuator command failed.
    Actuator(ActuatorError),
    /// The recipe orchestrator hit an unrecoverable step definition.
    Recipe(RecipeError),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Recipe(e) => write!(f, "recipe: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// ADC read returned an error or timed out.
    AdcReadFailed,
    /// Raw reading saturated the converter (open thermistor or short).
    OutOfRange,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdcReadFailed => write!(f, "ADC read failed"),
            Self::OutOfRange => write!(f, "reading out of range"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// GPIO level write failed.
    GpioWriteFailed,
    /// GPIO level read-back failed.
    GpioReadFailed,
    /// The output bank has already been released (post-shutdown access).
    Released,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
            Self::GpioReadFailed => write!(f, "GPIO read failed"),
            Self::Released => write!(f, "output bank released"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Recipe errors
// ---------------------------------------------------------------------------

/// Failures constructing or advancing a recipe. Any of these end the recipe
/// (all outputs de-energized) rather than leaving an undefined automated
/// hardware state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeError {
    /// A step record is missing a field its kind requires
    /// (e.g. a resting step with no duration).
    UnconstructableStep(&'static str),
    /// No recipe is loaded.
    NoRecipe,
}

impl fmt::Display for RecipeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnconstructableStep(msg) => write!(f, "unconstructable step: {msg}"),
            Self::NoRecipe => write!(f, "no recipe loaded"),
        }
    }
}

impl From<RecipeError> for Error {
    fn from(e: RecipeError) -> Self {
        Self::Recipe(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
