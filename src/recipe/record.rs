//! Recipe step records — the external input to the control core.
//!
//! A recipe arrives as an ordered list of [`StepRecord`]s produced by the
//! recipe-import pipeline (out of scope here). The core only ever mutates
//! the `complete` flags; everything else is read-only. The serde names
//! match the JSON the importer has always produced.

use serde::{Deserialize, Serialize};

use crate::recipe::step::StepKind;

/// A single confirmation item inside a step ("add 2 oz Cascade").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Todo {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub complete: bool,
}

/// Imported step type tags. Several tags map onto the same runtime step
/// kind — the importer distinguishes them for display purposes only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepType {
    NoAction,
    PrepareStrikeWater,
    PrepareForHtlHeat,
    PrepareForMashRecirc,
    PrepareForBoil,
    PrepareForWortChill,
    Heating,
    Resting,
    AddIngredients,
    AddWaterToMashTun,
    Sparge,
    Boil,
    Chilling,
}

impl StepType {
    /// The runtime behavior this tag selects.
    pub fn kind(self) -> StepKind {
        match self {
            Self::NoAction
            | Self::PrepareStrikeWater
            | Self::PrepareForHtlHeat
            | Self::PrepareForMashRecirc
            | Self::PrepareForBoil
            | Self::PrepareForWortChill => StepKind::NoAction,
            Self::Heating => StepKind::Heat,
            Self::Resting => StepKind::Rest,
            Self::AddIngredients | Self::AddWaterToMashTun | Self::Sparge => {
                StepKind::RestAndConfirm
            }
            Self::Boil => StepKind::Boil,
            Self::Chilling => StepKind::Chill,
        }
    }
}

/// One ordered step of an imported recipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub step_type: StepType,
    #[serde(default)]
    pub title: String,
    /// Target temperature (°F) for heating kinds; duty percentage for Boil.
    #[serde(default)]
    pub setpoint: Option<f32>,
    /// Declared duration in minutes, where the kind uses one.
    #[serde(rename = "stepTime", default)]
    pub step_time: Option<f32>,
    #[serde(default)]
    pub todos: Vec<Todo>,
    #[serde(default)]
    pub complete: bool,
}

impl StepRecord {
    /// Shorthand for tests and adapters building records in code.
    pub fn new(id: impl Into<String>, step_type: StepType) -> Self {
        Self {
            id: id.into(),
            step_type,
            title: String::new(),
            setpoint: None,
            step_time: None,
            todos: Vec::new(),
            complete: false,
        }
    }

    pub fn with_setpoint(mut self, setpoint: f32) -> Self {
        self.setpoint = Some(setpoint);
        self
    }

    pub fn with_step_time(mut self, minutes: f32) -> Self {
        self.step_time = Some(minutes);
        self
    }
}
