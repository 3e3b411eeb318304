//! Line protocol of the `mapty` driver: one JSON command per stdin line.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domains::{FormValues, Workout, WorkoutType};

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Click on the map.
    Click { lng: f64, lat: f64 },
    /// Change the workout type selected in the form.
    Type { workout_type: WorkoutType },
    /// Confirm the draft. Omitted fields keep the draft's values.
    Confirm(ConfirmFields),
    Decline,
    Remove { id: u64 },
    Clear,
    /// Fly the map to a stored workout.
    Go { id: u64 },
    /// Fly the map home.
    Home,
    /// Render the workout list again.
    List,
}

/// A form field as typed: a number or raw text.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Text that is not a number becomes NaN and fails validation.
    pub fn as_f64(&self) -> f64 {
        match self {
            FieldValue::Number(n) => *n,
            FieldValue::Text(s) => s.trim().parse().unwrap_or(f64::NAN),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct ConfirmFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<FieldValue>,
    /// Cadence for running, elevation gain for cycling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effort: Option<FieldValue>,
}

impl ConfirmFields {
    pub fn is_empty(&self) -> bool {
        self.distance.is_none() && self.duration.is_none() && self.effort.is_none()
    }

    /// The form values after applying these edits to `draft`'s values.
    pub fn values_for(&self, draft: &Workout) -> FormValues {
        let prefilled = FormValues::from_workout(draft);
        let pick = |field: &Option<FieldValue>, default: f64| {
            field.as_ref().map_or(default, FieldValue::as_f64)
        };
        FormValues {
            distance: pick(&self.distance, prefilled.distance),
            duration: pick(&self.duration, prefilled.duration),
            effort: pick(&self.effort, prefilled.effort),
        }
    }
}
