//! List entries rendered for confirmed workouts.

use mapty_client::Coordinate;
use serde::Serialize;

use crate::WorkoutId;
use crate::domains::{Workout, WorkoutKind, WorkoutType};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WorkoutSummary {
    pub id: WorkoutId,
    #[serde(rename = "type")]
    pub workout_type: WorkoutType,
    pub description: String,
    pub distance: String,
    pub duration: String,
    pub effort: String,
    pub position: Coordinate,
}

impl WorkoutSummary {
    pub fn of(workout: &Workout) -> Self {
        let effort = match workout.kind {
            WorkoutKind::Running { cadence } => format!("{cadence} SPM"),
            WorkoutKind::Cycling { gain } => format!("{gain} M"),
        };
        Self {
            id: workout.id,
            workout_type: workout.workout_type(),
            description: workout.description.clone(),
            distance: format!("{} MI", workout.distance),
            duration: format!("{} MINS", workout.duration),
            effort,
            position: workout.position,
        }
    }
}
