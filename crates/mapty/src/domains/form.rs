use super::geo::round2;
use super::workouts::{Workout, WorkoutKind};
use crate::{MaptyError, MaptyResult};

/// Numeric values of the workout form at confirmation time.
///
/// `effort` is the cadence field for running and the gain field for
/// cycling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FormValues {
    pub distance: f64,
    pub duration: f64,
    pub effort: f64,
}

/// Round a minute or step count, rejecting values too large to store.
fn whole(name: &str, value: f64) -> MaptyResult<u32> {
    let rounded = value.round();
    if rounded > f64::from(u32::MAX) {
        return Err(MaptyError::Validation(format!("{name} is too large")));
    }
    Ok(rounded as u32)
}

fn parse_field(raw: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or(f64::NAN)
}

impl FormValues {
    /// The values the form is pre-filled with for a draft.
    pub fn from_workout(workout: &Workout) -> Self {
        Self {
            distance: workout.distance,
            duration: f64::from(workout.duration),
            effort: workout.effort(),
        }
    }

    /// Parse raw field text. Anything unparsable becomes NaN and fails
    /// validation later.
    pub fn parse(distance: &str, duration: &str, effort: &str) -> Self {
        Self {
            distance: parse_field(distance),
            duration: parse_field(duration),
            effort: parse_field(effort),
        }
    }

    pub fn validate(&self) -> MaptyResult<()> {
        let fields = [
            ("distance", self.distance),
            ("duration", self.duration),
            ("effort", self.effort),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(MaptyError::Validation(format!("{name} is not a number")));
            }
        }
        for (name, value) in &fields[..2] {
            if *value < 0.0 {
                return Err(MaptyError::Validation(format!("{name} must not be negative")));
            }
        }
        Ok(())
    }

    /// Validate and return `workout` carrying these values.
    pub fn apply_to(&self, workout: &Workout) -> MaptyResult<Workout> {
        self.validate()?;
        let kind = match workout.kind {
            WorkoutKind::Running { .. } => {
                if self.effort < 0.0 {
                    return Err(MaptyError::Validation("cadence must not be negative".into()));
                }
                WorkoutKind::Running {
                    cadence: whole("cadence", self.effort)?,
                }
            }
            WorkoutKind::Cycling { .. } => WorkoutKind::Cycling { gain: self.effort },
        };
        Ok(Workout {
            kind,
            distance: round2(self.distance),
            duration: whole("duration", self.duration)?,
            ..workout.clone()
        })
    }
}
