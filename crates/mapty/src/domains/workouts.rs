use chrono::{DateTime, Local};
use mapty_client::{Coordinate, Place, RouteProfile};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use super::geo::{self, MetricsParams};
use crate::{MaptyError, MaptyResult, WorkoutId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutType {
    #[default]
    Running,
    Cycling,
}

impl WorkoutType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutType::Running => "running",
            WorkoutType::Cycling => "cycling",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WorkoutType::Running => "Running",
            WorkoutType::Cycling => "Cycling",
        }
    }

    /// Directions profile used to draw this kind of workout.
    pub fn route_profile(&self) -> RouteProfile {
        match self {
            WorkoutType::Running => RouteProfile::Walking,
            WorkoutType::Cycling => RouteProfile::Cycling,
        }
    }
}

impl fmt::Display for WorkoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkoutType {
    type Err = MaptyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(WorkoutType::Running),
            "cycling" => Ok(WorkoutType::Cycling),
            other => Err(MaptyError::InvalidType(other.to_string())),
        }
    }
}

/// Type-specific metrics. Carrying them in one enum keeps a workout from
/// ever holding fields of two types at once.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkoutKind {
    Running {
        /// Steps per minute.
        #[serde(default, deserialize_with = "zero_if_null")]
        cadence: u32,
    },
    Cycling {
        /// Elevation gain in meters.
        #[serde(default, deserialize_with = "zero_if_null")]
        gain: f64,
    },
}

/// Older records hold `null` where a metric was NaN or infinite when
/// written; those read back as zero.
fn zero_if_null<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl WorkoutKind {
    pub fn workout_type(&self) -> WorkoutType {
        match self {
            WorkoutKind::Running { .. } => WorkoutType::Running,
            WorkoutKind::Cycling { .. } => WorkoutType::Cycling,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: WorkoutId,
    #[serde(flatten)]
    pub kind: WorkoutKind,
    /// Miles, two decimals.
    pub distance: f64,
    /// Minutes.
    pub duration: u32,
    #[serde(rename = "pos")]
    pub position: Coordinate,
    pub home: Coordinate,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place: Option<Place>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<Vec<Coordinate>>,
}

impl Workout {
    pub fn workout_type(&self) -> WorkoutType {
        self.kind.workout_type()
    }

    /// Cadence for running, elevation gain for cycling.
    pub fn effort(&self) -> f64 {
        match self.kind {
            WorkoutKind::Running { cadence } => f64::from(cadence),
            WorkoutKind::Cycling { gain } => gain,
        }
    }
}

/// "Running on March 5, 2024"
pub fn describe(kind: WorkoutType, at: &DateTime<Local>) -> String {
    format!("{} on {}", kind.label(), at.format("%B %-d, %Y"))
}

/// Builds draft workouts from a home point and a clicked point.
#[derive(Clone, Debug, Default)]
pub struct WorkoutFactory {
    params: MetricsParams,
}

impl WorkoutFactory {
    pub fn new(params: MetricsParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &MetricsParams {
        &self.params
    }

    /// Build a workout of the named type, stamped with the current time.
    pub fn build(
        &self,
        home: Coordinate,
        clicked: Coordinate,
        kind: &str,
        elevation_gain: Option<f64>,
    ) -> MaptyResult<Workout> {
        let kind: WorkoutType = kind.parse()?;
        Ok(self.build_typed(home, clicked, kind, elevation_gain, &Local::now()))
    }

    pub fn build_typed(
        &self,
        home: Coordinate,
        clicked: Coordinate,
        kind: WorkoutType,
        elevation_gain: Option<f64>,
        now: &DateTime<Local>,
    ) -> Workout {
        let distance = geo::distance_miles(home, clicked);
        let (duration, kind) = self.metrics(distance, kind, elevation_gain);
        Workout {
            id: WorkoutId::from_timestamp_millis(now.timestamp_millis()),
            description: describe(kind.workout_type(), now),
            kind,
            distance: geo::round2(distance),
            duration,
            position: clicked,
            home,
            place: None,
            route: None,
        }
    }

    /// Recompute every type-dependent field of `workout` for `kind`,
    /// keeping its identity, endpoints and resolved place.
    pub fn retype(
        &self,
        workout: &Workout,
        kind: WorkoutType,
        elevation_gain: Option<f64>,
        now: &DateTime<Local>,
    ) -> Workout {
        let distance = geo::distance_miles(workout.home, workout.position);
        let (duration, kind) = self.metrics(distance, kind, elevation_gain);
        Workout {
            id: workout.id,
            description: describe(kind.workout_type(), now),
            kind,
            distance: geo::round2(distance),
            duration,
            position: workout.position,
            home: workout.home,
            place: workout.place.clone(),
            route: None,
        }
    }

    fn metrics(
        &self,
        distance: f64,
        kind: WorkoutType,
        elevation_gain: Option<f64>,
    ) -> (u32, WorkoutKind) {
        match kind {
            WorkoutType::Running => {
                let duration = geo::running_duration(distance, self.params.running_speed_mph);
                let cadence =
                    geo::running_cadence(distance, duration, self.params.stride_length_ft);
                (duration, WorkoutKind::Running { cadence })
            }
            WorkoutType::Cycling => {
                let duration = geo::cycling_duration(distance, self.params.cycling_speed_mph);
                (
                    duration,
                    WorkoutKind::Cycling {
                        gain: elevation_gain.unwrap_or(0.0),
                    },
                )
            }
        }
    }
}
