use mapty_client::{Coordinate, Place};
use serde::Serialize;

use crate::domains::{FormValues, WorkoutType};
use crate::{MaptyError, WorkoutId};

/// Where the confirmation workflow currently stands.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    #[default]
    Idle,
    /// A click was accepted; metrics (and for cycling, elevation) pending.
    Drafting,
    /// Draft built; waiting on reverse geocoding and the photo.
    Resolving,
    AwaitingConfirmation,
    /// Committing a confirmed draft to the store.
    Finalizing,
    /// A step failed; clicks are rejected until the message expires.
    Failed,
}

/// How the most recent draft ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Committed(WorkoutId),
    Discarded,
    Failed(MaptyError),
}

/// Everything that drives the workflow: user input and the results of
/// collaborator calls.
///
/// Results carry the generation of the draft they were requested for, so
/// a late answer for an abandoned draft can be recognised and dropped.
#[derive(Debug, Clone)]
pub enum Event {
    MapClicked(Coordinate),
    TypeChanged(WorkoutType),
    /// The user answered "yes"; `None` confirms the pre-filled values.
    Confirmed(Option<FormValues>),
    Declined,
    ElevationFetched {
        generation: u64,
        result: Result<f64, MaptyError>,
    },
    LocationResolved {
        generation: u64,
        result: Result<Place, MaptyError>,
    },
    PhotoFetched {
        generation: u64,
        result: Result<String, MaptyError>,
    },
    RouteFetched {
        id: WorkoutId,
        result: Result<Vec<Coordinate>, MaptyError>,
    },
    /// A transient message timed out. `message` numbers the messages shown
    /// so an older timer cannot dismiss a newer one.
    MessageExpired {
        message: u64,
    },
}
