//! Error taxonomy of the workout tracker.

use thiserror::Error;

use crate::WorkoutId;

/// Tracker errors.
///
/// Collaborator failures are mapped into the variant describing what the
/// user was waiting for, never passed through as transport errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MaptyError {
    #[error("Invalid type '{0}'. Must be 'running' or 'cycling'.")]
    InvalidType(String),

    #[error("This location could not be found: {0}")]
    LocationNotFound(String),

    #[error("Location photo could not be found: {0}")]
    PhotoUnavailable(String),

    #[error("Failed to fetch elevation data: {0}")]
    ElevationUnavailable(String),

    #[error("Could not create route: {0}")]
    RouteUnavailable(String),

    #[error("Please only use numbers! {0}")]
    Validation(String),

    #[error("User denied geolocation! {0}")]
    GeolocationDenied(String),

    #[error("Workout {0} not found")]
    NotFound(WorkoutId),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<std::io::Error> for MaptyError {
    fn from(err: std::io::Error) -> Self {
        MaptyError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for MaptyError {
    fn from(err: serde_json::Error) -> Self {
        MaptyError::Storage(err.to_string())
    }
}

/// Result type alias for tracker operations.
pub type MaptyResult<T> = Result<T, MaptyError>;
