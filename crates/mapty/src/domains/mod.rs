//! Domain modules: the pure parts of the tracker.
//!
//! - [`geo`]: great-circle distance and derived metrics
//! - [`workouts`]: workout model and the factory building drafts
//! - [`form`]: validation of the numbers a user confirms

pub mod form;
pub mod geo;
pub mod workouts;

pub use form::FormValues;
pub use geo::MetricsParams;
pub use workouts::{Workout, WorkoutFactory, WorkoutKind, WorkoutType};
