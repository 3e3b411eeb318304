//! Map-based workout tracker.
//!
//! A click on the map drafts a workout from the home position to the clicked
//! point. The draft is reverse geocoded, shown with a street-level photo and
//! committed to the [`store::WorkoutStore`] once the user confirms it; its
//! route is fetched and drawn afterwards.

pub mod config;
pub mod domains;
pub mod error;
pub mod middleware;
pub mod services;
pub mod session;
pub mod state;
pub mod store;
pub mod summary;
pub mod types;
pub mod view;
pub mod workflow;
pub mod workout_id;

#[cfg(test)]
mod test_utils;

pub use config::SessionConfig;
pub use error::{MaptyError, MaptyResult};
pub use middleware::LoggingMiddleware;
pub use services::Collaborators;
pub use session::Session;
pub use state::{Event, Outcome, WorkflowState};
pub use store::{FilePersistence, MemoryPersistence, Persistence, WorkoutStore};
pub use view::{MapView, RecordingView, ViewEvent};
pub use workout_id::WorkoutId;
