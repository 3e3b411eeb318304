//! The map and form surface the workflow renders onto.

use mapty_client::Coordinate;
use serde::Serialize;

use crate::WorkoutId;
use crate::domains::Workout;
use crate::summary::WorkoutSummary;

/// Rendering collaborator. Implementations draw on a map, fill a form, or
/// record what they were asked to do.
pub trait MapView {
    fn center_on(&mut self, home: Coordinate);
    fn show_home(&mut self, home: Coordinate);
    /// Fill the form with a draft's values.
    fn show_draft(&mut self, workout: &Workout);
    /// Show the resolved place and ask whether it is right.
    fn show_location(&mut self, workout: &Workout);
    fn hide_location(&mut self);
    fn reset_form(&mut self);
    fn show_workout(&mut self, summary: &WorkoutSummary);
    fn draw_route(&mut self, id: WorkoutId, route: &[Coordinate]);
    fn remove_workout(&mut self, id: WorkoutId);
    fn clear_workouts(&mut self);
    fn fly_to(&mut self, center: Coordinate);
    /// Transient user-visible message.
    fn show_message(&mut self, text: &str);
    fn dismiss_message(&mut self);
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ViewEvent {
    MapCentered { center: Coordinate },
    HomeMarker { at: Coordinate },
    DraftShown { workout: Workout },
    LocationShown { workout: Workout, prompt: String },
    LocationHidden,
    FormReset,
    WorkoutShown { summary: WorkoutSummary },
    RouteDrawn { id: WorkoutId, route: Vec<Coordinate> },
    WorkoutRemoved { id: WorkoutId },
    WorkoutsCleared,
    FlyTo { center: Coordinate },
    Message { text: String },
    MessageDismissed,
}

/// A view that records every request as a [`ViewEvent`].
#[derive(Debug, Default)]
pub struct RecordingView {
    events: Vec<ViewEvent>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[ViewEvent] {
        &self.events
    }

    /// Hand over everything recorded so far.
    pub fn take_events(&mut self) -> Vec<ViewEvent> {
        std::mem::take(&mut self.events)
    }

    fn push(&mut self, event: ViewEvent) {
        self.events.push(event);
    }
}

impl MapView for RecordingView {
    fn center_on(&mut self, home: Coordinate) {
        self.push(ViewEvent::MapCentered { center: home });
    }

    fn show_home(&mut self, home: Coordinate) {
        self.push(ViewEvent::HomeMarker { at: home });
    }

    fn show_draft(&mut self, workout: &Workout) {
        self.push(ViewEvent::DraftShown {
            workout: workout.clone(),
        });
    }

    fn show_location(&mut self, workout: &Workout) {
        self.push(ViewEvent::LocationShown {
            workout: workout.clone(),
            prompt: format!("Is this where you are {}?", workout.workout_type()),
        });
    }

    fn hide_location(&mut self) {
        self.push(ViewEvent::LocationHidden);
    }

    fn reset_form(&mut self) {
        self.push(ViewEvent::FormReset);
    }

    fn show_workout(&mut self, summary: &WorkoutSummary) {
        self.push(ViewEvent::WorkoutShown {
            summary: summary.clone(),
        });
    }

    fn draw_route(&mut self, id: WorkoutId, route: &[Coordinate]) {
        self.push(ViewEvent::RouteDrawn {
            id,
            route: route.to_vec(),
        });
    }

    fn remove_workout(&mut self, id: WorkoutId) {
        self.push(ViewEvent::WorkoutRemoved { id });
    }

    fn clear_workouts(&mut self) {
        self.push(ViewEvent::WorkoutsCleared);
    }

    fn fly_to(&mut self, center: Coordinate) {
        self.push(ViewEvent::FlyTo { center });
    }

    fn show_message(&mut self, text: &str) {
        self.push(ViewEvent::Message {
            text: text.to_string(),
        });
    }

    fn dismiss_message(&mut self) {
        self.push(ViewEvent::MessageDismissed);
    }
}
