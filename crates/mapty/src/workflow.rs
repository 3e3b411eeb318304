//! The confirmation workflow: click, draft, resolve, confirm.
//!
//! The workflow owns the single draft slot and reacts to [`Event`]s. It
//! never awaits anything itself; collaborator calls are handed to
//! [`Services`] and their answers come back as events tagged with the draft
//! generation they were requested for.

use std::time::Duration;

use chrono::Local;
use mapty_client::{Coordinate, Place};
use tracing::{debug, info, warn};

use crate::domains::{FormValues, Workout, WorkoutFactory, WorkoutType};
use crate::services::Services;
use crate::state::{Event, Outcome, WorkflowState};
use crate::store::{Persistence, WorkoutStore};
use crate::summary::WorkoutSummary;
use crate::view::MapView;
use crate::{MaptyError, MaptyResult, WorkoutId};

/// Everything the workflow may touch while handling one event.
pub struct Context<'a, V, P: Persistence> {
    pub home: Coordinate,
    pub factory: &'a WorkoutFactory,
    pub store: &'a mut WorkoutStore<P>,
    pub view: &'a mut V,
    pub services: &'a Services,
    pub message_timeout: Duration,
}

#[derive(Debug, Clone)]
struct Draft {
    clicked: Coordinate,
    /// `None` while a cycling draft waits for its elevation.
    workout: Option<Workout>,
    elevation_pending: bool,
    resolve_requested: bool,
    /// Place resolved and the photo lookup answered.
    location_done: bool,
}

impl Draft {
    fn new(clicked: Coordinate) -> Self {
        Self {
            clicked,
            workout: None,
            elevation_pending: false,
            resolve_requested: false,
            location_done: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct ConfirmationWorkflow {
    state: WorkflowState,
    selected_type: WorkoutType,
    generation: u64,
    draft: Option<Draft>,
    message: u64,
    message_visible: bool,
    last_outcome: Option<Outcome>,
}

impl ConfirmationWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    /// The type the form currently has selected.
    pub fn selected_type(&self) -> WorkoutType {
        self.selected_type
    }

    pub fn draft(&self) -> Option<&Workout> {
        self.draft.as_ref().and_then(|d| d.workout.as_ref())
    }

    pub fn last_outcome(&self) -> Option<&Outcome> {
        self.last_outcome.as_ref()
    }

    /// Whether a transient message is on screen. Clicks are ignored while
    /// one is.
    pub fn message_visible(&self) -> bool {
        self.message_visible
    }

    /// Handle one event. Only a rejected confirmation returns an error; every
    /// other failure is surfaced through the view and [`Self::last_outcome`].
    pub fn handle<V: MapView, P: Persistence>(
        &mut self,
        event: Event,
        ctx: &mut Context<'_, V, P>,
    ) -> MaptyResult<()> {
        match event {
            Event::MapClicked(at) => self.on_click(at, ctx),
            Event::TypeChanged(kind) => self.on_type_changed(kind, ctx),
            Event::Confirmed(values) => return self.on_confirmed(values, ctx),
            Event::Declined => self.on_declined(ctx),
            Event::ElevationFetched { generation, result } => {
                if self.is_current(generation, "elevation") {
                    self.on_elevation(result, ctx);
                }
            }
            Event::LocationResolved { generation, result } => {
                if self.is_current(generation, "location") {
                    self.on_location(result, ctx);
                }
            }
            Event::PhotoFetched { generation, result } => {
                if self.is_current(generation, "photo") {
                    self.on_photo(result, ctx);
                }
            }
            Event::RouteFetched { id, result } => self.on_route(id, result, ctx),
            Event::MessageExpired { message } => self.on_message_expired(message, ctx),
        }
        Ok(())
    }

    fn is_current(&self, generation: u64, what: &str) -> bool {
        let current = generation == self.generation && self.draft.is_some();
        if !current {
            debug!(generation, current = self.generation, "discarding stale {} result", what);
        }
        current
    }

    fn transition(&mut self, to: WorkflowState) {
        if self.state != to {
            debug!(from = ?self.state, to = ?to, "workflow transition");
            self.state = to;
        }
    }

    fn on_click<V: MapView, P: Persistence>(&mut self, at: Coordinate, ctx: &mut Context<'_, V, P>) {
        if self.state != WorkflowState::Idle || self.message_visible {
            debug!(state = ?self.state, "map click ignored");
            return;
        }
        self.generation += 1;
        self.draft = Some(Draft::new(at));
        self.transition(WorkflowState::Drafting);
        match self.selected_type {
            WorkoutType::Running => self.build_draft(None, ctx),
            WorkoutType::Cycling => self.request_elevation(ctx),
        }
    }

    fn request_elevation<V: MapView, P: Persistence>(&mut self, ctx: &mut Context<'_, V, P>) {
        if let Some(draft) = self.draft.as_mut() {
            draft.elevation_pending = true;
            ctx.services.fetch_elevation(self.generation, draft.clicked);
        }
    }

    fn build_draft<V: MapView, P: Persistence>(
        &mut self,
        gain: Option<f64>,
        ctx: &mut Context<'_, V, P>,
    ) {
        let Some(draft) = self.draft.as_mut() else {
            return;
        };
        let mut workout = ctx.factory.build_typed(
            ctx.home,
            draft.clicked,
            self.selected_type,
            gain,
            &Local::now(),
        );
        while ctx.store.contains(workout.id) {
            warn!(id = %workout.id, "workout id already taken, using the next one");
            workout.id = workout.id.next();
        }
        ctx.view.show_draft(&workout);
        draft.workout = Some(workout);
        if !draft.resolve_requested {
            draft.resolve_requested = true;
            ctx.services.resolve_location(self.generation, draft.clicked);
        }
        self.advance(ctx);
    }

    /// Replace the draft's type-dependent fields.
    fn retype_draft<V: MapView, P: Persistence>(
        &mut self,
        kind: WorkoutType,
        gain: Option<f64>,
        ctx: &mut Context<'_, V, P>,
    ) {
        let Some(draft) = self.draft.as_mut() else {
            return;
        };
        if let Some(workout) = draft.workout.as_ref() {
            let retyped = ctx.factory.retype(workout, kind, gain, &Local::now());
            ctx.view.show_draft(&retyped);
            draft.workout = Some(retyped);
        }
    }

    /// Move on from drafting once metrics are complete.
    fn advance<V: MapView, P: Persistence>(&mut self, ctx: &mut Context<'_, V, P>) {
        let location_done = match self.draft.as_ref() {
            Some(d) if !d.elevation_pending && d.workout.is_some() => d.location_done,
            _ => return,
        };
        if location_done {
            if let Some(workout) = self.draft() {
                ctx.view.show_location(workout);
            }
            self.transition(WorkflowState::AwaitingConfirmation);
        } else {
            self.transition(WorkflowState::Resolving);
        }
    }

    fn on_type_changed<V: MapView, P: Persistence>(
        &mut self,
        kind: WorkoutType,
        ctx: &mut Context<'_, V, P>,
    ) {
        let previous = std::mem::replace(&mut self.selected_type, kind);
        if previous == kind {
            return;
        }
        debug!(from = %previous, to = %kind, "workout type changed");
        let drafting = matches!(
            self.state,
            WorkflowState::Drafting | WorkflowState::Resolving | WorkflowState::AwaitingConfirmation
        );
        if !drafting || self.draft.is_none() {
            return;
        }
        let built = self.draft().is_some();
        match kind {
            WorkoutType::Running => {
                if let Some(draft) = self.draft.as_mut() {
                    draft.elevation_pending = false;
                }
                if built {
                    self.retype_draft(WorkoutType::Running, None, ctx);
                    self.advance(ctx);
                } else {
                    self.build_draft(None, ctx);
                }
            }
            WorkoutType::Cycling => {
                self.retype_draft(WorkoutType::Cycling, None, ctx);
                self.request_elevation(ctx);
                self.transition(WorkflowState::Drafting);
            }
        }
    }

    fn on_elevation<V: MapView, P: Persistence>(
        &mut self,
        result: Result<f64, MaptyError>,
        ctx: &mut Context<'_, V, P>,
    ) {
        let Some(draft) = self.draft.as_mut() else {
            return;
        };
        if !draft.elevation_pending {
            debug!("elevation no longer needed");
            return;
        }
        match result {
            Err(e) => self.fail(e, ctx),
            Ok(gain) => {
                draft.elevation_pending = false;
                if draft.workout.is_some() {
                    self.retype_draft(WorkoutType::Cycling, Some(gain), ctx);
                    self.advance(ctx);
                } else {
                    self.build_draft(Some(gain), ctx);
                }
            }
        }
    }

    fn on_location<V: MapView, P: Persistence>(
        &mut self,
        result: Result<Place, MaptyError>,
        ctx: &mut Context<'_, V, P>,
    ) {
        match result {
            Err(e) => self.fail(e, ctx),
            Ok(place) => {
                let Some(workout) = self.draft.as_mut().and_then(|d| d.workout.as_mut()) else {
                    return;
                };
                debug!(city = %place.city, street = %place.street, "location resolved");
                let at = place.coordinate;
                workout.place = Some(place);
                ctx.services.fetch_photo(self.generation, at);
            }
        }
    }

    fn on_photo<V: MapView, P: Persistence>(
        &mut self,
        result: Result<String, MaptyError>,
        ctx: &mut Context<'_, V, P>,
    ) {
        let photo = match result {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(error = %e, "keeping resolved place without a photo");
                self.notify(&e.to_string(), ctx);
                None
            }
        };
        let Some(draft) = self.draft.as_mut() else {
            return;
        };
        if let Some(place) = draft.workout.as_mut().and_then(|w| w.place.as_mut()) {
            place.photo = photo;
        }
        draft.location_done = true;
        self.advance(ctx);
    }

    fn on_confirmed<V: MapView, P: Persistence>(
        &mut self,
        values: Option<FormValues>,
        ctx: &mut Context<'_, V, P>,
    ) -> MaptyResult<()> {
        if self.state != WorkflowState::AwaitingConfirmation {
            debug!(state = ?self.state, "confirmation ignored");
            return Ok(());
        }
        let Some(draft) = self.draft().cloned() else {
            return Ok(());
        };
        let values = values.unwrap_or_else(|| FormValues::from_workout(&draft));
        let workout = match values.apply_to(&draft) {
            Ok(workout) => workout,
            Err(e) => {
                debug!(error = %e, "confirmation rejected");
                self.notify(&e.to_string(), ctx);
                return Err(e);
            }
        };

        self.transition(WorkflowState::Finalizing);
        if let Err(e) = ctx.store.add(workout.clone()) {
            warn!(error = %e, "could not persist workout");
            self.transition(WorkflowState::AwaitingConfirmation);
            self.notify(&e.to_string(), ctx);
            return Err(e);
        }
        info!(id = %workout.id, kind = %workout.workout_type(), "workout committed");

        ctx.view.hide_location();
        ctx.view.show_workout(&WorkoutSummary::of(&workout));
        ctx.services.fetch_route(
            workout.id,
            workout.workout_type().route_profile(),
            workout.home,
            workout.position,
        );
        self.finish(Outcome::Committed(workout.id), ctx);
        Ok(())
    }

    fn on_declined<V: MapView, P: Persistence>(&mut self, ctx: &mut Context<'_, V, P>) {
        if self.state != WorkflowState::AwaitingConfirmation {
            debug!(state = ?self.state, "decline ignored");
            return;
        }
        info!("draft discarded");
        ctx.view.hide_location();
        self.finish(Outcome::Discarded, ctx);
    }

    fn finish<V: MapView, P: Persistence>(&mut self, outcome: Outcome, ctx: &mut Context<'_, V, P>) {
        self.draft = None;
        self.selected_type = WorkoutType::Running;
        ctx.view.reset_form();
        self.transition(WorkflowState::Idle);
        self.last_outcome = Some(outcome);
    }

    fn fail<V: MapView, P: Persistence>(&mut self, error: MaptyError, ctx: &mut Context<'_, V, P>) {
        warn!(error = %error, "draft abandoned");
        self.draft = None;
        self.transition(WorkflowState::Failed);
        ctx.view.hide_location();
        ctx.view.reset_form();
        self.notify(&error.to_string(), ctx);
        self.last_outcome = Some(Outcome::Failed(error));
    }

    fn on_route<V: MapView, P: Persistence>(
        &mut self,
        id: WorkoutId,
        result: Result<Vec<Coordinate>, MaptyError>,
        ctx: &mut Context<'_, V, P>,
    ) {
        match result {
            Ok(route) => {
                if !ctx.store.contains(id) {
                    debug!(id = %id, "route for a removed workout dropped");
                    return;
                }
                if let Err(e) = ctx.store.set_route(id, route.clone()) {
                    warn!(id = %id, error = %e, "could not persist route");
                }
                ctx.view.draw_route(id, &route);
            }
            Err(e) => {
                warn!(id = %id, error = %e, "route unavailable");
                self.notify(&e.to_string(), ctx);
            }
        }
    }

    /// Show a transient message and schedule its dismissal.
    fn notify<V: MapView, P: Persistence>(&mut self, text: &str, ctx: &mut Context<'_, V, P>) {
        self.message += 1;
        self.message_visible = true;
        ctx.view.show_message(text);
        ctx.services.dismiss_after(self.message, ctx.message_timeout);
    }

    fn on_message_expired<V: MapView, P: Persistence>(
        &mut self,
        message: u64,
        ctx: &mut Context<'_, V, P>,
    ) {
        if message != self.message {
            return;
        }
        self.message_visible = false;
        ctx.view.dismiss_message();
        if self.state == WorkflowState::Failed {
            self.transition(WorkflowState::Idle);
        }
    }
}
