//! One tracking session: home position, stored workouts, the view and the
//! confirmation workflow, owned together and passed explicitly to the
//! workflow for every event.

use std::time::Duration;

use mapty_client::Coordinate;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::domains::{Workout, WorkoutFactory, WorkoutType};
use crate::services::{Collaborators, Services};
use crate::state::{Event, Outcome, WorkflowState};
use crate::store::{Persistence, WorkoutStore};
use crate::summary::WorkoutSummary;
use crate::view::MapView;
use crate::workflow::{ConfirmationWorkflow, Context};
use crate::{MaptyError, MaptyResult, WorkoutId};

pub struct Session<V: MapView, P: Persistence> {
    home: Coordinate,
    factory: WorkoutFactory,
    store: WorkoutStore<P>,
    view: V,
    services: Services,
    events: mpsc::UnboundedReceiver<Event>,
    workflow: ConfirmationWorkflow,
    message_timeout: Duration,
}

impl<V: MapView, P: Persistence> Session<V, P> {
    /// Create a session. Must be called inside a tokio runtime, since
    /// collaborator calls are spawned onto it.
    pub fn new(
        config: &SessionConfig,
        persistence: P,
        view: V,
        collaborators: Collaborators,
    ) -> Self {
        let (services, events) = Services::new(collaborators);
        Self {
            home: config.home,
            factory: WorkoutFactory::new(config.metrics),
            store: WorkoutStore::open(persistence),
            view,
            services,
            events,
            workflow: ConfirmationWorkflow::new(),
            message_timeout: config.message_timeout,
        }
    }

    /// Center on home and render everything already stored. Stored workouts
    /// without a route get one requested again.
    pub fn start(&mut self) {
        self.view.center_on(self.home);
        self.view.show_home(self.home);
        for workout in self.store.workouts() {
            self.view.show_workout(&WorkoutSummary::of(workout));
            match &workout.route {
                Some(route) => self.view.draw_route(workout.id, route),
                None => self.services.fetch_route(
                    workout.id,
                    workout.workout_type().route_profile(),
                    workout.home,
                    workout.position,
                ),
            }
        }
        info!(count = self.store.len(), "session restored");
    }

    pub fn dispatch(&mut self, event: Event) -> MaptyResult<()> {
        let mut ctx = Context {
            home: self.home,
            factory: &self.factory,
            store: &mut self.store,
            view: &mut self.view,
            services: &self.services,
            message_timeout: self.message_timeout,
        };
        self.workflow.handle(event, &mut ctx)
    }

    pub fn click(&mut self, at: Coordinate) -> MaptyResult<()> {
        self.dispatch(Event::MapClicked(at))
    }

    pub fn select_type(&mut self, kind: WorkoutType) -> MaptyResult<()> {
        self.dispatch(Event::TypeChanged(kind))
    }

    /// Wait for the next collaborator result. Pending forever when nothing
    /// is in flight.
    pub async fn next_event(&mut self) -> Option<Event> {
        let event = self.events.recv().await?;
        self.services.job_finished();
        Some(event)
    }

    /// Handle one collaborator result, if any job is still running.
    /// Returns whether an event was handled.
    pub async fn step(&mut self) -> MaptyResult<bool> {
        if self.services.in_flight() == 0 {
            return Ok(false);
        }
        match self.next_event().await {
            Some(event) => {
                self.dispatch(event)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Handle collaborator results until no job is left running.
    pub async fn settle(&mut self) -> MaptyResult<()> {
        while self.step().await? {}
        Ok(())
    }

    pub fn remove(&mut self, id: WorkoutId) -> MaptyResult<()> {
        self.store.remove(id)?;
        self.view.remove_workout(id);
        info!(id = %id, "workout removed");
        Ok(())
    }

    pub fn clear(&mut self) -> MaptyResult<()> {
        self.store.clear()?;
        self.view.clear_workouts();
        info!("all workouts removed");
        Ok(())
    }

    /// Fly the map to a stored workout.
    pub fn go_to(&mut self, id: WorkoutId) -> MaptyResult<()> {
        let position = self
            .store
            .get(id)
            .map(|w| w.position)
            .ok_or(MaptyError::NotFound(id))?;
        debug!(id = %id, "flying to workout");
        self.view.fly_to(position);
        Ok(())
    }

    pub fn go_home(&mut self) {
        self.view.fly_to(self.home);
    }

    /// Re-render the whole list.
    pub fn render_list(&mut self) {
        self.view.clear_workouts();
        for workout in self.store.workouts() {
            self.view.show_workout(&WorkoutSummary::of(workout));
        }
    }

    pub fn home(&self) -> Coordinate {
        self.home
    }

    pub fn state(&self) -> WorkflowState {
        self.workflow.state()
    }

    pub fn selected_type(&self) -> WorkoutType {
        self.workflow.selected_type()
    }

    pub fn draft(&self) -> Option<&Workout> {
        self.workflow.draft()
    }

    pub fn last_outcome(&self) -> Option<&Outcome> {
        self.workflow.last_outcome()
    }

    pub fn workouts(&self) -> &[Workout] {
        self.store.workouts()
    }

    pub fn store(&self) -> &WorkoutStore<P> {
        &self.store
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::{FormValues, WorkoutKind};
    use crate::store::MemoryPersistence;
    use crate::test_utils::{ScriptedMap, place_at, test_config};
    use crate::view::{RecordingView, ViewEvent};

    const CLICK: Coordinate = Coordinate::new(-122.41, 37.78);

    fn session(map: ScriptedMap) -> Session<RecordingView, MemoryPersistence> {
        Session::new(
            &test_config(),
            MemoryPersistence::new(),
            RecordingView::new(),
            Collaborators::from_client(map),
        )
    }

    /// Handle results until the draft waits for the user.
    async fn until_confirmation(s: &mut Session<RecordingView, MemoryPersistence>) {
        while s.state() != WorkflowState::AwaitingConfirmation {
            assert!(s.step().await.unwrap(), "stalled in {:?}", s.state());
        }
    }

    #[tokio::test]
    async fn click_resolve_confirm_commits() {
        let mut s = session(ScriptedMap::default());
        s.click(CLICK).unwrap();
        assert_eq!(s.state(), WorkflowState::Resolving);
        until_confirmation(&mut s).await;

        let draft = s.draft().unwrap().clone();
        let place = draft.place.as_ref().unwrap();
        assert_eq!(place.city, "San Francisco");
        assert_eq!(place.photo.as_deref(), Some("https://photos.test/sf.jpg"));

        s.dispatch(Event::Confirmed(None)).unwrap();
        assert_eq!(s.state(), WorkflowState::Idle);
        assert_eq!(s.last_outcome(), Some(&Outcome::Committed(draft.id)));
        assert_eq!(s.workouts().len(), 1);

        s.settle().await.unwrap();
        assert_eq!(s.workouts()[0].route.as_ref().unwrap().len(), 2);
        assert!(
            s.view()
                .events()
                .iter()
                .any(|e| matches!(e, ViewEvent::RouteDrawn { id, .. } if *id == draft.id))
        );
    }

    #[tokio::test]
    async fn decline_discards() {
        let mut s = session(ScriptedMap::default());
        s.click(CLICK).unwrap();
        until_confirmation(&mut s).await;
        s.dispatch(Event::Declined).unwrap();
        assert_eq!(s.last_outcome(), Some(&Outcome::Discarded));
        assert!(s.workouts().is_empty());
        assert!(s.draft().is_none());
    }

    #[tokio::test]
    async fn second_click_is_ignored() {
        let mut s = session(ScriptedMap::default());
        s.click(CLICK).unwrap();
        let first = s.draft().unwrap().clone();
        s.click(Coordinate::new(2.35, 48.85)).unwrap();
        assert_eq!(s.draft().unwrap(), &first);
        until_confirmation(&mut s).await;
        s.click(Coordinate::new(2.35, 48.85)).unwrap();
        assert_eq!(s.draft().unwrap().position, CLICK);
    }

    #[tokio::test]
    async fn location_failure_resets_after_message() {
        let mut s = session(ScriptedMap::default().with_place(Err("no address".into())));
        s.click(CLICK).unwrap();
        assert!(s.step().await.unwrap());
        assert_eq!(s.state(), WorkflowState::Failed);
        assert!(matches!(
            s.last_outcome(),
            Some(Outcome::Failed(MaptyError::LocationNotFound(_)))
        ));
        assert!(s.draft().is_none());

        // clicks are rejected until the message expires
        s.click(CLICK).unwrap();
        assert_eq!(s.state(), WorkflowState::Failed);

        s.settle().await.unwrap();
        assert_eq!(s.state(), WorkflowState::Idle);
        assert!(s.workouts().is_empty());
    }

    #[tokio::test]
    async fn photo_failure_keeps_place() {
        let mut s = session(ScriptedMap::default().with_photo(Err("no imagery".into())));
        s.click(CLICK).unwrap();
        until_confirmation(&mut s).await;
        let place = s.draft().unwrap().place.clone().unwrap();
        assert!(place.photo.is_none());
        assert!(
            s.view()
                .events()
                .iter()
                .any(|e| matches!(e, ViewEvent::Message { .. }))
        );
    }

    #[tokio::test]
    async fn cycling_waits_for_elevation() {
        let mut s = session(ScriptedMap::default().with_elevation(Ok(120.0)));
        s.select_type(WorkoutType::Cycling).unwrap();
        s.click(CLICK).unwrap();
        assert_eq!(s.state(), WorkflowState::Drafting);
        assert!(s.draft().is_none());

        until_confirmation(&mut s).await;
        assert_eq!(s.draft().unwrap().kind, WorkoutKind::Cycling { gain: 120.0 });
    }

    #[tokio::test]
    async fn elevation_failure_fails_draft() {
        let mut s = session(ScriptedMap::default().with_elevation(Err("no contours".into())));
        s.select_type(WorkoutType::Cycling).unwrap();
        s.click(CLICK).unwrap();
        assert!(s.step().await.unwrap());
        assert!(matches!(
            s.last_outcome(),
            Some(Outcome::Failed(MaptyError::ElevationUnavailable(_)))
        ));
    }

    #[tokio::test]
    async fn type_change_recomputes_draft() {
        let mut s = session(ScriptedMap::default().with_elevation(Ok(33.0)));
        s.click(CLICK).unwrap();
        until_confirmation(&mut s).await;
        let running = s.draft().unwrap().clone();

        s.select_type(WorkoutType::Cycling).unwrap();
        assert_eq!(s.state(), WorkflowState::Drafting);
        until_confirmation(&mut s).await;

        let cycling = s.draft().unwrap();
        assert_eq!(cycling.id, running.id);
        assert_eq!(cycling.kind, WorkoutKind::Cycling { gain: 33.0 });
        assert_eq!(cycling.duration, 4);
        assert_eq!(cycling.place, running.place);
        assert!(cycling.description.starts_with("Cycling on "));

        s.select_type(WorkoutType::Running).unwrap();
        assert_eq!(s.state(), WorkflowState::AwaitingConfirmation);
        assert_eq!(s.draft().unwrap().kind, WorkoutKind::Running { cadence: 207 });
    }

    #[tokio::test]
    async fn switching_to_running_ignores_pending_elevation() {
        for elevation in [Err("no contours".to_string()), Ok(99.0)] {
            let mut s = session(ScriptedMap::default().with_elevation(elevation));
            s.select_type(WorkoutType::Cycling).unwrap();
            s.click(CLICK).unwrap();
            assert!(s.draft().is_none());

            s.select_type(WorkoutType::Running).unwrap();
            assert_eq!(s.state(), WorkflowState::Resolving);
            until_confirmation(&mut s).await;
            s.settle().await.unwrap();

            assert_eq!(s.state(), WorkflowState::AwaitingConfirmation);
            assert_eq!(s.draft().unwrap().kind, WorkoutKind::Running { cadence: 207 });
            assert!(s.last_outcome().is_none());
            assert!(
                !s.view()
                    .events()
                    .iter()
                    .any(|e| matches!(e, ViewEvent::Message { .. }))
            );
        }
    }

    #[tokio::test]
    async fn invalid_values_keep_awaiting_confirmation() {
        let mut s = session(ScriptedMap::default());
        s.click(CLICK).unwrap();
        until_confirmation(&mut s).await;

        let err = s
            .dispatch(Event::Confirmed(Some(FormValues::parse("1", "x", "170"))))
            .unwrap_err();
        assert!(matches!(err, MaptyError::Validation(_)));
        assert_eq!(s.state(), WorkflowState::AwaitingConfirmation);
        assert!(s.workouts().is_empty());

        s.dispatch(Event::Confirmed(Some(FormValues::parse("1.5", "14", "160"))))
            .unwrap();
        assert_eq!(s.workouts()[0].distance, 1.5);
        assert_eq!(s.selected_type(), WorkoutType::Running);
    }

    #[tokio::test]
    async fn stale_results_are_discarded() {
        let mut s = session(ScriptedMap::default());
        s.click(CLICK).unwrap();
        until_confirmation(&mut s).await;
        s.dispatch(Event::Declined).unwrap();

        s.dispatch(Event::LocationResolved {
            generation: 1,
            result: Ok(place_at(CLICK)),
        })
        .unwrap();
        assert_eq!(s.state(), WorkflowState::Idle);
        assert!(s.draft().is_none());
    }

    #[tokio::test]
    async fn route_failure_keeps_commit() {
        let mut s = session(ScriptedMap::default().with_route(Err("no route".into())));
        s.click(CLICK).unwrap();
        until_confirmation(&mut s).await;
        s.dispatch(Event::Confirmed(None)).unwrap();
        s.settle().await.unwrap();
        assert_eq!(s.workouts().len(), 1);
        assert!(s.workouts()[0].route.is_none());
        assert!(s.view().events().iter().any(
            |e| matches!(e, ViewEvent::Message { text } if text.starts_with("Could not create route"))
        ));
    }

    #[tokio::test]
    async fn list_operations() {
        let mut s = session(ScriptedMap::default());
        s.click(CLICK).unwrap();
        until_confirmation(&mut s).await;
        s.dispatch(Event::Confirmed(None)).unwrap();
        s.settle().await.unwrap();
        let id = s.workouts()[0].id;

        s.view_mut().take_events();
        s.go_to(id).unwrap();
        s.go_home();
        assert_eq!(
            s.view_mut().take_events(),
            vec![
                ViewEvent::FlyTo { center: CLICK },
                ViewEvent::FlyTo { center: s.home() },
            ]
        );

        assert_eq!(s.go_to(WorkoutId::new(1)), Err(MaptyError::NotFound(WorkoutId::new(1))));
        s.remove(id).unwrap();
        assert!(s.workouts().is_empty());
        assert!(s.remove(id).is_err());
        s.clear().unwrap();
    }

    #[tokio::test]
    async fn start_restores_stored_workouts() {
        let stored = WorkoutFactory::default().build_typed(
            test_config().home,
            CLICK,
            WorkoutType::Running,
            None,
            &chrono::Local::now(),
        );
        let data = serde_json::to_string(&vec![stored.clone()]).unwrap();
        let mut s = Session::new(
            &test_config(),
            MemoryPersistence::with_data(data),
            RecordingView::new(),
            Collaborators::from_client(ScriptedMap::default()),
        );
        s.start();
        s.settle().await.unwrap();

        let events = s.view().events();
        assert_eq!(events[0], ViewEvent::MapCentered { center: s.home() });
        assert!(matches!(&events[2], ViewEvent::WorkoutShown { summary } if summary.id == stored.id));
        assert!(s.workouts()[0].route.is_some());
    }
}
