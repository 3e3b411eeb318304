//! Background jobs for the map collaborators.
//!
//! Each call runs on its own tokio task and reports back to the session as
//! an [`Event`] on an unbounded channel. Jobs are never cancelled; a result
//! that arrives after its draft was abandoned carries a stale generation and
//! is dropped by the workflow.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use mapty_client::{Coordinate, ElevationSource, LocationResolver, RouteProfile, RouteSource};
use tokio::sync::mpsc;

use crate::state::Event;
use crate::{MaptyError, WorkoutId};

/// The three collaborators a session talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub resolver: Arc<dyn LocationResolver>,
    pub elevation: Arc<dyn ElevationSource>,
    pub routes: Arc<dyn RouteSource>,
}

impl Collaborators {
    /// Use one client for every collaborator.
    pub fn from_client<C>(client: C) -> Self
    where
        C: LocationResolver + ElevationSource + RouteSource,
    {
        let client = Arc::new(client);
        Self {
            resolver: client.clone(),
            elevation: client.clone(),
            routes: client,
        }
    }
}

pub struct Services {
    collaborators: Collaborators,
    tx: mpsc::UnboundedSender<Event>,
    in_flight: Arc<AtomicUsize>,
}

impl Services {
    pub fn new(collaborators: Collaborators) -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let services = Self {
            collaborators,
            tx,
            in_flight: Arc::new(AtomicUsize::new(0)),
        };
        (services, rx)
    }

    /// Jobs spawned whose event has not been received yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Account for one received event.
    pub(crate) fn job_finished(&self) {
        let _ = self
            .in_flight
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    pub fn resolve_location(&self, generation: u64, at: Coordinate) {
        let resolver = self.collaborators.resolver.clone();
        self.spawn(async move {
            let result = resolver
                .resolve(at)
                .await
                .map_err(|e| MaptyError::LocationNotFound(e.to_string()));
            Event::LocationResolved { generation, result }
        });
    }

    pub fn fetch_photo(&self, generation: u64, at: Coordinate) {
        let resolver = self.collaborators.resolver.clone();
        self.spawn(async move {
            let result = resolver
                .fetch_photo(at)
                .await
                .map_err(|e| MaptyError::PhotoUnavailable(e.to_string()));
            Event::PhotoFetched { generation, result }
        });
    }

    pub fn fetch_elevation(&self, generation: u64, at: Coordinate) {
        let elevation = self.collaborators.elevation.clone();
        self.spawn(async move {
            let result = elevation
                .elevation_gain(at)
                .await
                .map_err(|e| MaptyError::ElevationUnavailable(e.to_string()));
            Event::ElevationFetched { generation, result }
        });
    }

    pub fn fetch_route(
        &self,
        id: WorkoutId,
        profile: RouteProfile,
        from: Coordinate,
        to: Coordinate,
    ) {
        let routes = self.collaborators.routes.clone();
        self.spawn(async move {
            let result = routes
                .route(profile, from, to)
                .await
                .map_err(|e| MaptyError::RouteUnavailable(e.to_string()));
            Event::RouteFetched { id, result }
        });
    }

    /// Expire message number `message` after `after`.
    pub fn dismiss_after(&self, message: u64, after: Duration) {
        self.spawn(async move {
            tokio::time::sleep(after).await;
            Event::MessageExpired { message }
        });
    }

    fn spawn<F>(&self, job: F)
    where
        F: std::future::Future<Output = Event> + Send + 'static,
    {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let event = job.await;
            // The receiver only goes away with the session.
            let _ = tx.send(event);
        });
    }
}
