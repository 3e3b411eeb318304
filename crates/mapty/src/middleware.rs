//! Cross-cutting concerns around the map collaborators.
//!
//! [`LoggingMiddleware`] sits between the session's background jobs and the
//! real client, timing every call, logging it and recording request metrics.

use std::sync::Arc;
use std::time::Instant;

use mapty_client::observability::{Outcome, record_request};
use mapty_client::{
    Coordinate, ElevationSource, LocationResolver, MapError, Place, RouteProfile, RouteSource,
};
use tracing::debug;

#[derive(Clone)]
pub struct LoggingMiddleware<C> {
    inner: Arc<C>,
}

impl<C> LoggingMiddleware<C> {
    pub fn new(client: C) -> Self {
        Self {
            inner: Arc::new(client),
        }
    }

    /// Run one collaborator call with timing, logging and metrics.
    async fn with_logging<F, Fut, T>(&self, operation: F, name: &'static str) -> Result<T, MapError>
    where
        F: FnOnce(Arc<C>) -> Fut,
        Fut: std::future::Future<Output = Result<T, MapError>>,
    {
        let start = Instant::now();
        debug!("Starting operation: {}", name);

        let result = operation(self.inner.clone()).await;

        let duration = start.elapsed();
        match &result {
            Ok(_) => debug!("Operation completed successfully: {} in {:?}", name, duration),
            Err(e) => debug!("Operation failed: {} in {:?} - error: {}", name, duration, e),
        }
        record_request(name, Outcome::of(&result), duration);

        result
    }
}

#[async_trait::async_trait]
impl<C: LocationResolver> LocationResolver for LoggingMiddleware<C> {
    async fn resolve(&self, at: Coordinate) -> Result<Place, MapError> {
        self.with_logging(|client| async move { client.resolve(at).await }, "resolve")
            .await
    }

    async fn fetch_photo(&self, at: Coordinate) -> Result<String, MapError> {
        self.with_logging(
            |client| async move { client.fetch_photo(at).await },
            "fetch_photo",
        )
        .await
    }
}

#[async_trait::async_trait]
impl<C: ElevationSource> ElevationSource for LoggingMiddleware<C> {
    async fn elevation_gain(&self, at: Coordinate) -> Result<f64, MapError> {
        self.with_logging(
            |client| async move { client.elevation_gain(at).await },
            "elevation_gain",
        )
        .await
    }
}

#[async_trait::async_trait]
impl<C: RouteSource> RouteSource for LoggingMiddleware<C> {
    async fn route(
        &self,
        profile: RouteProfile,
        from: Coordinate,
        to: Coordinate,
    ) -> Result<Vec<Coordinate>, MapError> {
        self.with_logging(
            |client| async move { client.route(profile, from, to).await },
            "route",
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ScriptedMap;

    #[tokio::test]
    async fn passes_results_through() {
        let map = ScriptedMap::default().with_elevation(Ok(42.0));
        let middleware = LoggingMiddleware::new(map);
        let gain = middleware
            .elevation_gain(Coordinate::new(0.0, 0.0))
            .await
            .unwrap();
        assert_eq!(gain, 42.0);
    }

    #[tokio::test]
    async fn passes_errors_through() {
        let map = ScriptedMap::default().with_route(Err("no route".into()));
        let middleware = LoggingMiddleware::new(map);
        let err = middleware
            .route(
                RouteProfile::Walking,
                Coordinate::new(0.0, 0.0),
                Coordinate::new(1.0, 1.0),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, MapError::NotFound(_)));
    }
}
