//! Scripted map collaborators and fixtures shared by unit tests.
#![cfg(test)]

use std::time::Duration;

use async_trait::async_trait;
use mapty_client::{
    Coordinate, ElevationSource, LocationResolver, MapError, Place, RouteProfile, RouteSource,
};

use crate::config::SessionConfig;
use crate::domains::MetricsParams;

pub fn test_config() -> SessionConfig {
    SessionConfig {
        home: Coordinate::new(-122.42, 37.77),
        data_dir: ".".into(),
        metrics: MetricsParams::default(),
        message_timeout: Duration::from_millis(5),
    }
}

pub fn place_at(at: Coordinate) -> Place {
    Place {
        country: "United States".into(),
        state: "California".into(),
        city: "San Francisco".into(),
        street: "Market Street".into(),
        coordinate: at,
        photo: None,
    }
}

/// Answers every collaborator call with a fixed result. Errors are given as
/// messages and returned as [`MapError::NotFound`].
#[derive(Clone, Debug)]
pub struct ScriptedMap {
    place: Option<Result<Place, String>>,
    photo: Result<String, String>,
    elevation: Result<f64, String>,
    route: Option<Result<Vec<Coordinate>, String>>,
}

impl Default for ScriptedMap {
    fn default() -> Self {
        Self {
            place: None,
            photo: Ok("https://photos.test/sf.jpg".into()),
            elevation: Ok(50.0),
            route: None,
        }
    }
}

impl ScriptedMap {
    pub fn with_place(mut self, place: Result<Place, String>) -> Self {
        self.place = Some(place);
        self
    }

    pub fn with_photo(mut self, photo: Result<String, String>) -> Self {
        self.photo = photo;
        self
    }

    pub fn with_elevation(mut self, elevation: Result<f64, String>) -> Self {
        self.elevation = elevation;
        self
    }

    pub fn with_route(mut self, route: Result<Vec<Coordinate>, String>) -> Self {
        self.route = Some(route);
        self
    }
}

#[async_trait]
impl LocationResolver for ScriptedMap {
    async fn resolve(&self, at: Coordinate) -> Result<Place, MapError> {
        match &self.place {
            None => Ok(place_at(at)),
            Some(scripted) => scripted.clone().map_err(MapError::NotFound),
        }
    }

    async fn fetch_photo(&self, _at: Coordinate) -> Result<String, MapError> {
        self.photo.clone().map_err(MapError::NotFound)
    }
}

#[async_trait]
impl ElevationSource for ScriptedMap {
    async fn elevation_gain(&self, _at: Coordinate) -> Result<f64, MapError> {
        self.elevation.clone().map_err(MapError::NotFound)
    }
}

#[async_trait]
impl RouteSource for ScriptedMap {
    async fn route(
        &self,
        _profile: RouteProfile,
        from: Coordinate,
        to: Coordinate,
    ) -> Result<Vec<Coordinate>, MapError> {
        match &self.route {
            None => Ok(vec![from, to]),
            Some(scripted) => scripted.clone().map_err(MapError::NotFound),
        }
    }
}
