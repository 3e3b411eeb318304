//! Map collaborators used by the workout tracker: reverse geocoding,
//! street imagery, terrain elevation and routing.
//!
//! The traits here are the narrow contracts the core depends on; the
//! reqwest-backed implementation lives in [`http_client`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod config;
pub mod http_client;
pub mod observability;
pub mod utils;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
}

impl MapError {
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            404 => MapError::NotFound(body),
            _ => MapError::Status { status, body },
        }
    }
}

/// A point on the map, longitude first.
///
/// Serialized as a `[lng, lat]` pair, the order every map service in this
/// crate expects.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    pub lng: f64,
    pub lat: f64,
}

impl Coordinate {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from([lng, lat]: [f64; 2]) -> Self {
        Self { lng, lat }
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(c: Coordinate) -> Self {
        [c.lng, c.lat]
    }
}

/// Structured result of a reverse geocoding lookup.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Place {
    pub country: String,
    pub state: String,
    pub city: String,
    pub street: String,
    #[serde(rename = "coords")]
    pub coordinate: Coordinate,
    /// Street-level photo reference, attached after a successful photo fetch.
    #[serde(rename = "url", default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RouteProfile {
    Walking,
    Cycling,
}

impl RouteProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteProfile::Walking => "walking",
            RouteProfile::Cycling => "cycling",
        }
    }
}

#[async_trait]
pub trait LocationResolver: Send + Sync + 'static {
    /// Reverse geocode `at`. Any missing field in the service response is
    /// reported as an error; partial places are never returned.
    async fn resolve(&self, at: Coordinate) -> Result<Place, MapError>;

    /// Fetch a street-level photo reference for `at`.
    async fn fetch_photo(&self, at: Coordinate) -> Result<String, MapError>;
}

#[async_trait]
pub trait ElevationSource: Send + Sync + 'static {
    /// Elevation (meters) reported by the terrain data around `at`.
    async fn elevation_gain(&self, at: Coordinate) -> Result<f64, MapError>;
}

#[async_trait]
pub trait RouteSource: Send + Sync + 'static {
    async fn route(
        &self,
        profile: RouteProfile,
        from: Coordinate,
        to: Coordinate,
    ) -> Result<Vec<Coordinate>, MapError>;
}
