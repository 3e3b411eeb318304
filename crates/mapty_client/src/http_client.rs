//! HTTP implementation of the map collaborators.
//!
//! This module provides a reqwest-based [`ReqwestMapClient`] implementing
//! [`LocationResolver`](crate::LocationResolver),
//! [`ElevationSource`](crate::ElevationSource) and
//! [`RouteSource`](crate::RouteSource) against Mapbox and Google Street View.

use crate::config::Config;
use crate::utils::{body_snippet, lat_lng, lng_lat};
use crate::{
    Coordinate, ElevationSource, LocationResolver, MapError, Place, RouteProfile, RouteSource,
};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};

const STREETVIEW_SIZE: &str = "600x400";
const STREETVIEW_HEADING: &str = "151.78";
const STREETVIEW_PITCH: &str = "-0.76";
const TERRAIN_FEATURE_LIMIT: &str = "50";

/// Client for the Mapbox and Street View APIs using reqwest.
#[derive(Clone, Debug)]
pub struct ReqwestMapClient {
    mapbox_base_url: String,
    streetview_base_url: String,
    mapbox_token: SecretString,
    streetview_key: SecretString,
    client: reqwest::Client,
}

impl ReqwestMapClient {
    pub fn new(config: &Config) -> Self {
        Self {
            mapbox_base_url: config.mapbox_base_url.trim_end_matches('/').to_string(),
            streetview_base_url: config.streetview_base_url.trim_end_matches('/').to_string(),
            mapbox_token: config.mapbox_token.clone(),
            streetview_key: config.streetview_key.clone(),
            client: reqwest::Client::new(),
        }
    }

    /// Build a GET request carrying the Mapbox access token.
    fn mapbox_request(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .query(&[("access_token", self.mapbox_token.expose_secret())])
    }

    /// Execute a request and decode the JSON body.
    async fn execute_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, MapError> {
        let resp = request.send().await?;
        if !resp.status().is_success() {
            return Err(self.error_from_response(resp).await);
        }
        // Read as text so a shape mismatch is reported with the body attached.
        let text = resp.text().await?;
        serde_json::from_str::<T>(&text).map_err(|e| {
            warn!(error = %e, "map service returned an unexpected body");
            MapError::Malformed(format!("{} - body: {}", e, body_snippet(&text, 256)))
        })
    }

    /// Extract error information from a failed response.
    async fn error_from_response(&self, resp: reqwest::Response) -> MapError {
        let status = resp.status().as_u16();
        let url = resp.url().path().to_string();
        let body = resp.text().await.unwrap_or_default();
        warn!(status, path = %url, "map service request failed");
        MapError::from_status(status, body_snippet(&body, 256))
    }
}

#[derive(Deserialize)]
struct GeocodePayload {
    #[serde(default)]
    features: Vec<GeocodeFeature>,
}

#[derive(Deserialize)]
struct GeocodeFeature {
    geometry: Option<PointGeometry>,
    properties: Option<GeocodeProperties>,
}

#[derive(Deserialize)]
struct PointGeometry {
    coordinates: Coordinate,
}

#[derive(Deserialize)]
struct GeocodeProperties {
    context: Option<GeocodeContext>,
}

#[derive(Deserialize)]
struct GeocodeContext {
    country: Option<Named>,
    region: Option<Named>,
    place: Option<Named>,
    address: Option<Named>,
}

#[derive(Deserialize)]
struct Named {
    name: Option<String>,
}

fn required(field: Option<Named>, path: &str) -> Result<String, MapError> {
    field
        .and_then(|n| n.name)
        .ok_or_else(|| MapError::Malformed(format!("missing {path}")))
}

impl GeocodePayload {
    fn into_place(self) -> Result<Place, MapError> {
        let feature = self
            .features
            .into_iter()
            .next()
            .ok_or_else(|| {
                debug!("reverse geocoding returned no features");
                MapError::NotFound("no address at this location".into())
            })?;
        let geometry = feature
            .geometry
            .ok_or_else(|| MapError::Malformed("missing geometry".into()))?;
        let context = feature
            .properties
            .and_then(|p| p.context)
            .ok_or_else(|| MapError::Malformed("missing properties.context".into()))?;
        Ok(Place {
            country: required(context.country, "context.country.name")?,
            state: required(context.region, "context.region.name")?,
            city: required(context.place, "context.place.name")?,
            street: required(context.address, "context.address.name")?,
            coordinate: geometry.coordinates,
            photo: None,
        })
    }
}

#[derive(Deserialize)]
struct TilequeryPayload {
    #[serde(default)]
    features: Vec<TilequeryFeature>,
}

#[derive(Deserialize)]
struct TilequeryFeature {
    properties: Option<TilequeryProperties>,
}

#[derive(Deserialize)]
struct TilequeryProperties {
    ele: Option<f64>,
}

#[derive(Deserialize)]
struct DirectionsPayload {
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Deserialize)]
struct DirectionsRoute {
    geometry: LineGeometry,
}

#[derive(Deserialize)]
struct LineGeometry {
    coordinates: Vec<Coordinate>,
}

#[async_trait]
impl LocationResolver for ReqwestMapClient {
    async fn resolve(&self, at: Coordinate) -> Result<Place, MapError> {
        let url = format!("{}/search/geocode/v6/reverse", self.mapbox_base_url);
        let qp = [
            ("longitude", at.lng.to_string()),
            ("latitude", at.lat.to_string()),
            ("types", "address".to_string()),
        ];
        let payload: GeocodePayload = self
            .execute_json(self.mapbox_request(&url).query(&qp))
            .await?;
        payload.into_place()
    }

    async fn fetch_photo(&self, at: Coordinate) -> Result<String, MapError> {
        let url = format!("{}/maps/api/streetview", self.streetview_base_url);
        let location = lat_lng(at);
        let qp = [
            ("size", STREETVIEW_SIZE),
            ("location", location.as_str()),
            ("heading", STREETVIEW_HEADING),
            ("pitch", STREETVIEW_PITCH),
            ("key", self.streetview_key.expose_secret()),
        ];
        let resp = self.client.get(&url).query(&qp).send().await?;
        if !resp.status().is_success() {
            return Err(self.error_from_response(resp).await);
        }
        Ok(resp.url().to_string())
    }
}

#[async_trait]
impl ElevationSource for ReqwestMapClient {
    async fn elevation_gain(&self, at: Coordinate) -> Result<f64, MapError> {
        let url = format!(
            "{}/v4/mapbox.mapbox-terrain-v2/tilequery/{}.json",
            self.mapbox_base_url,
            lng_lat(at)
        );
        let qp = [("layers", "contour"), ("limit", TERRAIN_FEATURE_LIMIT)];
        let payload: TilequeryPayload = self
            .execute_json(self.mapbox_request(&url).query(&qp))
            .await?;
        payload
            .features
            .into_iter()
            .filter_map(|f| f.properties.and_then(|p| p.ele))
            .fold(None, |acc: Option<f64>, ele| {
                Some(acc.map_or(ele, |m| m.max(ele)))
            })
            .ok_or_else(|| {
                debug!(at = %lng_lat(at), "no contour features");
                MapError::NotFound("no contour elevation at this location".into())
            })
    }
}

#[async_trait]
impl RouteSource for ReqwestMapClient {
    async fn route(
        &self,
        profile: RouteProfile,
        from: Coordinate,
        to: Coordinate,
    ) -> Result<Vec<Coordinate>, MapError> {
        let url = format!(
            "{}/directions/v5/mapbox/{}/{};{}",
            self.mapbox_base_url,
            profile.as_str(),
            lng_lat(from),
            lng_lat(to)
        );
        let qp = [("steps", "true"), ("geometries", "geojson")];
        let payload: DirectionsPayload = self
            .execute_json(self.mapbox_request(&url).query(&qp))
            .await?;
        payload
            .routes
            .into_iter()
            .next()
            .map(|r| r.geometry.coordinates)
            .ok_or_else(|| {
                debug!(profile = profile.as_str(), "directions returned no routes");
                MapError::NotFound("no route between these points".into())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(base: &str) -> Config {
        Config {
            mapbox_token: SecretString::new("pk.tok".into()),
            streetview_key: SecretString::new("key".into()),
            mapbox_base_url: base.into(),
            streetview_base_url: base.into(),
        }
    }

    #[test]
    fn new_trims_trailing_slash() {
        let client = ReqwestMapClient::new(&config("http://localhost/"));
        assert_eq!(client.mapbox_base_url, "http://localhost");
    }

    #[test]
    fn geocode_payload_requires_every_context_field() {
        let payload: GeocodePayload = serde_json::from_value(json!({
            "features": [{
                "geometry": {"coordinates": [-122.41, 37.78]},
                "properties": {"context": {
                    "country": {"name": "United States"},
                    "region": {"name": "California"},
                    "place": {"name": "San Francisco"}
                }}
            }]
        }))
        .unwrap();
        let err = payload.into_place().unwrap_err();
        assert!(matches!(err, MapError::Malformed(ref m) if m.contains("address")));
    }

    #[test]
    fn geocode_payload_without_features_is_not_found() {
        let payload: GeocodePayload = serde_json::from_value(json!({"features": []})).unwrap();
        assert!(matches!(payload.into_place(), Err(MapError::NotFound(_))));
    }
}
