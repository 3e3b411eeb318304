//! Formatting helpers for map service URLs.

use crate::Coordinate;

/// `lng,lat` as used in Mapbox paths.
pub fn lng_lat(c: Coordinate) -> String {
    format!("{},{}", c.lng, c.lat)
}

/// `lat,lng` as used by the Street View `location` parameter.
pub fn lat_lng(c: Coordinate) -> String {
    format!("{},{}", c.lat, c.lng)
}

/// Truncate a response body for error messages.
pub fn body_snippet(body: &str, max: usize) -> String {
    body.chars().take(max).collect()
}
