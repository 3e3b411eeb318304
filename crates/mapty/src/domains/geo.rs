use mapty_client::Coordinate;

pub const EARTH_RADIUS_MILES: f64 = 3959.0;
const FEET_PER_MILE: f64 = 5280.0;

/// Speeds and stride used to derive workout metrics from a distance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MetricsParams {
    pub running_speed_mph: f64,
    pub stride_length_ft: f64,
    pub cycling_speed_mph: f64,
}

impl Default for MetricsParams {
    fn default() -> Self {
        Self {
            running_speed_mph: 6.0,
            stride_length_ft: 2.5,
            cycling_speed_mph: 15.0,
        }
    }
}

/// Great-circle distance in miles (Haversine).
pub fn distance_miles(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).to_radians();
    let d_lambda = (b.lng - a.lng).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_MILES * c
}

fn minutes(distance_miles: f64, speed_mph: f64) -> u32 {
    (distance_miles / speed_mph * 60.0).round() as u32
}

pub fn running_duration(distance_miles: f64, speed_mph: f64) -> u32 {
    minutes(distance_miles, speed_mph)
}

/// Steps per minute. A zero-minute workout has no cadence.
pub fn running_cadence(distance_miles: f64, duration_min: u32, stride_length_ft: f64) -> u32 {
    if duration_min == 0 {
        return 0;
    }
    let steps = distance_miles * FEET_PER_MILE / stride_length_ft;
    (steps / f64::from(duration_min)).round() as u32
}

pub fn cycling_duration(distance_miles: f64, bike_speed_mph: f64) -> u32 {
    minutes(distance_miles, bike_speed_mph)
}

/// Round to two decimals, the precision distances are stored with.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
