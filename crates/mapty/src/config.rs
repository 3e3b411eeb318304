use std::path::PathBuf;
use std::time::Duration;

use mapty_client::Coordinate;

use crate::domains::MetricsParams;
use crate::{MaptyError, MaptyResult};

pub const DEFAULT_MESSAGE_TIMEOUT_MS: u64 = 2500;

/// Settings of one tracking session.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    /// Start point of every workout.
    pub home: Coordinate,
    pub data_dir: PathBuf,
    pub metrics: MetricsParams,
    pub message_timeout: Duration,
}

impl SessionConfig {
    pub fn from_env() -> MaptyResult<Self> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Testable helper that reads configuration values using the provided
    /// function instead of the process environment.
    pub fn from_env_with<F>(mut get: F) -> MaptyResult<Self>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let home = get("MAPTY_HOME")
            .ok_or_else(|| MaptyError::GeolocationDenied("MAPTY_HOME is not set".into()))
            .and_then(|raw| parse_home(&raw))?;
        let data_dir = get("MAPTY_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let d = MetricsParams::default();
        let metrics = MetricsParams {
            running_speed_mph: positive(&mut get, "MAPTY_RUNNING_SPEED_MPH", d.running_speed_mph)?,
            stride_length_ft: positive(&mut get, "MAPTY_STRIDE_LENGTH_FT", d.stride_length_ft)?,
            cycling_speed_mph: positive(&mut get, "MAPTY_CYCLING_SPEED_MPH", d.cycling_speed_mph)?,
        };

        let message_timeout = match get("MAPTY_MESSAGE_TIMEOUT_MS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                MaptyError::Config(format!("MAPTY_MESSAGE_TIMEOUT_MS is not a number: {raw}"))
            })?,
            None => DEFAULT_MESSAGE_TIMEOUT_MS,
        };

        Ok(Self {
            home,
            data_dir,
            metrics,
            message_timeout: Duration::from_millis(message_timeout),
        })
    }
}

/// Parse `"lng,lat"`.
fn parse_home(raw: &str) -> MaptyResult<Coordinate> {
    let denied = || MaptyError::GeolocationDenied(format!("unusable home position '{raw}'"));
    let (lng, lat) = raw.split_once(',').ok_or_else(denied)?;
    let lng: f64 = lng.trim().parse().map_err(|_| denied())?;
    let lat: f64 = lat.trim().parse().map_err(|_| denied())?;
    if !(-180.0..=180.0).contains(&lng) || !(-90.0..=90.0).contains(&lat) {
        return Err(denied());
    }
    Ok(Coordinate::new(lng, lat))
}

fn positive<F>(get: &mut F, key: &str, default: f64) -> MaptyResult<f64>
where
    F: FnMut(&str) -> Option<String>,
{
    let Some(raw) = get(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(MaptyError::Config(format!("{key} must be a positive number, got '{raw}'"))),
    }
}
