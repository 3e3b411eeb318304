//! Request metrics shared by every map collaborator.

use std::time::Duration;

pub const REQUESTS_TOTAL: &str = "mapty_requests_total";
pub const REQUEST_DURATION: &str = "mapty_request_duration_seconds";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Error,
}

impl Outcome {
    pub fn of<T, E>(result: &Result<T, E>) -> Self {
        if result.is_ok() { Outcome::Ok } else { Outcome::Error }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Ok => "ok",
            Outcome::Error => "error",
        }
    }
}

/// Record one collaborator call. A no-op until the embedding application
/// installs a `metrics` recorder.
pub fn record_request(service: &'static str, outcome: Outcome, elapsed: Duration) {
    metrics::counter!(REQUESTS_TOTAL, "service" => service, "outcome" => outcome.as_str())
        .increment(1);
    metrics::histogram!(REQUEST_DURATION, "service" => service).record(elapsed.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_follows_result() {
        let ok: Result<(), ()> = Ok(());
        let err: Result<(), ()> = Err(());
        assert_eq!(Outcome::of(&ok), Outcome::Ok);
        assert_eq!(Outcome::of(&err).as_str(), "error");
    }

    #[test]
    fn record_without_recorder_is_noop() {
        record_request("geocode", Outcome::Ok, Duration::from_millis(5));
    }
}
