use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

const ID_MODULUS: i64 = 100_000_000;

/// Workout identifier: the last eight digits of the creation timestamp in
/// milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct WorkoutId(u64);

impl WorkoutId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn from_timestamp_millis(millis: i64) -> Self {
        Self(millis.rem_euclid(ID_MODULUS) as u64)
    }

    /// The id one millisecond later, wrapping like the timestamp digits do.
    pub fn next(self) -> Self {
        Self((self.0 + 1) % ID_MODULUS as u64)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WorkoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for WorkoutId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl<'de> Deserialize<'de> for WorkoutId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(u64),
            Str(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Int(v) => Ok(Self(v)),
            Raw::Str(s) => s
                .trim()
                .parse::<u64>()
                .map(Self)
                .map_err(|_| D::Error::custom(format!("expected numeric workout id, got {s:?}"))),
        }
    }
}
