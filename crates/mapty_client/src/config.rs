use crate::MapError;
use secrecy::SecretString;

#[derive(Clone, Debug)]
pub struct Config {
    pub mapbox_token: SecretString,
    pub streetview_key: SecretString,
    pub mapbox_base_url: String,
    pub streetview_base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, MapError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Testable helper that reads configuration values using the provided
    /// function instead of the process environment.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, MapError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let token = get("MAPTY_MAPBOX_TOKEN")
            .ok_or_else(|| MapError::Config("MAPTY_MAPBOX_TOKEN missing".into()))?;
        let streetview_key = get("MAPTY_STREETVIEW_KEY")
            .ok_or_else(|| MapError::Config("MAPTY_STREETVIEW_KEY missing".into()))?;
        let mapbox_base_url =
            get("MAPTY_MAPBOX_BASE_URL").unwrap_or_else(|| "https://api.mapbox.com".into());
        let streetview_base_url = get("MAPTY_STREETVIEW_BASE_URL")
            .unwrap_or_else(|| "https://maps.googleapis.com".into());
        Ok(Self {
            mapbox_token: SecretString::new(token.into()),
            streetview_key: SecretString::new(streetview_key.into()),
            mapbox_base_url,
            streetview_base_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_missing_token() {
        let get = |k: &str| match k {
            "MAPTY_STREETVIEW_KEY" => Some("key".into()),
            _ => None,
        };
        let res = Config::from_env_with(get);
        assert!(matches!(res, Err(MapError::Config(_))));
    }

    #[test]
    fn from_env_missing_streetview_key() {
        let get = |k: &str| match k {
            "MAPTY_MAPBOX_TOKEN" => Some("pk.tok".into()),
            _ => None,
        };
        assert!(Config::from_env_with(get).is_err());
    }

    #[test]
    fn from_env_reads_values_and_defaults() {
        let get = |k: &str| match k {
            "MAPTY_MAPBOX_TOKEN" => Some("pk.tok".into()),
            "MAPTY_STREETVIEW_KEY" => Some("key".into()),
            "MAPTY_MAPBOX_BASE_URL" => Some("http://localhost:9000".into()),
            _ => None,
        };
        let cfg = Config::from_env_with(get).expect("cfg");
        assert_eq!(cfg.mapbox_base_url, "http://localhost:9000");
        assert_eq!(cfg.streetview_base_url, "https://maps.googleapis.com");
    }
}
