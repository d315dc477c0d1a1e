use crate::prelude::{PredictionError, PredictionResult};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const API_URL_ENV: &str = "SQUID_API_URL";
pub const API_TIMEOUT_ENV: &str = "SQUID_API_TIMEOUT_MS";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("reading client config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing client config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Where predictions are requested from. A missing or malformed base URL is
/// accepted here and reported as a setup error when a request is submitted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Reads `SQUID_API_URL` (and optionally `SQUID_API_TIMEOUT_MS`).
    pub fn from_env() -> Self {
        let base_url = std::env::var(API_URL_ENV).unwrap_or_default();
        let timeout_ms = std::env::var(API_TIMEOUT_ENV)
            .ok()
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        Self {
            base_url,
            timeout_ms,
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref).map_err(|source| ConfigError::Io {
            path: path_ref.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path_ref.display().to_string(),
            source,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// `{base_url}/predict`, or the setup error explaining why it can't be built.
    pub fn predict_endpoint(&self) -> PredictionResult<Url> {
        let base = self.base_url.trim();
        if base.is_empty() {
            return Err(PredictionError::ClientSetupError {
                message: format!("prediction API base URL is not configured (set {API_URL_ENV})"),
            });
        }

        let endpoint = format!("{}/predict", base.trim_end_matches('/'));
        let url = Url::parse(&endpoint).map_err(|err| PredictionError::ClientSetupError {
            message: format!("invalid prediction API base URL {base:?}: {err}"),
        })?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(PredictionError::ClientSetupError {
                message: format!("unsupported scheme {other:?} in prediction API base URL"),
            }),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn endpoint_appends_predict_once() {
        let config = ClientConfig::new("http://localhost:5000/");
        assert_eq!(
            config.predict_endpoint().unwrap().as_str(),
            "http://localhost:5000/predict"
        );

        let nested = ClientConfig::new("https://api.example.org/squid");
        assert_eq!(
            nested.predict_endpoint().unwrap().as_str(),
            "https://api.example.org/squid/predict"
        );
    }

    #[test]
    fn misconfiguration_is_a_setup_error() {
        for base in ["", "   ", "not a url", "ftp://files.example.org"] {
            let err = ClientConfig::new(base).predict_endpoint().unwrap_err();
            assert!(
                matches!(err, PredictionError::ClientSetupError { .. }),
                "{base:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn default_timeout_is_thirty_seconds() {
        assert_eq!(ClientConfig::default().timeout(), Duration::from_secs(30));
        let short = ClientConfig::new("http://x").with_timeout(Duration::from_millis(250));
        assert_eq!(short.timeout_ms, 250);
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"base_url: http://127.0.0.1:5000\n").unwrap();
        let path = temp.into_temp_path();
        let config = ClientConfig::load(&path).unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:5000");
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
    }
}
