use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub bind: SocketAddr,
    pub seed: u64,
    /// Added before every `/predict` reply.
    pub latency_ms: u64,
    /// When set, `/predict` answers with this status instead of a forecast.
    pub fail_status: Option<u16>,
    /// Year whose January is the first forecast month.
    pub base_year: i32,
    /// Origin used in chart URLs; relative URLs when unset.
    pub public_url: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 5000)),
            seed: 2024,
            latency_ms: 0,
            fail_status: None,
            base_year: 2024,
            public_url: None,
        }
    }
}

impl ServiceConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading service config {}", path_ref.display()))?;
        let config: ServiceConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing service config {}", path_ref.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(status) = self.fail_status {
            anyhow::ensure!(
                (400..=599).contains(&status),
                "fail_status {status} is not an HTTP error status"
            );
        }
        Ok(())
    }

    /// Chart URL for a hotspot, absolute when `public_url` is set.
    pub fn chart_url(&self, hotspot_id: u32, year: i32, month: u32) -> String {
        let origin = self
            .public_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .unwrap_or("");
        format!("{origin}/charts/{hotspot_id}?year={year}&month={month}")
    }
}
