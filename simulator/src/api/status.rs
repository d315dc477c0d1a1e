use serde::{Deserialize, Serialize};
use squidcore::model::PredictionRequest;

/// Counters exposed on `GET /status`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ServiceStatus {
    pub hotspots: usize,
    pub forecasts_served: usize,
    pub rejected_requests: usize,
    pub injected_failures: usize,
    pub charts_served: usize,
    pub last_request: Option<PredictionRequest>,
}

impl ServiceStatus {
    pub fn new(hotspots: usize) -> Self {
        Self {
            hotspots,
            ..Self::default()
        }
    }
}
