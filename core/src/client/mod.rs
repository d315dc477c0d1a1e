pub mod config;
pub mod http;

pub use config::{ClientConfig, ConfigError};
pub use http::HttpPredictionClient;

use crate::model::{PredictionRequest, PredictionResponse};
use crate::prelude::{PredictionError, PredictionResult};
use std::future::Future;
use std::time::Duration;

/// Issues one prediction request and classifies its outcome.
///
/// Implementations make a single attempt and never retry. Every outcome is
/// returned as a typed result; nothing panics on bad server data.
pub trait PredictionClient: Send + Sync + 'static {
    fn submit(
        &self,
        request: PredictionRequest,
    ) -> impl Future<Output = PredictionResult<PredictionResponse>> + Send;
}

/// Bounds `call` by `deadline`; silence past it is reported as a timeout.
pub async fn with_deadline<T, F>(deadline: Duration, call: F) -> PredictionResult<T>
where
    F: Future<Output = PredictionResult<T>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(outcome) => outcome,
        Err(_) => Err(PredictionError::Timeout(format!(
            "no response within {} ms",
            deadline.as_millis()
        ))),
    }
}
