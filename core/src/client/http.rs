use crate::client::config::ClientConfig;
use crate::client::{with_deadline, PredictionClient};
use crate::model::{PredictionRequest, PredictionResponse};
use crate::prelude::{PredictionError, PredictionResult};
use crate::telemetry::LogManager;
use reqwest::Url;
use std::future::Future;
use std::time::Duration;

/// reqwest-backed client for `POST {base_url}/predict`.
pub struct HttpPredictionClient {
    http: PredictionResult<reqwest::Client>,
    endpoint: PredictionResult<Url>,
    timeout: Duration,
    logger: LogManager,
}

impl HttpPredictionClient {
    pub fn new(config: &ClientConfig) -> Self {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|err| PredictionError::ClientSetupError {
                message: format!("building HTTP client: {err}"),
            });
        Self {
            http,
            endpoint: config.predict_endpoint(),
            timeout: config.timeout(),
            logger: LogManager::new("prediction-client"),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn post(&self, request: PredictionRequest) -> PredictionResult<PredictionResponse> {
        let http = self.http.as_ref().map_err(Clone::clone)?;
        let endpoint = self.endpoint.clone()?;

        self.logger.detail(&format!(
            "POST {} year={} month={}",
            endpoint,
            request.year(),
            request.month()
        ));

        let response = http
            .post(endpoint)
            .json(&request)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(PredictionError::ServerError {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(classify_transport)?;
        decode_body(&body)
    }
}

impl PredictionClient for HttpPredictionClient {
    fn submit(
        &self,
        request: PredictionRequest,
    ) -> impl Future<Output = PredictionResult<PredictionResponse>> + Send {
        async move {
            let outcome = with_deadline(self.timeout, self.post(request)).await;
            if let Err(err) = &outcome {
                self.logger.warn(&format!("prediction request failed: {err}"));
            }
            outcome
        }
    }
}

/// Anything that stops a response from arriving counts as no response,
/// except a request that could not be built in the first place.
fn classify_transport(err: reqwest::Error) -> PredictionError {
    if err.is_builder() {
        PredictionError::ClientSetupError {
            message: err.to_string(),
        }
    } else {
        PredictionError::Timeout(err.to_string())
    }
}

fn decode_body(body: &[u8]) -> PredictionResult<PredictionResponse> {
    serde_json::from_slice(body)
        .map_err(|err| PredictionError::UnexpectedResponseShape(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HeatmapFragment;
    use serde_json::json;
    use std::convert::Infallible;
    use std::net::SocketAddr;
    use warp::http::StatusCode;
    use warp::Filter;

    macro_rules! serve {
        ($routes:expr) => {{
            let (addr, server) = warp::serve($routes).bind_ephemeral(([127, 0, 0, 1], 0));
            tokio::spawn(server);
            addr
        }};
    }

    fn client_for(addr: SocketAddr, timeout: Duration) -> HttpPredictionClient {
        HttpPredictionClient::new(
            &ClientConfig::new(format!("http://{addr}")).with_timeout(timeout),
        )
    }

    fn request() -> PredictionRequest {
        PredictionRequest::new(2024, 1).unwrap()
    }

    #[tokio::test]
    async fn success_body_is_returned_typed() {
        let route = warp::path("predict")
            .and(warp::post())
            .and(warp::header::exact("content-type", "application/json"))
            .and(warp::body::json())
            .map(|body: PredictionRequest| {
                warp::reply::json(&json!({
                    "heatmaps": [[[11.2, 123.1, 5.0]]],
                    "graphs": {"11.2,123.1": format!("/charts/{}-{}", body.year(), body.month())}
                }))
            });
        let addr = serve!(route);

        let response = client_for(addr, Duration::from_secs(5))
            .submit(request())
            .await
            .unwrap();

        assert_eq!(
            response.graphs.get("11.2,123.1").map(String::as_str),
            Some("/charts/2024-1")
        );
        assert!(matches!(
            response.heatmap_fragments.as_slice(),
            [HeatmapFragment::Points(points)] if points.len() == 1
        ));
    }

    #[tokio::test]
    async fn base_url_path_prefix_is_kept() {
        let route = warp::path!("api" / "predict")
            .and(warp::post())
            .map(|| warp::reply::json(&json!({"heatmaps": ["<div>ok</div>"]})));
        let addr = serve!(route);

        let client = HttpPredictionClient::new(&ClientConfig::new(format!("http://{addr}/api/")));
        let response = client.submit(request()).await.unwrap();
        assert_eq!(response.heatmap_fragments.len(), 1);
    }

    #[tokio::test]
    async fn non_success_status_is_a_server_error() {
        let route = warp::path("predict")
            .map(|| warp::reply::with_status("boom", StatusCode::INTERNAL_SERVER_ERROR));
        let addr = serve!(route);

        let err = client_for(addr, Duration::from_secs(5))
            .submit(request())
            .await
            .unwrap_err();
        assert_eq!(err, PredictionError::ServerError { status: 500 });
    }

    #[tokio::test]
    async fn non_json_body_is_an_unexpected_shape() {
        let route = warp::path("predict").map(|| "<html>maintenance</html>");
        let addr = serve!(route);

        let err = client_for(addr, Duration::from_secs(5))
            .submit(request())
            .await
            .unwrap_err();
        assert!(matches!(err, PredictionError::UnexpectedResponseShape(_)));
    }

    #[test]
    fn one_odd_entry_keeps_the_rest_of_the_body() {
        let response = decode_body(
            br#"{"heatmaps": ["<div>ok</div>", 42],
                 "graphs": {"k": null, "11.2,123.1": "/charts/1"}}"#,
        )
        .unwrap();
        assert_eq!(response.heatmap_fragments.len(), 2);
        assert_eq!(response.graphs.len(), 1);
        assert_eq!(
            response.graphs.get("11.2,123.1").map(String::as_str),
            Some("/charts/1")
        );
    }

    #[tokio::test]
    async fn silence_past_the_deadline_is_a_timeout() {
        let route = warp::path("predict").and_then(|| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Ok::<_, Infallible>(warp::reply::json(&json!({})))
        });
        let addr = serve!(route);

        let err = client_for(addr, Duration::from_millis(200))
            .submit(request())
            .await
            .unwrap_err();
        assert!(matches!(err, PredictionError::Timeout(_)), "{err:?}");
    }

    #[tokio::test]
    async fn refused_connection_is_treated_as_no_response() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client_for(addr, Duration::from_secs(5))
            .submit(request())
            .await
            .unwrap_err();
        assert!(matches!(err, PredictionError::Timeout(_)), "{err:?}");
    }

    #[tokio::test]
    async fn missing_base_url_is_a_setup_error() {
        let client = HttpPredictionClient::new(&ClientConfig::default());
        let err = client.submit(request()).await.unwrap_err();
        assert!(matches!(err, PredictionError::ClientSetupError { .. }));
        assert_eq!(client.timeout(), Duration::from_secs(30));
    }
}
