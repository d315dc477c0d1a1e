use crate::api::status::ServiceStatus;
use crate::workflow::runner::Forecaster;
use anyhow::Context;
use serde::Deserialize;
use serde_json::json;
use squidcore::model::PredictionRequest;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::reply::{Reply, Response};
use warp::Filter;

const MAX_BODY_BYTES: u64 = 16 * 1024;

type SharedStatus = Arc<RwLock<ServiceStatus>>;

/// Query of `GET /charts/{hotspot_id}`; defaults to December of the base year.
#[derive(Debug, Default, Deserialize)]
struct ChartQuery {
    year: Option<i32>,
    month: Option<u32>,
}

/// HTTP front of the forecaster.
#[derive(Clone)]
pub struct PredictionService {
    forecaster: Arc<Forecaster>,
    status: SharedStatus,
}

impl PredictionService {
    pub fn new(forecaster: Forecaster) -> Self {
        let status = ServiceStatus::new(forecaster.catalogue().len());
        Self {
            forecaster: Arc::new(forecaster),
            status: Arc::new(RwLock::new(status)),
        }
    }

    pub fn routes(
        &self,
    ) -> impl Filter<Extract = (impl Reply,), Error = warp::Rejection> + Clone {
        let forecaster = self.forecaster.clone();
        let status = self.status.clone();
        let forecaster_filter = warp::any().map(move || forecaster.clone());
        let status_filter = warp::any().map(move || status.clone());

        let predict_route = warp::path("predict")
            .and(warp::path::end())
            .and(warp::post())
            .and(warp::body::content_length_limit(MAX_BODY_BYTES))
            .and(warp::body::bytes())
            .and(forecaster_filter.clone())
            .and(status_filter.clone())
            .and_then(handle_predict);

        let chart_route = warp::path!("charts" / u32)
            .and(warp::get())
            .and(warp::query::<ChartQuery>())
            .and(forecaster_filter)
            .and(status_filter.clone())
            .and_then(handle_chart);

        let status_route = warp::path("status")
            .and(warp::path::end())
            .and(warp::get())
            .and(status_filter)
            .map(|status: SharedStatus| {
                let snapshot = status.read().map(|s| s.clone()).unwrap_or_default();
                warp::reply::json(&snapshot)
            });

        let cors = warp::cors()
            .allow_any_origin()
            .allow_methods(vec!["GET", "POST", "OPTIONS"])
            .allow_headers(vec!["content-type"]);

        predict_route
            .or(chart_route)
            .or(status_route)
            .with(cors)
            .with(warp::log("squid_simulator::api"))
    }

    /// Binds `addr` and returns the bound address plus the server future,
    /// which completes once `shutdown` resolves.
    pub fn bind(
        &self,
        addr: SocketAddr,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<(SocketAddr, impl Future<Output = ()>)> {
        warp::serve(self.routes())
            .try_bind_with_graceful_shutdown(addr, shutdown)
            .with_context(|| format!("binding prediction service on {addr}"))
    }

    pub fn snapshot(&self) -> ServiceStatus {
        self.status
            .read()
            .map(|status| status.clone())
            .unwrap_or_default()
    }
}

fn update(status: &SharedStatus, apply: impl FnOnce(&mut ServiceStatus)) {
    if let Ok(mut guard) = status.write() {
        apply(&mut guard);
    }
}

fn error_reply(status: StatusCode, message: String) -> Response {
    warp::reply::with_status(warp::reply::json(&json!({ "error": message })), status)
        .into_response()
}

fn parse_request(body: &[u8]) -> anyhow::Result<PredictionRequest> {
    let raw: PredictionRequest =
        serde_json::from_slice(body).context("body must be {\"year\": int, \"month\": int}")?;
    // Deserialization skips the constructor's month check.
    PredictionRequest::new(raw.year(), raw.month()).map_err(anyhow::Error::from)
}

async fn handle_predict(
    body: Bytes,
    forecaster: Arc<Forecaster>,
    status: SharedStatus,
) -> Result<Response, Infallible> {
    let config = forecaster.config();
    if config.latency_ms > 0 {
        tokio::time::sleep(Duration::from_millis(config.latency_ms)).await;
    }

    if let Some(code) = config.fail_status {
        update(&status, |s| s.injected_failures += 1);
        log::warn!("injecting failure status {code}");
        let code = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return Ok(error_reply(code, "injected failure".to_string()));
    }

    let forecast = parse_request(&body).and_then(|request| {
        forecaster
            .forecast(&request)
            .map(|response| (request, response))
    });
    match forecast {
        Ok((request, response)) => {
            log::info!(
                "forecast {}-{:02}: {} layer(s), {} graph(s)",
                request.year(),
                request.month(),
                response.heatmap_fragments.len(),
                response.graphs.len()
            );
            update(&status, |s| {
                s.forecasts_served += 1;
                s.last_request = Some(request);
            });
            Ok(warp::reply::json(&response).into_response())
        }
        Err(err) => {
            log::warn!("rejecting prediction request: {err:#}");
            update(&status, |s| s.rejected_requests += 1);
            Ok(error_reply(StatusCode::BAD_REQUEST, format!("{err:#}")))
        }
    }
}

async fn handle_chart(
    hotspot_id: u32,
    query: ChartQuery,
    forecaster: Arc<Forecaster>,
    status: SharedStatus,
) -> Result<Response, Infallible> {
    let year = query.year.unwrap_or(forecaster.config().base_year);
    let month = query.month.unwrap_or(12);
    let chart = PredictionRequest::new(year, month)
        .map_err(anyhow::Error::from)
        .and_then(|request| forecaster.chart(hotspot_id, &request));
    Ok(match chart {
        Ok(Some(svg)) => {
            update(&status, |s| s.charts_served += 1);
            warp::reply::with_header(svg, "content-type", "image/svg+xml").into_response()
        }
        Ok(None) => error_reply(
            StatusCode::NOT_FOUND,
            format!("unknown hotspot {hotspot_id}"),
        ),
        Err(err) => error_reply(StatusCode::BAD_REQUEST, format!("{err:#}")),
    })
}
