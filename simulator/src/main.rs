use anyhow::Context;
use api::routes::PredictionService;
use clap::Parser;
use squidcore::model::PredictionRequest;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::ServiceConfig;
use workflow::runner::Forecaster;

mod api;
mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Stub squid abundance prediction service")]
struct Args {
    /// Print one forecast as JSON and exit
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Load the service config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    bind: Option<SocketAddr>,
    #[arg(long)]
    seed: Option<u64>,
    /// Delay every /predict reply by this many milliseconds
    #[arg(long)]
    latency_ms: Option<u64>,
    /// Answer /predict with this HTTP status instead of a forecast
    #[arg(long)]
    fail_status: Option<u16>,
    /// Origin written into chart URLs
    #[arg(long)]
    public_url: Option<String>,
    /// Forecast year for --offline
    #[arg(long, default_value_t = 2024)]
    year: i32,
    /// Forecast month (1-12) for --offline
    #[arg(long, default_value_t = 1)]
    month: u32,
}

impl Args {
    fn service_config(&self) -> anyhow::Result<ServiceConfig> {
        let mut config = match &self.config {
            Some(path) => ServiceConfig::load(path)?,
            None => ServiceConfig::default(),
        };
        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(latency_ms) = self.latency_ms {
            config.latency_ms = latency_ms;
        }
        if self.fail_status.is_some() {
            config.fail_status = self.fail_status;
        }
        if self.public_url.is_some() {
            config.public_url = self.public_url.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = args.service_config()?;
    let forecaster = Forecaster::new(config.clone());

    if args.offline {
        let request = PredictionRequest::new(args.year, args.month)
            .context("invalid --year/--month for offline forecast")?;
        let response = forecaster.forecast(&request)?;
        println!(
            "{}",
            serde_json::to_string_pretty(&response).context("encoding forecast")?
        );
        return Ok(());
    }

    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating runtime for the prediction service")?;
    runtime.block_on(async {
        let service = PredictionService::new(forecaster);
        let (addr, server) = service.bind(config.bind, async {
            if let Err(err) = signal::ctrl_c().await {
                log::error!("awaiting Ctrl+C failed: {err}");
            }
        })?;
        log::info!(
            "prediction service listening on http://{addr} ({} hotspots, seed {}) (Ctrl+C to stop)",
            service.snapshot().hotspots,
            config.seed
        );
        if let Some(status) = config.fail_status {
            log::warn!("every /predict call will fail with status {status}");
        }
        server.await;
        log::info!("prediction service stopped");
        Ok::<(), anyhow::Error>(())
    })?;

    Ok(())
}
