mod config;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use ember_core::{shutdown, LocationCell};
use ember_gnss::{run_ingestor, IngestConfig, NmeaSource};
use ember_risk::{run_evaluator, EvalConfig, OwmClient};
use ember_sink::MySqlSink;
use ember_stream::{net, serve, Camera, FramePump, PumpConfig, StreamState};

use config::Config;

#[derive(Debug, Parser)]
#[command(name = "ember", version, about = "Emberwatch - wildfire drone edge node")]
struct Cli {
    #[arg(long)]
    config: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check the configuration without starting the node.
    Doctor,
    /// Run the node: GPS ingest, risk evaluation, video streaming.
    Run,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let cfg = config::load(&cli.config)?;

    match cli.cmd {
        Command::Doctor => doctor(&cfg),
        Command::Run => run(cfg).await,
    }
}

fn doctor(cfg: &Config) -> Result<()> {
    info!("doctor: starting");
    config::validate(cfg)?;
    info!("doctor: OK");
    Ok(())
}

async fn run(cfg: Config) -> Result<()> {
    info!("run: starting (drone {})", cfg.node.drone_id);
    let (handle, shutdown) = shutdown::channel();
    let cell = LocationCell::new();

    // Advertised stream URL is computed once at startup.
    let public = net::public_address().await;
    let video_url = net::stream_url(&public, cfg.stream.port);
    info!("run: advertising stream at {}", video_url);

    // GPS ingestor. A source that fails to open disables this task only;
    // the rest of the node keeps running.
    match build_source(&cfg)? {
        Ok(source) => {
            let sink = MySqlSink::connect_lazy(&cfg.sink, cfg.node.drone_id.clone());
            let ingest_cfg = IngestConfig {
                quiescence: cfg.gnss.quiescence(),
                retry_base: Duration::from_secs(cfg.gnss.retry_base_s),
                retry_max: Duration::from_secs(cfg.gnss.retry_max_s),
            };
            tokio::spawn(run_ingestor(
                source,
                cell.clone(),
                sink,
                ingest_cfg,
                shutdown.clone(),
            ));
        }
        Err(e) => error!("gnss: source open failed, position updates disabled: {:#}", e),
    }

    // Weather/risk evaluator, with its own lazily connected sink.
    let provider = OwmClient::with_base_url(cfg.weather.api_key.clone(), cfg.weather.endpoint.clone())?;
    let sink = MySqlSink::connect_lazy(&cfg.sink, cfg.node.drone_id.clone());
    let eval_cfg = EvalConfig {
        period: Duration::from_secs(cfg.weather.period_s),
        no_fix_wait: Duration::from_secs(cfg.weather.no_fix_wait_s),
        max_fix_age: cfg.gnss.max_fix_age(),
    };
    tokio::spawn(run_evaluator(
        cell.clone(),
        provider,
        sink,
        video_url,
        eval_cfg,
        shutdown.clone(),
    ));

    // Frame pump. Camera init failure leaves /stream on its error payload.
    let pump = match Camera::open(&cfg.stream.camera) {
        Ok(camera) => {
            let pump_cfg = PumpConfig {
                frame_interval: Duration::from_millis(cfg.stream.frame_interval_ms),
                error_delay: Duration::from_secs(cfg.stream.capture_retry_s),
            };
            Some(FramePump::spawn(camera, pump_cfg, shutdown.clone()))
        }
        Err(e) => {
            error!("camera: init failed, /stream serves an error payload: {:#}", e);
            None
        }
    };

    let state = Arc::new(StreamState {
        drone_id: cfg.node.drone_id.clone(),
        pump,
        cell,
    });

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("run: ctrl-c, shutting down");
        }
        handle.trigger();
    });

    let addr: SocketAddr = format!("{}:{}", cfg.stream.host, cfg.stream.port)
        .parse()
        .context("stream bind address")?;
    serve(addr, state, shutdown).await
}

/// Outer error: misconfiguration (fatal). Inner error: the source exists in
/// config but could not be opened (task-local failure).
fn build_source(cfg: &Config) -> Result<Result<NmeaSource>> {
    match cfg.gnss.source.as_str() {
        "serial" => {
            let dev = cfg.gnss.device.as_ref().context("gnss.device missing")?;
            Ok(NmeaSource::serial(dev, cfg.gnss.baud))
        }
        "file" => {
            let path = cfg.gnss.nmea_file.as_ref().context("gnss.nmea_file missing")?;
            Ok(NmeaSource::file(path))
        }
        other => anyhow::bail!("unknown gnss.source: {}", other),
    }
}
