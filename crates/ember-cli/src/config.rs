use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use ember_sink::SinkConfig;
use ember_stream::CameraConfig;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub node: NodeCfg,
    pub gnss: GnssCfg,
    pub weather: WeatherCfg,
    pub sink: SinkConfig,
    pub stream: StreamCfg,
}

#[derive(Debug, Deserialize)]
pub struct NodeCfg {
    pub drone_id: String,
}

#[derive(Debug, Deserialize)]
pub struct GnssCfg {
    /// "serial" | "file"
    pub source: String,
    pub device: Option<String>,
    #[serde(default = "default_baud")]
    pub baud: u32,
    pub nmea_file: Option<String>,
    #[serde(default = "default_quiescence_s")]
    pub quiescence_s: u64,
    #[serde(default = "default_max_fix_age_s")]
    pub max_fix_age_s: u64,
    #[serde(default = "default_retry_base_s")]
    pub retry_base_s: u64,
    #[serde(default = "default_retry_max_s")]
    pub retry_max_s: u64,
}

#[derive(Debug, Deserialize)]
pub struct WeatherCfg {
    pub api_key: String,
    #[serde(default = "default_weather_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_period_s")]
    pub period_s: u64,
    #[serde(default = "default_no_fix_wait_s")]
    pub no_fix_wait_s: u64,
}

#[derive(Debug, Deserialize)]
pub struct StreamCfg {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    #[serde(default = "default_capture_retry_s")]
    pub capture_retry_s: u64,
    pub camera: CameraConfig,
}

fn default_baud() -> u32 {
    9600
}
fn default_quiescence_s() -> u64 {
    3
}
fn default_max_fix_age_s() -> u64 {
    30
}
fn default_retry_base_s() -> u64 {
    1
}
fn default_retry_max_s() -> u64 {
    30
}
fn default_weather_endpoint() -> String {
    "https://api.openweathermap.org/data/2.5".into()
}
fn default_period_s() -> u64 {
    10
}
fn default_no_fix_wait_s() -> u64 {
    2
}
fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}
fn default_frame_interval_ms() -> u64 {
    20
}
fn default_capture_retry_s() -> u64 {
    1
}

impl GnssCfg {
    pub fn quiescence(&self) -> Duration {
        Duration::from_secs(self.quiescence_s)
    }
    pub fn max_fix_age(&self) -> Duration {
        Duration::from_secs(self.max_fix_age_s)
    }
}

pub fn load(path: &str) -> Result<Config> {
    let s = std::fs::read_to_string(path).with_context(|| format!("read config {}", path))?;
    let mut cfg: Config = toml::from_str(&s).context("parse config toml")?;

    // Secrets may live in the environment instead of the config file.
    if let Ok(v) = std::env::var("EMBER_DB_PASSWORD") {
        cfg.sink.password = v;
    }
    if let Ok(v) = std::env::var("EMBER_WEATHER_API_KEY") {
        cfg.weather.api_key = v;
    }
    Ok(cfg)
}

/// Config sanity checks backing the `doctor` subcommand.
pub fn validate(cfg: &Config) -> Result<()> {
    anyhow::ensure!(!cfg.node.drone_id.is_empty(), "node.drone_id missing");

    match cfg.gnss.source.as_str() {
        "serial" => {
            anyhow::ensure!(
                cfg.gnss.device.as_ref().map(|d| !d.is_empty()).unwrap_or(false),
                "gnss.device missing (source=serial)"
            );
            anyhow::ensure!(cfg.gnss.baud > 0, "gnss.baud invalid");
        }
        "file" => {
            anyhow::ensure!(cfg.gnss.nmea_file.is_some(), "gnss.nmea_file missing (source=file)");
        }
        other => anyhow::bail!("unknown gnss.source: {}", other),
    }
    anyhow::ensure!(cfg.gnss.quiescence_s >= 1, "gnss.quiescence_s too small");
    anyhow::ensure!(
        cfg.gnss.max_fix_age_s >= cfg.gnss.quiescence_s,
        "gnss.max_fix_age_s below the fix rate"
    );

    anyhow::ensure!(!cfg.weather.api_key.is_empty(), "weather.api_key missing");
    anyhow::ensure!(cfg.weather.period_s >= 1, "weather.period_s too small");

    anyhow::ensure!(!cfg.sink.host.is_empty(), "sink.host missing");
    anyhow::ensure!(cfg.sink.port > 0, "sink.port invalid");
    anyhow::ensure!(!cfg.sink.database.is_empty(), "sink.database missing");
    anyhow::ensure!(!cfg.sink.user.is_empty(), "sink.user missing");

    anyhow::ensure!(cfg.stream.port > 0, "stream.port invalid");
    anyhow::ensure!(cfg.stream.frame_interval_ms >= 1, "stream.frame_interval_ms too small");
    anyhow::ensure!(
        (1..=100).contains(&cfg.stream.camera.jpeg_quality),
        "stream.camera.jpeg_quality must be 1..=100"
    );
    match cfg.stream.camera.mode.as_str() {
        "v4l2-bgr" | "jpeg-file" => {}
        other => anyhow::bail!("unknown stream.camera.mode: {}", other),
    }
    Ok(())
}
