use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use tracing::debug;

use ember_core::{RiskAssessment, TelemetrySink, WeatherSample};

#[derive(Debug, Clone, Deserialize)]
pub struct SinkConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

/// Telemetry sink backed by the shared MySQL store. One row per drone in
/// `drone_list`, keyed by `drone_db_id`. The pool connects lazily, so a sink
/// that is unreachable at startup simply fails individual writes until it
/// comes back.
///
/// The two writers touch disjoint columns of the same row: position
/// ({drone_lat, drone_lon}) from the GPS ingestor, assessment ({risk_level,
/// drone_video_url, temperature, humidity, wind_speed}) from the risk
/// evaluator. No cross-task transaction is needed.
#[derive(Clone)]
pub struct MySqlSink {
    pool: MySqlPool,
    drone_id: String,
}

impl MySqlSink {
    pub fn connect_lazy(cfg: &SinkConfig, drone_id: String) -> Self {
        let opts = MySqlConnectOptions::new()
            .host(&cfg.host)
            .port(cfg.port)
            .username(&cfg.user)
            .password(&cfg.password)
            .database(&cfg.database);
        let pool = MySqlPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(5))
            .connect_lazy_with(opts);
        Self { pool, drone_id }
    }
}

#[async_trait]
impl TelemetrySink for MySqlSink {
    async fn update_position(&self, lat: f64, lon: f64) -> Result<()> {
        let res = sqlx::query(
            "UPDATE drone_list SET drone_lat = ?, drone_lon = ? WHERE drone_db_id = ?",
        )
        .bind(lat)
        .bind(lon)
        .bind(&self.drone_id)
        .execute(&self.pool)
        .await
        .context("position update")?;
        debug!("sink: position updated ({} rows)", res.rows_affected());
        Ok(())
    }

    async fn update_assessment(
        &self,
        assessment: &RiskAssessment,
        sample: &WeatherSample,
        video_url: &str,
    ) -> Result<()> {
        let res = sqlx::query(
            "UPDATE drone_list \
             SET risk_level = ?, drone_video_url = ?, temperature = ?, humidity = ?, wind_speed = ? \
             WHERE drone_db_id = ?",
        )
        .bind(assessment.score)
        .bind(video_url)
        .bind(sample.temp_c)
        .bind(sample.humidity_pct)
        .bind(sample.wind_mps)
        .bind(&self.drone_id)
        .execute(&self.pool)
        .await
        .context("assessment update")?;
        debug!("sink: assessment updated ({} rows)", res.rows_affected());
        Ok(())
    }
}
