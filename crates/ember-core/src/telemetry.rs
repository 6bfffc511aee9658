use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One weather reading for the current position. Fetched per evaluation
/// cycle and not persisted on its own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    pub temp_c: f64,
    pub humidity_pct: f64,
    pub wind_mps: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskStatus {
    Normal,
    Caution,
    Critical,
}

impl RiskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskStatus::Normal => "Normal",
            RiskStatus::Caution => "Caution",
            RiskStatus::Critical => "Critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: f64,
    pub status: RiskStatus,
}

/// Durable store holding one record per drone. The two producers write
/// disjoint field groups of that record (position from the GPS ingestor,
/// assessment from the risk evaluator), so last-writer-wins per group is
/// safe without transactions. Keep the groups disjoint; overlapping fields
/// would need a single-writer redesign.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn update_position(&self, lat: f64, lon: f64) -> Result<()>;

    async fn update_assessment(
        &self,
        assessment: &RiskAssessment,
        sample: &WeatherSample,
        video_url: &str,
    ) -> Result<()>;
}
