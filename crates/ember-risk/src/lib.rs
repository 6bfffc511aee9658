pub mod evaluate;
pub mod owm;
pub mod score;

use anyhow::Result;
use async_trait::async_trait;

use ember_core::WeatherSample;

pub use evaluate::{run_evaluator, EvalConfig};
pub use owm::OwmClient;
pub use score::assess;

/// External weather service seam. The real implementation is [`OwmClient`];
/// the evaluator is generic over this so it can run against a fake.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, lat: f64, lon: f64) -> Result<WeatherSample>;
}
