pub mod backoff;
pub mod location;
pub mod shutdown;
pub mod telemetry;

pub use location::{Fix, LocationCell, LocationSnapshot};
pub use telemetry::{RiskAssessment, RiskStatus, TelemetrySink, WeatherSample};
