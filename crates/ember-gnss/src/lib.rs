pub mod ingest;
pub mod nmea;
pub mod source;

pub use ingest::{run_ingestor, IngestConfig};
pub use source::NmeaSource;
