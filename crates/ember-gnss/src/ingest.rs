use std::time::Duration;

use tracing::{info, warn};

use ember_core::backoff::Backoff;
use ember_core::shutdown::Shutdown;
use ember_core::{LocationCell, TelemetrySink};

use crate::source::NmeaSource;

#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Pause after each applied fix, bounding the update rate.
    pub quiescence: Duration,
    pub retry_base: Duration,
    pub retry_max: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            quiescence: Duration::from_secs(3),
            retry_base: Duration::from_secs(1),
            retry_max: Duration::from_secs(30),
        }
    }
}

/// GPS ingest loop. Per active fix: replace the shared snapshot, push the
/// position to the sink, then idle for the quiescence interval. Read errors
/// back off and retry; sink errors are logged and dropped (the lazy pool
/// reconnects on the next write). Runs until shutdown.
pub async fn run_ingestor<S: TelemetrySink>(
    mut source: NmeaSource,
    cell: LocationCell,
    sink: S,
    cfg: IngestConfig,
    mut shutdown: Shutdown,
) {
    info!("gnss: ingest loop started");
    let mut backoff = Backoff::new(cfg.retry_base, cfg.retry_max);

    loop {
        let fix = tokio::select! {
            _ = shutdown.notified() => break,
            r = source.next_fix() => r,
        };

        match fix {
            Ok(fix) => {
                backoff.reset();
                cell.apply(&fix);
                info!("gnss: fix lat={:.6} lon={:.6}", fix.lat, fix.lon);
                if let Err(e) = sink.update_position(fix.lat, fix.lon).await {
                    warn!("gnss: position write failed: {:#}", e);
                }
                tokio::select! {
                    _ = shutdown.notified() => break,
                    _ = tokio::time::sleep(cfg.quiescence) => {}
                }
            }
            Err(e) => {
                let delay = backoff.failure();
                warn!("gnss: read failed: {:#} (retry in {:?})", e, delay);
                tokio::select! {
                    _ = shutdown.notified() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
    info!("gnss: ingest loop stopped");
}
