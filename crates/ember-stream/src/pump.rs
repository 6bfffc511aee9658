use std::time::Duration;

use bytes::Bytes;
use tokio::sync::broadcast;
use tracing::{info, warn};

use ember_core::shutdown::Shutdown;

use crate::camera::Camera;

#[derive(Debug, Clone)]
pub struct PumpConfig {
    /// Target pacing between captures (best-effort, not real-time).
    pub frame_interval: Duration,
    /// Wait after a failed capture before retrying.
    pub error_delay: Duration,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_millis(20),
            error_delay: Duration::from_secs(1),
        }
    }
}

/// Single capture cadence for the whole process. The camera is polled from
/// one task and every HTTP client consumes the same broadcast frames, so N
/// viewers never mean N captures.
pub struct FramePump {
    tx: broadcast::Sender<Bytes>,
}

impl FramePump {
    pub fn spawn(camera: Camera, cfg: PumpConfig, shutdown: Shutdown) -> Self {
        let (tx, _) = broadcast::channel(8);
        let pump_tx = tx.clone();
        tokio::spawn(run_pump(camera, cfg, pump_tx, shutdown));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Bytes> {
        self.tx.subscribe()
    }
}

async fn run_pump(
    camera: Camera,
    cfg: PumpConfig,
    tx: broadcast::Sender<Bytes>,
    mut shutdown: Shutdown,
) {
    info!("stream: frame pump started");
    loop {
        let frame = tokio::select! {
            _ = shutdown.notified() => break,
            r = camera.capture_jpeg() => r,
        };

        let delay = match frame {
            Ok(jpeg) => {
                // No receivers is fine; frames are transient.
                let _ = tx.send(jpeg);
                cfg.frame_interval
            }
            Err(e) => {
                warn!("stream: capture failed: {:#}", e);
                cfg.error_delay
            }
        };

        tokio::select! {
            _ = shutdown.notified() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }
    info!("stream: frame pump stopped");
}
