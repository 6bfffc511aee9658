use std::time::Duration;

use tracing::{debug, info, warn};

use ember_core::shutdown::Shutdown;
use ember_core::{LocationCell, TelemetrySink};

use crate::score::assess;
use crate::WeatherProvider;

#[derive(Debug, Clone)]
pub struct EvalConfig {
    pub period: Duration,
    /// Wait between polls while no fix has arrived yet.
    pub no_fix_wait: Duration,
    /// Skip the cycle when the location snapshot is older than this.
    pub max_fix_age: Duration,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(10),
            no_fix_wait: Duration::from_secs(2),
            max_fix_age: Duration::from_secs(30),
        }
    }
}

/// Weather/risk evaluation loop. Each cycle reads the shared location, asks
/// the weather service for current conditions, scores them, and persists the
/// assessment plus the advertised stream URL as one combined update. Every
/// failure drops that cycle's output; the loop only exits on shutdown.
pub async fn run_evaluator<P: WeatherProvider, S: TelemetrySink>(
    cell: LocationCell,
    provider: P,
    sink: S,
    video_url: String,
    cfg: EvalConfig,
    mut shutdown: Shutdown,
) {
    info!("risk: evaluation loop started");

    loop {
        let Some(snap) = cell.snapshot() else {
            debug!("risk: no fix yet, skipping cycle");
            tokio::select! {
                _ = shutdown.notified() => break,
                _ = tokio::time::sleep(cfg.no_fix_wait) => {}
            }
            continue;
        };

        if snap.age() > cfg.max_fix_age {
            warn!("risk: fix is {}s old, skipping cycle", snap.age().as_secs());
        } else {
            match provider.current(snap.lat, snap.lon).await {
                Ok(sample) => {
                    let assessment = assess(&sample);
                    info!(
                        "risk: score={:.2} status={} temp={:.1}C humidity={:.0}% wind={:.1}m/s",
                        assessment.score,
                        assessment.status.as_str(),
                        sample.temp_c,
                        sample.humidity_pct,
                        sample.wind_mps,
                    );
                    if let Err(e) = sink.update_assessment(&assessment, &sample, &video_url).await {
                        warn!("risk: telemetry write failed: {:#}", e);
                    }
                }
                Err(e) => warn!("risk: weather fetch failed: {:#}", e),
            }
        }

        tokio::select! {
            _ = shutdown.notified() => break,
            _ = tokio::time::sleep(cfg.period) => {}
        }
    }
    info!("risk: evaluation loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use ember_core::{shutdown, Fix, RiskAssessment, RiskStatus, WeatherSample};

    #[derive(Clone)]
    struct FakeWeather {
        sample: WeatherSample,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl WeatherProvider for FakeWeather {
        async fn current(&self, _lat: f64, _lon: f64) -> Result<WeatherSample> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.sample)
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSink {
        assessments: Arc<Mutex<Vec<(RiskAssessment, WeatherSample, String)>>>,
    }

    #[async_trait]
    impl TelemetrySink for RecordingSink {
        async fn update_position(&self, _lat: f64, _lon: f64) -> Result<()> {
            Ok(())
        }

        async fn update_assessment(
            &self,
            assessment: &RiskAssessment,
            sample: &WeatherSample,
            video_url: &str,
        ) -> Result<()> {
            self.assessments
                .lock()
                .unwrap()
                .push((*assessment, *sample, video_url.to_string()));
            Ok(())
        }
    }

    fn fake_weather(temp_c: f64, humidity_pct: f64, wind_mps: f64) -> FakeWeather {
        FakeWeather {
            sample: WeatherSample { temp_c, humidity_pct, wind_mps },
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[tokio::test]
    async fn never_calls_weather_before_first_fix() {
        let provider = fake_weather(35.0, 20.0, 12.0);
        let calls = provider.calls.clone();
        let (handle, shutdown) = shutdown::channel();

        let task = tokio::spawn(run_evaluator(
            LocationCell::new(),
            provider,
            RecordingSink::default(),
            "http://127.0.0.1:8080/stream".into(),
            EvalConfig { no_fix_wait: Duration::from_millis(1), ..Default::default() },
            shutdown,
        ));

        // Let the loop spin through several no-fix cycles.
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.trigger();
        task.await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn persists_assessment_with_stream_url_once_fix_exists() {
        let cell = LocationCell::new();
        cell.apply(&Fix { lat: 36.10, lon: 128.40, valid: true });

        let provider = fake_weather(35.0, 20.0, 12.0);
        let calls = provider.calls.clone();
        let sink = RecordingSink::default();
        let (handle, shutdown) = shutdown::channel();

        let task = tokio::spawn(run_evaluator(
            cell,
            provider,
            sink.clone(),
            "http://203.0.113.9:8080/stream".into(),
            EvalConfig::default(),
            shutdown,
        ));

        tokio::time::timeout(Duration::from_secs(5), async {
            while sink.assessments.lock().unwrap().is_empty() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("no assessment persisted");

        handle.trigger();
        task.await.unwrap();

        let recorded = sink.assessments.lock().unwrap();
        let (assessment, sample, url) = &recorded[0];
        // 35*0.2 + 12*0.5 + 80*0.3 = 37.0
        assert_eq!(assessment.score, 37.0);
        assert_eq!(assessment.status, RiskStatus::Normal);
        assert_eq!(sample.temp_c, 35.0);
        assert_eq!(url, "http://203.0.113.9:8080/stream");
        // One call per persisted cycle.
        assert_eq!(calls.load(Ordering::SeqCst), recorded.len());
    }

    #[tokio::test]
    async fn provider_failure_skips_the_cycle() {
        struct FailingWeather;

        #[async_trait]
        impl WeatherProvider for FailingWeather {
            async fn current(&self, _lat: f64, _lon: f64) -> Result<WeatherSample> {
                anyhow::bail!("503 from upstream")
            }
        }

        let cell = LocationCell::new();
        cell.apply(&Fix { lat: 36.10, lon: 128.40, valid: true });

        let sink = RecordingSink::default();
        let (handle, shutdown) = shutdown::channel();
        let task = tokio::spawn(run_evaluator(
            cell,
            FailingWeather,
            sink.clone(),
            "http://127.0.0.1:8080/stream".into(),
            EvalConfig { period: Duration::from_millis(1), ..Default::default() },
            shutdown,
        ));

        // Several failing cycles must neither crash the loop nor write.
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.trigger();
        task.await.unwrap();

        assert!(sink.assessments.lock().unwrap().is_empty());
    }
}
