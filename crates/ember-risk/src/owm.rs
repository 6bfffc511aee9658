use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use ember_core::WeatherSample;

use crate::WeatherProvider;

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// OpenWeatherMap current-conditions client. Any non-200 status, network
/// error, or parse failure is reported as an error; the evaluator treats
/// that as "no sample this cycle".
#[derive(Clone)]
pub struct OwmClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct OwmResponse {
    #[serde(default)]
    main: OwmMain,
    #[serde(default)]
    wind: OwmWind,
}

#[derive(Debug, Default, Deserialize)]
struct OwmMain {
    #[serde(default)]
    temp: f64,
    #[serde(default)]
    humidity: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwmWind {
    #[serde(default)]
    speed: f64,
}

impl OwmClient {
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("build weather http client")?;
        Ok(Self { client, base_url, api_key })
    }
}

#[async_trait]
impl WeatherProvider for OwmClient {
    async fn current(&self, lat: f64, lon: f64) -> Result<WeatherSample> {
        let url = format!("{}/weather", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await
            .context("weather request")?;

        anyhow::ensure!(resp.status().is_success(), "weather api status {}", resp.status());

        let data: OwmResponse = resp.json().await.context("parse weather response")?;
        Ok(WeatherSample {
            temp_c: data.main.temp,
            humidity_pct: data.main.humidity,
            wind_mps: data.wind.speed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_main_and_wind_sections() {
        let body = r#"{
            "coord": {"lat": 36.1, "lon": 128.4},
            "main": {"temp": 35.0, "feels_like": 36.2, "humidity": 20, "pressure": 1012},
            "wind": {"speed": 12.0, "deg": 210},
            "name": "Gumi"
        }"#;
        let data: OwmResponse = serde_json::from_str(body).unwrap();
        assert_eq!(data.main.temp, 35.0);
        assert_eq!(data.main.humidity, 20.0);
        assert_eq!(data.wind.speed, 12.0);
    }

    #[test]
    fn missing_wind_section_defaults_to_calm() {
        let body = r#"{"main": {"temp": 10.0, "humidity": 50}}"#;
        let data: OwmResponse = serde_json::from_str(body).unwrap();
        assert_eq!(data.wind.speed, 0.0);
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        assert!(serde_json::from_str::<OwmResponse>("not json").is_err());
    }
}
