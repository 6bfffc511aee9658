use std::net::IpAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::warn;

const CHECKIP_URL: &str = "http://checkip.amazonaws.com/";
const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(3);

/// Discover the node's public address so the advertised stream URL works
/// from outside. Falls back to loopback instead of blocking startup.
pub async fn public_address() -> String {
    match fetch_public_address().await {
        Ok(ip) => ip,
        Err(e) => {
            warn!("stream: public address discovery failed: {:#}, using 127.0.0.1", e);
            "127.0.0.1".to_string()
        }
    }
}

async fn fetch_public_address() -> Result<String> {
    let client = reqwest::Client::builder()
        .timeout(DISCOVERY_TIMEOUT)
        .build()
        .context("build discovery client")?;
    let text = client
        .get(CHECKIP_URL)
        .send()
        .await
        .context("checkip request")?
        .error_for_status()
        .context("checkip status")?
        .text()
        .await
        .context("checkip body")?;
    let ip = text.trim();
    ip.parse::<IpAddr>()
        .with_context(|| format!("unexpected checkip response {:?}", ip))?;
    Ok(ip.to_string())
}

pub fn stream_url(addr: &str, port: u16) -> String {
    format!("http://{}:{}/stream", addr, port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_url_has_fixed_shape() {
        assert_eq!(stream_url("203.0.113.9", 8080), "http://203.0.113.9:8080/stream");
        assert_eq!(stream_url("127.0.0.1", 8080), "http://127.0.0.1:8080/stream");
    }
}
