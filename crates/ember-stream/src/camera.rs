use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bytes::Bytes;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    /// "v4l2-bgr" (grab raw BGR24 via ffmpeg, encode here) | "jpeg-file"
    /// (replay a JPEG from disk, bench/test rigs).
    pub mode: String,
    #[serde(default = "default_device")]
    pub device: String,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_quality")]
    pub jpeg_quality: u8,
    pub frame_file: Option<String>,
}

fn default_device() -> String {
    "/dev/video0".into()
}
fn default_width() -> u32 {
    600
}
fn default_height() -> u32 {
    600
}
fn default_quality() -> u8 {
    70
}

/// Pragmatic capture: one external grab per frame rather than a long-lived
/// capture session in-process (simple and robust on a Pi). The v4l2 path
/// pulls a raw BGR24 frame with ffmpeg, reorders channels, and encodes JPEG
/// at the configured quality.
pub enum Camera {
    V4l2Bgr { device: String, width: u32, height: u32, quality: u8 },
    JpegFile { path: PathBuf },
}

impl Camera {
    pub fn open(cfg: &CameraConfig) -> Result<Self> {
        match cfg.mode.as_str() {
            "v4l2-bgr" => {
                anyhow::ensure!(
                    Path::new(&cfg.device).exists(),
                    "camera device {} not present",
                    cfg.device
                );
                Ok(Self::V4l2Bgr {
                    device: cfg.device.clone(),
                    width: cfg.width,
                    height: cfg.height,
                    quality: cfg.jpeg_quality,
                })
            }
            "jpeg-file" => {
                let path = cfg.frame_file.as_ref().context("camera.frame_file missing")?;
                anyhow::ensure!(Path::new(path).exists(), "frame file {} not present", path);
                Ok(Self::JpegFile { path: PathBuf::from(path) })
            }
            other => anyhow::bail!("unknown camera.mode: {}", other),
        }
    }

    pub async fn capture_jpeg(&self) -> Result<Bytes> {
        match self {
            Self::V4l2Bgr { device, width, height, quality } => {
                let bgr = grab_bgr24(device, *width, *height).await?;
                encode_frame(bgr, *width, *height, *quality)
            }
            Self::JpegFile { path } => {
                let bytes = tokio::fs::read(path)
                    .await
                    .with_context(|| format!("read frame file {}", path.display()))?;
                Ok(Bytes::from(bytes))
            }
        }
    }
}

// ffmpeg -f video4linux2 -video_size WxH -i /dev/video0 -vframes 1 -f rawvideo -pix_fmt bgr24 -
async fn grab_bgr24(device: &str, width: u32, height: u32) -> Result<Vec<u8>> {
    let mut cmd = Command::new("ffmpeg");
    cmd.args([
        "-hide_banner",
        "-loglevel",
        "error",
        "-f",
        "video4linux2",
        "-video_size",
        &format!("{}x{}", width, height),
        "-i",
        device,
        "-vframes",
        "1",
        "-f",
        "rawvideo",
        "-pix_fmt",
        "bgr24",
        "-",
    ]);

    debug!("camera: ffmpeg bgr24 grab");
    let out = cmd.output().await.context("run ffmpeg capture")?;
    anyhow::ensure!(out.status.success(), "ffmpeg capture failed");
    Ok(out.stdout)
}

/// Reorder BGR24 to RGB and encode as JPEG at the given quality.
pub fn encode_frame(mut bgr: Vec<u8>, width: u32, height: u32, quality: u8) -> Result<Bytes> {
    let expected = (width as usize) * (height as usize) * 3;
    anyhow::ensure!(
        bgr.len() == expected,
        "raw frame is {} bytes, expected {}",
        bgr.len(),
        expected
    );
    bgr_to_rgb(&mut bgr);

    let mut out = Vec::new();
    let mut enc = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality);
    enc.encode(&bgr, width, height, image::ExtendedColorType::Rgb8)
        .context("jpeg encode")?;
    Ok(Bytes::from(out))
}

fn bgr_to_rgb(buf: &mut [u8]) {
    for px in buf.chunks_exact_mut(3) {
        px.swap(0, 2);
    }
}
