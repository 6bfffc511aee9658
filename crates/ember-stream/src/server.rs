use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use tokio::sync::broadcast::error::RecvError;
use tracing::info;

use ember_core::shutdown::Shutdown;
use ember_core::LocationCell;

use crate::pump::FramePump;

const MULTIPART_MIME: &str = "multipart/x-mixed-replace; boundary=frame";
const CAMERA_ERROR_BODY: &str = "camera unavailable\r\n";

/// State shared by the HTTP handlers. `pump` is `None` when the camera
/// failed to initialize at startup; `/stream` then serves a fixed error
/// payload instead of frames.
pub struct StreamState {
    pub drone_id: String,
    pub pump: Option<FramePump>,
    pub cell: LocationCell,
}

pub fn router(state: Arc<StreamState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/stream", get(stream))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: Arc<StreamState>, shutdown: Shutdown) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {}", addr))?;
    info!("stream: http server on {}", addr);
    let mut sd = shutdown;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { sd.notified().await })
        .await
        .context("http server")
}

async fn index(State(state): State<Arc<StreamState>>) -> Html<String> {
    let position = match state.cell.snapshot() {
        Some(s) => format!("{:.6}, {:.6}", s.lat, s.lon),
        None => "no fix".to_string(),
    };
    Html(format!(
        "<img src=\"/stream\" width=\"640\" height=\"640\"><br>\
         <h2>Drone ID: {}</h2><p>Position: {}</p>",
        state.drone_id, position
    ))
}

async fn stream(State(state): State<Arc<StreamState>>) -> Response {
    let Some(pump) = &state.pump else {
        return ([(header::CONTENT_TYPE, "text/plain")], CAMERA_ERROR_BODY).into_response();
    };

    let rx = pump.subscribe();
    let body = Body::from_stream(futures::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(frame) => return Some((Ok::<_, Infallible>(multipart_part(&frame)), rx)),
                // Slow client: drop the missed frames and keep going.
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return None,
            }
        }
    }));

    ([(header::CONTENT_TYPE, MULTIPART_MIME)], body).into_response()
}

/// One part of the unbounded stream: boundary, per-part content type, JPEG
/// payload, trailing CRLF.
pub fn multipart_part(frame: &[u8]) -> Bytes {
    let mut buf = Vec::with_capacity(frame.len() + 48);
    buf.extend_from_slice(b"--frame\r\nContent-Type: image/jpeg\r\n\r\n");
    buf.extend_from_slice(frame);
    buf.extend_from_slice(b"\r\n");
    Bytes::from(buf)
}
