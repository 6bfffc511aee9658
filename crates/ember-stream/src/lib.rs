pub mod camera;
pub mod net;
pub mod pump;
pub mod server;

pub use camera::{Camera, CameraConfig};
pub use pump::{FramePump, PumpConfig};
pub use server::{serve, StreamState};
