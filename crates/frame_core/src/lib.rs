//! Frame lifecycle and CPU/GPU synchronization for a single spinning
//! triangle on Direct3D 12.
//!
//! Every frame is recorded, submitted, presented and then fully drained
//! before the next one starts, so at most one frame is ever in flight.

pub mod app;
pub mod backend;
pub mod config;
#[cfg(windows)]
pub mod d3d12;
pub mod desc;
pub mod device_context;
pub mod error;
pub mod frame_renderer;
pub mod frame_sync;
pub mod gpu_buffer;
pub mod headless;
pub mod pipeline_builder;
pub mod presentation_surface;
pub mod resource_state;
pub mod scene;
pub mod vertex;

#[cfg(test)]
mod test_support;

pub use app::SpinningTriangle;
pub use config::RendererConfig;
pub use error::FrameError;
pub use error::GpuError;
pub use error::ResizeError;
pub use error::StartupError;
