//! Error types for the frame core.
//!
//! Backend primitives fail with [`GpuError`]. The application surface folds
//! those into one of three outcomes: [`StartupError`] (fatal, user visible),
//! [`ResizeError`] (surface paused until the next good resize) and
//! [`FrameError`] (one frame skipped).

use std::path::PathBuf;

use thiserror::Error;

use crate::resource_state::ResourceState;

/// Failure of a single GPU primitive.
#[derive(Error, Debug)]
pub enum GpuError {
    /// Windows API error
    #[cfg(windows)]
    #[error("Windows error: {0}")]
    Windows(#[from] windows::core::Error),

    /// No adapter of the requested kind can host a device
    #[error("No suitable {0} adapter found")]
    NoAdapter(&'static str),

    /// Shader binary could not be read from disk
    #[error("Failed to read shader binary {path:?}: {source}")]
    ShaderRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Shader binary exists but holds no bytecode
    #[error("Shader binary {0:?} is empty")]
    EmptyShader(PathBuf),

    /// Vertex attribute layout does not describe a packed vertex
    #[error("Invalid vertex layout: {0}")]
    InvalidVertexLayout(String),

    /// The device refused to build an object from the given description
    #[error("Device rejected {what}: {reason}")]
    Rejected { what: &'static str, reason: String },

    /// A transition or use was declared against the wrong resource state
    #[error("Resource is in state {actual:?}, expected {expected:?}")]
    StateMismatch {
        expected: ResourceState,
        actual: ResourceState,
    },

    /// The presentation mechanism reported a buffer index outside the ring
    #[error("Buffer index {index} out of range for {count} buffers")]
    BufferIndexOutOfRange { index: u32, count: usize },

    /// Command submission or presentation was refused
    #[error("Submission failed: {0}")]
    Submission(String),

    /// The GPU will never reach the awaited fence value
    #[error("Fence value {awaited} can never complete (completed {completed})")]
    DeviceHung { awaited: u64, completed: u64 },

    /// Upload buffer could not be mapped for CPU writes
    #[error("Failed to map buffer: {0}")]
    Map(String),
}

/// Result type alias for GPU primitive operations.
pub type GpuResult<T> = std::result::Result<T, GpuError>;

/// The startup step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupStage {
    Device,
    Queue,
    Surface,
    CommandList,
    Buffers,
    Fence,
    Pipeline,
}

impl std::fmt::Display for StartupStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StartupStage::Device => "device",
            StartupStage::Queue => "command queue",
            StartupStage::Surface => "presentation surface",
            StartupStage::CommandList => "command list",
            StartupStage::Buffers => "gpu buffers",
            StartupStage::Fence => "fence",
            StartupStage::Pipeline => "pipeline",
        };
        f.write_str(name)
    }
}

/// Startup could not complete; the process should report and exit.
#[derive(Error, Debug)]
#[error("Failed to create {stage}")]
pub struct StartupError {
    pub stage: StartupStage,
    #[source]
    pub source: GpuError,
}

impl StartupError {
    pub fn at(stage: StartupStage) -> impl FnOnce(GpuError) -> StartupError {
        move |source| StartupError { stage, source }
    }
}

/// Swap surface resize failed. Rendering stays paused until a later resize
/// succeeds; the surface keeps its previous dimensions.
#[derive(Error, Debug)]
pub enum ResizeError {
    #[error("GPU drain before resize failed: {0}")]
    Drain(#[source] GpuError),

    #[error("Backend rejected resize to {width}x{height}: {source}")]
    Rejected {
        width: u32,
        height: u32,
        #[source]
        source: GpuError,
    },

    #[error("Failed to recreate render target views: {0}")]
    Views(#[source] GpuError),
}

/// A single frame could not be recorded, submitted or presented.
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Failed to record frame: {0}")]
    Record(#[source] GpuError),

    #[error("Failed to submit frame: {0}")]
    Submit(#[source] GpuError),

    #[error("Failed to present frame: {0}")]
    Present(#[source] GpuError),

    #[error("Failed to synchronize frame: {0}")]
    Sync(#[source] GpuError),
}
