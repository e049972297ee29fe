//! The application surface driven by the window collaborator:
//! `init`, `on_resize`, `update` and `render`.

use tracing::info;
use tracing::warn;

use crate::backend::Backend;
use crate::config::RendererConfig;
use crate::desc::AdapterKind;
use crate::device_context::DeviceContext;
use crate::error::FrameError;
use crate::error::ResizeError;
use crate::error::StartupError;
use crate::error::StartupStage;
use crate::frame_renderer::FrameInputs;
use crate::frame_renderer::FrameOutcome;
use crate::frame_renderer::FrameRenderer;
use crate::frame_sync::FrameSynchronizer;
use crate::gpu_buffer::GpuBufferPool;
use crate::gpu_buffer::MappedConstantBuffer;
use crate::gpu_buffer::VertexBuffer;
use crate::pipeline_builder::Pipeline;
use crate::pipeline_builder::PipelineBuilder;
use crate::pipeline_builder::ShaderBinaries;
use crate::presentation_surface::PresentationSurface;
use crate::presentation_surface::ResizeOutcome;
use crate::scene::PerObjectConstants;
use crate::scene::SceneState;
use crate::scene::TRIANGLE;
use crate::vertex::Vertex;

/// A rotating triangle drawn one fully synchronized frame at a time.
///
/// Fields drop top to bottom, after [`Drop`] has drained the GPU: GPU
/// objects go first and the device last.
pub struct SpinningTriangle<B: Backend> {
    renderer: FrameRenderer<B>,
    constant_buffer: MappedConstantBuffer<B, PerObjectConstants>,
    vertex_buffer: VertexBuffer<B>,
    pipeline: Pipeline<B>,
    surface: PresentationSurface<B>,
    sync: FrameSynchronizer<B>,
    context: DeviceContext<B>,
    scene: SceneState,
}

impl<B: Backend> SpinningTriangle<B> {
    pub fn init(
        backend: &B,
        window: B::WindowHandle,
        width: u32,
        height: u32,
        config: &RendererConfig,
    ) -> Result<Self, StartupError> {
        let context = DeviceContext::<B>::create(backend, config.use_warp_device)?;
        let device = context.device();

        let surface =
            PresentationSurface::<B>::create(device, context.queue(), window, width, height)
                .map_err(StartupError::at(StartupStage::Surface))?;
        let renderer = FrameRenderer::<B>::new(device, config.clear_color, config.sync_interval)
            .map_err(StartupError::at(StartupStage::CommandList))?;
        let vertex_buffer =
            GpuBufferPool::create_vertex_buffer::<B, Vertex>(device, &TRIANGLE, "VertexBuffer")
                .map_err(StartupError::at(StartupStage::Buffers))?;
        let constant_buffer = GpuBufferPool::create_persistently_mapped::<B, PerObjectConstants>(
            device,
            "ConstantBuffer",
        )
        .map_err(StartupError::at(StartupStage::Buffers))?;
        let sync =
            FrameSynchronizer::<B>::new(device).map_err(StartupError::at(StartupStage::Fence))?;

        let pipeline = ShaderBinaries::load(
            &config.shader_dir,
            &config.vertex_shader,
            &config.pixel_shader,
        )
        .and_then(|shaders| PipelineBuilder::new(&shaders, Vertex::LAYOUT).build::<B>(device))
        .map_err(StartupError::at(StartupStage::Pipeline))?;

        info!(width, height, "Initialized spinning triangle");
        Ok(Self {
            renderer,
            constant_buffer,
            vertex_buffer,
            pipeline,
            surface,
            sync,
            context,
            scene: SceneState::default(),
        })
    }

    /// Zero-sized and unchanged sizes are ignored. A rejected resize leaves
    /// rendering paused until a later resize succeeds.
    pub fn on_resize(&mut self, width: u32, height: u32) -> Result<ResizeOutcome, ResizeError> {
        self.surface.resize(
            self.context.device(),
            self.context.queue(),
            &mut self.sync,
            width,
            height,
        )
    }

    /// Advances the animation by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        self.scene.advance(dt);
    }

    pub fn render(&mut self) -> Result<FrameOutcome, FrameError> {
        let constants = self.scene.constants(self.surface.aspect_ratio());
        self.renderer.render_frame(
            self.context.queue(),
            &mut self.surface,
            &mut self.sync,
            FrameInputs {
                pipeline: &self.pipeline,
                vertex_buffer: &self.vertex_buffer,
                constant_buffer: &mut self.constant_buffer,
                constants,
            },
        )
    }

    pub fn adapter(&self) -> AdapterKind {
        self.context.adapter()
    }

    pub fn device(&self) -> &B::Device {
        self.context.device()
    }

    pub fn surface(&self) -> &PresentationSurface<B> {
        &self.surface
    }

    pub fn sync(&self) -> &FrameSynchronizer<B> {
        &self.sync
    }

    pub fn scene(&self) -> &SceneState {
        &self.scene
    }

    /// The constants the GPU read for the last rendered frame.
    pub fn constants(&self) -> PerObjectConstants {
        self.constant_buffer.read()
    }

    pub fn frames_presented(&self) -> u64 {
        self.renderer.frames_presented()
    }
}

impl<B: Backend> Drop for SpinningTriangle<B> {
    fn drop(&mut self) {
        if let Err(e) = self.sync.drain_all(self.context.queue()) {
            warn!("GPU did not drain before shutdown: {e}");
        }
    }
}
