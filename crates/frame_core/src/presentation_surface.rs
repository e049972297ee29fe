use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::backend::Backend;
use crate::backend::Device;
use crate::backend::SwapChain;
use crate::desc::BUFFER_COUNT;
use crate::desc::Format;
use crate::desc::SwapChainDesc;
use crate::desc::Viewport;
use crate::error::GpuError;
use crate::error::GpuResult;
use crate::error::ResizeError;
use crate::frame_sync::FrameSynchronizer;
use crate::resource_state::ResourceState;
use crate::resource_state::require_state;

pub const SURFACE_FORMAT: Format = Format::Rgba8Unorm;

/// A swap-chain buffer, its view, and the state it was last declared in.
pub struct RenderTarget<B: Backend> {
    view: B::RenderTargetView,
    texture: B::Texture,
    state: ResourceState,
}

impl<B: Backend> RenderTarget<B> {
    pub fn view(&self) -> &B::RenderTargetView {
        &self.view
    }

    pub fn texture(&self) -> &B::Texture {
        &self.texture
    }

    pub fn state(&self) -> ResourceState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: ResourceState) {
        self.state = state;
    }
}

/// Fixed ring of render targets indexed by the presentation engine.
pub struct RenderTargetRing<B: Backend> {
    targets: [RenderTarget<B>; BUFFER_COUNT],
    current: usize,
}

impl<B: Backend> RenderTargetRing<B> {
    fn new(targets: [RenderTarget<B>; BUFFER_COUNT], current: u32) -> GpuResult<Self> {
        let mut ring = Self { targets, current: 0 };
        ring.set_current(current)?;
        Ok(ring)
    }

    /// Only in-range indices are accepted, so `current` always indexes both
    /// textures and views.
    fn set_current(&mut self, index: u32) -> GpuResult<()> {
        let index_usize = index as usize;
        if index_usize >= self.targets.len() {
            return Err(GpuError::BufferIndexOutOfRange {
                index,
                count: self.targets.len(),
            });
        }
        self.current = index_usize;
        Ok(())
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> &RenderTarget<B> {
        &self.targets[self.current]
    }

    pub fn current_mut(&mut self) -> &mut RenderTarget<B> {
        &mut self.targets[self.current]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeOutcome {
    /// A zero dimension (minimized window); nothing touched.
    Ignored,
    /// Same size as the live buffers; nothing touched.
    Unchanged,
    Resized,
}

/// Double-buffered swap surface with one render-target view per buffer.
///
/// When `targets` is `None` the surface is paused: a resize failed and no
/// view exists that could point at a released buffer.
pub struct PresentationSurface<B: Backend> {
    targets: Option<RenderTargetRing<B>>,
    view_heap: B::ViewHeap,
    swap_chain: B::SwapChain,
    desc: SwapChainDesc,
    view_generation: u64,
}

impl<B: Backend> PresentationSurface<B> {
    pub fn create(
        device: &B::Device,
        queue: &B::Queue,
        window: B::WindowHandle,
        width: u32,
        height: u32,
    ) -> GpuResult<Self> {
        let desc = SwapChainDesc {
            width,
            height,
            buffer_count: BUFFER_COUNT as u32,
            format: SURFACE_FORMAT,
        };
        let swap_chain = device.create_swap_chain(queue, window, &desc)?;
        let view_heap = device.create_view_heap(desc.buffer_count)?;
        let targets = Self::create_targets(device, &swap_chain, &view_heap)?;
        debug!(
            width,
            height,
            current = targets.current_index(),
            "Created presentation surface"
        );
        Ok(Self {
            targets: Some(targets),
            view_heap,
            swap_chain,
            desc,
            view_generation: 1,
        })
    }

    fn create_targets(
        device: &B::Device,
        swap_chain: &B::SwapChain,
        view_heap: &B::ViewHeap,
    ) -> GpuResult<RenderTargetRing<B>> {
        let targets = array_init::try_array_init(|i| -> GpuResult<RenderTarget<B>> {
            let texture = swap_chain.buffer(i as u32)?;
            let view = device.create_render_target_view(view_heap, i as u32, &texture);
            Ok(RenderTarget {
                view,
                texture,
                state: ResourceState::Present,
            })
        })?;
        RenderTargetRing::new(targets, swap_chain.current_buffer_index())
    }

    /// The buffer/view pair the next frame renders into, or `None` while
    /// paused. Valid only until the next [`PresentationSurface::present`].
    pub fn acquire_current(&mut self) -> Option<&mut RenderTarget<B>> {
        self.targets.as_mut().map(RenderTargetRing::current_mut)
    }

    /// Drains the GPU, releases every view and buffer reference, resizes the
    /// swap chain and recreates the views.
    ///
    /// On failure the surface keeps its previous dimensions and stays paused
    /// until a later resize succeeds.
    pub fn resize(
        &mut self,
        device: &B::Device,
        queue: &B::Queue,
        sync: &mut FrameSynchronizer<B>,
        width: u32,
        height: u32,
    ) -> Result<ResizeOutcome, ResizeError> {
        if width == 0 || height == 0 {
            debug!(width, height, "Ignoring resize to empty surface");
            return Ok(ResizeOutcome::Ignored);
        }
        if self.targets.is_some() && width == self.desc.width && height == self.desc.height {
            return Ok(ResizeOutcome::Unchanged);
        }

        sync.drain_all(queue).map_err(ResizeError::Drain)?;
        self.targets = None;

        let resized = SwapChainDesc {
            width,
            height,
            ..self.desc
        };
        if let Err(source) = self.swap_chain.resize_buffers(&resized) {
            warn!(
                "Swap chain resize to {width}x{height} failed, keeping {}x{} and pausing rendering: {source}",
                self.desc.width, self.desc.height
            );
            return Err(ResizeError::Rejected {
                width,
                height,
                source,
            });
        }
        self.desc = resized;

        let targets = Self::create_targets(device, &self.swap_chain, &self.view_heap)
            .map_err(ResizeError::Views)?;
        self.view_generation += 1;
        info!(
            width,
            height,
            current = targets.current_index(),
            "Resized presentation surface"
        );
        self.targets = Some(targets);
        Ok(ResizeOutcome::Resized)
    }

    /// Presents the current buffer, which must already be back in the
    /// presentable state, and advances to the next buffer.
    pub fn present(&mut self, sync_interval: u32) -> GpuResult<()> {
        let Some(targets) = self.targets.as_mut() else {
            return Ok(());
        };
        require_state(targets.current().state(), ResourceState::Present)?;
        self.swap_chain.present(sync_interval)?;
        targets.set_current(self.swap_chain.current_buffer_index())
    }

    /// Re-reads the current buffer index from the presentation engine.
    pub fn refresh_current_index(&mut self) -> GpuResult<()> {
        match self.targets.as_mut() {
            Some(targets) => targets.set_current(self.swap_chain.current_buffer_index()),
            None => Ok(()),
        }
    }

    pub fn is_paused(&self) -> bool {
        self.targets.is_none()
    }

    pub fn width(&self) -> u32 {
        self.desc.width
    }

    pub fn height(&self) -> u32 {
        self.desc.height
    }

    pub fn current_index(&self) -> Option<usize> {
        self.targets.as_ref().map(RenderTargetRing::current_index)
    }

    /// Declared state of the current buffer, `None` while paused.
    pub fn current_state(&self) -> Option<ResourceState> {
        self.targets.as_ref().map(|targets| targets.current().state())
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::covering(self.desc.width, self.desc.height)
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.desc.height == 0 {
            1.0
        } else {
            self.desc.width as f32 / self.desc.height as f32
        }
    }

    /// Incremented every time the views are (re)created.
    pub fn view_generation(&self) -> u64 {
        self.view_generation
    }
}
