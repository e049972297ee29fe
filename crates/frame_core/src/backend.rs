//! The GPU primitives the frame core is written against.
//!
//! [`crate::d3d12`] implements these on top of Direct3D 12;
//! [`crate::headless`] implements them with a simulated GPU timeline.

use std::ptr::NonNull;

use crate::desc::AdapterKind;
use crate::desc::BindingLayout;
use crate::desc::PipelineDesc;
use crate::desc::SwapChainDesc;
use crate::desc::Viewport;
use crate::error::GpuResult;
use crate::resource_state::Transition;

pub trait Backend: Sized + 'static {
    type Device: Device<Self>;
    type Queue: CommandQueue<Self>;
    type Fence: Fence<Self>;
    type Event: FenceEvent;
    type SwapChain: SwapChain<Self>;
    /// A swap-chain buffer.
    type Texture;
    type ViewHeap;
    type RenderTargetView: Clone;
    type Buffer: UploadBuffer;
    type RootSignature;
    type PipelineState;
    type CommandList: CommandList<Self>;
    type WindowHandle: Copy;

    /// Creates a logical device on the first adapter of the given kind.
    fn create_device(&self, adapter: AdapterKind) -> GpuResult<Self::Device>;
}

pub trait Device<B: Backend> {
    fn adapter_name(&self) -> String;

    fn create_queue(&self) -> GpuResult<B::Queue>;

    fn create_swap_chain(
        &self,
        queue: &B::Queue,
        window: B::WindowHandle,
        desc: &SwapChainDesc,
    ) -> GpuResult<B::SwapChain>;

    fn create_view_heap(&self, count: u32) -> GpuResult<B::ViewHeap>;

    /// Writes a render-target view for `texture` into slot `index` of `heap`.
    fn create_render_target_view(
        &self,
        heap: &B::ViewHeap,
        index: u32,
        texture: &B::Texture,
    ) -> B::RenderTargetView;

    fn create_fence(&self, initial_value: u64) -> GpuResult<B::Fence>;

    fn create_event(&self) -> GpuResult<B::Event>;

    fn create_root_signature(&self, layout: &BindingLayout) -> GpuResult<B::RootSignature>;

    fn create_pipeline_state(
        &self,
        desc: &PipelineDesc<'_, B::RootSignature>,
    ) -> GpuResult<B::PipelineState>;

    /// CPU-writable, GPU-readable buffer on the upload heap.
    fn create_upload_buffer(&self, size: u64, name: &str) -> GpuResult<B::Buffer>;

    /// A command list with its own allocator, created closed.
    fn create_command_list(&self) -> GpuResult<B::CommandList>;
}

pub trait CommandQueue<B: Backend> {
    fn execute(&self, list: &B::CommandList) -> GpuResult<()>;

    /// Enqueues a GPU-side write of `value` into `fence`.
    fn signal(&self, fence: &B::Fence, value: u64) -> GpuResult<()>;
}

pub trait Fence<B: Backend> {
    fn completed_value(&self) -> u64;

    /// Arms `event` to fire once the fence reaches `value`.
    fn set_event_on_completion(&self, value: u64, event: &B::Event) -> GpuResult<()>;
}

/// OS-level wait object paired with a fence.
pub trait FenceEvent {
    /// Blocks the calling thread until the armed fence value is reached.
    fn wait(&self) -> GpuResult<()>;
}

pub trait SwapChain<B: Backend> {
    fn buffer(&self, index: u32) -> GpuResult<B::Texture>;

    fn current_buffer_index(&self) -> u32;

    /// Every texture obtained from [`SwapChain::buffer`] must be dropped first.
    fn resize_buffers(&self, desc: &SwapChainDesc) -> GpuResult<()>;

    fn present(&self, sync_interval: u32) -> GpuResult<()>;
}

pub trait UploadBuffer {
    fn size(&self) -> u64;

    /// Maps the whole buffer for CPU writes. The pointer stays valid until
    /// [`UploadBuffer::unmap`] or until the buffer is dropped.
    fn map(&self) -> GpuResult<NonNull<u8>>;

    fn unmap(&self);
}

pub trait CommandList<B: Backend> {
    /// Resets the allocator and reopens the list with `pipeline` bound.
    fn reset(&mut self, pipeline: &B::PipelineState) -> GpuResult<()>;

    fn set_root_signature(&mut self, root_signature: &B::RootSignature);

    fn set_viewport(&mut self, viewport: Viewport);

    fn transition(&mut self, texture: &B::Texture, transition: Transition);

    fn set_render_target(&mut self, view: &B::RenderTargetView);

    fn clear_render_target(&mut self, view: &B::RenderTargetView, color: [f32; 4]);

    fn set_vertex_buffer(&mut self, buffer: &B::Buffer, stride: u32);

    fn set_constant_buffer(&mut self, slot: u32, buffer: &B::Buffer);

    fn draw(&mut self, vertex_count: u32);

    fn close(&mut self) -> GpuResult<()>;
}
