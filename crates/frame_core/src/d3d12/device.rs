use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::*;

use super::D3d12;
use super::buffer::D3d12Buffer;
use super::command_list::D3d12CommandList;
use super::pipeline;
use super::swap_chain::D3d12SwapChain;
use super::swap_chain::D3d12ViewHeap;
use super::sync::D3d12Queue;
use super::sync::FenceEvent;
use crate::backend::Device;
use crate::desc::BindingLayout;
use crate::desc::PipelineDesc;
use crate::desc::SwapChainDesc;
use crate::error::GpuResult;

pub struct D3d12Device {
    device: ID3D12Device,
    factory: IDXGIFactory4,
    adapter_name: String,
}

impl D3d12Device {
    pub(crate) fn new(device: ID3D12Device, factory: IDXGIFactory4, adapter_name: String) -> Self {
        Self {
            device,
            factory,
            adapter_name,
        }
    }
}

impl Device<D3d12> for D3d12Device {
    fn adapter_name(&self) -> String {
        self.adapter_name.clone()
    }

    fn create_queue(&self) -> GpuResult<D3d12Queue> {
        let queue: ID3D12CommandQueue = unsafe {
            self.device.CreateCommandQueue(&D3D12_COMMAND_QUEUE_DESC {
                Type: D3D12_COMMAND_LIST_TYPE_DIRECT,
                ..Default::default()
            })?
        };
        Ok(D3d12Queue::new(queue))
    }

    fn create_swap_chain(
        &self,
        queue: &D3d12Queue,
        window: HWND,
        desc: &SwapChainDesc,
    ) -> GpuResult<D3d12SwapChain> {
        D3d12SwapChain::create(&self.factory, queue.raw(), window, desc)
    }

    fn create_view_heap(&self, count: u32) -> GpuResult<D3d12ViewHeap> {
        D3d12ViewHeap::create(&self.device, count)
    }

    fn create_render_target_view(
        &self,
        heap: &D3d12ViewHeap,
        index: u32,
        texture: &ID3D12Resource,
    ) -> D3D12_CPU_DESCRIPTOR_HANDLE {
        let handle = heap.handle(index);
        unsafe { self.device.CreateRenderTargetView(texture, None, handle) };
        handle
    }

    fn create_fence(&self, initial_value: u64) -> GpuResult<ID3D12Fence> {
        Ok(unsafe { self.device.CreateFence(initial_value, D3D12_FENCE_FLAG_NONE)? })
    }

    fn create_event(&self) -> GpuResult<FenceEvent> {
        FenceEvent::create()
    }

    fn create_root_signature(&self, layout: &BindingLayout) -> GpuResult<ID3D12RootSignature> {
        pipeline::create_root_signature(&self.device, layout)
    }

    fn create_pipeline_state(
        &self,
        desc: &PipelineDesc<'_, ID3D12RootSignature>,
    ) -> GpuResult<ID3D12PipelineState> {
        pipeline::create_pipeline_state(&self.device, desc)
    }

    fn create_upload_buffer(&self, size: u64, name: &str) -> GpuResult<D3d12Buffer> {
        D3d12Buffer::create(&self.device, size, name)
    }

    fn create_command_list(&self) -> GpuResult<D3d12CommandList> {
        D3d12CommandList::create(&self.device)
    }
}
