//! Direct3D 12 implementation of the [`crate::backend`] traits.

mod adapter;
mod buffer;
mod command_list;
mod device;
mod pipeline;
mod swap_chain;
mod sync;
mod transition_barrier;

use tracing::info;
use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Direct3D::*;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::*;
use windows::Win32::Graphics::Dxgi::*;

pub use buffer::D3d12Buffer;
pub use command_list::D3d12CommandList;
pub use device::D3d12Device;
pub use swap_chain::D3d12SwapChain;
pub use swap_chain::D3d12ViewHeap;
pub use sync::D3d12Queue;
pub use sync::FenceEvent;

use crate::backend::Backend;
use crate::desc::AdapterKind;
use crate::desc::Format;
use crate::device_context::with_debug_layer_fallback;
use crate::error::GpuError;
use crate::error::GpuResult;

#[derive(Debug, Clone, Copy, Default)]
pub struct D3d12 {
    debug_layer: bool,
}

impl D3d12 {
    pub fn new(debug_layer: bool) -> Self {
        Self { debug_layer }
    }
}

impl Backend for D3d12 {
    type Device = D3d12Device;
    type Queue = D3d12Queue;
    type Fence = ID3D12Fence;
    type Event = FenceEvent;
    type SwapChain = D3d12SwapChain;
    type Texture = ID3D12Resource;
    type ViewHeap = D3d12ViewHeap;
    type RenderTargetView = D3D12_CPU_DESCRIPTOR_HANDLE;
    type Buffer = D3d12Buffer;
    type RootSignature = ID3D12RootSignature;
    type PipelineState = ID3D12PipelineState;
    type CommandList = D3d12CommandList;
    type WindowHandle = HWND;

    fn create_device(&self, kind: AdapterKind) -> GpuResult<D3d12Device> {
        with_debug_layer_fallback(self.debug_layer, |debug| create_device_on(kind, debug))
    }
}

fn create_device_on(kind: AdapterKind, debug_layer: bool) -> GpuResult<D3d12Device> {
    let factory_flags = if debug_layer {
        adapter::enable_debug_layer()
    } else {
        DXGI_CREATE_FACTORY_FLAGS(0)
    };
    let factory: IDXGIFactory4 = unsafe { CreateDXGIFactory2(factory_flags) }?;

    let (adapter, adapter_name) = match kind {
        AdapterKind::Hardware => adapter::get_hardware_adapter(&factory)?,
        AdapterKind::Software => adapter::get_warp_adapter(&factory)?,
    };

    let mut device: Option<ID3D12Device> = None;
    unsafe { D3D12CreateDevice(&adapter, D3D_FEATURE_LEVEL_11_0, &mut device) }?;
    let device = device.ok_or(GpuError::NoAdapter(kind.name()))?;
    info!(adapter = %adapter_name, debug_layer, "Created D3D12 device");
    Ok(D3d12Device::new(device, factory, adapter_name))
}

pub(crate) fn dxgi_format(format: Format) -> DXGI_FORMAT {
    match format {
        Format::Rgba8Unorm => DXGI_FORMAT_R8G8B8A8_UNORM,
        Format::Rg32Float => DXGI_FORMAT_R32G32_FLOAT,
        Format::Rgb32Float => DXGI_FORMAT_R32G32B32_FLOAT,
        Format::Rgba32Float => DXGI_FORMAT_R32G32B32A32_FLOAT,
    }
}
