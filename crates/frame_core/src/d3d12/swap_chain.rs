use tracing::debug;
use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::*;
use windows::Win32::Graphics::Dxgi::*;
use windows::core::Interface;

use super::D3d12;
use super::dxgi_format;
use crate::backend::SwapChain;
use crate::desc::SwapChainDesc;
use crate::error::GpuResult;

pub struct D3d12SwapChain {
    swap_chain: IDXGISwapChain3,
}

impl D3d12SwapChain {
    pub(crate) fn create(
        factory: &IDXGIFactory4,
        queue: &ID3D12CommandQueue,
        hwnd: HWND,
        desc: &SwapChainDesc,
    ) -> GpuResult<Self> {
        let swap_chain_desc = DXGI_SWAP_CHAIN_DESC1 {
            BufferCount: desc.buffer_count,
            Width: desc.width,
            Height: desc.height,
            Format: dxgi_format(desc.format),
            BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
            SwapEffect: DXGI_SWAP_EFFECT_FLIP_DISCARD,
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                ..Default::default()
            },
            ..Default::default()
        };

        let swap_chain: IDXGISwapChain1 =
            unsafe { factory.CreateSwapChainForHwnd(queue, hwnd, &swap_chain_desc, None, None)? };
        let swap_chain: IDXGISwapChain3 = swap_chain.cast()?;

        // Fullscreen transitions are not handled.
        unsafe { factory.MakeWindowAssociation(hwnd, DXGI_MWA_NO_ALT_ENTER)? };

        Ok(Self { swap_chain })
    }
}

impl SwapChain<D3d12> for D3d12SwapChain {
    fn buffer(&self, index: u32) -> GpuResult<ID3D12Resource> {
        Ok(unsafe { self.swap_chain.GetBuffer(index)? })
    }

    fn current_buffer_index(&self) -> u32 {
        unsafe { self.swap_chain.GetCurrentBackBufferIndex() }
    }

    fn resize_buffers(&self, desc: &SwapChainDesc) -> GpuResult<()> {
        debug!(width = desc.width, height = desc.height, "ResizeBuffers");
        unsafe {
            self.swap_chain.ResizeBuffers(
                desc.buffer_count,
                desc.width,
                desc.height,
                dxgi_format(desc.format),
                DXGI_SWAP_CHAIN_FLAG(0),
            )?
        };
        Ok(())
    }

    fn present(&self, sync_interval: u32) -> GpuResult<()> {
        unsafe { self.swap_chain.Present(sync_interval, DXGI_PRESENT(0)) }.ok()?;
        Ok(())
    }
}

/// RTV descriptor heap with one slot per swap-chain buffer.
pub struct D3d12ViewHeap {
    heap: ID3D12DescriptorHeap,
    increment: u32,
}

impl D3d12ViewHeap {
    pub(crate) fn create(device: &ID3D12Device, count: u32) -> GpuResult<Self> {
        let heap: ID3D12DescriptorHeap = unsafe {
            device.CreateDescriptorHeap(&D3D12_DESCRIPTOR_HEAP_DESC {
                NumDescriptors: count,
                Type: D3D12_DESCRIPTOR_HEAP_TYPE_RTV,
                ..Default::default()
            })?
        };
        let increment =
            unsafe { device.GetDescriptorHandleIncrementSize(D3D12_DESCRIPTOR_HEAP_TYPE_RTV) };
        Ok(Self { heap, increment })
    }

    pub(crate) fn handle(&self, index: u32) -> D3D12_CPU_DESCRIPTOR_HANDLE {
        let start = unsafe { self.heap.GetCPUDescriptorHandleForHeapStart() };
        D3D12_CPU_DESCRIPTOR_HANDLE {
            ptr: start.ptr + (index * self.increment) as usize,
        }
    }
}
