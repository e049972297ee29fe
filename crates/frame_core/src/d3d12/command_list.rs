use windows::Win32::Foundation::RECT;
use windows::Win32::Graphics::Direct3D::*;
use windows::Win32::Graphics::Direct3D12::*;

use super::D3d12;
use super::buffer::D3d12Buffer;
use super::transition_barrier::transition_barrier;
use crate::backend::CommandList;
use crate::backend::UploadBuffer;
use crate::desc::Viewport;
use crate::error::GpuResult;
use crate::resource_state::Transition;

pub struct D3d12CommandList {
    allocator: ID3D12CommandAllocator,
    list: ID3D12GraphicsCommandList,
}

impl D3d12CommandList {
    pub(crate) fn create(device: &ID3D12Device) -> GpuResult<Self> {
        let allocator: ID3D12CommandAllocator =
            unsafe { device.CreateCommandAllocator(D3D12_COMMAND_LIST_TYPE_DIRECT)? };
        let list: ID3D12GraphicsCommandList = unsafe {
            device.CreateCommandList(
                0,
                D3D12_COMMAND_LIST_TYPE_DIRECT,
                &allocator,
                None::<&ID3D12PipelineState>,
            )?
        };
        // Created open; the frame loop expects it closed.
        unsafe { list.Close()? };
        Ok(Self { allocator, list })
    }

    pub(crate) fn raw(&self) -> &ID3D12GraphicsCommandList {
        &self.list
    }
}

impl CommandList<D3d12> for D3d12CommandList {
    fn reset(&mut self, pipeline: &ID3D12PipelineState) -> GpuResult<()> {
        unsafe {
            self.allocator.Reset()?;
            self.list.Reset(&self.allocator, pipeline)?;
        }
        Ok(())
    }

    fn set_root_signature(&mut self, root_signature: &ID3D12RootSignature) {
        unsafe { self.list.SetGraphicsRootSignature(root_signature) };
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        let d3d_viewport = D3D12_VIEWPORT {
            TopLeftX: 0.0,
            TopLeftY: 0.0,
            Width: viewport.width as f32,
            Height: viewport.height as f32,
            MinDepth: viewport.min_depth,
            MaxDepth: viewport.max_depth,
        };
        let scissor_rect = RECT {
            left: 0,
            top: 0,
            right: viewport.width as i32,
            bottom: viewport.height as i32,
        };
        unsafe {
            self.list.RSSetViewports(&[d3d_viewport]);
            self.list.RSSetScissorRects(&[scissor_rect]);
        }
    }

    fn transition(&mut self, texture: &ID3D12Resource, transition: Transition) {
        let barrier = transition_barrier(texture, transition);
        unsafe { self.list.ResourceBarrier(&[barrier]) };
    }

    fn set_render_target(&mut self, view: &D3D12_CPU_DESCRIPTOR_HANDLE) {
        unsafe { self.list.OMSetRenderTargets(1, Some(view), false, None) };
    }

    fn clear_render_target(&mut self, view: &D3D12_CPU_DESCRIPTOR_HANDLE, color: [f32; 4]) {
        unsafe { self.list.ClearRenderTargetView(*view, &color, None) };
    }

    fn set_vertex_buffer(&mut self, buffer: &D3d12Buffer, stride: u32) {
        let vbv = D3D12_VERTEX_BUFFER_VIEW {
            BufferLocation: buffer.gpu_address(),
            StrideInBytes: stride,
            SizeInBytes: buffer.size() as u32,
        };
        unsafe {
            self.list
                .IASetPrimitiveTopology(D3D_PRIMITIVE_TOPOLOGY_TRIANGLELIST);
            self.list.IASetVertexBuffers(0, Some(&[vbv]));
        }
    }

    fn set_constant_buffer(&mut self, slot: u32, buffer: &D3d12Buffer) {
        unsafe {
            self.list
                .SetGraphicsRootConstantBufferView(slot, buffer.gpu_address())
        };
    }

    fn draw(&mut self, vertex_count: u32) {
        unsafe { self.list.DrawInstanced(vertex_count, 1, 0, 0) };
    }

    fn close(&mut self) -> GpuResult<()> {
        unsafe { self.list.Close()? };
        Ok(())
    }
}
