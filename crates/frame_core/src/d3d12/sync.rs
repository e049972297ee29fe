use tracing::warn;
use windows::Win32::Foundation::*;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::System::Threading::*;
use windows::core::Interface;

use super::D3d12;
use super::command_list::D3d12CommandList;
use crate::backend::CommandQueue;
use crate::backend::Fence;
use crate::error::GpuError;
use crate::error::GpuResult;

pub struct D3d12Queue {
    queue: ID3D12CommandQueue,
}

impl D3d12Queue {
    pub(crate) fn new(queue: ID3D12CommandQueue) -> Self {
        Self { queue }
    }

    pub(crate) fn raw(&self) -> &ID3D12CommandQueue {
        &self.queue
    }
}

impl CommandQueue<D3d12> for D3d12Queue {
    fn execute(&self, list: &D3d12CommandList) -> GpuResult<()> {
        let command_list: Option<ID3D12CommandList> = Some(list.raw().cast()?);
        unsafe { self.queue.ExecuteCommandLists(&[command_list]) };
        Ok(())
    }

    fn signal(&self, fence: &ID3D12Fence, value: u64) -> GpuResult<()> {
        unsafe { self.queue.Signal(fence, value)? };
        Ok(())
    }
}

impl Fence<D3d12> for ID3D12Fence {
    fn completed_value(&self) -> u64 {
        unsafe { self.GetCompletedValue() }
    }

    fn set_event_on_completion(&self, value: u64, event: &FenceEvent) -> GpuResult<()> {
        unsafe { self.SetEventOnCompletion(value, event.handle)? };
        Ok(())
    }
}

/// Auto-reset Win32 event, closed on drop.
pub struct FenceEvent {
    handle: HANDLE,
}

impl FenceEvent {
    pub(crate) fn create() -> GpuResult<Self> {
        let handle = unsafe { CreateEventA(None, false, false, None)? };
        Ok(Self { handle })
    }
}

impl crate::backend::FenceEvent for FenceEvent {
    fn wait(&self) -> GpuResult<()> {
        let result = unsafe { WaitForSingleObjectEx(self.handle, INFINITE, false) };
        if result == WAIT_OBJECT_0 {
            Ok(())
        } else {
            Err(GpuError::Submission(format!(
                "waiting on fence event returned {:#x}",
                result.0
            )))
        }
    }
}

impl Drop for FenceEvent {
    fn drop(&mut self) {
        if let Err(e) = unsafe { CloseHandle(self.handle) } {
            warn!("Failed to close fence event: {e}");
        }
    }
}
