use tracing::trace;

use crate::backend::Backend;
use crate::backend::CommandQueue;
use crate::backend::Device;
use crate::backend::Fence;
use crate::backend::FenceEvent;
use crate::error::GpuResult;

/// Monotonic fence counter plus the OS event used to block on it.
///
/// Every frame ends with [`FrameSynchronizer::drain_all`], so at most one
/// frame is ever in flight and CPU writes never race GPU reads.
pub struct FrameSynchronizer<B: Backend> {
    fence: B::Fence,
    event: B::Event,
    submitted_value: u64,
}

impl<B: Backend> FrameSynchronizer<B> {
    pub fn new(device: &B::Device) -> GpuResult<Self> {
        let event = device.create_event()?;
        let fence = device.create_fence(0)?;
        Ok(Self {
            fence,
            event,
            submitted_value: 0,
        })
    }

    /// Enqueues a signal for the next counter value and returns that value.
    pub fn signal(&mut self, queue: &B::Queue) -> GpuResult<u64> {
        let value = self.submitted_value + 1;
        queue.signal(&self.fence, value)?;
        self.submitted_value = value;
        trace!(value, "Signaled fence");
        Ok(value)
    }

    /// Returns once the GPU has reached `value`, blocking if it has not yet.
    pub fn wait_for(&self, value: u64) -> GpuResult<()> {
        if self.fence.completed_value() >= value {
            return Ok(());
        }
        self.fence.set_event_on_completion(value, &self.event)?;
        self.event.wait()
    }

    /// Full barrier: after this returns no submitted GPU work is pending.
    pub fn drain_all(&mut self, queue: &B::Queue) -> GpuResult<u64> {
        let value = self.signal(queue)?;
        self.wait_for(value)?;
        Ok(value)
    }

    /// Non-blocking check of whether the GPU has reached `value`.
    pub fn is_complete(&self, value: u64) -> bool {
        self.fence.completed_value() >= value
    }

    pub fn submitted_value(&self) -> u64 {
        self.submitted_value
    }

    pub fn completed_value(&self) -> u64 {
        self.fence.completed_value()
    }
}
