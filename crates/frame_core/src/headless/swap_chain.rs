use std::cell::Cell;
use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::backend::SwapChain;
use crate::desc::SwapChainDesc;
use crate::error::GpuError;
use crate::error::GpuResult;

use super::Headless;
use super::resources::HeadlessTexture;
use super::resources::HeadlessWindow;
use super::timeline::HeadlessGpu;
use super::timeline::Op;

/// Flip-model swap chain: the current index advances by one per present
/// and restarts at zero after a resize.
pub struct HeadlessSwapChain {
    gpu: HeadlessGpu,
    buffers: RefCell<Vec<HeadlessTexture>>,
    desc: Cell<SwapChainDesc>,
    current: Cell<u32>,
}

impl HeadlessSwapChain {
    pub(crate) fn new(
        gpu: &HeadlessGpu,
        window: HeadlessWindow,
        desc: &SwapChainDesc,
    ) -> GpuResult<Self> {
        if desc.width == 0 || desc.height == 0 || desc.buffer_count < 2 {
            return Err(GpuError::Rejected {
                what: "swap chain",
                reason: format!(
                    "{}x{} with {} buffers",
                    desc.width, desc.height, desc.buffer_count
                ),
            });
        }
        debug!(
            window = window.0,
            width = desc.width,
            height = desc.height,
            "Created swap chain"
        );
        Ok(Self {
            gpu: gpu.clone(),
            buffers: RefCell::new(Self::allocate(gpu, desc)),
            desc: Cell::new(*desc),
            current: Cell::new(0),
        })
    }

    fn allocate(gpu: &HeadlessGpu, desc: &SwapChainDesc) -> Vec<HeadlessTexture> {
        (0..desc.buffer_count)
            .map(|_| HeadlessTexture::new(gpu))
            .collect()
    }
}

impl SwapChain<Headless> for HeadlessSwapChain {
    fn buffer(&self, index: u32) -> GpuResult<HeadlessTexture> {
        let buffers = self.buffers.borrow();
        let texture = buffers
            .get(index as usize)
            .ok_or(GpuError::BufferIndexOutOfRange {
                index,
                count: buffers.len(),
            })?;
        Ok(HeadlessTexture(Rc::clone(&texture.0)))
    }

    fn current_buffer_index(&self) -> u32 {
        self.current.get()
    }

    fn resize_buffers(&self, desc: &SwapChainDesc) -> GpuResult<()> {
        if self.gpu.faults().fail_resize {
            return Err(GpuError::Rejected {
                what: "swap chain resize",
                reason: "injected fault".into(),
            });
        }
        if let Some(held) = self
            .buffers
            .borrow()
            .iter()
            .find(|texture| Rc::strong_count(&texture.0) > 1)
        {
            return Err(GpuError::Rejected {
                what: "swap chain resize",
                reason: format!("buffer {} is still referenced", held.id()),
            });
        }

        let snapshot = self.gpu.fence_snapshot();
        self.gpu.with(|t| {
            t.stats.resizes += 1;
            t.stats.fence_at_last_resize = Some(snapshot);
        });
        let fresh = Self::allocate(&self.gpu, desc);
        let released = self.buffers.replace(fresh);
        drop(released);
        self.desc.set(*desc);
        self.current.set(0);
        debug!(
            width = desc.width,
            height = desc.height,
            ?snapshot,
            "Simulated swap chain resized"
        );
        Ok(())
    }

    fn present(&self, _sync_interval: u32) -> GpuResult<()> {
        if self.gpu.faults().fail_present {
            return Err(GpuError::Submission("present refused: injected fault".into()));
        }
        let current = self.current.get();
        let texture = {
            let buffers = self.buffers.borrow();
            let texture = buffers
                .get(current as usize)
                .ok_or(GpuError::BufferIndexOutOfRange {
                    index: current,
                    count: buffers.len(),
                })?;
            Rc::downgrade(&texture.0)
        };
        self.gpu.enqueue(Op::Present(texture));
        self.gpu.with(|t| t.stats.presents += 1);
        self.current.set((current + 1) % self.desc.get().buffer_count);
        Ok(())
    }
}
