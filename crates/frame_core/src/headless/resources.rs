use std::cell::Cell;
use std::cell::RefCell;
use std::cell::UnsafeCell;
use std::ptr::NonNull;
use std::rc::Rc;
use std::rc::Weak;

use crate::backend::UploadBuffer;
use crate::desc::BindingLayout;
use crate::error::GpuError;
use crate::error::GpuResult;
use crate::resource_state::ResourceState;

use super::timeline::HeadlessGpu;
use super::timeline::Timeline;
use super::timeline::note_texture_release;

/// Stand-in for a native window handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadlessWindow(pub u64);

pub struct TextureData {
    pub(crate) id: u64,
    /// State as seen by the GPU timeline, updated when transitions execute.
    pub(crate) state: Cell<ResourceState>,
    timeline: Weak<RefCell<Timeline>>,
}

impl Drop for TextureData {
    fn drop(&mut self) {
        note_texture_release(&self.timeline, self.id);
    }
}

/// A swap-chain buffer. The swap chain keeps its own reference.
pub struct HeadlessTexture(pub(crate) Rc<TextureData>);

impl HeadlessTexture {
    pub(crate) fn new(gpu: &HeadlessGpu) -> Self {
        Self(Rc::new(TextureData {
            id: gpu.next_id(),
            state: Cell::new(ResourceState::Present),
            timeline: gpu.downgrade(),
        }))
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn gpu_state(&self) -> ResourceState {
        self.0.state.get()
    }
}

pub struct HeadlessViewHeap {
    pub(crate) count: u32,
}

/// Render-target view. Does not keep its texture alive.
#[derive(Clone)]
pub struct HeadlessView {
    pub(crate) texture: Weak<TextureData>,
}

impl HeadlessView {
    /// Whether the texture this view was written for still exists.
    pub fn is_valid(&self) -> bool {
        self.texture.strong_count() > 0
    }
}

pub struct BufferData {
    name: String,
    storage: Box<[UnsafeCell<u8>]>,
    mapped: Cell<bool>,
}

impl BufferData {
    pub(crate) fn size(&self) -> u64 {
        self.storage.len() as u64
    }

    pub(crate) fn snapshot(&self) -> Vec<u8> {
        // SAFETY: single-threaded; no reference into the cells is held while
        // this copies them out.
        self.storage.iter().map(|cell| unsafe { *cell.get() }).collect()
    }
}

/// Upload-heap buffer backed by host memory.
#[derive(Clone)]
pub struct HeadlessBuffer(pub(crate) Rc<BufferData>);

impl HeadlessBuffer {
    pub(crate) fn new(size: u64, name: &str) -> GpuResult<Self> {
        if size == 0 {
            return Err(GpuError::Rejected {
                what: "upload buffer",
                reason: format!("{name} has zero size"),
            });
        }
        let storage = (0..size).map(|_| UnsafeCell::new(0)).collect();
        Ok(Self(Rc::new(BufferData {
            name: name.to_owned(),
            storage,
            mapped: Cell::new(false),
        })))
    }

    pub fn contents(&self) -> Vec<u8> {
        self.0.snapshot()
    }

    pub fn is_mapped(&self) -> bool {
        self.0.mapped.get()
    }
}

impl UploadBuffer for HeadlessBuffer {
    fn size(&self) -> u64 {
        self.0.size()
    }

    fn map(&self) -> GpuResult<NonNull<u8>> {
        if self.0.mapped.replace(true) {
            return Err(GpuError::Map(format!("{} is already mapped", self.0.name)));
        }
        NonNull::new(UnsafeCell::raw_get(self.0.storage.as_ptr()))
            .ok_or_else(|| GpuError::Map(format!("{} has no storage", self.0.name)))
    }

    fn unmap(&self) {
        self.0.mapped.set(false);
    }
}

#[derive(Clone, Copy)]
pub(crate) enum LiveKind {
    Pipeline,
    RootSignature,
}

/// Keeps a live-object count on the simulated GPU for as long as it exists.
pub(crate) struct LiveToken {
    gpu: HeadlessGpu,
    kind: LiveKind,
}

impl LiveToken {
    pub(crate) fn new(gpu: &HeadlessGpu, kind: LiveKind) -> Self {
        gpu.with(|t| match kind {
            LiveKind::Pipeline => t.stats.live_pipelines += 1,
            LiveKind::RootSignature => t.stats.live_root_signatures += 1,
        });
        Self {
            gpu: gpu.clone(),
            kind,
        }
    }
}

impl Drop for LiveToken {
    fn drop(&mut self) {
        let kind = self.kind;
        self.gpu.with(|t| match kind {
            LiveKind::Pipeline => t.stats.live_pipelines -= 1,
            LiveKind::RootSignature => t.stats.live_root_signatures -= 1,
        });
    }
}

pub struct HeadlessRootSignature {
    pub(crate) layout: BindingLayout,
    pub(crate) _live: LiveToken,
}

pub struct HeadlessPipelineState {
    pub(crate) _live: LiveToken,
}
