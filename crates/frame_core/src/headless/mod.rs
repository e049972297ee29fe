//! A simulated GPU for tests and for builds without Direct3D 12.
//!
//! Work submitted to a [`HeadlessQueue`] is only queued. It executes in
//! submission order when the CPU blocks on a [`HeadlessEvent`] or when a test
//! calls [`HeadlessGpu::run_until_idle`], so a fence that has been signaled
//! but not waited on is observably behind. While executing, the timeline
//! checks resource-state transitions, presentability, and views whose
//! texture has been released, and records each draw together with the
//! constant-buffer bytes it read.

mod command_list;
mod resources;
mod swap_chain;
mod timeline;

use std::cell::Cell;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use tracing::trace;

pub use command_list::HeadlessCommandList;
pub use resources::HeadlessBuffer;
pub use resources::HeadlessPipelineState;
pub use resources::HeadlessRootSignature;
pub use resources::HeadlessTexture;
pub use resources::HeadlessView;
pub use resources::HeadlessViewHeap;
pub use resources::HeadlessWindow;
pub use swap_chain::HeadlessSwapChain;
pub use timeline::DrawRecord;
pub use timeline::FenceSnapshot;
pub use timeline::GpuStats;
pub use timeline::HeadlessFaults;
pub use timeline::HeadlessGpu;

use crate::backend::Backend;
use crate::backend::CommandQueue;
use crate::backend::Device;
use crate::backend::Fence;
use crate::backend::FenceEvent;
use crate::desc::AdapterKind;
use crate::desc::BindingLayout;
use crate::desc::PipelineDesc;
use crate::desc::SwapChainDesc;
use crate::error::GpuError;
use crate::error::GpuResult;
use resources::LiveKind;
use resources::LiveToken;
use timeline::Op;

/// Bytecode blobs start with this container tag.
pub const SHADER_MAGIC: &[u8; 4] = b"DXBC";

/// Writes stand-in `vertex12.cso` and `pixel12.cso` files into `dir` that the
/// simulated device accepts as shader bytecode.
pub fn write_shader_binaries(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    for file in ["vertex12.cso", "pixel12.cso"] {
        let mut bytes = SHADER_MAGIC.to_vec();
        bytes.extend_from_slice(file.as_bytes());
        std::fs::write(dir.join(file), bytes)?;
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Headless {
    faults: HeadlessFaults,
}

impl Headless {
    pub fn with_faults(faults: HeadlessFaults) -> Self {
        Self { faults }
    }
}

impl Backend for Headless {
    type Device = HeadlessDevice;
    type Queue = HeadlessQueue;
    type Fence = HeadlessFence;
    type Event = HeadlessEvent;
    type SwapChain = HeadlessSwapChain;
    type Texture = HeadlessTexture;
    type ViewHeap = HeadlessViewHeap;
    type RenderTargetView = HeadlessView;
    type Buffer = HeadlessBuffer;
    type RootSignature = HeadlessRootSignature;
    type PipelineState = HeadlessPipelineState;
    type CommandList = HeadlessCommandList;
    type WindowHandle = HeadlessWindow;

    fn create_device(&self, adapter: AdapterKind) -> GpuResult<HeadlessDevice> {
        let missing = match adapter {
            AdapterKind::Hardware => self.faults.no_hardware_adapter,
            AdapterKind::Software => self.faults.no_software_adapter,
        };
        if missing {
            return Err(GpuError::NoAdapter(adapter.name()));
        }
        Ok(HeadlessDevice {
            gpu: HeadlessGpu::new(self.faults),
            adapter,
        })
    }
}

pub struct HeadlessDevice {
    gpu: HeadlessGpu,
    adapter: AdapterKind,
}

impl HeadlessDevice {
    pub fn gpu(&self) -> &HeadlessGpu {
        &self.gpu
    }
}

impl Device<Headless> for HeadlessDevice {
    fn adapter_name(&self) -> String {
        match self.adapter {
            AdapterKind::Hardware => "Headless Hardware Adapter".to_owned(),
            AdapterKind::Software => "Headless Software Adapter".to_owned(),
        }
    }

    fn create_queue(&self) -> GpuResult<HeadlessQueue> {
        Ok(HeadlessQueue {
            gpu: self.gpu.clone(),
        })
    }

    fn create_swap_chain(
        &self,
        _queue: &HeadlessQueue,
        window: HeadlessWindow,
        desc: &SwapChainDesc,
    ) -> GpuResult<HeadlessSwapChain> {
        HeadlessSwapChain::new(&self.gpu, window, desc)
    }

    fn create_view_heap(&self, count: u32) -> GpuResult<HeadlessViewHeap> {
        Ok(HeadlessViewHeap { count })
    }

    fn create_render_target_view(
        &self,
        heap: &HeadlessViewHeap,
        index: u32,
        texture: &HeadlessTexture,
    ) -> HeadlessView {
        if index >= heap.count {
            self.gpu.violation(format!(
                "view slot {index} outside a heap of {}",
                heap.count
            ));
        }
        HeadlessView {
            texture: Rc::downgrade(&texture.0),
        }
    }

    fn create_fence(&self, initial_value: u64) -> GpuResult<HeadlessFence> {
        Ok(HeadlessFence {
            completed: Rc::new(Cell::new(initial_value)),
        })
    }

    fn create_event(&self) -> GpuResult<HeadlessEvent> {
        Ok(HeadlessEvent {
            gpu: self.gpu.clone(),
            armed: RefCell::new(None),
        })
    }

    fn create_root_signature(&self, layout: &BindingLayout) -> GpuResult<HeadlessRootSignature> {
        Ok(HeadlessRootSignature {
            layout: *layout,
            _live: LiveToken::new(&self.gpu, LiveKind::RootSignature),
        })
    }

    fn create_pipeline_state(
        &self,
        desc: &PipelineDesc<'_, HeadlessRootSignature>,
    ) -> GpuResult<HeadlessPipelineState> {
        let reason = if self.gpu.faults().reject_pipeline {
            Some("injected fault".to_owned())
        } else if !desc.vertex_shader.starts_with(SHADER_MAGIC)
            || !desc.pixel_shader.starts_with(SHADER_MAGIC)
        {
            Some("shader bytecode is not a DXBC container".to_owned())
        } else if desc.input_layout.is_empty() {
            Some("empty input layout".to_owned())
        } else if !desc.root_signature.layout.allow_input_assembler {
            Some("root signature denies the input assembler".to_owned())
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(GpuError::Rejected {
                what: "pipeline state",
                reason,
            });
        }
        Ok(HeadlessPipelineState {
            _live: LiveToken::new(&self.gpu, LiveKind::Pipeline),
        })
    }

    fn create_upload_buffer(&self, size: u64, name: &str) -> GpuResult<HeadlessBuffer> {
        HeadlessBuffer::new(size, name)
    }

    fn create_command_list(&self) -> GpuResult<HeadlessCommandList> {
        Ok(HeadlessCommandList::new(&self.gpu))
    }
}

pub struct HeadlessQueue {
    gpu: HeadlessGpu,
}

impl CommandQueue<Headless> for HeadlessQueue {
    fn execute(&self, list: &HeadlessCommandList) -> GpuResult<()> {
        if self.gpu.faults().fail_execute {
            return Err(GpuError::Submission("execute refused: injected fault".into()));
        }
        if list.is_open() {
            return Err(GpuError::Submission(format!(
                "list {} submitted without being closed",
                list.id()
            )));
        }
        trace!(list = list.id(), "Queued command list");
        self.gpu.enqueue(Op::Execute {
            list: list.id(),
            commands: list.commands().to_vec(),
        });
        Ok(())
    }

    fn signal(&self, fence: &HeadlessFence, value: u64) -> GpuResult<()> {
        if self.gpu.faults().fail_signal {
            return Err(GpuError::Submission("signal refused: injected fault".into()));
        }
        self.gpu.enqueue(Op::Signal {
            fence: Rc::clone(&fence.completed),
            value,
        });
        Ok(())
    }
}

pub struct HeadlessFence {
    completed: Rc<Cell<u64>>,
}

impl Fence<Headless> for HeadlessFence {
    fn completed_value(&self) -> u64 {
        self.completed.get()
    }

    fn set_event_on_completion(&self, value: u64, event: &HeadlessEvent) -> GpuResult<()> {
        event
            .armed
            .replace(Some((Rc::clone(&self.completed), value)));
        Ok(())
    }
}

/// Waiting on the event runs the timeline until the armed value is reached.
pub struct HeadlessEvent {
    gpu: HeadlessGpu,
    armed: RefCell<Option<(Rc<Cell<u64>>, u64)>>,
}

impl FenceEvent for HeadlessEvent {
    fn wait(&self) -> GpuResult<()> {
        let Some((fence, value)) = self.armed.take() else {
            return Ok(());
        };
        self.gpu.with(|t| t.stats.event_waits += 1);
        if self.gpu.run_until(&fence, value) {
            Ok(())
        } else {
            Err(GpuError::DeviceHung {
                awaited: value,
                completed: fence.get(),
            })
        }
    }
}
