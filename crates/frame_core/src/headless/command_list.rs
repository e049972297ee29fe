use std::rc::Rc;

use crate::backend::CommandList;
use crate::desc::Viewport;
use crate::error::GpuError;
use crate::error::GpuResult;
use crate::resource_state::Transition;

use super::Headless;
use super::resources::HeadlessBuffer;
use super::resources::HeadlessPipelineState;
use super::resources::HeadlessRootSignature;
use super::resources::HeadlessTexture;
use super::resources::HeadlessView;
use super::timeline::Command;
use super::timeline::HeadlessGpu;

/// Records commands into a plain vector; `execute` hands a copy to the
/// timeline.
pub struct HeadlessCommandList {
    id: u64,
    gpu: HeadlessGpu,
    commands: Vec<Command>,
    open: bool,
}

impl HeadlessCommandList {
    pub(crate) fn new(gpu: &HeadlessGpu) -> Self {
        Self {
            id: gpu.next_id(),
            gpu: gpu.clone(),
            commands: Vec::new(),
            open: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn commands(&self) -> &[Command] {
        &self.commands
    }

    fn record(&mut self, command: Command) {
        if !self.open {
            self.gpu
                .violation(format!("list {} recorded while closed", self.id));
            return;
        }
        self.commands.push(command);
    }
}

impl CommandList<Headless> for HeadlessCommandList {
    fn reset(&mut self, _pipeline: &HeadlessPipelineState) -> GpuResult<()> {
        if self.open {
            return Err(GpuError::Submission(format!(
                "list {} reset while still recording",
                self.id
            )));
        }
        if self.gpu.list_in_flight(self.id) {
            return Err(GpuError::Submission(format!(
                "allocator of list {} reset while the GPU may still read it",
                self.id
            )));
        }
        self.commands.clear();
        self.open = true;
        self.record(Command::SetPipeline);
        Ok(())
    }

    fn set_root_signature(&mut self, _root_signature: &HeadlessRootSignature) {
        self.record(Command::SetRootSignature);
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.record(Command::SetViewport(viewport));
    }

    fn transition(&mut self, texture: &HeadlessTexture, transition: Transition) {
        self.record(Command::Transition {
            texture: Rc::downgrade(&texture.0),
            transition,
        });
    }

    fn set_render_target(&mut self, view: &HeadlessView) {
        self.record(Command::SetRenderTarget(view.texture.clone()));
    }

    fn clear_render_target(&mut self, view: &HeadlessView, _color: [f32; 4]) {
        self.record(Command::Clear(view.texture.clone()));
    }

    fn set_vertex_buffer(&mut self, buffer: &HeadlessBuffer, stride: u32) {
        self.record(Command::SetVertexBuffer {
            buffer: Rc::downgrade(&buffer.0),
            stride,
        });
    }

    fn set_constant_buffer(&mut self, _slot: u32, buffer: &HeadlessBuffer) {
        self.record(Command::SetConstantBuffer(Rc::downgrade(&buffer.0)));
    }

    fn draw(&mut self, vertex_count: u32) {
        self.record(Command::Draw(vertex_count));
    }

    fn close(&mut self) -> GpuResult<()> {
        if !self.open {
            return Err(GpuError::Submission(format!(
                "list {} closed twice",
                self.id
            )));
        }
        self.open = false;
        Ok(())
    }
}
