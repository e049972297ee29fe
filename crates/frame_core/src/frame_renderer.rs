use tracing::debug;
use tracing::trace;
use tracing::warn;

use crate::backend::Backend;
use crate::backend::CommandList;
use crate::backend::CommandQueue;
use crate::backend::Device;
use crate::desc::Viewport;
use crate::error::FrameError;
use crate::error::GpuResult;
use crate::frame_sync::FrameSynchronizer;
use crate::gpu_buffer::ConstantData;
use crate::gpu_buffer::MappedConstantBuffer;
use crate::gpu_buffer::VertexBuffer;
use crate::pipeline_builder::Pipeline;
use crate::presentation_surface::PresentationSurface;
use crate::presentation_surface::RenderTarget;
use crate::resource_state::ResourceState;
use crate::resource_state::Transition;

pub const DEFAULT_CLEAR_COLOR: [f32; 4] = [0.392, 0.584, 0.929, 1.0];

/// What one frame draws with.
pub struct FrameInputs<'a, B: Backend, T: ConstantData> {
    pub pipeline: &'a Pipeline<B>,
    pub vertex_buffer: &'a VertexBuffer<B>,
    pub constant_buffer: &'a mut MappedConstantBuffer<B, T>,
    /// Written into `constant_buffer` after recording succeeds, before submission.
    pub constants: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Drawn, presented, and drained up to `fence_value`.
    Presented { fence_value: u64 },
    /// The surface is paused; nothing was written or submitted.
    Skipped,
}

/// Records and submits one frame at a time on a single command list.
pub struct FrameRenderer<B: Backend> {
    command_list: B::CommandList,
    clear_color: [f32; 4],
    sync_interval: u32,
    frames_presented: u64,
}

impl<B: Backend> FrameRenderer<B> {
    pub fn new(device: &B::Device, clear_color: [f32; 4], sync_interval: u32) -> GpuResult<Self> {
        let command_list = device.create_command_list()?;
        Ok(Self {
            command_list,
            clear_color,
            sync_interval,
            frames_presented: 0,
        })
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Records, writes the constants, submits, presents, then blocks until
    /// the GPU has consumed the frame.
    ///
    /// On a record, submit or present failure the frame is dropped: the
    /// command list is left closed, the current buffer index is re-read and
    /// the GPU is drained so the next frame starts from an idle GPU. A failed
    /// record leaves the constant buffer untouched.
    ///
    /// A frame counts as presented once the swap chain accepts it. If the
    /// drain that follows fails, [`FrameError::Sync`] is returned with the
    /// frame already counted.
    pub fn render_frame<T: ConstantData>(
        &mut self,
        queue: &B::Queue,
        surface: &mut PresentationSurface<B>,
        sync: &mut FrameSynchronizer<B>,
        inputs: FrameInputs<'_, B, T>,
    ) -> Result<FrameOutcome, FrameError> {
        let viewport = surface.viewport();
        let Some(target) = surface.acquire_current() else {
            trace!("Surface paused, skipping frame");
            return Ok(FrameOutcome::Skipped);
        };

        let mut state = target.state();
        if let Err(e) = self.record(target, &mut state, viewport, &inputs) {
            self.recover(queue, surface, sync);
            return Err(FrameError::Record(e));
        }

        // The previous frame ended with a full drain, so the GPU is idle.
        inputs.constant_buffer.write(&inputs.constants);

        if let Err(e) = queue.execute(&self.command_list) {
            self.recover(queue, surface, sync);
            return Err(FrameError::Submit(e));
        }
        target.set_state(state);

        if let Err(e) = surface.present(self.sync_interval) {
            self.recover(queue, surface, sync);
            return Err(FrameError::Present(e));
        }
        self.frames_presented += 1;
        let fence_value = sync.drain_all(queue).map_err(FrameError::Sync)?;
        trace!(fence_value, "Presented frame");
        Ok(FrameOutcome::Presented { fence_value })
    }

    fn record<T: ConstantData>(
        &mut self,
        target: &RenderTarget<B>,
        state: &mut ResourceState,
        viewport: Viewport,
        inputs: &FrameInputs<'_, B, T>,
    ) -> GpuResult<()> {
        self.command_list.reset(inputs.pipeline.state())?;
        let recorded = self.record_commands(target, state, viewport, inputs);
        if recorded.is_err() {
            if let Err(e) = self.command_list.close() {
                debug!("Closing abandoned command list failed: {e}");
            }
        }
        recorded
    }

    fn record_commands<T: ConstantData>(
        &mut self,
        target: &RenderTarget<B>,
        state: &mut ResourceState,
        viewport: Viewport,
        inputs: &FrameInputs<'_, B, T>,
    ) -> GpuResult<()> {
        let list = &mut self.command_list;
        let pipeline = inputs.pipeline;
        list.set_root_signature(pipeline.root_signature());
        list.set_viewport(viewport);

        Transition::TO_RENDER_TARGET.apply(state)?;
        list.transition(target.texture(), Transition::TO_RENDER_TARGET);
        list.set_render_target(target.view());
        list.clear_render_target(target.view(), self.clear_color);

        list.set_vertex_buffer(inputs.vertex_buffer.buffer(), inputs.vertex_buffer.stride());
        list.set_constant_buffer(
            pipeline.binding_layout().constant_buffer.slot,
            inputs.constant_buffer.buffer(),
        );
        list.draw(inputs.vertex_buffer.vertex_count());

        Transition::TO_PRESENT.apply(state)?;
        list.transition(target.texture(), Transition::TO_PRESENT);
        list.close()
    }

    fn recover(
        &mut self,
        queue: &B::Queue,
        surface: &mut PresentationSurface<B>,
        sync: &mut FrameSynchronizer<B>,
    ) {
        if let Err(e) = surface.refresh_current_index() {
            warn!("Could not re-read current buffer index: {e}");
        }
        if let Err(e) = sync.drain_all(queue) {
            warn!("Drain after failed frame did not complete: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use bytemuck::Zeroable;

    use super::*;
    use crate::desc::AdapterKind;
    use crate::gpu_buffer::GpuBufferPool;
    use crate::headless::Headless;
    use crate::headless::HeadlessDevice;
    use crate::headless::HeadlessFaults;
    use crate::headless::HeadlessQueue;
    use crate::headless::HeadlessWindow;
    use crate::pipeline_builder::PipelineBuilder;
    use crate::pipeline_builder::ShaderBinaries;
    use crate::scene::PerObjectConstants;
    use crate::scene::TRIANGLE;
    use crate::test_support::write_shaders;
    use crate::vertex::Vertex;

    struct Fixture {
        renderer: FrameRenderer<Headless>,
        constants: MappedConstantBuffer<Headless, PerObjectConstants>,
        vertices: VertexBuffer<Headless>,
        pipeline: Pipeline<Headless>,
        sync: FrameSynchronizer<Headless>,
        surface: PresentationSurface<Headless>,
        queue: HeadlessQueue,
        device: HeadlessDevice,
    }

    impl Fixture {
        fn new(name: &str) -> Self {
            let device = Headless::default()
                .create_device(AdapterKind::Hardware)
                .unwrap();
            let queue = device.create_queue().unwrap();
            let surface =
                PresentationSurface::<Headless>::create(&device, &queue, HeadlessWindow(1), 800, 600).unwrap();
            let renderer = FrameRenderer::<Headless>::new(&device, DEFAULT_CLEAR_COLOR, 1).unwrap();
            let vertices =
                GpuBufferPool::create_vertex_buffer::<Headless, _>(&device, &TRIANGLE, "VertexBuffer").unwrap();
            let constants =
                GpuBufferPool::create_persistently_mapped::<Headless, PerObjectConstants>(
                    &device,
                    "ConstantBuffer",
                ).unwrap();
            let sync = FrameSynchronizer::<Headless>::new(&device).unwrap();
            let shaders =
                ShaderBinaries::load(&write_shaders(name), "vertex12.cso", "pixel12.cso").unwrap();
            let pipeline = PipelineBuilder::new(&shaders, Vertex::LAYOUT)
                .build::<Headless>(&device)
                .unwrap();
            Self {
                renderer,
                constants,
                vertices,
                pipeline,
                sync,
                surface,
                queue,
                device,
            }
        }

        fn render(&mut self, rotation: f32) -> Result<FrameOutcome, FrameError> {
            let mut constants = PerObjectConstants::zeroed();
            constants.rotation = rotation;
            self.renderer.render_frame(
                &self.queue,
                &mut self.surface,
                &mut self.sync,
                FrameInputs {
                    pipeline: &self.pipeline,
                    vertex_buffer: &self.vertices,
                    constant_buffer: &mut self.constants,
                    constants,
                },
            )
        }
    }

    fn drawn_rotation(draw: &crate::headless::DrawRecord) -> f32 {
        bytemuck::pod_read_unaligned::<PerObjectConstants>(&draw.constants).rotation
    }

    #[test]
    fn frame_draws_presents_and_drains() {
        let mut f = Fixture::new("renderer_frame");
        let outcome = f.render(0.5).unwrap();
        assert_eq!(outcome, FrameOutcome::Presented { fence_value: 1 });

        let stats = f.device.gpu().stats();
        assert!(stats.violations.is_empty(), "{:?}", stats.violations);
        assert_eq!(stats.presents, 1);
        assert_eq!(stats.clears, 1);
        assert_eq!(stats.draws.len(), 1);
        assert_eq!(stats.draws[0].vertex_count, 3);
        assert_eq!(drawn_rotation(&stats.draws[0]), 0.5);
        assert_eq!(stats.transitions_to_render_target, 1);
        assert_eq!(stats.transitions_to_present, 1);
        assert!(f.device.gpu().is_idle());
        assert_eq!(f.sync.completed_value(), f.sync.submitted_value());
    }

    #[test]
    fn frames_alternate_buffers() {
        let mut f = Fixture::new("renderer_alternate");
        let mut targets = Vec::new();
        for i in 0..4 {
            assert_eq!(f.surface.current_index(), Some(i % 2));
            f.render(i as f32).unwrap();
            targets.push(f.device.gpu().stats().draws[i].target);
        }
        assert_ne!(targets[0], targets[1]);
        assert_eq!(targets[0], targets[2]);
        assert_eq!(targets[1], targets[3]);
        assert_eq!(f.renderer.frames_presented(), 4);
        assert!(f.device.gpu().stats().violations.is_empty());
    }

    #[test]
    fn paused_surface_skips_without_writing_constants() {
        let mut f = Fixture::new("renderer_paused");
        f.render(1.0).unwrap();
        f.device.gpu().set_faults(HeadlessFaults {
            fail_resize: true,
            ..Default::default()
        });
        f.surface
            .resize(&f.device, &f.queue, &mut f.sync, 400, 300)
            .unwrap_err();

        let submitted = f.sync.submitted_value();
        assert_eq!(f.render(2.0).unwrap(), FrameOutcome::Skipped);
        assert_eq!(f.constants.read().rotation, 1.0);
        assert_eq!(f.sync.submitted_value(), submitted);
        assert_eq!(f.device.gpu().stats().presents, 1);
    }

    #[test]
    fn failed_submit_skips_frame_and_next_frame_recovers() {
        let mut f = Fixture::new("renderer_submit_fault");
        f.device.gpu().set_faults(HeadlessFaults {
            fail_execute: true,
            ..Default::default()
        });
        assert!(matches!(f.render(1.0), Err(FrameError::Submit(_))));
        assert_eq!(f.device.gpu().stats().presents, 0);
        assert_eq!(
            f.surface.acquire_current().unwrap().state(),
            ResourceState::Present
        );

        f.device.gpu().set_faults(HeadlessFaults::default());
        f.render(2.0).unwrap();
        let stats = f.device.gpu().stats();
        assert!(stats.violations.is_empty(), "{:?}", stats.violations);
        assert_eq!(stats.presents, 1);
        assert_eq!(drawn_rotation(&stats.draws[0]), 2.0);
    }

    #[test]
    fn failed_present_drains_and_keeps_index_valid() {
        let mut f = Fixture::new("renderer_present_fault");
        f.device.gpu().set_faults(HeadlessFaults {
            fail_present: true,
            ..Default::default()
        });
        assert!(matches!(f.render(1.0), Err(FrameError::Present(_))));
        assert!(f.device.gpu().is_idle());
        assert_eq!(f.surface.current_index(), Some(0));

        f.device.gpu().set_faults(HeadlessFaults::default());
        f.render(2.0).unwrap();
        let stats = f.device.gpu().stats();
        assert!(stats.violations.is_empty(), "{:?}", stats.violations);
        assert_eq!(stats.draws.len(), 2);
        assert_eq!(stats.presents, 1);
    }

    #[test]
    fn state_mismatch_closes_the_list_for_reuse() {
        let mut f = Fixture::new("renderer_mismatch");
        f.surface
            .acquire_current()
            .unwrap()
            .set_state(ResourceState::RenderTarget);
        assert!(matches!(f.render(1.0), Err(FrameError::Record(_))));
        assert_eq!(f.constants.read().rotation, 0.0);
        assert_eq!(f.device.gpu().stats().executed_lists, 0);

        f.surface
            .acquire_current()
            .unwrap()
            .set_state(ResourceState::Present);
        f.render(2.0).unwrap();
        assert!(f.device.gpu().stats().violations.is_empty());
    }

    #[test]
    fn failed_record_leaves_previous_constants_in_place() {
        let mut f = Fixture::new("renderer_record_keeps_constants");
        f.render(0.25).unwrap();
        f.surface
            .acquire_current()
            .unwrap()
            .set_state(ResourceState::RenderTarget);
        assert!(matches!(f.render(0.75), Err(FrameError::Record(_))));
        assert_eq!(f.constants.read().rotation, 0.25);
    }

    #[test]
    fn failed_drain_after_present_still_counts_the_frame() {
        let mut f = Fixture::new("renderer_drain_fault");
        f.device.gpu().set_faults(HeadlessFaults {
            fail_signal: true,
            ..Default::default()
        });
        assert!(matches!(f.render(1.0), Err(FrameError::Sync(_))));
        assert_eq!(f.renderer.frames_presented(), 1);
        assert_eq!(f.device.gpu().stats().presents, 1);

        // The undrained list is still in flight, so the next frame is dropped
        // and its recovery drains the GPU.
        f.device.gpu().set_faults(HeadlessFaults::default());
        assert!(matches!(f.render(2.0), Err(FrameError::Record(_))));
        assert!(f.device.gpu().is_idle());
        f.render(3.0).unwrap();
        assert_eq!(f.renderer.frames_presented(), 2);
        assert!(f.device.gpu().stats().violations.is_empty());
    }
}
