use std::cell::Cell;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::rc::Weak;

use tracing::trace;
use tracing::warn;

use crate::desc::Viewport;
use crate::resource_state::ResourceState;
use crate::resource_state::Transition;

use super::resources::BufferData;
use super::resources::TextureData;

/// Faults the simulated GPU injects on request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeadlessFaults {
    pub no_hardware_adapter: bool,
    pub no_software_adapter: bool,
    pub reject_pipeline: bool,
    pub fail_resize: bool,
    pub fail_execute: bool,
    pub fail_present: bool,
    pub fail_signal: bool,
}

/// Fence values observed when the swap chain was last resized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FenceSnapshot {
    pub completed: u64,
    pub submitted: u64,
}

/// A draw the simulated GPU executed.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub vertex_count: u32,
    /// Swap-chain texture the draw landed in.
    pub target: u64,
    /// Bytes of the bound constant buffer at the moment the GPU read them.
    pub constants: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpuStats {
    pub executed_lists: u64,
    pub clears: u64,
    pub draws: Vec<DrawRecord>,
    /// Presents accepted from the CPU.
    pub presents: u64,
    pub transitions_to_render_target: u64,
    pub transitions_to_present: u64,
    pub resizes: u64,
    pub fence_at_last_resize: Option<FenceSnapshot>,
    pub event_waits: u64,
    pub textures_released_while_busy: u64,
    pub live_pipelines: u64,
    pub live_root_signatures: u64,
    /// Misuse the simulated GPU detected while executing work.
    pub violations: Vec<String>,
}

#[derive(Debug, Clone)]
pub(crate) enum Command {
    SetPipeline,
    SetRootSignature,
    SetViewport(Viewport),
    Transition {
        texture: Weak<TextureData>,
        transition: Transition,
    },
    SetRenderTarget(Weak<TextureData>),
    Clear(Weak<TextureData>),
    SetVertexBuffer {
        buffer: Weak<BufferData>,
        stride: u32,
    },
    SetConstantBuffer(Weak<BufferData>),
    Draw(u32),
}

pub(crate) enum Op {
    Execute { list: u64, commands: Vec<Command> },
    Signal { fence: Rc<Cell<u64>>, value: u64 },
    Present(Weak<TextureData>),
}

pub(crate) struct Timeline {
    pub(crate) faults: HeadlessFaults,
    pub(crate) stats: GpuStats,
    pending: VecDeque<Op>,
    highest_signaled: u64,
    highest_completed: u64,
    next_id: u64,
}

/// Execution state scoped to one command list.
#[derive(Default)]
struct ListState {
    pipeline: bool,
    root_signature: bool,
    viewport: Option<Viewport>,
    render_target: Option<Rc<TextureData>>,
    vertex_buffer: Option<(Rc<BufferData>, u32)>,
    constant_buffer: Option<Rc<BufferData>>,
}

impl Timeline {
    fn violation(&mut self, message: String) {
        warn!("Simulated GPU violation: {message}");
        self.stats.violations.push(message);
    }

    fn execute(&mut self, op: Op) {
        match op {
            Op::Signal { fence, value } => {
                if value > fence.get() {
                    fence.set(value);
                }
                self.highest_completed = self.highest_completed.max(value);
                trace!(value, "Simulated GPU reached fence value");
            }
            Op::Present(texture) => match texture.upgrade() {
                Some(texture) if texture.state.get() != ResourceState::Present => {
                    self.violation(format!(
                        "texture {} presented in state {:?}",
                        texture.id,
                        texture.state.get()
                    ));
                }
                Some(_) => {}
                None => self.violation("presented a released texture".into()),
            },
            Op::Execute { list, commands } => {
                let mut state = ListState::default();
                for command in commands {
                    self.execute_command(list, &mut state, command);
                }
                self.stats.executed_lists += 1;
            }
        }
    }

    fn execute_command(&mut self, list: u64, state: &mut ListState, command: Command) {
        match command {
            Command::SetPipeline => state.pipeline = true,
            Command::SetRootSignature => state.root_signature = true,
            Command::SetViewport(viewport) => state.viewport = Some(viewport),
            Command::Transition {
                texture,
                transition,
            } => {
                let Some(texture) = texture.upgrade() else {
                    self.violation(format!("list {list} transitioned a released texture"));
                    return;
                };
                let mut current = texture.state.get();
                if let Err(e) = transition.apply(&mut current) {
                    self.violation(format!("list {list} texture {}: {e}", texture.id));
                    return;
                }
                texture.state.set(current);
                match transition.after {
                    ResourceState::RenderTarget => self.stats.transitions_to_render_target += 1,
                    ResourceState::Present => self.stats.transitions_to_present += 1,
                }
            }
            Command::SetRenderTarget(texture) => match texture.upgrade() {
                Some(texture) => state.render_target = Some(texture),
                None => self.violation(format!("list {list} bound a view of a released texture")),
            },
            Command::Clear(texture) => {
                let Some(texture) = texture.upgrade() else {
                    self.violation(format!("list {list} cleared a view of a released texture"));
                    return;
                };
                if texture.state.get() != ResourceState::RenderTarget {
                    self.violation(format!(
                        "list {list} cleared texture {} in state {:?}",
                        texture.id,
                        texture.state.get()
                    ));
                }
                self.stats.clears += 1;
            }
            Command::SetVertexBuffer { buffer, stride } => match buffer.upgrade() {
                Some(buffer) => state.vertex_buffer = Some((buffer, stride)),
                None => self.violation(format!("list {list} bound a released vertex buffer")),
            },
            Command::SetConstantBuffer(buffer) => match buffer.upgrade() {
                Some(buffer) => state.constant_buffer = Some(buffer),
                None => self.violation(format!("list {list} bound a released constant buffer")),
            },
            Command::Draw(vertex_count) => self.draw(list, state, vertex_count),
        }
    }

    fn draw(&mut self, list: u64, state: &ListState, vertex_count: u32) {
        if !state.pipeline || !state.root_signature || state.viewport.is_none() {
            self.violation(format!(
                "list {list} drew without pipeline, root signature and viewport"
            ));
        }
        let Some(target) = state.render_target.as_ref() else {
            self.violation(format!("list {list} drew without a render target"));
            return;
        };
        if target.state.get() != ResourceState::RenderTarget {
            self.violation(format!(
                "list {list} drew into texture {} in state {:?}",
                target.id,
                target.state.get()
            ));
        }
        match &state.vertex_buffer {
            Some((buffer, stride)) if u64::from(*stride) * u64::from(vertex_count) > buffer.size() => {
                self.violation(format!(
                    "list {list} drew {vertex_count} vertices past the end of a {} byte buffer",
                    buffer.size()
                ));
            }
            Some(_) => {}
            None => self.violation(format!("list {list} drew without a vertex buffer")),
        }
        let constants = match &state.constant_buffer {
            Some(buffer) => buffer.snapshot(),
            None => {
                self.violation(format!("list {list} drew without a constant buffer"));
                Vec::new()
            }
        };
        self.stats.draws.push(DrawRecord {
            vertex_count,
            target: target.id,
            constants,
        });
    }
}

/// Handle to the simulated GPU shared by every object of one device.
#[derive(Clone)]
pub struct HeadlessGpu {
    timeline: Rc<RefCell<Timeline>>,
}

impl HeadlessGpu {
    pub(crate) fn new(faults: HeadlessFaults) -> Self {
        Self {
            timeline: Rc::new(RefCell::new(Timeline {
                faults,
                stats: GpuStats::default(),
                pending: VecDeque::new(),
                highest_signaled: 0,
                highest_completed: 0,
                next_id: 1,
            })),
        }
    }

    pub(crate) fn downgrade(&self) -> Weak<RefCell<Timeline>> {
        Rc::downgrade(&self.timeline)
    }

    pub(crate) fn with<R>(&self, f: impl FnOnce(&mut Timeline) -> R) -> R {
        f(&mut self.timeline.borrow_mut())
    }

    pub(crate) fn faults(&self) -> HeadlessFaults {
        self.timeline.borrow().faults
    }

    pub(crate) fn next_id(&self) -> u64 {
        self.with(|t| {
            let id = t.next_id;
            t.next_id += 1;
            id
        })
    }

    pub(crate) fn violation(&self, message: String) {
        self.with(|t| t.violation(message));
    }

    pub(crate) fn enqueue(&self, op: Op) {
        self.with(|t| {
            if let Op::Signal { value, .. } = &op {
                t.highest_signaled = t.highest_signaled.max(*value);
            }
            t.pending.push_back(op);
        });
    }

    /// Whether an `Execute` for `list` is still waiting to run.
    pub(crate) fn list_in_flight(&self, list: u64) -> bool {
        self.timeline.borrow().pending.iter().any(|op| match op {
            Op::Execute { list: pending, .. } => *pending == list,
            _ => false,
        })
    }

    pub(crate) fn fence_snapshot(&self) -> FenceSnapshot {
        let timeline = self.timeline.borrow();
        FenceSnapshot {
            completed: timeline.highest_completed,
            submitted: timeline.highest_signaled,
        }
    }

    /// Executes the oldest pending operation. Returns false when idle.
    pub fn step(&self) -> bool {
        let op = self.timeline.borrow_mut().pending.pop_front();
        match op {
            Some(op) => {
                self.with(|t| t.execute(op));
                true
            }
            None => false,
        }
    }

    /// Lets the GPU catch up with everything submitted so far.
    pub fn run_until_idle(&self) {
        while self.step() {}
    }

    /// Runs pending work until `fence` reaches `value` or nothing is left.
    pub(crate) fn run_until(&self, fence: &Cell<u64>, value: u64) -> bool {
        while fence.get() < value {
            if !self.step() {
                return false;
            }
        }
        true
    }

    pub fn is_idle(&self) -> bool {
        self.timeline.borrow().pending.is_empty()
    }

    pub fn stats(&self) -> GpuStats {
        self.timeline.borrow().stats.clone()
    }

    pub fn set_faults(&self, faults: HeadlessFaults) {
        self.with(|t| t.faults = faults);
    }
}

/// Counts a swap-chain texture whose last reference went away while work
/// was still queued.
pub(crate) fn note_texture_release(timeline: &Weak<RefCell<Timeline>>, id: u64) {
    let Some(timeline) = timeline.upgrade() else {
        return;
    };
    let Ok(mut timeline) = timeline.try_borrow_mut() else {
        return;
    };
    if !timeline.pending.is_empty() {
        timeline.stats.textures_released_while_busy += 1;
        timeline.violation(format!("texture {id} released while GPU work was pending"));
    }
}
