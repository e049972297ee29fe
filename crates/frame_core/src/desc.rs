//! Backend-neutral descriptions handed to [`crate::backend::Device`].

use crate::vertex::VertexAttribute;

/// Number of buffers in the swap surface.
pub const BUFFER_COUNT: usize = 2;

/// Hardware alignment for constant-buffer views.
pub const CONSTANT_BUFFER_ALIGNMENT: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterKind {
    Hardware,
    /// WARP on Direct3D 12.
    Software,
}

impl AdapterKind {
    pub fn name(self) -> &'static str {
        match self {
            AdapterKind::Hardware => "hardware",
            AdapterKind::Software => "software",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Rgba8Unorm,
    Rg32Float,
    Rgb32Float,
    Rgba32Float,
}

impl Format {
    pub fn size(self) -> u32 {
        match self {
            Format::Rgba8Unorm => 4,
            Format::Rg32Float => 8,
            Format::Rgb32Float => 12,
            Format::Rgba32Float => 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapChainDesc {
    pub width: u32,
    pub height: u32,
    pub buffer_count: u32,
    pub format: Format,
}

/// Viewport and scissor covering the whole surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    pub fn covering(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Pixel,
}

/// A root constant-buffer view bound directly at `register(b<shader_register>)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootConstantBuffer {
    pub slot: u32,
    pub shader_register: u32,
    pub visibility: ShaderStage,
}

/// Root signature description: exactly one GPU-visible constant region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingLayout {
    pub constant_buffer: RootConstantBuffer,
    pub allow_input_assembler: bool,
}

impl BindingLayout {
    pub const PER_OBJECT: BindingLayout = BindingLayout {
        constant_buffer: RootConstantBuffer {
            slot: 0,
            shader_register: 0,
            visibility: ShaderStage::Vertex,
        },
        allow_input_assembler: true,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    None,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterizerState {
    pub solid_fill: bool,
    pub cull: CullMode,
    pub front_counter_clockwise: bool,
}

/// Everything the device needs to compose a graphics pipeline state.
pub struct PipelineDesc<'a, R> {
    pub root_signature: &'a R,
    pub vertex_shader: &'a [u8],
    pub pixel_shader: &'a [u8],
    pub input_layout: &'a [VertexAttribute],
    pub rasterizer: RasterizerState,
    /// Blending off, all channels written.
    pub opaque_blend: bool,
    pub depth_enabled: bool,
    pub render_target_format: Format,
}
