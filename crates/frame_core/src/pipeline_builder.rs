use std::path::Path;
use std::path::PathBuf;

use tracing::debug;
use tracing::info;

use crate::backend::Backend;
use crate::backend::Device;
use crate::desc::BindingLayout;
use crate::desc::CullMode;
use crate::desc::PipelineDesc;
use crate::desc::RasterizerState;
use crate::error::GpuError;
use crate::error::GpuResult;
use crate::presentation_surface::SURFACE_FORMAT;
use crate::vertex::VertexLayout;

/// Pre-compiled shader bytecode loaded from disk.
#[derive(Debug, Clone)]
pub struct ShaderBinary {
    path: PathBuf,
    bytecode: Vec<u8>,
}

impl ShaderBinary {
    pub fn load(path: impl Into<PathBuf>) -> GpuResult<Self> {
        let path = path.into();
        let bytecode = std::fs::read(&path).map_err(|source| GpuError::ShaderRead {
            path: path.clone(),
            source,
        })?;
        if bytecode.is_empty() {
            return Err(GpuError::EmptyShader(path));
        }
        debug!(?path, bytes = bytecode.len(), "Loaded shader binary");
        Ok(Self { path, bytecode })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytecode(&self) -> &[u8] {
        &self.bytecode
    }
}

pub struct ShaderBinaries {
    pub vertex: ShaderBinary,
    pub pixel: ShaderBinary,
}

impl ShaderBinaries {
    /// Loads `<dir>/<vertex>` and `<dir>/<pixel>`.
    pub fn load(dir: &Path, vertex: &str, pixel: &str) -> GpuResult<Self> {
        Ok(Self {
            vertex: ShaderBinary::load(dir.join(vertex))?,
            pixel: ShaderBinary::load(dir.join(pixel))?,
        })
    }
}

/// Root signature plus pipeline state object. Never mutated after
/// [`PipelineBuilder::build`].
pub struct Pipeline<B: Backend> {
    state: B::PipelineState,
    root_signature: B::RootSignature,
    binding_layout: BindingLayout,
    vertex_layout: VertexLayout,
}

impl<B: Backend> Pipeline<B> {
    pub fn state(&self) -> &B::PipelineState {
        &self.state
    }

    pub fn root_signature(&self) -> &B::RootSignature {
        &self.root_signature
    }

    pub fn binding_layout(&self) -> &BindingLayout {
        &self.binding_layout
    }

    pub fn vertex_layout(&self) -> &VertexLayout {
        &self.vertex_layout
    }
}

pub struct PipelineBuilder<'a> {
    shaders: &'a ShaderBinaries,
    vertex_layout: VertexLayout,
    binding_layout: BindingLayout,
    rasterizer: RasterizerState,
}

impl<'a> PipelineBuilder<'a> {
    pub fn new(shaders: &'a ShaderBinaries, vertex_layout: VertexLayout) -> Self {
        Self {
            shaders,
            vertex_layout,
            binding_layout: BindingLayout::PER_OBJECT,
            rasterizer: RasterizerState {
                solid_fill: true,
                cull: CullMode::Back,
                front_counter_clockwise: false,
            },
        }
    }

    /// Triangle list, opaque write-all blending, no depth/stencil.
    pub fn build<B: Backend>(&self, device: &B::Device) -> GpuResult<Pipeline<B>> {
        self.vertex_layout.validate()?;
        let root_signature = device.create_root_signature(&self.binding_layout)?;
        let state = device.create_pipeline_state(&PipelineDesc {
            root_signature: &root_signature,
            vertex_shader: self.shaders.vertex.bytecode(),
            pixel_shader: self.shaders.pixel.bytecode(),
            input_layout: self.vertex_layout.attributes,
            rasterizer: self.rasterizer,
            opaque_blend: true,
            depth_enabled: false,
            render_target_format: SURFACE_FORMAT,
        })?;
        info!(
            vertex_shader = ?self.shaders.vertex.path(),
            pixel_shader = ?self.shaders.pixel.path(),
            "Built pipeline state"
        );
        Ok(Pipeline {
            state,
            root_signature,
            binding_layout: self.binding_layout,
            vertex_layout: self.vertex_layout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desc::AdapterKind;
    use crate::headless::Headless;
    use crate::headless::HeadlessFaults;
    use crate::test_support::write_shaders;
    use crate::vertex::Vertex;

    #[test]
    fn loads_and_builds_pipeline() {
        let dir = write_shaders("pipeline_builds");
        let shaders = ShaderBinaries::load(&dir, "vertex12.cso", "pixel12.cso").unwrap();
        let device = Headless::default()
            .create_device(AdapterKind::Hardware)
            .unwrap();
        let pipeline = PipelineBuilder::new(&shaders, Vertex::LAYOUT)
            .build::<Headless>(&device)
            .unwrap();
        assert_eq!(pipeline.binding_layout().constant_buffer.slot, 0);
        assert_eq!(pipeline.vertex_layout().stride, 36);
        assert_eq!(device.gpu().stats().live_pipelines, 1);
    }

    #[test]
    fn missing_shader_is_reported_with_path() {
        let dir = write_shaders("pipeline_missing");
        let err = ShaderBinaries::load(&dir, "vertex12.cso", "nope.cso")
            .err()
            .unwrap();
        match err {
            GpuError::ShaderRead { path, .. } => assert!(path.ends_with("nope.cso")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn empty_shader_is_rejected() {
        let dir = write_shaders("pipeline_empty");
        std::fs::write(dir.join("empty.cso"), []).unwrap();
        assert!(matches!(
            ShaderBinary::load(dir.join("empty.cso")),
            Err(GpuError::EmptyShader(_))
        ));
    }

    #[test]
    fn rejected_pipeline_leaves_nothing_alive() {
        let dir = write_shaders("pipeline_rejected");
        let shaders = ShaderBinaries::load(&dir, "vertex12.cso", "pixel12.cso").unwrap();
        let device = Headless::with_faults(HeadlessFaults {
            reject_pipeline: true,
            ..Default::default()
        })
        .create_device(AdapterKind::Hardware)
        .unwrap();
        let result = PipelineBuilder::new(&shaders, Vertex::LAYOUT).build::<Headless>(&device);
        assert!(matches!(result, Err(GpuError::Rejected { .. })));
        let stats = device.gpu().stats();
        assert_eq!(stats.live_pipelines, 0);
        assert_eq!(stats.live_root_signatures, 0);
    }
}
