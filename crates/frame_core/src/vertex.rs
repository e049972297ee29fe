//! Vertex attribute contract shared by the geometry and the pipeline.

use bytemuck::Pod;
use bytemuck::Zeroable;

use crate::desc::Format;
use crate::error::GpuError;
use crate::error::GpuResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRate {
    PerVertex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub semantic: &'static str,
    pub format: Format,
    pub offset: u32,
    pub rate: InputRate,
}

/// Attribute list plus the stride the vertex buffer is bound with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    pub attributes: &'static [VertexAttribute],
    pub stride: u32,
}

impl VertexLayout {
    /// Attributes must be tightly packed in declaration order and fill the
    /// stride exactly.
    pub fn validate(&self) -> GpuResult<()> {
        if self.attributes.is_empty() {
            return Err(GpuError::InvalidVertexLayout("no attributes".into()));
        }
        let mut expected_offset = 0;
        for attribute in self.attributes {
            if attribute.offset != expected_offset {
                return Err(GpuError::InvalidVertexLayout(format!(
                    "{} at offset {}, expected {}",
                    attribute.semantic, attribute.offset, expected_offset
                )));
            }
            expected_offset += attribute.format.size();
        }
        if expected_offset != self.stride {
            return Err(GpuError::InvalidVertexLayout(format!(
                "attributes cover {} bytes, stride is {}",
                expected_offset, self.stride
            )));
        }
        Ok(())
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
    pub texcoord: [f32; 2],
}

impl Vertex {
    pub const ATTRIBUTES: [VertexAttribute; 3] = [
        VertexAttribute {
            semantic: "POSITION",
            format: Format::Rgb32Float,
            offset: 0,
            rate: InputRate::PerVertex,
        },
        VertexAttribute {
            semantic: "COLOR",
            format: Format::Rgba32Float,
            offset: 12,
            rate: InputRate::PerVertex,
        },
        VertexAttribute {
            semantic: "TEXCOORD",
            format: Format::Rg32Float,
            offset: 28,
            rate: InputRate::PerVertex,
        },
    ];

    pub const LAYOUT: VertexLayout = VertexLayout {
        attributes: &Self::ATTRIBUTES,
        stride: std::mem::size_of::<Vertex>() as u32,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_matches_struct() {
        assert_eq!(std::mem::size_of::<Vertex>(), 36);
        assert_eq!(Vertex::LAYOUT.stride, 36);
        Vertex::LAYOUT.validate().unwrap();
    }

    #[test]
    fn gap_between_attributes_is_rejected() {
        static GAPPED: [VertexAttribute; 2] = [
            VertexAttribute {
                semantic: "POSITION",
                format: Format::Rgb32Float,
                offset: 0,
                rate: InputRate::PerVertex,
            },
            VertexAttribute {
                semantic: "COLOR",
                format: Format::Rgba32Float,
                offset: 16,
                rate: InputRate::PerVertex,
            },
        ];
        let layout = VertexLayout {
            attributes: &GAPPED,
            stride: 32,
        };
        assert!(matches!(
            layout.validate(),
            Err(GpuError::InvalidVertexLayout(_))
        ));
    }

    #[test]
    fn stride_mismatch_is_rejected() {
        let layout = VertexLayout {
            attributes: &Vertex::ATTRIBUTES,
            stride: 28,
        };
        assert!(layout.validate().is_err());
    }
}
