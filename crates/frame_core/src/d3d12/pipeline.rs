use std::ffi::CString;

use tracing::warn;
use windows::Win32::Foundation::*;
use windows::Win32::Graphics::Direct3D::*;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::*;
use windows::core::PCSTR;

use super::dxgi_format;
use crate::desc::BindingLayout;
use crate::desc::CullMode;
use crate::desc::PipelineDesc;
use crate::desc::ShaderStage;
use crate::error::GpuError;
use crate::error::GpuResult;
use crate::vertex::InputRate;

/// One root CBV at parameter index `slot`, read from `register(b<n>)`.
pub fn create_root_signature(
    device: &ID3D12Device,
    layout: &BindingLayout,
) -> GpuResult<ID3D12RootSignature> {
    if layout.constant_buffer.slot != 0 {
        return Err(GpuError::Rejected {
            what: "root signature",
            reason: format!(
                "constant buffer must be root parameter 0, got {}",
                layout.constant_buffer.slot
            ),
        });
    }
    let parameters = [D3D12_ROOT_PARAMETER {
        ParameterType: D3D12_ROOT_PARAMETER_TYPE_CBV,
        Anonymous: D3D12_ROOT_PARAMETER_0 {
            Descriptor: D3D12_ROOT_DESCRIPTOR {
                ShaderRegister: layout.constant_buffer.shader_register,
                RegisterSpace: 0,
            },
        },
        ShaderVisibility: match layout.constant_buffer.visibility {
            ShaderStage::Vertex => D3D12_SHADER_VISIBILITY_VERTEX,
            ShaderStage::Pixel => D3D12_SHADER_VISIBILITY_PIXEL,
        },
    }];
    let desc = D3D12_ROOT_SIGNATURE_DESC {
        NumParameters: parameters.len() as u32,
        pParameters: parameters.as_ptr(),
        Flags: if layout.allow_input_assembler {
            D3D12_ROOT_SIGNATURE_FLAG_ALLOW_INPUT_ASSEMBLER_INPUT_LAYOUT
        } else {
            D3D12_ROOT_SIGNATURE_FLAG_NONE
        },
        ..Default::default()
    };

    let mut signature_blob = None;
    let mut error_blob = None;
    let serialized = unsafe {
        D3D12SerializeRootSignature(
            &desc,
            D3D_ROOT_SIGNATURE_VERSION_1,
            &mut signature_blob,
            Some(&mut error_blob),
        )
    };
    if let Err(e) = serialized {
        if let Some(error) = error_blob {
            let error_msg = unsafe {
                String::from_utf8_lossy(std::slice::from_raw_parts(
                    error.GetBufferPointer() as *const u8,
                    error.GetBufferSize(),
                ))
                .into_owned()
            };
            warn!("Root Signature Serialization Error: {error_msg}");
        }
        return Err(e.into());
    }
    let signature_blob = signature_blob.ok_or(GpuError::Rejected {
        what: "root signature",
        reason: "serializer returned no blob".into(),
    })?;

    let signature_data: &[u8] = unsafe {
        std::slice::from_raw_parts(
            signature_blob.GetBufferPointer() as *const u8,
            signature_blob.GetBufferSize(),
        )
    };
    Ok(unsafe { device.CreateRootSignature(0, signature_data)? })
}

pub fn create_pipeline_state(
    device: &ID3D12Device,
    desc: &PipelineDesc<'_, ID3D12RootSignature>,
) -> GpuResult<ID3D12PipelineState> {
    let semantic_names = desc
        .input_layout
        .iter()
        .map(|attribute| {
            CString::new(attribute.semantic)
                .map_err(|e| GpuError::InvalidVertexLayout(e.to_string()))
        })
        .collect::<GpuResult<Vec<_>>>()?;
    let input_element_descs: Vec<D3D12_INPUT_ELEMENT_DESC> = desc
        .input_layout
        .iter()
        .zip(&semantic_names)
        .map(|(attribute, name)| D3D12_INPUT_ELEMENT_DESC {
            SemanticName: PCSTR(name.as_ptr() as *const u8),
            Format: dxgi_format(attribute.format),
            AlignedByteOffset: attribute.offset,
            InputSlotClass: match attribute.rate {
                InputRate::PerVertex => D3D12_INPUT_CLASSIFICATION_PER_VERTEX_DATA,
            },
            ..Default::default()
        })
        .collect();

    let mut rtv_formats = [DXGI_FORMAT_UNKNOWN; 8];
    rtv_formats[0] = dxgi_format(desc.render_target_format);

    let pso_desc = D3D12_GRAPHICS_PIPELINE_STATE_DESC {
        pRootSignature: unsafe { std::mem::transmute_copy(desc.root_signature) },
        VS: D3D12_SHADER_BYTECODE {
            pShaderBytecode: desc.vertex_shader.as_ptr() as *const _,
            BytecodeLength: desc.vertex_shader.len(),
        },
        PS: D3D12_SHADER_BYTECODE {
            pShaderBytecode: desc.pixel_shader.as_ptr() as *const _,
            BytecodeLength: desc.pixel_shader.len(),
        },
        InputLayout: D3D12_INPUT_LAYOUT_DESC {
            pInputElementDescs: input_element_descs.as_ptr(),
            NumElements: input_element_descs.len() as u32,
        },
        RasterizerState: D3D12_RASTERIZER_DESC {
            FillMode: if desc.rasterizer.solid_fill {
                D3D12_FILL_MODE_SOLID
            } else {
                D3D12_FILL_MODE_WIREFRAME
            },
            CullMode: match desc.rasterizer.cull {
                CullMode::None => D3D12_CULL_MODE_NONE,
                CullMode::Back => D3D12_CULL_MODE_BACK,
            },
            FrontCounterClockwise: desc.rasterizer.front_counter_clockwise.into(),
            DepthClipEnable: TRUE,
            ..Default::default()
        },
        BlendState: D3D12_BLEND_DESC {
            AlphaToCoverageEnable: FALSE,
            IndependentBlendEnable: FALSE,
            RenderTarget: [D3D12_RENDER_TARGET_BLEND_DESC {
                BlendEnable: (!desc.opaque_blend).into(),
                LogicOpEnable: FALSE,
                SrcBlend: D3D12_BLEND_ONE,
                DestBlend: D3D12_BLEND_ZERO,
                BlendOp: D3D12_BLEND_OP_ADD,
                SrcBlendAlpha: D3D12_BLEND_ONE,
                DestBlendAlpha: D3D12_BLEND_ZERO,
                BlendOpAlpha: D3D12_BLEND_OP_ADD,
                LogicOp: D3D12_LOGIC_OP_NOOP,
                RenderTargetWriteMask: D3D12_COLOR_WRITE_ENABLE_ALL.0 as u8,
            }; 8],
        },
        DepthStencilState: D3D12_DEPTH_STENCIL_DESC {
            DepthEnable: desc.depth_enabled.into(),
            StencilEnable: FALSE,
            ..Default::default()
        },
        SampleMask: u32::MAX,
        PrimitiveTopologyType: D3D12_PRIMITIVE_TOPOLOGY_TYPE_TRIANGLE,
        NumRenderTargets: 1,
        RTVFormats: rtv_formats,
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: 1,
            Quality: 0,
        },
        ..Default::default()
    };

    let result = unsafe { device.CreateGraphicsPipelineState(&pso_desc) };
    result.map_err(|e| GpuError::Rejected {
        what: "pipeline state",
        reason: e.to_string(),
    })
}
