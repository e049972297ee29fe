use std::ptr::NonNull;

use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::*;
use windows::core::HSTRING;

use crate::backend::UploadBuffer;
use crate::error::GpuError;
use crate::error::GpuResult;

/// Committed resource on the upload heap, permanently in `GENERIC_READ`.
pub struct D3d12Buffer {
    resource: ID3D12Resource,
    size: u64,
}

impl D3d12Buffer {
    pub(crate) fn create(device: &ID3D12Device, size: u64, name: &str) -> GpuResult<Self> {
        let heap_props = D3D12_HEAP_PROPERTIES {
            Type: D3D12_HEAP_TYPE_UPLOAD,
            ..Default::default()
        };
        let resource_desc = D3D12_RESOURCE_DESC {
            Dimension: D3D12_RESOURCE_DIMENSION_BUFFER,
            Alignment: 0,
            Width: size,
            Height: 1,
            DepthOrArraySize: 1,
            MipLevels: 1,
            Format: DXGI_FORMAT_UNKNOWN,
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                Quality: 0,
            },
            Layout: D3D12_TEXTURE_LAYOUT_ROW_MAJOR,
            Flags: D3D12_RESOURCE_FLAG_NONE,
        };

        let mut resource: Option<ID3D12Resource> = None;
        unsafe {
            device.CreateCommittedResource(
                &heap_props,
                D3D12_HEAP_FLAG_NONE,
                &resource_desc,
                D3D12_RESOURCE_STATE_GENERIC_READ,
                None,
                &mut resource,
            )?
        };
        let resource = resource.ok_or_else(|| GpuError::Rejected {
            what: "upload buffer",
            reason: format!("no resource returned for {name}"),
        })?;
        unsafe { resource.SetName(&HSTRING::from(name)) }.ok();

        Ok(Self { resource, size })
    }

    pub(crate) fn gpu_address(&self) -> u64 {
        unsafe { self.resource.GetGPUVirtualAddress() }
    }
}

impl UploadBuffer for D3d12Buffer {
    fn size(&self) -> u64 {
        self.size
    }

    fn map(&self) -> GpuResult<NonNull<u8>> {
        let mut data_ptr = std::ptr::null_mut();
        // No CPU reads.
        let read_range = D3D12_RANGE { Begin: 0, End: 0 };
        unsafe { self.resource.Map(0, Some(&read_range), Some(&mut data_ptr))? };
        NonNull::new(data_ptr as *mut u8)
            .ok_or_else(|| GpuError::Map("Map returned a null pointer".into()))
    }

    fn unmap(&self) {
        unsafe { self.resource.Unmap(0, None) };
    }
}
