use tracing::debug;
use tracing::info;
use tracing::warn;
use windows::Win32::Graphics::Direct3D::*;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::*;

use crate::error::GpuError;
use crate::error::GpuResult;

/// Turns on the D3D12 debug layer and returns the factory flags to match.
/// A missing debug layer is not an error.
pub fn enable_debug_layer() -> DXGI_CREATE_FACTORY_FLAGS {
    let mut debug: Option<ID3D12Debug> = None;
    if let Some(debug) = unsafe { D3D12GetDebugInterface(&mut debug) }.ok().and(debug) {
        unsafe { debug.EnableDebugLayer() };
        info!("D3D12 Debug Layer Enabled");
        DXGI_CREATE_FACTORY_DEBUG
    } else {
        warn!("D3D12 Debug Layer unavailable.");
        DXGI_CREATE_FACTORY_FLAGS(0)
    }
}

/// Returns the first hardware adapter that can host a feature level 11.0
/// device, along with its description.
pub fn get_hardware_adapter(factory: &IDXGIFactory4) -> GpuResult<(IDXGIAdapter1, String)> {
    for i in 0.. {
        let adapter = match unsafe { factory.EnumAdapters1(i) } {
            Ok(a) => a,
            Err(e) if e.code() == DXGI_ERROR_NOT_FOUND => break,
            Err(e) => return Err(e.into()),
        };

        let desc = unsafe { adapter.GetDesc1()? };
        let name = adapter_name(&desc.Description);

        if (DXGI_ADAPTER_FLAG(desc.Flags as i32) & DXGI_ADAPTER_FLAG_SOFTWARE)
            != DXGI_ADAPTER_FLAG_NONE
        {
            debug!(index = i, %name, "Skipping software adapter");
            continue;
        }

        if unsafe {
            D3D12CreateDevice(
                &adapter,
                D3D_FEATURE_LEVEL_11_0,
                std::ptr::null_mut::<Option<ID3D12Device>>(),
            )
        }
        .is_ok()
        {
            return Ok((adapter, name));
        }
        debug!(index = i, %name, "Adapter does not support feature level 11.0");
    }
    Err(GpuError::NoAdapter("hardware"))
}

pub fn get_warp_adapter(factory: &IDXGIFactory4) -> GpuResult<(IDXGIAdapter1, String)> {
    let adapter: IDXGIAdapter1 = unsafe { factory.EnumWarpAdapter()? };
    let desc = unsafe { adapter.GetDesc1()? };
    Ok((adapter, adapter_name(&desc.Description)))
}

fn adapter_name(description: &[u16]) -> String {
    let len = description
        .iter()
        .position(|&c| c == 0)
        .unwrap_or(description.len());
    String::from_utf16_lossy(&description[..len])
}
