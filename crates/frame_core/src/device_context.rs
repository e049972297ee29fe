use tracing::info;
use tracing::warn;

use crate::backend::Backend;
use crate::backend::Device;
use crate::desc::AdapterKind;
use crate::error::GpuResult;
use crate::error::StartupError;
use crate::error::StartupStage;

/// Runs `attempt` with the debug layer requested and, if that fails, once
/// more without it. The debug runtime is an optional install.
#[cfg_attr(not(windows), allow(dead_code))]
pub(crate) fn with_debug_layer_fallback<T>(
    debug: bool,
    mut attempt: impl FnMut(bool) -> GpuResult<T>,
) -> GpuResult<T> {
    if !debug {
        return attempt(false);
    }
    attempt(true).or_else(|e| {
        warn!("Device creation with the debug layer failed ({e}), retrying without it.");
        attempt(false)
    })
}

/// Owns the logical device and the single direct command queue.
pub struct DeviceContext<B: Backend> {
    queue: B::Queue,
    device: B::Device,
    adapter: AdapterKind,
}

impl<B: Backend> DeviceContext<B> {
    /// Selects a hardware adapter, falling back to the software adapter once.
    /// `use_warp_device` skips straight to the software adapter.
    pub fn create(backend: &B, use_warp_device: bool) -> Result<Self, StartupError> {
        let (device, adapter) = if use_warp_device {
            info!("Using WARP adapter.");
            let device = backend
                .create_device(AdapterKind::Software)
                .map_err(StartupError::at(StartupStage::Device))?;
            (device, AdapterKind::Software)
        } else {
            match backend.create_device(AdapterKind::Hardware) {
                Ok(device) => (device, AdapterKind::Hardware),
                Err(e) => {
                    warn!("No usable hardware adapter ({e}), falling back to WARP.");
                    let device = backend
                        .create_device(AdapterKind::Software)
                        .map_err(StartupError::at(StartupStage::Device))?;
                    (device, AdapterKind::Software)
                }
            }
        };
        info!(
            "Created device on {} adapter: {}",
            adapter.name(),
            device.adapter_name()
        );

        let queue = device
            .create_queue()
            .map_err(StartupError::at(StartupStage::Queue))?;

        Ok(Self {
            queue,
            device,
            adapter,
        })
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// The one queue all work is submitted on.
    pub fn queue(&self) -> &B::Queue {
        &self.queue
    }

    pub fn adapter(&self) -> AdapterKind {
        self.adapter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GpuError;
    use crate::headless::Headless;
    use crate::headless::HeadlessFaults;

    #[test]
    fn prefers_hardware_adapter() {
        let backend = Headless::default();
        let context = DeviceContext::create(&backend, false).unwrap();
        assert_eq!(context.adapter(), AdapterKind::Hardware);
    }

    #[test]
    fn falls_back_to_software_adapter() {
        let backend = Headless::with_faults(HeadlessFaults {
            no_hardware_adapter: true,
            ..Default::default()
        });
        let context = DeviceContext::create(&backend, false).unwrap();
        assert_eq!(context.adapter(), AdapterKind::Software);
    }

    #[test]
    fn fails_when_both_adapters_fail() {
        let backend = Headless::with_faults(HeadlessFaults {
            no_hardware_adapter: true,
            no_software_adapter: true,
            ..Default::default()
        });
        let err = DeviceContext::create(&backend, false).err().unwrap();
        assert_eq!(err.stage, StartupStage::Device);
    }

    #[test]
    fn warp_flag_skips_hardware() {
        let backend = Headless::default();
        let context = DeviceContext::create(&backend, true).unwrap();
        assert_eq!(context.adapter(), AdapterKind::Software);
    }

    #[test]
    fn debug_layer_off_makes_one_plain_attempt() {
        let mut attempts = Vec::new();
        let value = with_debug_layer_fallback(false, |debug| {
            attempts.push(debug);
            Ok(7)
        })
        .unwrap();
        assert_eq!(value, 7);
        assert_eq!(attempts, vec![false]);
    }

    #[test]
    fn debug_layer_failure_retries_without_it() {
        let mut attempts = Vec::new();
        let value = with_debug_layer_fallback(true, |debug| {
            attempts.push(debug);
            if debug {
                Err(GpuError::NoAdapter("hardware"))
            } else {
                Ok(7)
            }
        })
        .unwrap();
        assert_eq!(value, 7);
        assert_eq!(attempts, vec![true, false]);
    }

    #[test]
    fn debug_layer_success_does_not_retry() {
        let mut attempts = Vec::new();
        with_debug_layer_fallback(true, |debug| {
            attempts.push(debug);
            Ok(())
        })
        .unwrap();
        assert_eq!(attempts, vec![true]);
    }

    #[test]
    fn retry_failure_reports_the_plain_attempt() {
        let err = with_debug_layer_fallback::<()>(true, |debug| {
            Err(GpuError::Submission(format!("debug={debug}")))
        })
        .unwrap_err();
        assert!(err.to_string().contains("debug=false"), "{err}");
    }
}
