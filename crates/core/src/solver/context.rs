//! Adapter and device acquisition for the GPU smoke solver
//!
//! A missing adapter is an ordinary outcome and falls back to the CPU quietly.
//! An adapter that refuses to give a device is reported with its name.

/// Outcome of [`GpuContext::acquire`]
#[derive(Debug)]
pub enum GpuInitResult {
    /// Device and queue are ready
    #[cfg(feature = "gpu")]
    Success(GpuContext),
    /// No adapter on this machine
    NoGpuFound,
    /// An adapter exists but device creation failed
    InitFailed {
        /// Adapter that refused the device request
        adapter_name: String,
        /// Driver error text
        error: String,
    },
}

#[cfg(feature = "gpu")]
mod gpu_impl {
    use super::GpuInitResult;
    use tracing::{debug, info};

    const DEVICE_LABEL: &str = "Smoke Solver Device";

    /// Velocity cells are `vec4<f32>`; every other field is smaller
    const VELOCITY_CELL_BYTES: u64 = 16;

    /// Size of the largest single field buffer for a grid of side `grid_size`
    #[must_use]
    pub fn largest_field_bytes(grid_size: usize) -> u64 {
        (grid_size as u64)
            .saturating_pow(3)
            .saturating_mul(VELOCITY_CELL_BYTES)
    }

    /// Whether every field buffer of a grid can be created and bound whole
    #[must_use]
    pub fn fits_limits(limits: &wgpu::Limits, grid_size: usize) -> bool {
        let bytes = largest_field_bytes(grid_size);
        bytes <= u64::from(limits.max_storage_buffer_binding_size) && bytes <= limits.max_buffer_size
    }

    /// Device, queue and the limits they were created with
    #[derive(Debug)]
    pub struct GpuContext {
        device: wgpu::Device,
        queue: wgpu::Queue,
        adapter_info: wgpu::AdapterInfo,
        limits: wgpu::Limits,
    }

    impl GpuContext {
        /// Pick a high-performance adapter and open a device on it
        ///
        /// Storage limits are raised to what the adapter offers so that the
        /// largest grids can still bind their velocity buffers.
        pub fn acquire() -> GpuInitResult {
            let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
            let options = wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                ..Default::default()
            };
            let Some(adapter) = pollster::block_on(instance.request_adapter(&options)) else {
                debug!("No GPU adapter found");
                return GpuInitResult::NoGpuFound;
            };

            let adapter_info = adapter.get_info();
            let offered = adapter.limits();
            let limits = wgpu::Limits {
                max_storage_buffer_binding_size: offered.max_storage_buffer_binding_size,
                max_buffer_size: offered.max_buffer_size,
                ..wgpu::Limits::default()
            };
            let descriptor = wgpu::DeviceDescriptor {
                label: Some(DEVICE_LABEL),
                required_features: wgpu::Features::empty(),
                required_limits: limits.clone(),
                memory_hints: wgpu::MemoryHints::Performance,
            };

            match pollster::block_on(adapter.request_device(&descriptor, None)) {
                Ok((device, queue)) => {
                    info!(
                        adapter = %adapter_info.name,
                        backend = ?adapter_info.backend,
                        max_binding = limits.max_storage_buffer_binding_size,
                        "GPU context ready"
                    );
                    GpuInitResult::Success(Self {
                        device,
                        queue,
                        adapter_info,
                        limits,
                    })
                }
                Err(err) => {
                    debug!(adapter = %adapter_info.name, error = %err, "GPU device request failed");
                    GpuInitResult::InitFailed {
                        adapter_name: adapter_info.name,
                        error: err.to_string(),
                    }
                }
            }
        }

        #[must_use]
        pub fn adapter_name(&self) -> &str {
            &self.adapter_info.name
        }

        /// Whether a grid of side `grid_size` fits this device
        #[must_use]
        pub fn can_allocate(&self, grid_size: usize) -> bool {
            fits_limits(&self.limits, grid_size)
        }

        /// Hand the device and queue over to a solver
        #[must_use]
        pub fn into_device_queue(self) -> (wgpu::Device, wgpu::Queue, wgpu::AdapterInfo) {
            (self.device, self.queue, self.adapter_info)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_largest_field_is_velocity() {
            assert_eq!(largest_field_bytes(4), 64 * 16);
            assert_eq!(largest_field_bytes(usize::MAX), u64::MAX);
        }

        #[test]
        fn test_default_limits_hold_supported_grids() {
            let limits = wgpu::Limits::default();
            assert!(fits_limits(&limits, 64));
            assert!(!fits_limits(&limits, 512));
        }

        #[test]
        fn test_acquire_reports_adapter() {
            match GpuContext::acquire() {
                GpuInitResult::Success(ctx) => {
                    assert!(!ctx.adapter_name().is_empty());
                    assert!(ctx.can_allocate(32));
                }
                GpuInitResult::NoGpuFound => {}
                GpuInitResult::InitFailed { error, .. } => assert!(!error.is_empty()),
            }
        }
    }
}

#[cfg(feature = "gpu")]
pub use gpu_impl::GpuContext;
