//! GPU-based smoke solver implementation
//!
//! This module provides a GPU implementation of the `SmokeSolver` trait using
//! wgpu compute shaders and storage buffers. This backend is only available
//! when the `gpu` feature is enabled.
//!
//! # Shader Files
//!
//! GPU compute shaders are located in `shaders/`. `common.wgsl` holds the
//! uniform block and indexing helpers and is prepended to every kernel:
//! - `impulse_velocity.wgsl`, `impulse_scalar.wgsl` - In-place injection
//! - `diffuse.wgsl` - One red/black relaxation half-sweep
//! - `advect_velocity.wgsl`, `advect_scalar.wgsl` - Semi-Lagrangian transport
//! - `divergence.wgsl`, `jacobi.wgsl`, `gradient_subtract.wgsl`,
//!   `pressure_boundary.wgsl` - Pressure projection
//!
//! # Implementation
//!
//! Every field is a pair of storage buffers with a CPU-side index naming the
//! current one, exactly as on the CPU backend. All kernels share one bind
//! group layout: binding 0 is the uniform block, bindings 1-3 are read-only
//! sources and binding 4 is the target. Each dispatch is submitted on its own
//! so the uniform block can be rewritten between passes.

use super::config::SolverConfig;
use super::context::GpuContext;
use super::diffusion::diffusion_alpha;
use super::impulse::{random_unit_vector, Impulse, INJECTION_GAIN};
use super::kernel::{Kernel, ScalarField, WORKGROUP_SIZE};
use super::profiler::ProfilerScope;
use super::{FrameParams, SmokeSolver};
use crate::core_types::Vec3;
use crate::error::{Result, SmokeError};
use crate::grid::{FieldKind, FieldSet};
use bytemuck::{Pod, Zeroable};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::borrow::Cow;
use tracing::{info, warn};

macro_rules! kernel_source {
    ($file:literal) => {
        concat!(
            include_str!("shaders/common.wgsl"),
            include_str!(concat!("shaders/", $file))
        )
    };
}

/// Uniform block shared by every kernel (must match `Params` in `common.wgsl`)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct GpuParams {
    n: u32,
    colour: u32,
    clamp_mode: u32,
    _pad0: u32,
    dt: f32,
    alpha: f32,
    decay: f32,
    buoyancy: f32,
    centre: [f32; 3],
    radius: f32,
    strength: f32,
    gain: f32,
    _pad1: f32,
    _pad2: f32,
    tie_break: [f32; 3],
    _pad3: f32,
}

impl GpuParams {
    fn new(n: u32, dt: f32) -> Self {
        Self {
            n,
            dt,
            ..Zeroable::zeroed()
        }
    }

    fn with_impulse(mut self, impulse: &Impulse, gain: f32) -> Self {
        self.centre = impulse.position.into();
        self.radius = impulse.radius;
        self.strength = impulse.strength;
        self.gain = gain;
        self
    }
}

/// A double-buffered field on the device
struct GpuField {
    buffers: [wgpu::Buffer; 2],
    current: usize,
}

impl GpuField {
    fn new(device: &wgpu::Device, label: &str, bytes: u64) -> Self {
        let make = |suffix: &str| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("{label} {suffix}")),
                size: bytes,
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_SRC
                    | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        Self {
            buffers: [make("A"), make("B")],
            current: 0,
        }
    }

    fn read(&self) -> &wgpu::Buffer {
        &self.buffers[self.current]
    }

    fn write(&self) -> &wgpu::Buffer {
        &self.buffers[1 - self.current]
    }

    fn swap(&mut self) {
        self.current = 1 - self.current;
    }
}

/// Every field on the device, allocated together so a resize is all-or-nothing
struct GpuFields {
    velocity: GpuField,
    density: GpuField,
    temperature: GpuField,
    pressure: GpuField,
    divergence: GpuField,
}

impl GpuFields {
    fn new(device: &wgpu::Device, grid_size: usize) -> Self {
        let cells = (grid_size as u64).pow(3);
        let scalar_bytes = cells * 4;
        Self {
            velocity: GpuField::new(device, "Velocity", cells * 16),
            density: GpuField::new(device, "Density", scalar_bytes),
            temperature: GpuField::new(device, "Temperature", scalar_bytes),
            pressure: GpuField::new(device, "Pressure", scalar_bytes),
            divergence: GpuField::new(device, "Divergence", scalar_bytes),
        }
    }

    fn scalar(&self, kind: FieldKind) -> Option<&GpuField> {
        match kind {
            FieldKind::Velocity => None,
            FieldKind::Density => Some(&self.density),
            FieldKind::Temperature => Some(&self.temperature),
            FieldKind::Pressure => Some(&self.pressure),
            FieldKind::Divergence => Some(&self.divergence),
        }
    }

    fn all(&self) -> [&GpuField; 5] {
        [
            &self.velocity,
            &self.density,
            &self.temperature,
            &self.pressure,
            &self.divergence,
        ]
    }
}

/// One compute pipeline per shader
struct Pipelines {
    impulse_velocity: wgpu::ComputePipeline,
    impulse_scalar: wgpu::ComputePipeline,
    diffuse: wgpu::ComputePipeline,
    advect_velocity: wgpu::ComputePipeline,
    advect_scalar: wgpu::ComputePipeline,
    divergence: wgpu::ComputePipeline,
    jacobi: wgpu::ComputePipeline,
    gradient_subtract: wgpu::ComputePipeline,
    pressure_boundary: wgpu::ComputePipeline,
}

impl Pipelines {
    fn new(device: &wgpu::Device, layout: &wgpu::PipelineLayout) -> Self {
        let build = |label: &str, source: &'static str| {
            let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(source)),
            });
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(label),
                layout: Some(layout),
                module: &module,
                entry_point: "main",
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                cache: None,
            })
        };

        Self {
            impulse_velocity: build("impulse_velocity", kernel_source!("impulse_velocity.wgsl")),
            impulse_scalar: build("impulse_scalar", kernel_source!("impulse_scalar.wgsl")),
            diffuse: build("diffuse", kernel_source!("diffuse.wgsl")),
            advect_velocity: build("advect_velocity", kernel_source!("advect_velocity.wgsl")),
            advect_scalar: build("advect_scalar", kernel_source!("advect_scalar.wgsl")),
            divergence: build("divergence", kernel_source!("divergence.wgsl")),
            jacobi: build("pressure_jacobi", kernel_source!("jacobi.wgsl")),
            gradient_subtract: build("gradient_subtract", kernel_source!("gradient_subtract.wgsl")),
            pressure_boundary: build("pressure_boundary", kernel_source!("pressure_boundary.wgsl")),
        }
    }
}

fn layout_entry(binding: u32, ty: wgpu::BufferBindingType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// GPU-based smoke solver using wgpu compute shaders
pub struct GpuSmokeSolver {
    // GPU handles
    device: wgpu::Device,
    queue: wgpu::Queue,

    grid_size: usize,
    fields: GpuFields,

    params_buffer: wgpu::Buffer,
    // Bound to source slots a kernel does not use
    placeholder: wgpu::Buffer,

    bind_group_layout: wgpu::BindGroupLayout,
    pipelines: Pipelines,

    rng: StdRng,
}

impl GpuSmokeSolver {
    /// Create a new GPU smoke solver
    ///
    /// # Arguments
    ///
    /// * `context` - GPU context with device and queue
    /// * `config` - Validated solver configuration
    #[must_use]
    pub fn new(context: GpuContext, config: &SolverConfig) -> Self {
        let (device, queue, adapter_info) = context.into_device_queue();

        let fields = GpuFields::new(&device, config.grid_size);

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Smoke Params"),
            size: std::mem::size_of::<GpuParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let placeholder = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Unused Source"),
            size: 16,
            usage: wgpu::BufferUsages::STORAGE,
            mapped_at_creation: false,
        });

        let read_only = wgpu::BufferBindingType::Storage { read_only: true };
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Smoke Kernel Bind Group Layout"),
            entries: &[
                layout_entry(0, wgpu::BufferBindingType::Uniform),
                layout_entry(1, read_only),
                layout_entry(2, read_only),
                layout_entry(3, read_only),
                layout_entry(4, wgpu::BufferBindingType::Storage { read_only: false }),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Smoke Kernel Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipelines = Pipelines::new(&device, &pipeline_layout);

        info!(
            adapter = %adapter_info.name,
            grid_size = config.grid_size,
            "GPU smoke solver created"
        );

        Self {
            device,
            queue,
            grid_size: config.grid_size,
            fields,
            params_buffer,
            placeholder,
            bind_group_layout,
            pipelines,
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    fn grid_u32(&self) -> u32 {
        u32::try_from(self.grid_size).unwrap_or(u32::MAX)
    }

    /// Upload uniforms, bind buffers and run one dispatch over the grid
    fn run(
        &self,
        pipeline: &wgpu::ComputePipeline,
        params: &GpuParams,
        sources: [Option<&wgpu::Buffer>; 3],
        target: &wgpu::Buffer,
    ) {
        self.queue
            .write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(params));

        let [a, b, c] = sources.map(|s| s.unwrap_or(&self.placeholder));
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Smoke Kernel Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: a.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: b.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: c.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: target.as_entire_binding(),
                },
            ],
        });

        let groups = self.grid_u32().div_ceil(WORKGROUP_SIZE[0]);
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Smoke Kernel Encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Smoke Kernel Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(groups, groups, groups);
        }
        self.queue.submit(Some(encoder.finish()));
    }

    fn copy_buffer(&self, from: &wgpu::Buffer, to: &wgpu::Buffer) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Smoke Copy Encoder"),
            });
        encoder.copy_buffer_to_buffer(from, 0, to, 0, from.size());
        self.queue.submit(Some(encoder.finish()));
    }

    fn diffuse(&mut self, scalar: ScalarField, alpha: f32, iterations: u32, dt: f32) {
        let field = match scalar {
            ScalarField::Density => &self.fields.density,
            ScalarField::Temperature => &self.fields.temperature,
        };
        self.copy_buffer(field.read(), field.write());

        let base = GpuParams {
            alpha,
            ..GpuParams::new(self.grid_u32(), dt)
        };
        for _ in 0..iterations {
            for colour in [0, 1] {
                let params = GpuParams { colour, ..base };
                self.run(
                    &self.pipelines.diffuse,
                    &params,
                    [Some(field.read()), None, None],
                    field.write(),
                );
            }
        }

        match scalar {
            ScalarField::Density => self.fields.density.swap(),
            ScalarField::Temperature => self.fields.temperature.swap(),
        }
    }

    fn impulse(&mut self, impulse: &Impulse, config: &SolverConfig, dt: f32) {
        let base = GpuParams::new(self.grid_u32(), dt);
        let velocity = GpuParams {
            tie_break: random_unit_vector(&mut self.rng).into(),
            ..base.with_impulse(impulse, 0.0)
        };
        self.run(
            &self.pipelines.impulse_velocity,
            &velocity,
            [None, None, None],
            self.fields.velocity.read(),
        );

        let scalars = [
            (&self.fields.density, INJECTION_GAIN * config.density_factor, 0),
            (&self.fields.temperature, INJECTION_GAIN * config.temperature_factor, 0),
            (&self.fields.pressure, config.pressure_factor, 1),
        ];
        for (field, gain, clamp_mode) in scalars {
            let params = GpuParams {
                clamp_mode,
                ..base.with_impulse(impulse, gain)
            };
            self.run(&self.pipelines.impulse_scalar, &params, [None, None, None], field.read());
        }
    }

    /// Copy a buffer back to the host
    fn read_buffer<T: Pod>(&self, buffer: &wgpu::Buffer, len: usize) -> Vec<T> {
        let size = buffer.size();
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Smoke Readback Staging"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Smoke Readback Encoder"),
            });
        encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, size);
        self.queue.submit(Some(encoder.finish()));

        let slice = staging.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        let _ = self.device.poll(wgpu::Maintain::Wait);

        match receiver.recv() {
            Ok(Ok(())) => {
                let data = slice.get_mapped_range();
                let values = bytemuck::cast_slice::<u8, T>(&data[..]).to_vec();
                drop(data);
                staging.unmap();
                values
            }
            Ok(Err(err)) => {
                warn!(error = %err, "GPU readback failed, returning zeros");
                vec![T::zeroed(); len]
            }
            Err(err) => {
                warn!(error = %err, "GPU readback channel closed, returning zeros");
                vec![T::zeroed(); len]
            }
        }
    }
}

impl SmokeSolver for GpuSmokeSolver {
    fn dispatch(&mut self, kernel: &Kernel, params: &FrameParams) {
        let _scope = ProfilerScope::new(kernel.label());
        let config = &params.config;
        let dt = params.dt;
        let base = GpuParams::new(self.grid_u32(), dt);

        match kernel {
            Kernel::Impulse(impulse) => self.impulse(impulse, config, dt),
            Kernel::Diffuse => {
                let iterations = config.diffusion_iterations;
                let alpha = diffusion_alpha(config.viscosity, dt, self.grid_size);
                self.diffuse(ScalarField::Density, alpha, iterations, dt);
                let alpha = diffusion_alpha(config.temperature_viscosity, dt, self.grid_size);
                self.diffuse(ScalarField::Temperature, alpha, iterations, dt);
            }
            Kernel::AdvectVelocity => {
                let uniforms = GpuParams {
                    buoyancy: config.buoyancy,
                    decay: config.velocity_decay,
                    ..base
                };
                let f = &self.fields;
                self.run(
                    &self.pipelines.advect_velocity,
                    &uniforms,
                    [Some(f.velocity.read()), Some(f.temperature.read()), None],
                    f.velocity.write(),
                );
                self.fields.velocity.swap();
            }
            Kernel::AdvectScalar(scalar) => {
                let (field, decay) = match scalar {
                    ScalarField::Density => (&self.fields.density, config.density_decay),
                    ScalarField::Temperature => (&self.fields.temperature, config.temperature_decay),
                };
                let uniforms = GpuParams { decay, ..base };
                self.run(
                    &self.pipelines.advect_scalar,
                    &uniforms,
                    [Some(self.fields.velocity.read()), Some(field.read()), None],
                    field.write(),
                );
                match scalar {
                    ScalarField::Density => self.fields.density.swap(),
                    ScalarField::Temperature => self.fields.temperature.swap(),
                }
            }
            Kernel::Divergence => {
                let f = &self.fields;
                self.run(
                    &self.pipelines.divergence,
                    &base,
                    [Some(f.velocity.read()), None, None],
                    f.divergence.write(),
                );
                self.fields.divergence.swap();
            }
            Kernel::PressureJacobi => {
                let f = &self.fields;
                self.run(
                    &self.pipelines.jacobi,
                    &base,
                    [Some(f.pressure.read()), Some(f.divergence.read()), None],
                    f.pressure.write(),
                );
                self.fields.pressure.swap();
            }
            Kernel::GradientSubtract => {
                let f = &self.fields;
                self.run(
                    &self.pipelines.gradient_subtract,
                    &base,
                    [Some(f.velocity.read()), Some(f.pressure.read()), None],
                    f.velocity.write(),
                );
                self.fields.velocity.swap();
            }
            Kernel::PressureBoundary => {
                let f = &self.fields;
                self.run(
                    &self.pipelines.pressure_boundary,
                    &base,
                    [Some(f.pressure.read()), None, None],
                    f.pressure.write(),
                );
                self.fields.pressure.swap();
            }
        }
    }

    fn read_scalar(&self, kind: FieldKind) -> Option<Cow<'_, [f32]>> {
        let field = self.fields.scalar(kind)?;
        let len = self.grid_size.pow(3);
        Some(Cow::Owned(self.read_buffer::<f32>(field.read(), len)))
    }

    fn read_velocity(&self) -> Cow<'_, [Vec3]> {
        let len = self.grid_size.pow(3);
        let raw = self.read_buffer::<[f32; 4]>(self.fields.velocity.read(), len);
        Cow::Owned(raw.iter().map(|v| Vec3::new(v[0], v[1], v[2])).collect())
    }

    fn resize(&mut self, grid_size: usize) -> Result<()> {
        let limits = self.device.limits();
        let velocity_bytes = (grid_size as u64).saturating_pow(3).saturating_mul(16);
        let allocation_error = SmokeError::Allocation {
            grid_size,
            bytes: FieldSet::bytes_for(grid_size),
        };
        if velocity_bytes > u64::from(limits.max_storage_buffer_binding_size) {
            warn!(grid_size, "grid exceeds GPU storage binding limit, keeping previous grid");
            return Err(allocation_error);
        }

        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let fields = GpuFields::new(&self.device, grid_size);
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            warn!(grid_size, error = %err, "GPU resize failed, keeping previous grid");
            return Err(allocation_error);
        }

        info!(from = self.grid_size, to = grid_size, "GPU smoke solver resized");
        self.fields = fields;
        self.grid_size = grid_size;
        Ok(())
    }

    fn reset(&mut self) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Smoke Reset Encoder"),
            });
        for field in self.fields.all() {
            for buffer in &field.buffers {
                encoder.clear_buffer(buffer, 0, None);
            }
        }
        self.queue.submit(Some(encoder.finish()));
    }

    fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    fn grid_size(&self) -> usize {
        self.grid_size
    }

    fn is_gpu_accelerated(&self) -> bool {
        true
    }
}
