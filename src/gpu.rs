//! Headless GPU evaluation of the filter kernel.
//!
//! [`GpuContext::evaluate`] uploads a [`ParticleBox`], runs the shader from
//! [`kernel::compute_shader`] once and reads back, per particle, whether the
//! filter accepts it and its charge. Results come back in storage order, so
//! they line up with [`ParticleBox::iter`] and [`ParticleBox::mask`].

use std::sync::mpsc;

use wgpu::util::DeviceExt;

use crate::dimension::GridIndex;
use crate::error::GpuError;
use crate::filter::{FilterParams, RelativeGlobalDomainPosition};
use crate::identifier::{ChargeState, HasIdentifier};
use crate::kernel::{self, DomainParams, WORKGROUP_SIZE};
use crate::particles::ParticleBox;
use crate::species::Species;

/// Maximum workgroups per dispatch dimension guaranteed by wgpu's default limits.
const MAX_WORKGROUPS: u32 = 65_535;

/// Per-particle result of the kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelOutput {
    pub accepted: bool,
    pub charge: f32,
}

/// A GPU device and queue used for compute work only.
pub struct GpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl GpuContext {
    /// Acquire a device, blocking the caller.
    pub fn new() -> Result<Self, GpuError> {
        pollster::block_on(Self::new_async())
    }

    pub async fn new_async() -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("supercell compute device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        log::info!("GPU adapter: {}", adapter.get_info().name);
        Ok(Self { device, queue })
    }

    /// Evaluate `filter` and the charge of every particle in `particles`.
    pub fn evaluate<P, Params>(
        &self,
        particles: &ParticleBox<P>,
        filter: &RelativeGlobalDomainPosition<Params, P::Cell>,
    ) -> Result<Vec<KernelOutput>, GpuError>
    where
        P: Species + HasIdentifier<ChargeState>,
        Params: FilterParams,
    {
        let count = particles.len();
        if count == 0 {
            return Ok(Vec::new());
        }

        let workgroups = (count as u32).div_ceil(WORKGROUP_SIZE);
        if workgroups > MAX_WORKGROUPS {
            return Err(GpuError::DispatchTooLarge {
                particles: count,
                max: (MAX_WORKGROUPS * WORKGROUP_SIZE) as usize,
            });
        }

        let (gpu_particles, offsets): (Vec<P::Gpu>, Vec<[i32; 4]>) = particles
            .iter()
            .map(|(offset, p)| (p.to_gpu(), offset.to_array4(0)))
            .unzip();
        let params = DomainParams::new::<Params, P>(filter, count as u32);

        let shader_source = kernel::compute_shader::<P, Params>(filter);
        let shader = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Filter Kernel"),
            source: wgpu::ShaderSource::Wgsl(shader_source.into()),
        });
        let pipeline = self.device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Filter Pipeline"),
            layout: None, // Auto layout
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        let particle_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particles"),
            contents: bytemuck::cast_slice(&gpu_particles),
            usage: wgpu::BufferUsages::STORAGE,
        });
        let offset_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Supercell Offsets"),
            contents: bytemuck::cast_slice(&offsets),
            usage: wgpu::BufferUsages::STORAGE,
        });
        let params_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Domain Params"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let result_size = (count * std::mem::size_of::<u32>()) as u64;
        let accepted_buffer = self.output_buffer("Accepted", result_size);
        let charge_buffer = self.output_buffer("Charges", result_size);
        let accepted_staging = self.staging_buffer("Accepted Staging", result_size);
        let charge_staging = self.staging_buffer("Charges Staging", result_size);

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Filter Bind Group"),
            layout: &pipeline.get_bind_group_layout(0),
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: particle_buffer.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: offset_buffer.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 2, resource: params_buffer.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 3, resource: accepted_buffer.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 4, resource: charge_buffer.as_entire_binding() },
            ],
        });

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Filter Encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Filter Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(workgroups, 1, 1);
        }
        encoder.copy_buffer_to_buffer(&accepted_buffer, 0, &accepted_staging, 0, result_size);
        encoder.copy_buffer_to_buffer(&charge_buffer, 0, &charge_staging, 0, result_size);
        self.queue.submit(Some(encoder.finish()));

        let accepted: Vec<u32> = self.read_back(&accepted_staging)?;
        let charges: Vec<f32> = self.read_back(&charge_staging)?;

        Ok(accepted
            .into_iter()
            .zip(charges)
            .map(|(accepted, charge)| KernelOutput { accepted: accepted != 0, charge })
            .collect())
    }

    fn output_buffer(&self, label: &str, size: u64) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        })
    }

    fn staging_buffer(&self, label: &str, size: u64) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Map a staging buffer and copy its contents out (call after submit).
    fn read_back<T: bytemuck::Pod>(&self, staging: &wgpu::Buffer) -> Result<Vec<T>, GpuError> {
        let buffer_slice = staging.slice(..);
        let (tx, rx) = mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);

        rx.recv()
            .map_err(|e| GpuError::BufferMapping(e.to_string()))??;

        let values = {
            let data = buffer_slice.get_mapped_range();
            bytemuck::cast_slice::<u8, T>(&data).to_vec()
        };
        staging.unmap();
        Ok(values)
    }
}
