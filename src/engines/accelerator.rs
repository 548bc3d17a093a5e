use super::StepEngine;
use crate::{BitGrid, BitSet, Config, LifeError, Result};
use wgpu::util::DeviceExt;

const KERNEL_SOURCE: &str = include_str!("../../kernels/game_of_life.wgsl");

/// Must match `@workgroup_size` of `clear_grid`.
const CLEAR_GROUP_SIZE: u32 = 256;

/// Generations encoded into one command buffer; device errors are checked
/// after every submit.
const STEPS_PER_SUBMIT: u64 = 256;

/// GL adapters qualify too when they pass the compute-shader check.
const BACKENDS: wgpu::Backends = wgpu::Backends::all();

/// Device resources, acquired together and released together.
struct DeviceState {
    adapter_name: String,
    device: wgpu::Device,
    queue: wgpu::Queue,
    uniform_buffer: wgpu::Buffer,
    storage_buffers: [wgpu::Buffer; 2],
    staging_buffer: wgpu::Buffer,
    bind_groups: [wgpu::BindGroup; 2],
    step_pipeline: wgpu::ComputePipeline,
    clear_pipeline: wgpu::ComputePipeline,
}

impl DeviceState {
    async fn new(width: u32, height: u32, buffer_words: u32, kernel: &str) -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: BACKENDS,
            ..Default::default()
        });
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| LifeError::DeviceUnavailable("no adapter found".to_string()))?;
        let adapter_name = adapter.get_info().name;
        if !adapter
            .get_downlevel_capabilities()
            .flags
            .contains(wgpu::DownlevelFlags::COMPUTE_SHADERS)
        {
            return Err(LifeError::DeviceUnavailable(format!(
                "adapter '{}' does not support compute shaders",
                adapter_name
            )));
        }
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("life-device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults(),
                },
                None,
            )
            .await
            .map_err(|err| LifeError::DeviceUnavailable(err.to_string()))?;
        device.on_uncaptured_error(Box::new(|err: wgpu::Error| {
            log::error!("uncaptured device error: {}", err);
        }));

        let limits = device.limits();
        let buffer_size = buffer_words as u64 * std::mem::size_of::<u32>() as u64;
        if buffer_size > limits.max_storage_buffer_binding_size as u64 {
            return Err(LifeError::DeviceUnavailable(format!(
                "grid needs {} bytes per buffer, device allows {}",
                buffer_size, limits.max_storage_buffer_binding_size
            )));
        }
        let max_groups = [
            width.div_ceil(Config::WORKGROUP_SIDE),
            height.div_ceil(Config::WORKGROUP_SIDE),
            buffer_words.div_ceil(CLEAR_GROUP_SIZE),
        ];
        if max_groups
            .iter()
            .any(|&n| n > limits.max_compute_workgroups_per_dimension)
        {
            return Err(LifeError::DeviceUnavailable(format!(
                "a {}x{} grid exceeds the device dispatch limit",
                width, height
            )));
        }

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("life-dims"),
            contents: bytemuck::cast_slice(&[width, height, buffer_words, 0]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let storage_desc = wgpu::BufferDescriptor {
            label: Some("life-cells"),
            size: buffer_size,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        };
        let storage_buffers = [0; 2].map(|_| device.create_buffer(&storage_desc));
        let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("life-staging"),
            size: buffer_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("life-layout"),
            entries: &[
                (0, wgpu::BufferBindingType::Uniform),
                (1, wgpu::BufferBindingType::Storage { read_only: true }),
                (2, wgpu::BufferBindingType::Storage { read_only: false }),
            ]
            .map(|(binding, ty)| wgpu::BindGroupLayoutEntry {
                binding,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }),
        });
        // bind_groups[i] reads D[i] and writes D[1 - i]
        let bind_groups = [(0, 1), (1, 0)].map(|(src, dst)| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: None,
                layout: &bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: storage_buffers[src].as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: storage_buffers[dst].as_entire_binding(),
                    },
                ],
            })
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: None,
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("game_of_life.wgsl"),
            source: wgpu::ShaderSource::Wgsl(kernel.into()),
        });
        let [step_pipeline, clear_pipeline] = ["game_of_life_step", "clear_grid"].map(|entry_point| {
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(entry_point),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point,
            })
        });

        if let Some(err) = device.pop_error_scope().await {
            return Err(LifeError::BuildFailure {
                log: err.to_string(),
                kernel: kernel.to_string(),
            });
        }

        Ok(Self {
            adapter_name,
            device,
            queue,
            uniform_buffer,
            storage_buffers,
            staging_buffer,
            bind_groups,
            step_pipeline,
            clear_pipeline,
        })
    }

    /// Uploads `words` into D[0], runs `steps` generations ping-ponging
    /// between D[0] and D[1] and reads the last written buffer back into `words`.
    fn run(&self, words: &mut [u32], groups: [u32; 2], steps: u64) -> Result<()> {
        self.queue
            .write_buffer(&self.storage_buffers[0], 0, bytemuck::cast_slice(words));
        let clear_groups = (words.len() as u32).div_ceil(CLEAR_GROUP_SIZE);

        let mut idx_active = 0;
        let mut remaining = steps;
        while remaining > 0 {
            let batch = remaining.min(STEPS_PER_SUBMIT);
            self.device.push_error_scope(wgpu::ErrorFilter::Validation);
            let mut encoder = self
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
            for _ in 0..batch {
                {
                    let mut pass =
                        encoder.begin_compute_pass(&wgpu::ComputePassDescriptor::default());
                    pass.set_pipeline(&self.clear_pipeline);
                    pass.set_bind_group(0, &self.bind_groups[idx_active], &[]);
                    pass.dispatch_workgroups(clear_groups, 1, 1);
                }
                {
                    let mut pass =
                        encoder.begin_compute_pass(&wgpu::ComputePassDescriptor::default());
                    pass.set_pipeline(&self.step_pipeline);
                    pass.set_bind_group(0, &self.bind_groups[idx_active], &[]);
                    pass.dispatch_workgroups(groups[0], groups[1], 1);
                }
                idx_active = 1 - idx_active;
            }
            self.queue.submit(Some(encoder.finish()));
            if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
                return Err(LifeError::LaunchFailure(err.to_string()));
            }
            remaining -= batch;
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
        encoder.copy_buffer_to_buffer(
            &self.storage_buffers[idx_active],
            0,
            &self.staging_buffer,
            0,
            self.staging_buffer.size(),
        );
        self.queue.submit(Some(encoder.finish()));

        let buffer_slice = self.staging_buffer.slice(..);
        let (sender, receiver) = flume::bounded(1);
        buffer_slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = sender.send(r);
        });
        self.device.poll(wgpu::Maintain::Wait);
        pollster::block_on(receiver.recv_async())
            .map_err(|err| LifeError::LaunchFailure(err.to_string()))?
            .map_err(|err| LifeError::LaunchFailure(err.to_string()))?;

        let view = buffer_slice.get_mapped_range();
        words.copy_from_slice(bytemuck::cast_slice(&view));
        drop(view);
        self.staging_buffer.unmap();
        Ok(())
    }

    fn release(self) {
        for buffer in &self.storage_buffers {
            buffer.destroy();
        }
        self.staging_buffer.destroy();
        self.uniform_buffer.destroy();
        log::info!("released gpu resources on '{}'", self.adapter_name);
    }
}

/// Data-parallel engine running one kernel invocation per cell on the GPU.
///
/// Device buffers are sized for one grid shape at construction. Several
/// generations are advanced on the device without host round trips, and the
/// result is read back once per [`StepEngine::simulate`] call.
pub struct AcceleratorEngine {
    width: usize,
    height: usize,
    /// `ceil(width * height / 32) + 1` words, mirroring a device buffer
    host_words: Vec<u32>,
    state: Option<DeviceState>,
}

impl AcceleratorEngine {
    pub fn new(width: usize, height: usize) -> Result<Self> {
        let cells = width
            .checked_mul(height)
            .filter(|&n| n > 0 && n <= Config::MAX_SAFE_CELLS)
            .ok_or(LifeError::OutOfRange { width, height })?;
        let buffer_words = cells.div_ceil(BitSet::BITS_IN_WORD) + 1;
        let state = pollster::block_on(DeviceState::new(
            width as u32,
            height as u32,
            buffer_words as u32,
            KERNEL_SOURCE,
        ))?;
        log::info!(
            "gpu engine on '{}' for a {}x{} grid",
            state.adapter_name,
            width,
            height
        );
        Ok(Self {
            width,
            height,
            host_words: vec![0; buffer_words],
            state: Some(state),
        })
    }

    /// `None` once the engine has been shut down.
    pub fn adapter_name(&self) -> Option<&str> {
        self.state.as_ref().map(|s| s.adapter_name.as_str())
    }

    fn workgroups(&self) -> [u32; 2] {
        [
            (self.width as u32).div_ceil(Config::WORKGROUP_SIDE),
            (self.height as u32).div_ceil(Config::WORKGROUP_SIDE),
        ]
    }
}

impl StepEngine for AcceleratorEngine {
    fn name(&self) -> String {
        "gpu".to_string()
    }

    fn step(&mut self, grid: &mut BitGrid) -> Result<()> {
        self.simulate(grid, 1)
    }

    fn simulate(&mut self, grid: &mut BitGrid, steps: u64) -> Result<()> {
        if grid.size() != (self.width, self.height) {
            return Err(LifeError::InvalidInput(format!(
                "gpu engine was built for a {}x{} grid, got {}x{}",
                self.width,
                self.height,
                grid.width(),
                grid.height()
            )));
        }
        let groups = self.workgroups();
        let state = self.state.as_ref().ok_or_else(|| {
            LifeError::DeviceUnavailable("gpu engine has been shut down".to_string())
        })?;
        if steps == 0 {
            return Ok(());
        }

        let words = grid.current_words();
        self.host_words[..words.len()].copy_from_slice(words);
        self.host_words[words.len()..].fill(0);
        state.run(&mut self.host_words, groups, steps)?;
        grid.load_next_words(&self.host_words);
        grid.swap();
        Ok(())
    }

    fn shutdown(&mut self) {
        if let Some(state) = self.state.take() {
            state.release();
        }
    }
}

impl Drop for AcceleratorEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
