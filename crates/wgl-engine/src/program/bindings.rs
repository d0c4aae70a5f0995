use std::ops::Range;

use anyhow::{bail, Result};

use crate::shader::{Program, ResourceKind, UniformLocation};
use crate::texture::Texture;

struct UniformBuffer {
    group: u32,
    binding: u32,
    size: u32,
    buffer: wgpu::Buffer,
}

/// GPU storage behind a program's resource slots.
///
/// Owns one buffer per uniform-buffer binding. Bind groups tie those buffers
/// and the current texture to the pipeline; they are rebuilt whenever the
/// texture's contents are replaced.
pub struct ProgramBindings {
    uniforms: Vec<UniformBuffer>,
    bind_groups: Vec<(u32, wgpu::BindGroup)>,
    texture_generation: Option<u64>,
}

impl ProgramBindings {
    /// Allocates zeroed uniform buffers for `program`.
    pub fn new(device: &wgpu::Device, program: &Program) -> Result<Self> {
        let mut uniforms = Vec::new();

        for resource in program.layout().resources() {
            match resource.kind {
                ResourceKind::Uniform { size } => {
                    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                        label: Some(resource.name.as_str()),
                        size: u64::from(buffer_size(size)),
                        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                        mapped_at_creation: false,
                    });
                    uniforms.push(UniformBuffer {
                        group: resource.group,
                        binding: resource.binding,
                        size,
                        buffer,
                    });
                }
                ResourceKind::Texture | ResourceKind::Sampler { comparison: false } => {}
                ResourceKind::Sampler { comparison: true } => {
                    bail!("comparison sampler `{}` has nothing to bind", resource.name)
                }
            }
        }

        Ok(Self {
            uniforms,
            bind_groups: Vec::new(),
            texture_generation: None,
        })
    }

    /// Writes a column-major 4x4 matrix. A `None` location is ignored.
    pub fn set_mat4(&self, queue: &wgpu::Queue, location: Option<UniformLocation>, matrix: &[f32; 16]) {
        self.set_bytes(queue, location, bytemuck::cast_slice(matrix));
    }

    /// Writes raw bytes at `location`. A `None` location is ignored, as is a
    /// location that does not name a uniform buffer or a write that would
    /// overrun it.
    pub fn set_bytes(&self, queue: &wgpu::Queue, location: Option<UniformLocation>, bytes: &[u8]) {
        let Some(location) = location else {
            return;
        };
        let Some(uniform) = self
            .uniforms
            .iter()
            .find(|u| u.group == location.group && u.binding == location.binding)
        else {
            log::trace!("no uniform buffer at {location:?}");
            return;
        };
        let Some(range) = write_range(location.offset, bytes.len(), uniform.size) else {
            log::trace!("write of {} bytes at {location:?} overruns the buffer", bytes.len());
            return;
        };

        queue.write_buffer(&uniform.buffer, range.start, bytes);
    }

    /// True when the bind groups were built for the texture's current contents.
    pub fn is_current(&self, texture: &Texture) -> bool {
        self.texture_generation == Some(texture.generation())
    }

    /// Builds bind groups for `program` and `texture` if they are stale.
    ///
    /// Every texture slot gets the texture's view and every sampler slot its
    /// sampler. Group indices the program skips get an empty bind group.
    pub fn prepare(&mut self, device: &wgpu::Device, program: &Program, texture: &Texture) {
        if self.is_current(texture) {
            return;
        }

        let layout = program.layout();
        let mut bind_groups = Vec::new();

        for group in 0..layout.bind_group_count() {
            let entries: Vec<wgpu::BindGroupEntry<'_>> = layout
                .resources()
                .iter()
                .filter(|r| r.group == group)
                .filter_map(|r| {
                    let resource = match r.kind {
                        ResourceKind::Uniform { .. } => self
                            .uniforms
                            .iter()
                            .find(|u| u.group == r.group && u.binding == r.binding)?
                            .buffer
                            .as_entire_binding(),
                        ResourceKind::Texture => wgpu::BindingResource::TextureView(texture.view()),
                        ResourceKind::Sampler { .. } => wgpu::BindingResource::Sampler(texture.sampler()),
                    };
                    Some(wgpu::BindGroupEntry {
                        binding: r.binding,
                        resource,
                    })
                })
                .collect();

            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("wgl program bindings"),
                layout: &program.pipeline().get_bind_group_layout(group),
                entries: &entries,
            });
            bind_groups.push((group, bind_group));
        }

        log::debug!(
            "rebuilt {} bind group(s) for texture generation {}",
            bind_groups.len(),
            texture.generation()
        );
        self.bind_groups = bind_groups;
        self.texture_generation = Some(texture.generation());
    }

    /// Sets the bind groups on `pass`. Call [`ProgramBindings::prepare`] first.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        for (group, bind_group) in &self.bind_groups {
            pass.set_bind_group(*group, bind_group, &[]);
        }
    }
}

/// Uniform buffers are allocated in 16-byte multiples.
fn buffer_size(size: u32) -> u32 {
    size.max(16).next_multiple_of(16)
}

fn write_range(offset: u32, len: usize, size: u32) -> Option<Range<u64>> {
    let start = u64::from(offset);
    let end = start.checked_add(u64::try_from(len).ok()?)?;
    (end <= u64::from(size)).then_some(start..end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::test_support;
    use crate::program::ProgramInfo;
    use crate::render::RenderTarget;
    use crate::shader::{
        init_shader_program, ProgramTargets, TEXTURED_FRAGMENT_SHADER, TEXTURED_VERTEX_SHADER,
    };

    #[test]
    fn buffers_are_padded_to_sixteen_bytes() {
        assert_eq!(buffer_size(64), 64);
        assert_eq!(buffer_size(4), 16);
        assert_eq!(buffer_size(0), 16);
        assert_eq!(buffer_size(68), 80);
    }

    #[test]
    fn writes_must_fit() {
        assert_eq!(write_range(0, 64, 64), Some(0..64));
        assert_eq!(write_range(64, 64, 128), Some(64..128));
        assert_eq!(write_range(4, 64, 64), None);
        assert_eq!(write_range(u32::MAX, 64, 64), None);
    }

    #[test]
    fn textured_program_bindings() {
        let Some(gpu) = test_support::device() else { return };
        let targets = ProgramTargets {
            color_format: wgpu::TextureFormat::Rgba8UnormSrgb,
            depth_format: None,
        };
        let program = init_shader_program(
            gpu.device(),
            TEXTURED_VERTEX_SHADER,
            TEXTURED_FRAGMENT_SHADER,
            targets,
        )
        .expect("program should link");
        let info = ProgramInfo::new(program);

        let mut bindings = ProgramBindings::new(gpu.device(), info.program()).unwrap();
        assert_eq!(bindings.uniforms.len(), 2);

        let mut texture = Texture::placeholder(gpu.device(), gpu.queue());
        assert!(!bindings.is_current(&texture));
        bindings.prepare(gpu.device(), info.program(), &texture);
        assert!(bindings.is_current(&texture));
        assert_eq!(bindings.bind_groups.len(), 1);

        let identity: [f32; 16] = [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ];
        let uniforms = info.uniform_locations();
        bindings.set_mat4(gpu.queue(), uniforms.projection_matrix, &identity);
        bindings.set_mat4(gpu.queue(), None, &identity);

        texture
            .upload(gpu.device(), gpu.queue(), &image::RgbaImage::new(2, 2))
            .unwrap();
        assert!(!bindings.is_current(&texture));
        bindings.prepare(gpu.device(), info.program(), &texture);
        assert!(bindings.is_current(&texture));
    }

    #[test]
    fn skipped_groups_are_bound_empty() {
        let Some(gpu) = test_support::device() else { return };
        let vs = r#"
            @vertex
            fn main(@builtin(vertex_index) i: u32) -> @builtin(position) vec4<f32> {
                let x = f32(i % 2u) - 0.5;
                let y = f32(i / 2u) - 0.5;
                return vec4<f32>(x, y, 0.0, 1.0);
            }
        "#;
        let fs = r#"
            @group(1) @binding(0) var<uniform> tint: vec4<f32>;

            @fragment
            fn main() -> @location(0) vec4<f32> { return tint; }
        "#;
        let format = wgpu::TextureFormat::Rgba8UnormSrgb;
        let targets = ProgramTargets {
            color_format: format,
            depth_format: None,
        };
        let program = init_shader_program(gpu.device(), vs, fs, targets).expect("program should link");
        assert_eq!(program.layout().bind_group_count(), 2);

        let texture = Texture::placeholder(gpu.device(), gpu.queue());
        let mut bindings = ProgramBindings::new(gpu.device(), &program).unwrap();
        bindings.prepare(gpu.device(), &program, &texture);
        let groups: Vec<u32> = bindings.bind_groups.iter().map(|(g, _)| *g).collect();
        assert_eq!(groups, vec![0, 1]);

        let color = gpu.device().create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen"),
            size: wgpu::Extent3d {
                width: 4,
                height: 4,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = color.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        {
            let mut target = RenderTarget::new(&mut encoder, &view, None);
            let mut pass = target.begin_load_pass("gap");
            pass.set_pipeline(program.pipeline());
            bindings.bind(&mut pass);
            pass.draw(0..3, 0..1);
        }
        // A missing group is a validation error, which panics here.
        gpu.queue().submit([encoder.finish()]);
        gpu.device().poll(wgpu::PollType::wait_indefinitely()).unwrap();
    }
}
