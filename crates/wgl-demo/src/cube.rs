use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use wgl_engine::program::{TEXTURE_COORD, VERTEX_POSITION};
use wgl_engine::render::{RenderCtx, RenderTarget};
use wgl_engine::render_loop::{Scene, SceneInputs};
use wgl_engine::shader::VertexInput;

const FIELD_OF_VIEW: f32 = 45.0_f32.to_radians();
const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 100.0;

#[rustfmt::skip]
const POSITIONS: [[f32; 3]; 24] = [
    // front
    [-1.0, -1.0,  1.0], [ 1.0, -1.0,  1.0], [ 1.0,  1.0,  1.0], [-1.0,  1.0,  1.0],
    // back
    [-1.0, -1.0, -1.0], [-1.0,  1.0, -1.0], [ 1.0,  1.0, -1.0], [ 1.0, -1.0, -1.0],
    // top
    [-1.0,  1.0, -1.0], [-1.0,  1.0,  1.0], [ 1.0,  1.0,  1.0], [ 1.0,  1.0, -1.0],
    // bottom
    [-1.0, -1.0, -1.0], [ 1.0, -1.0, -1.0], [ 1.0, -1.0,  1.0], [-1.0, -1.0,  1.0],
    // right
    [ 1.0, -1.0, -1.0], [ 1.0,  1.0, -1.0], [ 1.0,  1.0,  1.0], [ 1.0, -1.0,  1.0],
    // left
    [-1.0, -1.0, -1.0], [-1.0, -1.0,  1.0], [-1.0,  1.0,  1.0], [-1.0,  1.0, -1.0],
];

const FACE_TEXTURE_COORDS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

/// Two triangles per face.
const fn cube_indices() -> [u16; 36] {
    let mut indices = [0u16; 36];
    let mut face = 0;
    while face < 6 {
        let base = (face * 4) as u16;
        let i = face * 6;
        indices[i] = base;
        indices[i + 1] = base + 1;
        indices[i + 2] = base + 2;
        indices[i + 3] = base;
        indices[i + 4] = base + 2;
        indices[i + 5] = base + 3;
        face += 1;
    }
    indices
}

const INDICES: [u16; 36] = cube_indices();

/// What the buffers below hold. A shader may declare the position as
/// `vec4<f32>`; it then reads `w = 1`.
const VERTEX_INPUTS: [VertexInput; 2] = [
    VertexInput {
        name: VERTEX_POSITION,
        format: wgpu::VertexFormat::Float32x3,
    },
    VertexInput {
        name: TEXTURE_COORD,
        format: wgpu::VertexFormat::Float32x2,
    },
];

fn texture_coords() -> [[f32; 2]; 24] {
    std::array::from_fn(|i| FACE_TEXTURE_COORDS[i % 4])
}

pub fn projection_matrix(aspect: f32) -> Mat4 {
    Mat4::perspective_rh(FIELD_OF_VIEW, aspect, Z_NEAR, Z_FAR)
}

/// Six units back from the eye, spun about z, y and x at different rates.
pub fn model_view_matrix(elapsed: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(0.0, 0.0, -6.0))
        * Mat4::from_rotation_z(elapsed)
        * Mat4::from_rotation_y(elapsed * 0.7)
        * Mat4::from_rotation_x(elapsed * 0.3)
}

pub struct CubeBuffers {
    position: wgpu::Buffer,
    texture_coord: wgpu::Buffer,
    indices: wgpu::Buffer,
}

#[derive(Default)]
pub struct CubeScene {
    warned: bool,
}

impl CubeScene {
    fn warn_once(&mut self, message: &str) {
        if !self.warned {
            self.warned = true;
            log::warn!("{message}; not drawing the cube");
        }
    }
}

impl Scene for CubeScene {
    type Buffers = CubeBuffers;

    fn init_buffers(&mut self, device: &wgpu::Device) -> CubeBuffers {
        let position = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cube positions"),
            contents: bytemuck::cast_slice(&POSITIONS),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let texture_coord = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cube texture coords"),
            contents: bytemuck::cast_slice(&texture_coords()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cube indices"),
            contents: bytemuck::cast_slice(&INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        CubeBuffers {
            position,
            texture_coord,
            indices,
        }
    }

    fn vertex_inputs(&self) -> &[VertexInput] {
        &VERTEX_INPUTS
    }

    fn draw_scene(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        inputs: SceneInputs<'_, CubeBuffers>,
    ) {
        let program = inputs.program_info.program();
        let attribs = inputs.program_info.attrib_locations();
        let uniforms = inputs.program_info.uniform_locations();
        let buffers = inputs.buffers;

        let projection = projection_matrix(ctx.aspect());
        let model_view = model_view_matrix(inputs.elapsed);
        inputs
            .bindings
            .set_mat4(ctx.queue, uniforms.projection_matrix, &projection.to_cols_array());
        inputs
            .bindings
            .set_mat4(ctx.queue, uniforms.model_view_matrix, &model_view.to_cols_array());

        // Every input the program reads must be fed with matching data.
        let mut vertex_buffers = Vec::new();
        for attribute in program.layout().attributes() {
            let location = Some(attribute.location);
            let (buffer, expected) = if location == attribs.vertex_position {
                (&buffers.position, VERTEX_INPUTS[0].format)
            } else if location == attribs.texture_coord {
                (&buffers.texture_coord, VERTEX_INPUTS[1].format)
            } else {
                self.warn_once(&format!("no cube data for vertex input `{}`", attribute.name));
                return;
            };
            if attribute.format != expected {
                self.warn_once(&format!(
                    "vertex input `{}` is {:?}, cube data is {:?}",
                    attribute.name, attribute.format, expected
                ));
                return;
            }
            let Some(slot) = program.vertex_slot(attribute.location) else {
                return;
            };
            vertex_buffers.push((slot, buffer));
        }

        let mut pass = target.begin_load_pass("cube");
        pass.set_pipeline(program.pipeline());
        inputs.bindings.bind(&mut pass);
        for (slot, buffer) in vertex_buffers {
            pass.set_vertex_buffer(slot, buffer.slice(..));
        }
        pass.set_index_buffer(buffers.indices.slice(..), wgpu::IndexFormat::Uint16);
        pass.draw_indexed(0..INDICES.len() as u32, 0, 0..1);
    }
}
