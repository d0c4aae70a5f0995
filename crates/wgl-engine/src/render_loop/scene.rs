use crate::program::{ProgramBindings, ProgramInfo};
use crate::render::{RenderCtx, RenderTarget};
use crate::shader::VertexInput;
use crate::texture::Texture;

/// Everything a scene draws with, for one frame.
pub struct SceneInputs<'a, B> {
    pub program_info: &'a ProgramInfo,
    pub bindings: &'a ProgramBindings,
    pub buffers: &'a B,
    pub texture: &'a Texture,
    /// Scaled time, see [`crate::time::elapsed_seconds`].
    pub elapsed: f32,
}

/// Geometry and per-frame drawing supplied by the application.
pub trait Scene {
    /// Vertex/index buffers created once at start.
    type Buffers;

    fn init_buffers(&mut self, device: &wgpu::Device) -> Self::Buffers;

    /// Formats of the vertex data the buffers hold, by input name. The
    /// program's pipeline reads its inputs with these.
    fn vertex_inputs(&self) -> &[VertexInput] {
        &[]
    }

    /// Records the draw for one frame.
    ///
    /// The target has already been cleared and the bindings are up to date
    /// with the texture.
    fn draw_scene(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        inputs: SceneInputs<'_, Self::Buffers>,
    );

    fn clear_color(&self) -> wgpu::Color {
        wgpu::Color::BLACK
    }
}
