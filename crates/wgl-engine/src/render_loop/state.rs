use anyhow::{Context, Result};

use crate::core::{AppControl, FrameCtx};
use crate::program::{ProgramBindings, ProgramInfo};
use crate::render::{RenderCtx, RenderTarget};
use crate::shader::{init_shader_program_with_inputs, ProgramTargets, TEXTURED_FRAGMENT_SHADER, TEXTURED_VERTEX_SHADER};
use crate::texture::{load_texture, LoadOptions, Texture, TextureSource};

use super::scene::{Scene, SceneInputs};

/// Texture loaded when nothing else is configured.
pub const DEFAULT_TEXTURE_PATH: &str = "assets/sb1_x1024.png";

/// Inputs to [`RenderState::start`].
#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub vertex_source: String,
    pub fragment_source: String,
    pub texture: TextureSource,
    pub load: LoadOptions,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            vertex_source: TEXTURED_VERTEX_SHADER.to_string(),
            fragment_source: TEXTURED_FRAGMENT_SHADER.to_string(),
            texture: DEFAULT_TEXTURE_PATH.into(),
            load: LoadOptions::default(),
        }
    }
}

/// Everything a running scene needs between frames.
pub struct RenderState<S: Scene> {
    scene: S,
    program_info: ProgramInfo,
    bindings: ProgramBindings,
    buffers: S::Buffers,
    texture: Texture,
}

impl<S: Scene> RenderState<S> {
    /// Builds the program, resolves its locations, creates the scene buffers
    /// and starts the texture load.
    ///
    /// Fails when the program does not compile or link; the reason has
    /// already been reported by then.
    pub fn start(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        targets: ProgramTargets,
        mut scene: S,
        config: &SceneConfig,
    ) -> Result<Self> {
        let program = init_shader_program_with_inputs(
            device,
            &config.vertex_source,
            &config.fragment_source,
            targets,
            scene.vertex_inputs(),
        )
        .context("no shader program to draw with")?;

        let program_info = ProgramInfo::new(program);
        let bindings = ProgramBindings::new(device, program_info.program())
            .context("failed to allocate program bindings")?;
        let buffers = scene.init_buffers(device);
        let texture = load_texture(device, queue, config.texture.clone(), config.load);

        Ok(Self {
            scene,
            program_info,
            bindings,
            buffers,
            texture,
        })
    }

    /// Swaps in the texture image if it arrived and refreshes the bindings.
    pub fn prepare_frame(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        if self.texture.poll(device, queue) {
            log::debug!("texture image arrived");
        }
        self.bindings
            .prepare(device, self.program_info.program(), &self.texture);
    }

    /// Prepares and draws one frame into `target`.
    pub fn draw(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>, elapsed: f32) {
        self.prepare_frame(ctx.device, ctx.queue);

        let inputs = SceneInputs {
            program_info: &self.program_info,
            bindings: &self.bindings,
            buffers: &self.buffers,
            texture: &self.texture,
            elapsed,
        };
        self.scene.draw_scene(ctx, target, inputs);
    }

    /// One display refresh: clear, draw with the frame's scaled time, present.
    pub fn frame_step(&mut self, frame: &mut FrameCtx<'_, '_>) -> AppControl {
        let elapsed = frame.time.elapsed;
        log::trace!("frame {} elapsed {elapsed:.3}", frame.time.frame_index);

        let clear = self.scene.clear_color();
        frame.render(clear, |ctx, target| self.draw(ctx, target, elapsed))
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn program_info(&self) -> &ProgramInfo {
        &self.program_info
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }
}
