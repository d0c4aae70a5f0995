use anyhow::{Context, Result};

use crate::core::{App, AppControl, FrameCtx};
use crate::device::Gpu;
use crate::shader::ProgramTargets;

use super::scene::Scene;
use super::state::{RenderState, SceneConfig};

/// Runs a [`Scene`] under the window runtime.
///
/// Starts once the GPU context exists, then draws on every frame. It never
/// asks to stop; the loop ends when the window closes.
pub struct SceneApp<S: Scene> {
    pending: Option<S>,
    config: SceneConfig,
    state: Option<RenderState<S>>,
}

impl<S: Scene> SceneApp<S> {
    pub fn new(scene: S, config: SceneConfig) -> Self {
        Self {
            pending: Some(scene),
            config,
            state: None,
        }
    }

    pub fn state(&self) -> Option<&RenderState<S>> {
        self.state.as_ref()
    }
}

impl<S: Scene> App for SceneApp<S> {
    fn on_start(&mut self, gpu: &Gpu<'_>) -> Result<()> {
        let scene = self.pending.take().context("scene already started")?;
        let targets = ProgramTargets {
            color_format: gpu.surface_format(),
            depth_format: gpu.depth_format(),
        };

        let state = RenderState::start(gpu.device(), gpu.queue(), targets, scene, &self.config)?;
        self.state = Some(state);
        Ok(())
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        match self.state.as_mut() {
            Some(state) => state.frame_step(ctx),
            None => AppControl::Continue,
        }
    }
}
