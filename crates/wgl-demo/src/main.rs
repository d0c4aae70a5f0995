//! Spinning textured cube.
//!
//! Compiles a WGSL shader pair, loads a texture in the background (drawing a
//! blue placeholder until it arrives) and renders a cube every display refresh.

mod cli;
mod cube;

use anyhow::Result;
use clap::Parser;

use wgl_engine::device::GpuInit;
use wgl_engine::logging::init_logging;
use wgl_engine::render_loop::SceneApp;
use wgl_engine::window::Runtime;

use crate::cli::Args;
use crate::cube::CubeScene;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.logging_config());

    log::info!("wgl-demo {}", env!("CARGO_PKG_VERSION"));

    let scene_config = args.scene_config()?;
    log::info!("texture: {}", scene_config.texture);

    let app = SceneApp::new(CubeScene::default(), scene_config);
    Runtime::run(args.runtime_config(), GpuInit::default(), app)
}
