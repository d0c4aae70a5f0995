use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use winit::dpi::LogicalSize;

use wgl_engine::logging::LoggingConfig;
use wgl_engine::render_loop::{SceneConfig, DEFAULT_TEXTURE_PATH};
use wgl_engine::shader::{TEXTURED_FRAGMENT_SHADER, TEXTURED_VERTEX_SHADER};
use wgl_engine::texture::LoadOptions;
use wgl_engine::window::RuntimeConfig;

/// Render a spinning, textured cube.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// WGSL vertex shader (built-in textured shader when omitted)
    #[arg(long)]
    pub vertex: Option<PathBuf>,

    /// WGSL fragment shader (built-in textured shader when omitted)
    #[arg(long)]
    pub fragment: Option<PathBuf>,

    /// Image to texture the cube with
    #[arg(long, default_value = DEFAULT_TEXTURE_PATH)]
    pub texture: PathBuf,

    /// Keep image rows top-to-bottom instead of flipping them on load
    #[arg(long)]
    pub no_flip_y: bool,

    /// Log filter, env_logger syntax (overrides RUST_LOG)
    #[arg(long)]
    pub log: Option<String>,

    /// Window title
    #[arg(long, default_value = "wgl")]
    pub title: String,

    /// Window width in logical pixels
    #[arg(long, default_value_t = 640.0)]
    pub width: f64,

    /// Window height in logical pixels
    #[arg(long, default_value_t = 480.0)]
    pub height: f64,
}

impl Args {
    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            env_filter: self.log.clone(),
            ..LoggingConfig::default()
        }
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            title: self.title.clone(),
            initial_size: LogicalSize::new(self.width, self.height),
        }
    }

    /// Reads the shader files, if any were given.
    pub fn scene_config(&self) -> Result<SceneConfig> {
        Ok(SceneConfig {
            vertex_source: read_or(self.vertex.as_ref(), TEXTURED_VERTEX_SHADER)?,
            fragment_source: read_or(self.fragment.as_ref(), TEXTURED_FRAGMENT_SHADER)?,
            texture: self.texture.clone().into(),
            load: LoadOptions {
                flip_y: !self.no_flip_y,
            },
        })
    }
}

fn read_or(path: Option<&PathBuf>, builtin: &str) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read shader {}", path.display())),
        None => Ok(builtin.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["wgl-demo"]).unwrap();
        assert_eq!(args.texture, PathBuf::from(DEFAULT_TEXTURE_PATH));
        assert!(!args.no_flip_y);

        let scene = args.scene_config().unwrap();
        assert_eq!(scene.vertex_source, TEXTURED_VERTEX_SHADER);
        assert_eq!(scene.fragment_source, TEXTURED_FRAGMENT_SHADER);
        assert!(scene.load.flip_y);

        let runtime = args.runtime_config();
        assert_eq!(runtime.title, "wgl");
        assert_eq!(runtime.initial_size, LogicalSize::new(640.0, 480.0));
    }

    #[test]
    fn overrides() {
        let args = Args::try_parse_from([
            "wgl-demo",
            "--texture",
            "other.png",
            "--no-flip-y",
            "--log",
            "debug",
            "--width",
            "800",
            "--height",
            "600",
        ])
        .unwrap();

        let scene = args.scene_config().unwrap();
        assert!(!scene.load.flip_y);
        assert_eq!(scene.texture.to_string(), "other.png");
        assert_eq!(args.logging_config().env_filter.as_deref(), Some("debug"));
        assert_eq!(args.runtime_config().initial_size, LogicalSize::new(800.0, 600.0));
    }

    #[test]
    fn unreadable_shader_is_an_error() {
        let args = Args::try_parse_from(["wgl-demo", "--vertex", "no/such/shader.wgsl"]).unwrap();
        let err = args.scene_config().unwrap_err();
        assert!(format!("{err:#}").contains("no/such/shader.wgsl"));
    }
}
