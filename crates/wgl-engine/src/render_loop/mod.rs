//! The per-frame driver: program setup once, then poll-texture-and-draw every
//! display refresh.

mod app;
mod scene;
mod state;

pub use app::SceneApp;
pub use scene::{Scene, SceneInputs};
pub use state::{RenderState, SceneConfig, DEFAULT_TEXTURE_PATH};
