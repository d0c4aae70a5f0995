//! wgl engine crate.
//!
//! This crate owns the platform + GPU runtime pieces behind the textured-scene
//! demo: context acquisition, shader programs, textures and the frame loop.

pub mod device;
pub mod window;
pub mod time;
pub mod core;

pub mod logging;
pub mod report;
pub mod render;
pub mod shader;
pub mod program;
pub mod texture;
pub mod render_loop;
