//! Shader programs.
//!
//! A program is built in three steps:
//! - each stage's WGSL is parsed and validated by naga (`compile_shader`)
//! - the two stages are linked: the fragment inputs must be produced by the
//!   vertex outputs and shared bindings must agree (`link_program`)
//! - the linked pair becomes a wgpu render pipeline (`Program::link`)
//!
//! `init_shader_program` runs all three and reports failures the way the
//! render loop expects (console for compile errors, alert for link errors).

mod compile;
mod error;
mod link;
mod program;

pub use compile::{compile_shader, load_shader, CompiledShader, ShaderStage};
pub use error::ShaderError;
pub use link::{
    link_program, LinkedStages, ProgramLayout, Resource, ResourceKind, UniformLocation,
    UniformMember, VertexAttribute, VertexInput,
};
pub use program::{init_shader_program, init_shader_program_with_inputs, Program, ProgramTargets};

/// Built-in vertex stage for textured geometry.
pub const TEXTURED_VERTEX_SHADER: &str = include_str!("shaders/textured.vert.wgsl");

/// Built-in fragment stage for textured geometry.
pub const TEXTURED_FRAGMENT_SHADER: &str = include_str!("shaders/textured.frag.wgsl");
