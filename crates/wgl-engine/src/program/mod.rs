//! Program info: the resolved attribute and uniform locations a scene draws with,
//! plus the GPU-side storage behind those uniforms.

mod bindings;
mod info;

pub use bindings::ProgramBindings;
pub use info::{
    AttribLocations, ProgramInfo, UniformLocations, MODEL_VIEW_MATRIX, PROJECTION_MATRIX,
    SAMPLER, TEXTURE_COORD, VERTEX_POSITION,
};
