use super::compile::ShaderStage;

/// Errors produced while compiling or linking a shader program.
///
/// `Display` output is the driver-log analogue shown to the user.
#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("{stage} shader failed to parse:\n{diagnostic}")]
    Parse {
        stage: ShaderStage,
        diagnostic: String,
    },

    #[error("{stage} shader failed validation:\n{diagnostic}")]
    Validate {
        stage: ShaderStage,
        diagnostic: String,
    },

    #[error("{stage} shader has no @{stage} entry point")]
    MissingEntryPoint { stage: ShaderStage },

    #[error("no compiled {stage} shader to link")]
    MissingStage { stage: ShaderStage },

    #[error("expected a {expected} shader, got a {found} shader")]
    WrongStage {
        expected: ShaderStage,
        found: ShaderStage,
    },

    #[error("fragment input `{name}` at location {location} is not written by the vertex stage")]
    UnmatchedVarying { name: String, location: u32 },

    #[error(
        "varying at location {location} is {vertex} in the vertex stage but {fragment} in the fragment stage"
    )]
    VaryingTypeMismatch {
        location: u32,
        vertex: String,
        fragment: String,
    },

    #[error(
        "group {group} binding {binding} is `{vertex}` in the vertex stage but `{fragment}` in the fragment stage"
    )]
    BindingConflict {
        group: u32,
        binding: u32,
        vertex: String,
        fragment: String,
    },

    #[error("vertex input `{name}` has unsupported type {ty}")]
    UnsupportedAttribute { name: String, ty: String },

    #[error("vertex input `{name}` is declared {declared:?} but supplied as {supplied:?}")]
    VertexFormatMismatch {
        name: String,
        declared: wgpu::VertexFormat,
        supplied: wgpu::VertexFormat,
    },

    #[error("{stage} shader resource `{name}` has an unsupported type")]
    UnsupportedResource { stage: ShaderStage, name: String },
}
