use std::fmt;

use naga::valid::{Capabilities, ModuleInfo, ValidationFlags, Validator};

use crate::report;

use super::error::ShaderError;

/// Pipeline stage a shader source is compiled for.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub(crate) fn naga(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A validated single-stage shader.
///
/// Holds the source (wgpu compiles from it again when the pipeline is built),
/// the naga IR used for linking and reflection, and the index of the entry
/// point for this stage.
#[derive(Debug)]
pub struct CompiledShader {
    stage: ShaderStage,
    source: String,
    module: naga::Module,
    info: ModuleInfo,
    entry_index: usize,
}

impl CompiledShader {
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Name of the entry point used for this stage.
    pub fn entry_point(&self) -> &str {
        &self.entry().name
    }

    pub(crate) fn module(&self) -> &naga::Module {
        &self.module
    }

    pub(crate) fn entry(&self) -> &naga::EntryPoint {
        &self.module.entry_points[self.entry_index]
    }

    pub(crate) fn entry_info(&self) -> &naga::valid::FunctionInfo {
        self.info.get_entry_point(self.entry_index)
    }
}

/// Compiles WGSL `source` for `stage`.
///
/// The first entry point declared for `stage` is used; a module may carry
/// entry points for other stages as well.
pub fn compile_shader(stage: ShaderStage, source: &str) -> Result<CompiledShader, ShaderError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|err| ShaderError::Parse {
        stage,
        diagnostic: err.emit_to_string(source),
    })?;

    let info = Validator::new(ValidationFlags::all(), Capabilities::default())
        .validate(&module)
        .map_err(|err| ShaderError::Validate {
            stage,
            diagnostic: err.emit_to_string(source),
        })?;

    let entry_index = module
        .entry_points
        .iter()
        .position(|ep| ep.stage == stage.naga())
        .ok_or(ShaderError::MissingEntryPoint { stage })?;

    Ok(CompiledShader {
        stage,
        source: source.to_owned(),
        module,
        info,
        entry_index,
    })
}

/// Compiles `source`, writing the compiler log to the console on failure.
///
/// Returns `None` for a shader that did not compile; the failed module is
/// discarded.
pub fn load_shader(stage: ShaderStage, source: &str) -> Option<CompiledShader> {
    match compile_shader(stage, source) {
        Ok(shader) => Some(shader),
        Err(err) => {
            report::console(&format!("An error occurred compiling the shaders: {err}"));
            None
        }
    }
}
