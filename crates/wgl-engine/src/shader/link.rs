use std::fmt;

use naga::{AddressSpace, Binding, Handle, ImageClass, Module, ScalarKind, Type, TypeInner};

use super::compile::{CompiledShader, ShaderStage};
use super::error::ShaderError;

/// Where a uniform lives: the resource slot plus a byte offset into it.
///
/// The offset is non-zero only for members of a uniform-buffer struct.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct UniformLocation {
    pub group: u32,
    pub binding: u32,
    pub offset: u32,
}

/// What a bound resource slot expects.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ResourceKind {
    /// `var<uniform>`; `size` is the byte size of the declared type.
    Uniform { size: u32 },
    /// Sampled texture.
    Texture,
    Sampler { comparison: bool },
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Uniform { size } => write!(f, "uniform ({size} bytes)"),
            ResourceKind::Texture => f.write_str("texture"),
            ResourceKind::Sampler { comparison: false } => f.write_str("sampler"),
            ResourceKind::Sampler { comparison: true } => f.write_str("comparison sampler"),
        }
    }
}

/// A named member of a uniform-buffer struct.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UniformMember {
    pub name: String,
    pub offset: u32,
    pub size: u32,
}

/// A resource slot used by at least one stage of a program.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Resource {
    pub name: String,
    pub group: u32,
    pub binding: u32,
    pub kind: ResourceKind,
    pub members: Vec<UniformMember>,
}

impl Resource {
    fn describe(&self) -> String {
        format!("{}: {}", self.name, self.kind)
    }
}

/// A vertex input. Each attribute is fed from its own vertex buffer.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct VertexAttribute {
    pub name: String,
    pub location: u32,
    /// Format the vertex buffer is read with. Matches the shader type unless
    /// overridden by a [`VertexInput`].
    pub format: wgpu::VertexFormat,
}

/// The format a caller's buffer holds for the vertex input called `name`.
///
/// Components the data lacks are filled in by the pipeline (`w = 1`), so
/// `vec3` data can feed a `vec4<f32>` input.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexInput {
    pub name: &'static str,
    pub format: wgpu::VertexFormat,
}

/// Reflected interface of a linked program.
#[derive(Debug, Clone)]
pub struct ProgramLayout {
    vertex_entry: String,
    fragment_entry: String,
    /// Sorted by location.
    attributes: Vec<VertexAttribute>,
    /// Sorted by `(group, binding)`.
    resources: Vec<Resource>,
}

impl ProgramLayout {
    pub fn vertex_entry(&self) -> &str {
        &self.vertex_entry
    }

    pub fn fragment_entry(&self) -> &str {
        &self.fragment_entry
    }

    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// Location of the vertex input called `name`.
    pub fn attrib_location(&self, name: &str) -> Option<u32> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.location)
    }

    /// Location of the uniform called `name`.
    ///
    /// Resource globals are searched first, then members of uniform-buffer
    /// structs. Resources no stage uses are not part of the program and are
    /// never found.
    pub fn uniform_location(&self, name: &str) -> Option<UniformLocation> {
        if let Some(r) = self.resources.iter().find(|r| r.name == name) {
            return Some(UniformLocation {
                group: r.group,
                binding: r.binding,
                offset: 0,
            });
        }

        self.resources.iter().find_map(|r| {
            r.members.iter().find(|m| m.name == name).map(|m| UniformLocation {
                group: r.group,
                binding: r.binding,
                offset: m.offset,
            })
        })
    }

    /// Vertex buffer slot feeding the attribute at `location`.
    pub fn vertex_slot(&self, location: u32) -> Option<u32> {
        self.attributes
            .iter()
            .position(|a| a.location == location)
            .map(|slot| slot as u32)
    }

    /// Reads the named inputs with the formats the caller's buffers hold.
    ///
    /// Names the program does not declare are ignored. The supplied format
    /// must have the same component type as the shader's (float, signed or
    /// unsigned 32-bit); the component count may differ.
    pub fn with_vertex_inputs(mut self, inputs: &[VertexInput]) -> Result<Self, ShaderError> {
        for input in inputs {
            let Some(attribute) = self.attributes.iter_mut().find(|a| a.name == input.name) else {
                continue;
            };
            let compatible = match (component_kind(attribute.format), component_kind(input.format)) {
                (Some(declared), Some(supplied)) => declared == supplied,
                _ => false,
            };
            if !compatible {
                return Err(ShaderError::VertexFormatMismatch {
                    name: attribute.name.clone(),
                    declared: attribute.format,
                    supplied: input.format,
                });
            }
            attribute.format = input.format;
        }
        Ok(self)
    }

    /// Number of bind groups the pipeline layout has: one past the highest
    /// group index in use. Indices below it with no resources are empty groups
    /// that still have to be bound.
    pub fn bind_group_count(&self) -> u32 {
        self.resources.iter().map(|r| r.group + 1).max().unwrap_or(0)
    }
}

/// Two compiled stages that passed interface linking.
#[derive(Debug)]
pub struct LinkedStages<'a> {
    pub vertex: &'a CompiledShader,
    pub fragment: &'a CompiledShader,
    pub layout: ProgramLayout,
}

/// Links a vertex and a fragment stage.
///
/// Either stage may be missing (its compilation failed); linking then fails
/// with [`ShaderError::MissingStage`].
pub fn link_program<'a>(
    vertex: Option<&'a CompiledShader>,
    fragment: Option<&'a CompiledShader>,
) -> Result<LinkedStages<'a>, ShaderError> {
    let vertex = expect_stage(vertex, ShaderStage::Vertex)?;
    let fragment = expect_stage(fragment, ShaderStage::Fragment)?;

    let outputs = stage_outputs(vertex);
    for input in stage_inputs(fragment) {
        let Some(output) = outputs.iter().find(|o| o.location == input.location) else {
            return Err(ShaderError::UnmatchedVarying {
                name: input.name,
                location: input.location,
            });
        };
        if output.ty != input.ty {
            return Err(ShaderError::VaryingTypeMismatch {
                location: input.location,
                vertex: output.ty.to_string(),
                fragment: input.ty.to_string(),
            });
        }
    }

    let mut attributes = stage_inputs(vertex)
        .into_iter()
        .map(|input| match input.ty.vertex_format() {
            Some(format) => Ok(VertexAttribute {
                name: input.name,
                location: input.location,
                format,
            }),
            None => Err(ShaderError::UnsupportedAttribute {
                name: input.name,
                ty: input.ty.to_string(),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;
    attributes.sort_by_key(|a| a.location);

    let resources = merge_resources(stage_resources(vertex)?, stage_resources(fragment)?)?;

    Ok(LinkedStages {
        vertex,
        fragment,
        layout: ProgramLayout {
            vertex_entry: vertex.entry_point().to_owned(),
            fragment_entry: fragment.entry_point().to_owned(),
            attributes,
            resources,
        },
    })
}

fn expect_stage(
    shader: Option<&CompiledShader>,
    expected: ShaderStage,
) -> Result<&CompiledShader, ShaderError> {
    let shader = shader.ok_or(ShaderError::MissingStage { stage: expected })?;
    if shader.stage() != expected {
        return Err(ShaderError::WrongStage {
            expected,
            found: shader.stage(),
        });
    }
    Ok(shader)
}

// ── stage interface ───────────────────────────────────────────────────────

/// Scalar or vector type of a user-defined stage input/output.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct IoType {
    kind: ScalarKind,
    width: u8,
    components: u8,
}

impl IoType {
    fn of(inner: &TypeInner) -> Option<Self> {
        match *inner {
            TypeInner::Scalar(scalar) => Some(Self {
                kind: scalar.kind,
                width: scalar.width,
                components: 1,
            }),
            TypeInner::Vector { size, scalar } => Some(Self {
                kind: scalar.kind,
                width: scalar.width,
                components: size as u8,
            }),
            _ => None,
        }
    }

    fn vertex_format(self) -> Option<wgpu::VertexFormat> {
        use wgpu::VertexFormat as V;

        let format = match (self.kind, self.width, self.components) {
            (ScalarKind::Float, 4, 1) => V::Float32,
            (ScalarKind::Float, 4, 2) => V::Float32x2,
            (ScalarKind::Float, 4, 3) => V::Float32x3,
            (ScalarKind::Float, 4, 4) => V::Float32x4,
            (ScalarKind::Uint, 4, 1) => V::Uint32,
            (ScalarKind::Uint, 4, 2) => V::Uint32x2,
            (ScalarKind::Uint, 4, 3) => V::Uint32x3,
            (ScalarKind::Uint, 4, 4) => V::Uint32x4,
            (ScalarKind::Sint, 4, 1) => V::Sint32,
            (ScalarKind::Sint, 4, 2) => V::Sint32x2,
            (ScalarKind::Sint, 4, 3) => V::Sint32x3,
            (ScalarKind::Sint, 4, 4) => V::Sint32x4,
            _ => return None,
        };
        Some(format)
    }
}

impl fmt::Display for IoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scalar = match self.kind {
            ScalarKind::Float => format!("f{}", self.width as u32 * 8),
            ScalarKind::Sint => format!("i{}", self.width as u32 * 8),
            ScalarKind::Uint => format!("u{}", self.width as u32 * 8),
            ScalarKind::Bool => "bool".to_owned(),
            _ => "abstract".to_owned(),
        };
        if self.components == 1 {
            f.write_str(&scalar)
        } else {
            write!(f, "vec{}<{scalar}>", self.components)
        }
    }
}

fn component_kind(format: wgpu::VertexFormat) -> Option<ScalarKind> {
    use wgpu::VertexFormat as V;

    match format {
        V::Float32 | V::Float32x2 | V::Float32x3 | V::Float32x4 => Some(ScalarKind::Float),
        V::Uint32 | V::Uint32x2 | V::Uint32x3 | V::Uint32x4 => Some(ScalarKind::Uint),
        V::Sint32 | V::Sint32x2 | V::Sint32x3 | V::Sint32x4 => Some(ScalarKind::Sint),
        _ => None,
    }
}

#[derive(Debug)]
struct IoVar {
    name: String,
    location: u32,
    ty: IoType,
}

fn stage_inputs(shader: &CompiledShader) -> Vec<IoVar> {
    let module = shader.module();
    let mut vars = Vec::new();
    for arg in &shader.entry().function.arguments {
        collect_io(module, arg.name.as_deref(), arg.ty, arg.binding.as_ref(), &mut vars);
    }
    vars
}

fn stage_outputs(shader: &CompiledShader) -> Vec<IoVar> {
    let module = shader.module();
    let mut vars = Vec::new();
    if let Some(result) = &shader.entry().function.result {
        collect_io(module, None, result.ty, result.binding.as_ref(), &mut vars);
    }
    vars
}

/// Flattens an argument or result into its `@location` bindings.
///
/// Built-ins are skipped; unbound structs are walked member by member.
fn collect_io(
    module: &Module,
    name: Option<&str>,
    ty: Handle<Type>,
    binding: Option<&Binding>,
    out: &mut Vec<IoVar>,
) {
    let inner = &module.types[ty].inner;
    match binding {
        Some(Binding::Location { location, .. }) => {
            if let Some(io_ty) = IoType::of(inner) {
                out.push(IoVar {
                    name: name
                        .map(str::to_owned)
                        .unwrap_or_else(|| format!("location{location}")),
                    location: *location,
                    ty: io_ty,
                });
            }
        }
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = inner {
                for member in members {
                    collect_io(module, member.name.as_deref(), member.ty, member.binding.as_ref(), out);
                }
            }
        }
    }
}

// ── resources ─────────────────────────────────────────────────────────────

/// Bound globals the stage's entry point actually uses.
fn stage_resources(shader: &CompiledShader) -> Result<Vec<Resource>, ShaderError> {
    let module = shader.module();
    let usage = shader.entry_info();
    let mut resources = Vec::new();

    for (handle, var) in module.global_variables.iter() {
        let Some(binding) = &var.binding else {
            continue;
        };
        if usage[handle].is_empty() {
            continue;
        }

        let name = var
            .name
            .clone()
            .unwrap_or_else(|| format!("group{}_binding{}", binding.group, binding.binding));
        let inner = &module.types[var.ty].inner;

        let kind = match *inner {
            TypeInner::Image {
                class: ImageClass::Sampled { .. },
                ..
            } => ResourceKind::Texture,
            TypeInner::Sampler { comparison } => ResourceKind::Sampler { comparison },
            _ if matches!(var.space, AddressSpace::Uniform) => ResourceKind::Uniform {
                size: inner.size(module.to_ctx()),
            },
            _ => {
                return Err(ShaderError::UnsupportedResource {
                    stage: shader.stage(),
                    name,
                })
            }
        };

        let members = match (&kind, inner) {
            (ResourceKind::Uniform { .. }, TypeInner::Struct { members, .. }) => members
                .iter()
                .filter_map(|m| {
                    Some(UniformMember {
                        name: m.name.clone()?,
                        offset: m.offset,
                        size: module.types[m.ty].inner.size(module.to_ctx()),
                    })
                })
                .collect(),
            _ => Vec::new(),
        };

        resources.push(Resource {
            name,
            group: binding.group,
            binding: binding.binding,
            kind,
            members,
        });
    }

    Ok(resources)
}

fn merge_resources(
    vertex: Vec<Resource>,
    fragment: Vec<Resource>,
) -> Result<Vec<Resource>, ShaderError> {
    let mut merged = vertex;

    for resource in fragment {
        let existing = merged
            .iter()
            .find(|r| r.group == resource.group && r.binding == resource.binding);

        match existing {
            Some(existing) if existing.name == resource.name && existing.kind == resource.kind => {}
            Some(existing) => {
                return Err(ShaderError::BindingConflict {
                    group: resource.group,
                    binding: resource.binding,
                    vertex: existing.describe(),
                    fragment: resource.describe(),
                })
            }
            None => merged.push(resource),
        }
    }

    merged.sort_by_key(|r| (r.group, r.binding));
    Ok(merged)
}
