use crate::shader::{Program, ProgramLayout, UniformLocation};

pub const VERTEX_POSITION: &str = "aVertexPosition";
pub const TEXTURE_COORD: &str = "aTextureCoord";
pub const PROJECTION_MATRIX: &str = "uProjectionMatrix";
pub const MODEL_VIEW_MATRIX: &str = "uModelViewMatrix";
pub const SAMPLER: &str = "uSampler";

/// Vertex input locations. `None` when the program has no such input.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct AttribLocations {
    pub vertex_position: Option<u32>,
    pub texture_coord: Option<u32>,
}

impl AttribLocations {
    pub fn resolve(layout: &ProgramLayout) -> Self {
        Self {
            vertex_position: layout.attrib_location(VERTEX_POSITION),
            texture_coord: layout.attrib_location(TEXTURE_COORD),
        }
    }
}

/// Uniform locations. `None` when the program does not use the uniform.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct UniformLocations {
    pub projection_matrix: Option<UniformLocation>,
    pub model_view_matrix: Option<UniformLocation>,
    pub sampler: Option<UniformLocation>,
}

impl UniformLocations {
    pub fn resolve(layout: &ProgramLayout) -> Self {
        Self {
            projection_matrix: layout.uniform_location(PROJECTION_MATRIX),
            model_view_matrix: layout.uniform_location(MODEL_VIEW_MATRIX),
            sampler: layout.uniform_location(SAMPLER),
        }
    }
}

/// A linked program together with its looked-up locations.
///
/// Locations are resolved once, at construction, and never change. Names the
/// program does not use resolve to `None`; nothing downstream is forced to
/// check them.
pub struct ProgramInfo {
    program: Program,
    attrib_locations: AttribLocations,
    uniform_locations: UniformLocations,
}

impl ProgramInfo {
    pub fn new(program: Program) -> Self {
        let attrib_locations = AttribLocations::resolve(program.layout());
        let uniform_locations = UniformLocations::resolve(program.layout());
        log::debug!("program info: {attrib_locations:?} {uniform_locations:?}");

        Self {
            program,
            attrib_locations,
            uniform_locations,
        }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn attrib_locations(&self) -> AttribLocations {
        self.attrib_locations
    }

    pub fn uniform_locations(&self) -> UniformLocations {
        self.uniform_locations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::{
        compile_shader, link_program, ShaderStage, TEXTURED_FRAGMENT_SHADER,
        TEXTURED_VERTEX_SHADER,
    };

    fn layout_of(vs: &str, fs: &str) -> ProgramLayout {
        let v = compile_shader(ShaderStage::Vertex, vs).unwrap();
        let f = compile_shader(ShaderStage::Fragment, fs).unwrap();
        link_program(Some(&v), Some(&f)).unwrap().layout
    }

    #[test]
    fn textured_program_resolves_everything() {
        let layout = layout_of(TEXTURED_VERTEX_SHADER, TEXTURED_FRAGMENT_SHADER);

        let attribs = AttribLocations::resolve(&layout);
        assert_eq!(attribs.vertex_position, Some(0));
        assert_eq!(attribs.texture_coord, Some(1));

        let uniforms = UniformLocations::resolve(&layout);
        assert_eq!(
            uniforms.projection_matrix,
            Some(UniformLocation { group: 0, binding: 0, offset: 0 })
        );
        assert_eq!(
            uniforms.model_view_matrix,
            Some(UniformLocation { group: 0, binding: 1, offset: 0 })
        );
        assert_eq!(
            uniforms.sampler,
            Some(UniformLocation { group: 0, binding: 2, offset: 0 })
        );
    }

    #[test]
    fn missing_names_stay_unresolved() {
        let layout = layout_of(
            r#"
            @vertex
            fn main(@location(0) aVertexPosition: vec3<f32>) -> @builtin(position) vec4<f32> {
                return vec4<f32>(aVertexPosition, 1.0);
            }
            "#,
            r#"
            @fragment
            fn main() -> @location(0) vec4<f32> { return vec4<f32>(0.0, 0.0, 1.0, 1.0); }
            "#,
        );

        let attribs = AttribLocations::resolve(&layout);
        assert_eq!(attribs.vertex_position, Some(0));
        assert_eq!(attribs.texture_coord, None);
        assert_eq!(UniformLocations::resolve(&layout), UniformLocations::default());
    }

    #[test]
    fn matrices_inside_a_uniform_struct_get_offsets() {
        let layout = layout_of(
            r#"
            struct Matrices {
                uProjectionMatrix: mat4x4<f32>,
                uModelViewMatrix: mat4x4<f32>,
            };
            @group(0) @binding(0) var<uniform> matrices: Matrices;

            @vertex
            fn main(@location(0) aVertexPosition: vec4<f32>) -> @builtin(position) vec4<f32> {
                return matrices.uProjectionMatrix * matrices.uModelViewMatrix * aVertexPosition;
            }
            "#,
            r#"
            @fragment
            fn main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }
            "#,
        );

        let uniforms = UniformLocations::resolve(&layout);
        assert_eq!(uniforms.projection_matrix.map(|l| l.offset), Some(0));
        assert_eq!(uniforms.model_view_matrix.map(|l| l.offset), Some(64));
        assert_eq!(uniforms.sampler, None);
    }
}
