use std::borrow::Cow;

use crate::report;

use super::compile::{load_shader, ShaderStage};
use super::error::ShaderError;
use super::link::{link_program, LinkedStages, ProgramLayout, UniformLocation, VertexInput};
use super::CompiledShader;

/// Render targets a program's pipeline is built for.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ProgramTargets {
    pub color_format: wgpu::TextureFormat,
    /// Depth attachment format; depth testing uses `LessEqual` when present.
    pub depth_format: Option<wgpu::TextureFormat>,
}

/// A linked shader pair usable for drawing.
///
/// Wraps the render pipeline together with the reflected interface used to
/// resolve attribute and uniform locations. Vertex attributes are fed from one
/// vertex buffer each, in location order (see [`Program::vertex_slot`]).
pub struct Program {
    layout: ProgramLayout,
    pipeline: wgpu::RenderPipeline,
}

impl Program {
    /// Links two compiled stages into a render pipeline.
    pub fn link(
        device: &wgpu::Device,
        vertex: Option<&CompiledShader>,
        fragment: Option<&CompiledShader>,
        targets: ProgramTargets,
    ) -> Result<Self, ShaderError> {
        Self::link_with_inputs(device, vertex, fragment, targets, &[])
    }

    /// Like [`Program::link`], reading the listed vertex inputs with the
    /// formats the caller's buffers hold (see [`ProgramLayout::with_vertex_inputs`]).
    pub fn link_with_inputs(
        device: &wgpu::Device,
        vertex: Option<&CompiledShader>,
        fragment: Option<&CompiledShader>,
        targets: ProgramTargets,
        inputs: &[VertexInput],
    ) -> Result<Self, ShaderError> {
        let mut linked = link_program(vertex, fragment)?;
        linked.layout = linked.layout.with_vertex_inputs(inputs)?;
        let pipeline = create_pipeline(device, &linked, targets);

        Ok(Self {
            layout: linked.layout,
            pipeline,
        })
    }

    pub fn layout(&self) -> &ProgramLayout {
        &self.layout
    }

    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    /// See [`ProgramLayout::attrib_location`].
    pub fn attrib_location(&self, name: &str) -> Option<u32> {
        self.layout.attrib_location(name)
    }

    /// See [`ProgramLayout::uniform_location`].
    pub fn uniform_location(&self, name: &str) -> Option<UniformLocation> {
        self.layout.uniform_location(name)
    }

    /// See [`ProgramLayout::vertex_slot`].
    pub fn vertex_slot(&self, location: u32) -> Option<u32> {
        self.layout.vertex_slot(location)
    }
}

/// Compiles and links a program from WGSL sources.
///
/// Compile failures are written to the console and the failed stage is
/// dropped, so linking then fails too. A link failure raises an alert with the
/// link log and yields `None`. There is no retry and no fallback program.
pub fn init_shader_program(
    device: &wgpu::Device,
    vs_source: &str,
    fs_source: &str,
    targets: ProgramTargets,
) -> Option<Program> {
    init_shader_program_with_inputs(device, vs_source, fs_source, targets, &[])
}

/// [`init_shader_program`] for callers whose vertex data formats differ from
/// the shader's declared input types.
pub fn init_shader_program_with_inputs(
    device: &wgpu::Device,
    vs_source: &str,
    fs_source: &str,
    targets: ProgramTargets,
    inputs: &[VertexInput],
) -> Option<Program> {
    let vertex = load_shader(ShaderStage::Vertex, vs_source);
    let fragment = load_shader(ShaderStage::Fragment, fs_source);

    match Program::link_with_inputs(device, vertex.as_ref(), fragment.as_ref(), targets, inputs) {
        Ok(program) => {
            log::debug!(
                "linked program: {} attributes, {} resources",
                program.layout.attributes().len(),
                program.layout.resources().len()
            );
            Some(program)
        }
        Err(err) => {
            report::alert(&format!("Unable to initialize the shader program: {err}"));
            None
        }
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    linked: &LinkedStages<'_>,
    targets: ProgramTargets,
) -> wgpu::RenderPipeline {
    let vertex_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("wgl vertex shader"),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(linked.vertex.source())),
    });
    let fragment_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("wgl fragment shader"),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(linked.fragment.source())),
    });

    // One buffer per attribute, in location order.
    let attributes: Vec<wgpu::VertexAttribute> = linked
        .layout
        .attributes()
        .iter()
        .map(|a| wgpu::VertexAttribute {
            format: a.format,
            offset: 0,
            shader_location: a.location,
        })
        .collect();
    let buffers: Vec<wgpu::VertexBufferLayout<'_>> = attributes
        .iter()
        .map(|a| wgpu::VertexBufferLayout {
            array_stride: a.format.size(),
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: std::slice::from_ref(a),
        })
        .collect();

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("wgl program pipeline"),
        // Derived from the shaders; bind group layouts come back through
        // `get_bind_group_layout`.
        layout: None,

        vertex: wgpu::VertexState {
            module: &vertex_module,
            entry_point: Some(linked.layout.vertex_entry()),
            compilation_options: Default::default(),
            buffers: &buffers,
        },

        fragment: Some(wgpu::FragmentState {
            module: &fragment_module,
            entry_point: Some(linked.layout.fragment_entry()),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: targets.color_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),

        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },

        depth_stencil: targets.depth_format.map(|format| wgpu::DepthStencilState {
            format,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),

        multiview_mask: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::test_support;
    use crate::report::capture;
    use crate::shader::{TEXTURED_FRAGMENT_SHADER, TEXTURED_VERTEX_SHADER};

    fn targets() -> ProgramTargets {
        ProgramTargets {
            color_format: wgpu::TextureFormat::Rgba8UnormSrgb,
            depth_format: Some(wgpu::TextureFormat::Depth24Plus),
        }
    }

    #[test]
    fn valid_sources_produce_a_program() {
        let Some(gpu) = test_support::device() else { return };
        let program = init_shader_program(
            gpu.device(),
            TEXTURED_VERTEX_SHADER,
            TEXTURED_FRAGMENT_SHADER,
            targets(),
        )
        .expect("program should link");
        assert_eq!(program.attrib_location("aTextureCoord"), Some(1));
        assert_eq!(program.vertex_slot(1), Some(1));
    }

    #[test]
    fn broken_fragment_shader_produces_no_program() {
        let Some(gpu) = test_support::device() else { return };
        let broken = "@fragment fn main() -> @location(0) vec4<f32> { return vec4<f32>(; }";
        let (program, records) = capture::records(|| {
            init_shader_program(gpu.device(), TEXTURED_VERTEX_SHADER, broken, targets())
        });
        assert!(program.is_none());

        let compiled = capture::position(
            &records,
            report::CONSOLE_TARGET,
            "An error occurred compiling the shaders",
        );
        let linked = capture::position(
            &records,
            report::ALERT_TARGET,
            "Unable to initialize the shader program",
        );
        assert!(compiled.is_some() && linked.is_some(), "{records:?}");
        assert!(compiled < linked);
    }

    #[test]
    fn vec4_position_links_with_vec3_data() {
        let Some(gpu) = test_support::device() else { return };
        let vs = r#"
            @group(0) @binding(0) var<uniform> uProjectionMatrix: mat4x4<f32>;
            @group(0) @binding(1) var<uniform> uModelViewMatrix: mat4x4<f32>;

            @vertex
            fn main(@location(0) aVertexPosition: vec4<f32>) -> @builtin(position) vec4<f32> {
                return uProjectionMatrix * uModelViewMatrix * aVertexPosition;
            }
        "#;
        let fs = "@fragment fn main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }";
        let inputs = [VertexInput {
            name: "aVertexPosition",
            format: wgpu::VertexFormat::Float32x3,
        }];
        let program = init_shader_program_with_inputs(gpu.device(), vs, fs, targets(), &inputs)
            .expect("program should link");
        assert_eq!(
            program.layout().attributes()[0].format,
            wgpu::VertexFormat::Float32x3
        );
    }

    #[test]
    fn broken_fragment_shader_fails_before_touching_the_device() {
        // The same failure, observed through the typed path without a GPU.
        let vertex = load_shader(ShaderStage::Vertex, TEXTURED_VERTEX_SHADER);
        let fragment = load_shader(ShaderStage::Fragment, "@fragment fn main( {");
        assert!(fragment.is_none());
        let err = link_program(vertex.as_ref(), fragment.as_ref()).unwrap_err();
        assert!(err.to_string().contains("no compiled fragment shader"));
    }
}
