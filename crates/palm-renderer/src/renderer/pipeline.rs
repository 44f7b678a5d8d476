use wgpu::{
    BindGroupLayoutEntry, BindingType, BlendComponent, BlendFactor, BlendOperation, BlendState,
    BufferBindingType, CompareFunction, DepthBiasState, DepthStencilState, FrontFace,
    PolygonMode, PrimitiveState, PrimitiveTopology, SamplerBindingType, ShaderStages,
    StencilState, TextureFormat, TextureSampleType, TextureViewDimension, VertexBufferLayout,
};

use super::vertex::skinned_vertex_layouts;

pub const DEPTH_TEXTURE_FORMAT: TextureFormat = TextureFormat::Depth24Plus;

pub const SKIN_SHADER: &str = include_str!("../shader/skin.wgsl");

/// Name of the overridable fragment cutoff in the skin shader.
pub const ALPHA_CUTOFF_CONSTANT: &str = "alpha_cutoff";

/// Everything about the pipeline except the color target format, which
/// belongs to the surface.
#[derive(Debug, Clone)]
pub struct PipelineDescriptor<'a> {
    pub label: &'a str,
    pub shader_source: &'a str,
    pub vertex_entry_name: &'a str,
    pub fragment_entry_name: &'a str,
    pub vertex_buffers: [VertexBufferLayout<'static>; 4],
    pub bindings: [BindGroupLayoutEntry; 4],
    pub primitive: PrimitiveState,
    pub depth_stencil: DepthStencilState,
    pub blend: BlendState,
    pub alpha_cutoff: f32,
}

fn buffer_entry(binding: u32, ty: BufferBindingType) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding,
        visibility: ShaderStages::VERTEX,
        ty: BindingType::Buffer {
            ty,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

impl PipelineDescriptor<'static> {
    pub fn skinned(alpha_cutoff: f32) -> Self {
        Self {
            label: "Skinned pipeline",
            shader_source: SKIN_SHADER,
            vertex_entry_name: "vs_main",
            fragment_entry_name: "fs_main",
            vertex_buffers: skinned_vertex_layouts(),
            bindings: [
                buffer_entry(0, BufferBindingType::Uniform),
                buffer_entry(1, BufferBindingType::Storage { read_only: true }),
                BindGroupLayoutEntry {
                    binding: 2,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Texture {
                        sample_type: TextureSampleType::Float { filterable: true },
                        view_dimension: TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 3,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Sampler(SamplerBindingType::Filtering),
                    count: None,
                },
            ],
            primitive: PrimitiveState {
                topology: PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: DepthStencilState {
                format: DEPTH_TEXTURE_FORMAT,
                depth_write_enabled: true,
                depth_compare: CompareFunction::Less,
                stencil: StencilState::default(),
                bias: DepthBiasState::default(),
            },
            // Straight alpha in, premultiplied out.
            blend: BlendState {
                color: BlendComponent {
                    src_factor: BlendFactor::SrcAlpha,
                    dst_factor: BlendFactor::OneMinusSrcAlpha,
                    operation: BlendOperation::Add,
                },
                alpha: BlendComponent {
                    src_factor: BlendFactor::One,
                    dst_factor: BlendFactor::OneMinusSrcAlpha,
                    operation: BlendOperation::Add,
                },
            },
            alpha_cutoff,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_skinned_pipeline_state() {
        let descriptor = PipelineDescriptor::skinned(0.1);
        assert_eq!(descriptor.primitive.topology, PrimitiveTopology::TriangleList);
        assert_eq!(descriptor.primitive.cull_mode, None);
        assert_eq!(descriptor.depth_stencil.format, TextureFormat::Depth24Plus);
        assert!(descriptor.depth_stencil.depth_write_enabled);
        assert_eq!(descriptor.depth_stencil.depth_compare, CompareFunction::Less);
        assert_eq!(descriptor.blend, BlendState::ALPHA_BLENDING);
        assert_eq!(descriptor.alpha_cutoff, 0.1);

        let bindings: Vec<u32> = descriptor.bindings.iter().map(|entry| entry.binding).collect();
        assert_eq!(bindings, [0, 1, 2, 3]);
        assert!(matches!(
            descriptor.bindings[1].ty,
            BindingType::Buffer {
                ty: BufferBindingType::Storage { read_only: true },
                ..
            }
        ));
    }

    #[test]
    fn test_shader_declares_bindings() {
        for needle in [
            "fn vs_main",
            "fn fs_main",
            "override alpha_cutoff",
            "@binding(0)",
            "@binding(3)",
        ] {
            assert!(SKIN_SHADER.contains(needle), "missing {}", needle);
        }
    }
}
