use std::mem::size_of;

use bytemuck::Pod;
use wgpu::{
    vertex_attr_array, BufferAddress, VertexAttribute, VertexBufferLayout, VertexStepMode,
};

/// One attribute per buffer, bound at the slot matching its location.
pub trait VertexStream {
    type Element: Pod;
    const ATTRIBS: &'static [VertexAttribute];

    fn desc() -> VertexBufferLayout<'static> {
        VertexBufferLayout {
            array_stride: size_of::<Self::Element>() as BufferAddress,
            step_mode: VertexStepMode::Vertex,
            attributes: Self::ATTRIBS,
        }
    }
}

pub struct PositionStream;

impl VertexStream for PositionStream {
    type Element = [f32; 3];
    const ATTRIBS: &'static [VertexAttribute] = &vertex_attr_array![0 => Float32x3];
}

pub struct JointStream;

impl VertexStream for JointStream {
    type Element = [u32; 4];
    const ATTRIBS: &'static [VertexAttribute] = &vertex_attr_array![1 => Uint32x4];
}

pub struct WeightStream;

impl VertexStream for WeightStream {
    type Element = [f32; 4];
    const ATTRIBS: &'static [VertexAttribute] = &vertex_attr_array![2 => Float32x4];
}

pub struct TexCoordStream;

impl VertexStream for TexCoordStream {
    type Element = [f32; 2];
    const ATTRIBS: &'static [VertexAttribute] = &vertex_attr_array![3 => Float32x2];
}

pub fn skinned_vertex_layouts() -> [VertexBufferLayout<'static>; 4] {
    [
        PositionStream::desc(),
        JointStream::desc(),
        WeightStream::desc(),
        TexCoordStream::desc(),
    ]
}

#[cfg(test)]
mod test {
    use wgpu::VertexFormat;

    use super::*;

    #[test]
    fn test_stream_layouts() {
        let layouts = skinned_vertex_layouts();
        let expected = [
            (12, VertexFormat::Float32x3),
            (16, VertexFormat::Uint32x4),
            (16, VertexFormat::Float32x4),
            (8, VertexFormat::Float32x2),
        ];
        for (location, (layout, (stride, format))) in layouts.iter().zip(expected).enumerate() {
            assert_eq!(layout.array_stride, stride);
            assert_eq!(layout.step_mode, VertexStepMode::Vertex);
            assert_eq!(layout.attributes.len(), 1);
            assert_eq!(layout.attributes[0].shader_location, location as u32);
            assert_eq!(layout.attributes[0].offset, 0);
            assert_eq!(layout.attributes[0].format, format);
        }
    }
}
