use std::error::Error;

use wgpu::{BufferUsages, Color, FilterMode, IndexFormat};

use palm_asset::texture::ImageAsset;

use crate::renderer::pipeline::PipelineDescriptor;

mod depth_texture;

/// Recording backend for tests without a GPU.
#[cfg(any(test, feature = "recording"))]
pub mod recording;

/// wgpu backend presenting to a window surface.
pub mod surface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferDescriptor<'a> {
    pub label: &'a str,
    pub usage: BufferUsages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerDescriptor<'a> {
    pub label: &'a str,
    pub mag_filter: FilterMode,
    pub min_filter: FilterMode,
}

/// Bindings of group 0, in binding order.
pub struct BindGroupResources<'a, B: GraphicsBackend + ?Sized> {
    pub uniforms: &'a B::Buffer,
    pub bones: &'a B::Buffer,
    pub texture: &'a B::Texture,
    pub sampler: &'a B::Sampler,
}

/// One render pass with a single indexed draw.
pub struct DrawCall<'a, B: GraphicsBackend + ?Sized> {
    pub pipeline: &'a B::Pipeline,
    pub bind_group: &'a B::BindGroup,
    pub vertex_buffers: [&'a B::Buffer; 4],
    pub index_buffer: &'a B::Buffer,
    pub index_format: IndexFormat,
    pub index_count: u32,
    pub clear_color: Color,
}

/// The handful of GPU operations a session needs.
pub trait GraphicsBackend {
    type Buffer;
    type Texture;
    type Sampler;
    type Pipeline;
    type BindGroup;
    type Error: Error + Send + Sync + 'static;

    fn create_buffer_init(
        &mut self,
        descriptor: &BufferDescriptor,
        contents: &[u8],
    ) -> Result<Self::Buffer, Self::Error>;

    fn create_buffer(
        &mut self,
        descriptor: &BufferDescriptor,
        size: u64,
    ) -> Result<Self::Buffer, Self::Error>;

    /// `Rgba8Unorm` texture holding the image.
    fn create_texture(
        &mut self,
        label: &str,
        image: &ImageAsset,
    ) -> Result<Self::Texture, Self::Error>;

    fn create_sampler(
        &mut self,
        descriptor: &SamplerDescriptor,
    ) -> Result<Self::Sampler, Self::Error>;

    fn create_pipeline(
        &mut self,
        descriptor: &PipelineDescriptor,
    ) -> Result<Self::Pipeline, Self::Error>;

    fn create_bind_group(
        &mut self,
        label: &str,
        pipeline: &Self::Pipeline,
        resources: &BindGroupResources<Self>,
    ) -> Result<Self::BindGroup, Self::Error>;

    /// Overwrite part of a buffer. Writing past its end is an error.
    fn write_buffer(
        &mut self,
        buffer: &Self::Buffer,
        offset: u64,
        data: &[u8],
    ) -> Result<(), Self::Error>;

    /// Clear color and depth (to 1.0), draw, and present.
    fn submit(&mut self, draw: &DrawCall<Self>) -> Result<(), Self::Error>;
}
