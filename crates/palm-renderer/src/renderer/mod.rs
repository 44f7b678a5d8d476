use bytemuck::{bytes_of, cast_slice};
use glam::Mat4;
use log::{debug, trace};
use wgpu::{BufferUsages, Color, FilterMode, IndexFormat};

use palm_asset::{
    mesh::{Indices, SkinnedPrimitive},
    texture::ImageAsset,
};

use crate::{
    backend::{
        BindGroupResources, BufferDescriptor, DrawCall, GraphicsBackend, SamplerDescriptor,
    },
    error::RenderError,
};

use pipeline::PipelineDescriptor;
use uniform::{FrameUniform, BONE_MATRIX_SIZE};

pub mod pipeline;
pub mod uniform;
pub mod vertex;

/// GPU side of one skinned primitive. Only the uniform and bone buffers
/// change after creation.
pub struct RenderResourceSet<B: GraphicsBackend> {
    positions: B::Buffer,
    joints: B::Buffer,
    weights: B::Buffer,
    tex_coords: B::Buffer,
    indices: B::Buffer,
    index_format: IndexFormat,
    index_count: u32,
    uniforms: B::Buffer,
    bones: B::Buffer,
    bone_count: usize,
    // Kept alive for the bind group.
    #[allow(unused)]
    texture: B::Texture,
    #[allow(unused)]
    sampler: B::Sampler,
    pipeline: B::Pipeline,
    bind_group: B::BindGroup,
    clear_color: Color,
}

impl<B: GraphicsBackend> RenderResourceSet<B> {
    pub fn new(
        backend: &mut B,
        primitive: &SkinnedPrimitive,
        image: &ImageAsset,
        bone_count: usize,
        alpha_cutoff: f32,
        clear_color: Color,
    ) -> Result<Self, B::Error> {
        let vertex = |label| BufferDescriptor {
            label,
            usage: BufferUsages::VERTEX,
        };
        let positions =
            backend.create_buffer_init(&vertex("Position buffer"), cast_slice(&primitive.positions))?;
        let joints =
            backend.create_buffer_init(&vertex("Joint buffer"), cast_slice(&primitive.joints))?;
        let weights =
            backend.create_buffer_init(&vertex("Weight buffer"), cast_slice(&primitive.weights))?;
        let tex_coords = backend
            .create_buffer_init(&vertex("Tex coord buffer"), cast_slice(&primitive.tex_coords))?;

        let index_descriptor = BufferDescriptor {
            label: "Index buffer",
            usage: BufferUsages::INDEX,
        };
        let (indices, index_format) = match &primitive.indices {
            Indices::U16(data) => (
                backend.create_buffer_init(&index_descriptor, cast_slice(data))?,
                IndexFormat::Uint16,
            ),
            Indices::U32(data) => (
                backend.create_buffer_init(&index_descriptor, cast_slice(data))?,
                IndexFormat::Uint32,
            ),
        };

        let uniforms = backend.create_buffer(
            &BufferDescriptor {
                label: "Frame uniform buffer",
                usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            },
            FrameUniform::SIZE,
        )?;
        let bones = backend.create_buffer(
            &BufferDescriptor {
                label: "Bone matrix buffer",
                usage: BufferUsages::STORAGE | BufferUsages::COPY_DST,
            },
            bone_count as u64 * BONE_MATRIX_SIZE,
        )?;

        let texture = backend.create_texture("Base color texture", image)?;
        let sampler = backend.create_sampler(&SamplerDescriptor {
            label: "Base color sampler",
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
        })?;
        let pipeline = backend.create_pipeline(&PipelineDescriptor::skinned(alpha_cutoff))?;
        let bind_group = backend.create_bind_group(
            "Skinned bind group",
            &pipeline,
            &BindGroupResources {
                uniforms: &uniforms,
                bones: &bones,
                texture: &texture,
                sampler: &sampler,
            },
        )?;

        debug!(
            "Uploaded {} vertices, {} indices ({:?}), {} bones, {}x{} texture",
            primitive.vertex_count(),
            primitive.indices.len(),
            index_format,
            bone_count,
            image.width(),
            image.height()
        );

        Ok(Self {
            positions,
            joints,
            weights,
            tex_coords,
            indices,
            index_format,
            index_count: primitive.indices.len() as u32,
            uniforms,
            bones,
            bone_count,
            texture,
            sampler,
            pipeline,
            bind_group,
            clear_color,
        })
    }

    pub fn bone_count(&self) -> usize {
        self.bone_count
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Overwrite the frame uniform and every bone matrix in place.
    pub fn update_dynamic_buffers(
        &self,
        backend: &mut B,
        model_view: &Mat4,
        projection: &Mat4,
        bones: &[Mat4],
    ) -> Result<(), RenderError> {
        if bones.len() != self.bone_count {
            return Err(RenderError::BoneCountMismatch {
                expected: self.bone_count,
                actual: bones.len(),
            });
        }
        let uniform = FrameUniform::new(model_view, projection);
        backend
            .write_buffer(&self.uniforms, 0, bytes_of(&uniform))
            .map_err(RenderError::frame_write)?;

        let bone_data: Vec<[f32; 16]> = bones.iter().map(Mat4::to_cols_array).collect();
        trace!("Writing {} bone matrices", bone_data.len());
        backend
            .write_buffer(&self.bones, 0, cast_slice(&bone_data))
            .map_err(RenderError::frame_write)
    }

    /// Clear and draw every index once.
    pub fn draw(&self, backend: &mut B) -> Result<(), RenderError> {
        backend
            .submit(&DrawCall {
                pipeline: &self.pipeline,
                bind_group: &self.bind_group,
                vertex_buffers: [&self.positions, &self.joints, &self.weights, &self.tex_coords],
                index_buffer: &self.indices,
                index_format: self.index_format,
                index_count: self.index_count,
                clear_color: self.clear_color,
            })
            .map_err(RenderError::frame_write)
    }
}
