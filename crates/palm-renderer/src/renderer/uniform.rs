use std::mem::size_of;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// Binding 0: model-view then projection, column major.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable, Default)]
pub struct FrameUniform {
    pub model_view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}

impl FrameUniform {
    pub const SIZE: u64 = size_of::<FrameUniform>() as u64;

    pub fn new(model_view: &Mat4, projection: &Mat4) -> Self {
        Self {
            model_view: model_view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
        }
    }
}

/// Bytes per bone matrix in the storage buffer.
pub const BONE_MATRIX_SIZE: u64 = size_of::<[f32; 16]>() as u64;
