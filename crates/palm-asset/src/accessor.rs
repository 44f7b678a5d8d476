use std::array;

use glam::Mat4;
use gltf::accessor::{DataType, Dimensions};

use crate::{document::SceneDocument, error::AssetError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentType {
    I8,
    U8,
    I16,
    U16,
    U32,
    F32,
}

impl ComponentType {
    pub fn size(self) -> usize {
        match self {
            ComponentType::I8 | ComponentType::U8 => 1,
            ComponentType::I16 | ComponentType::U16 => 2,
            ComponentType::U32 | ComponentType::F32 => 4,
        }
    }
}

impl From<DataType> for ComponentType {
    fn from(value: DataType) -> Self {
        match value {
            DataType::I8 => ComponentType::I8,
            DataType::U8 => ComponentType::U8,
            DataType::I16 => ComponentType::I16,
            DataType::U16 => ComponentType::U16,
            DataType::U32 => ComponentType::U32,
            DataType::F32 => ComponentType::F32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl ElementType {
    /// Number of components in one element.
    pub fn arity(self) -> usize {
        match self {
            ElementType::Scalar => 1,
            ElementType::Vec2 => 2,
            ElementType::Vec3 => 3,
            ElementType::Vec4 => 4,
            ElementType::Mat2 => 4,
            ElementType::Mat3 => 9,
            ElementType::Mat4 => 16,
        }
    }
}

impl From<Dimensions> for ElementType {
    fn from(value: Dimensions) -> Self {
        match value {
            Dimensions::Scalar => ElementType::Scalar,
            Dimensions::Vec2 => ElementType::Vec2,
            Dimensions::Vec3 => ElementType::Vec3,
            Dimensions::Vec4 => ElementType::Vec4,
            Dimensions::Mat2 => ElementType::Mat2,
            Dimensions::Mat3 => ElementType::Mat3,
            Dimensions::Mat4 => ElementType::Mat4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessorAsset {
    /// Without a view, every element reads as zero.
    pub buffer_view: Option<usize>,
    pub byte_offset: usize,
    pub count: usize,
    pub component_type: ComponentType,
    pub element_type: ElementType,
    pub normalized: bool,
    pub sparse: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedData {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    F32(Vec<f32>),
}

/// Tightly packed, decoded elements of one accessor.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedView {
    pub element_type: ElementType,
    pub count: usize,
    pub normalized: bool,
    pub data: TypedData,
}

impl TypedView {
    pub fn component_type(&self) -> ComponentType {
        match self.data {
            TypedData::U8(_) => ComponentType::U8,
            TypedData::U16(_) => ComponentType::U16,
            TypedData::U32(_) => ComponentType::U32,
            TypedData::F32(_) => ComponentType::F32,
        }
    }

    /// Components as floats. Normalized integers are mapped into [0, 1].
    pub fn to_f32(&self) -> Vec<f32> {
        match &self.data {
            TypedData::F32(data) => data.clone(),
            TypedData::U8(data) if self.normalized => {
                data.iter().map(|&value| value as f32 / 255.0).collect()
            }
            TypedData::U16(data) if self.normalized => {
                data.iter().map(|&value| value as f32 / 65535.0).collect()
            }
            TypedData::U32(data) if self.normalized => data
                .iter()
                .map(|&value| (value as f64 / u32::MAX as f64) as f32)
                .collect(),
            TypedData::U8(data) => data.iter().map(|&value| value as f32).collect(),
            TypedData::U16(data) => data.iter().map(|&value| value as f32).collect(),
            TypedData::U32(data) => data.iter().map(|&value| value as f32).collect(),
        }
    }

    /// Components widened to `u32`, or `None` for float data.
    pub fn to_u32(&self) -> Option<Vec<u32>> {
        match &self.data {
            TypedData::U8(data) => Some(data.iter().map(|&value| value as u32).collect()),
            TypedData::U16(data) => Some(data.iter().map(|&value| value as u32).collect()),
            TypedData::U32(data) => Some(data.clone()),
            TypedData::F32(_) => None,
        }
    }
}

fn chunk<T: Copy, const N: usize>(data: &[T]) -> Vec<[T; N]> {
    data.chunks_exact(N)
        .map(|item| array::from_fn(|index| item[index]))
        .collect()
}

impl SceneDocument {
    pub fn accessor(&self, index: usize) -> Result<&AccessorAsset, AssetError> {
        self.accessors.get(index).ok_or(AssetError::InvalidIndex {
            kind: "accessor",
            index,
        })
    }

    /// Copy the elements of an accessor out of the payload, honoring the
    /// view stride, and decode them as little endian.
    pub fn resolve(&self, index: usize) -> Result<TypedView, AssetError> {
        let accessor = self.accessor(index)?;
        if accessor.sparse {
            return Err(AssetError::SparseAccessor(index));
        }
        let element_size = accessor.component_type.size() * accessor.element_type.arity();

        let bytes = match accessor.buffer_view {
            Some(view) => self.element_bytes(index, accessor, view, element_size)?,
            None => vec![0; element_size * accessor.count],
        };

        let data = match accessor.component_type {
            ComponentType::U8 => TypedData::U8(bytes),
            ComponentType::U16 => TypedData::U16(
                chunk(&bytes)
                    .into_iter()
                    .map(u16::from_le_bytes)
                    .collect(),
            ),
            ComponentType::U32 => TypedData::U32(
                chunk(&bytes)
                    .into_iter()
                    .map(u32::from_le_bytes)
                    .collect(),
            ),
            ComponentType::F32 => TypedData::F32(
                chunk(&bytes)
                    .into_iter()
                    .map(f32::from_le_bytes)
                    .collect(),
            ),
            component_type @ (ComponentType::I8 | ComponentType::I16) => {
                return Err(AssetError::UnsupportedComponentType {
                    accessor: index,
                    component_type,
                })
            }
        };

        Ok(TypedView {
            element_type: accessor.element_type,
            count: accessor.count,
            normalized: accessor.normalized,
            data,
        })
    }

    fn element_bytes(
        &self,
        index: usize,
        accessor: &AccessorAsset,
        view_index: usize,
        element_size: usize,
    ) -> Result<Vec<u8>, AssetError> {
        let view = self
            .buffer_views
            .get(view_index)
            .ok_or(AssetError::InvalidIndex {
                kind: "buffer view",
                index: view_index,
            })?;
        if view.buffer != 0 {
            return Err(AssetError::UnsupportedBuffer {
                view: view_index,
                buffer: view.buffer,
            });
        }
        let view_end = view.byte_offset.saturating_add(view.byte_length);
        if view_end > self.payload.len() {
            return Err(AssetError::BufferViewOutOfBounds {
                view: view_index,
                end: view_end,
                payload_length: self.payload.len(),
            });
        }
        let view_bytes = &self.payload[view.byte_offset..view_end];

        let stride = view.byte_stride.unwrap_or(element_size);
        if stride < element_size {
            return Err(AssetError::BadStride {
                accessor: index,
                stride,
                element_size,
            });
        }
        if accessor.count == 0 {
            return Ok(Vec::new());
        }

        let accessor_end = stride
            .checked_mul(accessor.count - 1)
            .and_then(|span| span.checked_add(accessor.byte_offset))
            .and_then(|start| start.checked_add(element_size))
            .unwrap_or(usize::MAX);
        if accessor_end > view.byte_length {
            return Err(AssetError::AccessorOutOfBounds {
                accessor: index,
                end: accessor_end,
                view_length: view.byte_length,
            });
        }

        let mut bytes = Vec::with_capacity(element_size * accessor.count);
        for element in 0..accessor.count {
            let start = accessor.byte_offset + element * stride;
            bytes.extend_from_slice(&view_bytes[start..start + element_size]);
        }
        Ok(bytes)
    }

    fn resolve_checked(
        &self,
        index: usize,
        element_type: ElementType,
    ) -> Result<TypedView, AssetError> {
        let view = self.resolve(index)?;
        if view.element_type != element_type {
            return Err(AssetError::BadElementType {
                accessor: index,
                expected: element_type,
                actual: view.element_type,
            });
        }
        Ok(view)
    }

    /// Read an accessor as `N` floats per element.
    pub fn read_f32<const N: usize>(
        &self,
        index: usize,
        element_type: ElementType,
    ) -> Result<Vec<[f32; N]>, AssetError> {
        debug_assert_eq!(element_type.arity(), N);
        let view = self.resolve_checked(index, element_type)?;
        Ok(chunk(&view.to_f32()))
    }

    /// Read an integer accessor as `N` widened components per element.
    pub fn read_u32<const N: usize>(
        &self,
        index: usize,
        element_type: ElementType,
    ) -> Result<Vec<[u32; N]>, AssetError> {
        debug_assert_eq!(element_type.arity(), N);
        let view = self.resolve_checked(index, element_type)?;
        let data = view
            .to_u32()
            .ok_or(AssetError::UnsupportedComponentType {
                accessor: index,
                component_type: ComponentType::F32,
            })?;
        Ok(chunk(&data))
    }

    pub fn read_scalar_f32(&self, index: usize) -> Result<Vec<f32>, AssetError> {
        Ok(self.resolve_checked(index, ElementType::Scalar)?.to_f32())
    }

    pub fn read_mat4(&self, index: usize) -> Result<Vec<Mat4>, AssetError> {
        Ok(self
            .read_f32::<16>(index, ElementType::Mat4)?
            .iter()
            .map(Mat4::from_cols_array)
            .collect())
    }
}
