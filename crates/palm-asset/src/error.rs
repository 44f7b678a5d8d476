use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

use crate::{
    accessor::{ComponentType, ElementType},
    loader::scheme::SchemeError,
};

/// Every way a scene document can be unfit for rendering.
#[derive(Debug)]
pub enum AssetError {
    Gltf(gltf::Error),
    InvalidScheme(SchemeError),
    InvalidIndex {
        kind: &'static str,
        index: usize,
    },
    UnsupportedBuffer {
        view: usize,
        buffer: usize,
    },
    MissingPayload,
    BufferViewOutOfBounds {
        view: usize,
        end: usize,
        payload_length: usize,
    },
    AccessorOutOfBounds {
        accessor: usize,
        end: usize,
        view_length: usize,
    },
    BadStride {
        accessor: usize,
        stride: usize,
        element_size: usize,
    },
    SparseAccessor(usize),
    UnsupportedComponentType {
        accessor: usize,
        component_type: ComponentType,
    },
    BadElementType {
        accessor: usize,
        expected: ElementType,
        actual: ElementType,
    },
    UnsupportedPrimitiveMode(String),
    MissingAttribute(&'static str),
    AttributeCountMismatch {
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },
    JointOutOfRange {
        vertex: usize,
        joint: u32,
        bone_count: usize,
    },
    VertexIndexOutOfRange {
        index: u32,
        vertex_count: usize,
    },
    EmptySkin(usize),
    InverseBindMatrixCount {
        skin: usize,
        expected: usize,
        actual: usize,
    },
    KeyframeCountMismatch {
        sampler: usize,
        input: usize,
        output: usize,
    },
    NonIncreasingKeyframes {
        sampler: usize,
    },
    UnsupportedInterpolation {
        animation: usize,
        sampler: usize,
    },
    InvalidHierarchy(usize),
    BadImageSize {
        width: u32,
        height: u32,
        length: usize,
    },
}

impl Display for AssetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::Gltf(error) => Display::fmt(error, f),
            AssetError::InvalidScheme(error) => Display::fmt(error, f),
            AssetError::InvalidIndex { kind, index } => {
                write!(f, "Reference to missing {} #{}", kind, index)
            }
            AssetError::UnsupportedBuffer { view, buffer } => write!(
                f,
                "Buffer view #{} references buffer #{}, only buffer #0 is supported",
                view, buffer
            ),
            AssetError::MissingPayload => write!(f, "Document has no binary payload"),
            AssetError::BufferViewOutOfBounds {
                view,
                end,
                payload_length,
            } => write!(
                f,
                "Buffer view #{} ends at byte {}, but payload is {} bytes",
                view, end, payload_length
            ),
            AssetError::AccessorOutOfBounds {
                accessor,
                end,
                view_length,
            } => write!(
                f,
                "Accessor #{} ends at byte {}, but its buffer view is {} bytes",
                accessor, end, view_length
            ),
            AssetError::BadStride {
                accessor,
                stride,
                element_size,
            } => write!(
                f,
                "Accessor #{} has stride {} smaller than its element size {}",
                accessor, stride, element_size
            ),
            AssetError::SparseAccessor(accessor) => {
                write!(f, "Sparse accessor #{} is not supported", accessor)
            }
            AssetError::UnsupportedComponentType {
                accessor,
                component_type,
            } => write!(
                f,
                "Unsupported component type {:?} in accessor #{}",
                component_type, accessor
            ),
            AssetError::BadElementType {
                accessor,
                expected,
                actual,
            } => write!(
                f,
                "Bad element type of accessor #{}: expected {:?}, but got {:?}",
                accessor, expected, actual
            ),
            AssetError::UnsupportedPrimitiveMode(mode) => {
                write!(f, "Unsupported primitive mode: {}", mode)
            }
            AssetError::MissingAttribute(attribute) => {
                write!(f, "Primitive is missing required attribute {}", attribute)
            }
            AssetError::AttributeCountMismatch {
                attribute,
                expected,
                actual,
            } => write!(
                f,
                "Attribute {} has {} elements, expected {}",
                attribute, actual, expected
            ),
            AssetError::JointOutOfRange {
                vertex,
                joint,
                bone_count,
            } => write!(
                f,
                "Vertex #{} references joint {}, but skin has {} joints",
                vertex, joint, bone_count
            ),
            AssetError::VertexIndexOutOfRange {
                index,
                vertex_count,
            } => write!(
                f,
                "Index {} out of range of {} vertices",
                index, vertex_count
            ),
            AssetError::EmptySkin(skin) => write!(f, "Skin #{} has no joints", skin),
            AssetError::InverseBindMatrixCount {
                skin,
                expected,
                actual,
            } => write!(
                f,
                "Skin #{} has {} inverse bind matrices for {} joints",
                skin, actual, expected
            ),
            AssetError::KeyframeCountMismatch {
                sampler,
                input,
                output,
            } => write!(
                f,
                "Animation sampler #{} has {} keyframe times but {} values",
                sampler, input, output
            ),
            AssetError::NonIncreasingKeyframes { sampler } => write!(
                f,
                "Keyframe times of animation sampler #{} are not strictly increasing",
                sampler
            ),
            AssetError::UnsupportedInterpolation { animation, sampler } => write!(
                f,
                "Sampler #{} of animation #{} has an unknown interpolation",
                sampler, animation
            ),
            AssetError::InvalidHierarchy(node) => {
                write!(f, "Node #{} has more than one parent or forms a cycle", node)
            }
            AssetError::BadImageSize {
                width,
                height,
                length,
            } => write!(
                f,
                "Image of {}x{} can't hold {} bytes of RGBA pixels",
                width, height, length
            ),
        }
    }
}

impl Error for AssetError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AssetError::Gltf(error) => Some(error),
            AssetError::InvalidScheme(error) => Some(error),
            _ => None,
        }
    }
}

impl From<gltf::Error> for AssetError {
    fn from(value: gltf::Error) -> Self {
        AssetError::Gltf(value)
    }
}

impl From<SchemeError> for AssetError {
    fn from(value: SchemeError) -> Self {
        AssetError::InvalidScheme(value)
    }
}
