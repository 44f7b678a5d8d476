use log::warn;

use crate::{
    accessor::{ComponentType, ElementType, TypedData},
    document::SceneDocument,
    error::AssetError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrimitiveAssetMode {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
    TriangleFan,
}

/// Accessor indices of the attributes a skinned primitive reads.
#[derive(Debug, Clone, Default)]
pub struct PrimitiveAsset {
    pub positions: Option<usize>,
    pub tex_coords: Option<usize>,
    pub joints: Option<usize>,
    pub weights: Option<usize>,
    pub indices: Option<usize>,
    pub mode: PrimitiveAssetMode,
}

#[derive(Debug, Clone, Default)]
pub struct MeshAsset {
    pub name: Option<String>,
    pub primitives: Vec<PrimitiveAsset>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Indices {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl Indices {
    pub fn len(&self) -> usize {
        match self {
            Indices::U16(indices) => indices.len(),
            Indices::U32(indices) => indices.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = u32> + '_> {
        match self {
            Indices::U16(indices) => Box::new(indices.iter().map(|&index| index as u32)),
            Indices::U32(indices) => Box::new(indices.iter().copied()),
        }
    }
}

/// CPU side vertex streams of one skinned primitive, checked against the
/// skin it is drawn with.
#[derive(Debug, Clone)]
pub struct SkinnedPrimitive {
    pub positions: Vec<[f32; 3]>,
    pub joints: Vec<[u32; 4]>,
    pub weights: Vec<[f32; 4]>,
    pub tex_coords: Vec<[f32; 2]>,
    pub indices: Indices,
}

impl SkinnedPrimitive {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

fn check_count(
    attribute: &'static str,
    expected: usize,
    actual: usize,
) -> Result<(), AssetError> {
    if expected != actual {
        return Err(AssetError::AttributeCountMismatch {
            attribute,
            expected,
            actual,
        });
    }
    Ok(())
}

impl SceneDocument {
    pub fn skinned_primitive(
        &self,
        mesh: usize,
        primitive: usize,
        bone_count: usize,
    ) -> Result<SkinnedPrimitive, AssetError> {
        let primitive = self
            .mesh(mesh)?
            .primitives
            .get(primitive)
            .ok_or(AssetError::InvalidIndex {
                kind: "primitive",
                index: primitive,
            })?;
        if primitive.mode != PrimitiveAssetMode::Triangles {
            return Err(AssetError::UnsupportedPrimitiveMode(format!(
                "{:?}",
                primitive.mode
            )));
        }

        let positions_accessor = primitive
            .positions
            .ok_or(AssetError::MissingAttribute("POSITION"))?;
        let indices_accessor = primitive
            .indices
            .ok_or(AssetError::MissingAttribute("indices"))?;
        let joints_accessor = primitive
            .joints
            .ok_or(AssetError::MissingAttribute("JOINTS_0"))?;
        let weights_accessor = primitive
            .weights
            .ok_or(AssetError::MissingAttribute("WEIGHTS_0"))?;

        let positions = self.read_f32::<3>(positions_accessor, ElementType::Vec3)?;
        let vertex_count = positions.len();

        let joints = self.read_u32::<4>(joints_accessor, ElementType::Vec4)?;
        check_count("JOINTS_0", vertex_count, joints.len())?;
        for (vertex, joints) in joints.iter().enumerate() {
            if let Some(&joint) = joints.iter().find(|&&joint| joint as usize >= bone_count) {
                return Err(AssetError::JointOutOfRange {
                    vertex,
                    joint,
                    bone_count,
                });
            }
        }

        let weights = self.read_f32::<4>(weights_accessor, ElementType::Vec4)?;
        check_count("WEIGHTS_0", vertex_count, weights.len())?;

        let tex_coords = match primitive.tex_coords {
            Some(accessor) => {
                let tex_coords = self.read_f32::<2>(accessor, ElementType::Vec2)?;
                check_count("TEXCOORD_0", vertex_count, tex_coords.len())?;
                tex_coords
            }
            None => {
                warn!("Primitive has no TEXCOORD_0, sampling texel (0, 0)");
                vec![[0.0; 2]; vertex_count]
            }
        };

        let view = self.resolve(indices_accessor)?;
        if view.element_type != ElementType::Scalar {
            return Err(AssetError::BadElementType {
                accessor: indices_accessor,
                expected: ElementType::Scalar,
                actual: view.element_type,
            });
        }
        let indices = match view.data {
            TypedData::U8(data) => Indices::U16(data.into_iter().map(u16::from).collect()),
            TypedData::U16(data) => Indices::U16(data),
            TypedData::U32(data) => Indices::U32(data),
            TypedData::F32(_) => {
                return Err(AssetError::UnsupportedComponentType {
                    accessor: indices_accessor,
                    component_type: ComponentType::F32,
                })
            }
        };
        if let Some(index) = indices.iter().find(|&index| index as usize >= vertex_count) {
            return Err(AssetError::VertexIndexOutOfRange {
                index,
                vertex_count,
            });
        }

        Ok(SkinnedPrimitive {
            positions,
            joints,
            weights,
            tex_coords,
            indices,
        })
    }
}
