use glam::{Mat4, Quat, Vec3};
use gltf::{
    buffer::Source,
    json::{
        animation::{Interpolation as GltfInterpolation, Property},
        validation::Checked::{Invalid, Valid},
    },
    mesh::Mode,
    scene::Transform,
    Document, Gltf, Node, Primitive, Semantic,
};
use log::{debug, warn};

use crate::{
    accessor::AccessorAsset,
    animation::{
        AnimationAsset, AnimationChannelAsset, AnimationPath, AnimationSamplerAsset,
        Interpolation,
    },
    document::{BufferViewAsset, SceneAsset, SceneDocument},
    error::AssetError,
    mesh::{MeshAsset, PrimitiveAsset, PrimitiveAssetMode},
    node::{DecomposedTransform, MatrixNodeTransform, NodeAsset, NodeTransform},
    skin::SkinAsset,
};

use super::scheme::Scheme;

/// A parsed `.gltf` or `.glb` file whose binary payload may still live
/// elsewhere.
#[derive(Debug)]
pub struct GltfDocument {
    gltf: Gltf,
}

impl GltfDocument {
    pub fn from_slice(data: &[u8]) -> Result<Self, AssetError> {
        Ok(Self {
            gltf: Gltf::from_slice(data)?,
        })
    }

    /// Path of the payload to fetch from the asset source. `None` when the
    /// payload is embedded as a GLB chunk or a data URI, or when there is no
    /// buffer at all.
    pub fn external_payload(&self) -> Result<Option<&str>, AssetError> {
        let Some(buffer) = self.gltf.buffers().next() else {
            return Ok(None);
        };
        match buffer.source() {
            Source::Bin => Ok(None),
            Source::Uri(uri) => match Scheme::try_from(uri)? {
                Scheme::Data(..) => Ok(None),
                Scheme::Relative(path) | Scheme::Absolute(path) => Ok(Some(path)),
            },
        }
    }

    /// Build the scene document. `external` is the payload fetched for
    /// [`GltfDocument::external_payload`].
    pub fn into_scene_document(
        self,
        external: Option<Vec<u8>>,
    ) -> Result<SceneDocument, AssetError> {
        let Gltf { document, blob } = self.gltf;

        let payload = match document.buffers().next() {
            None => Vec::new(),
            Some(buffer) => match buffer.source() {
                Source::Bin => blob.ok_or(AssetError::MissingPayload)?,
                Source::Uri(uri) => match Scheme::try_from(uri)? {
                    Scheme::Data(_mime, data) => data,
                    Scheme::Relative(_) | Scheme::Absolute(_) => {
                        external.ok_or(AssetError::MissingPayload)?
                    }
                },
            },
        };
        let buffer_count = document.buffers().count();
        if buffer_count > 1 {
            warn!(
                "Document has {} buffers, only buffer #0 is read",
                buffer_count
            );
        }

        let scene_document = SceneDocument {
            nodes: document.nodes().map(load_node).collect(),
            meshes: document
                .meshes()
                .map(|mesh| MeshAsset {
                    name: mesh.name().map(str::to_string),
                    primitives: mesh.primitives().map(load_primitive).collect(),
                })
                .collect(),
            skins: document
                .skins()
                .map(|skin| SkinAsset {
                    name: skin.name().map(str::to_string),
                    joints: skin.joints().map(|joint| joint.index()).collect(),
                    inverse_bind_matrices: skin
                        .inverse_bind_matrices()
                        .map(|accessor| accessor.index()),
                    skeleton: skin.skeleton().map(|node| node.index()),
                })
                .collect(),
            animations: load_animations(&document)?,
            accessors: document
                .accessors()
                .map(|accessor| AccessorAsset {
                    buffer_view: accessor.view().map(|view| view.index()),
                    byte_offset: accessor.offset(),
                    count: accessor.count(),
                    component_type: accessor.data_type().into(),
                    element_type: accessor.dimensions().into(),
                    normalized: accessor.normalized(),
                    sparse: accessor.sparse().is_some(),
                })
                .collect(),
            buffer_views: document
                .views()
                .map(|view| BufferViewAsset {
                    buffer: view.buffer().index(),
                    byte_offset: view.offset(),
                    byte_length: view.length(),
                    byte_stride: view.stride(),
                })
                .collect(),
            scenes: document
                .scenes()
                .map(|scene| SceneAsset {
                    name: scene.name().map(str::to_string),
                    nodes: scene.nodes().map(|node| node.index()).collect(),
                })
                .collect(),
            default_scene: document.default_scene().map(|scene| scene.index()),
            payload,
        };

        debug!(
            "Loaded glTF document: {} nodes, {} meshes, {} skins, {} animations, {} payload bytes",
            scene_document.nodes.len(),
            scene_document.meshes.len(),
            scene_document.skins.len(),
            scene_document.animations.len(),
            scene_document.payload.len()
        );
        Ok(scene_document)
    }
}

fn load_node(node: Node) -> NodeAsset {
    let transform = match node.transform() {
        Transform::Matrix { matrix } => {
            NodeTransform::Matrix(MatrixNodeTransform(Mat4::from_cols_array_2d(&matrix)))
        }
        Transform::Decomposed {
            translation,
            rotation,
            scale,
        } => NodeTransform::Decomposed(DecomposedTransform {
            translation: Vec3::from_array(translation),
            rotation: Quat::from_array(rotation),
            scale: Vec3::from_array(scale),
        }),
    };
    NodeAsset {
        name: node.name().map(str::to_string),
        transform,
        children: node.children().map(|child| child.index()).collect(),
        mesh: node.mesh().map(|mesh| mesh.index()),
        skin: node.skin().map(|skin| skin.index()),
    }
}

fn load_primitive(primitive: Primitive) -> PrimitiveAsset {
    let attribute = |semantic: Semantic| {
        primitive
            .get(&semantic)
            .map(|accessor| accessor.index())
    };
    PrimitiveAsset {
        positions: attribute(Semantic::Positions),
        tex_coords: attribute(Semantic::TexCoords(0)),
        joints: attribute(Semantic::Joints(0)),
        weights: attribute(Semantic::Weights(0)),
        indices: primitive.indices().map(|accessor| accessor.index()),
        mode: match primitive.mode() {
            Mode::Points => PrimitiveAssetMode::Points,
            Mode::Lines => PrimitiveAssetMode::Lines,
            Mode::LineLoop => PrimitiveAssetMode::LineLoop,
            Mode::LineStrip => PrimitiveAssetMode::LineStrip,
            Mode::Triangles => PrimitiveAssetMode::Triangles,
            Mode::TriangleStrip => PrimitiveAssetMode::TriangleStrip,
            Mode::TriangleFan => PrimitiveAssetMode::TriangleFan,
        },
    }
}

// Channels name their sampler by index, which only the JSON keeps.
fn load_animations(document: &Document) -> Result<Vec<AnimationAsset>, AssetError> {
    document
        .as_json()
        .animations
        .iter()
        .enumerate()
        .map(|(index, animation)| {
            let mut channels = Vec::with_capacity(animation.channels.len());
            for channel in &animation.channels {
                let path = match channel.target.path {
                    Valid(Property::Translation) => AnimationPath::Translation,
                    Valid(Property::Rotation) => AnimationPath::Rotation,
                    Valid(Property::Scale) => AnimationPath::Scale,
                    Valid(Property::MorphTargetWeights) | Invalid => {
                        warn!(
                            "Skipping channel of animation #{} targeting morph weights of node #{}",
                            index,
                            channel.target.node.value()
                        );
                        continue;
                    }
                };
                channels.push(AnimationChannelAsset {
                    target_node: channel.target.node.value(),
                    path,
                    sampler: channel.sampler.value(),
                });
            }

            let samplers = animation
                .samplers
                .iter()
                .enumerate()
                .map(|(sampler_index, sampler)| {
                    let interpolation = match sampler.interpolation {
                        Valid(GltfInterpolation::Linear) => Interpolation::Linear,
                        Valid(GltfInterpolation::Step) => Interpolation::Step,
                        Valid(GltfInterpolation::CubicSpline) => Interpolation::CubicSpline,
                        Invalid => {
                            return Err(AssetError::UnsupportedInterpolation {
                                animation: index,
                                sampler: sampler_index,
                            })
                        }
                    };
                    Ok(AnimationSamplerAsset {
                        input: sampler.input.value(),
                        output: sampler.output.value(),
                        interpolation,
                    })
                })
                .collect::<Result<_, _>>()?;

            Ok(AnimationAsset {
                name: animation.name.clone(),
                channels,
                samplers,
            })
        })
        .collect()
}

#[cfg(test)]
mod test {
    use base64::{engine::general_purpose::STANDARD, Engine};

    use super::*;
    use crate::accessor::ElementType;

    fn parse(buffer_uri: Option<&str>) -> GltfDocument {
        GltfDocument::from_slice(document_json(buffer_uri).as_bytes()).unwrap()
    }

    fn document_json(buffer_uri: Option<&str>) -> String {
        let uri = buffer_uri
            .map(|uri| format!(r#","uri":"{}""#, uri))
            .unwrap_or_default();
        format!(
            r#"{{
                "asset": {{ "version": "2.0" }},
                "buffers": [{{ "byteLength": 24{} }}],
                "bufferViews": [{{ "buffer": 0, "byteLength": 24 }}],
                "accessors": [
                    {{ "bufferView": 0, "componentType": 5126, "count": 2, "type": "VEC3" }},
                    {{ "bufferView": 0, "componentType": 5126, "count": 2, "type": "SCALAR" }}
                ],
                "nodes": [
                    {{ "translation": [1.0, 2.0, 3.0], "children": [1] }},
                    {{ "matrix": [2,0,0,0, 0,2,0,0, 0,0,2,0, 0,0,0,1] }}
                ],
                "skins": [{{ "joints": [0, 1] }}],
                "animations": [{{
                    "channels": [
                        {{ "sampler": 0, "target": {{ "node": 1, "path": "scale" }} }},
                        {{ "sampler": 0, "target": {{ "node": 0, "path": "weights" }} }}
                    ],
                    "samplers": [{{ "input": 1, "output": 0, "interpolation": "STEP" }}]
                }}],
                "scenes": [{{ "nodes": [0] }}],
                "scene": 0
            }}"#,
            uri
        )
    }

    fn payload() -> Vec<u8> {
        bytemuck::cast_slice(&[0.0f32, 1.0, 2.0, 3.0, 4.0, 5.0]).to_vec()
    }

    #[test]
    fn test_data_uri_payload_is_embedded() {
        let uri = format!(
            "data:application/octet-stream;base64,{}",
            STANDARD.encode(payload())
        );
        let gltf = parse(Some(&uri));
        assert_eq!(gltf.external_payload().unwrap(), None);
        let document = gltf.into_scene_document(None).unwrap();
        assert_eq!(document.payload, payload());
        assert_eq!(document.nodes[0].children, vec![1]);
        assert_eq!(document.skins[0].joints, vec![0, 1]);
        assert_eq!(document.scene().unwrap().nodes, vec![0]);
        assert_eq!(
            document.read_f32::<3>(0, ElementType::Vec3).unwrap()[1],
            [3.0, 4.0, 5.0]
        );
    }

    #[test]
    fn test_external_payload_is_requested() {
        let gltf = parse(Some("palmier.bin"));
        assert_eq!(gltf.external_payload().unwrap(), Some("palmier.bin"));
        let document = gltf.into_scene_document(Some(payload())).unwrap();
        assert_eq!(document.payload.len(), 24);
    }

    #[test]
    fn test_missing_external_payload_is_rejected() {
        let gltf = parse(Some("palmier.bin"));
        assert!(matches!(
            gltf.into_scene_document(None),
            Err(AssetError::MissingPayload)
        ));
    }

    #[test]
    fn test_glb_blob_is_payload() {
        let mut json = document_json(None).into_bytes();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }
        let bin = payload();
        let total = 12 + 8 + json.len() + 8 + bin.len();
        let mut glb = Vec::new();
        glb.extend_from_slice(b"glTF");
        glb.extend_from_slice(&2u32.to_le_bytes());
        glb.extend_from_slice(&(total as u32).to_le_bytes());
        glb.extend_from_slice(&(json.len() as u32).to_le_bytes());
        glb.extend_from_slice(b"JSON");
        glb.extend_from_slice(&json);
        glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        glb.extend_from_slice(b"BIN\0");
        glb.extend_from_slice(&bin);

        let gltf = GltfDocument::from_slice(&glb).unwrap();
        assert_eq!(gltf.external_payload().unwrap(), None);
        let document = gltf.into_scene_document(None).unwrap();
        assert_eq!(document.payload, bin);
    }

    #[test]
    fn test_node_transforms_and_animation_channels() {
        let gltf = parse(Some("palmier.bin"));
        let document = gltf.into_scene_document(Some(payload())).unwrap();

        let NodeTransform::Decomposed(transform) = document.nodes[0].transform else {
            panic!("expected decomposed transform");
        };
        assert_eq!(transform.translation, Vec3::new(1.0, 2.0, 3.0));
        let matrix: Mat4 = document.nodes[1].transform.into();
        assert_eq!(matrix, Mat4::from_scale(Vec3::splat(2.0)));

        // The morph weight channel is dropped.
        let animation = &document.animations[0];
        assert_eq!(animation.channels.len(), 1);
        assert_eq!(animation.channels[0].path, AnimationPath::Scale);
        assert_eq!(animation.samplers[0].interpolation, Interpolation::Step);
    }

    #[test]
    fn test_unknown_interpolation_is_rejected() {
        let json = document_json(None).replace(r#""STEP""#, r#""SMOOTHSTEP""#);
        assert!(matches!(
            GltfDocument::from_slice(json.as_bytes()),
            Err(AssetError::Gltf(_))
        ));

        let root = gltf::json::Root::from_str(&json).unwrap();
        let document = Document::from_json_without_validation(root);
        assert!(matches!(
            load_animations(&document),
            Err(AssetError::UnsupportedInterpolation {
                animation: 0,
                sampler: 0
            })
        ));
    }
}
