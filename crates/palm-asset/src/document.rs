use crate::{
    accessor::AccessorAsset, animation::AnimationAsset, error::AssetError, mesh::MeshAsset,
    node::NodeAsset, skin::SkinAsset,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferViewAsset {
    pub buffer: usize,
    pub byte_offset: usize,
    pub byte_length: usize,
    pub byte_stride: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct SceneAsset {
    pub name: Option<String>,
    pub nodes: Vec<usize>,
}

/// A parsed scene with its binary payload.
///
/// Every cross reference is an index into one of the vectors here, so the
/// node tree is an arena and never holds pointers to itself.
#[derive(Debug, Clone, Default)]
pub struct SceneDocument {
    pub nodes: Vec<NodeAsset>,
    pub meshes: Vec<MeshAsset>,
    pub skins: Vec<SkinAsset>,
    pub animations: Vec<AnimationAsset>,
    pub accessors: Vec<AccessorAsset>,
    pub buffer_views: Vec<BufferViewAsset>,
    pub scenes: Vec<SceneAsset>,
    pub default_scene: Option<usize>,
    pub payload: Vec<u8>,
}

/// Parent links of the node arena, checked to form a forest.
#[derive(Debug, Clone)]
pub struct Hierarchy {
    parents: Vec<Option<usize>>,
    roots: Vec<usize>,
}

impl Hierarchy {
    pub fn parent(&self, node: usize) -> Option<usize> {
        self.parents.get(node).copied().flatten()
    }

    /// Scene roots first, then every other parentless node.
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// Pre-order walk over every node, parents always before children.
    pub fn pre_order(&self, document: &SceneDocument) -> Vec<usize> {
        let mut order = Vec::with_capacity(document.nodes.len());
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            order.push(node);
            stack.extend(document.nodes[node].children.iter().rev().copied());
        }
        order
    }
}

impl SceneDocument {
    pub fn scene(&self) -> Option<&SceneAsset> {
        self.default_scene
            .and_then(|index| self.scenes.get(index))
            .or_else(|| self.scenes.first())
    }

    pub fn node(&self, index: usize) -> Result<&NodeAsset, AssetError> {
        self.nodes.get(index).ok_or(AssetError::InvalidIndex {
            kind: "node",
            index,
        })
    }

    pub fn mesh(&self, index: usize) -> Result<&MeshAsset, AssetError> {
        self.meshes.get(index).ok_or(AssetError::InvalidIndex {
            kind: "mesh",
            index,
        })
    }

    pub fn skin(&self, index: usize) -> Result<&SkinAsset, AssetError> {
        self.skins.get(index).ok_or(AssetError::InvalidIndex {
            kind: "skin",
            index,
        })
    }

    pub fn animation(&self, index: usize) -> Result<&AnimationAsset, AssetError> {
        self.animations.get(index).ok_or(AssetError::InvalidIndex {
            kind: "animation",
            index,
        })
    }

    /// Build the parent table, rejecting shared children and cycles.
    pub fn hierarchy(&self) -> Result<Hierarchy, AssetError> {
        let mut parents = vec![None; self.nodes.len()];
        for (index, node) in self.nodes.iter().enumerate() {
            for &child in &node.children {
                if child >= self.nodes.len() {
                    return Err(AssetError::InvalidIndex {
                        kind: "node",
                        index: child,
                    });
                }
                if child == index || parents[child].is_some() {
                    return Err(AssetError::InvalidHierarchy(child));
                }
                parents[child] = Some(index);
            }
        }

        // With single parents, a cycle is a loop of nodes no root can reach.
        for start in 0..self.nodes.len() {
            let mut current = start;
            let mut steps = 0;
            while let Some(parent) = parents[current] {
                current = parent;
                steps += 1;
                if steps > self.nodes.len() {
                    return Err(AssetError::InvalidHierarchy(start));
                }
            }
        }

        let mut roots = Vec::new();
        if let Some(scene) = self.scene() {
            for &node in &scene.nodes {
                self.node(node)?;
                if parents[node].is_none() && !roots.contains(&node) {
                    roots.push(node);
                }
            }
        }
        for (node, parent) in parents.iter().enumerate() {
            if parent.is_none() && !roots.contains(&node) {
                roots.push(node);
            }
        }

        Ok(Hierarchy { parents, roots })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn document_with_children(children: &[&[usize]]) -> SceneDocument {
        SceneDocument {
            nodes: children
                .iter()
                .map(|children| NodeAsset {
                    children: children.to_vec(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_pre_order_visits_parents_first() {
        let mut document = document_with_children(&[&[2], &[], &[1, 3], &[]]);
        document.scenes.push(SceneAsset {
            name: None,
            nodes: vec![0],
        });
        let hierarchy = document.hierarchy().unwrap();
        assert_eq!(hierarchy.roots(), &[0]);
        assert_eq!(hierarchy.parent(3), Some(2));
        assert_eq!(hierarchy.pre_order(&document), vec![0, 2, 1, 3]);
    }

    #[test]
    fn test_nodes_outside_scene_become_roots() {
        let mut document = document_with_children(&[&[], &[], &[0]]);
        document.scenes.push(SceneAsset {
            name: None,
            nodes: vec![1],
        });
        let hierarchy = document.hierarchy().unwrap();
        assert_eq!(hierarchy.roots(), &[1, 2]);
        assert_eq!(hierarchy.pre_order(&document), vec![1, 2, 0]);
    }

    #[test]
    fn test_cycle_is_rejected() {
        let document = document_with_children(&[&[1], &[2], &[0]]);
        assert!(matches!(
            document.hierarchy(),
            Err(AssetError::InvalidHierarchy(_))
        ));
    }

    #[test]
    fn test_shared_child_is_rejected() {
        let document = document_with_children(&[&[2], &[2], &[]]);
        assert!(matches!(
            document.hierarchy(),
            Err(AssetError::InvalidHierarchy(2))
        ));
    }
}
