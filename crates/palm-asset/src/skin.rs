use glam::Mat4;

use crate::{document::SceneDocument, error::AssetError};

#[derive(Debug, Clone, Default)]
pub struct SkinAsset {
    pub name: Option<String>,
    /// Node indices, in joint order.
    pub joints: Vec<usize>,
    pub inverse_bind_matrices: Option<usize>,
    pub skeleton: Option<usize>,
}

impl SceneDocument {
    /// One inverse bind matrix per joint. A skin without the accessor binds
    /// every joint with the identity.
    pub fn inverse_bind_matrices(&self, index: usize) -> Result<Vec<Mat4>, AssetError> {
        let skin = self.skin(index)?;
        if skin.joints.is_empty() {
            return Err(AssetError::EmptySkin(index));
        }
        for &joint in &skin.joints {
            self.node(joint)?;
        }

        let Some(accessor) = skin.inverse_bind_matrices else {
            return Ok(vec![Mat4::IDENTITY; skin.joints.len()]);
        };
        let matrices = self.read_mat4(accessor)?;
        if matrices.len() != skin.joints.len() {
            return Err(AssetError::InverseBindMatrixCount {
                skin: index,
                expected: skin.joints.len(),
                actual: matrices.len(),
            });
        }
        Ok(matrices)
    }
}
