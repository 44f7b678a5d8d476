use glam::{Mat4, Vec3};

/// Centers a model on the origin and fits its largest axis into `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    pub center: Vec3,
    pub scale: f32,
}

impl Default for Normalization {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            scale: 1.0,
        }
    }
}

impl Normalization {
    /// `scale(s) * translate(-center)`
    pub fn model_view(&self) -> Mat4 {
        Mat4::from_scale(Vec3::splat(self.scale)) * Mat4::from_translation(-self.center)
    }
}

pub fn compute_normalization(positions: &[[f32; 3]]) -> Normalization {
    let Some((min, max)) = positions.iter().map(|p| Vec3::from_array(*p)).fold(
        None,
        |bounds: Option<(Vec3, Vec3)>, position| match bounds {
            None => Some((position, position)),
            Some((min, max)) => Some((min.min(position), max.max(position))),
        },
    ) else {
        return Normalization::default();
    };
    let extent = (max - min).max_element();
    Normalization {
        center: (min + max) / 2.0,
        scale: if extent > 0.0 { 2.0 / extent } else { 1.0 },
    }
}
