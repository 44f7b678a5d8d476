use glam::Mat4;
use wgpu::Color;

/// Orthographic box the normalized model is drawn into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthographicProjection {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for OrthographicProjection {
    fn default() -> Self {
        Self {
            left: -1.0,
            right: 1.0,
            bottom: -1.0,
            top: 1.0,
            near: -5.0,
            far: 5.0,
        }
    }
}

impl OrthographicProjection {
    /// Right handed, depth mapped to `[0, 1]`.
    pub fn matrix(&self) -> Mat4 {
        Mat4::orthographic_rh(
            self.left,
            self.right,
            self.bottom,
            self.top,
            self.near,
            self.far,
        )
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub mesh: usize,
    pub primitive: usize,
    pub skin: usize,
    pub animation: usize,
    pub alpha_cutoff: f32,
    pub projection: OrthographicProjection,
    pub max_consecutive_failures: u32,
    pub clear_color: Color,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mesh: 0,
            primitive: 0,
            skin: 0,
            animation: 0,
            alpha_cutoff: 0.1,
            projection: OrthographicProjection::default(),
            max_consecutive_failures: 120,
            clear_color: Color::TRANSPARENT,
        }
    }
}
