use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use glam::Mat4;
use log::{debug, info};

use palm_asset::{loader::gltf::GltfDocument, source::AssetSource};

use crate::{
    animation::{Pose, Skeleton},
    backend::GraphicsBackend,
    bounds::{compute_normalization, Normalization},
    config::SessionConfig,
    error::RenderError,
    renderer::RenderResourceSet,
};

/// Shared teardown flag between the host and a session.
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    detached: Arc<AtomicBool>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn detach(&self) {
        self.detached.store(true, Ordering::Release);
    }

    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::Acquire)
    }

    fn check(&self) -> Result<(), RenderError> {
        if self.is_detached() {
            debug!("Detached while loading");
            Err(RenderError::Detached)
        } else {
            Ok(())
        }
    }
}

fn asset_source(error: impl std::error::Error + Send + Sync + 'static) -> RenderError {
    RenderError::AssetSource(Box::new(error))
}

/// Everything needed to draw frames of one loaded model.
pub struct RenderSession<B: GraphicsBackend> {
    skeleton: Skeleton,
    pose: Pose,
    resources: RenderResourceSet<B>,
    normalization: Normalization,
    model_view: Mat4,
    projection: Mat4,
    lifecycle: Lifecycle,
}

impl<B: GraphicsBackend> RenderSession<B> {
    /// Fetch, validate and upload. Nothing reaches the backend unless the
    /// whole document checks out.
    pub async fn load<S: AssetSource>(
        source: &S,
        backend: &mut B,
        config: &SessionConfig,
        lifecycle: Lifecycle,
    ) -> Result<Self, RenderError> {
        lifecycle.check()?;
        let data = source.scene_document().await.map_err(asset_source)?;
        lifecycle.check()?;

        let document = GltfDocument::from_slice(&data)?;
        let external = match document.external_payload()?.map(str::to_string) {
            Some(uri) => {
                debug!("Fetching payload {}", uri);
                let payload = source.binary_payload(&uri).await.map_err(asset_source)?;
                lifecycle.check()?;
                Some(payload)
            }
            None => None,
        };
        let document = document.into_scene_document(external)?;

        let image = source.texture_image().await.map_err(asset_source)?;
        lifecycle.check()?;

        let skeleton = Skeleton::new(&document, config.skin, config.animation)?;
        let primitive =
            document.skinned_primitive(config.mesh, config.primitive, skeleton.bone_count())?;
        let normalization = compute_normalization(&primitive.positions);

        let resources = RenderResourceSet::new(
            backend,
            &primitive,
            &image,
            skeleton.bone_count(),
            config.alpha_cutoff,
            config.clear_color,
        )
        .map_err(RenderError::backend)?;

        info!(
            "Loaded {} vertices, {} triangles, {} bones, {:.3}s animation, center {}, scale {}",
            primitive.vertex_count(),
            primitive.indices.len() / 3,
            skeleton.bone_count(),
            skeleton.duration(),
            normalization.center,
            normalization.scale
        );

        Ok(Self {
            pose: skeleton.pose(),
            skeleton,
            resources,
            normalization,
            model_view: normalization.model_view(),
            projection: config.projection.matrix(),
            lifecycle,
        })
    }

    pub fn duration(&self) -> f32 {
        self.skeleton.duration()
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn normalization(&self) -> &Normalization {
        &self.normalization
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn is_detached(&self) -> bool {
        self.lifecycle.is_detached()
    }

    /// Bone matrices of the last drawn or attempted frame.
    pub fn bones(&self) -> &[Mat4] {
        self.pose.bones()
    }

    /// Pose the model at `time` seconds and draw it.
    pub fn render_frame(&mut self, backend: &mut B, time: f32) -> Result<(), RenderError> {
        self.skeleton.evaluate(time, &mut self.pose);
        self.resources.update_dynamic_buffers(
            backend,
            &self.model_view,
            &self.projection,
            self.pose.bones(),
        )?;
        self.resources.draw(backend)
    }
}
