use std::fmt::Debug;

use glam::{Mat4, Quat, Vec3};
use log::{debug, warn};

use palm_asset::{
    animation::{
        AnimationKeyFrame, AnimationKeyFrames, AnimationPath, AnimationSampler, AnimationTrack,
        Interpolate,
    },
    node::DecomposedTransform,
    AssetError, SceneDocument,
};

/// Keys around `time` and the progress between them.
///
/// Before the first key the first interval is used, after the last key the
/// last one, so the progress is clamped to `[0, 1]`. A single key gives a
/// zero length interval.
fn find_keyframe<T: Debug + Clone>(
    time: f32,
    keyframes: &[AnimationKeyFrame<T>],
) -> Option<(f32, &AnimationKeyFrame<T>, &AnimationKeyFrame<T>)> {
    match keyframes.len() {
        0 => None,
        1 => Some((0.0, &keyframes[0], &keyframes[0])),
        len => {
            let next = keyframes
                .partition_point(|keyframe| keyframe.time <= time)
                .clamp(1, len - 1);
            let (current, next) = (&keyframes[next - 1], &keyframes[next]);
            let progress = (time - current.time) / (next.time - current.time);
            let progress = if progress.is_nan() {
                0.0
            } else {
                progress.clamp(0.0, 1.0)
            };
            Some((progress, current, next))
        }
    }
}

pub fn interpolate_frames<T: Debug + Clone + Interpolate>(
    time: f32,
    keyframes: &AnimationKeyFrames<T>,
) -> Option<T> {
    match keyframes {
        AnimationKeyFrames::Linear(vec) => {
            find_keyframe(time, vec).map(|(progress, current, next)| {
                if progress <= 0.0 {
                    current.value.clone()
                } else if progress >= 1.0 {
                    next.value.clone()
                } else {
                    T::linear(current.value.clone(), next.value.clone(), progress)
                }
            })
        }
        AnimationKeyFrames::Step(vec) => find_keyframe(time, vec).map(|(progress, current, next)| {
            if progress >= 1.0 {
                next.value.clone()
            } else {
                current.value.clone()
            }
        }),
        AnimationKeyFrames::CubicSpline(vec) => {
            find_keyframe(time, vec).map(|(progress, current, next)| {
                let (val_cur, out_cur) = (current.value.1.clone(), current.value.2.clone());
                let (in_next, val_next) = (next.value.0.clone(), next.value.1.clone());
                if progress <= 0.0 {
                    val_cur
                } else if progress >= 1.0 {
                    val_next
                } else {
                    T::cubic_spline(
                        val_cur,
                        out_cur,
                        val_next,
                        in_next,
                        progress,
                        next.time - current.time,
                    )
                }
            })
        }
    }
}

/// Scratch space for one evaluation.
#[derive(Debug, Clone)]
pub struct Pose {
    locals: Vec<DecomposedTransform>,
    globals: Vec<Mat4>,
    bones: Vec<Mat4>,
}

impl Pose {
    pub fn globals(&self) -> &[Mat4] {
        &self.globals
    }

    pub fn bones(&self) -> &[Mat4] {
        &self.bones
    }
}

/// Node arena, animation tracks and joint table of one skin, ready to be
/// evaluated at any time.
#[derive(Debug, Clone)]
pub struct Skeleton {
    rest: Vec<DecomposedTransform>,
    rest_matrices: Vec<Mat4>,
    animated: Vec<bool>,
    parents: Vec<Option<usize>>,
    order: Vec<usize>,
    tracks: Vec<AnimationTrack>,
    joints: Vec<usize>,
    inverse_bind_matrices: Vec<Mat4>,
    duration: f32,
}

impl Skeleton {
    pub fn new(
        document: &SceneDocument,
        skin: usize,
        animation: usize,
    ) -> Result<Self, AssetError> {
        let asset = document.animation(animation)?;
        let tracks = (0..asset.channels.len())
            .map(|channel| document.animation_track(animation, channel))
            .collect::<Result<Vec<_>, _>>()?;
        let duration = document.animation_duration(animation)?;
        debug!(
            "Animation #{} ({}) has {} tracks over {:.3}s",
            animation,
            asset.name.as_deref().unwrap_or("unnamed"),
            tracks.len(),
            duration
        );
        Self::with_tracks(document, skin, tracks, duration)
    }

    /// Skeleton driven by already decoded tracks.
    pub fn with_tracks(
        document: &SceneDocument,
        skin: usize,
        tracks: Vec<AnimationTrack>,
        duration: f32,
    ) -> Result<Self, AssetError> {
        let hierarchy = document.hierarchy()?;
        let joints = document.skin(skin)?.joints.clone();
        let inverse_bind_matrices = document.inverse_bind_matrices(skin)?;

        let node_count = document.nodes.len();
        let mut animated = vec![false; node_count];
        let mut targets: Vec<(usize, AnimationPath)> = Vec::with_capacity(tracks.len());
        for track in &tracks {
            document.node(track.target_node)?;
            let target = (track.target_node, track.sampler.path());
            if targets.contains(&target) {
                warn!(
                    "Node #{} has more than one {:?} channel, the last one is used",
                    target.0, target.1
                );
            }
            targets.push(target);
            animated[track.target_node] = true;
        }

        Ok(Self {
            rest: document
                .nodes
                .iter()
                .map(|node| DecomposedTransform::from(node.transform))
                .collect(),
            rest_matrices: document
                .nodes
                .iter()
                .map(|node| Mat4::from(node.transform))
                .collect(),
            animated,
            parents: (0..node_count).map(|node| hierarchy.parent(node)).collect(),
            order: hierarchy.pre_order(document),
            tracks,
            joints,
            inverse_bind_matrices,
            duration: duration.max(0.0),
        })
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn bone_count(&self) -> usize {
        self.joints.len()
    }

    pub fn joints(&self) -> &[usize] {
        &self.joints
    }

    pub fn pose(&self) -> Pose {
        Pose {
            locals: self.rest.clone(),
            globals: vec![Mat4::IDENTITY; self.rest.len()],
            bones: vec![Mat4::IDENTITY; self.joints.len()],
        }
    }

    /// Fill `pose` with global node transforms and bone matrices at `time`.
    pub fn evaluate(&self, time: f32, pose: &mut Pose) {
        pose.locals.clone_from(&self.rest);
        for track in &self.tracks {
            let local = &mut pose.locals[track.target_node];
            match &track.sampler {
                AnimationSampler::Rotation(keyframes) => {
                    if let Some(rotation) = interpolate_frames::<Quat>(time, keyframes) {
                        local.rotation = rotation;
                    }
                }
                AnimationSampler::Translation(keyframes) => {
                    if let Some(translation) = interpolate_frames::<Vec3>(time, keyframes) {
                        local.translation = translation;
                    }
                }
                AnimationSampler::Scale(keyframes) => {
                    if let Some(scale) = interpolate_frames::<Vec3>(time, keyframes) {
                        local.scale = scale;
                    }
                }
            }
        }

        pose.globals.resize(self.rest.len(), Mat4::IDENTITY);
        for &node in &self.order {
            let local = if self.animated[node] {
                Mat4::from(pose.locals[node])
            } else {
                self.rest_matrices[node]
            };
            pose.globals[node] = match self.parents[node] {
                Some(parent) => pose.globals[parent] * local,
                None => local,
            };
        }

        pose.bones.clear();
        pose.bones.extend(
            self.joints
                .iter()
                .zip(&self.inverse_bind_matrices)
                .map(|(&joint, inverse_bind)| pose.globals[joint] * *inverse_bind),
        );
    }

    pub fn bone_matrices(&self, time: f32) -> Vec<Mat4> {
        let mut pose = self.pose();
        self.evaluate(time, &mut pose);
        pose.bones
    }
}
