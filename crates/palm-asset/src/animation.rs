use std::fmt::Debug;

use glam::{Quat, Vec3};

use crate::{accessor::ElementType, document::SceneDocument, error::AssetError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationPath {
    Translation,
    Rotation,
    Scale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    #[default]
    Linear,
    Step,
    CubicSpline,
}

#[derive(Debug, Clone)]
pub struct AnimationChannelAsset {
    pub target_node: usize,
    pub path: AnimationPath,
    pub sampler: usize,
}

#[derive(Debug, Clone)]
pub struct AnimationSamplerAsset {
    pub input: usize,
    pub output: usize,
    pub interpolation: Interpolation,
}

#[derive(Debug, Clone, Default)]
pub struct AnimationAsset {
    pub name: Option<String>,
    pub channels: Vec<AnimationChannelAsset>,
    pub samplers: Vec<AnimationSamplerAsset>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationKeyFrame<T: Debug + Clone> {
    pub time: f32,
    pub value: T,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnimationKeyFrames<T: Debug + Clone> {
    Linear(Vec<AnimationKeyFrame<T>>),
    Step(Vec<AnimationKeyFrame<T>>),
    // in, val, out
    CubicSpline(Vec<AnimationKeyFrame<(T, T, T)>>),
}

impl<T: Debug + Clone> AnimationKeyFrames<T> {
    pub fn len(&self) -> usize {
        match self {
            AnimationKeyFrames::Linear(keyframes) => keyframes.len(),
            AnimationKeyFrames::Step(keyframes) => keyframes.len(),
            AnimationKeyFrames::CubicSpline(keyframes) => keyframes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Time of the last key.
    pub fn length(&self) -> f32 {
        match self {
            AnimationKeyFrames::Linear(keyframes) | AnimationKeyFrames::Step(keyframes) => {
                keyframes.last().map(|keyframe| keyframe.time)
            }
            AnimationKeyFrames::CubicSpline(keyframes) => {
                keyframes.last().map(|keyframe| keyframe.time)
            }
        }
        .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnimationSampler {
    Rotation(AnimationKeyFrames<Quat>),
    Translation(AnimationKeyFrames<Vec3>),
    Scale(AnimationKeyFrames<Vec3>),
}

impl AnimationSampler {
    pub fn length(&self) -> f32 {
        match self {
            AnimationSampler::Rotation(keyframes) => keyframes.length(),
            AnimationSampler::Translation(keyframes) => keyframes.length(),
            AnimationSampler::Scale(keyframes) => keyframes.length(),
        }
    }

    pub fn path(&self) -> AnimationPath {
        match self {
            AnimationSampler::Rotation(_) => AnimationPath::Rotation,
            AnimationSampler::Translation(_) => AnimationPath::Translation,
            AnimationSampler::Scale(_) => AnimationPath::Scale,
        }
    }
}

/// A channel with its keyframes decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationTrack {
    pub target_node: usize,
    pub sampler: AnimationSampler,
}

pub trait Interpolate: Sized {
    fn linear(a: Self, b: Self, t: f32) -> Self;
    fn cubic_spline(vk: Self, bk: Self, vk_1: Self, ak_1: Self, t: f32, td: f32) -> Self;
}

fn hermite_weights(t: f32, td: f32) -> [f32; 4] {
    let t2 = t * t;
    let t3 = t2 * t;
    [
        2.0 * t3 - 3.0 * t2 + 1.0,
        td * (t3 - 2.0 * t2 + t),
        -2.0 * t3 + 3.0 * t2,
        td * (t3 - t2),
    ]
}

impl Interpolate for Vec3 {
    fn linear(a: Self, b: Self, t: f32) -> Self {
        a.lerp(b, t)
    }

    fn cubic_spline(vk: Self, bk: Self, vk_1: Self, ak_1: Self, t: f32, td: f32) -> Self {
        let [first, second, third, forth] = hermite_weights(t, td);
        vk * first + bk * second + vk_1 * third + ak_1 * forth
    }
}

impl Interpolate for Quat {
    /// Shortest arc spherical interpolation.
    fn linear(a: Self, b: Self, t: f32) -> Self {
        a.slerp(b, t)
    }

    fn cubic_spline(vk: Self, bk: Self, vk_1: Self, ak_1: Self, t: f32, td: f32) -> Self {
        let [first, second, third, forth] = hermite_weights(t, td);
        (vk * first + bk * second + vk_1 * third + ak_1 * forth).normalize()
    }
}

fn build_keyframes<T: Debug + Clone>(
    times: Vec<f32>,
    values: Vec<T>,
    interpolation: Interpolation,
) -> AnimationKeyFrames<T> {
    match interpolation {
        Interpolation::Linear => AnimationKeyFrames::Linear(
            times
                .into_iter()
                .zip(values)
                .map(|(time, value)| AnimationKeyFrame { time, value })
                .collect(),
        ),
        Interpolation::Step => AnimationKeyFrames::Step(
            times
                .into_iter()
                .zip(values)
                .map(|(time, value)| AnimationKeyFrame { time, value })
                .collect(),
        ),
        Interpolation::CubicSpline => AnimationKeyFrames::CubicSpline(
            times
                .into_iter()
                .zip(values.chunks_exact(3))
                .map(|(time, chunk)| AnimationKeyFrame {
                    time,
                    value: (chunk[0].clone(), chunk[1].clone(), chunk[2].clone()),
                })
                .collect(),
        ),
    }
}

impl SceneDocument {
    fn keyframe_times(
        &self,
        sampler_index: usize,
        accessor: usize,
    ) -> Result<Vec<f32>, AssetError> {
        let times = self.read_scalar_f32(accessor)?;
        let increasing = times.iter().all(|time| time.is_finite())
            && times.windows(2).all(|pair| pair[0] < pair[1]);
        if !increasing {
            return Err(AssetError::NonIncreasingKeyframes {
                sampler: sampler_index,
            });
        }
        Ok(times)
    }

    /// Decode the keyframes a channel points at, checking that times
    /// strictly increase and that every key has a value.
    pub fn animation_track(
        &self,
        animation: usize,
        channel: usize,
    ) -> Result<AnimationTrack, AssetError> {
        let animation = self.animation(animation)?;
        let channel = animation
            .channels
            .get(channel)
            .ok_or(AssetError::InvalidIndex {
                kind: "animation channel",
                index: channel,
            })?;
        self.node(channel.target_node)?;
        let sampler_index = channel.sampler;
        let sampler = animation
            .samplers
            .get(sampler_index)
            .ok_or(AssetError::InvalidIndex {
                kind: "animation sampler",
                index: sampler_index,
            })?;

        let times = self.keyframe_times(sampler_index, sampler.input)?;
        let values_per_key = match sampler.interpolation {
            Interpolation::CubicSpline => 3,
            Interpolation::Linear | Interpolation::Step => 1,
        };

        let check_count = |output: usize| {
            if times.is_empty() || output != times.len() * values_per_key {
                Err(AssetError::KeyframeCountMismatch {
                    sampler: sampler_index,
                    input: times.len(),
                    output,
                })
            } else {
                Ok(())
            }
        };

        let sampler = match channel.path {
            AnimationPath::Rotation => {
                let values = self.read_f32::<4>(sampler.output, ElementType::Vec4)?;
                check_count(values.len())?;
                let values = values.into_iter().map(Quat::from_array).collect();
                AnimationSampler::Rotation(build_keyframes(times, values, sampler.interpolation))
            }
            AnimationPath::Translation => {
                let values = self.read_f32::<3>(sampler.output, ElementType::Vec3)?;
                check_count(values.len())?;
                let values = values.into_iter().map(Vec3::from_array).collect();
                AnimationSampler::Translation(build_keyframes(
                    times,
                    values,
                    sampler.interpolation,
                ))
            }
            AnimationPath::Scale => {
                let values = self.read_f32::<3>(sampler.output, ElementType::Vec3)?;
                check_count(values.len())?;
                let values = values.into_iter().map(Vec3::from_array).collect();
                AnimationSampler::Scale(build_keyframes(times, values, sampler.interpolation))
            }
        };

        Ok(AnimationTrack {
            target_node: channel.target_node,
            sampler,
        })
    }

    /// Largest keyframe time over every sampler of the animation.
    pub fn animation_duration(&self, animation: usize) -> Result<f32, AssetError> {
        let asset = self.animation(animation)?;
        let mut duration = 0.0f32;
        for (index, sampler) in asset.samplers.iter().enumerate() {
            let times = self.keyframe_times(index, sampler.input)?;
            if let Some(&last) = times.last() {
                duration = duration.max(last);
            }
        }
        Ok(duration)
    }
}
