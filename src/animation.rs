//! Animation channel extraction.
//!
//! Decodes per-node translation/rotation/scale channels into keyframe
//! sequences and merges channels targeting the same node into one track.
//! A keyframe holds only the components authored at its exact time; the
//! consumer resolves unset components from the nearest key or the rest
//! pose.

use crate::buffers::BufferStore;
use crate::error::{ExtractError, Result};
use crate::resolve::AccessorResolver;
use crate::space::SpaceConversion;

/// Curve interpolation mode, mapped from the sampler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interpolation {
    Step,
    Linear,
    CubicSpline,
}

/// One animated component at a keyframe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeyValue<T> {
    pub value: T,
    pub interpolation: Interpolation,
}

/// Keyframe holding only the components authored at this time.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TrackKey {
    /// Seconds from animation start.
    pub time: f32,
    pub translation: Option<KeyValue<[f32; 3]>>,
    /// Rotation quaternion, xyzw.
    pub rotation: Option<KeyValue<[f32; 4]>>,
    pub scale: Option<KeyValue<[f32; 3]>>,
}

/// Merged keyframe sequence for one target node, ordered by time.
#[derive(Clone, Debug, Default)]
pub struct NodeTrack {
    pub node: usize,
    pub keys: Vec<TrackKey>,
}

impl NodeTrack {
    /// Keyframe at exactly `time`, inserting one in order when absent.
    /// Times are matched by exact equality, not by tolerance.
    fn key_at(&mut self, time: f32) -> &mut TrackKey {
        let at = self.keys.partition_point(|key| key.time < time);
        if self.keys.get(at).map(|key| key.time) != Some(time) {
            self.keys.insert(
                at,
                TrackKey {
                    time,
                    ..TrackKey::default()
                },
            );
        }
        &mut self.keys[at]
    }
}

fn track_mut(tracks: &mut Vec<NodeTrack>, node: usize) -> &mut NodeTrack {
    let at = match tracks.iter().position(|track| track.node == node) {
        Some(at) => at,
        None => {
            tracks.push(NodeTrack {
                node,
                keys: Vec::new(),
            });
            tracks.len() - 1
        }
    };
    &mut tracks[at]
}

/// Keep one output value per keyframe time.
///
/// Cubic-spline samplers store in-tangent, value, out-tangent triplets per
/// keyframe; the value element is kept and the tangents are discarded.
fn per_key_values<T: Copy>(
    values: Vec<T>,
    times: &[f32],
    interpolation: Interpolation,
    animation: usize,
    channel: usize,
) -> Result<Vec<T>> {
    let per_key = if interpolation == Interpolation::CubicSpline {
        3
    } else {
        1
    };
    if values.len() != times.len() * per_key {
        return Err(ExtractError::KeyframeCountMismatch {
            animation,
            channel,
            times: times.len(),
            values: values.len(),
        });
    }
    if per_key == 3 {
        Ok(values.into_iter().skip(1).step_by(3).collect())
    } else {
        Ok(values)
    }
}

/// Extract an animation into one merged track per target node.
///
/// Weight (morph target) channels and non-float sampler outputs are skipped
/// with a warning; they never fail the animation.
pub fn extract_animation(
    animation: &gltf::Animation,
    store: &BufferStore,
    resolver: &AccessorResolver,
    conversion: SpaceConversion,
) -> Result<Vec<NodeTrack>> {
    let mut tracks: Vec<NodeTrack> = Vec::new();

    for (channel_index, channel) in animation.channels().enumerate() {
        let target = channel.target();
        let property = target.property();
        if property == gltf::animation::Property::MorphTargetWeights {
            tracing::warn!(
                "animation {} channel {}: morph target weights are not supported, skipping",
                animation.index(),
                channel_index
            );
            continue;
        }

        let sampler = channel.sampler();
        let output = sampler.output();
        if output.data_type() != gltf::accessor::DataType::F32 {
            tracing::warn!(
                "animation {} channel {}: {:?} outputs are not supported, skipping",
                animation.index(),
                channel_index,
                output.data_type()
            );
            continue;
        }

        let times = resolver.read_scalars_f32(store, &sampler.input())?;
        let interpolation = match sampler.interpolation() {
            gltf::animation::Interpolation::Step => Interpolation::Step,
            gltf::animation::Interpolation::Linear => Interpolation::Linear,
            gltf::animation::Interpolation::CubicSpline => Interpolation::CubicSpline,
        };

        let track = track_mut(&mut tracks, target.node().index());
        match property {
            gltf::animation::Property::Translation => {
                let values = per_key_values(
                    resolver.read_vec3_f32(store, &output)?,
                    &times,
                    interpolation,
                    animation.index(),
                    channel_index,
                )?;
                for (&time, value) in times.iter().zip(values) {
                    track.key_at(time).translation = Some(KeyValue {
                        value: conversion.position(value),
                        interpolation,
                    });
                }
            }
            gltf::animation::Property::Rotation => {
                let values = per_key_values(
                    resolver.read_vec4_f32(store, &output)?,
                    &times,
                    interpolation,
                    animation.index(),
                    channel_index,
                )?;
                for (&time, value) in times.iter().zip(values) {
                    track.key_at(time).rotation = Some(KeyValue {
                        value: conversion.quat(value),
                        interpolation,
                    });
                }
            }
            gltf::animation::Property::Scale => {
                let values = per_key_values(
                    resolver.read_vec3_f32(store, &output)?,
                    &times,
                    interpolation,
                    animation.index(),
                    channel_index,
                )?;
                for (&time, value) in times.iter().zip(values) {
                    track.key_at(time).scale = Some(KeyValue {
                        value: conversion.scale(value),
                        interpolation,
                    });
                }
            }
            gltf::animation::Property::MorphTargetWeights => {}
        }
    }

    Ok(tracks)
}
