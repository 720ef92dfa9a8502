use serde::{Deserialize, Serialize};

use crate::library::ShakeCurveSet;

/// Channel path for an object's location vector.
pub const LOCATION_PATH: &str = "location";

/// Channel path for an object's euler rotation vector.
pub const ROTATION_PATH: &str = "rotation_euler";

/// One baked animation channel: an ordered run of (frame, value) keys with
/// linear interpolation between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FCurve {
    pub path: String,
    pub index: usize,
    samples: Vec<(f32, f32)>,
}

impl FCurve {
    /// Builds a curve from pre-sorted samples.
    pub fn new(path: impl Into<String>, index: usize, samples: Vec<(f32, f32)>) -> Self {
        Self {
            path: path.into(),
            index,
            samples,
        }
    }

    /// Frame of the first key, or 0 for an empty curve.
    pub fn frame_start(&self) -> f32 {
        self.samples.first().map(|(frame, _)| *frame).unwrap_or(0.0)
    }

    /// Frame of the last key, or 0 for an empty curve.
    pub fn frame_end(&self) -> f32 {
        self.samples.last().map(|(frame, _)| *frame).unwrap_or(0.0)
    }

    /// Evaluates the curve at a frame. Frames outside the keyed range clamp
    /// to the end values; in-between frames interpolate linearly.
    pub fn evaluate(&self, frame: f32) -> f32 {
        let first = match self.samples.first() {
            Some(first) => first,
            None => return 0.0,
        };
        let last = self.samples.last().unwrap();
        if frame <= first.0 {
            return first.1;
        }
        if frame >= last.0 {
            return last.1;
        }

        let position = self
            .samples
            .partition_point(|(key_frame, _)| *key_frame <= frame);
        let (f0, v0) = self.samples[position - 1];
        let (f1, v1) = self.samples[position];
        let span = f1 - f0;
        if span <= f32::EPSILON {
            return v0;
        }
        v0 + (v1 - v0) * ((frame - f0) / span)
    }
}

/// A reusable, loop-safe animation block baked from a [`ShakeCurveSet`].
///
/// One action is shared by every rig slot that uses the same shake type; the
/// scene's action table acts as the cache, keyed by the action name. Values
/// are baked exactly as authored; per-slot influence and scale are applied
/// later through driver expressions, never at bake time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopAction {
    pub name: String,
    pub frame_start: f32,
    pub frame_end: f32,
    /// Frame rate the shake was authored at.
    pub source_fps: f32,
    /// Influence ceiling the curve amplitudes were authored against.
    pub influence_max: f32,
    /// Combined influence/scale/unit-scale ceiling for location amplitudes.
    pub total_scale_max: f32,
    curves: Vec<FCurve>,
}

/// A location/rotation pose sampled from a [`LoopAction`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ActionPose {
    pub location: [f32; 3],
    pub rotation_euler: [f32; 3],
}

impl LoopAction {
    /// Length of the action's frame range.
    pub fn length(&self) -> f32 {
        self.frame_end - self.frame_start
    }

    pub fn curves(&self) -> &[FCurve] {
        &self.curves
    }

    /// Samples the location and rotation channels at an absolute frame.
    pub fn sample(&self, frame: f32) -> ActionPose {
        let mut pose = ActionPose::default();
        for curve in &self.curves {
            if curve.index >= 3 {
                continue;
            }
            match curve.path.as_str() {
                LOCATION_PATH => pose.location[curve.index] = curve.evaluate(frame),
                ROTATION_PATH => pose.rotation_euler[curve.index] = curve.evaluate(frame),
                _ => {}
            }
        }
        pose
    }

    /// Samples the action through its normalized evaluation-time input.
    /// `t` in [0, 1] maps linearly onto the action's frame range.
    pub fn sample_at_eval_time(&self, t: f32) -> ActionPose {
        let t = t.clamp(0.0, 1.0);
        self.sample(self.frame_start + t * self.length())
    }
}

/// Bakes a curve set into a [`LoopAction`].
///
/// The frame range spans all channels (min over starts, max over ends). No
/// scaling of any kind is applied here: `influence_max` and
/// `total_scale_max` are recorded on the action so the rig's influence
/// expressions can normalize the pre-amplified authored values, which keeps
/// a single baked action valid for every slot configuration.
pub fn build_loop_action(
    set: &ShakeCurveSet,
    name: impl Into<String>,
    influence_max: f32,
    total_scale_max: f32,
) -> LoopAction {
    let mut curves = Vec::new();
    let mut frame_start = f32::INFINITY;
    let mut frame_end = f32::NEG_INFINITY;

    for (key, samples) in set.channels() {
        let curve = FCurve::new(key.path.clone(), key.index, samples.to_vec());
        frame_start = frame_start.min(curve.frame_start());
        frame_end = frame_end.max(curve.frame_end());
        curves.push(curve);
    }

    if !frame_start.is_finite() || !frame_end.is_finite() {
        frame_start = 0.0;
        frame_end = 0.0;
    }

    LoopAction {
        name: name.into(),
        frame_start,
        frame_end,
        source_fps: set.fps,
        influence_max,
        total_scale_max,
        curves,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::{ChannelKey, ShakeCurveSet};
    use std::collections::BTreeMap;

    fn two_channel_set() -> ShakeCurveSet {
        let mut channels = BTreeMap::new();
        channels.insert(
            ChannelKey::new(LOCATION_PATH, 0),
            vec![(1.0, 0.0), (5.0, 4.0), (9.0, 0.0)],
        );
        channels.insert(
            ChannelKey::new(ROTATION_PATH, 2),
            vec![(1.0, 0.5), (9.0, 0.5)],
        );
        ShakeCurveSet::new("Test Shake", 24.0, channels).unwrap()
    }

    #[test]
    fn interpolates_between_keys() {
        let curve = FCurve::new(LOCATION_PATH, 0, vec![(1.0, 0.0), (5.0, 4.0)]);
        assert_eq!(curve.evaluate(3.0), 2.0);
        assert_eq!(curve.evaluate(0.0), 0.0);
        assert_eq!(curve.evaluate(10.0), 4.0);
    }

    #[test]
    fn bake_records_spanning_frame_range() {
        let action = build_loop_action(&two_channel_set(), "test", 10.0, 1000.0);
        assert_eq!(action.frame_start, 1.0);
        assert_eq!(action.frame_end, 9.0);
        assert_eq!(action.length(), 8.0);
        assert_eq!(action.source_fps, 24.0);
    }

    #[test]
    fn bake_leaves_values_unscaled() {
        let action = build_loop_action(&two_channel_set(), "test", 10.0, 1_000_000.0);
        let pose = action.sample(5.0);
        assert_eq!(pose.location[0], 4.0);
        assert_eq!(pose.rotation_euler[2], 0.5);
    }

    #[test]
    fn eval_time_maps_onto_frame_range() {
        let action = build_loop_action(&two_channel_set(), "test", 10.0, 1000.0);
        let pose = action.sample_at_eval_time(0.5);
        assert_eq!(pose.location[0], 4.0);
        let start = action.sample_at_eval_time(0.0);
        assert_eq!(start.location[0], 0.0);
    }
}
