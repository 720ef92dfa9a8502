//! Shake presets bundled with the crate.
//!
//! Amplitudes are authored pre-amplified: location channels by
//! `INFLUENCE_MAX * SCALE_MAX * UNIT_SCALE_MAX`, rotation channels by
//! `INFLUENCE_MAX`. The rig's influence drivers normalize them back into
//! the configured live range, so a real-world amplitude of ~1 cm appears
//! here as ~10000.

use std::collections::BTreeMap;

use super::{ChannelKey, ShakeCurveSet};
use crate::curves::{LOCATION_PATH, ROTATION_PATH};

type Channel = &'static [(f32, f32)];

struct BuiltinShake {
    id: &'static str,
    name: &'static str,
    fps: f32,
    location: [Channel; 3],
    rotation: [Channel; 3],
}

const HANDHELD: BuiltinShake = BuiltinShake {
    id: "HANDHELD",
    name: "Handheld",
    fps: 24.0,
    location: [
        &[
            (1.0, 3100.0),
            (9.0, 11800.0),
            (17.0, -5400.0),
            (25.0, 9200.0),
            (33.0, -12600.0),
            (41.0, 4700.0),
            (49.0, 3100.0),
        ],
        &[
            (1.0, -2400.0),
            (9.0, 5600.0),
            (17.0, 13900.0),
            (25.0, -7300.0),
            (33.0, 2100.0),
            (41.0, -9800.0),
            (49.0, -2400.0),
        ],
        &[
            (1.0, 1800.0),
            (9.0, -7600.0),
            (17.0, 4300.0),
            (25.0, 11200.0),
            (33.0, -3500.0),
            (41.0, -12100.0),
            (49.0, 1800.0),
        ],
    ],
    rotation: [
        &[
            (1.0, 0.031),
            (9.0, -0.094),
            (17.0, 0.062),
            (25.0, -0.027),
            (33.0, 0.081),
            (41.0, -0.056),
            (49.0, 0.031),
        ],
        &[
            (1.0, -0.044),
            (9.0, 0.019),
            (17.0, -0.087),
            (25.0, 0.065),
            (33.0, -0.012),
            (41.0, 0.073),
            (49.0, -0.044),
        ],
        &[
            (1.0, 0.012),
            (9.0, 0.048),
            (17.0, -0.035),
            (25.0, 0.091),
            (33.0, -0.069),
            (41.0, 0.024),
            (49.0, 0.012),
        ],
    ],
};

const WALK: BuiltinShake = BuiltinShake {
    id: "WALK",
    name: "Walk",
    fps: 24.0,
    location: [
        &[
            (1.0, 2600.0),
            (9.0, -2200.0),
            (17.0, 2900.0),
            (25.0, -2500.0),
            (33.0, 2600.0),
        ],
        &[
            (1.0, 900.0),
            (9.0, 1400.0),
            (17.0, 700.0),
            (25.0, 1300.0),
            (33.0, 900.0),
        ],
        &[
            (1.0, -8400.0),
            (9.0, 6100.0),
            (17.0, -7800.0),
            (25.0, 5700.0),
            (33.0, -8400.0),
        ],
    ],
    rotation: [
        &[
            (1.0, 0.052),
            (9.0, -0.038),
            (17.0, 0.047),
            (25.0, -0.041),
            (33.0, 0.052),
        ],
        &[
            (1.0, -0.016),
            (9.0, 0.022),
            (17.0, -0.019),
            (25.0, 0.014),
            (33.0, -0.016),
        ],
        &[
            (1.0, 0.009),
            (9.0, -0.013),
            (17.0, 0.011),
            (25.0, -0.008),
            (33.0, 0.009),
        ],
    ],
};

const IMPACT: BuiltinShake = BuiltinShake {
    id: "IMPACT",
    name: "Impact",
    fps: 24.0,
    location: [
        &[
            (1.0, 0.0),
            (3.0, 16800.0),
            (6.0, -11300.0),
            (10.0, 6400.0),
            (15.0, -2900.0),
            (20.0, 1100.0),
            (25.0, 0.0),
        ],
        &[
            (1.0, 0.0),
            (3.0, -13400.0),
            (6.0, 9700.0),
            (10.0, -4800.0),
            (15.0, 2200.0),
            (20.0, -800.0),
            (25.0, 0.0),
        ],
        &[
            (1.0, 0.0),
            (3.0, -19500.0),
            (6.0, 12600.0),
            (10.0, -7100.0),
            (15.0, 3300.0),
            (20.0, -1200.0),
            (25.0, 0.0),
        ],
    ],
    rotation: [
        &[
            (1.0, 0.0),
            (3.0, 0.118),
            (6.0, -0.079),
            (10.0, 0.042),
            (15.0, -0.018),
            (20.0, 0.007),
            (25.0, 0.0),
        ],
        &[
            (1.0, 0.0),
            (3.0, -0.064),
            (6.0, 0.045),
            (10.0, -0.023),
            (15.0, 0.010),
            (20.0, -0.004),
            (25.0, 0.0),
        ],
        &[
            (1.0, 0.0),
            (3.0, 0.037),
            (6.0, -0.026),
            (10.0, 0.013),
            (15.0, -0.006),
            (20.0, 0.002),
            (25.0, 0.0),
        ],
    ],
};

const SHAKES: &[BuiltinShake] = &[HANDHELD, WALK, IMPACT];

pub(super) fn presets() -> Vec<(&'static str, ShakeCurveSet)> {
    SHAKES
        .iter()
        .map(|shake| (shake.id, shake.curve_set()))
        .collect()
}

impl BuiltinShake {
    fn curve_set(&self) -> ShakeCurveSet {
        let mut channels = BTreeMap::new();
        for (index, samples) in self.location.iter().enumerate() {
            channels.insert(ChannelKey::new(LOCATION_PATH, index), samples.to_vec());
        }
        for (index, samples) in self.rotation.iter().enumerate() {
            channels.insert(ChannelKey::new(ROTATION_PATH, index), samples.to_vec());
        }
        // Built-in tables are compile-time data and always validate.
        ShakeCurveSet::new(self.name, self.fps, channels)
            .expect("built-in shake tables are well formed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_validates_and_loops() {
        for (id, set) in presets() {
            let (start, end) = set.frame_range();
            assert!(end > start, "{id} has an empty frame range");
            for (key, samples) in set.channels() {
                let first = samples.first().unwrap().1;
                let last = samples.last().unwrap().1;
                assert!(
                    (first - last).abs() < 1e-6,
                    "{id} channel {}[{}] does not loop",
                    key.path,
                    key.index
                );
            }
        }
    }
}
