use serde::{Deserialize, Serialize};

/// Maximum value of a slot's influence property.
pub const INFLUENCE_MAX: f32 = 10.0;

/// Maximum value of a slot's location-scale property.
pub const SCALE_MAX: f32 = 100.0;

/// Maximum supported world unit scale.
///
/// Preset curve amplitudes are authored pre-amplified by the product
/// `INFLUENCE_MAX * SCALE_MAX * UNIT_SCALE_MAX`, and the rig's influence
/// drivers normalize back down into the live range.
pub const UNIT_SCALE_MAX: f32 = 1000.0;

/// One shake applied to a camera. Cameras own an ordered list of these;
/// list order is significant because rotation components compose in order.
///
/// Timing has two mutually exclusive modes selected by `use_manual_timing`:
/// manual mode scrubs the shake with `time`, automatic mode plays it from
/// the scene frame through `speed` and `offset`. All fields are read live
/// by driver expressions, so edits take effect without a rig rebuild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShakeInstance {
    /// Id of the shake in the library.
    pub shake_type: String,
    /// How strongly the shake affects the camera, 0 to [`INFLUENCE_MAX`].
    #[serde(default = "default_one")]
    pub influence: f32,
    /// Spatial scale of the shake's location component, 0 to [`SCALE_MAX`].
    #[serde(default = "default_one")]
    pub scale: f32,
    /// Drive the shake's progression by hand instead of from the timeline.
    #[serde(default)]
    pub use_manual_timing: bool,
    /// Current time (in frames) of the shake animation; manual mode only.
    #[serde(default)]
    pub time: f32,
    /// Playback speed multiplier; automatic mode only.
    #[serde(default = "default_one")]
    pub speed: f32,
    /// Frame offset applied before the speed multiplier; automatic mode only.
    #[serde(default)]
    pub offset: f32,
}

fn default_one() -> f32 {
    1.0
}

impl ShakeInstance {
    /// Creates a slot for the given shake type with default parameters.
    pub fn new(shake_type: impl Into<String>) -> Self {
        Self {
            shake_type: shake_type.into(),
            influence: 1.0,
            scale: 1.0,
            use_manual_timing: false,
            time: 0.0,
            speed: 1.0,
            offset: 0.0,
        }
    }

    /// Sets the influence, clamped to the supported range.
    pub fn set_influence(&mut self, value: f32) {
        self.influence = value.clamp(0.0, INFLUENCE_MAX);
    }

    /// Sets the location scale, clamped to the supported range.
    pub fn set_scale(&mut self, value: f32) {
        self.scale = value.clamp(0.0, SCALE_MAX);
    }
}
