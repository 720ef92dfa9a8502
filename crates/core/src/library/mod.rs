use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::curves::{LOCATION_PATH, ROTATION_PATH};
use crate::{ShakeRigError, Result};

mod builtin;

/// Identifies one animation channel inside a curve set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelKey {
    pub path: String,
    pub index: usize,
}

impl ChannelKey {
    pub fn new(path: impl Into<String>, index: usize) -> Self {
        Self {
            path: path.into(),
            index,
        }
    }
}

/// A pre-recorded camera shake: a display name, the frame rate it was
/// captured at, and per-channel keyframe tables.
///
/// Never mutated after construction. Every channel spans the same inclusive
/// frame range; the constructor rejects sets that violate this.
#[derive(Debug, Clone, PartialEq)]
pub struct ShakeCurveSet {
    pub name: String,
    pub fps: f32,
    channels: BTreeMap<ChannelKey, Vec<(f32, f32)>>,
}

impl ShakeCurveSet {
    pub fn new(
        name: impl Into<String>,
        fps: f32,
        channels: BTreeMap<ChannelKey, Vec<(f32, f32)>>,
    ) -> Result<Self> {
        let name = name.into();
        if !(fps.is_finite() && fps > 0.0) {
            return Err(ShakeRigError::MalformedPreset(format!(
                "shake `{name}` has invalid frame rate {fps}"
            )));
        }
        if channels.is_empty() {
            return Err(ShakeRigError::MalformedPreset(format!(
                "shake `{name}` has no channels"
            )));
        }

        let mut span = None;
        for (key, samples) in &channels {
            let (first, last) = match (samples.first(), samples.last()) {
                (Some(first), Some(last)) => (first.0, last.0),
                _ => {
                    return Err(ShakeRigError::MalformedPreset(format!(
                        "shake `{name}` channel `{}[{}]` has no samples",
                        key.path, key.index
                    )))
                }
            };
            if samples.windows(2).any(|pair| pair[1].0 <= pair[0].0) {
                return Err(ShakeRigError::MalformedPreset(format!(
                    "shake `{name}` channel `{}[{}]` has unsorted frames",
                    key.path, key.index
                )));
            }
            match span {
                None => span = Some((first, last)),
                Some(expected) if expected != (first, last) => {
                    return Err(ShakeRigError::MalformedPreset(format!(
                        "shake `{name}` channel `{}[{}]` spans {first}..{last}, expected {}..{}",
                        key.path, key.index, expected.0, expected.1
                    )))
                }
                Some(_) => {}
            }
        }

        Ok(Self { name, fps, channels })
    }

    /// Iterates over all channels in a stable order.
    pub fn channels(&self) -> impl Iterator<Item = (&ChannelKey, &[(f32, f32)])> {
        self.channels
            .iter()
            .map(|(key, samples)| (key, samples.as_slice()))
    }

    /// The inclusive frame range shared by every channel.
    pub fn frame_range(&self) -> (f32, f32) {
        // Constructor guarantees at least one non-empty channel, all with
        // equal spans.
        let samples = self
            .channels
            .values()
            .next()
            .expect("curve set must have channels");
        let first = samples.first().expect("channels must have samples");
        let last = samples.last().expect("channels must have samples");
        (first.0, last.0)
    }
}

/// Read-only mapping from shake-type id to its recorded curve set.
#[derive(Debug, Clone, Default)]
pub struct ShakeLibrary {
    shakes: BTreeMap<String, ShakeCurveSet>,
}

impl ShakeLibrary {
    /// An empty library, useful for tests and incremental preset loading.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The library of shakes bundled with the crate.
    pub fn builtin() -> Self {
        let mut library = Self::empty();
        for (id, set) in builtin::presets() {
            library.insert(id, set);
        }
        library
    }

    pub fn insert(&mut self, id: impl Into<String>, set: ShakeCurveSet) {
        self.shakes.insert(id.into(), set);
    }

    /// Looks up a shake by id.
    pub fn lookup(&self, shake_type: &str) -> Result<&ShakeCurveSet> {
        self.shakes
            .get(shake_type)
            .ok_or_else(|| ShakeRigError::UnknownShakeType(shake_type.to_string()))
    }

    pub fn contains(&self, shake_type: &str) -> bool {
        self.shakes.contains_key(shake_type)
    }

    /// All shake ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.shakes.keys().map(String::as_str)
    }

    /// Loads a preset document from a JSON string and adds it to the library,
    /// returning the id it registered under.
    pub fn load_preset_str(&mut self, json: &str) -> Result<String> {
        let preset: PresetFile = serde_json::from_str(json)?;
        let id = preset.id.clone();
        let set = preset.into_curve_set()?;
        self.insert(id.clone(), set);
        Ok(id)
    }

    /// Loads a preset document from a JSON file on disk.
    pub fn load_preset_file(&mut self, path: impl AsRef<Path>) -> Result<String> {
        let json = std::fs::read_to_string(path)?;
        self.load_preset_str(&json)
    }
}

/// On-disk shake preset document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetFile {
    pub id: String,
    pub name: String,
    pub fps: f32,
    pub channels: Vec<PresetChannel>,
}

/// One channel of an on-disk preset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetChannel {
    pub path: String,
    pub index: usize,
    pub samples: Vec<(f32, f32)>,
}

impl PresetFile {
    fn into_curve_set(self) -> Result<ShakeCurveSet> {
        let mut channels = BTreeMap::new();
        for channel in self.channels {
            if channel.path != LOCATION_PATH && channel.path != ROTATION_PATH {
                return Err(ShakeRigError::MalformedPreset(format!(
                    "shake `{}` has unsupported channel path `{}`",
                    self.name, channel.path
                )));
            }
            let key = ChannelKey::new(channel.path, channel.index);
            if channels.insert(key.clone(), channel.samples).is_some() {
                return Err(ShakeRigError::MalformedPreset(format!(
                    "shake `{}` has duplicate channel `{}[{}]`",
                    self.name, key.path, key.index
                )));
            }
        }
        ShakeCurveSet::new(self.name, self.fps, channels)
    }
}
