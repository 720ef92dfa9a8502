//! Core library for procedural camera shake rigs.
//!
//! Given a camera and its ordered list of shake configurations, the crate
//! synthesizes a hidden rig of driver-linked helper objects and constraints
//! so that the camera's transform at any frame is the sum of the selected
//! pre-recorded shake curves, each independently scaled, offset, sped up,
//! or scrubbed by hand. Each module owns a distinct subsystem: the preset
//! library, loop-action baking, expression drivers, the in-memory scene
//! graph, and the rig synthesizer itself.

pub mod config;
pub mod curves;
pub mod driver;
pub mod error;
pub mod library;
pub mod rig;
pub mod scene;

pub use config::{ShakeInstance, INFLUENCE_MAX, SCALE_MAX, UNIT_SCALE_MAX};
pub use curves::{build_loop_action, ActionPose, FCurve, LoopAction};
pub use driver::{Driver, DriverVar, Expr, PropertyPath, ScenePath, SlotField, VarResolver, VarTarget};
pub use error::{Result, ShakeRigError};
pub use library::{ChannelKey, PresetChannel, PresetFile, ShakeCurveSet, ShakeLibrary};
pub use rig::{MoveDirection, RigSynthesizer, BASE_NAME};
pub use scene::{
    Collection, Constraint, ConstraintKind, HostCapabilities, MixMode, ObjectData, Scene,
    SceneObject, SpaceMode, Transform,
};
