/// Result alias that carries the custom [`ShakeRigError`] type.
pub type Result<T> = std::result::Result<T, ShakeRigError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum ShakeRigError {
    /// A shake slot references an id that is not present in the library.
    #[error("unknown shake type `{0}`")]
    UnknownShakeType(String),
    /// The host's action constraints lack evaluation-time support, which the
    /// rig's playback drivers require. Fatal for the affected rebuild; the
    /// camera is left without a rig rather than with a half-wired one.
    #[error("host version does not support evaluation-time input on action constraints")]
    UnsupportedHostVersion,
    /// No object with the given name exists in the scene.
    #[error("no object named `{0}` in the scene")]
    UnknownObject(String),
    /// The named object exists but is not a camera.
    #[error("object `{0}` is not a camera")]
    NotACamera(String),
    /// A slot index is outside the camera's shake list.
    #[error("shake slot {index} is out of range for camera `{camera}`")]
    SlotOutOfRange { camera: String, index: usize },
    /// Preset data failed validation on load.
    #[error("malformed shake preset: {0}")]
    MalformedPreset(String),
    /// A driver expression referenced a variable whose binding could not be
    /// resolved against the scene.
    #[error("driver variable `{0}` failed to resolve")]
    DriverVariable(String),
    /// Constraint targets form a loop, so the object's transform has no
    /// well-defined evaluation order.
    #[error("constraint targets of `{0}` form a cycle")]
    ConstraintCycle(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Wrapper around JSON (de)serialization errors.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}
