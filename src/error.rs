use thiserror::Error;

/// Errors raised by the animation engine
///
/// Only configuration errors ever reach a caller of the public host API.
/// Surface and resize errors are recovered inside `SceneHost`.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Rendering surface could not be acquired or presented to
    #[error("rendering surface unavailable: {0}")]
    SurfaceUnavailable(String),

    /// A prepared batch was laid out against stale surface dimensions
    #[error("surface resized while a batch was in flight (prepared for generation {prepared}, now {current})")]
    ResizeRace { prepared: u64, current: u64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read configuration: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
