pub mod animator;
pub mod camera;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod factory;
pub mod host;
pub mod math;
pub mod render;
pub mod scene;
pub mod spawn;
pub mod texture;
pub mod tile;
pub mod window;

pub use animator::{Animator, AnimatorConfig};
pub use config::{EngineConfig, Variant};
pub use error::{EngineError, Result};
pub use host::{run_headless, FrameStats, HeadlessReport, SceneHost, SpawnBatch};
pub use spawn::{ScrollSignal, SpawnController};
pub use tile::{TileDescriptor, TileId, TileTransform};
