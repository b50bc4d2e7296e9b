mod color;
mod easing;
mod rng;

pub use color::Rgb;
pub use easing::{clamp01, smoothstep, Easing};
pub use rng::{tile_rng, TileRng};
