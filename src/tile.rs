use std::fmt;
use std::sync::Arc;

use glam::Vec3;

use crate::math::Rgb;
use crate::texture::Texture;

/// Unique tile identifier, assigned by a `TileFactory`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileId(pub u64);

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tile#{}", self.0)
    }
}

/// Surface of a tile
#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    Flat(Rgb),
    Textured(Arc<Texture>),
}

impl Material {
    /// Representative flat colour
    pub fn base_color(&self) -> Rgb {
        match self {
            Material::Flat(color) => *color,
            Material::Textured(texture) => texture.average(),
        }
    }
}

/// One decorative tile, immutable after spawn
#[derive(Debug, Clone, PartialEq)]
pub struct TileDescriptor {
    pub id: TileId,
    pub spawn_position: Vec3,
    pub target_position: Vec3,
    /// Euler angles (XYZ, radians) at spawn
    pub spawn_rotation: Vec3,
    /// Euler angles (XYZ, radians) at rest
    pub rotation: Vec3,
    /// Width, height, depth
    pub size: Vec3,
    /// Uniform scale at spawn; the entrance grows it to 1
    pub spawn_scale: f32,
    pub material: Material,
    /// Animation clock time at which the entrance begins
    pub spawn_time: f32,
    /// Random phase offset in [0, TAU) that desynchronises idle motion
    pub phase_seed: f32,
}

impl TileDescriptor {
    /// Seconds since entrance start, negative while still waiting on its stagger
    pub fn elapsed(&self, now: f32) -> f32 {
        now - self.spawn_time
    }
}

/// Animation state of a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TilePhase {
    /// Staggered spawn time not reached yet
    Pending,
    Entering,
    Idle,
}

/// Per-frame render transform derived from a descriptor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileTransform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: f32,
    pub opacity: f32,
    pub phase: TilePhase,
}

impl TileTransform {
    pub fn is_visible(&self) -> bool {
        self.phase != TilePhase::Pending && self.scale > 0.0 && self.opacity > 0.0
    }
}
