use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::math::{clamp01, smoothstep, Easing};
use crate::tile::{TileDescriptor, TilePhase, TileTransform};

/// Choreography constants for one visual variant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatorConfig {
    /// Seconds from spawn time to rest
    pub entrance_duration: f32,
    pub easing: Easing,
    /// Peak vertical idle offset, world units
    pub idle_amplitude: f32,
    /// Idle angular frequency, radians per second
    pub idle_frequency: f32,
    /// Peak idle rotation offset, radians
    pub idle_rotation_amplitude: f32,
    /// Seconds over which idle motion ramps in after the entrance
    pub idle_settle: f32,
    /// Tiles older than this expire
    pub max_age: Option<f32>,
    /// Seconds of fade before `max_age`
    pub fade_out: f32,
    /// Tiles whose y drops below this expire (y-up worlds only)
    pub min_y: Option<f32>,
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self {
            entrance_duration: 0.6,
            easing: Easing::EaseOutCubic,
            idle_amplitude: 3.0,
            idle_frequency: 0.75,
            idle_rotation_amplitude: 0.0,
            idle_settle: 0.5,
            max_age: None,
            fade_out: 1.0,
            min_y: None,
        }
    }
}

/// Stateless per-tile animator: every transform is a function of absolute
/// elapsed time, so dropped frames never accumulate error.
#[derive(Debug, Clone, Copy)]
pub struct Animator {
    config: AnimatorConfig,
}

impl Animator {
    pub fn new(config: AnimatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnimatorConfig {
        &self.config
    }

    pub fn phase(&self, elapsed_since_spawn: f32) -> TilePhase {
        if elapsed_since_spawn < 0.0 {
            TilePhase::Pending
        } else if elapsed_since_spawn < self.config.entrance_duration {
            TilePhase::Entering
        } else {
            TilePhase::Idle
        }
    }

    /// Transform of `tile` at `frame_time`, `elapsed_since_spawn` seconds into its life
    pub fn advance(&self, tile: &TileDescriptor, elapsed_since_spawn: f32, frame_time: f32) -> TileTransform {
        let fade = self.fade_factor(elapsed_since_spawn);

        match self.phase(elapsed_since_spawn) {
            TilePhase::Pending => TileTransform {
                position: tile.spawn_position,
                rotation: tile.spawn_rotation,
                scale: tile.spawn_scale,
                opacity: 0.0,
                phase: TilePhase::Pending,
            },
            TilePhase::Entering => {
                let progress = clamp01(elapsed_since_spawn / self.config.entrance_duration);
                let eased = self.config.easing.apply(progress);
                TileTransform {
                    position: tile.spawn_position.lerp(tile.target_position, eased),
                    rotation: tile.spawn_rotation.lerp(tile.rotation, eased),
                    scale: tile.spawn_scale + (1.0 - tile.spawn_scale) * eased,
                    opacity: eased * fade,
                    phase: TilePhase::Entering,
                }
            }
            TilePhase::Idle => {
                let settle = self.settle(elapsed_since_spawn - self.config.entrance_duration);
                let phase = frame_time * self.config.idle_frequency + tile.phase_seed;
                let bob = self.config.idle_amplitude * phase.sin() * settle;
                let sway = self.config.idle_rotation_amplitude
                    * (frame_time * self.config.idle_frequency * 0.7 + tile.phase_seed).sin()
                    * settle;

                TileTransform {
                    position: tile.target_position + Vec3::new(0.0, bob, 0.0),
                    rotation: tile.rotation + Vec3::new(sway * 0.5, 0.0, sway),
                    scale: 1.0,
                    opacity: fade,
                    phase: TilePhase::Idle,
                }
            }
        }
    }

    /// Age or bounds expiry
    pub fn is_expired(&self, elapsed_since_spawn: f32, transform: &TileTransform) -> bool {
        let too_old = self
            .config
            .max_age
            .is_some_and(|max_age| elapsed_since_spawn > max_age);
        let fell_out = self
            .config
            .min_y
            .is_some_and(|min_y| transform.position.y < min_y);
        too_old || fell_out
    }

    /// Idle ramp: 0 at the end of the entrance, 1 once settled
    fn settle(&self, idle_time: f32) -> f32 {
        if self.config.idle_settle <= 0.0 {
            return if idle_time > 0.0 { 1.0 } else { 0.0 };
        }
        smoothstep(idle_time / self.config.idle_settle)
    }

    fn fade_factor(&self, elapsed_since_spawn: f32) -> f32 {
        match self.config.max_age {
            Some(max_age) if self.config.fade_out > 0.0 => {
                clamp01((max_age - elapsed_since_spawn) / self.config.fade_out)
            }
            _ => 1.0,
        }
    }
}
