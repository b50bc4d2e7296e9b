//! Turns tile transforms into canvas draw operations.

use std::sync::Arc;

use glam::{EulerRot, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::camera::{Camera, Projection};
use crate::core::{DrawOp, GradientAxis, QuadFill};
use crate::math::{clamp01, Rgb};
use crate::tile::{Material, TileDescriptor, TilePhase, TileTransform};

const AMBIENT_LIGHT: f32 = 0.7;
const KEY_LIGHT: (Vec3, f32) = (Vec3::new(6.0, 8.0, 6.0), 0.7);
const FILL_LIGHT: (Vec3, f32) = (Vec3::new(-6.0, -4.0, -6.0), 0.25);
const LIGHT_RANGE: (f32, f32) = (0.35, 1.25);

const GROUT_MIN_SCALE: f32 = 0.3;
const SHINE_MIN_SCALE: f32 = 0.7;
const SHINE_ALPHA: f32 = 77.0;
const SHADOW_ALPHA: f32 = 31.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub projection: Projection,
    /// Opacity of a fully entered tile
    pub opacity: f32,
    /// Grout line colour; None disables grout
    pub grout: Option<Rgb>,
    pub grout_width: f32,
    /// Glossy highlight over the top-left of each tile
    pub shine: bool,
    /// Darkened bottom edge once a tile is at rest
    pub shadow: bool,
    /// Lambert shading from the tile's orientation (perspective only)
    pub lighting: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            projection: Projection::Screen,
            opacity: 1.0,
            grout: Some(Rgb::new(0x9e, 0x9e, 0x9e)),
            grout_width: 3.0,
            shine: true,
            shadow: true,
            lighting: false,
        }
    }
}

/// Draws one tile per call, in whatever order the caller iterates
#[derive(Debug, Clone, Copy)]
pub struct TileRenderer {
    config: RenderConfig,
}

impl TileRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Draw operations for `tile` at `transform`; empty when nothing is visible
    pub fn draw_ops(&self, tile: &TileDescriptor, transform: &TileTransform, camera: &Camera) -> Vec<DrawOp> {
        if !transform.is_visible() {
            return Vec::new();
        }

        let alpha = clamp01(transform.opacity * self.config.opacity);
        if alpha <= 0.0 {
            return Vec::new();
        }

        let orientation = orientation(transform.rotation);
        let Some(corners) = self.corners(tile, transform, orientation, camera) else {
            return Vec::new();
        };

        let light = if self.config.lighting && camera.y_up() {
            light_factor(orientation)
        } else {
            1.0
        };
        let alpha8 = (alpha * 255.0).round() as u8;

        let fill = match &tile.material {
            Material::Textured(texture) => QuadFill::Texture {
                texture: Arc::clone(texture),
                tint: light,
                alpha: alpha8,
            },
            Material::Flat(color) => QuadFill::Solid(color.shade(light).with_alpha(alpha8)),
        };

        let mut ops = vec![DrawOp::Quad { corners, fill }];

        if let Some(grout) = self.config.grout {
            if transform.scale > GROUT_MIN_SCALE {
                ops.push(DrawOp::Outline {
                    corners,
                    width: self.config.grout_width,
                    color: grout.with_alpha(alpha8),
                });
            }
        }

        if self.config.shine && transform.scale > SHINE_MIN_SCALE {
            ops.push(DrawOp::Quad {
                corners: sub_quad(&corners, Vec2::ZERO, Vec2::splat(0.6)),
                fill: QuadFill::Gradient {
                    axis: GradientAxis::Diagonal,
                    start: [255, 255, 255, (SHINE_ALPHA * alpha).round() as u8],
                    end: [255, 255, 255, 0],
                },
            });
        }

        if self.config.shadow && transform.phase == TilePhase::Idle {
            ops.push(DrawOp::Quad {
                corners: sub_quad(&corners, Vec2::new(0.0, 0.7), Vec2::ONE),
                fill: QuadFill::Gradient {
                    axis: GradientAxis::Vertical,
                    start: [0, 0, 0, 0],
                    end: [0, 0, 0, (SHADOW_ALPHA * alpha).round() as u8],
                },
            });
        }

        ops
    }

    /// Projected face corners: top-left, top-right, bottom-right, bottom-left
    fn corners(
        &self,
        tile: &TileDescriptor,
        transform: &TileTransform,
        orientation: Quat,
        camera: &Camera,
    ) -> Option<[Vec2; 4]> {
        let half = tile.size.truncate() * 0.5 * transform.scale;
        // local offset toward the visual top of the surface
        let up = if camera.y_up() { half.y } else { -half.y };
        let local = [
            Vec3::new(-half.x, up, 0.0),
            Vec3::new(half.x, up, 0.0),
            Vec3::new(half.x, -up, 0.0),
            Vec3::new(-half.x, -up, 0.0),
        ];

        let mut corners = [Vec2::ZERO; 4];
        for (corner, offset) in corners.iter_mut().zip(local) {
            *corner = camera.project(transform.position + orientation * offset)?;
        }
        Some(corners)
    }
}

fn orientation(rotation: Vec3) -> Quat {
    Quat::from_euler(EulerRot::XYZ, rotation.x, rotation.y, rotation.z)
}

/// Lambert factor of a double-sided face with the given orientation
pub fn light_factor(orientation: Quat) -> f32 {
    let mut normal = orientation * Vec3::Z;
    if normal.z < 0.0 {
        normal = -normal;
    }

    let lambert = |(direction, intensity): (Vec3, f32)| normal.dot(direction.normalize()).max(0.0) * intensity;
    (AMBIENT_LIGHT + lambert(KEY_LIGHT) + lambert(FILL_LIGHT)).clamp(LIGHT_RANGE.0, LIGHT_RANGE.1)
}

/// Bilinear sub-rectangle of a quad in its uv space
fn sub_quad(corners: &[Vec2; 4], min: Vec2, max: Vec2) -> [Vec2; 4] {
    let at = |u: f32, v: f32| {
        let top = corners[0].lerp(corners[1], u);
        let bottom = corners[3].lerp(corners[2], u);
        top.lerp(bottom, v)
    };
    [at(min.x, min.y), at(max.x, min.y), at(max.x, max.y), at(min.x, max.y)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SurfaceSize;
    use crate::tile::TileId;

    fn tile(size: f32) -> TileDescriptor {
        TileDescriptor {
            id: TileId(1),
            spawn_position: Vec3::new(50.0, 50.0, 0.0),
            target_position: Vec3::new(50.0, 50.0, 0.0),
            spawn_rotation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            size: Vec3::new(size, size, 0.0),
            spawn_scale: 0.0,
            material: Material::Flat(Rgb::new(200, 100, 50)),
            spawn_time: 0.0,
            phase_seed: 0.0,
        }
    }

    fn at_rest(scale: f32, phase: TilePhase) -> TileTransform {
        TileTransform {
            position: Vec3::new(50.0, 50.0, 0.0),
            rotation: Vec3::ZERO,
            scale,
            opacity: 1.0,
            phase,
        }
    }

    fn screen() -> Camera {
        Camera::new(Projection::Screen, SurfaceSize::new(100, 100))
    }

    #[test]
    fn screen_corners_are_axis_aligned() {
        let renderer = TileRenderer::new(RenderConfig::default());
        let ops = renderer.draw_ops(&tile(20.0), &at_rest(1.0, TilePhase::Idle), &screen());
        match &ops[0] {
            DrawOp::Quad { corners, .. } => {
                assert_eq!(corners[0], Vec2::new(40.0, 40.0));
                assert_eq!(corners[2], Vec2::new(60.0, 60.0));
            }
            other => panic!("expected quad, got {:?}", other),
        }
    }

    #[test]
    fn decorations_follow_scale_thresholds() {
        let renderer = TileRenderer::new(RenderConfig::default());
        let camera = screen();
        // fill only
        assert_eq!(renderer.draw_ops(&tile(20.0), &at_rest(0.2, TilePhase::Entering), &camera).len(), 1);
        // fill + grout
        assert_eq!(renderer.draw_ops(&tile(20.0), &at_rest(0.5, TilePhase::Entering), &camera).len(), 2);
        // fill + grout + shine
        assert_eq!(renderer.draw_ops(&tile(20.0), &at_rest(0.9, TilePhase::Entering), &camera).len(), 3);
        // fill + grout + shine + shadow
        assert_eq!(renderer.draw_ops(&tile(20.0), &at_rest(1.0, TilePhase::Idle), &camera).len(), 4);
    }

    #[test]
    fn invisible_tiles_draw_nothing() {
        let renderer = TileRenderer::new(RenderConfig::default());
        let pending = at_rest(0.0, TilePhase::Pending);
        assert!(renderer.draw_ops(&tile(20.0), &pending, &screen()).is_empty());
    }

    #[test]
    fn opacity_scales_fill_alpha() {
        let renderer = TileRenderer::new(RenderConfig {
            opacity: 0.5,
            ..RenderConfig::default()
        });
        let ops = renderer.draw_ops(&tile(20.0), &at_rest(1.0, TilePhase::Idle), &screen());
        match &ops[0] {
            DrawOp::Quad { fill: QuadFill::Solid(color), .. } => assert_eq!(color[3], 128),
            other => panic!("expected solid quad, got {:?}", other),
        }
    }

    #[test]
    fn light_factor_is_clamped_and_double_sided() {
        let facing = light_factor(Quat::IDENTITY);
        let flipped = light_factor(Quat::from_rotation_y(std::f32::consts::PI));
        assert!((facing - flipped).abs() < 1e-5);
        for step in 0..32 {
            let angle = step as f32 * 0.2;
            let factor = light_factor(Quat::from_euler(EulerRot::XYZ, angle, angle * 0.5, angle * 0.3));
            assert!((LIGHT_RANGE.0..=LIGHT_RANGE.1).contains(&factor));
        }
    }

    #[test]
    fn sub_quad_of_full_range_is_identity() {
        let corners = [Vec2::new(0.0, 0.0), Vec2::new(4.0, 0.0), Vec2::new(4.0, 2.0), Vec2::new(0.0, 2.0)];
        assert_eq!(sub_quad(&corners, Vec2::ZERO, Vec2::ONE), corners);
        assert_eq!(sub_quad(&corners, Vec2::new(0.0, 0.5), Vec2::ONE)[0], Vec2::new(0.0, 1.0));
    }
}
