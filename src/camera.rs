use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};
use serde::{Deserialize, Serialize};

use crate::core::SurfaceSize;
use crate::factory::ViewVolume;

const NEAR: f32 = 0.1;
const FAR: f32 = 200.0;

/// How world positions map onto the drawing surface
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Projection {
    /// World units are surface pixels, y grows downward
    #[default]
    Screen,
    /// Camera on the +z axis looking at the origin, y up
    Perspective { camera_z: f32, fov_y_degrees: f32 },
}

/// Projection bound to a surface size
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    projection: Projection,
    size: SurfaceSize,
    view_proj: Mat4,
}

impl Camera {
    pub fn new(projection: Projection, size: SurfaceSize) -> Self {
        let view_proj = match projection {
            Projection::Screen => Mat4::IDENTITY,
            Projection::Perspective { camera_z, fov_y_degrees } => {
                let aspect = size.width.max(1) as f32 / size.height.max(1) as f32;
                let proj = Mat4::perspective_rh(fov_y_degrees.to_radians(), aspect, NEAR, FAR);
                let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, camera_z), Vec3::ZERO, Vec3::Y);
                proj * view
            }
        };

        Self {
            projection,
            size,
            view_proj,
        }
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    /// Whether world y grows toward the top of the surface
    pub fn y_up(&self) -> bool {
        matches!(self.projection, Projection::Perspective { .. })
    }

    /// Surface pixel of a world point, None when behind the camera
    pub fn project(&self, point: Vec3) -> Option<Vec2> {
        match self.projection {
            Projection::Screen => Some(point.truncate()),
            Projection::Perspective { .. } => {
                let clip = self.view_proj * point.extend(1.0);
                if clip.w <= NEAR {
                    return None;
                }
                let ndc = clip.xy() / clip.w;
                Some(Vec2::new(
                    (ndc.x * 0.5 + 0.5) * self.size.width as f32,
                    (0.5 - ndc.y * 0.5) * self.size.height as f32,
                ))
            }
        }
    }

    /// World box visible at z = 0, the plane layouts are relative to
    pub fn view_volume(&self) -> ViewVolume {
        let (width, height) = (self.size.width as f32, self.size.height as f32);
        match self.projection {
            Projection::Screen => ViewVolume {
                center: Vec3::new(width / 2.0, height / 2.0, 0.0),
                half_extent: Vec3::new(width / 2.0, height / 2.0, 0.0),
                y_up: false,
            },
            Projection::Perspective { camera_z, fov_y_degrees } => {
                let half_height = camera_z * (fov_y_degrees.to_radians() * 0.5).tan();
                let aspect = width.max(1.0) / height.max(1.0);
                ViewVolume {
                    center: Vec3::ZERO,
                    half_extent: Vec3::new(half_height * aspect, half_height, 0.0),
                    y_up: true,
                }
            }
        }
    }
}
