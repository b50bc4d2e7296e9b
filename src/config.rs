//! Engine configuration: one serde-friendly struct per concern, plus a preset
//! for each visual variant.

use std::fs;
use std::path::Path;

use clap::ValueEnum;
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::animator::AnimatorConfig;
use crate::camera::Projection;
use crate::error::{EngineError, Result};
use crate::factory::{GridLayout, LayoutPolicy, PaletteEntry, ScatterLayout, ScrollLayout};
use crate::math::{Easing, Rgb};
use crate::render::RenderConfig;
use crate::spawn::SpawnConfig;
use crate::texture::TextureStyle;

/// Built-in visual variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// Flat tile wall assembling row by row, then floating
    #[default]
    Canvas,
    /// Tiles raining in from above while the page scrolls
    Scroll3d,
    /// Slow drifting stone tiles
    Ambient,
}

impl Variant {
    pub fn name(self) -> &'static str {
        match self {
            Variant::Canvas => "canvas",
            Variant::Scroll3d => "scroll3d",
            Variant::Ambient => "ambient",
        }
    }

    pub fn preset(self) -> EngineConfig {
        match self {
            Variant::Canvas => canvas_preset(),
            Variant::Scroll3d => scroll3d_preset(),
            Variant::Ambient => ambient_preset(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureConfig {
    pub enabled: bool,
    /// Square texture size in pixels
    pub resolution: u32,
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            resolution: 128,
        }
    }
}

/// Largest square texture the synthesiser will paint
pub const MAX_TEXTURE_RESOLUTION: u32 = 4096;

/// Everything a `SceneHost` needs, loadable from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub variant_name: String,
    pub background: Rgb,
    pub palette: Vec<PaletteEntry>,
    pub layout: LayoutPolicy,
    pub animator: AnimatorConfig,
    /// Maximum live tiles; the oldest are evicted first
    pub capacity: usize,
    pub spawn: SpawnConfig,
    pub texture: TextureConfig,
    pub render: RenderConfig,
    /// Fixed seed for reproducible layouts; random when unset
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        canvas_preset()
    }
}

impl EngineConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parse and validate; missing fields take their defaults
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(EngineError::InvalidConfig(msg));

        if !is_positive(self.animator.entrance_duration) {
            return invalid(format!(
                "animator.entrance_duration must be positive, got {}",
                self.animator.entrance_duration
            ));
        }
        if self.capacity == 0 {
            return invalid("capacity must be at least 1".to_string());
        }
        if !is_positive(self.spawn.throttle_window) {
            return invalid(format!(
                "spawn.throttle_window must be positive, got {}",
                self.spawn.throttle_window
            ));
        }
        if self.spawn.max_batch == 0 {
            return invalid("spawn.max_batch must be at least 1".to_string());
        }
        if !is_positive(self.spawn.lines_per_tile) {
            return invalid(format!(
                "spawn.lines_per_tile must be positive, got {}",
                self.spawn.lines_per_tile
            ));
        }
        if self.palette.is_empty() {
            return invalid("palette must contain at least one colour".to_string());
        }
        if self.animator.idle_amplitude < 0.0 || self.animator.idle_rotation_amplitude < 0.0 {
            return invalid("idle amplitudes must not be negative".to_string());
        }
        if !(0.0..=1.0).contains(&self.render.opacity) {
            return invalid(format!("render.opacity must be in [0, 1], got {}", self.render.opacity));
        }
        if self.texture.resolution > MAX_TEXTURE_RESOLUTION {
            return invalid(format!(
                "texture.resolution must be at most {}, got {}",
                MAX_TEXTURE_RESOLUTION, self.texture.resolution
            ));
        }
        if let LayoutPolicy::Grid(grid) = &self.layout {
            if !is_positive(grid.spacing) {
                return invalid(format!("layout.spacing must be positive, got {}", grid.spacing));
            }
            if !is_positive(grid.stagger) {
                return invalid(format!("layout.stagger must be positive, got {}", grid.stagger));
            }
        }
        Ok(())
    }
}

/// Positive and finite; rejects NaN
fn is_positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

fn entry(hex: u32, style: TextureStyle) -> PaletteEntry {
    let color = Rgb::new((hex >> 16) as u8, (hex >> 8) as u8, hex as u8);
    PaletteEntry::new(color, style)
}

fn canvas_preset() -> EngineConfig {
    use TextureStyle::*;

    EngineConfig {
        variant_name: Variant::Canvas.name().to_string(),
        background: Rgb::new(0x1a, 0x1e, 0x24),
        palette: vec![
            entry(0xf5f5f0, Marble),
            entry(0xe8e6e3, Plain),
            entry(0xd4d2c8, Terrazzo),
            entry(0xc9b8a3, WoodGrain),
            entry(0x8b7355, WoodGrain),
            entry(0xa89f91, Plain),
            entry(0xf0ebe5, Marble),
            entry(0x5d4e37, WoodGrain),
        ],
        layout: LayoutPolicy::Grid(GridLayout::default()),
        animator: AnimatorConfig {
            entrance_duration: 0.6,
            easing: Easing::EaseOutCubic,
            idle_amplitude: 3.0,
            idle_frequency: 0.75,
            idle_rotation_amplitude: 0.0,
            idle_settle: 0.5,
            max_age: None,
            fade_out: 0.0,
            min_y: None,
        },
        capacity: 512,
        spawn: SpawnConfig::default(),
        texture: TextureConfig {
            enabled: true,
            resolution: 150,
        },
        render: RenderConfig::default(),
        seed: None,
    }
}

fn scroll3d_preset() -> EngineConfig {
    use TextureStyle::*;

    EngineConfig {
        variant_name: Variant::Scroll3d.name().to_string(),
        background: Rgb::new(0x1a, 0x1e, 0x24),
        palette: vec![
            entry(0xe9e6df, Plain),
            entry(0xdcd7cf, Plain),
            entry(0xc9c1b6, Stone),
            entry(0xb59c7a, Plain),
            entry(0x8b7355, WoodGrain),
            entry(0x7b5b3b, WoodGrain),
            entry(0xb28a67, Plain),
            entry(0x8a8f9a, Stone),
            entry(0xa0826d, Plain),
            entry(0x3f3f3f, Plain),
        ],
        layout: LayoutPolicy::ScrollReactive(ScrollLayout::default()),
        animator: AnimatorConfig {
            entrance_duration: 1.4,
            easing: Easing::EaseOutCubic,
            idle_amplitude: 0.15,
            idle_frequency: 1.2,
            idle_rotation_amplitude: 0.12,
            idle_settle: 0.8,
            max_age: Some(14.0),
            fade_out: 1.0,
            min_y: None,
        },
        capacity: 48,
        spawn: SpawnConfig {
            throttle_window: 0.06,
            min_delta: 2.0,
            lines_per_tile: 120.0,
            max_batch: 5,
            initial_batch: 6,
        },
        texture: TextureConfig {
            enabled: true,
            resolution: 64,
        },
        render: RenderConfig {
            projection: Projection::Perspective {
                camera_z: 22.0,
                fov_y_degrees: 50.0,
            },
            opacity: 0.65,
            grout: None,
            grout_width: 0.0,
            shine: false,
            shadow: false,
            lighting: true,
        },
        seed: None,
    }
}

fn ambient_preset() -> EngineConfig {
    use TextureStyle::*;

    EngineConfig {
        variant_name: Variant::Ambient.name().to_string(),
        background: Rgb::new(0x14, 0x17, 0x1c),
        palette: vec![
            entry(0xc9c1b6, Stone),
            entry(0x8a8f9a, Stone),
            entry(0xd4d2c8, Terrazzo),
            entry(0xe9e6df, Terrazzo),
            entry(0x5f5a52, Stone),
        ],
        layout: LayoutPolicy::Scatter(ScatterLayout {
            size_min: Vec2::new(0.8, 0.8),
            size_max: Vec2::new(1.6, 1.6),
            depth: 0.1,
            z_range: Vec2::new(-8.0, 1.0),
            max_tilt: 0.5,
            stagger: 0.15,
            spawn_scale: 0.6,
            entrance_offset: Vec3::new(0.0, -3.0, 0.0),
        }),
        animator: AnimatorConfig {
            entrance_duration: 2.0,
            easing: Easing::Smoothstep,
            idle_amplitude: 0.25,
            idle_frequency: 0.5,
            idle_rotation_amplitude: 0.08,
            idle_settle: 1.5,
            max_age: None,
            fade_out: 0.0,
            min_y: None,
        },
        capacity: 32,
        spawn: SpawnConfig {
            initial_batch: 18,
            ..SpawnConfig::default()
        },
        texture: TextureConfig {
            enabled: true,
            resolution: 64,
        },
        render: RenderConfig {
            projection: Projection::Perspective {
                camera_z: 22.0,
                fov_y_degrees: 50.0,
            },
            opacity: 0.9,
            grout: None,
            grout_width: 0.0,
            shine: false,
            shadow: false,
            lighting: true,
        },
        seed: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Variant; 3] = [Variant::Canvas, Variant::Scroll3d, Variant::Ambient];

    #[test]
    fn presets_are_valid() {
        for variant in ALL {
            let config = variant.preset();
            assert!(config.validate().is_ok(), "{} preset invalid", variant.name());
            assert_eq!(config.variant_name, variant.name());
        }
    }

    #[test]
    fn scroll3d_preset_values() {
        let config = Variant::Scroll3d.preset();
        assert_eq!(config.capacity, 48);
        assert_eq!(config.palette.len(), 10);
        assert_eq!(config.spawn.initial_batch, 6);
        assert!(config.layout.is_scroll_reactive());
        // tiles settle above the floor, so age is the only expiry
        assert_eq!(config.animator.max_age, Some(14.0));
        assert_eq!(config.animator.min_y, None);
    }

    #[test]
    fn partial_json_takes_defaults() {
        let config = EngineConfig::from_json_str(r##"{ "capacity": 7, "background": "#000000" }"##)
            .expect("valid partial config");
        assert_eq!(config.capacity, 7);
        assert_eq!(config.background, Rgb::BLACK);
        assert_eq!(config.palette, Variant::Canvas.preset().palette);
    }

    #[test]
    fn json_round_trip_preserves_preset() {
        let config = Variant::Scroll3d.preset();
        let json = config.to_json_pretty().expect("serialize");
        assert_eq!(EngineConfig::from_json_str(&json).expect("parse"), config);
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let base = Variant::Canvas.preset();

        let mut zero_capacity = base.clone();
        zero_capacity.capacity = 0;
        assert!(matches!(zero_capacity.validate(), Err(EngineError::InvalidConfig(_))));

        let mut no_palette = base.clone();
        no_palette.palette.clear();
        assert!(no_palette.validate().is_err());

        let mut bad_duration = base.clone();
        bad_duration.animator.entrance_duration = 0.0;
        assert!(bad_duration.validate().is_err());

        let mut bad_window = base.clone();
        bad_window.spawn.throttle_window = -1.0;
        assert!(bad_window.validate().is_err());

        let mut bad_amplitude = base.clone();
        bad_amplitude.animator.idle_amplitude = -0.5;
        assert!(bad_amplitude.validate().is_err());
    }

    #[test]
    fn validate_bounds_texture_resolution() {
        let mut config = Variant::Canvas.preset();
        config.texture.resolution = MAX_TEXTURE_RESOLUTION;
        assert!(config.validate().is_ok());

        config.texture.resolution = 70_000;
        assert!(matches!(config.validate(), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn validate_rejects_non_positive_grid_stagger() {
        for stagger in [0.0, -0.04, f32::NAN] {
            let mut config = Variant::Canvas.preset();
            if let LayoutPolicy::Grid(grid) = &mut config.layout {
                grid.stagger = stagger;
            }
            assert!(config.validate().is_err(), "stagger {}", stagger);
        }

        let json = r#"{ "layout": { "kind": "grid", "spacing": 0.0 } }"#;
        assert!(EngineConfig::from_json_str(json).is_err());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            EngineConfig::from_json_str("{ not json"),
            Err(EngineError::ConfigParse(_))
        ));
    }
}
