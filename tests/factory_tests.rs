use std::collections::HashSet;

use glam::{Vec2, Vec3};
use tile_hero::camera::{Camera, Projection};
use tile_hero::core::SurfaceSize;
use tile_hero::factory::{GridLayout, LayoutPolicy, PaletteEntry, ScatterLayout, ScrollLayout, TileFactory};
use tile_hero::math::Rgb;
use tile_hero::texture::{TextureStyle, TextureSynthesizer};
use tile_hero::tile::Material;

fn palette() -> Vec<PaletteEntry> {
    vec![
        PaletteEntry::new(Rgb::new(0xf5, 0xf5, 0xf0), TextureStyle::Marble),
        PaletteEntry::new(Rgb::new(0xe8, 0xe6, 0xe3), TextureStyle::Plain),
        PaletteEntry::new(Rgb::new(0x8b, 0x73, 0x55), TextureStyle::WoodGrain),
    ]
}

fn flat_factory(seed: u64) -> TileFactory {
    TileFactory::new(palette(), TextureSynthesizer::new(0, false), seed)
}

fn perspective() -> Camera {
    Camera::new(
        Projection::Perspective {
            camera_z: 22.0,
            fov_y_degrees: 50.0,
        },
        SurfaceSize::new(1280, 720),
    )
}

#[cfg(test)]
mod factory_tests {
    use super::*;

    #[test]
    fn test_three_by_three_grid() {
        let view = Camera::new(Projection::Screen, SurfaceSize::new(300, 300)).view_volume();
        let grid = LayoutPolicy::Grid(GridLayout {
            columns: Some(3),
            rows: Some(3),
            spacing: 100.0,
            tile_size: 90.0,
            stagger: 0.04,
            ..GridLayout::default()
        });

        let tiles = flat_factory(1).create_batch(9, &grid, &view, 0.0);
        assert_eq!(tiles.len(), 9);

        let ids: HashSet<u64> = tiles.iter().map(|t| t.id.0).collect();
        assert_eq!(ids.len(), 9);

        for (index, tile) in tiles.iter().enumerate() {
            let (col, row) = ((index % 3) as f32, (index / 3) as f32);
            assert_eq!(tile.target_position, Vec3::new(50.0 + col * 100.0, 50.0 + row * 100.0, 0.0));
            assert_eq!(tile.size, Vec3::new(90.0, 90.0, 0.0));
            assert!((tile.spawn_time - index as f32 * 0.04).abs() < 1e-6);
            assert_eq!(tile.spawn_scale, 0.0);
        }
    }

    #[test]
    fn test_grid_fills_surface_when_unsized() {
        let view = Camera::new(Projection::Screen, SurfaceSize::new(800, 600)).view_volume();
        let grid = GridLayout::default();
        // ceil(800 / 150) + 1 by ceil(600 / 150) + 1
        assert_eq!(grid.dimensions(&view), (7, 5));
    }

    #[test]
    fn test_same_seed_same_layout() {
        let view = perspective().view_volume();
        let policy = LayoutPolicy::ScrollReactive(ScrollLayout::default());
        let a = flat_factory(99).create_batch(10, &policy, &view, 0.0);
        let b = flat_factory(99).create_batch(10, &policy, &view, 0.0);
        let c = flat_factory(100).create_batch(10, &policy, &view, 0.0);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_scroll_tiles_spawn_above_and_rest_inside_view() {
        let view = perspective().view_volume();
        let layout = ScrollLayout::default();
        let tiles = flat_factory(5).create_batch(200, &LayoutPolicy::ScrollReactive(layout), &view, 0.0);

        for tile in &tiles {
            assert!(tile.spawn_position.y > view.half_extent.y, "spawns above the top edge");
            assert!(tile.target_position.x.abs() <= view.half_extent.x * layout.rest_fill + 1e-4);
            assert!(tile.target_position.y.abs() <= view.half_extent.y * layout.rest_fill + 1e-4);
            assert_eq!(tile.spawn_scale, 1.0);
        }

        let planks = tiles.iter().filter(|t| t.size.z == 0.08).count();
        assert!((40..=100).contains(&planks), "{} planks out of 200", planks);
    }

    #[test]
    fn test_scatter_stays_in_volume() {
        let view = perspective().view_volume();
        let layout = ScatterLayout {
            z_range: Vec2::new(-2.0, 1.0),
            ..ScatterLayout::default()
        };
        let tiles = flat_factory(8).create_batch(50, &LayoutPolicy::Scatter(layout), &view, 3.0);
        for (index, tile) in tiles.iter().enumerate() {
            assert!(tile.target_position.x.abs() <= view.half_extent.x + 1e-4);
            assert!(tile.target_position.y.abs() <= view.half_extent.y + 1e-4);
            assert!((-2.0..=1.0).contains(&tile.target_position.z));
            assert_eq!(tile.spawn_position, tile.target_position + layout.entrance_offset);
            assert!((tile.spawn_time - (3.0 + index as f32 * layout.stagger)).abs() < 1e-4);
        }
    }

    #[test]
    fn test_phase_seeds_spread_over_full_turn() {
        let view = perspective().view_volume();
        let tiles = flat_factory(11).create_batch(100, &LayoutPolicy::Scatter(ScatterLayout::default()), &view, 0.0);
        assert!(tiles.iter().all(|t| (0.0..std::f32::consts::TAU).contains(&t.phase_seed)));
        let distinct: HashSet<u32> = tiles.iter().map(|t| t.phase_seed.to_bits()).collect();
        assert!(distinct.len() > 90);
    }

    #[test]
    fn test_textured_styles_get_textures() {
        let view = perspective().view_volume();
        let mut factory = TileFactory::new(palette(), TextureSynthesizer::new(16, true), 3);
        let tiles = factory.create_batch(30, &LayoutPolicy::Scatter(ScatterLayout::default()), &view, 0.0);

        for tile in tiles {
            match &tile.material {
                Material::Textured(texture) => assert_eq!(texture.dimensions(), (16, 16)),
                Material::Flat(color) => assert_eq!(*color, Rgb::new(0xe8, 0xe6, 0xe3)),
            }
        }
    }

    #[test]
    fn test_next_id_advances_per_tile() {
        let view = perspective().view_volume();
        let mut factory = flat_factory(1);
        assert_eq!(factory.next_id().0, 1);
        factory.create_batch(4, &LayoutPolicy::Scatter(ScatterLayout::default()), &view, 0.0);
        assert_eq!(factory.next_id().0, 5);
    }
}
