use std::sync::Arc;

use tile_hero::math::Rgb;
use tile_hero::texture::{Texture, TextureStyle, TextureSynthesizer};
use tile_hero::tile::Material;

const STYLES: [TextureStyle; 4] = [
    TextureStyle::Marble,
    TextureStyle::Stone,
    TextureStyle::WoodGrain,
    TextureStyle::Terrazzo,
];

fn texture_of(material: Material) -> Arc<Texture> {
    match material {
        Material::Textured(texture) => texture,
        Material::Flat(color) => panic!("expected a texture, got flat {}", color),
    }
}

#[cfg(test)]
mod texture_tests {
    use super::*;

    #[test]
    fn test_synthesis_is_deterministic_per_seed() {
        let synth = TextureSynthesizer::new(48, true);
        let base = Rgb::new(0xd4, 0xd2, 0xc8);

        for style in STYLES {
            let a = texture_of(synth.synthesize(style, base, 17));
            let b = texture_of(synth.synthesize(style, base, 17));
            let c = texture_of(synth.synthesize(style, base, 18));
            assert_eq!(a, b, "{:?}", style);
            assert_ne!(a, c, "{:?}", style);
        }
    }

    #[test]
    fn test_resolution_sets_texture_size() {
        for resolution in [1, 16, 150] {
            let synth = TextureSynthesizer::new(resolution, true);
            let texture = texture_of(synth.synthesize(TextureStyle::Marble, Rgb::WHITE, 1));
            assert_eq!(texture.dimensions(), (resolution, resolution));
            assert_eq!(texture.pixels().len(), (resolution * resolution * 4) as usize);
        }
    }

    #[test]
    fn test_textures_are_opaque() {
        let synth = TextureSynthesizer::new(32, true);
        for style in STYLES {
            let texture = texture_of(synth.synthesize(style, Rgb::new(0x8b, 0x73, 0x55), 4));
            assert!(texture.pixels().chunks_exact(4).all(|px| px[3] == 255), "{:?}", style);
        }
    }

    #[test]
    fn test_plain_style_stays_flat() {
        let synth = TextureSynthesizer::new(32, true);
        let base = Rgb::new(0xa8, 0x9f, 0x91);
        let material = synth.synthesize(TextureStyle::Plain, base, 9);
        assert_eq!(material, Material::Flat(base));
        assert_eq!(material.base_color(), base);
    }

    #[test]
    fn test_wood_grain_stays_near_base_colour() {
        let synth = TextureSynthesizer::new(64, true);
        let base = Rgb::new(0xc9, 0xb8, 0xa3);
        let average = texture_of(synth.synthesize(TextureStyle::WoodGrain, base, 2)).average();
        for (got, want) in [(average.r, base.r), (average.g, base.g), (average.b, base.b)] {
            assert!((got as i32 - want as i32).abs() < 24, "{} vs {}", average, base);
        }
    }
}
