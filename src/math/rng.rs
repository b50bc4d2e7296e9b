use rand::rngs::StdRng;
use rand::SeedableRng;

pub type TileRng = StdRng;

/// Deterministic generator for one tile
///
/// The same `(id, salt)` pair always yields the same stream, so a tile
/// re-synthesises an identical texture no matter when it is evaluated.
pub fn tile_rng(id: u64, salt: u64) -> TileRng {
    // splitmix64 finaliser spreads consecutive ids across the seed space
    let mut z = id
        .wrapping_add(salt.rotate_left(32))
        .wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    StdRng::seed_from_u64(z ^ (z >> 31))
}
