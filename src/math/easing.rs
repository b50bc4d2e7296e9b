use serde::{Deserialize, Serialize};

/// Entrance easing curves
///
/// Every curve maps [0, 1] onto [0, 1], is monotonic and has zero slope at 1,
/// so a tile never snaps when it reaches its resting transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    #[default]
    EaseOutCubic,
    Smoothstep,
    EaseInOutCubic,
}

impl Easing {
    /// Evaluate the curve; input is clamped first
    pub fn apply(self, t: f32) -> f32 {
        let t = clamp01(t);
        match self {
            Easing::EaseOutCubic => {
                let inv = 1.0 - t;
                1.0 - inv * inv * inv
            }
            Easing::Smoothstep => smoothstep(t),
            Easing::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let inv = -2.0 * t + 2.0;
                    1.0 - inv * inv * inv / 2.0
                }
            }
        }
    }
}

/// Clamp to [0, 1]; NaN maps to 0
pub fn clamp01(t: f32) -> f32 {
    if t.is_nan() {
        0.0
    } else {
        t.clamp(0.0, 1.0)
    }
}

pub fn smoothstep(t: f32) -> f32 {
    let t = clamp01(t);
    t * t * (3.0 - 2.0 * t)
}
