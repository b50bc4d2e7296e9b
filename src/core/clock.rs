use std::time::Instant;

/// Monotonic animation time in seconds, zero at the moment the scene mounts
///
/// Never reset: tile timing is expressed relative to each tile's spawn time,
/// and frame deltas are derived from consecutive readings.
#[derive(Debug, Clone, Copy)]
pub struct AnimationClock {
    origin: Instant,
}

impl AnimationClock {
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Seconds since `start`
    pub fn now(&self) -> f32 {
        self.origin.elapsed().as_secs_f32()
    }
}

impl Default for AnimationClock {
    fn default() -> Self {
        Self::start()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn animation_clock_is_monotonic() {
        let clock = AnimationClock::start();
        let a = clock.now();
        thread::sleep(Duration::from_millis(10));
        let b = clock.now();
        assert!(a >= 0.0);
        assert!(b - a >= 0.009);
    }

    #[test]
    fn copies_share_the_origin() {
        let clock = AnimationClock::start();
        let copy = clock;
        thread::sleep(Duration::from_millis(2));
        assert!((copy.now() - clock.now()).abs() < 0.005);
    }
}
