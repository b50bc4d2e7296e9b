/// Self-contained timers - each decides on its own when to fire

/// Throttle window over absolute timestamps
///
/// The first attempt always fires; later attempts fire only once `window`
/// seconds have passed since the last accepted one. Rejected attempts are
/// dropped and do not extend the window. Elapsed times within float rounding
/// of the window count as a full window.
#[derive(Debug, Clone, Copy)]
pub struct Throttle {
    window: f32,
    last_fire: Option<f32>,
}

impl Throttle {
    /// Create throttle with minimum interval in seconds
    pub fn new(window: f32) -> Self {
        Self {
            window,
            last_fire: None,
        }
    }

    /// Attempt to fire at `now`, returns true if accepted
    pub fn try_fire(&mut self, now: f32) -> bool {
        match self.last_fire {
            Some(last) if now - last < self.window - slack(now) => false,
            _ => {
                self.last_fire = Some(now);
                true
            }
        }
    }

    pub fn window(&self) -> f32 {
        self.window
    }

    pub fn last_fire(&self) -> Option<f32> {
        self.last_fire
    }
}

/// Rounding allowance for a difference of two timestamps near `now`
fn slack(now: f32) -> f32 {
    4.0 * f32::EPSILON * now.abs().max(1.0)
}

/// Periodic timer fed with frame deltas, for once-per-interval reporting
#[derive(Debug, Clone, Copy)]
pub struct Interval {
    interval: f32,
    accumulator: f32,
    ticks: u32,
}

impl Interval {
    pub fn new(interval: f32) -> Self {
        Self {
            interval,
            accumulator: 0.0,
            ticks: 0,
        }
    }

    /// Record one frame; returns the average rate over the elapsed interval when it fires
    pub fn tick(&mut self, delta: f32) -> Option<f32> {
        self.ticks += 1;
        self.accumulator += delta;

        if self.accumulator >= self.interval {
            let rate = self.ticks as f32 / self.accumulator;
            self.accumulator = 0.0;
            self.ticks = 0;
            Some(rate)
        } else {
            None
        }
    }
}
