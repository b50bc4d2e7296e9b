//! Scroll-driven spawning.
//!
//! A [`ScrollSignal`] is a read-only, shareable stream of scroll positions.
//! The [`SpawnController`] owns one [`ScrollSubscription`] to it and turns
//! scroll deltas into throttled, size-bounded spawn requests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};

use crate::core::Throttle;

/// One observed scroll position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollSample {
    pub position: f32,
    pub time: f32,
}

type Inbox = RefCell<VecDeque<ScrollSample>>;

#[derive(Debug, Default)]
struct SignalState {
    position: f32,
    subscribers: Vec<Weak<Inbox>>,
}

/// Publisher side of the scroll stream
///
/// Cloning yields another handle to the same stream. Subscribers never
/// mutate it; each receives its own copy of every published sample.
#[derive(Debug, Clone, Default)]
pub struct ScrollSignal {
    state: Rc<RefCell<SignalState>>,
}

impl ScrollSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish an absolute scroll position observed at `time`
    pub fn publish(&self, position: f32, time: f32) {
        let mut state = self.state.borrow_mut();
        state.position = position;
        let sample = ScrollSample { position, time };
        state.subscribers.retain(|weak| match weak.upgrade() {
            Some(inbox) => {
                inbox.borrow_mut().push_back(sample);
                true
            }
            None => false,
        });
    }

    /// Publish a position relative to the current one
    pub fn scroll_by(&self, delta: f32, time: f32) {
        let position = self.position() + delta;
        self.publish(position, time);
    }

    pub fn position(&self) -> f32 {
        self.state.borrow().position
    }

    pub fn subscribe(&self) -> ScrollSubscription {
        let inbox = Rc::new(RefCell::new(VecDeque::new()));
        let mut state = self.state.borrow_mut();
        state.subscribers.push(Rc::downgrade(&inbox));
        ScrollSubscription {
            inbox,
            origin: state.position,
        }
    }

    /// Live subscriptions; disposed ones no longer count
    pub fn subscriber_count(&self) -> usize {
        self.state
            .borrow()
            .subscribers
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}

/// Receiving side of a [`ScrollSignal`]
///
/// Dropping or disposing it unregisters it from the signal.
#[derive(Debug)]
pub struct ScrollSubscription {
    inbox: Rc<Inbox>,
    origin: f32,
}

impl ScrollSubscription {
    /// Scroll position at the moment of subscribing
    pub fn origin(&self) -> f32 {
        self.origin
    }

    /// Take every sample received since the last drain, oldest first
    pub fn drain(&mut self) -> Vec<ScrollSample> {
        self.inbox.borrow_mut().drain(..).collect()
    }

    pub fn dispose(self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Minimum seconds between accepted spawn triggers
    pub throttle_window: f32,
    /// Scroll deltas of this magnitude or less are ignored
    pub min_delta: f32,
    /// Scroll distance that earns one extra tile in a batch
    pub lines_per_tile: f32,
    pub max_batch: usize,
    /// Tiles spawned on mount
    pub initial_batch: usize,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            throttle_window: 0.06,
            min_delta: 2.0,
            lines_per_tile: 120.0,
            max_batch: 5,
            initial_batch: 6,
        }
    }
}

/// A request for `count` new tiles, triggered at `time`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRequest {
    pub count: usize,
    pub time: f32,
}

/// Turns scroll deltas into spawn requests
///
/// Signals inside the throttle window are dropped, never queued.
#[derive(Debug)]
pub struct SpawnController {
    config: SpawnConfig,
    throttle: Throttle,
    last_scroll: f32,
    subscription: Option<ScrollSubscription>,
}

impl SpawnController {
    pub fn new(config: SpawnConfig, subscription: Option<ScrollSubscription>) -> Self {
        let last_scroll = subscription.as_ref().map_or(0.0, ScrollSubscription::origin);
        Self {
            throttle: Throttle::new(config.throttle_window),
            config,
            last_scroll,
            subscription,
        }
    }

    pub fn config(&self) -> &SpawnConfig {
        &self.config
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Feed one scroll observation
    pub fn on_scroll(&mut self, position: f32, time: f32) -> Option<SpawnRequest> {
        let delta = position - self.last_scroll;
        self.last_scroll = position;

        if delta.abs() <= self.config.min_delta {
            return None;
        }
        if !self.throttle.try_fire(time) {
            log::trace!("scroll delta {:.1} at {:.3}s throttled", delta, time);
            return None;
        }

        Some(SpawnRequest {
            count: self.batch_size(delta),
            time,
        })
    }

    /// Process everything the subscription received since the last poll
    pub fn poll(&mut self) -> Vec<SpawnRequest> {
        let samples = match self.subscription.as_mut() {
            Some(subscription) => subscription.drain(),
            None => return Vec::new(),
        };
        samples
            .into_iter()
            .filter_map(|sample| self.on_scroll(sample.position, sample.time))
            .collect()
    }

    /// Tiles to spawn for a scroll delta; grows with `|delta|`, capped at `max_batch`
    pub fn batch_size(&self, delta: f32) -> usize {
        let steps = (delta.abs() / self.config.lines_per_tile.max(f32::EPSILON)).floor() as usize;
        (steps + 1).min(self.config.max_batch)
    }

    /// Drop the scroll subscription; later polls produce nothing
    pub fn dispose(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(window: f32) -> SpawnConfig {
        SpawnConfig {
            throttle_window: window,
            min_delta: 1.0,
            lines_per_tile: 100.0,
            max_batch: 4,
            initial_batch: 0,
        }
    }

    #[test]
    fn batch_size_is_monotonic_and_capped() {
        let controller = SpawnController::new(config(0.1), None);
        assert_eq!(controller.batch_size(5.0), 1);
        assert_eq!(controller.batch_size(150.0), 2);
        assert_eq!(controller.batch_size(-150.0), 2);
        assert_eq!(controller.batch_size(10_000.0), 4);

        let mut previous = 0;
        for step in 0..100 {
            let size = controller.batch_size(step as f32 * 13.0);
            assert!(size >= previous);
            previous = size;
        }
    }

    #[test]
    fn small_delta_does_not_consume_window() {
        let mut controller = SpawnController::new(config(0.1), None);
        assert_eq!(controller.on_scroll(0.5, 0.0), None);
        assert!(controller.on_scroll(50.0, 0.01).is_some());
    }

    #[test]
    fn throttled_signal_still_moves_last_scroll() {
        let mut controller = SpawnController::new(config(0.1), None);
        assert!(controller.on_scroll(100.0, 0.0).is_some());
        assert!(controller.on_scroll(300.0, 0.05).is_none());
        // delta measured from 300, not from 100
        let request = controller.on_scroll(350.0, 0.2).expect("outside window");
        assert_eq!(request.count, 1);
    }

    #[test]
    fn subscription_unregisters_on_drop() {
        let signal = ScrollSignal::new();
        let first = signal.subscribe();
        let second = signal.subscribe();
        assert_eq!(signal.subscriber_count(), 2);
        drop(first);
        second.dispose();
        assert_eq!(signal.subscriber_count(), 0);
        signal.publish(10.0, 0.0);
    }

    #[test]
    fn subscription_starts_from_current_position() {
        let signal = ScrollSignal::new();
        signal.publish(500.0, 0.0);
        let mut controller = SpawnController::new(config(0.1), Some(signal.subscribe()));
        signal.publish(500.5, 0.2);
        assert!(controller.poll().is_empty());
    }
}
