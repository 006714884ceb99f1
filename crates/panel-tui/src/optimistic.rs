//! Optimistic values for actions whose effect the backend confirms later.
//!
//! When the user seeks, the new position is shown at once.  For a short
//! window afterwards, status polls that still carry the old position are
//! ignored; once the window has passed, the backend's value wins again.
//!
//! ```text
//!  Confirmed(T)                 backend value; render normally
//!  Pending { intended, since }  user value; backend updates ignored until
//!                               `window` has elapsed
//! ```

use std::time::{Duration, Instant};

/// How long a seek target overrides polled positions.
pub const SEEK_WINDOW: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, PartialEq)]
pub enum Optimistic<T: Clone + PartialEq> {
    Confirmed(T),
    Pending { intended: T, since: Instant },
}

impl<T: Clone + PartialEq> Optimistic<T> {
    pub fn new(value: T) -> Self {
        Self::Confirmed(value)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    pub fn set_intent(&mut self, intended: T) {
        self.set_intent_at(intended, Instant::now());
    }

    pub fn set_intent_at(&mut self, intended: T, now: Instant) {
        *self = Self::Pending {
            intended,
            since: now,
        };
    }

    /// A backend value arrived.  Ignored while a pending intent is inside
    /// `window`, unless `settled(intended, value)` holds; returns `true` if
    /// the shown value was replaced.
    pub fn on_confirmed_where(
        &mut self,
        value: T,
        window: Duration,
        now: Instant,
        settled: impl FnOnce(&T, &T) -> bool,
    ) -> bool {
        if let Self::Pending { intended, since } = self {
            if now.saturating_duration_since(*since) < window && !settled(intended, &value) {
                return false;
            }
        }
        *self = Self::Confirmed(value);
        true
    }

    /// The request behind the intent failed: drop back to `value`.
    pub fn revert(&mut self, value: T) {
        *self = Self::Confirmed(value);
    }
}

impl<T: Clone + PartialEq + Default> Default for Optimistic<T> {
    fn default() -> Self {
        Self::Confirmed(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shown(pos: &Optimistic<u64>) -> u64 {
        match pos {
            Optimistic::Confirmed(v) => *v,
            Optimistic::Pending { intended, .. } => *intended,
        }
    }

    fn never(_: &u64, _: &u64) -> bool {
        false
    }

    #[test]
    fn test_poll_inside_window_is_ignored() {
        let t0 = Instant::now();
        let mut pos = Optimistic::new(10_000u64);
        pos.set_intent_at(70_000, t0);
        assert_eq!(shown(&pos), 70_000);

        let changed =
            pos.on_confirmed_where(11_000, SEEK_WINDOW, t0 + Duration::from_millis(400), never);
        assert!(!changed);
        assert_eq!(shown(&pos), 70_000);
        assert!(pos.is_pending());
    }

    #[test]
    fn test_poll_after_window_wins() {
        let t0 = Instant::now();
        let mut pos = Optimistic::new(10_000u64);
        pos.set_intent_at(70_000, t0);
        let changed =
            pos.on_confirmed_where(71_200, SEEK_WINDOW, t0 + Duration::from_millis(1200), never);
        assert!(changed);
        assert_eq!(pos, Optimistic::Confirmed(71_200));
    }

    #[test]
    fn test_settled_value_ends_window_early() {
        let t0 = Instant::now();
        let mut pos = Optimistic::new(10_000u64);
        pos.set_intent_at(70_000, t0);
        let reached = |target: &u64, server: &u64| *server >= *target;
        assert!(!pos.on_confirmed_where(10_300, SEEK_WINDOW, t0, reached));
        assert!(pos.on_confirmed_where(70_100, SEEK_WINDOW, t0, reached));
        assert!(!pos.is_pending());
    }

    #[test]
    fn test_confirmed_always_follows_backend() {
        let mut pos = Optimistic::new(0u64);
        assert!(pos.on_confirmed_where(5_000, SEEK_WINDOW, Instant::now(), never));
        assert_eq!(shown(&pos), 5_000);
    }

    #[test]
    fn test_revert() {
        let mut pos = Optimistic::new(1u64);
        pos.set_intent(9);
        pos.revert(1);
        assert!(!pos.is_pending());
        assert_eq!(shown(&pos), 1);
    }
}
