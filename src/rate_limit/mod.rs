//! Leading-edge throttling and trailing-edge debouncing.
//!
//! Both limiters are pure data: every call takes the current `Instant`, so the
//! event loop decides what "now" is and tests can step time explicitly. Nothing
//! here owns a thread or a timer; a pending debounce is just a stored deadline
//! that the owner polls with [`Debounce::fire_if_due`]. Dropping the owner drops
//! the deadline, which is how a destroyed view's timers are cancelled.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Default window for both limiters, in milliseconds.
pub const DEFAULT_WINDOW_MS: u64 = 100;

/// Where a limiter reads its window from.
///
/// `Shared` is re-read on every use, so a configuration change applies to the
/// next burst without rebuilding any limiter.
#[derive(Debug, Clone)]
pub enum DurationSource {
    /// A window fixed at construction.
    Fixed(Duration),
    /// A window owned by the configuration and shared by every limiter.
    Shared(Rc<Cell<Duration>>),
}

impl DurationSource {
    /// Create a new shared source with the given initial window.
    pub fn shared(initial: Duration) -> Self {
        Self::Shared(Rc::new(Cell::new(initial)))
    }

    /// Current window.
    pub fn get(&self) -> Duration {
        match self {
            Self::Fixed(d) => *d,
            Self::Shared(cell) => cell.get(),
        }
    }

    /// Change the window. A fixed source is replaced in place; a shared source
    /// updates every limiter reading it.
    pub fn set(&mut self, window: Duration) {
        match self {
            Self::Fixed(d) => *d = window,
            Self::Shared(cell) => cell.set(window),
        }
    }
}

impl Default for DurationSource {
    fn default() -> Self {
        Self::Fixed(Duration::from_millis(DEFAULT_WINDOW_MS))
    }
}

/// Leading-edge throttle.
///
/// The first event of a window is admitted immediately; every other event
/// inside the window is dropped, not queued.
#[derive(Debug, Clone)]
pub struct Throttle {
    window: DurationSource,
    last_admitted: Option<Instant>,
}

impl Throttle {
    /// Creates a throttle reading its window from `window`.
    pub fn new(window: DurationSource) -> Self {
        Self {
            window,
            last_admitted: None,
        }
    }

    /// Returns true if an event arriving at `now` should run.
    pub fn admit(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_admitted {
            if now.saturating_duration_since(last) < self.window.get() {
                return false;
            }
        }
        self.last_admitted = Some(now);
        true
    }
}

/// Trailing-edge debounce.
///
/// Every `schedule` pushes the deadline out to `now + window`. The callback is
/// owed once the deadline passes with no further `schedule`.
#[derive(Debug, Clone)]
pub struct Debounce {
    window: DurationSource,
    deadline: Option<Instant>,
}

impl Debounce {
    /// Creates a debounce reading its window from `window`.
    pub fn new(window: DurationSource) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    /// Register an event at `now`, restarting the quiet period.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.window.get());
    }

    /// Returns true exactly once per burst, on the first poll at or after the
    /// deadline. Clears the deadline when it fires.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Drop the pending deadline, if any.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// When the pending callback is due.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns true while a callback is owed.
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }
}

/// Earliest of two optional deadlines.
pub fn earliest(a: Option<Instant>, b: Option<Instant>) -> Option<Instant> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn throttle_admits_first_event() {
        let mut throttle = Throttle::new(DurationSource::Fixed(ms(100)));
        assert!(throttle.admit(Instant::now()));
    }

    #[test]
    fn throttle_drops_events_inside_window() {
        let mut throttle = Throttle::new(DurationSource::Fixed(ms(100)));
        let t0 = Instant::now();

        let admitted = (0..10)
            .filter(|i| throttle.admit(t0 + ms(i * 9)))
            .count();

        assert_eq!(admitted, 1, "Only the leading event of the burst should run");
    }

    #[test]
    fn throttle_admits_again_after_window() {
        let mut throttle = Throttle::new(DurationSource::Fixed(ms(100)));
        let t0 = Instant::now();

        assert!(throttle.admit(t0));
        assert!(!throttle.admit(t0 + ms(99)));
        assert!(throttle.admit(t0 + ms(100)));
    }

    #[test]
    fn debounce_does_not_fire_before_deadline() {
        let mut debounce = Debounce::new(DurationSource::Fixed(ms(100)));
        let t0 = Instant::now();
        debounce.schedule(t0);

        assert!(!debounce.fire_if_due(t0));
        assert!(!debounce.fire_if_due(t0 + ms(99)));
        assert!(debounce.is_pending());
    }

    #[test]
    fn debounce_fires_once_after_silence() {
        let mut debounce = Debounce::new(DurationSource::Fixed(ms(100)));
        let t0 = Instant::now();
        debounce.schedule(t0);

        assert!(debounce.fire_if_due(t0 + ms(100)));
        assert!(!debounce.fire_if_due(t0 + ms(200)), "Must not fire twice");
        assert!(!debounce.is_pending());
    }

    #[test]
    fn debounce_burst_coalesces_to_last_event() {
        let mut debounce = Debounce::new(DurationSource::Fixed(ms(100)));
        let t0 = Instant::now();

        // Events at 0, 50, 100, 150: each restarts the window
        for i in 0..4 {
            debounce.schedule(t0 + ms(i * 50));
            assert!(!debounce.fire_if_due(t0 + ms(i * 50)));
        }

        assert!(!debounce.fire_if_due(t0 + ms(249)));
        assert_eq!(debounce.deadline(), Some(t0 + ms(250)));
        assert!(debounce.fire_if_due(t0 + ms(250)));
    }

    #[test]
    fn debounce_cancel_drops_deadline() {
        let mut debounce = Debounce::new(DurationSource::Fixed(ms(100)));
        let t0 = Instant::now();
        debounce.schedule(t0);
        debounce.cancel();

        assert!(!debounce.fire_if_due(t0 + ms(500)));
        assert_eq!(debounce.deadline(), None);
    }

    #[test]
    fn shared_source_is_reread_on_schedule() {
        let source = DurationSource::shared(ms(100));
        let mut debounce = Debounce::new(source.clone());
        let mut config = source;
        let t0 = Instant::now();

        config.set(ms(300));
        debounce.schedule(t0);

        assert_eq!(debounce.deadline(), Some(t0 + ms(300)));
    }

    #[test]
    fn earliest_picks_minimum() {
        let t0 = Instant::now();
        assert_eq!(earliest(Some(t0 + ms(5)), Some(t0)), Some(t0));
        assert_eq!(earliest(None, Some(t0)), Some(t0));
        assert_eq!(earliest(Some(t0), None), Some(t0));
        assert_eq!(earliest(None, None), None);
    }
}
