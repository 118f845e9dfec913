//! Time sources and the alarm schedule that drives the session timer.
//!
//! The timer never sleeps. It asks its [`Clock`] for the elapsed time and
//! fires whatever alarms in the [`Scheduler`] have come due, which lets tests
//! move a [`ManualClock`] forward instead of waiting on wall-clock time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Interval between countdown ticks while running.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Pause between a session completing and the automatic mode switch.
pub const AUTO_SWITCH_DELAY: Duration = Duration::from_secs(2);

/// Monotonic time source, measured from an arbitrary origin.
pub trait Clock: Send {
    fn now(&self) -> Duration;
}

/// Clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Virtual clock advanced by hand. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        let by = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        // Saturates instead of wrapping; the closure always returns Some.
        let _ = self
            .millis
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |millis| {
                Some(millis.saturating_add(by))
            });
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

/// Alarms the session timer can have outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alarm {
    Tick,
    AutoSwitch,
}

#[derive(Debug, Clone, Copy)]
struct Repeating {
    next: Duration,
    period: Duration,
}

/// At most one repeating tick and one pending auto-switch.
#[derive(Debug, Default)]
pub struct Scheduler {
    tick: Option<Repeating>,
    auto_switch: Option<Duration>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts (or restarts) the tick, first firing one period after `now`.
    pub fn start_ticking(&mut self, now: Duration, period: Duration) {
        self.tick = Some(Repeating {
            next: now + period,
            period,
        });
    }

    pub fn stop_ticking(&mut self) {
        self.tick = None;
    }

    pub fn is_ticking(&self) -> bool {
        self.tick.is_some()
    }

    pub fn schedule_auto_switch(&mut self, at: Duration) {
        self.auto_switch = Some(at);
    }

    pub fn cancel_auto_switch(&mut self) {
        self.auto_switch = None;
    }

    pub fn auto_switch_pending(&self) -> bool {
        self.auto_switch.is_some()
    }

    pub fn cancel_all(&mut self) {
        self.tick = None;
        self.auto_switch = None;
    }

    /// Pops the earliest alarm due at or before `now`, along with the instant
    /// it was due. A repeating tick is re-armed one period later.
    pub fn next_due(&mut self, now: Duration) -> Option<(Alarm, Duration)> {
        let tick_at = self.tick.map(|t| t.next).filter(|at| *at <= now);
        let switch_at = self.auto_switch.filter(|at| *at <= now);

        match (tick_at, switch_at) {
            (Some(t), Some(s)) if s < t => {
                self.auto_switch = None;
                Some((Alarm::AutoSwitch, s))
            }
            (Some(t), _) => {
                if let Some(tick) = self.tick.as_mut() {
                    tick.next += tick.period;
                }
                Some((Alarm::Tick, t))
            }
            (None, Some(s)) => {
                self.auto_switch = None;
                Some((Alarm::AutoSwitch, s))
            }
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new();
        let other = clock.clone();
        clock.advance_secs(3);
        assert_eq!(other.now(), Duration::from_secs(3));
    }

    #[test]
    fn test_manual_clock_saturates() {
        let clock = ManualClock::new();
        clock.advance_secs(1);
        clock.advance(Duration::MAX);
        assert_eq!(clock.now(), Duration::from_millis(u64::MAX));
        clock.advance_secs(1);
        assert_eq!(clock.now(), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn test_tick_repeats_per_period() {
        let mut scheduler = Scheduler::new();
        scheduler.start_ticking(Duration::ZERO, TICK_INTERVAL);

        assert_eq!(scheduler.next_due(Duration::from_millis(999)), None);

        let now = Duration::from_secs(3);
        let mut fired = Vec::new();
        while let Some((alarm, at)) = scheduler.next_due(now) {
            fired.push((alarm, at.as_secs()));
        }
        assert_eq!(
            fired,
            vec![(Alarm::Tick, 1), (Alarm::Tick, 2), (Alarm::Tick, 3)]
        );
    }

    #[test]
    fn test_auto_switch_fires_once() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_auto_switch(Duration::from_secs(2));
        assert!(scheduler.auto_switch_pending());
        assert_eq!(scheduler.next_due(Duration::from_secs(1)), None);
        assert_eq!(
            scheduler.next_due(Duration::from_secs(5)),
            Some((Alarm::AutoSwitch, Duration::from_secs(2)))
        );
        assert_eq!(scheduler.next_due(Duration::from_secs(5)), None);
        assert!(!scheduler.auto_switch_pending());
    }

    #[test]
    fn test_alarms_fire_in_deadline_order() {
        let mut scheduler = Scheduler::new();
        scheduler.start_ticking(Duration::from_secs(1), Duration::from_secs(2));
        scheduler.schedule_auto_switch(Duration::from_secs(2));

        let now = Duration::from_secs(3);
        assert_eq!(
            scheduler.next_due(now),
            Some((Alarm::AutoSwitch, Duration::from_secs(2)))
        );
        assert_eq!(
            scheduler.next_due(now),
            Some((Alarm::Tick, Duration::from_secs(3)))
        );
    }

    #[test]
    fn test_cancel_all() {
        let mut scheduler = Scheduler::new();
        scheduler.start_ticking(Duration::ZERO, TICK_INTERVAL);
        scheduler.schedule_auto_switch(Duration::from_secs(2));
        scheduler.cancel_all();
        assert!(!scheduler.is_ticking());
        assert!(!scheduler.auto_switch_pending());
        assert_eq!(scheduler.next_due(Duration::from_secs(60)), None);
    }
}
