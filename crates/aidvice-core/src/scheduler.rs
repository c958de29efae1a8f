//! Idle detection: turn a burst of edit notifications into one delayed advice request.
//!
//! Nothing here spawns a thread or sleeps. The host loop calls [`IdleAdviceScheduler::poll`]
//! and can use [`IdleAdviceScheduler::time_until_fire`] to size its wait. Time comes from a
//! [`Clock`], so tests drive it with a [`ManualClock`] instead of real delays.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_QUIET_INTERVAL: Duration = Duration::from_millis(5_000);

pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Virtual time. Clones share the same current instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    now: Rc<Cell<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        let origin = Instant::now();
        Self {
            origin,
            now: Rc::new(Cell::new(origin)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    /// Moves to `origin + offset`. Never moves backwards.
    pub fn set_elapsed(&self, offset: Duration) {
        let target = self.origin + offset;
        if target > self.now.get() {
            self.now.set(target);
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.now.get() - self.origin
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

/// One cancellable deadline. Arming replaces whatever was pending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerSlot {
    deadline: Option<Instant>,
}

impl TimerSlot {
    /// Returns true when a pending deadline was replaced.
    pub fn arm(&mut self, deadline: Instant) -> bool {
        self.deadline.replace(deadline).is_some()
    }

    /// Returns true when a pending deadline was dropped.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Disarms and returns true once `now` has reached the deadline.
    pub fn fire_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

pub struct IdleAdviceScheduler<C: Clock = SystemClock> {
    clock: C,
    quiet_interval: Duration,
    slot: TimerSlot,
    shut_down: bool,
    fired: u64,
}

impl IdleAdviceScheduler<SystemClock> {
    pub fn new(quiet_interval: Duration) -> Self {
        Self::with_clock(quiet_interval, SystemClock)
    }
}

impl Default for IdleAdviceScheduler<SystemClock> {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_INTERVAL)
    }
}

impl<C: Clock> IdleAdviceScheduler<C> {
    pub fn with_clock(quiet_interval: Duration, clock: C) -> Self {
        Self {
            clock,
            quiet_interval,
            slot: TimerSlot::default(),
            shut_down: false,
            fired: 0,
        }
    }

    pub fn quiet_interval(&self) -> Duration {
        self.quiet_interval
    }

    pub fn is_armed(&self) -> bool {
        self.slot.is_armed()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Number of advice requests signalled so far.
    pub fn fired(&self) -> u64 {
        self.fired
    }

    /// Restart the quiet period from now.
    pub fn on_edit(&mut self) {
        if self.shut_down {
            return;
        }
        let deadline = self.clock.now() + self.quiet_interval;
        let replaced = self.slot.arm(deadline);
        debug!(event = "idle_timer_armed", replaced = replaced);
    }

    /// True exactly once per quiet period, when its deadline has passed.
    pub fn poll(&mut self) -> bool {
        if self.shut_down {
            return false;
        }
        if self.slot.fire_due(self.clock.now()) {
            self.fired += 1;
            debug!(event = "idle_timer_fired", fired = self.fired);
            return true;
        }
        false
    }

    /// Time left before the pending deadline, zero if it is already due.
    pub fn time_until_fire(&self) -> Option<Duration> {
        if self.shut_down {
            return None;
        }
        self.slot
            .deadline()
            .map(|deadline| deadline.saturating_duration_since(self.clock.now()))
    }

    /// Cancel any pending deadline and ignore everything afterwards.
    pub fn shutdown(&mut self) {
        let cancelled = self.slot.cancel();
        self.shut_down = true;
        debug!(event = "idle_timer_shutdown", cancelled = cancelled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn scheduler(clock: &ManualClock) -> IdleAdviceScheduler<ManualClock> {
        IdleAdviceScheduler::with_clock(DEFAULT_QUIET_INTERVAL, clock.clone())
    }

    /// Steps the clock in 100ms increments up to `until`, recording when `poll` fired.
    fn run_until(
        scheduler: &mut IdleAdviceScheduler<ManualClock>,
        clock: &ManualClock,
        until: Duration,
    ) -> Vec<Duration> {
        let mut fired_at = Vec::new();
        while clock.elapsed() < until {
            clock.advance(ms(100));
            if scheduler.poll() {
                fired_at.push(clock.elapsed());
            }
        }
        fired_at
    }

    #[test]
    fn burst_of_edits_fires_once_after_last_edit() {
        let clock = ManualClock::new();
        let mut scheduler = scheduler(&clock);

        scheduler.on_edit();
        clock.set_elapsed(ms(1_000));
        assert!(!scheduler.poll());
        scheduler.on_edit();
        clock.set_elapsed(ms(2_000));
        assert!(!scheduler.poll());
        scheduler.on_edit();

        clock.set_elapsed(ms(6_999));
        assert!(!scheduler.poll());
        clock.set_elapsed(ms(7_000));
        assert!(scheduler.poll());
        assert!(!scheduler.poll());
        assert_eq!(scheduler.fired(), 1);
    }

    #[test]
    fn keystroke_rate_edits_never_fire_early() {
        let clock = ManualClock::new();
        let mut scheduler = scheduler(&clock);

        for _ in 0..200 {
            scheduler.on_edit();
            clock.advance(ms(40));
            assert!(!scheduler.poll());
        }
        let last_edit = clock.elapsed() - ms(40);

        let fired = run_until(&mut scheduler, &clock, last_edit + ms(10_000));
        assert_eq!(fired.len(), 1);
        assert!(fired[0] >= last_edit + DEFAULT_QUIET_INTERVAL);
        assert!(fired[0] < last_edit + DEFAULT_QUIET_INTERVAL + ms(100));
    }

    #[test]
    fn edits_spaced_beyond_the_interval_fire_once_each() {
        let clock = ManualClock::new();
        let mut scheduler = scheduler(&clock);

        let mut fired = Vec::new();
        for round in 0..3u64 {
            clock.set_elapsed(ms(round * 6_000));
            scheduler.on_edit();
            fired.extend(run_until(&mut scheduler, &clock, ms(round * 6_000 + 5_900)));
        }

        assert_eq!(fired, vec![ms(5_000), ms(11_000), ms(17_000)]);
        assert_eq!(scheduler.fired(), 3);
    }

    #[test]
    fn nothing_fires_without_an_edit() {
        let clock = ManualClock::new();
        let mut scheduler = scheduler(&clock);
        assert!(run_until(&mut scheduler, &clock, ms(20_000)).is_empty());
        assert_eq!(scheduler.time_until_fire(), None);
    }

    #[test]
    fn time_until_fire_tracks_the_latest_edit() {
        let clock = ManualClock::new();
        let mut scheduler = scheduler(&clock);

        scheduler.on_edit();
        clock.advance(ms(3_000));
        assert_eq!(scheduler.time_until_fire(), Some(ms(2_000)));

        scheduler.on_edit();
        assert_eq!(scheduler.time_until_fire(), Some(ms(5_000)));

        clock.advance(ms(9_000));
        assert_eq!(scheduler.time_until_fire(), Some(Duration::ZERO));
    }

    #[test]
    fn shutdown_cancels_pending_request() {
        let clock = ManualClock::new();
        let mut scheduler = scheduler(&clock);

        scheduler.on_edit();
        clock.advance(ms(1_000));
        scheduler.shutdown();
        assert!(!scheduler.is_armed());

        clock.advance(ms(10_000));
        assert!(!scheduler.poll());

        scheduler.on_edit();
        clock.advance(ms(10_000));
        assert!(!scheduler.poll());
        assert_eq!(scheduler.fired(), 0);
        assert_eq!(scheduler.time_until_fire(), None);
    }

    #[test]
    fn timer_slot_holds_a_single_deadline() {
        let clock = ManualClock::new();
        let mut slot = TimerSlot::default();
        let now = clock.now();

        assert!(!slot.arm(now + ms(10)));
        assert!(slot.arm(now + ms(20)));
        assert_eq!(slot.deadline(), Some(now + ms(20)));

        assert!(!slot.fire_due(now + ms(15)));
        assert!(slot.fire_due(now + ms(20)));
        assert!(!slot.is_armed());
        assert!(!slot.cancel());
    }
}
