//! Whole-second game timer.
//!
//! The elapsed counter lives in [`GameTimer`], owned by the engine. Ticks
//! arrive from outside through a [`TickHandle`], which is bound to one game
//! session: once that session ends or is replaced, its handles stop having
//! any effect. [`Ticker`] is the wall-clock side that front ends poll.

use std::time::{Duration, Instant};

/// Largest value the timer reaches; it stops itself there.
pub const MAX_SECONDS: u16 = 999;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GameTimer {
    elapsed: u16,
    running: bool,
}

impl GameTimer {
    pub fn start(&mut self) {
        self.elapsed = 0;
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Advances one second. Returns false if the timer was not running.
    pub fn tick(&mut self) -> bool {
        if !self.running { return false; }
        self.elapsed = (self.elapsed + 1).min(MAX_SECONDS);
        if self.elapsed >= MAX_SECONDS {
            self.running = false;
        }
        true
    }

    pub fn elapsed(&self) -> u16 { self.elapsed }
    pub fn is_running(&self) -> bool { self.running }
}

/// Token for delivering one tick to a specific session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TickHandle {
    pub(crate) session: u64,
}

/// Periodic scheduler for a single [`TickHandle`].
#[derive(Debug)]
pub struct Ticker {
    period: Duration,
    scheduled: Option<(TickHandle, Instant)>,
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Self { period, scheduled: None }
    }

    /// Schedules `handle` with its first tick one period after `now`.
    /// Rescheduling the handle already in place keeps its phase.
    pub fn schedule(&mut self, handle: TickHandle, now: Instant) {
        match self.scheduled {
            Some((current, _)) if current == handle => {}
            _ => self.scheduled = Some((handle, now + self.period)),
        }
    }

    pub fn cancel(&mut self) {
        self.scheduled = None;
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled.is_some()
    }

    /// Returns the scheduled handle once for every period elapsed by `now`.
    pub fn poll(&mut self, now: Instant) -> Vec<TickHandle> {
        let mut due = Vec::new();
        if let Some((handle, next)) = self.scheduled.as_mut() {
            while *next <= now {
                due.push(*handle);
                *next += self.period;
            }
        }
        due
    }

    /// Time left until the next tick, if one is scheduled.
    pub fn until_next(&self, now: Instant) -> Option<Duration> {
        self.scheduled.map(|(_, next)| next.saturating_duration_since(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_caps_and_stops_itself() {
        let mut t = GameTimer::default();
        assert!(!t.tick());
        t.start();
        for _ in 0..1200 { t.tick(); }
        assert_eq!(t.elapsed(), MAX_SECONDS);
        assert!(!t.is_running());
        assert!(!t.tick());
    }

    #[test]
    fn ticker_yields_once_per_period() {
        let start = Instant::now();
        let handle = TickHandle { session: 3 };
        let mut ticker = Ticker::new(Duration::from_millis(100));
        ticker.schedule(handle, start);
        assert!(ticker.poll(start + Duration::from_millis(50)).is_empty());
        assert_eq!(ticker.poll(start + Duration::from_millis(350)), vec![handle; 3]);
        assert_eq!(ticker.until_next(start + Duration::from_millis(350)), Some(Duration::from_millis(50)));
    }

    #[test]
    fn cancelled_ticker_yields_nothing() {
        let start = Instant::now();
        let mut ticker = Ticker::new(Duration::from_millis(100));
        ticker.schedule(TickHandle { session: 1 }, start);
        ticker.cancel();
        assert!(!ticker.is_scheduled());
        assert!(ticker.poll(start + Duration::from_secs(5)).is_empty());
    }

    #[test]
    fn rescheduling_a_new_handle_replaces_the_old_one() {
        let start = Instant::now();
        let mut ticker = Ticker::new(Duration::from_millis(100));
        ticker.schedule(TickHandle { session: 1 }, start);
        ticker.schedule(TickHandle { session: 2 }, start + Duration::from_millis(60));
        assert!(ticker.poll(start + Duration::from_millis(100)).is_empty());
        assert_eq!(ticker.poll(start + Duration::from_millis(160)), vec![TickHandle { session: 2 }]);
    }
}
