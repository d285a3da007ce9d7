use std::cell::Cell;
use std::time::{Duration, Instant};

/// Monotonic time source with a yield point for wait loops.
///
/// Every loop that waits for link data calls [`Clock::pause`] between polls
/// so that watchdogs and cooperative schedulers on the host keep running.
pub trait Clock {
    /// Current monotonic time.
    fn now(&self) -> Instant;

    /// Give up the CPU briefly while waiting for data.
    fn pause(&self);
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn pause(&self) {
        (**self).pause()
    }
}

/// Wall-clock implementation: `Instant::now()` and a short sleep per pause.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    poll_interval: Duration,
}

impl SystemClock {
    /// Default sleep between polls of an idle link.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1);

    /// Create a clock that sleeps `poll_interval` per pause.
    ///
    /// A zero interval yields the thread instead of sleeping.
    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    /// Sleep interval used by [`Clock::pause`].
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::with_poll_interval(Self::DEFAULT_POLL_INTERVAL)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn pause(&self) {
        if self.poll_interval.is_zero() {
            std::thread::yield_now();
        } else {
            std::thread::sleep(self.poll_interval);
        }
    }
}

/// Deterministic clock for tests and simulation.
///
/// Time only moves when [`Clock::pause`] is called (by `step`) or when
/// [`ManualClock::advance`] is used, so timeout paths run instantly.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<Instant>,
    step: Duration,
    pauses: Cell<u64>,
}

impl ManualClock {
    /// Create a clock that advances by `step` on each pause.
    pub fn new(step: Duration) -> Self {
        Self {
            now: Cell::new(Instant::now()),
            step,
            pauses: Cell::new(0),
        }
    }

    /// Move time forward.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    /// How many times a waiter has paused on this clock.
    pub fn pauses(&self) -> u64 {
        self.pauses.get()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Duration::from_millis(1))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }

    fn pause(&self) {
        self.pauses.set(self.pauses.get() + 1);
        self.advance(self.step);
    }
}
