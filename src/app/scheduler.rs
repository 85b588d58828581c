//! Recurring execution.
//!
//! The scheduler runs a job once, then wakes every `poll` to check whether
//! `interval` has elapsed since the previous run finished. Time comes from a
//! `Clock` so tests can advance it without sleeping, and every wait can be
//! cut short by a `StopSignal`.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::config::ScheduleConfig;

/// Source of monotonic time plus an interruptible wait.
pub trait Clock {
    /// Time elapsed since the clock was created.
    fn elapsed(&self) -> Duration;

    /// Block for up to `timeout`. Returns `true` if `stop` fired.
    fn wait(&self, timeout: Duration, stop: &StopSignal) -> bool;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn elapsed(&self) -> Duration {
        (**self).elapsed()
    }

    fn wait(&self, timeout: Duration, stop: &StopSignal) -> bool {
        (**self).wait(timeout, stop)
    }
}

pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    fn wait(&self, timeout: Duration, stop: &StopSignal) -> bool {
        stop.wait_timeout(timeout)
    }
}

/// Cloneable stop flag that also wakes threads blocked in `wait_timeout`.
#[derive(Clone, Default)]
pub struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        let (lock, cvar) = &*self.inner;
        *lock.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait until triggered or `timeout` passes. Returns whether it was triggered.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = cvar
            .wait_timeout_while(guard, timeout, |stopped| !*stopped)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

/// Tracks when the next run is due.
#[derive(Debug, Clone, Copy)]
pub struct Ticker {
    interval: Duration,
    next_due: Duration,
}

impl Ticker {
    pub fn new(interval: Duration, now: Duration) -> Self {
        Self {
            interval,
            next_due: now.saturating_add(interval),
        }
    }

    pub fn is_due(&self, now: Duration) -> bool {
        now >= self.next_due
    }

    pub fn next_due(&self) -> Duration {
        self.next_due
    }

    /// Start a new interval from `now` (the end of the latest run).
    pub fn reset(&mut self, now: Duration) {
        self.next_due = now.saturating_add(self.interval);
    }
}

pub struct Scheduler<C: Clock> {
    clock: C,
    schedule: ScheduleConfig,
    stop: StopSignal,
}

impl<C: Clock> Scheduler<C> {
    pub fn new(clock: C, schedule: ScheduleConfig, stop: StopSignal) -> Self {
        Self { clock, schedule, stop }
    }

    /// Run `job` immediately and then on schedule until stopped.
    ///
    /// Returns the number of times `job` ran.
    pub fn run(&self, mut job: impl FnMut()) -> usize {
        tracing::info!(
            interval_hours = self.schedule.interval.as_secs_f64() / 3600.0,
            "configuring recurring execution"
        );

        job();
        let mut runs = 1;
        let mut ticker = Ticker::new(self.schedule.interval, self.clock.elapsed());

        tracing::info!(
            poll_minutes = self.schedule.poll.as_secs_f64() / 60.0,
            "schedule configured, press Ctrl+C to stop"
        );

        while !self.clock.wait(self.schedule.poll, &self.stop) {
            if ticker.is_due(self.clock.elapsed()) {
                job();
                runs += 1;
                ticker.reset(self.clock.elapsed());
            }
        }

        tracing::info!(runs, "scheduling interrupted by user");
        runs
    }
}
