//! Lightweight performance timing utilities.
//!
//! Timers are enabled per instance; the profiling mode of the step driver
//! owns a set of accumulating timers and reports them at the end of a run.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// A simple timer that measures elapsed time.
pub struct Timer {
    label: &'static str,
    start: Instant,
    enabled: bool,
}

impl Timer {
    /// Create and start a new timer with the given label.
    pub fn start(label: &'static str, enabled: bool) -> Self {
        Self {
            label,
            start: Instant::now(),
            enabled,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Stop the timer and return elapsed time in seconds.
    /// If timing is disabled, returns None.
    pub fn stop(self) -> Option<f64> {
        if self.enabled {
            Some(self.start.elapsed().as_secs_f64())
        } else {
            None
        }
    }

    /// Stop the timer and add the elapsed time to `acc` if enabled.
    pub fn stop_into(self, acc: &AccumulatingTimer) {
        if let Some(elapsed) = self.stop() {
            acc.record(elapsed);
        }
    }
}

/// Accumulating timer for tracking total time across multiple calls.
pub struct AccumulatingTimer {
    total_ns: AtomicU64,
    count: AtomicU64,
}

impl Default for AccumulatingTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl AccumulatingTimer {
    /// Create a new accumulating timer.
    pub const fn new() -> Self {
        Self {
            total_ns: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Record a timing measurement.
    pub fn record(&self, duration_s: f64) {
        let nanos = (duration_s * 1e9) as u64;
        self.total_ns.fetch_add(nanos, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total time spent (in seconds).
    pub fn total_seconds(&self) -> f64 {
        self.total_ns.load(Ordering::Relaxed) as f64 / 1e9
    }

    /// Get number of calls.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Get average time per call (in seconds).
    pub fn average_seconds(&self) -> f64 {
        let count = self.count();
        if count > 0 {
            self.total_seconds() / count as f64
        } else {
            0.0
        }
    }

    /// Reset the timer.
    pub fn reset(&self) {
        self.total_ns.store(0, Ordering::Relaxed);
        self.count.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_timer_reports_nothing() {
        let t = Timer::start("x", false);
        assert!(t.stop().is_none());
    }

    #[test]
    fn accumulating_timer_average() {
        let acc = AccumulatingTimer::new();
        acc.record(0.5);
        acc.record(1.5);
        assert_eq!(acc.count(), 2);
        assert!((acc.total_seconds() - 2.0).abs() < 1e-6);
        assert!((acc.average_seconds() - 1.0).abs() < 1e-6);
        acc.reset();
        assert_eq!(acc.count(), 0);
        assert_eq!(acc.average_seconds(), 0.0);
    }

    #[test]
    fn enabled_timer_accumulates() {
        let acc = AccumulatingTimer::new();
        Timer::start("phase", true).stop_into(&acc);
        Timer::start("phase", false).stop_into(&acc);
        assert_eq!(acc.count(), 1);
    }
}
