//! Per-step telemetry sinks.
//!
//! The caller opens the sink before handing it to the driver and closes it
//! afterwards; the driver only sets the time and ticks around each step.

use std::time::Instant;

use tracing::{debug, info};

pub trait Telemetry: Send {
    fn open(&mut self, rank: usize);

    fn set_time(&mut self, step: u64, t: f64);

    fn tick_before(&mut self, step: u64);

    fn tick_after(&mut self, dt: f64);

    fn close(&mut self);
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullTelemetry;

impl Telemetry for NullTelemetry {
    fn open(&mut self, _rank: usize) {}

    fn set_time(&mut self, _step: u64, _t: f64) {}

    fn tick_before(&mut self, _step: u64) {}

    fn tick_after(&mut self, _dt: f64) {}

    fn close(&mut self) {}
}

/// Step walltime watches emitted through `tracing` on rank 0.
#[derive(Debug, Default)]
pub struct TracingTelemetry {
    rank: usize,
    open: bool,
    step: u64,
    t: f64,
    started: Option<Instant>,
    steps: u64,
    total_walltime: f64,
    last_walltime: f64,
}

impl TracingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn last_walltime(&self) -> f64 {
        self.last_walltime
    }

    pub fn total_walltime(&self) -> f64 {
        self.total_walltime
    }
}

impl Telemetry for TracingTelemetry {
    fn open(&mut self, rank: usize) {
        self.rank = rank;
        self.open = true;
        if rank == 0 {
            debug!("telemetry opened");
        }
    }

    fn set_time(&mut self, step: u64, t: f64) {
        self.step = step;
        self.t = t;
    }

    fn tick_before(&mut self, step: u64) {
        self.step = step;
        self.started = Some(Instant::now());
    }

    fn tick_after(&mut self, dt: f64) {
        let Some(started) = self.started.take() else {
            return;
        };
        self.last_walltime = started.elapsed().as_secs_f64();
        self.total_walltime += self.last_walltime;
        self.steps += 1;
        if self.open && self.rank == 0 {
            debug!(
                step = self.step,
                t = self.t,
                dt,
                step_walltime = self.last_walltime,
                "telemetry"
            );
        }
    }

    fn close(&mut self) {
        if self.open && self.rank == 0 {
            info!(
                steps = self.steps,
                total_walltime = self.total_walltime,
                "telemetry closed"
            );
        }
        self.open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_accumulate_walltime() {
        let mut tel = TracingTelemetry::new();
        tel.open(0);
        for step in 0..3 {
            tel.set_time(step, step as f64);
            tel.tick_before(step);
            tel.tick_after(1.0);
        }
        // unmatched tick_after is ignored
        tel.tick_after(1.0);
        assert_eq!(tel.steps(), 3);
        assert!(tel.total_walltime() >= tel.last_walltime());
        tel.close();
        assert!(!tel.is_open());
    }
}
