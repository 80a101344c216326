//! Per-phase wall-time accounting for the step loop.

use rf_core::timing::{AccumulatingTimer, Timer};
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Rhs,
    Health,
    Timestep,
    Checkpoint,
    Viz,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Rhs,
        Phase::Health,
        Phase::Timestep,
        Phase::Checkpoint,
        Phase::Viz,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Phase::Rhs => "rhs",
            Phase::Health => "health",
            Phase::Timestep => "timestep",
            Phase::Checkpoint => "checkpoint",
            Phase::Viz => "viz",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// One accumulating timer per [`Phase`]; inert when disabled.
#[derive(Default)]
pub struct PhaseTimers {
    enabled: bool,
    timers: [AccumulatingTimer; 5],
}

impl PhaseTimers {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timers: Default::default(),
        }
    }

    pub fn time<T>(&self, phase: Phase, f: impl FnOnce() -> T) -> T {
        let timer = Timer::start(phase.label(), self.enabled);
        let out = f();
        timer.stop_into(&self.timers[phase.index()]);
        out
    }

    pub fn total_seconds(&self, phase: Phase) -> f64 {
        self.timers[phase.index()].total_seconds()
    }

    pub fn count(&self, phase: Phase) -> u64 {
        self.timers[phase.index()].count()
    }

    /// Log totals on rank 0; no-op when disabled.
    pub fn report(&self, rank: usize) {
        if !self.enabled || rank != 0 {
            return;
        }
        for phase in Phase::ALL {
            let timer = &self.timers[phase.index()];
            info!(
                phase = phase.label(),
                calls = timer.count(),
                total_s = timer.total_seconds(),
                average_s = timer.average_seconds(),
                "profile"
            );
        }
    }
}

impl std::fmt::Debug for PhaseTimers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("PhaseTimers");
        s.field("enabled", &self.enabled);
        for phase in Phase::ALL {
            s.field(phase.label(), &self.total_seconds(phase));
        }
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_timers_record_nothing() {
        let timers = PhaseTimers::new(false);
        assert_eq!(timers.time(Phase::Rhs, || 7), 7);
        assert_eq!(timers.count(Phase::Rhs), 0);
    }

    #[test]
    fn phases_are_tracked_separately() {
        let timers = PhaseTimers::new(true);
        timers.time(Phase::Health, || ());
        timers.time(Phase::Health, || ());
        timers.time(Phase::Viz, || ());
        assert_eq!(timers.count(Phase::Health), 2);
        assert_eq!(timers.count(Phase::Viz), 1);
        assert_eq!(timers.count(Phase::Checkpoint), 0);
        assert!(format!("{timers:?}").contains("health"));
    }
}
