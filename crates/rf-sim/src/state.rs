//! Simulation state and per-step context.

use rf_core::Field;
use rf_fluids::ConservedState;
use serde::{Deserialize, Serialize};

use crate::config::{IntervalConfig, check_step};

/// Starting guess for the next temperature recovery.
///
/// Not evolved by the integrator; the driver overwrites it with the
/// temperature recovered during the latest step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemperatureSeed(pub Field);

impl TemperatureSeed {
    pub fn field(&self) -> &Field {
        &self.0
    }

    pub fn into_field(self) -> Field {
        self.0
    }
}

/// Conserved state paired with the temperature seed.
///
/// Arithmetic is element-wise on both parts. Derivatives always carry a zero
/// seed, so integration never moves the seed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimState {
    pub integrated: ConservedState,
    pub auxiliary: TemperatureSeed,
}

impl SimState {
    pub fn new(integrated: ConservedState, seed: Field) -> Self {
        Self {
            integrated,
            auxiliary: TemperatureSeed(seed),
        }
    }

    /// Derivative of `integrated` with a zero seed.
    pub fn derivative(rate: ConservedState) -> Self {
        let n = rate.n_nodes();
        Self {
            integrated: rate,
            auxiliary: TemperatureSeed(Field::zeros(n)),
        }
    }

    pub fn zeros_like(&self) -> Self {
        Self::derivative(self.integrated.zeros_like())
    }

    pub fn seed(&self) -> &Field {
        &self.auxiliary.0
    }

    pub fn n_nodes(&self) -> usize {
        self.integrated.n_nodes()
    }

    pub fn add(&self, other: &SimState) -> SimState {
        let seed = Field::from_vec(
            self.seed()
                .iter()
                .zip(other.seed().iter())
                .map(|(a, b)| a + b)
                .collect(),
        );
        SimState {
            integrated: self.integrated.add(&other.integrated),
            auxiliary: TemperatureSeed(seed),
        }
    }

    pub fn scale(&self, factor: f64) -> SimState {
        SimState {
            integrated: self.integrated.scale(factor),
            auxiliary: TemperatureSeed(self.seed().scale(factor)),
        }
    }
}

/// What the driver does on one step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepContext {
    pub step: u64,
    pub t: f64,
    pub dt: f64,
    pub cfl: f64,
    pub do_health: bool,
    pub do_status: bool,
    pub do_restart: bool,
    pub do_viz: bool,
}

impl StepContext {
    /// Flags for a regular step, decided by the configured intervals.
    pub fn for_step(step: u64, t: f64, intervals: &IntervalConfig) -> Self {
        Self {
            step,
            t,
            dt: 0.0,
            cfl: 0.0,
            do_health: check_step(step, intervals.health),
            do_status: check_step(step, intervals.status),
            do_restart: check_step(step, intervals.restart),
            do_viz: check_step(step, intervals.viz),
        }
    }

    /// Every action forced on, for the final state.
    pub fn final_step(step: u64, t: f64) -> Self {
        Self {
            step,
            t,
            dt: 0.0,
            cfl: 0.0,
            do_health: true,
            do_status: true,
            do_restart: true,
            do_viz: true,
        }
    }

    /// True if the step needs derived fluid quantities for diagnostics.
    pub fn needs_diagnostics(&self) -> bool {
        self.do_health || self.do_status || self.do_viz
    }
}
