//! Numerical health checks on the derived fluid state.

use std::sync::Arc;

use rf_comm::Communicator;
use rf_fluids::{ConservedState, DerivedFluidState, Thermochemistry};
use tracing::error;

use crate::error::{RuntimeFailure, SimResult};

/// Largest accepted `|ΔT / T|` of one more Newton update.
pub const HEALTH_RESIDUAL_TOLERANCE: f64 = 1e-8;

/// Local findings of one health check.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HealthReport {
    pub nonfinite_pressure: bool,
    pub nonfinite_temperature: bool,
    pub residual_failed: bool,
    /// Largest relative temperature update; NaN if any node produced NaN.
    /// Zero when the residual is not checked.
    pub max_rel_residual: f64,
}

impl HealthReport {
    pub fn failed(&self) -> bool {
        self.nonfinite_pressure || self.nonfinite_temperature || self.residual_failed
    }

    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if self.nonfinite_pressure {
            parts.push("non-finite pressure".to_string());
        }
        if self.nonfinite_temperature {
            parts.push("non-finite temperature".to_string());
        }
        if self.residual_failed {
            parts.push(format!(
                "temperature recovery not converged (|dT/T| = {:e} > {:e})",
                self.max_rel_residual, HEALTH_RESIDUAL_TOLERANCE
            ));
        }
        if parts.is_empty() {
            "healthy".to_string()
        } else {
            parts.join(", ")
        }
    }
}

#[derive(Clone, Debug)]
pub struct HealthMonitor {
    eos: Arc<dyn Thermochemistry>,
    check_residual: bool,
}

impl HealthMonitor {
    /// `check_residual` enables the temperature-recovery convergence test;
    /// it is meant for reacting runs.
    pub fn new(eos: Arc<dyn Thermochemistry>, check_residual: bool) -> Self {
        Self {
            eos,
            check_residual,
        }
    }

    /// Check this rank's partition. No communication.
    pub fn check(
        &self,
        cv: &ConservedState,
        fluid: &DerivedFluidState,
        rank: usize,
    ) -> SimResult<HealthReport> {
        let mut report = HealthReport {
            nonfinite_pressure: fluid.pressure.has_non_finite(),
            nonfinite_temperature: fluid.temperature.has_non_finite(),
            ..HealthReport::default()
        };

        if self.check_residual {
            let energy = cv.specific_internal_energy();
            let y = cv.species_mass_fractions();
            let update = self
                .eos
                .temperature_update_residual(&energy, &fluid.temperature, &y)?;
            for (dt, t) in update.iter().zip(fluid.temperature.iter()) {
                let rel = (dt / t).abs();
                if !(rel <= HEALTH_RESIDUAL_TOLERANCE) {
                    report.residual_failed = true;
                }
                if rel.is_nan() || report.max_rel_residual.is_nan() {
                    report.max_rel_residual = f64::NAN;
                } else {
                    report.max_rel_residual = report.max_rel_residual.max(rel);
                }
            }
        }

        if report.nonfinite_pressure {
            if let Some(node) = fluid.pressure.first_non_finite() {
                error!(rank, node, value = fluid.pressure[node], "non-finite pressure");
            }
        }
        if report.nonfinite_temperature {
            if let Some(node) = fluid.temperature.first_non_finite() {
                error!(rank, node, value = fluid.temperature[node], "non-finite temperature");
            }
        }
        if report.residual_failed {
            error!(
                rank,
                max_rel_residual = report.max_rel_residual,
                "temperature recovery residual above tolerance"
            );
        }
        Ok(report)
    }

    /// Collective check: true on every rank if any rank failed.
    pub fn check_global(
        &self,
        cv: &ConservedState,
        fluid: &DerivedFluidState,
        comm: &dyn Communicator,
    ) -> SimResult<(HealthReport, bool)> {
        let report = self.check(cv, fluid, comm.rank())?;
        let failed = comm.all_reduce_or(report.failed())?;
        Ok((report, failed))
    }

    /// Collective check that turns a global failure into a runtime failure.
    pub fn enforce(
        &self,
        cv: &ConservedState,
        fluid: &DerivedFluidState,
        step: u64,
        t: f64,
        comm: &dyn Communicator,
    ) -> SimResult<HealthReport> {
        let (report, failed) = self.check_global(cv, fluid, comm)?;
        if failed {
            let detail = if report.failed() {
                report.describe()
            } else {
                "failure detected on another rank".to_string()
            };
            return Err(RuntimeFailure::HealthCheck { step, t, detail }.into());
        }
        Ok(report)
    }
}
