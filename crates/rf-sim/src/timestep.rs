//! Timestep and CFL control.
//!
//! In constant-CFL mode the step is the global minimum of
//! `cfl * max_stable_timestep`; in constant-dt mode the step is fixed and the
//! CFL number is the global maximum of the local CFL field. Either way the
//! step never runs past `t_final`.

use rf_comm::{Communicator, ReduceOp};
use rf_core::Field;
use rf_fluids::{ConservedState, DerivedFluidState};
use rf_ops::SpatialOperator;
use tracing::debug;

use crate::config::TimestepMode;
use crate::error::SimResult;

/// A remainder at most this fraction of `dt` is folded into the current step.
const SLIVER_FRACTION: f64 = 1e-6;

/// Step actually taken from `t`, and whether it lands on `t_final`.
///
/// The remaining interval is `max(0, t_final - t)`. A step that would
/// overshoot it, or leave only a sliver of it, becomes exactly the remainder.
pub fn clamp_to_final(dt: f64, t: f64, t_final: f64) -> (f64, bool) {
    let remaining = (t_final - t).max(0.0);
    if dt >= remaining || remaining - dt <= SLIVER_FRACTION * dt {
        (remaining, true)
    } else {
        (dt, false)
    }
}

/// Outcome of one timestep computation.
#[derive(Clone, Debug, PartialEq)]
pub struct TimestepEstimate {
    /// Local `dt` field (constant CFL) or local CFL field (constant dt).
    /// Empty when no fluid state was available.
    pub field: Field,
    /// Configured CFL (constant CFL) or global maximum CFL (constant dt).
    pub cfl: f64,
    /// Step after clamping to the final time.
    pub dt: f64,
    pub lands_on_final: bool,
}

impl TimestepEstimate {
    /// Name of the quantity held in `field`.
    pub fn field_name(&self, mode: &TimestepMode) -> &'static str {
        match mode {
            TimestepMode::ConstantCfl { .. } => "dt",
            TimestepMode::ConstantDt { .. } => "cfl",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimestepController {
    mode: TimestepMode,
    t_final: f64,
}

impl TimestepController {
    pub fn new(mode: TimestepMode, t_final: f64) -> Self {
        Self { mode, t_final }
    }

    /// Collective: every rank must call this with its own partition.
    ///
    /// Non-finite data is not an error here. A NaN on any node of any rank
    /// makes the returned `dt` (constant CFL) or `cfl` (constant dt) NaN;
    /// rejecting it is left to the caller.
    pub fn compute_step(
        &self,
        operator: &dyn SpatialOperator,
        cv: &ConservedState,
        fluid: &DerivedFluidState,
        t: f64,
        comm: &dyn Communicator,
    ) -> SimResult<TimestepEstimate> {
        let (field, cfl, raw_dt) = match self.mode {
            TimestepMode::ConstantCfl { cfl } => {
                let field = operator.max_stable_timestep(cv, fluid).scale(cfl);
                let dt = comm.all_reduce(field.min(), ReduceOp::Min)?;
                (field, cfl, dt)
            }
            TimestepMode::ConstantDt { dt } => {
                let field = operator.local_cfl(cv, fluid, dt);
                let cfl = comm.all_reduce(field.max(), ReduceOp::Max)?;
                (field, cfl, dt)
            }
        };
        let (dt, lands_on_final) = clamp_to_final(raw_dt, t, self.t_final);
        debug!(t, raw_dt, dt, cfl, lands_on_final, "timestep");
        Ok(TimestepEstimate {
            field,
            cfl,
            dt,
            lands_on_final,
        })
    }

    /// Step used to start the run.
    pub fn initial_timestep(
        &self,
        operator: &dyn SpatialOperator,
        cv: &ConservedState,
        fluid: &DerivedFluidState,
        t: f64,
        comm: &dyn Communicator,
    ) -> SimResult<f64> {
        Ok(self.compute_step(operator, cv, fluid, t, comm)?.dt)
    }

    /// Constant-dt step without touching the fluid state.
    ///
    /// Returns `None` in constant-CFL mode, where the step depends on the
    /// state. The CFL number is unknown and reported as NaN.
    pub fn fixed_step(&self, t: f64) -> Option<TimestepEstimate> {
        match self.mode {
            TimestepMode::ConstantDt { dt } => {
                let (dt, lands_on_final) = clamp_to_final(dt, t, self.t_final);
                Some(TimestepEstimate {
                    field: Field::zeros(0),
                    cfl: f64::NAN,
                    dt,
                    lands_on_final,
                })
            }
            TimestepMode::ConstantCfl { .. } => None,
        }
    }
}
