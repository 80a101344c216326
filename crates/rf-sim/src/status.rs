//! Rank-0 status lines.

use rf_comm::{Communicator, ReduceOp};
use rf_core::Field;
use rf_fluids::DerivedFluidState;
use tracing::info;

use crate::config::TimestepMode;
use crate::error::SimResult;

#[derive(Clone, Copy, Debug)]
pub struct StatusReporter {
    mode: TimestepMode,
    status_fields: bool,
}

fn global_range(field: &Field, comm: &dyn Communicator) -> SimResult<(f64, f64)> {
    let lo = comm.all_reduce(field.min(), ReduceOp::Min)?;
    let hi = comm.all_reduce(field.max(), ReduceOp::Max)?;
    Ok((lo, hi))
}

impl StatusReporter {
    pub fn new(mode: TimestepMode, status_fields: bool) -> Self {
        Self {
            mode,
            status_fields,
        }
    }

    /// Collective when field ranges are enabled. Returns the line on rank 0.
    pub fn report(
        &self,
        step: u64,
        t: f64,
        dt: f64,
        cfl: f64,
        fluid: Option<&DerivedFluidState>,
        comm: &dyn Communicator,
    ) -> SimResult<Option<String>> {
        let mut line = match self.mode {
            TimestepMode::ConstantCfl { .. } => format!("step {step:6}: t={t:.6e} dt={dt:.6e}"),
            TimestepMode::ConstantDt { .. } => format!("step {step:6}: t={t:.6e} cfl={cfl:.4}"),
        };
        if self.status_fields
            && let Some(fluid) = fluid
        {
            let (p_min, p_max) = global_range(&fluid.pressure, comm)?;
            let (t_min, t_max) = global_range(&fluid.temperature, comm)?;
            line.push_str(&format!(
                " P=[{p_min:.6e}, {p_max:.6e}] T=[{t_min:.4}, {t_max:.4}]"
            ));
        }
        if comm.is_root() {
            info!("{line}");
            Ok(Some(line))
        } else {
            Ok(None)
        }
    }
}
