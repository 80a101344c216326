//! Euler equations with the Rusanov interface flux.

use rf_comm::Communicator;
use rf_core::{Field, RfResult};
use rf_fluids::{ConservedState, DerivedFluidState};
use rf_mesh::Discretization;

use crate::boundaries::Boundaries;
use crate::operator::{Assembler, SpatialOperator, wave_speed};
use crate::pack::Layout;

/// Inviscid operator: no diffusive terms, slip walls.
#[derive(Clone, Debug)]
pub struct InviscidOperator {
    discr: Discretization,
    boundaries: Boundaries,
}

impl InviscidOperator {
    pub fn new(discr: Discretization, boundaries: Boundaries) -> Self {
        Self { discr, boundaries }
    }

    pub fn boundaries(&self) -> Boundaries {
        self.boundaries
    }
}

impl SpatialOperator for InviscidOperator {
    fn name(&self) -> &'static str {
        "inviscid"
    }

    fn discretization(&self) -> &Discretization {
        &self.discr
    }

    fn rate(
        &self,
        _t: f64,
        cv: &ConservedState,
        fluid: &DerivedFluidState,
        comm: &dyn Communicator,
    ) -> RfResult<ConservedState> {
        Assembler {
            discr: &self.discr,
            boundaries: self.boundaries,
            layout: Layout {
                dim: self.discr.dim(),
                nspecies: cv.nspecies(),
                viscous: false,
            },
        }
        .rate(cv, fluid, comm)
    }

    fn max_stable_timestep(&self, cv: &ConservedState, fluid: &DerivedFluidState) -> Field {
        let h = self.discr.min_spacing();
        wave_speed(cv, fluid).map(|s| h / s)
    }
}
