//! Navier-Stokes operator: Rusanov convection plus Laplacian diffusion.

use rf_comm::Communicator;
use rf_core::{Field, RfResult};
use rf_fluids::{ConservedState, DerivedFluidState};
use rf_mesh::Discretization;

use crate::boundaries::Boundaries;
use crate::operator::{Assembler, SpatialOperator, wave_speed};
use crate::pack::Layout;

/// Viscous operator: viscous stress, heat conduction, viscous work and
/// species diffusion on top of the inviscid fluxes. Walls are no-slip and
/// either adiabatic or isothermal.
#[derive(Clone, Debug)]
pub struct ViscousOperator {
    discr: Discretization,
    boundaries: Boundaries,
}

impl ViscousOperator {
    pub fn new(discr: Discretization, boundaries: Boundaries) -> Self {
        Self { discr, boundaries }
    }

    pub fn boundaries(&self) -> Boundaries {
        self.boundaries
    }
}

impl SpatialOperator for ViscousOperator {
    fn name(&self) -> &'static str {
        "viscous"
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
                viscous: true,
            },
        }
        .rate(cv, fluid, comm)
    }

    /// `h / (|u| + c + (nu + alpha) / h)` with `alpha` the larger of the
    /// thermal and species diffusivities.
    fn max_stable_timestep(&self, cv: &ConservedState, fluid: &DerivedFluidState) -> Field {
        let h = self.discr.min_spacing();
        let speed = wave_speed(cv, fluid);
        let Some(tr) = &fluid.transport else {
            return speed.map(|s| h / s);
        };
        Field::from_fn(cv.n_nodes(), |i| {
            let rho = cv.mass[i];
            let nu = tr.viscosity[i] / rho;
            let thermal = tr.thermal_conductivity[i] / (rho * fluid.heat_capacity_cp[i]);
            let species = tr
                .species_diffusivity
                .iter()
                .map(|d| d[i])
                .fold(0.0, f64::max);
            h / (speed[i] + (nu + thermal.max(species)) / h)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundaries::WallThermal;
    use rf_comm::SerialComm;
    use rf_fluids::TransportFields;
    use rf_mesh::{generate_box_mesh, partition};

    fn setup(bc: Boundaries, t_wall_gap: f64) -> (ViscousOperator, ConservedState, DerivedFluidState) {
        let mesh = generate_box_mesh(1, &[0.0], &[1.0], &[4]).unwrap();
        let discr = Discretization::new(partition(&mesh, 1, 0).unwrap(), 1).unwrap();
        let n = discr.n_nodes();
        let cv = ConservedState::new(
            Field::filled(n, 1.0),
            vec![Field::zeros(n)],
            Field::filled(n, 2.5e5),
            vec![Field::filled(n, 0.25), Field::filled(n, 0.75)],
        )
        .unwrap();
        let fluid = DerivedFluidState {
            temperature: Field::filled(n, 300.0 + t_wall_gap),
            pressure: Field::filled(n, 1e5),
            sound_speed: Field::filled(n, 340.0),
            heat_capacity_cp: Field::filled(n, 1000.0),
            transport: Some(TransportFields {
                viscosity: Field::filled(n, 1e-3),
                thermal_conductivity: Field::filled(n, 0.5),
                species_diffusivity: vec![Field::filled(n, 1e-4); 2],
            }),
        };
        (ViscousOperator::new(discr, bc), cv, fluid)
    }

    #[test]
    fn adiabatic_quiescent_state_is_steady() {
        let (op, cv, fluid) = setup(Boundaries::Wall(WallThermal::Adiabatic), 0.0);
        let rate = op.rate(0.0, &cv, &fluid, &SerialComm::new()).unwrap();
        for field in rate.components() {
            assert!(field.iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn cold_isothermal_wall_cools_adjacent_nodes() {
        let bc = Boundaries::Wall(WallThermal::Isothermal { temperature: 300.0 });
        let (op, cv, fluid) = setup(bc, 100.0);
        let rate = op.rate(0.0, &cv, &fluid, &SerialComm::new()).unwrap();
        let n = cv.n_nodes();
        assert!(rate.energy[0] < 0.0);
        assert!(rate.energy[n - 1] < 0.0);
        assert_eq!(rate.energy[1], 0.0);
        assert!(rate.mass.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn diffusion_tightens_stable_timestep() {
        let (op, cv, fluid) = setup(Boundaries::Periodic, 0.0);
        let viscous = op.max_stable_timestep(&cv, &fluid);
        let mut inviscid_fluid = fluid.clone();
        inviscid_fluid.transport = None;
        let plain = op.max_stable_timestep(&cv, &inviscid_fluid);
        assert!(viscous[0] < plain[0]);
        // nu = 1e-3, alpha = max(0.5 / 1000, 1e-4) = 5e-4
        let h = 0.125;
        assert!((viscous[0] - h / (340.0 + 1.5e-3 / h)).abs() < 1e-15);
    }
}
