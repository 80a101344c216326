//! Per-node packing of conserved and derived quantities.
//!
//! One node is a contiguous run of `stride` values:
//! conserved components, then pressure, sound speed and temperature, then
//! (viscous only) viscosity, conductivity and species diffusivities. Halo
//! planes are shipped in the same layout.

use rf_core::{RfError, RfResult};
use rf_fluids::{ConservedState, DerivedFluidState};

use crate::boundaries::Boundaries;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    pub dim: usize,
    pub nspecies: usize,
    pub viscous: bool,
}

impl Layout {
    pub fn ncomp(&self) -> usize {
        2 + self.dim + self.nspecies
    }

    pub fn stride(&self) -> usize {
        let base = self.ncomp() + 3;
        if self.viscous {
            base + 2 + self.nspecies
        } else {
            base
        }
    }

    pub fn mass(&self) -> usize {
        0
    }

    pub fn momentum(&self, axis: usize) -> usize {
        1 + axis
    }

    pub fn energy(&self) -> usize {
        1 + self.dim
    }

    pub fn species(&self, s: usize) -> usize {
        2 + self.dim + s
    }

    pub fn pressure(&self) -> usize {
        self.ncomp()
    }

    pub fn sound_speed(&self) -> usize {
        self.ncomp() + 1
    }

    pub fn temperature(&self) -> usize {
        self.ncomp() + 2
    }

    pub fn viscosity(&self) -> usize {
        self.ncomp() + 3
    }

    pub fn conductivity(&self) -> usize {
        self.ncomp() + 4
    }

    pub fn diffusivity(&self, s: usize) -> usize {
        self.ncomp() + 5 + s
    }

    /// Velocity component `axis` of a packed node.
    pub fn velocity(&self, q: &[f64], axis: usize) -> f64 {
        q[self.momentum(axis)] / q[self.mass()]
    }

    /// Specific kinetic energy `|u|^2 / 2` of a packed node.
    pub fn kinetic_energy(&self, q: &[f64]) -> f64 {
        0.5 * (0..self.dim)
            .map(|a| {
                let u = self.velocity(q, a);
                u * u
            })
            .sum::<f64>()
    }
}

/// Pack every local node.
pub fn pack(layout: &Layout, cv: &ConservedState, fluid: &DerivedFluidState) -> RfResult<Vec<f64>> {
    let n = cv.n_nodes();
    if fluid.n_nodes() != n {
        return Err(RfError::ShapeMismatch {
            what: "derived state length",
            expected: n,
            found: fluid.n_nodes(),
        });
    }
    let transport = match (layout.viscous, &fluid.transport) {
        (true, None) => {
            return Err(RfError::InvalidArg {
                what: "viscous operator needs transport fields",
            });
        }
        (true, Some(tr)) => Some(tr),
        (false, _) => None,
    };

    let stride = layout.stride();
    let mut packed = vec![0.0; n * stride];
    for (node, q) in packed.chunks_exact_mut(stride).enumerate() {
        for (slot, field) in q.iter_mut().zip(cv.components()) {
            *slot = field[node];
        }
        q[layout.pressure()] = fluid.pressure[node];
        q[layout.sound_speed()] = fluid.sound_speed[node];
        q[layout.temperature()] = fluid.temperature[node];
        if let Some(tr) = transport {
            q[layout.viscosity()] = tr.viscosity[node];
            q[layout.conductivity()] = tr.thermal_conductivity[node];
            for s in 0..layout.nspecies {
                q[layout.diffusivity(s)] = tr.species_diffusivity.get(s).map_or(0.0, |d| d[node]);
            }
        }
    }
    Ok(packed)
}

/// Mirror state across a wall normal to `axis`.
///
/// Slip walls flip the normal momentum; no-slip walls (viscous layouts) flip
/// all of it. Isothermal walls set the ghost temperature so that the face
/// temperature equals the wall temperature.
pub fn wall_ghost(layout: &Layout, q: &[f64], axis: usize, bc: &Boundaries) -> Vec<f64> {
    let mut ghost = q.to_vec();
    if layout.viscous {
        for a in 0..layout.dim {
            ghost[layout.momentum(a)] = -q[layout.momentum(a)];
        }
        if let Some(tw) = bc.wall_temperature() {
            ghost[layout.temperature()] = 2.0 * tw - q[layout.temperature()];
        }
    } else {
        ghost[layout.momentum(axis)] = -q[layout.momentum(axis)];
    }
    ghost
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundaries::WallThermal;
    use rf_core::Field;
    use rf_fluids::TransportFields;

    fn sample(viscous: bool) -> (Layout, ConservedState, DerivedFluidState) {
        let layout = Layout {
            dim: 2,
            nspecies: 1,
            viscous,
        };
        let cv = ConservedState::new(
            Field::from_vec(vec![1.0, 2.0]),
            vec![Field::from_vec(vec![3.0, 4.0]), Field::from_vec(vec![5.0, 6.0])],
            Field::from_vec(vec![7.0, 8.0]),
            vec![Field::from_vec(vec![1.0, 2.0])],
        )
        .unwrap();
        let fluid = DerivedFluidState {
            temperature: Field::filled(2, 300.0),
            pressure: Field::filled(2, 1e5),
            sound_speed: Field::filled(2, 340.0),
            heat_capacity_cp: Field::filled(2, 1000.0),
            transport: Some(TransportFields {
                viscosity: Field::filled(2, 1e-5),
                thermal_conductivity: Field::filled(2, 0.02),
                species_diffusivity: vec![Field::filled(2, 1e-4)],
            }),
        };
        (layout, cv, fluid)
    }

    #[test]
    fn packs_in_layout_order() {
        let (layout, cv, fluid) = sample(true);
        let packed = pack(&layout, &cv, &fluid).unwrap();
        assert_eq!(layout.stride(), 11);
        let q = &packed[layout.stride()..];
        assert_eq!(&q[..5], &[2.0, 4.0, 6.0, 8.0, 2.0]);
        assert_eq!(q[layout.temperature()], 300.0);
        assert_eq!(q[layout.diffusivity(0)], 1e-4);
        assert_eq!(layout.velocity(q, 1), 3.0);
    }

    #[test]
    fn viscous_pack_needs_transport() {
        let (layout, cv, mut fluid) = sample(true);
        fluid.transport = None;
        assert!(pack(&layout, &cv, &fluid).is_err());
    }

    #[test]
    fn ghosts_mirror_momentum() {
        let (layout, cv, fluid) = sample(false);
        let packed = pack(&layout, &cv, &fluid).unwrap();
        let q = &packed[..layout.stride()];
        let slip = wall_ghost(&layout, q, 0, &Boundaries::Wall(WallThermal::Adiabatic));
        assert_eq!(slip[layout.momentum(0)], -3.0);
        assert_eq!(slip[layout.momentum(1)], 5.0);

        let (vl, cv, fluid) = sample(true);
        let packed = pack(&vl, &cv, &fluid).unwrap();
        let q = &packed[..vl.stride()];
        let bc = Boundaries::Wall(WallThermal::Isothermal { temperature: 400.0 });
        let noslip = wall_ghost(&vl, q, 0, &bc);
        assert_eq!(noslip[vl.momentum(1)], -5.0);
        assert_eq!(noslip[vl.temperature()], 500.0);
    }
}
