//! The spatial operator contract and the shared flux assembly.

use std::borrow::Cow;

use rf_comm::Communicator;
use rf_core::{Field, RfError, RfResult};
use rf_fluids::{ConservedState, DerivedFluidState};
use rf_mesh::Discretization;

use crate::boundaries::Boundaries;
use crate::flux;
use crate::halo::{XHalo, exchange_x};
use crate::pack::{self, Layout};

/// Semi-discrete spatial operator: `dU/dt = rate(U)`.
pub trait SpatialOperator: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;

    fn discretization(&self) -> &Discretization;

    /// Rate of change of the conserved state.
    ///
    /// Collective: exchanges halo planes with the neighbouring ranks.
    fn rate(
        &self,
        t: f64,
        cv: &ConservedState,
        fluid: &DerivedFluidState,
        comm: &dyn Communicator,
    ) -> RfResult<ConservedState>;

    /// Node-local largest stable timestep at CFL 1.
    fn max_stable_timestep(&self, cv: &ConservedState, fluid: &DerivedFluidState) -> Field;

    /// Node-local CFL number of timestep `dt`.
    fn local_cfl(&self, cv: &ConservedState, fluid: &DerivedFluidState, dt: f64) -> Field {
        self.max_stable_timestep(cv, fluid).map(|stable| dt / stable)
    }
}

pub(crate) fn check_shape(discr: &Discretization, cv: &ConservedState) -> RfResult<()> {
    if cv.n_nodes() != discr.n_nodes() {
        return Err(RfError::ShapeMismatch {
            what: "conserved state nodes",
            expected: discr.n_nodes(),
            found: cv.n_nodes(),
        });
    }
    if cv.dim() != discr.dim() {
        return Err(RfError::ShapeMismatch {
            what: "momentum components",
            expected: discr.dim(),
            found: cv.dim(),
        });
    }
    Ok(())
}

/// Speed of sound plus flow speed at every node.
pub(crate) fn wave_speed(cv: &ConservedState, fluid: &DerivedFluidState) -> Field {
    Field::from_fn(cv.n_nodes(), |i| {
        let rho = cv.mass[i];
        let u2: f64 = cv.momentum.iter().map(|m| (m[i] / rho).powi(2)).sum();
        u2.sqrt() + fluid.sound_speed[i]
    })
}

fn slot(packed: &[f64], stride: usize, node: usize) -> &[f64] {
    &packed[node * stride..(node + 1) * stride]
}

/// Finite-volume style assembly on the node grid.
///
/// Every face flux is evaluated from the same two packed states on both
/// sides of the face (including across rank boundaries), so the update is
/// conservative and independent of the partitioning.
pub(crate) struct Assembler<'a> {
    pub discr: &'a Discretization,
    pub boundaries: Boundaries,
    pub layout: Layout,
}

impl Assembler<'_> {
    pub fn rate(
        &self,
        cv: &ConservedState,
        fluid: &DerivedFluidState,
        comm: &dyn Communicator,
    ) -> RfResult<ConservedState> {
        check_shape(self.discr, cv)?;
        let layout = &self.layout;
        let stride = layout.stride();
        let ncomp = layout.ncomp();
        let packed = pack::pack(layout, cv, fluid)?;
        let halo = exchange_x(
            self.discr,
            &packed,
            stride,
            self.boundaries.is_periodic(),
            comm,
        )?;

        let n = cv.n_nodes();
        let mut rate = vec![0.0; n * ncomp];
        let mut f_left = vec![0.0; ncomp];
        let mut f_right = vec![0.0; ncomp];

        for axis in 0..layout.dim {
            let h = self.discr.spacing(axis);
            for node in 0..n {
                let q = slot(&packed, stride, node);
                let left = self.neighbor(&packed, &halo, node, axis, false);
                let right = self.neighbor(&packed, &halo, node, axis, true);
                self.face_flux(&left, q, axis, h, &mut f_left);
                self.face_flux(q, &right, axis, h, &mut f_right);
                let r = &mut rate[node * ncomp..(node + 1) * ncomp];
                for ((r, fr), fl) in r.iter_mut().zip(&f_right).zip(&f_left) {
                    *r -= (fr - fl) / h;
                }
            }
        }

        let mut out = cv.zeros_like();
        for (c, field) in out.components_mut().enumerate() {
            for (node, v) in field.as_mut_slice().iter_mut().enumerate() {
                *v = rate[node * ncomp + c];
            }
        }
        Ok(out)
    }

    fn face_flux(&self, ql: &[f64], qr: &[f64], axis: usize, h: f64, out: &mut [f64]) {
        flux::rusanov(&self.layout, ql, qr, axis, out);
        if self.layout.viscous {
            flux::subtract_viscous(&self.layout, ql, qr, h, out);
        }
    }

    /// Packed state across the face on one side of `node`.
    fn neighbor<'p>(
        &self,
        packed: &'p [f64],
        halo: &'p XHalo,
        node: usize,
        axis: usize,
        right: bool,
    ) -> Cow<'p, [f64]> {
        let stride = self.layout.stride();
        let shape = self.discr.node_shape();
        let mut g = self.discr.grid_index(node);

        let interior = if right {
            g[axis] + 1 < shape[axis]
        } else {
            g[axis] > 0
        };
        if interior {
            if right {
                g[axis] += 1;
            } else {
                g[axis] -= 1;
            }
            return Cow::Borrowed(slot(packed, stride, self.discr.node_index(g[0], g[1], g[2])));
        }

        if axis == 0 {
            let plane = if right { &halo.right } else { &halo.left };
            if let Some(plane) = plane {
                return Cow::Borrowed(slot(plane, stride, g[1] + shape[1] * g[2]));
            }
        } else if self.boundaries.is_periodic() {
            g[axis] = if right { 0 } else { shape[axis] - 1 };
            return Cow::Borrowed(slot(packed, stride, self.discr.node_index(g[0], g[1], g[2])));
        }

        let q = slot(packed, stride, node);
        Cow::Owned(pack::wall_ghost(&self.layout, q, axis, &self.boundaries))
    }
}
