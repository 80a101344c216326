//! Interface fluxes.

use crate::pack::Layout;

/// Physical Euler flux along `axis` of a packed node, added into `out`
/// with weight `w`.
fn add_euler_flux(layout: &Layout, q: &[f64], axis: usize, w: f64, out: &mut [f64]) {
    let un = layout.velocity(q, axis);
    let p = q[layout.pressure()];
    out[layout.mass()] += w * q[layout.momentum(axis)];
    for a in 0..layout.dim {
        let mut f = q[layout.momentum(a)] * un;
        if a == axis {
            f += p;
        }
        out[layout.momentum(a)] += w * f;
    }
    out[layout.energy()] += w * (q[layout.energy()] + p) * un;
    for s in 0..layout.nspecies {
        out[layout.species(s)] += w * q[layout.species(s)] * un;
    }
}

/// Largest characteristic speed `|u_n| + c` across a face.
pub fn face_wave_speed(layout: &Layout, ql: &[f64], qr: &[f64], axis: usize) -> f64 {
    let s = |q: &[f64]| layout.velocity(q, axis).abs() + q[layout.sound_speed()];
    s(ql).max(s(qr))
}

/// Rusanov (local Lax-Friedrichs) flux through the face between `ql` and
/// `qr`, normal to `axis`. Writes the conserved components of `out`.
pub fn rusanov(layout: &Layout, ql: &[f64], qr: &[f64], axis: usize, out: &mut [f64]) {
    let ncomp = layout.ncomp();
    out[..ncomp].iter_mut().for_each(|f| *f = 0.0);
    add_euler_flux(layout, ql, axis, 0.5, out);
    add_euler_flux(layout, qr, axis, 0.5, out);
    let lambda = face_wave_speed(layout, ql, qr, axis);
    for c in 0..ncomp {
        out[c] -= 0.5 * lambda * (qr[c] - ql[c]);
    }
}

/// Diffusive flux through the face, subtracted from `out`.
///
/// Laplacian form with face-averaged coefficients: `mu grad u` for momentum,
/// `kappa grad T + mu grad(|u|^2/2)` for energy and `rho D grad Y` for
/// species.
pub fn subtract_viscous(layout: &Layout, ql: &[f64], qr: &[f64], h: f64, out: &mut [f64]) {
    let avg = |i: usize| 0.5 * (ql[i] + qr[i]);
    let mu = avg(layout.viscosity());
    let kappa = avg(layout.conductivity());

    for a in 0..layout.dim {
        let du = layout.velocity(qr, a) - layout.velocity(ql, a);
        out[layout.momentum(a)] -= mu * du / h;
    }

    let dt = qr[layout.temperature()] - ql[layout.temperature()];
    let dke = layout.kinetic_energy(qr) - layout.kinetic_energy(ql);
    out[layout.energy()] -= (kappa * dt + mu * dke) / h;

    let rho = avg(layout.mass());
    for s in 0..layout.nspecies {
        let d = avg(layout.diffusivity(s));
        let yl = ql[layout.species(s)] / ql[layout.mass()];
        let yr = qr[layout.species(s)] / qr[layout.mass()];
        out[layout.species(s)] -= rho * d * (yr - yl) / h;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const L: Layout = Layout {
        dim: 1,
        nspecies: 0,
        viscous: false,
    };

    /// rho, m, E, p, c, T
    fn node(rho: f64, u: f64, p: f64) -> Vec<f64> {
        let e = p / 0.4 + 0.5 * rho * u * u;
        vec![rho, rho * u, e, p, (1.4 * p / rho).sqrt(), p / (rho * 287.0)]
    }

    #[test]
    fn consistent_for_equal_states() {
        let q = node(1.2, 30.0, 1e5);
        let mut f = vec![0.0; 3];
        rusanov(&L, &q, &q, 0, &mut f);
        assert!((f[0] - 36.0).abs() < 1e-12);
        assert!((f[1] - (1.2 * 900.0 + 1e5)).abs() < 1e-9);
    }

    #[test]
    fn upwinds_toward_lower_density() {
        let ql = node(2.0, 0.0, 2e5);
        let qr = node(1.0, 0.0, 1e5);
        let mut f = vec![0.0; 3];
        rusanov(&L, &ql, &qr, 0, &mut f);
        assert!(f[0] > 0.0);
    }

    #[test]
    fn viscous_flux_opposes_gradient() {
        let layout = Layout {
            dim: 1,
            nspecies: 0,
            viscous: true,
        };
        let mut ql = node(1.0, 0.0, 1e5);
        ql.extend([1e-3, 0.0]);
        let mut qr = node(1.0, 10.0, 1e5);
        qr.extend([1e-3, 0.0]);
        let mut f = vec![0.0; 3];
        subtract_viscous(&layout, &ql, &qr, 0.1, &mut f);
        // momentum diffuses from right to left: negative flux
        assert!((f[1] + 1e-3 * 10.0 / 0.1).abs() < 1e-15);
        assert!(f[2] < 0.0);
    }
}
