//! Analytic initial conditions.

use rf_core::{Field, Pressure, Temperature};

use crate::conserved::ConservedState;
use crate::error::{FluidError, FluidResult};
use crate::mechanism::{Mechanism, mole_to_mass_fractions};
use crate::species::SpeciesData;
use crate::thermochemistry::Thermochemistry;

/// Initial conserved state together with the temperature it was built from.
///
/// The temperature becomes the first temperature seed.
#[derive(Clone, Debug, PartialEq)]
pub struct InitialCondition {
    pub cv: ConservedState,
    pub temperature: Field,
}

/// Produces the initial state on `n_nodes` local nodes.
pub trait Initializer: Send + Sync + std::fmt::Debug {
    fn initialize(
        &self,
        n_nodes: usize,
        dim: usize,
        eos: &dyn Thermochemistry,
    ) -> FluidResult<InitialCondition>;
}

fn check_velocity(velocity: &[f64], dim: usize) -> FluidResult<()> {
    if velocity.len() != dim {
        return Err(FluidError::ShapeMismatch {
            what: "initial velocity components",
            expected: dim,
            found: velocity.len(),
        });
    }
    Ok(())
}

fn build_state(
    n_nodes: usize,
    rho: f64,
    temperature: f64,
    velocity: &[f64],
    mass_fractions: &[f64],
    eos: &dyn Thermochemistry,
) -> FluidResult<InitialCondition> {
    if !(rho.is_finite() && rho > 0.0) || !(temperature.is_finite() && temperature > 0.0) {
        return Err(FluidError::NonPhysical {
            what: "initial density and temperature must be positive",
        });
    }
    let e = eos.mixture_internal_energy(temperature, mass_fractions);
    let ke = 0.5 * velocity.iter().map(|u| u * u).sum::<f64>();
    let cv = ConservedState::new(
        Field::filled(n_nodes, rho),
        velocity.iter().map(|&u| Field::filled(n_nodes, rho * u)).collect(),
        Field::filled(n_nodes, rho * (e + ke)),
        mass_fractions
            .iter()
            .map(|&y| Field::filled(n_nodes, rho * y))
            .collect(),
    )?;
    Ok(InitialCondition {
        cv,
        temperature: Field::filled(n_nodes, temperature),
    })
}

/// Uniform single-gas state from pressure, density and velocity.
#[derive(Clone, Debug)]
pub struct Uniform {
    pub pressure: Pressure,
    pub density: f64,
    pub velocity: Vec<f64>,
}

impl Initializer for Uniform {
    fn initialize(
        &self,
        n_nodes: usize,
        dim: usize,
        eos: &dyn Thermochemistry,
    ) -> FluidResult<InitialCondition> {
        if eos.nspecies() != 0 {
            return Err(FluidError::InvalidArg {
                what: "uniform initializer needs a single-component gas",
            });
        }
        check_velocity(&self.velocity, dim)?;
        let t = self.pressure.value / (self.density * eos.gas_constant(&[]));
        build_state(n_nodes, self.density, t, &self.velocity, &[], eos)
    }
}

/// Uniform mixture state from pressure, temperature, mass fractions and velocity.
#[derive(Clone, Debug)]
pub struct MixtureInitializer {
    pub pressure: Pressure,
    pub temperature: Temperature,
    pub mass_fractions: Vec<f64>,
    pub velocity: Vec<f64>,
}

impl MixtureInitializer {
    /// Premixed fuel/oxidizer/diluent at equivalence ratio `phi`.
    #[allow(clippy::too_many_arguments)]
    pub fn premixed(
        species: &[SpeciesData],
        mechanism: &Mechanism,
        diluent: usize,
        phi: f64,
        oxidizer_fraction: f64,
        pressure: Pressure,
        temperature: Temperature,
        velocity: Vec<f64>,
    ) -> FluidResult<Self> {
        let x = mechanism.premixed_mole_fractions(species.len(), diluent, phi, oxidizer_fraction)?;
        Ok(Self {
            pressure,
            temperature,
            mass_fractions: mole_to_mass_fractions(species, &x),
            velocity,
        })
    }
}

impl Initializer for MixtureInitializer {
    fn initialize(
        &self,
        n_nodes: usize,
        dim: usize,
        eos: &dyn Thermochemistry,
    ) -> FluidResult<InitialCondition> {
        if self.mass_fractions.len() != eos.nspecies() {
            return Err(FluidError::ShapeMismatch {
                what: "initial mass fractions",
                expected: eos.nspecies(),
                found: self.mass_fractions.len(),
            });
        }
        let sum: f64 = self.mass_fractions.iter().sum();
        if self.mass_fractions.iter().any(|&y| y < 0.0) || (sum - 1.0).abs() > 1e-12 {
            return Err(FluidError::NonPhysical {
                what: "initial mass fractions must be non-negative and sum to one",
            });
        }
        check_velocity(&self.velocity, dim)?;
        let t = self.temperature.value;
        let rho = self.pressure.value / (eos.gas_constant(&self.mass_fractions) * t);
        build_state(n_nodes, rho, t, &self.velocity, &self.mass_fractions, eos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ideal::IdealSingleGas;
    use crate::mixture::MixtureGas;
    use rf_core::{k, pa};

    #[test]
    fn uniform_hits_requested_pressure() {
        let gas = IdealSingleGas::default();
        let init = Uniform {
            pressure: pa(101_325.0),
            density: 1.2,
            velocity: vec![10.0, 0.0],
        };
        let ic = init.initialize(3, 2, &gas).unwrap();
        let t = gas.recover_temperature(&ic.cv, &ic.temperature).unwrap();
        let p = gas.pressure(&ic.cv, &t).unwrap();
        assert!((p[2] - 101_325.0).abs() < 1e-6);
        assert_eq!(ic.cv.momentum[0][0], 12.0);
    }

    #[test]
    fn velocity_must_match_dimension() {
        let gas = IdealSingleGas::default();
        let init = Uniform {
            pressure: pa(1e5),
            density: 1.0,
            velocity: vec![0.0],
        };
        assert!(init.initialize(1, 3, &gas).is_err());
    }

    #[test]
    fn premixed_mixture_state() {
        let gas = MixtureGas::hydrogen_air(true, 5).unwrap();
        let mech = Mechanism::hydrogen_air();
        let init = MixtureInitializer::premixed(
            gas.species(),
            &mech,
            3,
            1.0,
            0.21,
            pa(101_325.0),
            k(1500.0),
            vec![0.0],
        )
        .unwrap();
        let ic = init.initialize(2, 1, &gas).unwrap();
        let y = ic.cv.mass_fractions_at(1);
        assert!((y.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        let t = gas.recover_temperature(&ic.cv, &ic.temperature).unwrap();
        assert!((t[0] - 1500.0).abs() < 1e-8);
    }

    #[test]
    fn rejects_unnormalized_fractions() {
        let gas = MixtureGas::hydrogen_air(false, 5).unwrap();
        let init = MixtureInitializer {
            pressure: pa(1e5),
            temperature: k(300.0),
            mass_fractions: vec![0.5, 0.5, 0.5, 0.0],
            velocity: vec![0.0],
        };
        assert!(matches!(
            init.initialize(1, 1, &gas),
            Err(FluidError::NonPhysical { .. })
        ));
    }
}
