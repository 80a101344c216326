//! Thermally perfect multi-species ideal-gas mixture.

use rf_core::Field;
use rf_core::constants::R_UNIVERSAL;

use crate::conserved::ConservedState;
use crate::error::{FluidError, FluidResult};
use crate::mechanism::Mechanism;
use crate::species::{self, SpeciesData};
use crate::thermochemistry::Thermochemistry;

/// Default number of Newton updates in the temperature inversion.
pub const DEFAULT_NEWTON_ITERATIONS: usize = 5;

/// Ideal-gas mixture with temperature-dependent heat capacities.
///
/// Temperature is recovered with a fixed number of Newton updates from the
/// seed and is not checked for convergence here; the caller's health check
/// evaluates `temperature_update_residual` for that.
#[derive(Clone, Debug)]
pub struct MixtureGas {
    species: Vec<SpeciesData>,
    mechanism: Option<Mechanism>,
    newton_iterations: usize,
}

impl MixtureGas {
    pub fn new(
        species: Vec<SpeciesData>,
        mechanism: Option<Mechanism>,
        newton_iterations: usize,
    ) -> FluidResult<Self> {
        if species.is_empty() {
            return Err(FluidError::InvalidArg {
                what: "mixture needs at least one species",
            });
        }
        if species.iter().any(|s| !(s.molar_mass > 0.0 && s.cv_a > 0.0)) {
            return Err(FluidError::NonPhysical {
                what: "species molar mass and heat capacity",
            });
        }
        if let Some(mech) = &mechanism {
            mech.validate(&species)?;
        }
        Ok(Self {
            species,
            mechanism,
            newton_iterations,
        })
    }

    /// H2/O2/H2O/N2 mixture, optionally with the one-step H2 oxidation.
    pub fn hydrogen_air(reacting: bool, newton_iterations: usize) -> FluidResult<Self> {
        let mechanism = reacting.then(Mechanism::hydrogen_air);
        Self::new(species::hydrogen_air(), mechanism, newton_iterations)
    }

    pub fn species(&self) -> &[SpeciesData] {
        &self.species
    }

    pub fn mechanism(&self) -> Option<&Mechanism> {
        self.mechanism.as_ref()
    }

    pub fn species_index(&self, name: &str) -> FluidResult<usize> {
        self.species
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| FluidError::UnknownSpecies {
                name: name.to_string(),
            })
    }

    fn cv_mix(&self, t: f64, y: &[f64]) -> f64 {
        self.species.iter().zip(y).map(|(s, &yi)| yi * s.cv(t)).sum()
    }

    /// One Newton update for `e(T) = e_target`.
    fn newton_update(&self, e_target: f64, t: f64, y: &[f64]) -> f64 {
        (e_target - self.mixture_internal_energy(t, y)) / self.cv_mix(t, y)
    }

    fn check_nodes(&self, cv: &ConservedState, temperature: &Field) -> FluidResult<()> {
        if cv.nspecies() != self.species.len() {
            return Err(FluidError::ShapeMismatch {
                what: "species count",
                expected: self.species.len(),
                found: cv.nspecies(),
            });
        }
        if temperature.len() != cv.n_nodes() {
            return Err(FluidError::ShapeMismatch {
                what: "temperature length",
                expected: cv.n_nodes(),
                found: temperature.len(),
            });
        }
        Ok(())
    }
}

impl Thermochemistry for MixtureGas {
    fn name(&self) -> &'static str {
        "MixtureGas"
    }

    fn nspecies(&self) -> usize {
        self.species.len()
    }

    fn species_names(&self) -> Vec<String> {
        self.species.iter().map(|s| s.name.clone()).collect()
    }

    fn is_reactive(&self) -> bool {
        self.mechanism.is_some()
    }

    fn gas_constant(&self, y: &[f64]) -> f64 {
        self.species
            .iter()
            .zip(y)
            .map(|(s, &yi)| yi * R_UNIVERSAL / s.molar_mass)
            .sum()
    }

    fn mixture_internal_energy(&self, t: f64, y: &[f64]) -> f64 {
        self.species
            .iter()
            .zip(y)
            .map(|(s, &yi)| yi * s.internal_energy(t))
            .sum()
    }

    fn recover_temperature(&self, cv: &ConservedState, seed: &Field) -> FluidResult<Field> {
        self.check_nodes(cv, seed)?;
        let e = cv.specific_internal_energy();
        Ok(Field::from_fn(cv.n_nodes(), |i| {
            let y = cv.mass_fractions_at(i);
            let mut t = seed[i];
            for _ in 0..self.newton_iterations {
                t += self.newton_update(e[i], t, &y);
            }
            t
        }))
    }

    fn pressure(&self, cv: &ConservedState, temperature: &Field) -> FluidResult<Field> {
        self.check_nodes(cv, temperature)?;
        Ok(Field::from_fn(cv.n_nodes(), |i| {
            let y = cv.mass_fractions_at(i);
            cv.mass[i] * self.gas_constant(&y) * temperature[i]
        }))
    }

    fn sound_speed(&self, cv: &ConservedState, temperature: &Field) -> FluidResult<Field> {
        self.check_nodes(cv, temperature)?;
        Ok(Field::from_fn(cv.n_nodes(), |i| {
            let y = cv.mass_fractions_at(i);
            let t = temperature[i];
            let r = self.gas_constant(&y);
            let cv_m = self.cv_mix(t, &y);
            let gamma = (cv_m + r) / cv_m;
            (gamma * r * t).sqrt()
        }))
    }

    fn heat_capacity_cp(&self, cv: &ConservedState, temperature: &Field) -> FluidResult<Field> {
        self.check_nodes(cv, temperature)?;
        Ok(Field::from_fn(cv.n_nodes(), |i| {
            let y = cv.mass_fractions_at(i);
            self.cv_mix(temperature[i], &y) + self.gas_constant(&y)
        }))
    }

    fn species_source_terms(
        &self,
        cv: &ConservedState,
        temperature: &Field,
    ) -> FluidResult<Vec<Field>> {
        self.check_nodes(cv, temperature)?;
        let ns = self.species.len();
        let mut out = vec![Field::zeros(cv.n_nodes()); ns];
        let Some(mech) = &self.mechanism else {
            return Ok(out);
        };

        let mut rates = vec![0.0; ns];
        for i in 0..cv.n_nodes() {
            let y = cv.mass_fractions_at(i);
            mech.production_rates(&self.species, cv.mass[i], temperature[i], &y, &mut rates);
            for (field, &w) in out.iter_mut().zip(&rates) {
                field[i] = w;
            }
        }
        Ok(out)
    }

    fn temperature_update_residual(
        &self,
        energy: &Field,
        temperature: &Field,
        mass_fractions: &[Field],
    ) -> FluidResult<Field> {
        if mass_fractions.len() != self.species.len() {
            return Err(FluidError::ShapeMismatch {
                what: "mass fraction count",
                expected: self.species.len(),
                found: mass_fractions.len(),
            });
        }
        if energy.len() != temperature.len() {
            return Err(FluidError::ShapeMismatch {
                what: "energy length",
                expected: temperature.len(),
                found: energy.len(),
            });
        }
        Ok(Field::from_fn(temperature.len(), |i| {
            let y: Vec<f64> = mass_fractions.iter().map(|f| f[i]).collect();
            self.newton_update(energy[i], temperature[i], &y)
        }))
    }
}
