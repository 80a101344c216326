//! One-step global reaction mechanism.

use rf_core::constants::R_UNIVERSAL;
use serde::{Deserialize, Serialize};

use crate::error::{FluidError, FluidResult};
use crate::species::SpeciesData;

/// Species participation in the global step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoichTerm {
    pub species: usize,
    /// Stoichiometric coefficient (positive).
    pub nu: f64,
    /// Reaction order in this species' molar concentration (reactants only).
    pub order: f64,
}

/// `reactants -> products` with rate `A T^b exp(-Ea / (R T)) Π [X_r]^order_r`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mechanism {
    pub reactants: Vec<StoichTerm>,
    pub products: Vec<StoichTerm>,
    /// Pre-exponential factor (SI units consistent with the orders).
    pub pre_exponential: f64,
    pub temperature_exponent: f64,
    /// Activation energy [J/mol].
    pub activation_energy: f64,
}

impl Mechanism {
    /// `H2 + 0.5 O2 -> H2O` on the [`crate::species::hydrogen_air`] species set.
    pub fn hydrogen_air() -> Self {
        Self {
            reactants: vec![
                StoichTerm {
                    species: 0,
                    nu: 1.0,
                    order: 1.0,
                },
                StoichTerm {
                    species: 1,
                    nu: 0.5,
                    order: 1.0,
                },
            ],
            products: vec![StoichTerm {
                species: 2,
                nu: 1.0,
                order: 0.0,
            }],
            pre_exponential: 2.5e7,
            temperature_exponent: 0.0,
            activation_energy: 1.0e5,
        }
    }

    /// Check species indices against a species table.
    pub fn validate(&self, species: &[SpeciesData]) -> FluidResult<()> {
        if self.reactants.is_empty() || self.products.is_empty() {
            return Err(FluidError::InvalidArg {
                what: "mechanism needs at least one reactant and one product",
            });
        }
        for term in self.reactants.iter().chain(&self.products) {
            if term.species >= species.len() {
                return Err(FluidError::ShapeMismatch {
                    what: "mechanism species index",
                    expected: species.len(),
                    found: term.species,
                });
            }
            if !(term.nu.is_finite() && term.nu > 0.0) {
                return Err(FluidError::InvalidArg {
                    what: "stoichiometric coefficients must be positive",
                });
            }
        }
        Ok(())
    }

    /// Fuel is the first reactant, oxidizer the second.
    pub fn fuel(&self) -> Option<&StoichTerm> {
        self.reactants.first()
    }

    pub fn oxidizer(&self) -> Option<&StoichTerm> {
        self.reactants.get(1)
    }

    /// Molar rate of progress [mol/(m³·s)] at one node.
    pub fn rate_of_progress(&self, species: &[SpeciesData], rho: f64, t: f64, y: &[f64]) -> f64 {
        let k = self.pre_exponential
            * t.powf(self.temperature_exponent)
            * (-self.activation_energy / (R_UNIVERSAL * t)).exp();
        self.reactants.iter().fold(k, |acc, term| {
            let conc = (rho * y[term.species] / species[term.species].molar_mass).max(0.0);
            acc * conc.powf(term.order)
        })
    }

    /// Mass production rates at one node, written into `out` (one per species).
    ///
    /// Product rates are distributed from the consumed reactant mass so that
    /// the rates sum to zero regardless of molar-mass rounding.
    pub fn production_rates(
        &self,
        species: &[SpeciesData],
        rho: f64,
        t: f64,
        y: &[f64],
        out: &mut [f64],
    ) {
        out.iter_mut().for_each(|w| *w = 0.0);
        let q = self.rate_of_progress(species, rho, t, y);
        if q == 0.0 {
            return;
        }

        let mut consumed = 0.0;
        for term in &self.reactants {
            let w = term.nu * species[term.species].molar_mass * q;
            out[term.species] -= w;
            consumed += w;
        }

        let product_weight: f64 = self
            .products
            .iter()
            .map(|p| p.nu * species[p.species].molar_mass)
            .sum();
        for term in &self.products {
            let share = term.nu * species[term.species].molar_mass / product_weight;
            out[term.species] += consumed * share;
        }
    }

    /// Premixed fuel/oxidizer/diluent mole fractions for equivalence ratio `phi`.
    ///
    /// `oxidizer_fraction` is the oxidizer mole fraction of the
    /// oxidizer+diluent stream (0.21 for air).
    pub fn premixed_mole_fractions(
        &self,
        nspecies: usize,
        diluent: usize,
        phi: f64,
        oxidizer_fraction: f64,
    ) -> FluidResult<Vec<f64>> {
        let (fuel, ox) = match (self.fuel(), self.oxidizer()) {
            (Some(f), Some(o)) => (f, o),
            _ => {
                return Err(FluidError::InvalidArg {
                    what: "premixed composition needs a fuel and an oxidizer",
                });
            }
        };
        if diluent >= nspecies || fuel.species >= nspecies || ox.species >= nspecies {
            return Err(FluidError::ShapeMismatch {
                what: "premixed species index",
                expected: nspecies,
                found: diluent.max(fuel.species).max(ox.species),
            });
        }
        if !(phi > 0.0 && oxidizer_fraction > 0.0 && oxidizer_fraction <= 1.0) {
            return Err(FluidError::InvalidArg {
                what: "equivalence ratio and oxidizer fraction must be positive",
            });
        }

        let stoich = ox.nu / fuel.nu;
        let mut x = vec![0.0; nspecies];
        x[fuel.species] = oxidizer_fraction * phi / (stoich + oxidizer_fraction * phi);
        x[ox.species] = stoich * x[fuel.species] / phi;
        x[diluent] = (1.0 - oxidizer_fraction) * x[ox.species] / oxidizer_fraction;
        Ok(x)
    }
}

/// Convert mole fractions to mass fractions.
pub fn mole_to_mass_fractions(species: &[SpeciesData], x: &[f64]) -> Vec<f64> {
    let w_mix: f64 = species.iter().zip(x).map(|(s, &xi)| s.molar_mass * xi).sum();
    species
        .iter()
        .zip(x)
        .map(|(s, &xi)| xi * s.molar_mass / w_mix)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::species::hydrogen_air;

    #[test]
    fn production_rates_conserve_mass() {
        let species = hydrogen_air();
        let mech = Mechanism::hydrogen_air();
        let y = [0.028, 0.226, 0.0, 0.746];
        let mut out = [0.0; 4];
        mech.production_rates(&species, 0.4, 1500.0, &y, &mut out);
        assert!(out[0] < 0.0 && out[1] < 0.0 && out[2] > 0.0);
        assert_eq!(out[3], 0.0);
        let total: f64 = out.iter().sum();
        assert!(total.abs() <= 1e-12 * out[2].abs());
    }

    #[test]
    fn no_fuel_no_reaction() {
        let species = hydrogen_air();
        let mech = Mechanism::hydrogen_air();
        let mut out = [1.0; 4];
        mech.production_rates(&species, 1.0, 2000.0, &[0.0, 0.23, 0.0, 0.77], &mut out);
        assert_eq!(out, [0.0; 4]);
    }

    #[test]
    fn premixed_fractions_sum_to_one() {
        let mech = Mechanism::hydrogen_air();
        let x = mech.premixed_mole_fractions(4, 3, 1.0, 0.21).unwrap();
        let sum: f64 = x.iter().sum();
        assert!((sum - 1.0).abs() < 1e-14);
        // stoichiometric: two H2 per O2
        assert!((x[0] / x[1] - 2.0).abs() < 1e-12);
        let y = mole_to_mass_fractions(&hydrogen_air(), &x);
        assert!((y.iter().sum::<f64>() - 1.0).abs() < 1e-14);
    }

    #[test]
    fn validate_catches_bad_index() {
        let mut mech = Mechanism::hydrogen_air();
        mech.products[0].species = 9;
        assert!(mech.validate(&hydrogen_air()).is_err());
    }
}
