//! Species property data.

use rf_core::constants::{R_UNIVERSAL, T_REF_K};
use serde::{Deserialize, Serialize};

/// Thermodynamic data for one species.
///
/// `c_v(T) = cv_a + cv_b * T`, integrated from `T_REF_K` on top of the
/// formation energy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeciesData {
    pub name: String,
    /// Molar mass [kg/mol].
    pub molar_mass: f64,
    /// Constant part of `c_v` [J/(kg·K)].
    pub cv_a: f64,
    /// Linear coefficient of `c_v` [J/(kg·K²)].
    pub cv_b: f64,
    /// Internal energy of formation at `T_REF_K` [J/kg].
    pub formation_energy: f64,
}

impl SpeciesData {
    pub fn new(name: &str, molar_mass: f64, cv_a: f64, cv_b: f64, formation_energy: f64) -> Self {
        Self {
            name: name.to_string(),
            molar_mass,
            cv_a,
            cv_b,
            formation_energy,
        }
    }

    /// Specific gas constant [J/(kg·K)].
    pub fn gas_constant(&self) -> f64 {
        R_UNIVERSAL / self.molar_mass
    }

    pub fn cv(&self, t: f64) -> f64 {
        self.cv_a + self.cv_b * t
    }

    pub fn internal_energy(&self, t: f64) -> f64 {
        self.formation_energy
            + self.cv_a * (t - T_REF_K)
            + 0.5 * self.cv_b * (t * t - T_REF_K * T_REF_K)
    }
}

/// Hydrogen/air species set: H2, O2, H2O, N2.
pub fn hydrogen_air() -> Vec<SpeciesData> {
    vec![
        SpeciesData::new("H2", 2.016e-3, 9.8e3, 1.4, 0.0),
        SpeciesData::new("O2", 31.998e-3, 620.0, 0.16, 0.0),
        SpeciesData::new("H2O", 18.015e-3, 1.2e3, 0.65, -1.3422e7),
        SpeciesData::new("N2", 28.014e-3, 700.0, 0.12, 0.0),
    ]
}
