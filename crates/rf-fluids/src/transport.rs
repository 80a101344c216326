//! Constant-coefficient transport model.

use rf_core::Field;
use serde::{Deserialize, Serialize};

use crate::error::{FluidError, FluidResult};

/// Transport coefficients evaluated on the local partition.
#[derive(Clone, Debug, PartialEq)]
pub struct TransportFields {
    /// Dynamic viscosity [Pa·s].
    pub viscosity: Field,
    /// Thermal conductivity [W/(m·K)].
    pub thermal_conductivity: Field,
    /// Mass diffusivity [m²/s], one per species.
    pub species_diffusivity: Vec<Field>,
}

/// Constant viscosity, conductivity and per-species diffusivity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimpleTransport {
    pub viscosity: f64,
    pub thermal_conductivity: f64,
    pub species_diffusivity: Vec<f64>,
}

impl SimpleTransport {
    pub fn new(
        viscosity: f64,
        thermal_conductivity: f64,
        species_diffusivity: Vec<f64>,
    ) -> FluidResult<Self> {
        let ok = |v: f64| v.is_finite() && v >= 0.0;
        if !ok(viscosity) || !ok(thermal_conductivity) || !species_diffusivity.iter().all(|&d| ok(d))
        {
            return Err(FluidError::NonPhysical {
                what: "transport coefficients must be finite and non-negative",
            });
        }
        Ok(Self {
            viscosity,
            thermal_conductivity,
            species_diffusivity,
        })
    }

    /// Same diffusivity for all `nspecies` species.
    pub fn uniform(
        viscosity: f64,
        thermal_conductivity: f64,
        diffusivity: f64,
        nspecies: usize,
    ) -> FluidResult<Self> {
        Self::new(viscosity, thermal_conductivity, vec![diffusivity; nspecies])
    }

    /// Largest species diffusivity (0 with no species).
    pub fn max_diffusivity(&self) -> f64 {
        self.species_diffusivity.iter().copied().fold(0.0, f64::max)
    }

    pub fn fields(&self, n_nodes: usize) -> TransportFields {
        TransportFields {
            viscosity: Field::filled(n_nodes, self.viscosity),
            thermal_conductivity: Field::filled(n_nodes, self.thermal_conductivity),
            species_diffusivity: self
                .species_diffusivity
                .iter()
                .map(|&d| Field::filled(n_nodes, d))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_coefficients() {
        assert!(SimpleTransport::new(-1e-5, 0.02, vec![]).is_err());
        assert!(SimpleTransport::new(1e-5, 0.02, vec![1e-4, f64::NAN]).is_err());
    }

    #[test]
    fn fields_broadcast_coefficients() {
        let tr = SimpleTransport::new(1e-5, 0.025, vec![1e-4, 2e-4]).unwrap();
        let f = tr.fields(3);
        assert_eq!(f.viscosity.as_slice(), &[1e-5; 3]);
        assert_eq!(f.species_diffusivity.len(), 2);
        assert_eq!(f.species_diffusivity[1][2], 2e-4);
        assert_eq!(tr.max_diffusivity(), 2e-4);
    }
}
