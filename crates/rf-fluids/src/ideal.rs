//! Calorically perfect single-component gas.

use rf_core::Field;

use crate::conserved::ConservedState;
use crate::error::{FluidError, FluidResult};
use crate::thermochemistry::Thermochemistry;

/// Single ideal gas with constant ratio of specific heats.
///
/// Temperature follows in closed form from the internal energy, so the seed
/// is ignored and the update residual is identically zero.
#[derive(Clone, Debug)]
pub struct IdealSingleGas {
    gamma: f64,
    gas_const: f64,
}

impl Default for IdealSingleGas {
    fn default() -> Self {
        Self {
            gamma: 1.4,
            gas_const: 287.1,
        }
    }
}

impl IdealSingleGas {
    pub fn new(gamma: f64, gas_const: f64) -> FluidResult<Self> {
        if !(gamma.is_finite() && gamma > 1.0) {
            return Err(FluidError::InvalidArg {
                what: "gamma must be greater than 1",
            });
        }
        let gas_const = rf_core::ensure_positive(gas_const, "gas constant")?;
        Ok(Self { gamma, gas_const })
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    fn cv(&self) -> f64 {
        self.gas_const / (self.gamma - 1.0)
    }
}

impl Thermochemistry for IdealSingleGas {
    fn name(&self) -> &'static str {
        "IdealSingleGas"
    }

    fn nspecies(&self) -> usize {
        0
    }

    fn species_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn gas_constant(&self, _y: &[f64]) -> f64 {
        self.gas_const
    }

    fn mixture_internal_energy(&self, t: f64, _y: &[f64]) -> f64 {
        self.cv() * t
    }

    fn recover_temperature(&self, cv: &ConservedState, _seed: &Field) -> FluidResult<Field> {
        let cv_gas = self.cv();
        Ok(cv.specific_internal_energy().map(|e| e / cv_gas))
    }

    fn pressure(&self, cv: &ConservedState, temperature: &Field) -> FluidResult<Field> {
        let r = self.gas_const;
        Ok(cv.mass.zip_map(temperature, |rho, t| rho * r * t)?)
    }

    fn sound_speed(&self, _cv: &ConservedState, temperature: &Field) -> FluidResult<Field> {
        let gr = self.gamma * self.gas_const;
        Ok(temperature.map(|t| (gr * t).sqrt()))
    }

    fn heat_capacity_cp(&self, _cv: &ConservedState, temperature: &Field) -> FluidResult<Field> {
        Ok(Field::filled(temperature.len(), self.gamma * self.cv()))
    }

    fn species_source_terms(
        &self,
        _cv: &ConservedState,
        _temperature: &Field,
    ) -> FluidResult<Vec<Field>> {
        Ok(Vec::new())
    }

    fn temperature_update_residual(
        &self,
        _energy: &Field,
        temperature: &Field,
        _mass_fractions: &[Field],
    ) -> FluidResult<Field> {
        Ok(temperature.zeros_like())
    }
}
