//! Thermochemistry kernel contract.

use rf_core::Field;

use crate::conserved::ConservedState;
use crate::error::FluidResult;

/// Equation of state plus chemistry for one gas.
///
/// Field-valued methods operate node-by-node on the local partition and never
/// communicate.
pub trait Thermochemistry: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;

    /// Number of transported species (0 for a single gas).
    fn nspecies(&self) -> usize;

    fn species_names(&self) -> Vec<String>;

    /// True if `species_source_terms` can be non-zero.
    fn is_reactive(&self) -> bool {
        false
    }

    /// Mixture gas constant `R_u / W_mix` [J/(kg·K)] for mass fractions `y`.
    fn gas_constant(&self, y: &[f64]) -> f64;

    /// Mixture specific internal energy [J/kg] at temperature `t`.
    fn mixture_internal_energy(&self, t: f64, y: &[f64]) -> f64;

    /// Energy → temperature inversion, started from `seed`.
    ///
    /// The result depends on the seed: an iterative kernel may stop before
    /// convergence or land on a wrong root when the seed is poor.
    fn recover_temperature(&self, cv: &ConservedState, seed: &Field) -> FluidResult<Field>;

    fn pressure(&self, cv: &ConservedState, temperature: &Field) -> FluidResult<Field>;

    fn sound_speed(&self, cv: &ConservedState, temperature: &Field) -> FluidResult<Field>;

    /// Mixture `c_p` [J/(kg·K)].
    fn heat_capacity_cp(&self, cv: &ConservedState, temperature: &Field) -> FluidResult<Field>;

    /// Mass production rates `d(rho Y_i)/dt` [kg/(m³·s)], one field per species.
    fn species_source_terms(
        &self,
        cv: &ConservedState,
        temperature: &Field,
    ) -> FluidResult<Vec<Field>>;

    /// One Newton update `ΔT` of the energy → temperature inversion evaluated
    /// at `temperature`. Zero at a converged temperature.
    fn temperature_update_residual(
        &self,
        energy: &Field,
        temperature: &Field,
        mass_fractions: &[Field],
    ) -> FluidResult<Field>;
}
