//! rf-fluids: gas state and thermochemistry for reactflow.
//!
//! Provides:
//! - Conserved state (mass, momentum, energy, partial densities)
//! - `Thermochemistry` trait: temperature recovery, pressure, species sources
//! - Single ideal gas and multi-species ideal mixture equations of state
//! - One-step Arrhenius mechanism
//! - Constant-coefficient transport
//! - Uniform and premixed initializers
//!
//! # Architecture
//!
//! The step controller only talks to [`GasModel`] and the
//! [`Thermochemistry`] trait. A detailed-chemistry backend would implement
//! the same trait.

pub mod conserved;
pub mod error;
pub mod fluid_state;
pub mod ideal;
pub mod initializers;
pub mod mechanism;
pub mod mixture;
pub mod species;
pub mod thermochemistry;
pub mod transport;

// Re-exports for ergonomics
pub use conserved::ConservedState;
pub use error::{FluidError, FluidResult};
pub use fluid_state::{DerivedFluidState, GasModel};
pub use ideal::IdealSingleGas;
pub use initializers::{InitialCondition, Initializer, MixtureInitializer, Uniform};
pub use mechanism::{Mechanism, StoichTerm};
pub use mixture::{DEFAULT_NEWTON_ITERATIONS, MixtureGas};
pub use species::SpeciesData;
pub use thermochemistry::Thermochemistry;
pub use transport::{SimpleTransport, TransportFields};
