//! rf-ops: spatial operators for reactflow.
//!
//! Provides:
//! - [`SpatialOperator`] trait: rate of change, stable timestep, local CFL
//! - [`InviscidOperator`]: Euler fluxes with the Rusanov interface flux
//! - [`ViscousOperator`]: adds viscous stress, conduction and species diffusion
//! - Boundary conditions (periodic, slip/no-slip walls)
//! - Halo exchange of one node plane across partition boundaries

pub mod boundaries;
pub mod flux;
pub mod halo;
pub mod inviscid;
pub mod operator;
pub mod pack;
pub mod viscous;

// Re-exports for ergonomics
pub use boundaries::{Boundaries, WallThermal};
pub use halo::{XHalo, exchange_x};
pub use inviscid::InviscidOperator;
pub use operator::SpatialOperator;
pub use viscous::ViscousOperator;
