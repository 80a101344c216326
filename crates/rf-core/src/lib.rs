//! rf-core: stable foundation for reactflow.
//!
//! Contains:
//! - field (per-node scalar data owned by one worker partition)
//! - numeric (Real and positivity checks)
//! - units (uom pressure/temperature + physical constants)
//! - timing (phase timers used by the profiling mode)
//! - error (shared error types)

pub mod error;
pub mod field;
pub mod numeric;
pub mod timing;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{RfError, RfResult};
pub use field::Field;
pub use numeric::*;
pub use units::*;
