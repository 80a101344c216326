//! Fluid property errors.

use rf_core::RfError;
use thiserror::Error;

/// Result type for fluid operations.
pub type FluidResult<T> = Result<T, FluidError>;

/// Errors that can occur during fluid property calculations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FluidError {
    /// Non-physical values (negative density, pressure, etc.).
    #[error("Non-physical value for {what}")]
    NonPhysical { what: &'static str },

    /// Invalid argument.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Field shapes do not agree (node count, species count, dimension).
    #[error("Shape mismatch for {what}: expected {expected}, found {found}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    /// Unknown species name.
    #[error("Unknown species: {name}")]
    UnknownSpecies { name: String },

    /// Error bubbled up from the field layer.
    #[error("Field error: {0}")]
    Field(#[from] RfError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = FluidError::NonPhysical { what: "density" };
        assert!(err.to_string().contains("density"));

        let err = FluidError::UnknownSpecies {
            name: "XE".into(),
        };
        assert!(err.to_string().contains("XE"));
    }

    #[test]
    fn field_error_converts() {
        let err: FluidError = RfError::InvalidArg { what: "x" }.into();
        assert!(matches!(err, FluidError::Field(_)));
    }
}
