use thiserror::Error;

pub type RfResult<T> = Result<T, RfError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RfError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Index out of bounds: {what} (index={index}, len={len})")]
    IndexOob {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Shape mismatch for {what}: expected {expected}, found {found}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Communication failure: {message}")]
    Comm { message: String },

    #[error("Invariant violated: {what}")]
    Invariant { what: &'static str },
}
