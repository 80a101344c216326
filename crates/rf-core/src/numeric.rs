use crate::RfError;

/// Floating point type used for all field data.
pub type Real = f64;

/// `v` if it is finite and strictly positive.
pub fn ensure_positive(v: Real, what: &'static str) -> Result<Real, RfError> {
    if !v.is_finite() {
        return Err(RfError::NonFinite { what, value: v });
    }
    if v <= 0.0 {
        return Err(RfError::InvalidArg { what });
    }
    Ok(v)
}
