//! Per-node scalar field data.
//!
//! A `Field` holds one value per mesh node of the local partition. All
//! arithmetic is element-wise; binary operations require equal lengths.

use serde::{Deserialize, Serialize};

use crate::error::{RfError, RfResult};
use crate::numeric::Real;

/// Nodal scalar field owned by the local worker.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Field(Vec<Real>);

impl Field {
    pub fn zeros(n: usize) -> Self {
        Self(vec![0.0; n])
    }

    pub fn filled(n: usize, value: Real) -> Self {
        Self(vec![value; n])
    }

    pub fn from_vec(values: Vec<Real>) -> Self {
        Self(values)
    }

    pub fn from_fn(n: usize, f: impl FnMut(usize) -> Real) -> Self {
        Self((0..n).map(f).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Real] {
        &self.0
    }

    pub fn as_mut_slice(&mut self) -> &mut [Real] {
        &mut self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Real> {
        self.0.iter()
    }

    /// Zero field with the same length.
    pub fn zeros_like(&self) -> Self {
        Self::zeros(self.len())
    }

    pub fn map(&self, f: impl Fn(Real) -> Real) -> Self {
        Self(self.0.iter().map(|&v| f(v)).collect())
    }

    /// Element-wise combination of two equally sized fields.
    pub fn zip_map(&self, other: &Field, f: impl Fn(Real, Real) -> Real) -> RfResult<Self> {
        self.check_len(other)?;
        Ok(Self(
            self.0.iter().zip(&other.0).map(|(&a, &b)| f(a, b)).collect(),
        ))
    }

    pub fn add(&self, other: &Field) -> RfResult<Self> {
        self.zip_map(other, |a, b| a + b)
    }

    pub fn mul(&self, other: &Field) -> RfResult<Self> {
        self.zip_map(other, |a, b| a * b)
    }

    pub fn scale(&self, factor: Real) -> Self {
        self.map(|v| v * factor)
    }

    /// In-place `self += factor * other`.
    pub fn axpy(&mut self, factor: Real, other: &Field) -> RfResult<()> {
        self.check_len(other)?;
        for (a, &b) in self.0.iter_mut().zip(&other.0) {
            *a += factor * b;
        }
        Ok(())
    }

    /// Local minimum; `+inf` for an empty field, NaN if any node is NaN.
    pub fn min(&self) -> Real {
        self.0.iter().copied().fold(Real::INFINITY, |acc, v| {
            if acc.is_nan() || v.is_nan() {
                Real::NAN
            } else {
                acc.min(v)
            }
        })
    }

    /// Local maximum; `-inf` for an empty field, NaN if any node is NaN.
    pub fn max(&self) -> Real {
        self.0.iter().copied().fold(Real::NEG_INFINITY, |acc, v| {
            if acc.is_nan() || v.is_nan() {
                Real::NAN
            } else {
                acc.max(v)
            }
        })
    }

    pub fn sum(&self) -> Real {
        self.0.iter().sum()
    }

    /// True if any node holds NaN or an infinity.
    pub fn has_non_finite(&self) -> bool {
        self.0.iter().any(|v| !v.is_finite())
    }

    /// Index of the first non-finite node, if any.
    pub fn first_non_finite(&self) -> Option<usize> {
        self.0.iter().position(|v| !v.is_finite())
    }

    fn check_len(&self, other: &Field) -> RfResult<()> {
        if self.len() != other.len() {
            return Err(RfError::ShapeMismatch {
                what: "field length",
                expected: self.len(),
                found: other.len(),
            });
        }
        Ok(())
    }
}

impl From<Vec<Real>> for Field {
    fn from(values: Vec<Real>) -> Self {
        Self(values)
    }
}

impl std::ops::Index<usize> for Field {
    type Output = Real;

    fn index(&self, index: usize) -> &Real {
        &self.0[index]
    }
}

impl std::ops::IndexMut<usize> for Field {
    fn index_mut(&mut self, index: usize) -> &mut Real {
        &mut self.0[index]
    }
}
