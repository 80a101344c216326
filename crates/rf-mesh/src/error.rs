//! Mesh-specific error types.

use rf_core::RfError;

pub type MeshResult<T> = Result<T, MeshError>;

/// Mesh construction, partitioning and discretization errors.
#[derive(Debug, Clone, PartialEq)]
pub enum MeshError {
    /// Dimension outside 1..=3.
    InvalidDimension { dim: usize },

    /// Per-axis input has the wrong number of entries.
    AxisCount {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    /// Box bounds are degenerate or non-finite on an axis.
    InvalidBounds { axis: usize },

    /// Polynomial order above the supported maximum.
    InvalidOrder { order: usize, max: usize },

    /// An axis has zero elements.
    EmptyAxis { axis: usize },

    /// Fewer slabs along x than workers.
    TooManyParts { parts: usize, slabs: usize },

    /// Rank outside `0..parts`.
    InvalidRank { rank: usize, parts: usize },

    /// Two discretizations do not share a partition.
    MeshMismatch,

    /// Field length does not match the discretization.
    FieldLength { expected: usize, found: usize },
}

impl std::fmt::Display for MeshError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeshError::InvalidDimension { dim } => {
                write!(f, "Mesh dimension {} not supported (expected 1 to 3)", dim)
            }
            MeshError::AxisCount {
                what,
                expected,
                found,
            } => {
                write!(f, "{} has {} entries (expected {})", what, found, expected)
            }
            MeshError::InvalidBounds { axis } => {
                write!(f, "Box bounds on axis {} are empty or non-finite", axis)
            }
            MeshError::InvalidOrder { order, max } => {
                write!(f, "Order {} not supported (maximum {})", order, max)
            }
            MeshError::EmptyAxis { axis } => {
                write!(f, "Axis {} has no elements", axis)
            }
            MeshError::TooManyParts { parts, slabs } => {
                write!(
                    f,
                    "Cannot split {} element slabs among {} workers",
                    slabs, parts
                )
            }
            MeshError::InvalidRank { rank, parts } => {
                write!(f, "Rank {} out of range for {} parts", rank, parts)
            }
            MeshError::MeshMismatch => {
                write!(f, "Discretizations live on different partitions")
            }
            MeshError::FieldLength { expected, found } => {
                write!(
                    f,
                    "Field has {} nodes but the discretization has {}",
                    found, expected
                )
            }
        }
    }
}

impl std::error::Error for MeshError {}

impl From<MeshError> for RfError {
    fn from(err: MeshError) -> Self {
        match err {
            MeshError::FieldLength { expected, found } => RfError::ShapeMismatch {
                what: "field length",
                expected,
                found,
            },
            _ => RfError::InvalidArg { what: "mesh" },
        }
    }
}
