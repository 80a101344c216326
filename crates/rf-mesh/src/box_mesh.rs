//! Axis-aligned box meshes.

use serde::{Deserialize, Serialize};

use crate::error::{MeshError, MeshResult};

/// Uniform box mesh of `nelements[d]` elements along each axis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoxMesh {
    pub dim: usize,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    pub nelements: Vec<usize>,
}

impl BoxMesh {
    pub fn global_nelements(&self) -> usize {
        self.nelements.iter().product()
    }

    /// Element edge length along `axis`.
    pub fn element_size(&self, axis: usize) -> f64 {
        (self.upper[axis] - self.lower[axis]) / self.nelements[axis] as f64
    }
}

/// Build and validate a box mesh.
pub fn generate_box_mesh(
    dim: usize,
    lower: &[f64],
    upper: &[f64],
    nelements: &[usize],
) -> MeshResult<BoxMesh> {
    if !(1..=3).contains(&dim) {
        return Err(MeshError::InvalidDimension { dim });
    }
    for (what, len) in [
        ("lower bounds", lower.len()),
        ("upper bounds", upper.len()),
        ("element counts", nelements.len()),
    ] {
        if len != dim {
            return Err(MeshError::AxisCount {
                what,
                expected: dim,
                found: len,
            });
        }
    }
    for axis in 0..dim {
        let (a, b) = (lower[axis], upper[axis]);
        if !(a.is_finite() && b.is_finite() && b > a) {
            return Err(MeshError::InvalidBounds { axis });
        }
        if nelements[axis] == 0 {
            return Err(MeshError::EmptyAxis { axis });
        }
    }
    Ok(BoxMesh {
        dim,
        lower: lower.to_vec(),
        upper: upper.to_vec(),
        nelements: nelements.to_vec(),
    })
}
