//! Slab partitioning along the first axis.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::box_mesh::BoxMesh;
use crate::error::{MeshError, MeshResult};

/// The part of a [`BoxMesh`] owned by one worker.
///
/// Owns the x-element range `x_start..x_end`; every other axis is owned in
/// full.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocalMesh {
    pub global: BoxMesh,
    pub rank: usize,
    pub num_parts: usize,
    pub x_start: usize,
    pub x_end: usize,
}

impl LocalMesh {
    pub fn dim(&self) -> usize {
        self.global.dim
    }

    /// Element counts per axis on this partition.
    pub fn local_shape(&self) -> Vec<usize> {
        let mut shape = self.global.nelements.clone();
        shape[0] = self.x_end - self.x_start;
        shape
    }

    pub fn local_nelements(&self) -> usize {
        self.local_shape().iter().product()
    }

    /// Lower coordinate of the partition along x.
    pub fn x_lower(&self) -> f64 {
        self.global.lower[0] + self.x_start as f64 * self.global.element_size(0)
    }

    /// Ranks owning the slabs to the left and right, if any.
    ///
    /// With `periodic` the first and last slab are neighbours.
    pub fn neighbors(&self, periodic: bool) -> (Option<usize>, Option<usize>) {
        let n = self.num_parts;
        let left = if self.rank > 0 {
            Some(self.rank - 1)
        } else if periodic {
            Some(n - 1)
        } else {
            None
        };
        let right = if self.rank + 1 < n {
            Some(self.rank + 1)
        } else if periodic {
            Some(0)
        } else {
            None
        };
        (left, right)
    }
}

/// Split `mesh` into `num_parts` slabs and return the one owned by `rank`.
///
/// The first `nx % num_parts` slabs get one extra element column.
pub fn partition(mesh: &BoxMesh, num_parts: usize, rank: usize) -> MeshResult<LocalMesh> {
    let nx = mesh.nelements[0];
    if num_parts == 0 || num_parts > nx {
        return Err(MeshError::TooManyParts {
            parts: num_parts,
            slabs: nx,
        });
    }
    if rank >= num_parts {
        return Err(MeshError::InvalidRank {
            rank,
            parts: num_parts,
        });
    }

    let base = nx / num_parts;
    let extra = nx % num_parts;
    let x_start = rank * base + rank.min(extra);
    let x_end = x_start + base + usize::from(rank < extra);
    debug!(rank, num_parts, x_start, x_end, "partitioned box mesh");

    Ok(LocalMesh {
        global: mesh.clone(),
        rank,
        num_parts,
        x_start,
        x_end,
    })
}
