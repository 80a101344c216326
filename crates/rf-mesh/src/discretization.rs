//! Nodal discretization of a local mesh.

use rf_core::Field;

use crate::error::{MeshError, MeshResult};
use crate::partition::LocalMesh;

/// Largest supported polynomial order.
pub const MAX_ORDER: usize = 8;

/// `order + 1` nodes per element along each axis, at cell-centred reference
/// positions `(k + 0.5) / (order + 1)`.
///
/// Nodes of neighbouring elements therefore form one uniform grid per axis,
/// numbered `i + nx * (j + ny * k)` on the local partition.
#[derive(Clone, Debug, PartialEq)]
pub struct Discretization {
    mesh: LocalMesh,
    order: usize,
}

impl Discretization {
    pub fn new(mesh: LocalMesh, order: usize) -> MeshResult<Self> {
        if order > MAX_ORDER {
            return Err(MeshError::InvalidOrder {
                order,
                max: MAX_ORDER,
            });
        }
        Ok(Self { mesh, order })
    }

    pub fn mesh(&self) -> &LocalMesh {
        &self.mesh
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn dim(&self) -> usize {
        self.mesh.dim()
    }

    pub fn rank(&self) -> usize {
        self.mesh.rank
    }

    pub fn num_parts(&self) -> usize {
        self.mesh.num_parts
    }

    pub fn global_nelements(&self) -> usize {
        self.mesh.global.global_nelements()
    }

    pub fn local_nelements(&self) -> usize {
        self.mesh.local_nelements()
    }

    pub fn nodes_per_element_axis(&self) -> usize {
        self.order + 1
    }

    /// Local node counts `[nx, ny, nz]`; absent axes have one node.
    pub fn node_shape(&self) -> [usize; 3] {
        let mut shape = [1; 3];
        for (axis, n) in self.mesh.local_shape().into_iter().enumerate() {
            shape[axis] = n * (self.order + 1);
        }
        shape
    }

    pub fn n_nodes(&self) -> usize {
        self.node_shape().iter().product()
    }

    /// Node spacing along `axis`.
    pub fn spacing(&self, axis: usize) -> f64 {
        self.mesh.global.element_size(axis) / (self.order + 1) as f64
    }

    pub fn min_spacing(&self) -> f64 {
        (0..self.dim())
            .map(|a| self.spacing(a))
            .fold(f64::INFINITY, f64::min)
    }

    pub fn node_index(&self, i: usize, j: usize, k: usize) -> usize {
        let [nx, ny, _] = self.node_shape();
        i + nx * (j + ny * k)
    }

    pub fn grid_index(&self, node: usize) -> [usize; 3] {
        let [nx, ny, _] = self.node_shape();
        [node % nx, (node / nx) % ny, node / (nx * ny)]
    }

    /// Node indices of the x-plane `i`, in `(j, k)` order.
    pub fn plane_nodes(&self, i: usize) -> Vec<usize> {
        let [_, ny, nz] = self.node_shape();
        let mut nodes = Vec::with_capacity(ny * nz);
        for k in 0..nz {
            for j in 0..ny {
                nodes.push(self.node_index(i, j, k));
            }
        }
        nodes
    }

    /// Coordinates of every local node, one field per axis.
    pub fn node_coordinates(&self) -> Vec<Field> {
        let n = self.n_nodes();
        (0..self.dim())
            .map(|axis| {
                let lower = if axis == 0 {
                    self.mesh.x_lower()
                } else {
                    self.mesh.global.lower[axis]
                };
                let h = self.spacing(axis);
                Field::from_fn(n, |node| {
                    lower + (self.grid_index(node)[axis] as f64 + 0.5) * h
                })
            })
            .collect()
    }

    pub fn check_field(&self, field: &Field) -> MeshResult<()> {
        if field.len() != self.n_nodes() {
            return Err(MeshError::FieldLength {
                expected: self.n_nodes(),
                found: field.len(),
            });
        }
        Ok(())
    }
}
