//! Interpolation between two discretizations of the same partition.

use rf_core::Field;

use crate::discretization::Discretization;
use crate::error::{MeshError, MeshResult};

/// Tensor-product Lagrange interpolation from one order to another on the
/// same local mesh.
#[derive(Clone, Debug)]
pub struct SameMeshConnection {
    from: Discretization,
    to: Discretization,
    /// `weights[a][b]`: value of source basis `b` at target node `a`.
    weights: Vec<Vec<f64>>,
}

fn reference_nodes(order: usize) -> Vec<f64> {
    let n = order + 1;
    (0..n).map(|k| (k as f64 + 0.5) / n as f64).collect()
}

fn lagrange_weights(from_order: usize, to_order: usize) -> Vec<Vec<f64>> {
    let src = reference_nodes(from_order);
    reference_nodes(to_order)
        .into_iter()
        .map(|r| {
            (0..src.len())
                .map(|b| {
                    src.iter()
                        .enumerate()
                        .filter(|&(m, _)| m != b)
                        .map(|(_, &sm)| (r - sm) / (src[b] - sm))
                        .product::<f64>()
                })
                .collect()
        })
        .collect()
}

impl SameMeshConnection {
    pub fn new(from: &Discretization, to: &Discretization) -> MeshResult<Self> {
        if from.mesh() != to.mesh() {
            return Err(MeshError::MeshMismatch);
        }
        Ok(Self {
            weights: lagrange_weights(from.order(), to.order()),
            from: from.clone(),
            to: to.clone(),
        })
    }

    pub fn from_order(&self) -> usize {
        self.from.order()
    }

    pub fn to_order(&self) -> usize {
        self.to.order()
    }

    /// Interpolate a field from the source nodes onto the target nodes.
    pub fn apply(&self, field: &Field) -> MeshResult<Field> {
        self.from.check_field(field)?;
        let dim = self.to.dim();
        let p1 = self.from.nodes_per_element_axis();
        let q1 = self.to.nodes_per_element_axis();
        let stencil = p1.pow(dim as u32);

        Ok(Field::from_fn(self.to.n_nodes(), |node| {
            let t = self.to.grid_index(node);
            let mut elem = [0; 3];
            let mut local = [0; 3];
            for axis in 0..dim {
                elem[axis] = t[axis] / q1;
                local[axis] = t[axis] % q1;
            }

            let mut acc = 0.0;
            for s in 0..stencil {
                let mut src = [0; 3];
                let mut w = 1.0;
                let mut rest = s;
                for axis in 0..dim {
                    let b = rest % p1;
                    rest /= p1;
                    w *= self.weights[local[axis]][b];
                    src[axis] = elem[axis] * p1 + b;
                }
                acc += w * field[self.from.node_index(src[0], src[1], src[2])];
            }
            acc
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::box_mesh::generate_box_mesh;
    use crate::partition::partition;

    fn pair(dim: usize, p: usize, q: usize) -> (Discretization, Discretization) {
        let mesh = generate_box_mesh(dim, &vec![0.0; dim], &vec![1.0; dim], &vec![3; dim]).unwrap();
        let local = partition(&mesh, 1, 0).unwrap();
        (
            Discretization::new(local.clone(), p).unwrap(),
            Discretization::new(local, q).unwrap(),
        )
    }

    #[test]
    fn same_order_is_identity() {
        let (a, b) = pair(2, 2, 2);
        let conn = SameMeshConnection::new(&a, &b).unwrap();
        let f = Field::from_fn(a.n_nodes(), |i| (i as f64).sin());
        assert_eq!(conn.apply(&f).unwrap(), f);
    }

    #[test]
    fn preserves_constants_and_linears() {
        let (a, b) = pair(2, 1, 3);
        let conn = SameMeshConnection::new(&a, &b).unwrap();
        let g = conn.apply(&Field::filled(a.n_nodes(), 4.5)).unwrap();
        assert_eq!(g.len(), b.n_nodes());
        assert!(g.iter().all(|&v| (v - 4.5).abs() < 1e-12));

        let xa = &a.node_coordinates()[0];
        let xb = &b.node_coordinates()[0];
        let lin = conn.apply(&xa.map(|x| 2.0 * x + 1.0)).unwrap();
        for i in 0..b.n_nodes() {
            assert!((lin[i] - (2.0 * xb[i] + 1.0)).abs() < 1e-12);
        }
    }

    #[test]
    fn rejects_foreign_partition_and_bad_length() {
        let (a, _) = pair(1, 1, 1);
        let (c, _) = pair(2, 1, 1);
        assert_eq!(
            SameMeshConnection::new(&a, &c).unwrap_err(),
            MeshError::MeshMismatch
        );
        let conn = SameMeshConnection::new(&a, &a).unwrap();
        assert!(conn.apply(&Field::zeros(1)).is_err());
    }
}
