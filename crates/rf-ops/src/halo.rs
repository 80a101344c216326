//! Exchange of the outermost x node planes between neighbouring partitions.

use rf_comm::{Communicator, Tag};
use rf_core::{RfError, RfResult};
use rf_mesh::Discretization;
use tracing::trace;

/// Plane sent to the left neighbour (our first plane).
pub const TAG_LEFTWARD: Tag = 0x4c00;
/// Plane sent to the right neighbour (our last plane).
pub const TAG_RIGHTWARD: Tag = 0x5200;

/// Neighbour planes adjacent to the local slab, packed like the local nodes.
///
/// `None` on a side means the slab touches a wall there.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct XHalo {
    pub left: Option<Vec<f64>>,
    pub right: Option<Vec<f64>>,
}

fn extract_plane(discr: &Discretization, packed: &[f64], stride: usize, i: usize) -> Vec<f64> {
    let nodes = discr.plane_nodes(i);
    let mut plane = Vec::with_capacity(nodes.len() * stride);
    for node in nodes {
        plane.extend_from_slice(&packed[node * stride..(node + 1) * stride]);
    }
    plane
}

/// Exchange halo planes along x.
///
/// Every rank must call this the same number of times with the same
/// periodicity; sends never block, so the send-then-receive order cannot
/// deadlock.
pub fn exchange_x(
    discr: &Discretization,
    packed: &[f64],
    stride: usize,
    periodic: bool,
    comm: &dyn Communicator,
) -> RfResult<XHalo> {
    let nx = discr.node_shape()[0];
    let first = extract_plane(discr, packed, stride, 0);
    let last = extract_plane(discr, packed, stride, nx - 1);

    if discr.num_parts() == 1 {
        return Ok(if periodic {
            XHalo {
                left: Some(last),
                right: Some(first),
            }
        } else {
            XHalo::default()
        });
    }

    let expected = first.len();
    let (left, right) = discr.mesh().neighbors(periodic);
    if let Some(l) = left {
        comm.send(l, TAG_LEFTWARD, first)?;
    }
    if let Some(r) = right {
        comm.send(r, TAG_RIGHTWARD, last)?;
    }

    let receive = |src: usize, tag: Tag| -> RfResult<Vec<f64>> {
        let plane = comm.recv(src, tag)?;
        if plane.len() != expected {
            return Err(RfError::ShapeMismatch {
                what: "halo plane",
                expected,
                found: plane.len(),
            });
        }
        Ok(plane)
    };
    let halo = XHalo {
        left: left.map(|l| receive(l, TAG_RIGHTWARD)).transpose()?,
        right: right.map(|r| receive(r, TAG_LEFTWARD)).transpose()?,
    };
    trace!(
        rank = discr.rank(),
        left = ?left,
        right = ?right,
        "halo exchange complete"
    );
    Ok(halo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rf_comm::{SerialComm, thread_cluster};
    use rf_mesh::{generate_box_mesh, partition};

    fn discr(parts: usize, rank: usize) -> Discretization {
        let mesh = generate_box_mesh(2, &[0.0, 0.0], &[1.0, 1.0], &[4, 2]).unwrap();
        Discretization::new(partition(&mesh, parts, rank).unwrap(), 0).unwrap()
    }

    /// One value per node: its global x index.
    fn packed_x(d: &Discretization) -> Vec<f64> {
        let x0 = d.mesh().x_start;
        (0..d.n_nodes())
            .map(|n| (x0 + d.grid_index(n)[0]) as f64)
            .collect()
    }

    #[test]
    fn serial_periodic_wraps_locally() {
        let d = discr(1, 0);
        let halo = exchange_x(&d, &packed_x(&d), 1, true, &SerialComm::new()).unwrap();
        assert_eq!(halo.left, Some(vec![3.0, 3.0]));
        assert_eq!(halo.right, Some(vec![0.0, 0.0]));

        let walls = exchange_x(&d, &packed_x(&d), 1, false, &SerialComm::new()).unwrap();
        assert_eq!(walls, XHalo::default());
    }

    #[test]
    fn two_ranks_swap_planes() {
        let comms = thread_cluster(2).unwrap();
        let halos: Vec<XHalo> = std::thread::scope(|s| {
            let handles: Vec<_> = comms
                .into_iter()
                .map(|comm| {
                    s.spawn(move || {
                        let d = discr(2, comm.rank());
                        exchange_x(&d, &packed_x(&d), 1, true, &comm).unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        // rank 0 owns x = 0, 1; rank 1 owns x = 2, 3
        assert_eq!(halos[0].left, Some(vec![3.0, 3.0]));
        assert_eq!(halos[0].right, Some(vec![2.0, 2.0]));
        assert_eq!(halos[1].left, Some(vec![1.0, 1.0]));
        assert_eq!(halos[1].right, Some(vec![0.0, 0.0]));
    }
}
