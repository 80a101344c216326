//! rf-mesh: mesh layer for reactflow.
//!
//! Provides:
//! - Axis-aligned box meshes in one to three dimensions
//! - Slab partitioning along the first axis, one slab per worker
//! - Nodal discretization of a given polynomial order
//! - Same-mesh connection between two orders on one partition
//!
//! # Example
//!
//! ```
//! use rf_mesh::{generate_box_mesh, partition, Discretization};
//!
//! let mesh = generate_box_mesh(2, &[0.0, 0.0], &[1.0, 0.5], &[8, 4]).unwrap();
//! let local = partition(&mesh, 2, 0).unwrap();
//! let discr = Discretization::new(local, 1).unwrap();
//!
//! assert_eq!(discr.local_nelements(), 16);
//! assert_eq!(discr.n_nodes(), 64);
//! ```

pub mod box_mesh;
pub mod connection;
pub mod discretization;
pub mod error;
pub mod partition;

// Re-exports for ergonomics
pub use box_mesh::{BoxMesh, generate_box_mesh};
pub use connection::SameMeshConnection;
pub use discretization::Discretization;
pub use error::{MeshError, MeshResult};
pub use partition::{LocalMesh, partition};
