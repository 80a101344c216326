//! rf-comm: worker ranks and collective operations.
//!
//! Every worker owns one mesh partition and talks to the others only through
//! a [`Communicator`]. Reductions are blocking collectives: every rank must
//! call them in the same order, and every rank receives the same result.
//!
//! Provides:
//! - [`SerialComm`] for single-worker runs
//! - [`ThreadComm`] endpoints from [`thread_cluster`] for in-process
//!   multi-worker runs (one OS thread per rank)

pub mod communicator;
pub mod serial;
pub mod threaded;

pub use communicator::{Communicator, ReduceOp, Tag};
pub use serial::SerialComm;
pub use threaded::{ThreadComm, thread_cluster};
