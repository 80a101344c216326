//! The collective-communication contract.

use rf_core::RfResult;

/// Message tag for point-to-point exchange.
pub type Tag = u32;

/// Reduction operator for [`Communicator::all_reduce`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReduceOp {
    Min,
    Max,
    Sum,
}

impl ReduceOp {
    /// Combine two partial results.
    ///
    /// `Min`/`Max` propagate NaN so that a poisoned value on one rank is
    /// visible on all of them.
    pub fn combine(self, a: f64, b: f64) -> f64 {
        if a.is_nan() || b.is_nan() {
            return match self {
                ReduceOp::Sum => a + b,
                _ => f64::NAN,
            };
        }
        match self {
            ReduceOp::Min => a.min(b),
            ReduceOp::Max => a.max(b),
            ReduceOp::Sum => a + b,
        }
    }
}

/// Cooperating set of workers, one per mesh partition.
pub trait Communicator: Send {
    /// Rank of this worker, `0..size()`.
    fn rank(&self) -> usize;

    /// Number of workers. Fixed for the whole run.
    fn size(&self) -> usize;

    /// Reduce one scalar per rank; every rank gets the same result.
    fn all_reduce(&self, value: f64, op: ReduceOp) -> RfResult<f64>;

    /// Logical OR across all ranks.
    fn all_reduce_or(&self, flag: bool) -> RfResult<bool> {
        let v = self.all_reduce(if flag { 1.0 } else { 0.0 }, ReduceOp::Max)?;
        Ok(v > 0.5)
    }

    /// Block until every rank has reached this point.
    fn barrier(&self) -> RfResult<()>;

    /// Send a buffer to `dest`. Never blocks on the receiver.
    fn send(&self, dest: usize, tag: Tag, data: Vec<f64>) -> RfResult<()>;

    /// Receive the next buffer sent by `src` with `tag`.
    fn recv(&self, src: usize, tag: Tag) -> RfResult<Vec<f64>>;

    fn is_root(&self) -> bool {
        self.rank() == 0
    }
}
