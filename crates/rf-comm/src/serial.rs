//! Single-worker communicator.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use rf_core::{RfError, RfResult};

use crate::communicator::{Communicator, ReduceOp, Tag};

/// Communicator for a run with exactly one worker.
///
/// Reductions are the identity; messages sent to rank 0 (self) are queued
/// and handed back by `recv`, which is what a periodic halo exchange on a
/// single partition needs.
#[derive(Debug, Default)]
pub struct SerialComm {
    mailbox: RefCell<HashMap<Tag, VecDeque<Vec<f64>>>>,
}

impl SerialComm {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Communicator for SerialComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn all_reduce(&self, value: f64, _op: ReduceOp) -> RfResult<f64> {
        Ok(value)
    }

    fn barrier(&self) -> RfResult<()> {
        Ok(())
    }

    fn send(&self, dest: usize, tag: Tag, data: Vec<f64>) -> RfResult<()> {
        if dest != 0 {
            return Err(RfError::IndexOob {
                what: "destination rank",
                index: dest,
                len: 1,
            });
        }
        self.mailbox
            .borrow_mut()
            .entry(tag)
            .or_default()
            .push_back(data);
        Ok(())
    }

    fn recv(&self, src: usize, tag: Tag) -> RfResult<Vec<f64>> {
        if src != 0 {
            return Err(RfError::IndexOob {
                what: "source rank",
                index: src,
                len: 1,
            });
        }
        self.mailbox
            .borrow_mut()
            .get_mut(&tag)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| RfError::Comm {
                message: format!("no pending message with tag {tag} on a serial communicator"),
            })
    }
}
