//! In-process multi-worker communicator (one OS thread per rank).

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Barrier, Mutex};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use rf_core::{RfError, RfResult};

use crate::communicator::{Communicator, ReduceOp, Tag};

/// How long `recv` waits before declaring the peer lost.
const RECV_TIMEOUT: Duration = Duration::from_secs(120);

struct Envelope {
    src: usize,
    tag: Tag,
    data: Vec<f64>,
}

struct Shared {
    barrier: Barrier,
    slots: Mutex<Vec<f64>>,
}

/// One rank's endpoint of a [`thread_cluster`].
pub struct ThreadComm {
    rank: usize,
    size: usize,
    shared: Arc<Shared>,
    outboxes: Vec<Sender<Envelope>>,
    inbox: Receiver<Envelope>,
    pending: RefCell<HashMap<(usize, Tag), VecDeque<Vec<f64>>>>,
}

/// Build `size` connected endpoints. Move each one into its own thread.
pub fn thread_cluster(size: usize) -> RfResult<Vec<ThreadComm>> {
    if size == 0 {
        return Err(RfError::InvalidArg {
            what: "cluster size must be positive",
        });
    }

    let shared = Arc::new(Shared {
        barrier: Barrier::new(size),
        slots: Mutex::new(vec![0.0; size]),
    });

    let (senders, receivers): (Vec<_>, Vec<_>) = (0..size).map(|_| unbounded()).unzip();

    Ok(receivers
        .into_iter()
        .enumerate()
        .map(|(rank, inbox)| ThreadComm {
            rank,
            size,
            shared: Arc::clone(&shared),
            outboxes: senders.clone(),
            inbox,
            pending: RefCell::new(HashMap::new()),
        })
        .collect())
}

impl ThreadComm {
    fn check_rank(&self, rank: usize, what: &'static str) -> RfResult<()> {
        if rank >= self.size {
            return Err(RfError::IndexOob {
                what,
                index: rank,
                len: self.size,
            });
        }
        Ok(())
    }

    fn poisoned() -> RfError {
        RfError::Comm {
            message: "reduction slot table poisoned by a panicked worker".to_string(),
        }
    }
}

impl Communicator for ThreadComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn all_reduce(&self, value: f64, op: ReduceOp) -> RfResult<f64> {
        {
            let mut slots = self.shared.slots.lock().map_err(|_| Self::poisoned())?;
            slots[self.rank] = value;
        }
        self.shared.barrier.wait();

        // Combine in rank order so every rank computes a bit-identical result.
        let result = {
            let slots = self.shared.slots.lock().map_err(|_| Self::poisoned())?;
            slots
                .iter()
                .skip(1)
                .fold(slots[0], |acc, &v| op.combine(acc, v))
        };

        // Nobody may overwrite a slot until every rank has read the table.
        self.shared.barrier.wait();
        Ok(result)
    }

    fn barrier(&self) -> RfResult<()> {
        self.shared.barrier.wait();
        Ok(())
    }

    fn send(&self, dest: usize, tag: Tag, data: Vec<f64>) -> RfResult<()> {
        self.check_rank(dest, "destination rank")?;
        self.outboxes[dest]
            .send(Envelope {
                src: self.rank,
                tag,
                data,
            })
            .map_err(|_| RfError::Comm {
                message: format!("rank {dest} has hung up"),
            })
    }

    fn recv(&self, src: usize, tag: Tag) -> RfResult<Vec<f64>> {
        self.check_rank(src, "source rank")?;

        if let Some(data) = self
            .pending
            .borrow_mut()
            .get_mut(&(src, tag))
            .and_then(VecDeque::pop_front)
        {
            return Ok(data);
        }

        loop {
            let envelope = self.inbox.recv_timeout(RECV_TIMEOUT).map_err(|e| {
                let message = match e {
                    RecvTimeoutError::Timeout => {
                        format!("rank {} timed out waiting for rank {src} (tag {tag})", self.rank)
                    }
                    RecvTimeoutError::Disconnected => "all peers have hung up".to_string(),
                };
                RfError::Comm { message }
            })?;

            if envelope.src == src && envelope.tag == tag {
                return Ok(envelope.data);
            }

            tracing::trace!(
                rank = self.rank,
                from = envelope.src,
                tag = envelope.tag,
                "stashing out-of-order message"
            );
            self.pending
                .borrow_mut()
                .entry((envelope.src, envelope.tag))
                .or_default()
                .push_back(envelope.data);
        }
    }
}
