//! Communication context for one run of the ring.
//!
//! [`init`] acquires one [`Communicator`] per participant. Every pair of
//! participants is joined by a zero-capacity link in each direction, so a
//! send only completes when the matching receive is taken. Dropping a
//! communicator releases it; the [`WorldHandle`] counts releases so a run can
//! verify that every participant let go exactly once.

use crossbeam::channel::{self, Receiver, Select, Sender};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

use crate::error::{RingError, RingResult};
use crate::topology::Rank;

/// Launcher-side view of a world after its communicators have been handed out.
#[derive(Debug, Clone)]
pub struct WorldHandle {
    size: usize,
    finalized: Arc<AtomicUsize>,
}

impl WorldHandle {
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of communicators released so far.
    pub fn finalized(&self) -> usize {
        self.finalized.load(Ordering::Acquire)
    }
}

/// One participant's endpoint into the world.
pub struct Communicator<T> {
    rank: Rank,
    size: usize,
    // Indexed by destination rank
    outbound: Vec<Sender<T>>,
    // Indexed by source rank
    inbound: Vec<Receiver<T>>,
    finalized: Arc<AtomicUsize>,
}

/// Acquire a world of `size` participants.
pub fn init<T: Send>(size: usize) -> (Vec<Communicator<T>>, WorldHandle) {
    let mut outbound: Vec<Vec<Sender<T>>> = (0..size).map(|_| Vec::with_capacity(size)).collect();
    let mut inbound: Vec<Vec<Receiver<T>>> = (0..size).map(|_| Vec::with_capacity(size)).collect();

    for src in 0..size {
        for dst in 0..size {
            let (tx, rx) = channel::bounded(0);
            outbound[src].push(tx);
            inbound[dst].push(rx);
        }
    }

    let finalized = Arc::new(AtomicUsize::new(0));
    let comms = outbound
        .into_iter()
        .zip(inbound)
        .enumerate()
        .map(|(rank, (outbound, inbound))| Communicator {
            rank,
            size,
            outbound,
            inbound,
            finalized: finalized.clone(),
        })
        .collect();

    debug!("Initialized world of {} participants", size);
    (comms, WorldHandle { size, finalized })
}

impl<T> Communicator<T> {
    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn closed(&self, peer: Rank) -> RingError {
        RingError::Transport {
            rank: self.rank,
            peer,
        }
    }

    /// Blocking send to `dest`; returns once `dest` has taken the value.
    pub fn send(&self, value: T, dest: Rank) -> RingResult<()> {
        self.outbound[dest]
            .send(value)
            .map_err(|_| self.closed(dest))
    }

    /// Blocking receive from `source`.
    pub fn recv(&self, source: Rank) -> RingResult<T> {
        self.inbound[source].recv().map_err(|_| self.closed(source))
    }

    /// Send `value` to `dest` and receive one value from `source` as a single
    /// operation.
    ///
    /// Both halves are offered at once and completed in whichever order the
    /// partners become ready, so a closed ring where everyone calls this
    /// cannot wait on itself. Exchanging with oneself returns `value`.
    pub fn sendrecv(&self, value: T, dest: Rank, source: Rank) -> RingResult<T> {
        if dest == self.rank && source == self.rank {
            return Ok(value);
        }

        let tx = &self.outbound[dest];
        let rx = &self.inbound[source];

        let mut sel = Select::new();
        let send_op = sel.send(tx);
        let recv_op = sel.recv(rx);
        let oper = sel.select();

        if oper.index() == send_op {
            oper.send(tx, value).map_err(|_| self.closed(dest))?;
            rx.recv().map_err(|_| self.closed(source))
        } else {
            debug_assert_eq!(oper.index(), recv_op);
            let received = oper.recv(rx).map_err(|_| self.closed(source))?;
            tx.send(value).map_err(|_| self.closed(dest))?;
            Ok(received)
        }
    }
}

impl<T> Drop for Communicator<T> {
    fn drop(&mut self) {
        self.finalized.fetch_add(1, Ordering::AcqRel);
        debug!("Process {} released its communicator", self.rank);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_utils::thread;

    #[test]
    fn test_init_assigns_ranks() {
        let (comms, world) = init::<i32>(4);
        assert_eq!(world.size(), 4);
        for (i, comm) in comms.iter().enumerate() {
            assert_eq!(comm.rank(), i);
            assert_eq!(comm.size(), 4);
        }
        assert_eq!(world.finalized(), 0);
        drop(comms);
        assert_eq!(world.finalized(), 4);
    }

    #[test]
    fn test_point_to_point() {
        let (mut comms, _world) = init::<i32>(2);
        let b = comms.pop().unwrap();
        let a = comms.pop().unwrap();

        thread::scope(|s| {
            s.spawn(|_| a.send(42, 1).unwrap());
            assert_eq!(b.recv(0).unwrap(), 42);
        })
        .unwrap();
    }

    #[test]
    fn test_sendrecv_around_ring() {
        let size = 5;
        let (comms, world) = init::<i32>(size);

        let received = thread::scope(|s| {
            let handles: Vec<_> = comms
                .into_iter()
                .map(|comm| {
                    s.spawn(move |_| {
                        let rank = comm.rank();
                        let value = rank as i32 * 10;
                        comm.sendrecv(value, (rank + 1) % size, (rank + size - 1) % size)
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap().unwrap())
                .collect::<Vec<_>>()
        })
        .unwrap();

        assert_eq!(received, vec![40, 0, 10, 20, 30]);
        assert_eq!(world.finalized(), size);
    }

    #[test]
    fn test_sendrecv_with_self() {
        let (comms, _world) = init::<i32>(1);
        assert_eq!(comms[0].sendrecv(7, 0, 0).unwrap(), 7);
    }

    #[test]
    fn test_released_peer_reports_transport_error() {
        let (mut comms, _world) = init::<i32>(2);
        let b = comms.pop().unwrap();
        let a = comms.pop().unwrap();
        drop(b);

        assert_eq!(a.send(1, 1), Err(RingError::Transport { rank: 0, peer: 1 }));
        assert_eq!(a.recv(1), Err(RingError::Transport { rank: 0, peer: 1 }));
        assert_eq!(
            a.sendrecv(1, 1, 1),
            Err(RingError::Transport { rank: 0, peer: 1 })
        );
    }
}
