//! Rank transport abstraction.
//!
//! The sharded register talks to its peers through [`Transport`]: rank
//! discovery, the synchronous pairwise buffer exchange, and a scalar
//! all-reduce. Keeping this surface narrow lets the register be exercised
//! in-process over channels; a real fabric binds the same three calls.

use num_complex::Complex64;
use std::sync::mpsc::{Receiver, Sender, channel};

use alsvid_engine::{SimError, SimResult};

/// Rank-to-rank communication surface.
///
/// All calls are collective in program order: every rank issues the same
/// sequence of exchanges and reductions, and an exchange is a synchronous
/// rendezvous between the two partners.
pub trait Transport: Send {
    /// This rank's id in [0, world_size).
    fn rank(&self) -> usize;

    /// Number of ranks.
    fn world_size(&self) -> usize;

    /// Swap full buffers with `partner`: send `send`, fill `recv` with the
    /// partner's buffer. Both sides must call with mirrored arguments.
    fn exchange(
        &mut self,
        partner: usize,
        send: &[Complex64],
        recv: &mut [Complex64],
    ) -> SimResult<()>;

    /// Sum `value` across all ranks.
    ///
    /// The sum is accumulated in rank order on every rank, so all ranks
    /// observe a bit-identical result.
    fn allreduce_sum(&mut self, value: f64) -> SimResult<f64>;
}

enum Message {
    Buffer(Vec<Complex64>),
    Scalar(f64),
}

/// In-process transport endpoint over mpsc channels.
///
/// Produced by [`LocalCluster::connect`]; each rank owns one endpoint and
/// moves it into its worker thread.
pub struct ChannelTransport {
    rank: usize,
    world: usize,
    senders: Vec<Option<Sender<Message>>>,
    receivers: Vec<Option<Receiver<Message>>>,
}

impl ChannelTransport {
    fn fail(&self, partner: usize, reason: &str) -> SimError {
        SimError::DistributedTransport {
            partner,
            reason: reason.to_string(),
        }
    }

    fn send(&self, to: usize, message: Message) -> SimResult<()> {
        let sender = self
            .senders
            .get(to)
            .and_then(Option::as_ref)
            .ok_or_else(|| self.fail(to, "no channel to rank"))?;
        sender
            .send(message)
            .map_err(|_| self.fail(to, "peer hung up during send"))
    }

    fn recv(&self, from: usize) -> SimResult<Message> {
        let receiver = self
            .receivers
            .get(from)
            .and_then(Option::as_ref)
            .ok_or_else(|| self.fail(from, "no channel from rank"))?;
        receiver
            .recv()
            .map_err(|_| self.fail(from, "peer hung up during receive"))
    }
}

impl Transport for ChannelTransport {
    fn rank(&self) -> usize {
        self.rank
    }

    fn world_size(&self) -> usize {
        self.world
    }

    fn exchange(
        &mut self,
        partner: usize,
        send: &[Complex64],
        recv: &mut [Complex64],
    ) -> SimResult<()> {
        if partner == self.rank || partner >= self.world {
            return Err(self.fail(partner, "invalid exchange partner"));
        }
        // Channel sends don't block, so both partners post first and then
        // block on the receive: a rendezvous without deadlock.
        self.send(partner, Message::Buffer(send.to_vec()))?;
        match self.recv(partner)? {
            Message::Buffer(buffer) if buffer.len() == recv.len() => {
                recv.copy_from_slice(&buffer);
                Ok(())
            }
            Message::Buffer(buffer) => Err(self.fail(
                partner,
                &format!("buffer length mismatch: {} vs {}", buffer.len(), recv.len()),
            )),
            Message::Scalar(_) => Err(self.fail(partner, "scalar frame during buffer exchange")),
        }
    }

    fn allreduce_sum(&mut self, value: f64) -> SimResult<f64> {
        for to in 0..self.world {
            if to != self.rank {
                self.send(to, Message::Scalar(value))?;
            }
        }
        let mut total = 0.0;
        for from in 0..self.world {
            let contribution = if from == self.rank {
                value
            } else {
                match self.recv(from)? {
                    Message::Scalar(v) => v,
                    Message::Buffer(_) => {
                        return Err(self.fail(from, "buffer frame during all-reduce"));
                    }
                }
            };
            total += contribution;
        }
        Ok(total)
    }
}

/// Builder for a full in-process mesh of [`ChannelTransport`] endpoints.
pub struct LocalCluster;

impl LocalCluster {
    /// Create `world_size` connected endpoints, one per rank.
    pub fn connect(world_size: usize) -> SimResult<Vec<ChannelTransport>> {
        if world_size == 0 || !world_size.is_power_of_two() {
            return Err(SimError::InvalidArgument(format!(
                "world size must be a power of two, got {world_size}"
            )));
        }
        let mut endpoints: Vec<ChannelTransport> = (0..world_size)
            .map(|rank| ChannelTransport {
                rank,
                world: world_size,
                senders: (0..world_size).map(|_| None).collect(),
                receivers: (0..world_size).map(|_| None).collect(),
            })
            .collect();
        for from in 0..world_size {
            for to in 0..world_size {
                if from == to {
                    continue;
                }
                let (tx, rx) = channel();
                endpoints[from].senders[to] = Some(tx);
                endpoints[to].receivers[from] = Some(rx);
            }
        }
        Ok(endpoints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn cluster_requires_power_of_two() {
        assert!(LocalCluster::connect(3).is_err());
        assert!(LocalCluster::connect(0).is_err());
        assert!(LocalCluster::connect(4).is_ok());
    }

    #[test]
    fn exchange_swaps_buffers() {
        let mut endpoints = LocalCluster::connect(2).unwrap();
        let mut t1 = endpoints.pop().unwrap();
        let mut t0 = endpoints.pop().unwrap();

        let handle = thread::spawn(move || {
            let send = vec![Complex64::new(1.0, 0.0)];
            let mut recv = vec![Complex64::new(0.0, 0.0)];
            t1.exchange(0, &send, &mut recv).unwrap();
            recv[0]
        });

        let send = vec![Complex64::new(2.0, 0.0)];
        let mut recv = vec![Complex64::new(0.0, 0.0)];
        t0.exchange(1, &send, &mut recv).unwrap();

        assert_eq!(recv[0], Complex64::new(1.0, 0.0));
        assert_eq!(handle.join().unwrap(), Complex64::new(2.0, 0.0));
    }

    #[test]
    fn allreduce_is_rank_ordered_and_complete() {
        let endpoints = LocalCluster::connect(4).unwrap();
        let handles: Vec<_> = endpoints
            .into_iter()
            .map(|mut t| {
                thread::spawn(move || t.allreduce_sum((t.rank() + 1) as f64).unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 10.0);
        }
    }

    #[test]
    fn hung_up_peer_is_a_transport_error() {
        let mut endpoints = LocalCluster::connect(2).unwrap();
        let t1 = endpoints.pop().unwrap();
        let mut t0 = endpoints.pop().unwrap();
        drop(t1);

        let send = vec![Complex64::new(1.0, 0.0)];
        let mut recv = vec![Complex64::new(0.0, 0.0)];
        assert!(matches!(
            t0.exchange(1, &send, &mut recv),
            Err(SimError::DistributedTransport { partner: 1, .. })
        ));
    }
}
