//! At-least-once delivery over best-effort datagrams.
//!
//! Every non-ACK frame carries a per-sender monotone sequence number and
//! stays in the outbox until the matching ACK arrives. Entries past their
//! deadline are retransmitted with the exact same bytes; a packet that runs
//! out of retries is fatal for the whole session.
//!
//! The outbox holds no timer of its own. The session's select loop asks for
//! [`ReliableOutbox::next_deadline`], sleeps until it, and then drains
//! [`ReliableOutbox::fire_expired`]; that keeps every mutation on the one
//! session task.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::time::Instant;

/// Retransmission interval. Contract constant: changing it breaks
/// interoperability with conforming peers.
pub const RETRY_TIMEOUT: Duration = Duration::from_millis(500);

/// Retransmissions attempted before the session is torn down.
pub const MAX_RETRIES: u32 = 3;

/// An unacknowledged outbound packet.
#[derive(Debug, Clone)]
struct Pending {
    bytes: Vec<u8>,
    dst: SocketAddr,
    retries: u32,
    deadline: Instant,
}

/// What to do about an entry whose deadline passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryAction {
    /// Send the same bytes again.
    Resend {
        seq: u32,
        bytes: Vec<u8>,
        dst: SocketAddr,
    },
    /// Retries exhausted; the session must close. The outbox has already
    /// dropped all pending entries.
    Exhausted { seq: u32 },
}

/// Sequence issuance plus the retransmission buffer.
#[derive(Debug, Default)]
pub struct ReliableOutbox {
    last_seq: u32,
    pending: BTreeMap<u32, Pending>,
}

impl ReliableOutbox {
    pub fn new() -> Self {
        ReliableOutbox::default()
    }

    /// Issue the next sequence number. Starts at 1, strictly increasing,
    /// contiguous over the session.
    pub fn allocate_seq(&mut self) -> u32 {
        self.last_seq += 1;
        self.last_seq
    }

    /// Buffer an already-transmitted packet for retransmission.
    pub fn register(&mut self, seq: u32, bytes: Vec<u8>, dst: SocketAddr, now: Instant) {
        self.pending.insert(
            seq,
            Pending {
                bytes,
                dst,
                retries: 0,
                deadline: now + RETRY_TIMEOUT,
            },
        );
    }

    /// Consume an inbound ACK. Returns whether a pending entry was
    /// cleared; duplicate and unmatched ACKs are no-ops.
    pub fn acknowledge(&mut self, ack: u32) -> bool {
        self.pending.remove(&ack).is_some()
    }

    /// Earliest deadline among pending entries, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|p| p.deadline).min()
    }

    /// Handle every entry whose deadline has passed.
    ///
    /// Entries with retry budget left are rescheduled and reported as
    /// [`RetryAction::Resend`]. The first exhausted entry clears the whole
    /// outbox and ends the drain with [`RetryAction::Exhausted`].
    pub fn fire_expired(&mut self, now: Instant) -> Vec<RetryAction> {
        let due: Vec<u32> = self
            .pending
            .iter()
            .filter(|(_, p)| p.deadline <= now)
            .map(|(seq, _)| *seq)
            .collect();

        let mut actions = Vec::new();
        for seq in due {
            let Some(entry) = self.pending.get_mut(&seq) else {
                continue;
            };
            if entry.retries >= MAX_RETRIES {
                self.pending.clear();
                actions.push(RetryAction::Exhausted { seq });
                break;
            }
            entry.retries += 1;
            entry.deadline = now + RETRY_TIMEOUT;
            actions.push(RetryAction::Resend {
                seq,
                bytes: entry.bytes.clone(),
                dst: entry.dst,
            });
        }
        actions
    }

    /// Drop all pending entries (session teardown).
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn contains(&self, seq: u32) -> bool {
        self.pending.contains_key(&seq)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
