//! Latest-value packet slots
//!
//! Each configured input owns one capacity-1 slot. A deposit into a full
//! slot discards the stale packet first, so the slot always holds either
//! nothing or the single most recent datagram for that source. Both ends
//! are non-blocking: backpressure must never occur on the ingest path.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use crossbeam::queue::ArrayQueue;

/// One received datagram, timestamped and resolved to its source
#[derive(Debug, Clone)]
pub struct Packet {
    /// Reception wall-clock timestamp
    pub received_at: DateTime<Utc>,
    /// Index into the configured input list
    pub source_index: usize,
    /// Raw datagram payload (at most `constants::MAX_DATAGRAM_SIZE` bytes)
    pub payload: Bytes,
}

impl Packet {
    pub fn new(received_at: DateTime<Utc>, source_index: usize, payload: Bytes) -> Self {
        Self {
            received_at,
            source_index,
            payload,
        }
    }
}

/// Single-slot latest-value holder for one source
pub struct SourceQueue {
    slot: ArrayQueue<Packet>,
    /// Packets displaced by a newer deposit before being read
    superseded_count: AtomicUsize,
}

impl SourceQueue {
    pub fn new() -> Self {
        Self {
            slot: ArrayQueue::new(1),
            superseded_count: AtomicUsize::new(0),
        }
    }

    /// Deposit a packet, displacing any stale one already in the slot.
    /// Never blocks; returns the displaced packet if there was one.
    pub fn deposit(&self, packet: Packet) -> Option<Packet> {
        let displaced = self.slot.force_push(packet);
        if displaced.is_some() {
            self.superseded_count.fetch_add(1, Ordering::Relaxed);
        }
        displaced
    }

    /// Take the current packet, emptying the slot.
    /// Returns `None` when the slot is empty; this is expected, not an error.
    pub fn take(&self) -> Option<Packet> {
        self.slot.pop()
    }

    /// Discard whatever is in the slot
    pub fn drain(&self) -> bool {
        self.slot.pop().is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_empty()
    }

    /// Packets overwritten before a consumer read them
    pub fn superseded_count(&self) -> usize {
        self.superseded_count.load(Ordering::Relaxed)
    }
}

impl Default for SourceQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe handle to a source queue
pub type SharedSourceQueue = Arc<SourceQueue>;

/// Create one shared queue per configured input
pub fn create_queues(count: usize) -> Vec<SharedSourceQueue> {
    let mut queues = Vec::with_capacity(count);
    for _ in 0..count {
        queues.push(Arc::new(SourceQueue::new()));
    }
    queues
}
