//! SharedFrameBuffer - single-slot latest-value broadcast
//!
//! One producer overwrites the slot on every tick; any number of readers wait
//! for the next write and copy whatever is there. There is no queue: a reader
//! that falls behind observes an order-preserving subsequence of the
//! published lines, never a duplicate and never a torn line.
//!
//! Every publish bumps a sequence number. Each [`FrameReader`] remembers the
//! last sequence number it returned and only wakes up for a strictly larger
//! one, so spurious or coalesced notifications cannot produce duplicates.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use tokio::sync::Notify;
use tracing::trace;

/// What a reader observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snapshot {
    /// A complete encoded frame
    Frame {
        /// Publish sequence number (1 for the first publish)
        seq: u64,
        /// Encoded line, newline included
        line: Bytes,
        /// Publishes this reader missed since its previous frame
        skipped: u64,
    },
    /// Sentinel left by [`SharedFrameBuffer::clear_and_wake`]; nothing to deliver
    Empty,
}

impl Snapshot {
    /// Whether this is the shutdown sentinel
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Encoded line, if any
    pub fn line(&self) -> Option<&Bytes> {
        match self {
            Self::Frame { line, .. } => Some(line),
            Self::Empty => None,
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    seq: u64,
    content: Bytes,
    cleared: bool,
}

/// Single-slot shared frame buffer
///
/// Created once at startup and shared by `Arc` with the producer and every
/// sink task.
#[derive(Debug, Default)]
pub struct SharedFrameBuffer {
    slot: Mutex<Slot>,
    notify: Notify,
}

impl SharedFrameBuffer {
    /// Create an empty buffer
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        // The slot is always left consistent, so a poisoned lock is still usable.
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the content with `line` and wake every waiting reader.
    ///
    /// Unread previous content is discarded.
    pub fn publish(&self, line: Bytes) {
        let seq = {
            let mut slot = self.lock();
            slot.seq += 1;
            slot.content = line;
            slot.cleared = false;
            slot.seq
        };
        trace!(seq, "frame published");
        self.notify.notify_waiters();
    }

    /// Replace the content with the empty sentinel and wake every waiting reader.
    ///
    /// Used once, at shutdown, to release readers parked in
    /// [`FrameReader::await_and_copy`].
    pub fn clear_and_wake(&self) {
        let seq = {
            let mut slot = self.lock();
            slot.seq += 1;
            slot.content = Bytes::new();
            slot.cleared = true;
            slot.seq
        };
        trace!(seq, "buffer cleared");
        self.notify.notify_waiters();
    }

    /// Sequence number of the most recent publish or clear
    pub fn seq(&self) -> u64 {
        self.lock().seq
    }

    /// Create a reader that waits for the next publish after this call
    pub fn reader(self: &Arc<Self>) -> FrameReader {
        FrameReader {
            last_seq: self.seq(),
            buffer: Arc::clone(self),
        }
    }
}

/// Per-consumer cursor over a [`SharedFrameBuffer`]
#[derive(Debug)]
pub struct FrameReader {
    buffer: Arc<SharedFrameBuffer>,
    last_seq: u64,
}

impl FrameReader {
    /// Wait for content newer than the last returned frame, then copy it.
    ///
    /// Returns [`Snapshot::Empty`] immediately, and on every further call,
    /// while the buffer holds the shutdown sentinel. There is no timeout.
    pub async fn await_and_copy(&mut self) -> Snapshot {
        let buffer = Arc::clone(&self.buffer);
        loop {
            let notified = buffer.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a publish between check and await is not lost.
            notified.as_mut().enable();

            if let Some(snapshot) = self.try_copy() {
                return snapshot;
            }

            notified.await;
        }
    }

    /// Copy the content if it is newer than the last returned frame
    pub fn try_copy(&mut self) -> Option<Snapshot> {
        let slot = self.buffer.lock();

        if slot.cleared {
            self.last_seq = slot.seq;
            return Some(Snapshot::Empty);
        }

        if slot.seq > self.last_seq {
            let skipped = slot.seq - self.last_seq - 1;
            self.last_seq = slot.seq;
            return Some(Snapshot::Frame {
                seq: slot.seq,
                line: slot.content.clone(),
                skipped,
            });
        }

        None
    }

    /// Wait until anything is published or cleared after the last observation
    ///
    /// Unlike [`FrameReader::await_and_copy`] this does not return while the
    /// sentinel is already in place.
    pub async fn changed(&self) {
        loop {
            let notified = self.buffer.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.buffer.seq() > self.last_seq {
                return;
            }

            notified.await;
        }
    }
}
