//! Shared FIFO queue of pending outbound frames.
//!
//! The producer loop pushes, the transport loop drains with a non-blocking
//! [`FrameQueue::try_pop`]. Every push notifies one waiting consumer; the
//! transport loop happens not to wait on the condition (it is driven by its
//! own send/receive cadence), but the wake-up is part of the queue contract
//! so a blocking consumer could be swapped in.
//!
//! The queue is unbounded. A producer that outruns a stalled transport grows
//! it without limit; this is a documented limitation, not a bug.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace};

use crate::protocol::Frame;

// ============================================================================
// FrameQueue
// ============================================================================

/// Thread-safe FIFO buffer of pending outbound frames.
///
/// # Invariants
///
/// - Frames are popped in exactly the order they were pushed.
/// - Concurrent push/pop never interleaves or duplicates a frame.
/// - A frame with an empty command is never admitted.
#[derive(Default)]
pub struct FrameQueue {
    /// Pending frames, head at the front.
    frames: Mutex<VecDeque<Frame>>,

    /// Signaled once per admitted push.
    available: Condvar,
}

impl FrameQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a frame and notifies one waiting consumer.
    ///
    /// Returns `false` without enqueueing if the frame is the no-op
    /// sentinel (empty command).
    pub fn push(&self, frame: Frame) -> bool {
        if frame.is_noop() {
            debug!("Rejected no-op frame");
            return false;
        }

        trace!(command = %frame.command, "Frame enqueued");
        let mut frames = self.frames.lock();
        frames.push_back(frame);
        self.available.notify_one();
        true
    }

    /// Removes and returns the head frame, or `None` if the queue is empty.
    ///
    /// Never blocks.
    #[must_use]
    pub fn try_pop(&self) -> Option<Frame> {
        self.frames.lock().pop_front()
    }

    /// Returns the number of pending frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.lock().len()
    }

    /// Returns `true` if no frames are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.lock().is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
