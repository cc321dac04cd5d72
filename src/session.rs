//! Session wiring: shared context and the two loop threads.
//!
//! A session couples one producer loop with one transport loop through an
//! explicit [`SessionContext`] — no ambient globals, so any number of
//! independent sessions can run in one process.

// ============================================================================
// Imports
// ============================================================================

use std::io::BufRead;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{error, info};

use crate::error::Result;
use crate::producer::{CommandHandler, ProducerLoop};
use crate::protocol::ProtocolState;
use crate::queue::FrameQueue;
use crate::signal::{ConnectionSlot, ShutdownSignal};
use crate::transport::{StopReason, TransportLoop};

// ============================================================================
// SessionContext
// ============================================================================

/// The three resources shared between the producer and transport loops.
///
/// Cheap to clone; clones share the same queue, slot, and signal.
#[derive(Clone)]
pub struct SessionContext {
    /// Pending outbound frames.
    pub queue: Arc<FrameQueue>,

    /// Write-once connection handle.
    pub slot: Arc<ConnectionSlot>,

    /// Monotonic running → stopped flag.
    pub shutdown: Arc<ShutdownSignal>,
}

impl SessionContext {
    /// Creates a fresh context: empty queue, absent handle, running signal.
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: Arc::new(FrameQueue::new()),
            slot: Arc::new(ConnectionSlot::new()),
            shutdown: Arc::new(ShutdownSignal::new()),
        }
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Session
// ============================================================================

/// Factory for a running session.
///
/// # Example
///
/// ```no_run
/// use std::io;
/// use std::sync::Arc;
///
/// use stomp_pipeline::{Session, StompCommands, StompState};
///
/// fn main() -> stomp_pipeline::Result<()> {
///     let state = Arc::new(StompState::new());
///     let commands = StompCommands::new(Arc::clone(&state));
///
///     let handle = Session::spawn(state, commands, io::BufReader::new(io::stdin()))?;
///     let reason = handle.join();
///     println!("session ended: {reason:?}");
///     Ok(())
/// }
/// ```
pub struct Session;

impl Session {
    /// Spawns the producer and transport loops on two OS threads.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if a thread cannot be
    /// spawned.
    pub fn spawn<H, R>(
        protocol: Arc<dyn ProtocolState>,
        handler: H,
        input: R,
    ) -> Result<SessionHandle>
    where
        H: CommandHandler + 'static,
        R: BufRead + Send + 'static,
    {
        let ctx = SessionContext::new();
        Self::spawn_with_context(ctx, protocol, handler, input)
    }

    /// Spawns a session over a caller-provided context.
    ///
    /// Useful when the embedder wants to keep a handle on the queue or
    /// trigger shutdown from outside the returned [`SessionHandle`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if a thread cannot be
    /// spawned.
    pub fn spawn_with_context<H, R>(
        ctx: SessionContext,
        protocol: Arc<dyn ProtocolState>,
        handler: H,
        input: R,
    ) -> Result<SessionHandle>
    where
        H: CommandHandler + 'static,
        R: BufRead + Send + 'static,
    {
        let producer = ProducerLoop::new(ctx.clone(), Arc::clone(&protocol), handler, input);
        let producer = thread::Builder::new()
            .name("frame-producer".into())
            .spawn(move || producer.run())?;

        let driver = TransportLoop::new(ctx.clone(), protocol);
        let transport = thread::Builder::new()
            .name("transport-loop".into())
            .spawn(move || driver.run())?;

        info!("Session spawned");
        Ok(SessionHandle {
            ctx,
            producer,
            transport,
        })
    }
}

// ============================================================================
// SessionHandle
// ============================================================================

/// Handle on a running session.
pub struct SessionHandle {
    /// Shared context, kept for external shutdown and inspection.
    ctx: SessionContext,

    /// Producer loop thread.
    producer: JoinHandle<()>,

    /// Transport loop thread.
    transport: JoinHandle<StopReason>,
}

impl SessionHandle {
    /// Returns the session's shared context.
    #[must_use]
    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    /// Triggers the shutdown signal. Idempotent.
    ///
    /// An idle transport loop notices within one poll interval. A transport
    /// loop blocked in a receive only returns once the peer or the handle
    /// closes the connection; a producer loop blocked on input only returns
    /// once its source yields a line or reaches end of input.
    pub fn shutdown(&self) {
        self.ctx.shutdown.trigger();
    }

    /// Waits for both loops and returns why the transport loop stopped.
    #[must_use]
    pub fn join(self) -> StopReason {
        let reason = match self.transport.join() {
            Ok(reason) => reason,
            Err(_) => {
                error!("Transport loop thread panicked");
                StopReason::ShutdownRequested
            }
        };

        if self.producer.join().is_err() {
            error!("Producer loop thread panicked");
        }
        reason
    }

    /// Waits for both loops and reports a failure stop as its error.
    ///
    /// # Errors
    ///
    /// Returns the session-level error matching the transport loop's stop
    /// reason; an orderly shutdown is `Ok(())`. See
    /// [`StopReason::into_result`].
    pub fn join_result(self) -> Result<()> {
        self.join().into_result()
    }
}

// ============================================================================
// Tests
// ============================================================================
