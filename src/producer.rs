//! Frame producer loop: user input in, frames out.
//!
//! Reads one input line at a time from any [`BufRead`], classifies it, and
//! publishes the resulting frames onto the shared queue:
//!
//! | Input prefix | Effect |
//! |--------------|--------|
//! | `login <details>` | Dials a connection, installs the handle, enqueues a CONNECT-style frame |
//! | `report <path>` | Reads a resource, enqueues an ordered batch of frames |
//! | anything else, while connected | At most one translated frame |
//! | anything else, while not connected | Ignored |
//!
//! Malformed input degrades to "no frame produced" with a warning; the loop
//! never terminates itself on bad input. It exits when the shutdown signal
//! flips (observed at the top of each iteration) or its input is exhausted.

// ============================================================================
// Imports
// ============================================================================

use std::io::BufRead;
use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use crate::error::Result;
use crate::protocol::{Frame, ProtocolState};
use crate::session::SessionContext;
use crate::transport::Transport;

// ============================================================================
// LoginOutcome
// ============================================================================

/// Result of a successful login: a dialed connection handle plus the
/// CONNECT-style frame announcing the session.
///
/// The producer loop enqueues the frame *before* installing the handle, so
/// the transport loop cannot leave its polling state and block on a receive
/// while the connection frame is still on its way to the queue.
pub struct LoginOutcome {
    /// The freshly dialed connection handle.
    pub transport: Box<dyn Transport>,

    /// The connection frame to enqueue.
    pub frame: Frame,
}

// ============================================================================
// CommandHandler Trait
// ============================================================================

/// Translator from user commands to protocol frames.
///
/// Implementations hold whatever per-session bookkeeping they need
/// (subscription ids, receipt counters); the producer loop owns the handler
/// exclusively, so methods take `&mut self`.
pub trait CommandHandler: Send {
    /// Handles `login <details>`: dials the connection and builds the
    /// connection frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Login`](crate::Error::Login) (or an IO error) if the
    /// details are malformed or the dial fails. The producer loop logs the
    /// error and produces nothing.
    fn login(&mut self, details: &str) -> Result<LoginOutcome>;

    /// Handles `report <path>`: reads the resource and yields an ordered
    /// batch of frames.
    ///
    /// No-op sentinel frames in the batch are tolerated; the queue filters
    /// them at enqueue, preserving the order of the rest.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Report`](crate::Error::Report) if the resource
    /// cannot be read.
    fn report(&mut self, path: &str) -> Result<Vec<Frame>>;

    /// Translates any other command into at most one frame.
    ///
    /// Only consulted while the protocol state reports "connected".
    fn translate(&mut self, line: &str) -> Option<Frame>;
}

// ============================================================================
// ProducerLoop
// ============================================================================

/// The frame producer loop.
///
/// Generic over its input so tests (and embedders) can feed it any line
/// source; a terminal client passes `std::io::stdin().lock()`.
pub struct ProducerLoop<H, R> {
    /// Shared queue, slot, and shutdown signal.
    ctx: SessionContext,

    /// Connectivity gate for generic commands.
    protocol: Arc<dyn ProtocolState>,

    /// Command translator.
    handler: H,

    /// Line source.
    input: R,
}

impl<H, R> ProducerLoop<H, R>
where
    H: CommandHandler,
    R: BufRead,
{
    /// Creates a producer loop over the given context, protocol state,
    /// handler, and input.
    #[must_use]
    pub fn new(ctx: SessionContext, protocol: Arc<dyn ProtocolState>, handler: H, input: R) -> Self {
        Self {
            ctx,
            protocol,
            handler,
            input,
        }
    }

    /// Runs the loop until shutdown is observed or the input is exhausted.
    pub fn run(mut self) {
        info!("Producer loop started");
        let mut line = String::new();

        while self.ctx.shutdown.is_running() {
            line.clear();
            match self.input.read_line(&mut line) {
                Ok(0) => {
                    debug!("Input exhausted, producer loop exiting");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "Failed to read input, producer loop exiting");
                    break;
                }
            }

            self.dispatch(line.trim_end_matches(['\r', '\n']));
        }

        info!("Producer loop terminated");
    }

    /// Classifies one input line and enqueues whatever frames it yields.
    fn dispatch(&mut self, line: &str) {
        if let Some(details) = line.strip_prefix("login ") {
            self.handle_login(details);
        } else if let Some(path) = line.strip_prefix("report ") {
            self.handle_report(path);
        } else if line.is_empty() {
            trace!("Ignoring blank input line");
        } else if self.protocol.is_connected() {
            if let Some(frame) = self.handler.translate(line) {
                self.enqueue(frame);
            }
        } else {
            debug!(line, "Ignoring command while not connected");
        }
    }

    fn handle_login(&mut self, details: &str) {
        if self.ctx.slot.is_set() {
            warn!("Already logged in, ignoring login command");
            return;
        }

        match self.handler.login(details) {
            Ok(outcome) => {
                // Frame first, handle second: the transport loop only starts
                // cycling once the connection frame is already queued.
                self.enqueue(outcome.frame);
                if !self.ctx.slot.install(outcome.transport) {
                    warn!("Connection handle installed concurrently, dropping ours");
                }
            }
            Err(e) => warn!(error = %e, "Login produced no frame"),
        }
    }

    fn handle_report(&mut self, path: &str) {
        match self.handler.report(path) {
            Ok(frames) => {
                debug!(path, count = frames.len(), "Report batch produced");
                for frame in frames {
                    self.enqueue(frame);
                }
            }
            Err(e) => warn!(error = %e, "Report produced no frames"),
        }
    }

    /// Pushes one frame; the queue filters no-op sentinels.
    fn enqueue(&self, frame: Frame) {
        if self.ctx.queue.push(frame) {
            trace!("Frame published");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
