//! Protocol state: the session-level interpreter of inbound frames.
//!
//! The transport loop dispatches every decoded frame to a [`ProtocolState`]
//! and then consults [`ProtocolState::is_connected`]; a `false` answer ends
//! the session. The producer loop uses the same flag to gate generic
//! commands.
//!
//! [`StompState`] is the reference implementation for STOMP 1.2 servers.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::Frame;

// ============================================================================
// Types
// ============================================================================

/// Callback invoked for every MESSAGE frame delivered by the server.
pub type MessageSink = Box<dyn Fn(&Frame) + Send + Sync>;

// ============================================================================
// ProtocolState Trait
// ============================================================================

/// Session-level interpreter of decoded frames.
///
/// Implementations are shared between the producer and transport loops, so
/// both methods take `&self` and interior state must be synchronized.
pub trait ProtocolState: Send + Sync {
    /// Consumes one decoded frame, updating the connectivity flag as needed.
    fn process_frame(&self, frame: Frame);

    /// Returns `true` while the session is considered connected.
    fn is_connected(&self) -> bool;
}

// ============================================================================
// StompState
// ============================================================================

/// Reference [`ProtocolState`] for STOMP 1.2.
///
/// | Inbound frame | Effect |
/// |---------------|--------|
/// | `CONNECTED` | connectivity flag set |
/// | `ERROR` | connectivity flag cleared |
/// | `RECEIPT` matching a registered disconnect receipt | connectivity flag cleared |
/// | `MESSAGE` | delivered to the message sink (or logged) |
///
/// The flag starts cleared; a well-behaved server answers the CONNECT frame
/// with `CONNECTED` before anything else.
#[derive(Default)]
pub struct StompState {
    /// Connectivity flag, set by CONNECTED and cleared on disconnect paths.
    connected: AtomicBool,

    /// Receipt id of an outstanding DISCONNECT, if any.
    disconnect_receipt: Mutex<Option<String>>,

    /// Optional consumer for MESSAGE frames. Shared so delivery can run
    /// without the lock held.
    on_message: Mutex<Option<Arc<MessageSink>>>,
}

impl StompState {
    /// Creates a state with the connectivity flag cleared.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the receipt id of an outgoing DISCONNECT frame.
    ///
    /// When the matching RECEIPT arrives, the connectivity flag is cleared
    /// and the transport loop winds the session down.
    pub fn expect_disconnect_receipt(&self, receipt_id: impl Into<String>) {
        let mut guard = self.disconnect_receipt.lock();
        *guard = Some(receipt_id.into());
    }

    /// Sets the consumer for MESSAGE frames.
    ///
    /// May be called from within a running sink; the replacement takes
    /// effect from the next MESSAGE frame.
    pub fn set_message_sink(&self, sink: MessageSink) {
        let mut guard = self.on_message.lock();
        *guard = Some(Arc::new(sink));
    }
}

impl ProtocolState for StompState {
    fn process_frame(&self, frame: Frame) {
        match frame.command.as_str() {
            "CONNECTED" => {
                info!(version = frame.header("version").unwrap_or("?"), "Session connected");
                self.connected.store(true, Ordering::Release);
            }

            "ERROR" => {
                warn!(
                    message = frame.header("message").unwrap_or(""),
                    "Server reported error"
                );
                self.connected.store(false, Ordering::Release);
            }

            "RECEIPT" => {
                let receipt_id = frame.header("receipt-id").unwrap_or("");
                let is_disconnect = {
                    let guard = self.disconnect_receipt.lock();
                    guard.as_deref() == Some(receipt_id)
                };
                if is_disconnect {
                    info!(receipt_id, "Disconnect acknowledged");
                    self.connected.store(false, Ordering::Release);
                } else {
                    debug!(receipt_id, "Receipt acknowledged");
                }
            }

            "MESSAGE" => {
                // Clone the sink out of the guard before invoking it, so a
                // sink that re-registers via `set_message_sink` does not
                // deadlock on the non-reentrant lock.
                let sink = self.on_message.lock().clone();
                if let Some(sink) = sink {
                    sink(&frame);
                } else {
                    info!(
                        destination = frame.header("destination").unwrap_or(""),
                        body = %frame.body,
                        "Message received"
                    );
                }
            }

            other => {
                debug!(command = other, "Unhandled server frame");
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

// ============================================================================
// Tests
// ============================================================================
