//! Transport layer: the connection handle and the session driver loop.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐    push     ┌────────────┐   try_pop    ┌───────────────┐
//! │  Producer Loop   │────────────►│ FrameQueue │─────────────►│ TransportLoop │
//! │  (user input)    │             └────────────┘              │  (owns socket │
//! └──────────────────┘                                         │   traffic)    │
//!          │ install at login                                  └───────┬───────┘
//!          ▼                                                           │
//!   ┌───────────────┐            probe / send_line / recv_line         │
//!   │ ConnectionSlot│◄──────────────────────────────────────────────────┘
//!   └───────────────┘
//! ```
//!
//! All socket use is confined to the one [`TransportLoop`]; correctness
//! around the socket needs no lock on the handle itself.
//!
//! # Connection Lifecycle
//!
//! 1. Producer loop handles `login`, dials a [`TcpTransport`]
//! 2. Handle installed into the [`ConnectionSlot`](crate::ConnectionSlot), exactly once
//! 3. [`TransportLoop`] leaves its polling state and starts cycling
//! 4. Any failure closes the handle and flips the shutdown signal
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `driver` | The session driver state machine |
//! | `tcp` | Blocking TCP connection handle |

// ============================================================================
// Imports
// ============================================================================

use crate::error::Result;

// ============================================================================
// Submodules
// ============================================================================

/// Session driver state machine.
pub mod driver;

/// Blocking TCP connection handle.
pub mod tcp;

// ============================================================================
// Transport Trait
// ============================================================================

/// The connection handle contract.
///
/// One handle maps to one socket. Implementations are shared between the
/// loop that installs them and the loop that drives them, so every method
/// takes `&self` and must be internally synchronized.
pub trait Transport: Send + Sync {
    /// Idempotent liveness probe.
    fn probe(&self) -> bool;

    /// Writes one encoded frame, terminator included, and flushes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Send`](crate::Error::Send) if the write fails or the
    /// handle is closed.
    fn send_line(&self, line: &str) -> Result<()>;

    /// Blocks until one full frame of wire text arrives.
    ///
    /// The returned text excludes the frame terminator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Receive`](crate::Error::Receive) if the read fails or
    /// the peer closes the connection.
    fn recv_line(&self) -> Result<String>;

    /// Closes the handle. Idempotent.
    fn close(&self);
}

// ============================================================================
// Re-exports
// ============================================================================

pub use driver::{StopReason, TransportLoop};
pub use tcp::TcpTransport;
