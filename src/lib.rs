//! Client-side transport pipeline for STOMP-style frame protocols.
//!
//! This library turns user-issued commands into protocol frames, serializes
//! them onto a single network connection, and decodes incoming frames back
//! into protocol events. The core is the concurrent pipeline bridging a
//! frame producer (driven by user input) with a blocking transport loop that
//! owns the connection and interleaves sending and receiving.
//!
//! # Architecture
//!
//! Two threads, three shared resources:
//!
//! ```text
//! user input ──► ProducerLoop ──push──► FrameQueue ──try_pop──► TransportLoop ──► socket
//!                     │                                              │
//!                     │ install at login    ConnectionSlot ◄─────────┤ read each cycle
//!                     └────────────────────►                         │
//!                                           ShutdownSignal ◄────flip on failure
//! socket ──► TransportLoop ──decode──► ProtocolState (connectivity flag)
//! ```
//!
//! Data flows one direction outbound (producer → queue → transport → codec →
//! socket) and one direction inbound (socket → codec → transport → protocol
//! state). Every transport failure is terminal for the session; there is no
//! reconnection.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::io;
//! use std::sync::Arc;
//!
//! use stomp_pipeline::{Session, StompCommands, StompState};
//!
//! fn main() -> stomp_pipeline::Result<()> {
//!     let state = Arc::new(StompState::new());
//!     let commands = StompCommands::new(Arc::clone(&state));
//!
//!     let session = Session::spawn(state, commands, io::BufReader::new(io::stdin()))?;
//!     let reason = session.join();
//!     println!("session ended: {reason:?}");
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`commands`] | Reference STOMP command handler |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`producer`] | Frame producer loop and [`CommandHandler`] seam |
//! | [`protocol`] | Frame type, wire codec, protocol state |
//! | [`queue`] | Shared FIFO of pending outbound frames |
//! | [`session`] | Context bundle and thread wiring |
//! | [`signal`] | Shutdown signal and write-once connection slot |
//! | [`transport`] | Connection handle contract, TCP impl, session driver |

// ============================================================================
// Modules
// ============================================================================

/// Reference STOMP command handler.
pub mod commands;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Frame producer loop.
///
/// Classifies user input and publishes frames onto the shared queue.
pub mod producer;

/// Protocol frame types, wire codec, and session interpreter.
pub mod protocol;

/// Shared FIFO queue of pending outbound frames.
pub mod queue;

/// Session context and thread wiring.
pub mod session;

/// Shutdown signal and connection slot.
pub mod signal;

/// Transport layer: connection handle and session driver.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Pipeline types
pub use producer::{CommandHandler, LoginOutcome, ProducerLoop};
pub use queue::FrameQueue;
pub use session::{Session, SessionContext, SessionHandle};
pub use signal::{ConnectionSlot, ShutdownSignal};

// Protocol types
pub use commands::StompCommands;
pub use protocol::{Frame, MessageSink, ProtocolState, StompState};

// Transport types
pub use transport::{StopReason, TcpTransport, Transport, TransportLoop};

// Error types
pub use error::{Error, Result};
