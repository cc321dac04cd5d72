//! Protocol frame types, wire codec, and session interpreter.
//!
//! # Overview
//!
//! | Item | Direction | Purpose |
//! |------|-----------|---------|
//! | [`Frame`] | both | Unit of protocol communication |
//! | [`codec::encode`] | outbound | Frame → wire text |
//! | [`codec::decode`] | inbound | wire text → Frame |
//! | [`ProtocolState`] | inbound | Interprets frames, owns the connectivity flag |
//!
//! The transport pipeline treats the codec as an opaque transform and the
//! protocol state as an opaque consumer; both are replaceable seams.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `frame` | The [`Frame`] type |
//! | `codec` | Text encode/decode transforms |
//! | `state` | [`ProtocolState`] trait and STOMP reference impl |

// ============================================================================
// Submodules
// ============================================================================

/// Wire text encode/decode transforms.
pub mod codec;

/// The frame type.
pub mod frame;

/// Frame interpreter and connectivity flag.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use frame::Frame;
pub use state::{MessageSink, ProtocolState, StompState};
