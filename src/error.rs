//! Error types for the transport pipeline.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use stomp_pipeline::{Result, Frame};
//! use stomp_pipeline::protocol::codec;
//!
//! fn example(text: &str) -> Result<Frame> {
//!     let frame = codec::decode(text)?;
//!     Ok(frame)
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Session | [`Error::ConnectivityLost`], [`Error::ProtocolDisconnect`] |
//! | Transport | [`Error::Send`], [`Error::Receive`] |
//! | Input | [`Error::Login`], [`Error::Report`] |
//! | Wire | [`Error::Codec`] |
//! | External | [`Error::Io`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::path::PathBuf;
use std::result::Result as StdResult;

use thiserror::Error;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging. The session-level
/// variants mirror the transport loop's terminal conditions; none of them is
/// ever retried. An absent connection handle is not an error: the transport
/// loop represents it as a polling wait.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Session Errors
    // ========================================================================
    /// Liveness probe on the connection handle failed.
    ///
    /// Terminal for the session.
    #[error("Connectivity lost")]
    ConnectivityLost,

    /// The protocol state reported disconnection after dispatching a frame.
    ///
    /// Terminal for the session.
    #[error("Protocol reported disconnect")]
    ProtocolDisconnect,

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// Writing a frame to the socket failed.
    #[error("Send failed: {message}")]
    Send {
        /// Description of the send failure.
        message: String,
    },

    /// Reading a frame from the socket failed or the peer closed.
    #[error("Receive failed: {message}")]
    Receive {
        /// Description of the receive failure.
        message: String,
    },

    // ========================================================================
    // Input Errors
    // ========================================================================
    /// Login command was malformed or the connection could not be opened.
    #[error("Login failed: {message}")]
    Login {
        /// Description of the login failure.
        message: String,
    },

    /// Report batch could not be read from its resource.
    #[error("Report failed for {path}: {message}")]
    Report {
        /// Path of the report resource.
        path: PathBuf,
        /// Description of the report failure.
        message: String,
    },

    // ========================================================================
    // Wire Errors
    // ========================================================================
    /// Received text could not be decoded into a frame.
    #[error("Codec error: {message}")]
    Codec {
        /// Description of the malformed wire text.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a send failure error.
    #[inline]
    pub fn send(message: impl Into<String>) -> Self {
        Self::Send {
            message: message.into(),
        }
    }

    /// Creates a receive failure error.
    #[inline]
    pub fn receive(message: impl Into<String>) -> Self {
        Self::Receive {
            message: message.into(),
        }
    }

    /// Creates a login error.
    #[inline]
    pub fn login(message: impl Into<String>) -> Self {
        Self::Login {
            message: message.into(),
        }
    }

    /// Creates a report error.
    #[inline]
    pub fn report(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Report {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a codec error.
    #[inline]
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this error ends the session.
    ///
    /// Every session and transport failure is terminal: the transport loop
    /// closes the handle, flips the shutdown signal, and exits.
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::ConnectivityLost
                | Self::ProtocolDisconnect
                | Self::Send { .. }
                | Self::Receive { .. }
        )
    }

    /// Returns `true` if this is a connection-level error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::ConnectivityLost | Self::Send { .. } | Self::Receive { .. }
        )
    }

    /// Returns `true` if this error degrades to "no frame produced".
    ///
    /// Input errors never crash the producer loop; the offending command is
    /// logged and dropped.
    #[inline]
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::Login { .. } | Self::Report { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================
