//! Protocol frame type.
//!
//! A [`Frame`] is the unit of communication: a command, an ordered list of
//! headers, and a body. Headers keep insertion order because the wire format
//! is order-sensitive and servers may attach meaning to repeated keys.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// Frame
// ============================================================================

/// A protocol frame.
///
/// # No-op sentinel
///
/// A frame with an empty command is the canonical "no-op" sentinel. It is
/// produced by handlers for input that yields nothing, and the frame queue
/// refuses to admit it. See [`Frame::noop`] and [`Frame::is_noop`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame command (e.g. `CONNECT`, `SEND`, `MESSAGE`).
    pub command: String,

    /// Headers in insertion order.
    pub headers: Vec<(String, String)>,

    /// Frame body (empty for body-less frames).
    pub body: String,
}

impl Frame {
    /// Creates a frame with the given command and no headers or body.
    #[inline]
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            headers: Vec::new(),
            body: String::new(),
        }
    }

    /// Creates the no-op sentinel frame.
    #[inline]
    #[must_use]
    pub fn noop() -> Self {
        Self::new("")
    }

    /// Appends a header, preserving insertion order.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Sets the frame body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns `true` if this is the no-op sentinel.
    #[inline]
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.command.is_empty()
    }

    /// Returns the first header value for `key`, if present.
    #[must_use]
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{} headers, {} body bytes]",
            if self.is_noop() {
                "<noop>"
            } else {
                self.command.as_str()
            },
            self.headers.len(),
            self.body.len()
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
