//! Shared session state: the shutdown signal and the connection slot.
//!
//! Both are plain data bundled into a session context and handed to the two
//! loops at construction, so multiple independent sessions can coexist in
//! one process.

// ============================================================================
// Imports
// ============================================================================

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::transport::Transport;

// ============================================================================
// ShutdownSignal
// ============================================================================

/// Monotonic running → stopped flag observed by both loops.
///
/// Written by the transport loop's failure paths and by external shutdown
/// requests; once stopped it never flips back.
pub struct ShutdownSignal {
    /// `true` while the session runs.
    running: AtomicBool,
}

impl ShutdownSignal {
    /// Creates a signal in the "running" state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
        }
    }

    /// Returns `true` until [`ShutdownSignal::trigger`] is called.
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Flips the signal to "stopped". Idempotent.
    pub fn trigger(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            debug!("Shutdown signal triggered");
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// ConnectionSlot
// ============================================================================

/// Write-once holder of the session's connection handle.
///
/// The producer loop installs the handle exactly once, at login; the
/// transport loop reads it on every cycle. The one-shot cell makes the
/// cross-thread publication safe and enforces the "never replaced"
/// invariant: a second install is refused.
#[derive(Default)]
pub struct ConnectionSlot {
    /// The handle, absent until login.
    inner: OnceLock<Box<dyn Transport>>,
}

impl ConnectionSlot {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the connection handle.
    ///
    /// Returns `false` (dropping `transport`) if a handle was already
    /// installed.
    pub fn install(&self, transport: Box<dyn Transport>) -> bool {
        let installed = self.inner.set(transport).is_ok();
        if installed {
            debug!("Connection handle installed");
        } else {
            debug!("Connection handle already present, install refused");
        }
        installed
    }

    /// Returns the installed handle, if any.
    #[must_use]
    pub fn get(&self) -> Option<&dyn Transport> {
        self.inner.get().map(Box::as_ref)
    }

    /// Returns `true` once a handle has been installed.
    #[inline]
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.inner.get().is_some()
    }
}

// ============================================================================
// Tests
// ============================================================================
