//! Blocking TCP connection handle.
//!
//! One [`TcpTransport`] wraps one `TcpStream`. Frames are NUL-delimited on
//! the wire: [`Transport::send_line`] appends the terminator if missing,
//! [`Transport::recv_line`] blocks until it reads one.

// ============================================================================
// Imports
// ============================================================================

use std::io::{BufRead, BufReader, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};

use super::Transport;

// ============================================================================
// Constants
// ============================================================================

/// Frame terminator byte on the wire.
const TERMINATOR: u8 = 0;

// ============================================================================
// TcpTransport
// ============================================================================

/// Blocking [`Transport`] over a TCP stream.
///
/// The reader and writer halves are guarded separately so a blocked
/// [`Transport::recv_line`] never delays a send or a close. `close` shuts
/// the socket down in both directions, which also unblocks an in-flight
/// receive on the peer-close path.
pub struct TcpTransport {
    /// Buffered reader half.
    reader: Mutex<BufReader<TcpStream>>,

    /// Writer half (a clone of the same stream).
    writer: Mutex<TcpStream>,

    /// Set once `close` has run.
    closed: AtomicBool,

    /// Peer address, for logging.
    peer: String,
}

impl TcpTransport {
    /// Dials `addr` and wraps the resulting stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the connect or stream clone fails.
    pub fn connect(addr: impl ToSocketAddrs, peer: impl Into<String>) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        let reader = BufReader::new(stream.try_clone()?);
        let peer = peer.into();

        debug!(%peer, "TCP connection established");

        Ok(Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(stream),
            closed: AtomicBool::new(false),
            peer,
        })
    }

    /// Returns the peer address this handle was dialed with.
    #[inline]
    #[must_use]
    pub fn peer(&self) -> &str {
        &self.peer
    }
}

impl Transport for TcpTransport {
    fn probe(&self) -> bool {
        if self.closed.load(Ordering::Acquire) {
            return false;
        }

        // A reset peer leaves a pending error on the socket before any read
        // or write observes it.
        match self.writer.lock().take_error() {
            Ok(None) => true,
            Ok(Some(e)) => {
                warn!(peer = %self.peer, error = %e, "Socket reported a pending error");
                false
            }
            Err(e) => {
                warn!(peer = %self.peer, error = %e, "Could not query socket state");
                false
            }
        }
    }

    fn send_line(&self, line: &str) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::send("transport closed"));
        }

        let mut writer = self.writer.lock();
        writer
            .write_all(line.as_bytes())
            .map_err(|e| Error::send(e.to_string()))?;
        if !line.ends_with('\0') {
            writer
                .write_all(&[TERMINATOR])
                .map_err(|e| Error::send(e.to_string()))?;
        }
        writer.flush().map_err(|e| Error::send(e.to_string()))?;

        trace!(peer = %self.peer, bytes = line.len(), "Frame sent");
        Ok(())
    }

    fn recv_line(&self) -> Result<String> {
        let mut reader = self.reader.lock();
        let mut buf = Vec::new();

        let read = reader
            .read_until(TERMINATOR, &mut buf)
            .map_err(|e| Error::receive(e.to_string()))?;
        if read == 0 {
            return Err(Error::receive("connection closed by peer"));
        }
        if buf.last() == Some(&TERMINATOR) {
            buf.pop();
        }

        trace!(peer = %self.peer, bytes = read, "Frame received");
        String::from_utf8(buf).map_err(|e| Error::receive(format!("invalid utf-8: {e}")))
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            let _ = self.writer.lock().shutdown(Shutdown::Both);
            debug!(peer = %self.peer, "TCP connection closed");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
