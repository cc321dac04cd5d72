//! Session driver: the transport loop state machine.
//!
//! The loop owns all socket traffic for a session. Each active cycle
//! performs, in order: one liveness probe, at most one dequeue-and-send,
//! then one blocking receive-decode-dispatch. Interleaving one send with one
//! receive keeps the socket single-threaded without a lock on the handle;
//! the cost is that outbound throughput is bounded by inbound message
//! cadence — a slow peer stalls pending sends.
//!
//! # States
//!
//! ```text
//! AwaitingConnection ──handle installed──► Active ──any failure──► Terminated
//!        ▲  │ poll                           │ cycle
//!        └──┘                                └──► (probe, send, recv, check)
//! ```
//!
//! Every failure path is terminal: the handle is closed, the shutdown signal
//! flips, and the loop exits. There is no retry or reconnect.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, trace, warn};

use crate::error::{Error, Result};
use crate::protocol::{ProtocolState, codec};
use crate::session::SessionContext;

use super::Transport;

// ============================================================================
// Constants
// ============================================================================

/// Poll interval while the connection handle is absent.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

// ============================================================================
// StopReason
// ============================================================================

/// Why the transport loop terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The liveness probe on the handle failed.
    ConnectivityLost,

    /// Writing an outbound frame failed.
    SendFailed,

    /// The blocking receive failed or the peer closed the connection.
    ReceiveFailed,

    /// The protocol state reported disconnection after a dispatch.
    ProtocolDisconnect,

    /// The shutdown signal was triggered externally.
    ShutdownRequested,
}

impl StopReason {
    /// Returns `true` if the loop stopped because of a transport failure.
    #[inline]
    #[must_use]
    pub fn is_failure(self) -> bool {
        !matches!(self, Self::ShutdownRequested)
    }

    /// Maps the stop into the session-level error it represents.
    ///
    /// An orderly [`StopReason::ShutdownRequested`] stop is `Ok(())`; every
    /// failure stop maps to its [`enum@Error`] variant.
    ///
    /// # Errors
    ///
    /// Returns the matching session or transport error for a failure stop.
    pub fn into_result(self) -> Result<()> {
        match self {
            Self::ShutdownRequested => Ok(()),
            Self::ConnectivityLost => Err(Error::ConnectivityLost),
            Self::SendFailed => Err(Error::send("outbound frame rejected by transport")),
            Self::ReceiveFailed => Err(Error::receive("inbound frame unavailable")),
            Self::ProtocolDisconnect => Err(Error::ProtocolDisconnect),
        }
    }
}

// ============================================================================
// Cycle
// ============================================================================

/// Outcome of one transport cycle.
enum Cycle {
    /// Handle absent; sleep and re-check.
    Idle,

    /// Cycle completed; run another.
    Progress,

    /// Terminal failure; close out the session.
    Stop(StopReason),
}

// ============================================================================
// TransportLoop
// ============================================================================

/// The session driver.
///
/// Holds the shared session context and the protocol state, and runs the
/// send/receive cycle until a terminal condition. The blocking receive is
/// not cancellable; an idle loop (handle absent) re-checks the shutdown
/// signal every poll interval, but a loop blocked in a receive only returns
/// once the peer or the transport closes the connection.
pub struct TransportLoop {
    /// Shared queue, slot, and shutdown signal.
    ctx: SessionContext,

    /// Consumer of inbound frames and owner of the connectivity flag.
    protocol: Arc<dyn ProtocolState>,

    /// Sleep between checks while the handle is absent.
    poll_interval: Duration,
}

impl TransportLoop {
    /// Creates a driver over the given session context and protocol state.
    #[must_use]
    pub fn new(ctx: SessionContext, protocol: Arc<dyn ProtocolState>) -> Self {
        Self {
            ctx,
            protocol,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Overrides the absent-handle poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Runs the loop to termination and returns why it stopped.
    ///
    /// On any failure the connection handle is closed (exactly once, the
    /// close is idempotent) and the shutdown signal is triggered before
    /// returning.
    pub fn run(&self) -> StopReason {
        info!("Transport loop started");

        loop {
            if !self.ctx.shutdown.is_running() {
                debug!("Shutdown observed, transport loop exiting");
                return StopReason::ShutdownRequested;
            }

            match self.cycle() {
                Cycle::Idle => thread::sleep(self.poll_interval),
                Cycle::Progress => {}
                Cycle::Stop(reason) => {
                    self.ctx.shutdown.trigger();
                    info!(?reason, "Transport loop terminated");
                    return reason;
                }
            }
        }
    }

    /// Performs one cycle: probe, send, receive, dispatch.
    fn cycle(&self) -> Cycle {
        let Some(transport) = self.ctx.slot.get() else {
            trace!("Connection handle absent");
            return Cycle::Idle;
        };

        // 1. Liveness probe.
        if !transport.probe() {
            error!("Connection handle is not live");
            return Self::fail(transport, StopReason::ConnectivityLost);
        }

        // 2. Outbound: at most one frame per cycle.
        if let Some(frame) = self.ctx.queue.try_pop() {
            let text = codec::encode(&frame);
            if let Err(e) = transport.send_line(&text) {
                error!(error = %e, command = %frame.command, "Failed to send frame");
                return Self::fail(transport, StopReason::SendFailed);
            }
            debug!(command = %frame.command, "Frame sent");
        }

        // 3. Inbound: one blocking receive.
        let text = match transport.recv_line() {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Failed to receive frame");
                return Self::fail(transport, StopReason::ReceiveFailed);
            }
        };

        match codec::decode(&text) {
            Ok(frame) => {
                debug!(command = %frame.command, "Frame received");
                self.protocol.process_frame(frame);
            }
            Err(e) => {
                // Undecodable inbound text is dropped, not terminal, and
                // nothing was dispatched so the post-dispatch check is moot.
                warn!(error = %e, "Discarding undecodable frame");
                return Cycle::Progress;
            }
        }

        // 4. Post-dispatch connectivity check.
        if !self.protocol.is_connected() {
            info!("Protocol reported disconnect");
            return Self::fail(transport, StopReason::ProtocolDisconnect);
        }

        Cycle::Progress
    }

    /// Closes the handle and maps the reason into a terminal outcome.
    fn fail(transport: &dyn Transport, reason: StopReason) -> Cycle {
        transport.close();
        Cycle::Stop(reason)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use parking_lot::Mutex;

    use crate::protocol::{Frame, StompState};

    /// Scripted transport: replays queued receive results, records traffic.
    #[derive(Default)]
    struct ScriptedTransport {
        probe_ok: AtomicBool,
        fail_sends: AtomicBool,
        recv_script: Mutex<VecDeque<String>>,
        sent: Mutex<Vec<String>>,
        ops: Mutex<Vec<&'static str>>,
        closes: AtomicUsize,
    }

    impl ScriptedTransport {
        fn live() -> Self {
            let transport = Self::default();
            transport.probe_ok.store(true, Ordering::SeqCst);
            transport
        }

        fn with_recvs(self, texts: &[&str]) -> Self {
            let mut script = self.recv_script.lock();
            script.extend(texts.iter().map(ToString::to_string));
            drop(script);
            self
        }

        fn close_count(&self) -> usize {
            self.closes.load(Ordering::SeqCst)
        }
    }

    impl Transport for ScriptedTransport {
        fn probe(&self) -> bool {
            self.ops.lock().push("probe");
            self.probe_ok.load(Ordering::SeqCst)
        }

        fn send_line(&self, line: &str) -> Result<()> {
            self.ops.lock().push("send");
            if self.fail_sends.load(Ordering::SeqCst) {
                return Err(Error::send("scripted failure"));
            }
            self.sent.lock().push(line.to_string());
            Ok(())
        }

        fn recv_line(&self) -> Result<String> {
            self.ops.lock().push("recv");
            self.recv_script
                .lock()
                .pop_front()
                .ok_or_else(|| Error::receive("script exhausted"))
        }

        fn close(&self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Protocol mock with a settable connectivity answer.
    struct FixedProtocol {
        connected: AtomicBool,
        processed: Mutex<Vec<Frame>>,
    }

    impl FixedProtocol {
        fn connected() -> Self {
            Self {
                connected: AtomicBool::new(true),
                processed: Mutex::new(Vec::new()),
            }
        }

        fn processed_commands(&self) -> Vec<String> {
            self.processed.lock().iter().map(|f| f.command.clone()).collect()
        }
    }

    impl ProtocolState for FixedProtocol {
        fn process_frame(&self, frame: Frame) {
            self.processed.lock().push(frame);
        }

        fn is_connected(&self) -> bool {
            self.connected.load(Ordering::SeqCst)
        }
    }

    fn driver_with(
        transport: Option<Arc<ScriptedTransport>>,
        protocol: Arc<dyn ProtocolState>,
    ) -> (SessionContext, TransportLoop) {
        let ctx = SessionContext::new();
        if let Some(transport) = transport {
            assert!(ctx.slot.install(Box::new(ArcTransport(transport))));
        }
        let driver = TransportLoop::new(ctx.clone(), protocol)
            .with_poll_interval(Duration::from_millis(1));
        (ctx, driver)
    }

    /// Shim so tests can keep a handle on the installed transport.
    struct ArcTransport(Arc<ScriptedTransport>);

    impl Transport for ArcTransport {
        fn probe(&self) -> bool {
            self.0.probe()
        }

        fn send_line(&self, line: &str) -> Result<()> {
            self.0.send_line(line)
        }

        fn recv_line(&self) -> Result<String> {
            self.0.recv_line()
        }

        fn close(&self) {
            self.0.close()
        }
    }

    #[test]
    fn test_absent_handle_idles_without_io() {
        let protocol = Arc::new(FixedProtocol::connected());
        let (ctx, driver) = driver_with(None, protocol);

        // A cycle with no handle performs no I/O and is not terminal.
        assert!(matches!(driver.cycle(), Cycle::Idle));
        assert!(matches!(driver.cycle(), Cycle::Idle));
        assert!(ctx.shutdown.is_running());
    }

    #[test]
    fn test_pre_triggered_shutdown_stops_before_any_io() {
        let transport = Arc::new(ScriptedTransport::live());
        let protocol = Arc::new(FixedProtocol::connected());
        let (ctx, driver) = driver_with(Some(Arc::clone(&transport)), protocol);

        ctx.shutdown.trigger();
        assert_eq!(driver.run(), StopReason::ShutdownRequested);
        assert!(transport.ops.lock().is_empty());
    }

    #[test]
    fn test_probe_failure_is_terminal() {
        let transport = Arc::new(ScriptedTransport::default());
        let protocol = Arc::new(FixedProtocol::connected());
        let (ctx, driver) = driver_with(Some(Arc::clone(&transport)), protocol);

        assert_eq!(driver.run(), StopReason::ConnectivityLost);
        assert!(!ctx.shutdown.is_running());
        assert_eq!(transport.close_count(), 1);
    }

    #[test]
    fn test_send_failure_is_terminal_and_closes_handle() {
        let transport = Arc::new(ScriptedTransport::live());
        transport.fail_sends.store(true, Ordering::SeqCst);
        let protocol = Arc::new(FixedProtocol::connected());
        let (ctx, driver) = driver_with(Some(Arc::clone(&transport)), protocol);

        ctx.queue.push(Frame::new("SEND").with_header("destination", "/a"));
        assert_eq!(driver.run(), StopReason::SendFailed);
        assert!(!ctx.shutdown.is_running());
        assert_eq!(transport.close_count(), 1);

        // The failed send never reached the receive step.
        assert!(!transport.ops.lock().contains(&"recv"));
    }

    #[test]
    fn test_receive_failure_is_terminal_and_closes_handle_once() {
        let transport = Arc::new(ScriptedTransport::live());
        let protocol = Arc::new(FixedProtocol::connected());
        let (ctx, driver) = driver_with(Some(Arc::clone(&transport)), protocol);

        assert_eq!(driver.run(), StopReason::ReceiveFailed);
        assert!(!ctx.shutdown.is_running());
        assert_eq!(transport.close_count(), 1);
    }

    #[test]
    fn test_post_dispatch_disconnect_is_terminal() {
        let transport =
            Arc::new(ScriptedTransport::live().with_recvs(&["ERROR\nmessage:denied\n\n"]));
        let protocol = Arc::new(StompState::new());
        let (ctx, driver) = driver_with(Some(Arc::clone(&transport)), protocol);

        assert_eq!(driver.run(), StopReason::ProtocolDisconnect);
        assert!(!ctx.shutdown.is_running());
        assert_eq!(transport.close_count(), 1);
    }

    #[test]
    fn test_send_precedes_receive_within_a_cycle() {
        let transport =
            Arc::new(ScriptedTransport::live().with_recvs(&["CONNECTED\nversion:1.2\n\n"]));
        let protocol = Arc::new(StompState::new());
        let (ctx, driver) = driver_with(Some(Arc::clone(&transport)), protocol);

        ctx.queue.push(
            Frame::new("CONNECT")
                .with_header("accept-version", "1.2")
                .with_header("host", "stomp.example"),
        );

        // Cycle 1: sends CONNECT, receives CONNECTED. Cycle 2: receive fails.
        assert_eq!(driver.run(), StopReason::ReceiveFailed);

        let ops = transport.ops.lock().clone();
        assert_eq!(ops, vec!["probe", "send", "recv", "probe", "recv"]);
        let sent = transport.sent.lock().clone();
        assert!(sent[0].starts_with("CONNECT\n"));
    }

    #[test]
    fn test_undecodable_frame_is_dropped_not_dispatched() {
        let transport = Arc::new(ScriptedTransport::live().with_recvs(&["BAD\nno separator\n\n"]));
        let protocol = Arc::new(FixedProtocol::connected());
        let (_ctx, driver) = driver_with(Some(Arc::clone(&transport)), protocol.clone());

        // Undecodable text is skipped; the loop then ends on the exhausted script.
        assert_eq!(driver.run(), StopReason::ReceiveFailed);
        assert!(protocol.processed_commands().is_empty());
    }

    #[test]
    fn test_stop_reason_maps_to_session_error() {
        assert!(StopReason::ShutdownRequested.into_result().is_ok());
        assert!(matches!(
            StopReason::ConnectivityLost.into_result(),
            Err(Error::ConnectivityLost)
        ));
        assert!(matches!(
            StopReason::ProtocolDisconnect.into_result(),
            Err(Error::ProtocolDisconnect)
        ));
        assert!(matches!(
            StopReason::SendFailed.into_result(),
            Err(Error::Send { .. })
        ));
        assert!(matches!(
            StopReason::ReceiveFailed.into_result(),
            Err(Error::Receive { .. })
        ));
    }

    #[test]
    fn test_failure_stops_map_to_terminal_errors() {
        for reason in [
            StopReason::ConnectivityLost,
            StopReason::SendFailed,
            StopReason::ReceiveFailed,
            StopReason::ProtocolDisconnect,
        ] {
            let err = reason.into_result().expect_err("failure stop");
            assert!(err.is_terminal());
        }
    }

    #[test]
    fn test_dispatch_reaches_protocol_state() {
        let transport = Arc::new(
            ScriptedTransport::live()
                .with_recvs(&["MESSAGE\ndestination:/a\n\npayload", "MESSAGE\ndestination:/b\n\n"]),
        );
        let protocol = Arc::new(FixedProtocol::connected());
        let (_ctx, driver) = driver_with(Some(transport), protocol.clone());

        assert_eq!(driver.run(), StopReason::ReceiveFailed);
        assert_eq!(protocol.processed_commands(), vec!["MESSAGE", "MESSAGE"]);
    }
}
