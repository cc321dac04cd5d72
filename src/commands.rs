//! Reference command handler for STOMP 1.2 sessions.
//!
//! Translates the textual command surface into frames:
//!
//! | Command | Frame |
//! |---------|-------|
//! | `login <host>:<port> <username> <password>` | `CONNECT` (and dials the socket) |
//! | `report <path>` | One `SEND` per non-blank line of the file |
//! | `join <destination>` | `SUBSCRIBE` |
//! | `exit <destination>` | `UNSUBSCRIBE` |
//! | `send <destination> <body>` | `SEND` |
//! | `logout` | `DISCONNECT` with a receipt |
//!
//! Anything unrecognized yields no frame and a warning.

// ============================================================================
// Imports
// ============================================================================

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::producer::{CommandHandler, LoginOutcome};
use crate::protocol::{Frame, StompState};
use crate::transport::TcpTransport;

// ============================================================================
// StompCommands
// ============================================================================

/// Reference [`CommandHandler`] for STOMP 1.2.
///
/// Holds per-session bookkeeping: subscription ids by destination and a
/// receipt counter. Shares the [`StompState`] with the transport side so a
/// `logout` can register the receipt that will end the session.
pub struct StompCommands {
    /// Shared protocol state, for disconnect receipt registration.
    state: Arc<StompState>,

    /// Active subscriptions: destination → subscription id.
    subscriptions: Vec<(String, u64)>,

    /// Next subscription id.
    next_subscription: u64,

    /// Next receipt id.
    next_receipt: u64,
}

impl StompCommands {
    /// Creates a handler sharing the given protocol state.
    #[must_use]
    pub fn new(state: Arc<StompState>) -> Self {
        Self {
            state,
            subscriptions: Vec::new(),
            next_subscription: 0,
            next_receipt: 0,
        }
    }

    fn next_receipt_id(&mut self) -> u64 {
        let id = self.next_receipt;
        self.next_receipt += 1;
        id
    }

    /// Ensures a destination starts with `/`.
    fn normalize(destination: &str) -> String {
        if destination.starts_with('/') {
            destination.to_string()
        } else {
            format!("/{destination}")
        }
    }

    /// Turns one report line into a frame; blank lines yield the no-op
    /// sentinel so the batch keeps its shape and the queue filters it.
    fn report_line_frame(line: &str) -> Frame {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Frame::noop();
        }

        match trimmed.split_once(char::is_whitespace) {
            Some((channel, body)) => Frame::new("SEND")
                .with_header("destination", Self::normalize(channel))
                .with_body(body.trim_start().to_string()),
            None => Frame::new("SEND").with_header("destination", Self::normalize(trimmed)),
        }
    }

    fn subscribe(&mut self, destination: &str) -> Option<Frame> {
        let destination = Self::normalize(destination);
        if self.subscriptions.iter().any(|(d, _)| *d == destination) {
            warn!(%destination, "Already subscribed");
            return None;
        }

        let id = self.next_subscription;
        self.next_subscription += 1;
        self.subscriptions.push((destination.clone(), id));

        let receipt = self.next_receipt_id();
        Some(
            Frame::new("SUBSCRIBE")
                .with_header("destination", destination)
                .with_header("id", id.to_string())
                .with_header("receipt", receipt.to_string()),
        )
    }

    fn unsubscribe(&mut self, destination: &str) -> Option<Frame> {
        let destination = Self::normalize(destination);
        let position = self.subscriptions.iter().position(|(d, _)| *d == destination);
        let Some(position) = position else {
            warn!(%destination, "Not subscribed");
            return None;
        };

        let (_, id) = self.subscriptions.remove(position);
        let receipt = self.next_receipt_id();
        Some(
            Frame::new("UNSUBSCRIBE")
                .with_header("id", id.to_string())
                .with_header("receipt", receipt.to_string()),
        )
    }

    fn disconnect(&mut self) -> Frame {
        let receipt = self.next_receipt_id();
        self.state.expect_disconnect_receipt(receipt.to_string());
        Frame::new("DISCONNECT").with_header("receipt", receipt.to_string())
    }
}

impl CommandHandler for StompCommands {
    fn login(&mut self, details: &str) -> Result<LoginOutcome> {
        let mut parts = details.split_whitespace();
        let (addr, user, pass) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(addr), Some(user), Some(pass), None) => (addr, user, pass),
            _ => {
                return Err(Error::login(
                    "expected: login <host>:<port> <username> <password>",
                ));
            }
        };

        let (host, _port) = addr
            .split_once(':')
            .ok_or_else(|| Error::login("address must be <host>:<port>"))?;

        let transport = TcpTransport::connect(addr, addr)?;
        let frame = Frame::new("CONNECT")
            .with_header("accept-version", "1.2")
            .with_header("host", host)
            .with_header("login", user)
            .with_header("passcode", pass);

        debug!(addr, user, "Login dialed");
        Ok(LoginOutcome {
            transport: Box::new(transport),
            frame,
        })
    }

    fn report(&mut self, path: &str) -> Result<Vec<Frame>> {
        let file = File::open(path).map_err(|e| Error::report(path, e.to_string()))?;
        let reader = BufReader::new(file);

        let mut frames = Vec::new();
        for line in reader.lines() {
            let line = line.map_err(|e| Error::report(path, e.to_string()))?;
            frames.push(Self::report_line_frame(&line));
        }
        Ok(frames)
    }

    fn translate(&mut self, line: &str) -> Option<Frame> {
        let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();

        match verb {
            "join" if !rest.is_empty() => self.subscribe(rest),
            "exit" if !rest.is_empty() => self.unsubscribe(rest),
            "send" => {
                let (destination, body) = rest.split_once(' ')?;
                Some(
                    Frame::new("SEND")
                        .with_header("destination", Self::normalize(destination))
                        .with_body(body.to_string()),
                )
            }
            "logout" => Some(self.disconnect()),
            _ => {
                warn!(line, "Unrecognized command");
                None
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write as _;
    use std::net::TcpListener;
    use std::thread;

    use crate::protocol::ProtocolState;

    fn handler() -> (Arc<StompState>, StompCommands) {
        let state = Arc::new(StompState::new());
        (Arc::clone(&state), StompCommands::new(state))
    }

    #[test]
    fn test_login_builds_connect_frame_and_dials() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr").to_string();
        let accept = thread::spawn(move || listener.accept().map(|_| ()));

        let (_state, mut commands) = handler();
        let outcome = commands
            .login(&format!("{addr} ada secret"))
            .expect("login");

        assert_eq!(outcome.frame.command, "CONNECT");
        assert_eq!(outcome.frame.header("accept-version"), Some("1.2"));
        assert_eq!(outcome.frame.header("host"), Some("127.0.0.1"));
        assert_eq!(outcome.frame.header("login"), Some("ada"));
        assert_eq!(outcome.frame.header("passcode"), Some("secret"));
        assert!(outcome.transport.probe());

        outcome.transport.close();
        accept.join().expect("accept thread").expect("accept");
    }

    #[test]
    fn test_login_rejects_malformed_details() {
        let (_state, mut commands) = handler();
        assert!(matches!(commands.login("ada"), Err(Error::Login { .. })));
        assert!(matches!(
            commands.login("no-port ada secret"),
            Err(Error::Login { .. })
        ));
        assert!(matches!(
            commands.login("h:1 ada secret extra"),
            Err(Error::Login { .. })
        ));
    }

    #[test]
    fn test_join_then_exit_reuses_subscription_id() {
        let (_state, mut commands) = handler();

        let subscribe = commands.translate("join alerts").expect("subscribe");
        assert_eq!(subscribe.command, "SUBSCRIBE");
        assert_eq!(subscribe.header("destination"), Some("/alerts"));
        let id = subscribe.header("id").expect("id").to_string();

        let unsubscribe = commands.translate("exit alerts").expect("unsubscribe");
        assert_eq!(unsubscribe.command, "UNSUBSCRIBE");
        assert_eq!(unsubscribe.header("id"), Some(id.as_str()));
    }

    #[test]
    fn test_duplicate_join_and_unknown_exit_yield_nothing() {
        let (_state, mut commands) = handler();
        assert!(commands.translate("join alerts").is_some());
        assert!(commands.translate("join alerts").is_none());
        assert!(commands.translate("exit unknown").is_none());
    }

    #[test]
    fn test_send_command() {
        let (_state, mut commands) = handler();
        let frame = commands.translate("send alerts fire on main st").expect("send");
        assert_eq!(frame.command, "SEND");
        assert_eq!(frame.header("destination"), Some("/alerts"));
        assert_eq!(frame.body, "fire on main st");

        // A send without a body yields nothing.
        assert!(commands.translate("send alerts").is_none());
    }

    #[test]
    fn test_unrecognized_command_yields_nothing() {
        let (_state, mut commands) = handler();
        assert!(commands.translate("dance").is_none());
        assert!(commands.translate("join").is_none());
    }

    #[test]
    fn test_logout_registers_disconnect_receipt() {
        let (state, mut commands) = handler();
        state.process_frame(Frame::new("CONNECTED"));

        let disconnect = commands.translate("logout").expect("disconnect");
        assert_eq!(disconnect.command, "DISCONNECT");
        let receipt = disconnect.header("receipt").expect("receipt");

        state.process_frame(Frame::new("RECEIPT").with_header("receipt-id", receipt));
        assert!(!state.is_connected());
    }

    #[test]
    fn test_report_turns_lines_into_batch_with_noop_for_blanks() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "alerts fire downtown").expect("write");
        writeln!(file).expect("write");
        writeln!(file, "weather storm warning").expect("write");
        file.flush().expect("flush");

        let (_state, mut commands) = handler();
        let frames = commands
            .report(file.path().to_str().expect("utf-8 path"))
            .expect("report");

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].header("destination"), Some("/alerts"));
        assert_eq!(frames[0].body, "fire downtown");
        assert!(frames[1].is_noop());
        assert_eq!(frames[2].header("destination"), Some("/weather"));
    }

    #[test]
    fn test_report_missing_file_is_report_error() {
        let (_state, mut commands) = handler();
        let result = commands.report("/definitely/not/here.txt");
        assert!(matches!(result, Err(Error::Report { .. })));
    }
}
