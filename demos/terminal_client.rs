//! Interactive terminal client over the frame pipeline.
//!
//! Demonstrates:
//! - Wiring `StompState` and `StompCommands` into a `Session`
//! - Driving the producer loop from stdin
//! - Reporting why the session ended
//!
//! Usage:
//!   cargo run --example terminal_client
//!   cargo run --example terminal_client -- --debug
//!
//! Commands once running:
//!   login <host:port> <user> <pass>
//!   join <destination> / exit <destination>
//!   send <destination> <body>
//!   report <path>
//!   logout

// ============================================================================
// Imports
// ============================================================================

use std::io;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use stomp_pipeline::{Session, StompCommands, StompState};

// ============================================================================
// Logging
// ============================================================================

/// Initialize tracing/logging.
fn init_logging(debug: bool) {
    let filter = if debug {
        "stomp_pipeline=debug"
    } else {
        "stomp_pipeline=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

// ============================================================================
// Main
// ============================================================================

fn main() -> anyhow::Result<()> {
    let debug = std::env::args().any(|a| a == "--debug");
    init_logging(debug);

    let state = Arc::new(StompState::new());
    state.set_message_sink(Box::new(|frame| {
        println!(
            "[{}] {}",
            frame.header("destination").unwrap_or("?"),
            frame.body
        );
    }));

    let commands = StompCommands::new(Arc::clone(&state));
    let handle = Session::spawn(state, commands, io::BufReader::new(io::stdin()))
        .context("failed to spawn session threads")?;

    handle
        .join_result()
        .context("session ended with a transport failure")?;
    println!("Session closed.");
    Ok(())
}
