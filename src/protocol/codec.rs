//! Text codec between [`Frame`] and its wire representation.
//!
//! # Wire Format
//!
//! ```text
//! COMMAND\n
//! key:value\n
//! ...\n
//! \n
//! optional body\0
//! ```
//!
//! A command line, zero or more `key:value` header lines, a blank line, an
//! optional body, and a NUL terminator. The rest of the crate treats this
//! module as an opaque pair of transforms: [`encode`] and [`decode`].

// ============================================================================
// Imports
// ============================================================================

use crate::error::{Error, Result};

use super::Frame;

// ============================================================================
// Constants
// ============================================================================

/// Frame terminator byte on the wire.
pub const FRAME_TERMINATOR: char = '\0';

// ============================================================================
// Encode
// ============================================================================

/// Encodes a frame into its wire text, including the NUL terminator.
#[must_use]
pub fn encode(frame: &Frame) -> String {
    let mut text = String::with_capacity(
        frame.command.len() + frame.body.len() + frame.headers.len() * 16 + 4,
    );

    text.push_str(&frame.command);
    text.push('\n');

    for (key, value) in &frame.headers {
        text.push_str(key);
        text.push(':');
        text.push_str(value);
        text.push('\n');
    }

    text.push('\n');
    text.push_str(&frame.body);
    text.push(FRAME_TERMINATOR);
    text
}

// ============================================================================
// Decode
// ============================================================================

/// Decodes wire text into a frame.
///
/// Tolerates a missing or present trailing NUL. The command is the first
/// line; header lines split at the first `:`; everything after the blank
/// line is the body.
///
/// # Errors
///
/// Returns [`Error::Codec`] if the text is empty or a header line has no
/// `:` separator.
pub fn decode(text: &str) -> Result<Frame> {
    let text = text.strip_suffix(FRAME_TERMINATOR).unwrap_or(text);

    let mut lines = text.split('\n');
    let command = lines
        .next()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| Error::codec("empty frame text"))?;

    let mut frame = Frame::new(command);

    for line in lines.by_ref() {
        if line.is_empty() {
            // Blank line: headers end, body begins.
            break;
        }
        let (key, value) = line
            .split_once(':')
            .ok_or_else(|| Error::codec(format!("header line without ':': {line}")))?;
        frame.headers.push((key.to_string(), value.to_string()));
    }

    frame.body = lines.collect::<Vec<_>>().join("\n");
    Ok(frame)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_format() {
        let frame = Frame::new("CONNECT")
            .with_header("accept-version", "1.2")
            .with_header("host", "stomp.example");

        let text = encode(&frame);
        assert_eq!(text, "CONNECT\naccept-version:1.2\nhost:stomp.example\n\n\0");
    }

    #[test]
    fn test_encode_with_body() {
        let frame = Frame::new("SEND")
            .with_header("destination", "/topic/a")
            .with_body("line one\nline two");

        let text = encode(&frame);
        assert_eq!(text, "SEND\ndestination:/topic/a\n\nline one\nline two\0");
    }

    #[test]
    fn test_decode_roundtrip() {
        let frame = Frame::new("MESSAGE")
            .with_header("subscription", "3")
            .with_header("destination", "/topic/a")
            .with_body("payload");

        let decoded = decode(&encode(&frame)).expect("decode");
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_decode_without_trailing_nul() {
        let decoded = decode("RECEIPT\nreceipt-id:42\n\n").expect("decode");
        assert_eq!(decoded.command, "RECEIPT");
        assert_eq!(decoded.header("receipt-id"), Some("42"));
        assert_eq!(decoded.body, "");
    }

    #[test]
    fn test_decode_header_value_with_colon() {
        let decoded = decode("ERROR\nmessage:bad frame: unknown command\n\n\0").expect("decode");
        assert_eq!(decoded.header("message"), Some("bad frame: unknown command"));
    }

    #[test]
    fn test_decode_empty_text_is_error() {
        assert!(decode("").is_err());
        assert!(decode("\0").is_err());
    }

    #[test]
    fn test_decode_malformed_header_is_error() {
        let result = decode("CONNECTED\nversion 1.2\n\n\0");
        assert!(matches!(result, Err(Error::Codec { .. })));
    }

    #[test]
    fn test_decode_multiline_body() {
        let decoded = decode("SEND\ndestination:/a\n\nfirst\nsecond\0").expect("decode");
        assert_eq!(decoded.body, "first\nsecond");
    }
}
