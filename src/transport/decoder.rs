//! Incremental decoder for the chat stream's newline-delimited JSON frames.
//!
//! ```text
//! bytes ──► UTF-8 (partial code points carried) ──► line buffer ──► frame ──► event
//! ```
//!
//! Each complete line is one JSON object tagged by `type`:
//!
//! - `delta`: a text fragment, handed to the caller's callback immediately
//! - `final`: the canonical payload, kept until [`StreamDecoder::finish`]
//! - `error`: aborts decoding with the server's message
//!
//! A line that is not valid JSON is logged and skipped. One bad frame never
//! costs the rest of the stream.

use std::fmt;

use log::{debug, warn};
use serde::Deserialize;

use super::types::ChatResponse;

/// Message used when an `error` frame carries no description.
const DEFAULT_STREAM_ERROR: &str = "Streaming error";

/// A decoded stream frame.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Delta(String),
    Final(ChatResponse),
    Error(String),
}

/// Failures that end decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// The server sent an explicit `error` frame.
    Stream(String),
    /// The body ended without a `final` frame.
    Incomplete,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Stream(msg) => write!(f, "{msg}"),
            DecodeError::Incomplete => write!(f, "Streaming ended without a final message."),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Wire shape of one line. `data` stays untyped until `type` is known.
#[derive(Deserialize, Debug)]
struct Frame {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

/// Parses one trimmed, non-empty line.
///
/// `Ok(None)` means the line was valid but carries no event we act on
/// (an unknown `type`).
fn parse_line(line: &str) -> Result<Option<StreamEvent>, serde_json::Error> {
    let frame: Frame = serde_json::from_str(line)?;
    let event = match frame.kind.as_str() {
        "delta" => {
            let text = match frame.data {
                Some(serde_json::Value::String(text)) => text,
                _ => String::new(),
            };
            Some(StreamEvent::Delta(text))
        }
        "final" => {
            let data = frame.data.unwrap_or(serde_json::Value::Null);
            Some(StreamEvent::Final(serde_json::from_value(data)?))
        }
        "error" => {
            let message = frame
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEFAULT_STREAM_ERROR.to_string());
            Some(StreamEvent::Error(message))
        }
        other => {
            debug!("Ignoring stream frame of type '{}'", other);
            None
        }
    };
    Ok(event)
}

/// Turns arbitrarily split body chunks into stream events.
///
/// Feed every chunk in arrival order, then call [`finish`](Self::finish)
/// once the body is exhausted.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    /// Trailing bytes of an incomplete UTF-8 sequence.
    undecoded: Vec<u8>,
    /// Decoded text not yet terminated by `\n`.
    buffer: String,
    terminal: Option<ChatResponse>,
    deltas: usize,
    warnings: usize,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of delta events emitted so far.
    pub fn deltas(&self) -> usize {
        self.deltas
    }

    /// Number of malformed lines skipped so far.
    pub fn warnings(&self) -> usize {
        self.warnings
    }

    /// Decodes `chunk`, then emits every complete line it finishes.
    pub fn feed<F>(&mut self, chunk: &[u8], on_delta: &mut F) -> Result<(), DecodeError>
    where
        F: FnMut(&str) + ?Sized,
    {
        self.decode_utf8(chunk);
        self.drain_lines(on_delta)
    }

    /// Flushes what is left and returns the terminal payload.
    ///
    /// Residual text goes through the same line extraction as [`feed`](Self::feed),
    /// so a trailing fragment without `\n` is dropped.
    pub fn finish<F>(mut self, on_delta: &mut F) -> Result<ChatResponse, DecodeError>
    where
        F: FnMut(&str) + ?Sized,
    {
        if !self.undecoded.is_empty() {
            let tail = String::from_utf8_lossy(&self.undecoded).into_owned();
            self.buffer.push_str(&tail);
            self.undecoded.clear();
        }
        self.drain_lines(on_delta)?;

        if !self.buffer.trim().is_empty() {
            warn!(
                "Discarding {} bytes of unterminated trailing stream text",
                self.buffer.len()
            );
        }

        debug!(
            "Decoder finished: {} deltas, {} malformed lines",
            self.deltas, self.warnings
        );
        self.terminal.ok_or(DecodeError::Incomplete)
    }

    /// Appends `chunk` to the text buffer, holding back an incomplete
    /// trailing sequence and replacing invalid bytes with U+FFFD.
    fn decode_utf8(&mut self, chunk: &[u8]) {
        self.undecoded.extend_from_slice(chunk);
        let mut consumed = 0;
        loop {
            let rest = &self.undecoded[consumed..];
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    consumed = self.undecoded.len();
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    self.buffer
                        .push_str(&String::from_utf8_lossy(&rest[..valid]));
                    consumed += valid;
                    match e.error_len() {
                        Some(len) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            consumed += len;
                        }
                        // Incomplete sequence at the end: wait for more bytes
                        None => break,
                    }
                }
            }
        }
        self.undecoded.drain(..consumed);
    }

    fn drain_lines<F>(&mut self, on_delta: &mut F) -> Result<(), DecodeError>
    where
        F: FnMut(&str) + ?Sized,
    {
        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match parse_line(line) {
                Ok(Some(StreamEvent::Delta(text))) => {
                    self.deltas += 1;
                    debug!("Delta frame (len={})", text.len());
                    on_delta(&text);
                }
                Ok(Some(StreamEvent::Final(payload))) => {
                    debug!(
                        "Final frame (response len={}, sources={})",
                        payload.response.len(),
                        payload.sources.as_ref().map_or(0, Vec::len)
                    );
                    self.terminal = Some(payload);
                }
                Ok(Some(StreamEvent::Error(message))) => {
                    warn!("Error frame received: {}", message);
                    return Err(DecodeError::Stream(message));
                }
                Ok(None) => {}
                Err(e) => {
                    self.warnings += 1;
                    warn!("Failed to parse stream event: {} (line: {})", e, line);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HAPPY: &str = "{\"type\":\"delta\",\"data\":\"ab\"}\n{\"type\":\"final\",\"data\":{\"response\":\"ab\"}}\n";

    /// Feeds `chunks` in order and returns the deltas plus the finish outcome.
    fn run(chunks: &[&[u8]]) -> (Vec<String>, Result<ChatResponse, DecodeError>) {
        let mut deltas = Vec::new();
        let mut decoder = StreamDecoder::new();
        let mut on_delta = |text: &str| deltas.push(text.to_string());
        for chunk in chunks {
            if let Err(e) = decoder.feed(chunk, &mut on_delta) {
                return (deltas, Err(e));
            }
        }
        let result = decoder.finish(&mut on_delta);
        (deltas, result)
    }

    fn expected_happy() -> ChatResponse {
        ChatResponse {
            response: "ab".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_single_chunk() {
        let (deltas, result) = run(&[HAPPY.as_bytes()]);
        assert_eq!(deltas, vec!["ab"]);
        assert_eq!(result.unwrap(), expected_happy());
    }

    #[test]
    fn test_split_after_fifth_byte() {
        let bytes = HAPPY.as_bytes();
        let (deltas, result) = run(&[&bytes[..5], &bytes[5..]]);
        assert_eq!(deltas, vec!["ab"]);
        assert_eq!(result.unwrap(), expected_happy());
    }

    #[test]
    fn test_split_at_every_offset_is_invariant() {
        let bytes = HAPPY.as_bytes();
        for offset in 0..=bytes.len() {
            let (deltas, result) = run(&[&bytes[..offset], &bytes[offset..]]);
            assert_eq!(deltas, vec!["ab"], "split at {offset}");
            assert_eq!(result.unwrap(), expected_happy(), "split at {offset}");
        }
    }

    #[test]
    fn test_three_way_split_through_delta_sink() {
        use crate::transport::client::DeltaSink;

        let input = "not json\n\n{\"type\":\"delta\",\"data\":\"é👋\"}\n{\"type\":\"delta\",\"data\":\"z\"}\n{\"type\":\"final\",\"data\":{\"response\":\"é👋z\",\"sources\":null}}\n";
        let bytes = input.as_bytes();
        let expected = ChatResponse {
            response: "é👋z".to_string(),
            ..Default::default()
        };
        for i in 0..=bytes.len() {
            for j in i..=bytes.len() {
                let mut deltas = Vec::new();
                let mut collect = |text: &str| deltas.push(text.to_string());
                let sink: &mut DeltaSink<'_> = &mut collect;
                let mut decoder = StreamDecoder::new();
                for chunk in [&bytes[..i], &bytes[i..j], &bytes[j..]] {
                    decoder.feed(chunk, &mut *sink).unwrap();
                }
                assert_eq!(decoder.warnings(), 1, "split at {i}/{j}");
                let result = decoder.finish(&mut *sink).unwrap();
                assert_eq!(deltas, vec!["é👋", "z"], "split at {i}/{j}");
                assert_eq!(result, expected, "split at {i}/{j}");
            }
        }
    }

    #[test]
    fn test_one_byte_at_a_time() {
        let chunks: Vec<&[u8]> = HAPPY.as_bytes().chunks(1).collect();
        let (deltas, result) = run(&chunks);
        assert_eq!(deltas, vec!["ab"]);
        assert_eq!(result.unwrap(), expected_happy());
    }

    #[test]
    fn test_multibyte_characters_split_across_chunks() {
        let input = "{\"type\":\"delta\",\"data\":\"héllo 👋\"}\n{\"type\":\"final\",\"data\":{\"response\":\"héllo 👋\"}}\n";
        let chunks: Vec<&[u8]> = input.as_bytes().chunks(1).collect();
        let (deltas, result) = run(&chunks);
        assert_eq!(deltas, vec!["héllo 👋"]);
        assert_eq!(result.unwrap().response, "héllo 👋");
    }

    #[test]
    fn test_malformed_line_is_skipped() {
        let input = "not json\n{\"type\":\"delta\",\"data\":\"x\"}\n{\"type\":\"final\",\"data\":{\"response\":\"x\"}}\n";
        let mut deltas = Vec::new();
        let mut decoder = StreamDecoder::new();
        decoder
            .feed(input.as_bytes(), &mut |text: &str| deltas.push(text.to_string()))
            .unwrap();
        assert_eq!(decoder.warnings(), 1);
        assert_eq!(decoder.deltas(), 1);
        let payload = decoder.finish(&mut |_: &str| {}).unwrap();
        assert_eq!(deltas, vec!["x"]);
        assert_eq!(payload.response, "x");
    }

    #[test]
    fn test_missing_final_is_incomplete() {
        let (deltas, result) = run(&[&b"{\"type\":\"delta\",\"data\":\"x\"}\n"[..]]);
        assert_eq!(deltas, vec!["x"]);
        assert_eq!(result, Err(DecodeError::Incomplete));
    }

    #[test]
    fn test_error_frame_aborts() {
        let input = b"{\"type\":\"delta\",\"data\":\"x\"}\n{\"type\":\"error\",\"message\":\"boom\"}\n{\"type\":\"final\",\"data\":{\"response\":\"x\"}}\n";
        let (deltas, result) = run(&[&input[..]]);
        assert_eq!(deltas, vec!["x"]);
        assert_eq!(result, Err(DecodeError::Stream("boom".to_string())));
    }

    #[test]
    fn test_error_frame_without_message_uses_default() {
        let (_, result) = run(&[&b"{\"type\":\"error\"}\n"[..]]);
        assert_eq!(result, Err(DecodeError::Stream("Streaming error".to_string())));
    }

    #[test]
    fn test_blank_lines_and_crlf_are_tolerated() {
        let input = b"\n   \r\n{\"type\":\"delta\",\"data\":\"a\"}\r\n\n{\"type\":\"final\",\"data\":{\"response\":\"\"}}\r\n";
        let (deltas, result) = run(&[&input[..]]);
        assert_eq!(deltas, vec!["a"]);
        assert_eq!(result.unwrap().response, "");
    }

    #[test]
    fn test_delta_without_data_is_empty_string() {
        let input = b"{\"type\":\"delta\"}\n{\"type\":\"delta\",\"data\":null}\n{\"type\":\"final\",\"data\":{\"response\":\"\"}}\n";
        let (deltas, result) = run(&[&input[..]]);
        assert_eq!(deltas, vec!["", ""]);
        assert!(result.is_ok());
    }

    #[test]
    fn test_unknown_frame_type_is_ignored_without_warning() {
        let mut decoder = StreamDecoder::new();
        decoder
            .feed(b"{\"type\":\"ping\"}\n", &mut |_: &str| {})
            .unwrap();
        assert_eq!(decoder.warnings(), 0);
        assert_eq!(decoder.deltas(), 0);
    }

    #[test]
    fn test_final_with_unparseable_data_is_a_warning() {
        let mut decoder = StreamDecoder::new();
        decoder
            .feed(b"{\"type\":\"final\",\"data\":\"nope\"}\n", &mut |_: &str| {})
            .unwrap();
        assert_eq!(decoder.warnings(), 1);
        assert_eq!(decoder.finish(&mut |_: &str| {}), Err(DecodeError::Incomplete));
    }

    #[test]
    fn test_unterminated_final_line_is_dropped() {
        let (_, result) = run(&[&b"{\"type\":\"final\",\"data\":{\"response\":\"x\"}}"[..]]);
        assert_eq!(result, Err(DecodeError::Incomplete));
    }

    #[test]
    fn test_invalid_utf8_is_replaced_not_fatal() {
        let mut input = b"{\"type\":\"delta\",\"data\":\"a".to_vec();
        input.push(0xFF);
        input.extend_from_slice(b"b\"}\n{\"type\":\"final\",\"data\":{\"response\":\"ab\"}}\n");
        let (deltas, result) = run(&[&input[..]]);
        assert_eq!(deltas, vec!["a\u{FFFD}b"]);
        assert!(result.is_ok());
    }

    #[test]
    fn test_last_final_wins() {
        let input = b"{\"type\":\"final\",\"data\":{\"response\":\"one\"}}\n{\"type\":\"final\",\"data\":{\"response\":\"two\"}}\n";
        let (_, result) = run(&[&input[..]]);
        assert_eq!(result.unwrap().response, "two");
    }

    #[test]
    fn test_parse_line_classifies_frames() {
        assert_eq!(
            parse_line(r#"{"type":"delta","data":"hi"}"#).unwrap(),
            Some(StreamEvent::Delta("hi".to_string()))
        );
        assert_eq!(
            parse_line(r#"{"type":"error","message":"bad"}"#).unwrap(),
            Some(StreamEvent::Error("bad".to_string()))
        );
        assert!(matches!(
            parse_line(r#"{"type":"final","data":{"response":"r","chunks_used":2}}"#).unwrap(),
            Some(StreamEvent::Final(ChatResponse { chunks_used: Some(2), .. }))
        ));
        assert!(parse_line("[1, 2").is_err());
    }
}
