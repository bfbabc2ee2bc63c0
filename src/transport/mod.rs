//! # Transport
//!
//! Everything that touches the chat backend: wire types, the incremental
//! stream decoder, and the HTTP client behind the [`ChatTransport`] seam.

pub mod client;
pub mod decoder;
pub mod types;

pub use client::{ChatTransport, DeltaSink, Endpoint, HttpTransport, TransportError};
pub use decoder::{DecodeError, StreamDecoder, StreamEvent};
pub use types::{ChatReply, ChatRequest, ChatResponse, Citation, HealthStatus, HistoryItem, Role};
