//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::config::WidgetOptions;
use crate::transport::{ChatRequest, ChatResponse, ChatTransport, DeltaSink, TransportError};

/// A transport that replays a fixed script instead of talking to a backend.
pub struct ScriptedTransport {
    deltas: Vec<String>,
    outcome: Option<Result<ChatResponse, TransportError>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedTransport {
    pub fn new(deltas: &[&str], outcome: Result<ChatResponse, TransportError>) -> Self {
        Self {
            deltas: deltas.iter().map(|d| d.to_string()).collect(),
            outcome: Some(outcome),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Streams `deltas`, then completes with `response` as the final text.
    pub fn reply(deltas: &[&str], response: &str) -> Self {
        Self::new(
            deltas,
            Ok(ChatResponse {
                response: response.to_string(),
                ..Default::default()
            }),
        )
    }

    /// Never finishes a turn.
    pub fn hanging() -> Self {
        Self {
            deltas: Vec::new(),
            outcome: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request seen so far, oldest first.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn stream_chat(
        &self,
        request: &ChatRequest,
        on_delta: &mut DeltaSink<'_>,
    ) -> Result<ChatResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        for delta in &self.deltas {
            on_delta(delta);
        }
        match &self.outcome {
            Some(outcome) => outcome.clone(),
            None => std::future::pending().await,
        }
    }
}

/// A transport whose exchange panics after one delta.
pub struct PanickingTransport;

#[async_trait]
impl ChatTransport for PanickingTransport {
    fn name(&self) -> &str {
        "panicking"
    }

    async fn stream_chat(
        &self,
        _request: &ChatRequest,
        on_delta: &mut DeltaSink<'_>,
    ) -> Result<ChatResponse, TransportError> {
        on_delta("partial");
        panic!("transport exploded");
    }
}

/// Minimal valid options for a widget under test.
pub fn test_options() -> WidgetOptions {
    WidgetOptions {
        chatbot_id: Some("test-bot".to_string()),
        api_base_url: Some("http://localhost:8000".to_string()),
        ..Default::default()
    }
}
