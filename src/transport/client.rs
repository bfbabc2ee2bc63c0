//! HTTP client for the chatbot backend.
//!
//! Endpoints, all relative to the configured base URL:
//!
//! - `POST /api/chat/<id>/stream`: newline-delimited JSON frames (the widget's path)
//! - `POST /api/chat/<id>`: one JSON reply
//! - `GET  /api/chat/<id>/health`: readiness of the chatbot's index

use std::fmt;

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{StatusCode, Url};
use serde::Serialize;

use super::decoder::{DecodeError, StreamDecoder};
use super::types::{ChatReply, ChatRequest, ChatResponse, HealthStatus};

/// Errors that end a chat exchange.
///
/// `Display` renders the user-facing reason; the widget shows it after
/// its failure prefix.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportError {
    /// Endpoint could not be built from the configuration.
    Config(String),
    /// Connection-level failure (DNS, refused, reset mid-body).
    Network(String),
    /// Non-success status. `message` is the body text, or `HTTP <status>`.
    Http { status: u16, message: String },
    /// The response carries no body that can be read incrementally.
    StreamingUnsupported,
    /// The server sent an explicit `error` frame.
    Stream(String),
    /// The body ended without a `final` frame.
    Incomplete,
    /// A non-streaming endpoint returned a body we could not parse.
    Decode(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Config(msg) => write!(f, "config error: {msg}"),
            TransportError::Network(msg) => write!(f, "{msg}"),
            TransportError::Http { message, .. } => write!(f, "{message}"),
            TransportError::StreamingUnsupported => {
                write!(f, "Streaming response body is not supported by this client.")
            }
            TransportError::Stream(msg) => write!(f, "{msg}"),
            TransportError::Incomplete => write!(f, "{}", DecodeError::Incomplete),
            TransportError::Decode(msg) => write!(f, "invalid response body: {msg}"),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<DecodeError> for TransportError {
    fn from(e: DecodeError) -> Self {
        match e {
            DecodeError::Stream(msg) => TransportError::Stream(msg),
            DecodeError::Incomplete => TransportError::Incomplete,
        }
    }
}

/// Where one chatbot's endpoints live.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    base: Url,
    chatbot_id: String,
}

impl Endpoint {
    /// Validates `api_base_url`. One trailing slash is tolerated.
    pub fn new(api_base_url: &str, chatbot_id: &str) -> Result<Self, TransportError> {
        let base = Url::parse(api_base_url)
            .map_err(|e| TransportError::Config(format!("invalid API base URL '{api_base_url}': {e}")))?;
        if base.cannot_be_a_base() {
            return Err(TransportError::Config(format!(
                "API base URL '{api_base_url}' cannot carry a path"
            )));
        }
        Ok(Self {
            base,
            chatbot_id: chatbot_id.to_string(),
        })
    }

    pub fn chatbot_id(&self) -> &str {
        &self.chatbot_id
    }

    /// `<base>/api/chat/<id>/stream`
    pub fn stream_url(&self) -> Url {
        self.url(&["stream"])
    }

    /// `<base>/api/chat/<id>`
    pub fn chat_url(&self) -> Url {
        self.url(&[])
    }

    /// `<base>/api/chat/<id>/health`
    pub fn health_url(&self) -> Url {
        self.url(&["health"])
    }

    /// Appends path segments; the chatbot id is percent-encoded as one segment.
    fn url(&self, tail: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["api", "chat"])
                .push(&self.chatbot_id)
                .extend(tail);
        }
        url
    }
}

/// Receives delta text as it arrives.
pub type DeltaSink<'a> = dyn for<'s> FnMut(&'s str) + Send + 'a;

/// The seam between the widget controller and the network.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Returns the name of the transport, for logs.
    fn name(&self) -> &str;

    /// Runs one streamed exchange.
    ///
    /// `on_delta` is called synchronously, in wire order, for every delta
    /// frame. Returns the `final` payload once the body is exhausted.
    async fn stream_chat(
        &self,
        request: &ChatRequest,
        on_delta: &mut DeltaSink<'_>,
    ) -> Result<ChatResponse, TransportError>;
}

/// [`ChatTransport`] over reqwest.
pub struct HttpTransport {
    endpoint: Endpoint,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            client: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Non-streaming exchange against `POST /api/chat/<id>`.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, TransportError> {
        let response = self.post_json(self.endpoint.chat_url(), request).await?;
        response
            .json::<ChatReply>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }

    /// Reports whether the chatbot has indexed content to answer from.
    pub async fn health(&self) -> Result<HealthStatus, TransportError> {
        let url = self.endpoint.health_url();
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let response = check_status(response).await?;
        response
            .json::<HealthStatus>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &T,
    ) -> Result<reqwest::Response, TransportError> {
        debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        debug!("Chat backend response status: {}", response.status());
        check_status(response).await
    }
}

/// Turns a non-success response into [`TransportError::Http`].
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    warn!("Chat backend error: {} - {}", status, body);
    let message = if body.is_empty() {
        format!("HTTP {status}")
    } else {
        body
    };
    Err(TransportError::Http { status, message })
}

#[async_trait]
impl ChatTransport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    async fn stream_chat(
        &self,
        request: &ChatRequest,
        on_delta: &mut DeltaSink<'_>,
    ) -> Result<ChatResponse, TransportError> {
        info!(
            "Chat stream request: chatbot={}, message_len={}, history_count={}",
            self.endpoint.chatbot_id(),
            request.message.len(),
            request.history.len()
        );

        let mut response = self.post_json(self.endpoint.stream_url(), request).await?;

        if matches!(
            response.status(),
            StatusCode::NO_CONTENT | StatusCode::RESET_CONTENT
        ) {
            warn!("Chat backend answered {} with no body", response.status());
            return Err(TransportError::StreamingUnsupported);
        }

        let mut decoder = StreamDecoder::new();
        let mut chunk_count = 0usize;
        let mut total_bytes = 0usize;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?
        {
            chunk_count += 1;
            total_bytes += chunk.len();
            debug!("Raw chunk received: {} bytes", chunk.len());
            decoder.feed(&chunk, &mut *on_delta)?;
        }

        let deltas = decoder.deltas();
        let warnings = decoder.warnings();
        let payload = decoder.finish(&mut *on_delta)?;
        info!(
            "Stream complete: {} chunks, {} bytes, {} deltas, {} malformed lines",
            chunk_count, total_bytes, deltas, warnings
        );
        Ok(payload)
    }
}
