use serde::{Deserialize, Serialize};

/// Who authored a conversation turn.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One document excerpt the backend used to ground its answer.
/// Every field is nullable on the wire.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Citation {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub chunk_index: Option<i64>,
    #[serde(default)]
    pub score: Option<f64>,
}

/// A `{role, content}` pair sent as conversation history.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HistoryItem {
    pub role: Role,
    pub content: String,
}

/// Request body for both chat endpoints.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<HistoryItem>,
}

/// The canonical payload carried by a `final` stream frame.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ChatResponse {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub sources: Option<Vec<Citation>>,
    #[serde(default)]
    pub chunks_used: Option<u64>,
}

/// Body of the non-streaming `POST /api/chat/<id>` endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ChatReply {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub sources: Vec<Citation>,
    #[serde(default)]
    pub chunks_used: u64,
    #[serde(default)]
    pub chatbot_id: String,
}

impl From<ChatReply> for ChatResponse {
    fn from(reply: ChatReply) -> Self {
        ChatResponse {
            response: reply.response,
            sources: Some(reply.sources),
            chunks_used: Some(reply.chunks_used),
        }
    }
}

/// Body of `GET /api/chat/<id>/health`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct HealthStatus {
    #[serde(default)]
    pub chatbot_id: String,
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub chunks_indexed: u64,
}
