use serde::Deserialize;
use uuid::Uuid;

/// A typed payload decoded from one stream record's `data` field.
///
/// The `kind` discriminant is open-ended on the wire: a record with an
/// unrecognized kind fails to parse and is skipped by the consumer, so the
/// server can grow new kinds without breaking deployed clients.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StreamingChatMessage {
    /// A fragment of assistant text
    Content { id: String, content: String },
    /// A code block extracted from the reply
    CodeBlock { id: String, code_block: ChatCodeBlock },
    /// A failure the server reported inside the stream
    Error { id: String, error: String },
    /// The server's typed end-of-reply payload. Carries the id of the
    /// persisted assistant message when the server assigns one.
    Done {
        #[serde(default)]
        id: String,
        #[serde(default)]
        message_id: Option<Uuid>,
    },
}

impl StreamingChatMessage {
    /// Record id as sent by the server.
    pub fn id(&self) -> &str {
        match self {
            Self::Content { id, .. }
            | Self::CodeBlock { id, .. }
            | Self::Error { id, .. }
            | Self::Done { id, .. } => id,
        }
    }

    /// Short name of the payload kind, for logging.
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Content { .. } => "content",
            Self::CodeBlock { .. } => "code_block",
            Self::Error { .. } => "error",
            Self::Done { .. } => "done",
        }
    }
}

/// A code block surfaced mid-stream.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatCodeBlock {
    pub language: String,
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Response body of the non-streaming completion endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletion {
    pub message_id: Uuid,
    pub content: String,
    #[serde(default)]
    pub code_blocks: Vec<SavedCodeBlock>,
}

/// Summary of a code block the server filed while handling a reply.
#[derive(Debug, Clone, Deserialize)]
pub struct SavedCodeBlock {
    pub id: String,
    pub language: String,
    #[serde(default)]
    pub description: Option<String>,
}
