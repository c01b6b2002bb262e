//! On-disk shape of a VS Code Copilot Chat `chatSessions/<uuid>.json`
//! document. `mapper` converts these into `ctxclone_types::Entry` pairs.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub(crate) struct ChatSessionDocument {
    #[serde(default)]
    pub requests: Vec<ChatRequest>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub(crate) struct ChatRequest {
    pub message: ChatMessage,
    #[serde(default)]
    pub response: Vec<Value>,
    #[serde(default)]
    pub result: Option<ChatResult>,
    #[serde(default, rename = "isCanceled")]
    pub is_canceled: bool,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default, rename = "modelId")]
    pub model_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(untagged)]
pub(crate) enum ChatMessage {
    Text(String),
    Object {
        text: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
}

impl ChatMessage {
    pub fn text(&self) -> &str {
        match self {
            ChatMessage::Text(t) => t,
            ChatMessage::Object { text, .. } => text,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub(crate) struct ChatResult {
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub(crate) struct WorkspaceMeta {
    pub folder: String,
}
