use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Claude,
    Copilot,
}

/// `folder` is the on-disk key (Claude's encoded folder name, or Copilot's
/// workspace hash); `path` is the best-effort human form. Encoding is lossy,
/// so `folder` is always retained for filesystem operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub folder: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_message: Option<String>,
    /// RFC 3339 timestamp of the most recent modification.
    pub last_modified_at: String,
    pub size_bytes: u64,
    pub turn_count: usize,
}
