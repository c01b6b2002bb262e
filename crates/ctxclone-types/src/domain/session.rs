//! Canonical session model (C3): the source-agnostic representation produced
//! by the format adapters (C4) and consumed by every other component.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One logical record from a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entry {
    /// Opaque stable id. Absent for Copilot turns, where array index is the id.
    pub uuid: Option<String>,
    pub parent_uuid: Option<String>,
    pub kind: EntryKind,
    /// True if system-injected: excluded from token accounting and content extraction.
    #[serde(default)]
    pub is_meta: bool,
    #[serde(default)]
    pub is_sidechain: bool,
    pub agent_id: Option<String>,
    /// Present for `user`/`assistant` entries; absent for summary/queue-operation entries.
    pub message: Option<Message>,
    pub timestamp: Option<String>,
    pub cwd: Option<String>,
    pub model: Option<String>,
    pub stop_reason: Option<String>,
    pub usage: Option<TokenUsage>,
    /// Source-specific fields not meaningful to the core, retained verbatim
    /// so `serialize` can re-emit them unchanged.
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl Entry {
    /// Invariant: for a `user`/`assistant` entry, `message` must be present.
    pub fn is_well_formed(&self) -> bool {
        match self.kind {
            EntryKind::User | EntryKind::Assistant => self.message.is_some(),
            EntryKind::Summary
            | EntryKind::QueueOperation
            | EntryKind::FileHistorySnapshot
            | EntryKind::Meta => self.message.is_none(),
        }
    }

    /// A turn begins at a non-meta user entry whose first content block is
    /// not a `tool_result` (see Turn identifier, C5).
    pub fn starts_turn(&self) -> bool {
        if self.kind != EntryKind::User || self.is_meta {
            return false;
        }
        match &self.message {
            Some(Message {
                content: MessageContent::Blocks(blocks),
                ..
            }) => !matches!(blocks.first(), Some(ContentBlock::ToolResult { .. })),
            _ => true,
        }
    }

    pub fn text_content(&self) -> Option<String> {
        match &self.message {
            Some(Message {
                content: MessageContent::Text(text),
                ..
            }) => Some(text.clone()),
            Some(Message {
                content: MessageContent::Blocks(blocks),
                ..
            }) => {
                let texts: Vec<&str> = blocks
                    .iter()
                    .filter_map(|b| match b {
                        ContentBlock::Text { text } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect();
                if texts.is_empty() {
                    None
                } else {
                    Some(texts.join("\n"))
                }
            }
            None => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryKind {
    User,
    Assistant,
    Summary,
    QueueOperation,
    FileHistorySnapshot,
    Meta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

/// `message.content` is either a bare string or an ordered sequence of blocks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl MessageContent {
    pub fn blocks(&self) -> Vec<ContentBlock> {
        match self {
            MessageContent::Text(text) => vec![ContentBlock::Text { text: text.clone() }],
            MessageContent::Blocks(blocks) => blocks.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Thinking {
        thinking: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        signature: Option<String>,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        #[serde(default)]
        content: Value,
        #[serde(default)]
        is_error: bool,
    },
}

impl ContentBlock {
    pub fn is_tool(&self) -> bool {
        matches!(self, ContentBlock::ToolUse { .. } | ContentBlock::ToolResult { .. })
    }

    pub fn is_thinking(&self) -> bool {
        matches!(self, ContentBlock::Thinking { .. })
    }

    pub fn is_text(&self) -> bool {
        matches!(self, ContentBlock::Text { .. })
    }

    /// Serialized text form used as input to the compression engine and to
    /// the removal engine's truncation summary.
    pub fn serialized_text(&self) -> String {
        match self {
            ContentBlock::Text { text } => text.clone(),
            ContentBlock::Thinking { thinking, .. } => thinking.clone(),
            ContentBlock::ToolUse { input, .. } => input.to_string(),
            ContentBlock::ToolResult { content, .. } => match content {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenUsage {
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
    #[serde(default)]
    pub cache_creation_input_tokens: u32,
    #[serde(default)]
    pub cache_read_input_tokens: u32,
}

/// The in-memory, source-agnostic representation of one session: an ordered
/// entry array plus enough metadata to locate it back on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CanonicalSession {
    pub session_id: String,
    pub entries: Vec<Entry>,
}

impl CanonicalSession {
    pub fn new(session_id: impl Into<String>, entries: Vec<Entry>) -> Self {
        Self {
            session_id: session_id.into(),
            entries,
        }
    }

    /// First non-meta `cwd` seen across the entries, used to encode the
    /// Claude project folder name.
    pub fn first_cwd(&self) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| !e.is_meta)
            .and_then(|e| e.cwd.as_deref())
    }

    /// Invariant #4: every remaining `tool_result` has a preceding `tool_use`
    /// with a matching id.
    pub fn validate_tool_pairing(&self) -> crate::Result<()> {
        let mut known_tool_use_ids = std::collections::HashSet::new();
        for entry in &self.entries {
            let Some(message) = &entry.message else {
                continue;
            };
            for block in message.content.blocks() {
                match block {
                    ContentBlock::ToolUse { id, .. } => {
                        known_tool_use_ids.insert(id);
                    }
                    ContentBlock::ToolResult { tool_use_id, .. } => {
                        if !known_tool_use_ids.contains(&tool_use_id) {
                            return Err(crate::Error::DanglingToolResult(tool_use_id));
                        }
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_entry(blocks: Vec<ContentBlock>) -> Entry {
        Entry {
            uuid: Some("u1".into()),
            parent_uuid: None,
            kind: EntryKind::User,
            is_meta: false,
            is_sidechain: false,
            agent_id: None,
            message: Some(Message {
                role: Role::User,
                content: MessageContent::Blocks(blocks),
            }),
            timestamp: None,
            cwd: None,
            model: None,
            stop_reason: None,
            usage: None,
            extra: Map::new(),
        }
    }

    #[test]
    fn user_entry_with_text_first_starts_turn() {
        let entry = user_entry(vec![ContentBlock::Text {
            text: "hello".into(),
        }]);
        assert!(entry.starts_turn());
    }

    #[test]
    fn user_entry_with_tool_result_first_does_not_start_turn() {
        let entry = user_entry(vec![ContentBlock::ToolResult {
            tool_use_id: "t1".into(),
            content: Value::String("ok".into()),
            is_error: false,
        }]);
        assert!(!entry.starts_turn());
    }

    #[test]
    fn meta_user_entry_never_starts_turn() {
        let mut entry = user_entry(vec![ContentBlock::Text { text: "hi".into() }]);
        entry.is_meta = true;
        assert!(!entry.starts_turn());
    }

    #[test]
    fn assistant_entry_never_starts_turn() {
        let mut entry = user_entry(vec![ContentBlock::Text { text: "hi".into() }]);
        entry.kind = EntryKind::Assistant;
        assert!(!entry.starts_turn());
    }

    #[test]
    fn well_formed_checks_message_presence() {
        let entry = user_entry(vec![ContentBlock::Text { text: "hi".into() }]);
        assert!(entry.is_well_formed());

        let mut summary = entry.clone();
        summary.kind = EntryKind::Summary;
        summary.message = None;
        assert!(summary.is_well_formed());
    }
}
