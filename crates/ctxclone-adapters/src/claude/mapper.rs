//! Claude wire records <-> canonical `Entry`. Kept lossless: every field the
//! schema doesn't model by name lands in `Entry::extra` and is re-emitted by
//! `unmap_entry` unchanged.

use ctxclone_types::{ContentBlock, Entry, EntryKind, Message, MessageContent, Role, TokenUsage};
use serde_json::{Map, Value};

use super::schema::{
    AssistantContent, AssistantRecord, ClaudeRecord, OpaqueRecord, SummaryRecord, TokenUsage as WireTokenUsage,
    UserContent, UserRecord,
};

pub(crate) fn map_record(record: ClaudeRecord) -> Option<Entry> {
    match record {
        ClaudeRecord::User(user) => Some(map_user(user)),
        ClaudeRecord::Assistant(asst) => Some(map_assistant(asst)),
        ClaudeRecord::Summary(summary) => Some(map_summary(summary)),
        ClaudeRecord::FileHistorySnapshot(opaque) => {
            Some(map_opaque(EntryKind::FileHistorySnapshot, opaque))
        }
        ClaudeRecord::QueueOperation(opaque) => Some(map_opaque(EntryKind::QueueOperation, opaque)),
        ClaudeRecord::Unknown => None,
    }
}

fn map_user(user: UserRecord) -> Entry {
    let blocks: Vec<ContentBlock> = user
        .message
        .content
        .into_iter()
        .map(|c| match c {
            UserContent::Text { text } => ContentBlock::Text { text },
            UserContent::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            },
            UserContent::Unknown => ContentBlock::Text {
                text: String::new(),
            },
        })
        .collect();

    Entry {
        uuid: Some(user.uuid),
        parent_uuid: user.parent_uuid,
        kind: EntryKind::User,
        is_meta: user.is_meta,
        is_sidechain: user.is_sidechain,
        agent_id: user.agent_id,
        message: Some(Message {
            role: Role::User,
            content: MessageContent::Blocks(blocks),
        }),
        timestamp: Some(user.timestamp),
        cwd: user.cwd,
        model: None,
        stop_reason: None,
        usage: None,
        extra: user.extra,
    }
}

fn map_assistant(asst: AssistantRecord) -> Entry {
    let blocks: Vec<ContentBlock> = asst
        .message
        .content
        .into_iter()
        .map(|c| match c {
            AssistantContent::Text { text } => ContentBlock::Text { text },
            AssistantContent::Thinking { thinking, signature } => {
                ContentBlock::Thinking { thinking, signature }
            }
            AssistantContent::ToolUse { id, name, input } => {
                ContentBlock::ToolUse { id, name, input }
            }
            AssistantContent::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            },
            AssistantContent::Unknown => ContentBlock::Text {
                text: String::new(),
            },
        })
        .collect();

    Entry {
        uuid: Some(asst.uuid),
        parent_uuid: asst.parent_uuid,
        kind: EntryKind::Assistant,
        is_meta: false,
        is_sidechain: asst.is_sidechain,
        agent_id: asst.agent_id,
        message: Some(Message {
            role: Role::Assistant,
            content: MessageContent::Blocks(blocks),
        }),
        timestamp: Some(asst.timestamp),
        cwd: asst.cwd,
        model: Some(asst.message.model),
        stop_reason: asst.message.stop_reason,
        usage: asst.message.usage.map(map_usage),
        extra: asst.extra,
    }
}

fn map_usage(usage: WireTokenUsage) -> TokenUsage {
    TokenUsage {
        input_tokens: usage.input_tokens,
        output_tokens: usage.output_tokens,
        cache_creation_input_tokens: usage.cache_creation_input_tokens,
        cache_read_input_tokens: usage.cache_read_input_tokens,
    }
}

fn map_summary(summary: SummaryRecord) -> Entry {
    let mut extra = summary.extra;
    extra.insert("summary".to_string(), Value::String(summary.summary));
    if let Some(leaf_uuid) = summary.leaf_uuid {
        extra.insert("leafUuid".to_string(), Value::String(leaf_uuid));
    }
    empty_entry(EntryKind::Summary, extra)
}

fn map_opaque(kind: EntryKind, opaque: OpaqueRecord) -> Entry {
    empty_entry(kind, opaque.fields)
}

fn empty_entry(kind: EntryKind, extra: Map<String, Value>) -> Entry {
    Entry {
        uuid: None,
        parent_uuid: None,
        kind,
        is_meta: false,
        is_sidechain: false,
        agent_id: None,
        message: None,
        timestamp: None,
        cwd: None,
        model: None,
        stop_reason: None,
        usage: None,
        extra,
    }
}

/// Reverse of `map_record`: turns a canonical `Entry` back into a wire
/// record, suitable for re-serialization as one JSONL line.
pub(crate) fn unmap_entry(entry: &Entry, session_id: &str) -> Option<ClaudeRecord> {
    match entry.kind {
        EntryKind::User => Some(ClaudeRecord::User(unmap_user(entry, session_id)?)),
        EntryKind::Assistant => Some(ClaudeRecord::Assistant(unmap_assistant(entry, session_id)?)),
        EntryKind::Summary => Some(ClaudeRecord::Summary(unmap_summary(entry))),
        EntryKind::FileHistorySnapshot => Some(ClaudeRecord::FileHistorySnapshot(OpaqueRecord {
            fields: entry.extra.clone(),
        })),
        EntryKind::QueueOperation => Some(ClaudeRecord::QueueOperation(OpaqueRecord {
            fields: entry.extra.clone(),
        })),
        EntryKind::Meta => None,
    }
}

fn unmap_user(entry: &Entry, session_id: &str) -> Option<UserRecord> {
    let message = entry.message.as_ref()?;
    let content = message
        .content
        .blocks()
        .into_iter()
        .map(|b| match b {
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => UserContent::ToolResult {
                tool_use_id,
                content,
                is_error,
            },
            other => UserContent::Text {
                text: other.serialized_text(),
            },
        })
        .collect();

    Some(UserRecord {
        uuid: entry.uuid.clone()?,
        parent_uuid: entry.parent_uuid.clone(),
        session_id: session_id.to_string(),
        timestamp: entry.timestamp.clone().unwrap_or_default(),
        message: super::schema::UserMessage {
            role: "user".to_string(),
            content,
        },
        is_sidechain: entry.is_sidechain,
        is_meta: entry.is_meta,
        agent_id: entry.agent_id.clone(),
        cwd: entry.cwd.clone(),
        extra: entry.extra.clone(),
    })
}

fn unmap_assistant(entry: &Entry, session_id: &str) -> Option<AssistantRecord> {
    let message = entry.message.as_ref()?;
    let content = message
        .content
        .blocks()
        .into_iter()
        .map(|b| match b {
            ContentBlock::Text { text } => AssistantContent::Text { text },
            ContentBlock::Thinking { thinking, signature } => {
                AssistantContent::Thinking { thinking, signature }
            }
            ContentBlock::ToolUse { id, name, input } => {
                AssistantContent::ToolUse { id, name, input }
            }
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => AssistantContent::ToolResult {
                tool_use_id,
                content,
                is_error,
            },
        })
        .collect();

    Some(AssistantRecord {
        uuid: entry.uuid.clone()?,
        parent_uuid: entry.parent_uuid.clone(),
        session_id: session_id.to_string(),
        timestamp: entry.timestamp.clone().unwrap_or_default(),
        message: super::schema::AssistantMessage {
            role: "assistant".to_string(),
            model: entry.model.clone().unwrap_or_default(),
            content,
            stop_reason: entry.stop_reason.clone(),
            usage: entry.usage.map(|u| WireTokenUsage {
                input_tokens: u.input_tokens,
                output_tokens: u.output_tokens,
                cache_creation_input_tokens: u.cache_creation_input_tokens,
                cache_read_input_tokens: u.cache_read_input_tokens,
            }),
        },
        is_sidechain: entry.is_sidechain,
        agent_id: entry.agent_id.clone(),
        cwd: entry.cwd.clone(),
        extra: entry.extra.clone(),
    })
}

fn unmap_summary(entry: &Entry) -> SummaryRecord {
    let mut extra = entry.extra.clone();
    let summary = extra
        .remove("summary")
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    let leaf_uuid = extra
        .remove("leafUuid")
        .and_then(|v| v.as_str().map(str::to_string));
    SummaryRecord {
        summary,
        leaf_uuid,
        extra,
    }
}
