//! Copilot `request`/`response[]` pairs <-> canonical `Entry` pairs.
//!
//! Each `ChatRequest` becomes exactly one `user` entry followed by one
//! `assistant` entry (§4.1). Canceled requests are retained but marked:
//! since the `Entry` invariant only allows `isMeta` on `user` entries, the
//! cancellation marker lives on the user half as `isMeta` and on the
//! assistant half as an opaque `extra["isCanceled"]` flag.

use ctxclone_types::{ContentBlock, Entry, EntryKind, Message, MessageContent, Role};
use serde_json::{Map, Value};

use super::schema::{ChatMessage, ChatRequest, ChatResult};

pub(crate) fn map_request(request: ChatRequest) -> (Entry, Entry) {
    let (blocks, unmodeled) = response_blocks(&request.response);

    let mut assistant_extra = request
        .result
        .unwrap_or_default()
        .metadata;
    if !unmodeled.is_empty() {
        assistant_extra.insert("unmodeledResponseItems".to_string(), Value::Array(unmodeled));
    }
    if request.is_canceled {
        assistant_extra.insert("isCanceled".to_string(), Value::Bool(true));
    }

    let mut user_extra = request.extra;
    if let ChatMessage::Object { extra, .. } = &request.message {
        if !extra.is_empty() {
            user_extra.insert(
                "message".to_string(),
                Value::Object(extra.clone()),
            );
        }
    }

    let timestamp = request.timestamp.map(|ms| ms.to_string());

    let user = Entry {
        uuid: None,
        parent_uuid: None,
        kind: EntryKind::User,
        is_meta: request.is_canceled,
        is_sidechain: false,
        agent_id: None,
        message: Some(Message {
            role: Role::User,
            content: MessageContent::Text(request.message.text().to_string()),
        }),
        timestamp: timestamp.clone(),
        cwd: None,
        model: None,
        stop_reason: None,
        usage: None,
        extra: user_extra,
    };

    let assistant = Entry {
        uuid: None,
        parent_uuid: None,
        kind: EntryKind::Assistant,
        is_meta: false,
        is_sidechain: false,
        agent_id: None,
        message: Some(Message {
            role: Role::Assistant,
            content: MessageContent::Blocks(blocks),
        }),
        timestamp,
        cwd: None,
        model: request.model_id,
        stop_reason: if request.is_canceled {
            Some("canceled".to_string())
        } else {
            None
        },
        usage: None,
        extra: assistant_extra,
    };

    (user, assistant)
}

/// Splits raw `response[]` items into canonical content blocks and the
/// items we don't understand (kept opaque, re-emitted verbatim on write).
fn response_blocks(items: &[Value]) -> (Vec<ContentBlock>, Vec<Value>) {
    let mut blocks = Vec::new();
    let mut unmodeled = Vec::new();

    for item in items {
        let kind = item.get("kind").and_then(Value::as_str);
        match kind {
            Some("text") | Some("markdownContent") => {
                let text = item
                    .get("value")
                    .or_else(|| item.get("content"))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                blocks.push(ContentBlock::Text { text });
            }
            Some("toolInvocationSerialized") => {
                let Some(tool_call_id) = item.get("toolCallId").and_then(Value::as_str) else {
                    unmodeled.push(item.clone());
                    continue;
                };
                let name = item
                    .get("toolName")
                    .or_else(|| item.get("invocationMessage"))
                    .and_then(Value::as_str)
                    .unwrap_or("tool")
                    .to_string();
                let input = item.get("toolSpecificData").cloned().unwrap_or(Value::Null);
                blocks.push(ContentBlock::ToolUse {
                    id: tool_call_id.to_string(),
                    name,
                    input,
                });
                if let Some(result_details) = item.get("resultDetails") {
                    let is_error = item
                        .get("isError")
                        .and_then(Value::as_bool)
                        .unwrap_or(false);
                    blocks.push(ContentBlock::ToolResult {
                        tool_use_id: tool_call_id.to_string(),
                        content: result_details.clone(),
                        is_error,
                    });
                }
            }
            _ => unmodeled.push(item.clone()),
        }
    }

    (blocks, unmodeled)
}

/// Reverse of `map_request`. `assistant` is `None` when a user entry has no
/// paired assistant entry left (e.g. truncated mid-turn).
pub(crate) fn unmap_pair(user: &Entry, assistant: Option<&Entry>) -> ChatRequest {
    let message_text = user.text_content().unwrap_or_default();
    let mut user_extra = user.extra.clone();
    let message = match user_extra.remove("message") {
        Some(Value::Object(extra)) => ChatMessage::Object {
            text: message_text,
            extra,
        },
        _ => ChatMessage::Text(message_text),
    };

    let mut response = Vec::new();
    let mut result = ChatResult::default();
    let mut model_id = None;
    let mut is_canceled = user.is_meta;

    if let Some(assistant) = assistant {
        response = render_response_items(assistant);
        let mut metadata = assistant.extra.clone();
        if let Some(Value::Bool(true)) = metadata.remove("isCanceled") {
            is_canceled = true;
        }
        metadata.remove("unmodeledResponseItems");
        result = ChatResult { metadata };
        model_id = assistant.model.clone();
    }

    ChatRequest {
        message,
        response,
        result: Some(result),
        is_canceled,
        timestamp: user
            .timestamp
            .as_deref()
            .and_then(|s| s.parse::<i64>().ok()),
        model_id,
        extra: user_extra,
    }
}

fn render_response_items(assistant: &Entry) -> Vec<Value> {
    let mut items: Vec<Value> = Vec::new();
    let Some(message) = &assistant.message else {
        return items;
    };

    for block in message.content.blocks() {
        match block {
            ContentBlock::Text { text } => {
                let mut obj = Map::new();
                obj.insert("kind".to_string(), Value::String("markdownContent".to_string()));
                obj.insert("value".to_string(), Value::String(text));
                items.push(Value::Object(obj));
            }
            ContentBlock::ToolUse { id, name, input } => {
                let mut obj = Map::new();
                obj.insert(
                    "kind".to_string(),
                    Value::String("toolInvocationSerialized".to_string()),
                );
                obj.insert("toolCallId".to_string(), Value::String(id));
                obj.insert("toolName".to_string(), Value::String(name));
                obj.insert("toolSpecificData".to_string(), input);
                items.push(Value::Object(obj));
            }
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => {
                if let Some(Value::Object(obj)) = items.iter_mut().rev().find(|v| {
                    v.get("kind").and_then(Value::as_str) == Some("toolInvocationSerialized")
                        && v.get("toolCallId").and_then(Value::as_str) == Some(tool_use_id.as_str())
                }) {
                    obj.insert("resultDetails".to_string(), content);
                    obj.insert("isError".to_string(), Value::Bool(is_error));
                }
            }
            ContentBlock::Thinking { .. } => {}
        }
    }

    if let Some(Value::Array(unmodeled)) = assistant.extra.get("unmodeledResponseItems") {
        items.extend(unmodeled.iter().cloned());
    }

    items
}
