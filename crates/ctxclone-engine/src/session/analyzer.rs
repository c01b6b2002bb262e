//! Turn analyzer (C6): per-turn cumulative tokens-by-bucket, and content
//! extraction for display.

use std::collections::HashMap;

use ctxclone_types::{
    tokens::estimate_tokens, CanonicalSession, ContentBlock, EntryKind, Role, TokensByType, Turn,
    ToolBlock, TurnContent,
};

/// Cumulative `TokensByType` through the end of each turn, in turn order.
/// Invariant #1: each bucket is monotonically non-decreasing across turns,
/// and `total == user + assistant + thinking + tool` for every entry.
pub fn cumulative_tokens(session: &CanonicalSession, turns: &[Turn]) -> Vec<TokensByType> {
    let mut running = TokensByType::default();
    let mut out = Vec::with_capacity(turns.len());
    let mut next_turn = 0;

    for (index, entry) in session.entries.iter().enumerate() {
        accumulate_entry(entry, &mut running);

        while next_turn < turns.len() && turns[next_turn].end_index == index {
            out.push(TokensByType::new(
                running.user,
                running.assistant,
                running.thinking,
                running.tool,
            ));
            next_turn += 1;
        }
    }

    out
}

fn accumulate_entry(entry: &ctxclone_types::Entry, running: &mut TokensByType) {
    if entry.is_meta
        || matches!(
            entry.kind,
            EntryKind::Summary | EntryKind::QueueOperation | EntryKind::FileHistorySnapshot | EntryKind::Meta
        )
    {
        return;
    }
    let Some(message) = &entry.message else {
        return;
    };

    for block in message.content.blocks() {
        let tokens = estimate_tokens(&block.serialized_text());
        match block {
            ContentBlock::Thinking { .. } => running.thinking += tokens as u64,
            ContentBlock::ToolUse { .. } | ContentBlock::ToolResult { .. } => {
                running.tool += tokens as u64
            }
            ContentBlock::Text { .. } => match message.role {
                Role::User => running.user += tokens as u64,
                Role::Assistant => running.assistant += tokens as u64,
            },
        }
    }
}

/// `extractTurnContent` (§4.4): the first non-meta user entry's text as the
/// prompt, the assistant text blocks (thinking excluded) as the response,
/// and every tool call/result paired with its tool name.
pub fn extract_turn_content(session: &CanonicalSession, turn: &Turn) -> TurnContent {
    let entries = &session.entries[turn.start_index..=turn.end_index];

    let mut tool_names: HashMap<String, String> = HashMap::new();
    for entry in entries {
        let Some(message) = &entry.message else { continue };
        for block in message.content.blocks() {
            if let ContentBlock::ToolUse { id, name, .. } = block {
                tool_names.insert(id, name);
            }
        }
    }

    let mut user_prompt = String::new();
    let mut assistant_parts = Vec::new();
    let mut thinking_parts = Vec::new();
    let mut tool_blocks = Vec::new();
    let mut tool_results = Vec::new();

    for entry in entries {
        let Some(message) = &entry.message else { continue };
        match entry.kind {
            EntryKind::User if !entry.is_meta && user_prompt.is_empty() => {
                if let Some(text) = entry.text_content() {
                    user_prompt = text;
                }
            }
            _ => {}
        }

        for block in message.content.blocks() {
            match block {
                ContentBlock::Text { text } if entry.kind == EntryKind::Assistant => {
                    assistant_parts.push(text);
                }
                ContentBlock::Thinking { thinking, .. } => thinking_parts.push(thinking),
                ContentBlock::ToolUse { name, input, .. } => {
                    tool_blocks.push(ToolBlock {
                        name,
                        content: input.to_string(),
                    });
                }
                ContentBlock::ToolResult {
                    tool_use_id,
                    content,
                    ..
                } => {
                    let name = tool_names
                        .get(&tool_use_id)
                        .cloned()
                        .unwrap_or_else(|| "unknown".to_string());
                    let serialized = match &content {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    tool_results.push(ToolBlock {
                        name,
                        content: serialized,
                    });
                }
                _ => {}
            }
        }
    }

    TurnContent {
        user_prompt,
        tool_blocks,
        tool_results,
        thinking: if thinking_parts.is_empty() {
            None
        } else {
            Some(thinking_parts.join("\n"))
        },
        assistant_response: assistant_parts.join("\n"),
    }
}
