//! Removal engine (C7): positional tool-call and thinking-block removal or
//! truncation.

use std::collections::HashSet;

use ctxclone_types::{CanonicalSession, ContentBlock, Entry, EntryKind, MessageContent};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolHandlingMode {
    Remove,
    Truncate,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RemovalOptions {
    pub tool_removal_percent: u8,
    pub tool_handling_mode: ToolHandlingModeOrDefault,
    pub thinking_removal_percent: u8,
}

/// `ToolHandlingMode` has no natural zero value; this newtype gives
/// `RemovalOptions` a `Default` (`remove`, matching the conservative choice)
/// without faking a meaning for "no mode".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolHandlingModeOrDefault(pub ToolHandlingMode);

impl Default for ToolHandlingModeOrDefault {
    fn default() -> Self {
        Self(ToolHandlingMode::Remove)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RemovalStats {
    pub tool_calls_removed: usize,
    pub tool_calls_truncated: usize,
    pub thinking_blocks_removed: usize,
}

/// Applies §4.3: removes or truncates the oldest `toolRemoval`% of tool
/// call pairs, then the oldest `thinkingRemoval`% of thinking blocks.
/// Returns a new session; the original is left untouched.
pub fn apply_removals(session: &CanonicalSession, options: RemovalOptions) -> (CanonicalSession, RemovalStats) {
    let tool_use_order = ordered_tool_use_ids(session);
    let remove_ids: HashSet<String> = oldest_fraction(&tool_use_order, options.tool_removal_percent)
        .into_iter()
        .collect();

    let thinking_positions = ordered_thinking_positions(session);
    let truncate_thinking: HashSet<(usize, usize)> =
        oldest_fraction(&thinking_positions, options.thinking_removal_percent)
            .into_iter()
            .collect();

    let mut stats = RemovalStats::default();
    let mut entries = Vec::with_capacity(session.entries.len());

    for (entry_index, entry) in session.entries.iter().enumerate() {
        entries.push(transform_entry(
            entry,
            entry_index,
            &remove_ids,
            options.tool_handling_mode.0,
            &truncate_thinking,
            &mut stats,
        ));
    }

    (CanonicalSession::new(session.session_id.clone(), entries), stats)
}

fn transform_entry(
    entry: &Entry,
    entry_index: usize,
    remove_ids: &HashSet<String>,
    mode: ToolHandlingMode,
    remove_thinking: &HashSet<(usize, usize)>,
    stats: &mut RemovalStats,
) -> Entry {
    let mut entry = entry.clone();
    let Some(message) = &mut entry.message else {
        return entry;
    };
    let MessageContent::Blocks(blocks) = &mut message.content else {
        return entry;
    };

    let mut kept = Vec::with_capacity(blocks.len());
    for (block_index, block) in std::mem::take(blocks).into_iter().enumerate() {
        match block {
            ContentBlock::ToolUse { id, name, input } if remove_ids.contains(&id) => {
                match mode {
                    ToolHandlingMode::Remove => {
                        stats.tool_calls_removed += 1;
                    }
                    ToolHandlingMode::Truncate => {
                        stats.tool_calls_truncated += 1;
                        kept.push(ContentBlock::ToolUse {
                            id,
                            name,
                            input: truncate_value(&input),
                        });
                    }
                }
            }
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            } if remove_ids.contains(&tool_use_id) => match mode {
                ToolHandlingMode::Remove => {}
                ToolHandlingMode::Truncate => {
                    kept.push(ContentBlock::ToolResult {
                        tool_use_id,
                        content: truncate_value(&content),
                        is_error,
                    });
                }
            },
            ContentBlock::Thinking { thinking, signature }
                if remove_thinking.contains(&(entry_index, block_index)) =>
            {
                stats.thinking_blocks_removed += 1;
                let _ = (thinking, signature);
            }
            other => kept.push(other),
        }
    }
    *blocks = kept;

    entry
}

/// `tool_use` ids in the order their entry first appears, deduplicated.
fn ordered_tool_use_ids(session: &CanonicalSession) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for entry in &session.entries {
        let Some(message) = &entry.message else { continue };
        for block in message.content.blocks() {
            if let ContentBlock::ToolUse { id, .. } = block {
                if seen.insert(id.clone()) {
                    ids.push(id);
                }
            }
        }
    }
    ids
}

/// `(entryIndex, blockIndex)` for every thinking block, in entry order.
fn ordered_thinking_positions(session: &CanonicalSession) -> Vec<(usize, usize)> {
    let mut positions = Vec::new();
    for (entry_index, entry) in session.entries.iter().enumerate() {
        let Some(message) = &entry.message else { continue };
        if entry.kind != EntryKind::Assistant {
            continue;
        }
        for (block_index, block) in message.content.blocks().iter().enumerate() {
            if block.is_thinking() {
                positions.push((entry_index, block_index));
            }
        }
    }
    positions
}

fn oldest_fraction<T: Clone>(items: &[T], percent: u8) -> Vec<T> {
    if items.is_empty() || percent == 0 {
        return Vec::new();
    }
    let percent = percent.min(100) as f64;
    let count = ((items.len() as f64) * (percent / 100.0)).round() as usize;
    items[..count.min(items.len())].to_vec()
}

/// First 3 lines plus an ellipsis marker; unchanged if already short.
fn truncate_value(value: &Value) -> Value {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    Value::String(truncate_text(&text))
}

pub fn truncate_text(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= 3 {
        return text.to_string();
    }
    let head = lines[..3].join("\n");
    let remaining = lines.len() - 3;
    format!("{head}\n… [{remaining} more lines truncated]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctxclone_types::{Message, Role};
    use serde_json::{json, Map};

    fn user(text: &str) -> Entry {
        Entry {
            uuid: None,
            parent_uuid: None,
            kind: EntryKind::User,
            is_meta: false,
            is_sidechain: false,
            agent_id: None,
            message: Some(Message {
                role: Role::User,
                content: MessageContent::Blocks(vec![ContentBlock::Text { text: text.into() }]),
            }),
            timestamp: None,
            cwd: None,
            model: None,
            stop_reason: None,
            usage: None,
            extra: Map::new(),
        }
    }

    fn assistant_with_tool(id: &str) -> Entry {
        Entry {
            uuid: None,
            parent_uuid: None,
            kind: EntryKind::Assistant,
            is_meta: false,
            is_sidechain: false,
            agent_id: None,
            message: Some(Message {
                role: Role::Assistant,
                content: MessageContent::Blocks(vec![ContentBlock::ToolUse {
                    id: id.into(),
                    name: "Read".into(),
                    input: json!({"path": "a.rs"}),
                }]),
            }),
            timestamp: None,
            cwd: None,
            model: None,
            stop_reason: None,
            usage: None,
            extra: Map::new(),
        }
    }

    fn tool_result(id: &str) -> Entry {
        Entry {
            uuid: None,
            parent_uuid: None,
            kind: EntryKind::User,
            is_meta: false,
            is_sidechain: false,
            agent_id: None,
            message: Some(Message {
                role: Role::User,
                content: MessageContent::Blocks(vec![ContentBlock::ToolResult {
                    tool_use_id: id.into(),
                    content: json!("file contents"),
                    is_error: false,
                }]),
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
    fn full_removal_strips_both_tool_use_and_tool_result() {
        let session = CanonicalSession::new(
            "s1",
            vec![user("do it"), assistant_with_tool("t1"), tool_result("t1")],
        );
        let (cloned, stats) = apply_removals(
            &session,
            RemovalOptions {
                tool_removal_percent: 100,
                tool_handling_mode: ToolHandlingModeOrDefault(ToolHandlingMode::Remove),
                thinking_removal_percent: 0,
            },
        );
        assert_eq!(stats.tool_calls_removed, 1);
        cloned.validate_tool_pairing().unwrap();
        assert!(cloned.entries[1].message.as_ref().unwrap().content.blocks().is_empty());
        assert!(cloned.entries[2].message.as_ref().unwrap().content.blocks().is_empty());
    }

    #[test]
    fn truncate_mode_keeps_blocks_but_shortens_content() {
        let long_input = json!({"path": "a.rs", "body": "1\n2\n3\n4\n5"});
        let session = CanonicalSession::new(
            "s1",
            vec![
                user("do it"),
                Entry {
                    message: Some(Message {
                        role: Role::Assistant,
                        content: MessageContent::Blocks(vec![ContentBlock::ToolUse {
                            id: "t1".into(),
                            name: "Read".into(),
                            input: long_input,
                        }]),
                    }),
                    ..assistant_with_tool("t1")
                },
            ],
        );
        let (cloned, stats) = apply_removals(
            &session,
            RemovalOptions {
                tool_removal_percent: 100,
                tool_handling_mode: ToolHandlingModeOrDefault(ToolHandlingMode::Truncate),
                thinking_removal_percent: 0,
            },
        );
        assert_eq!(stats.tool_calls_truncated, 1);
        let blocks = cloned.entries[1].message.as_ref().unwrap().content.blocks();
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn oldest_thinking_blocks_are_removed_first() {
        let thinking_entry = |t: &str| Entry {
            message: Some(Message {
                role: Role::Assistant,
                content: MessageContent::Blocks(vec![
                    ContentBlock::Thinking { thinking: t.into(), signature: None },
                    ContentBlock::Text { text: "reply".into() },
                ]),
            }),
            ..assistant_with_tool("unused")
        };
        let session = CanonicalSession::new(
            "s1",
            vec![
                user("q1"),
                thinking_entry("first"),
                user("q2"),
                thinking_entry("second"),
            ],
        );
        let (cloned, stats) = apply_removals(
            &session,
            RemovalOptions {
                tool_removal_percent: 0,
                tool_handling_mode: ToolHandlingModeOrDefault(ToolHandlingMode::Remove),
                thinking_removal_percent: 50,
            },
        );
        assert_eq!(stats.thinking_blocks_removed, 1);
        let first_blocks = cloned.entries[1].message.as_ref().unwrap().content.blocks();
        assert!(!first_blocks.iter().any(|b| b.is_thinking()));
        let second_blocks = cloned.entries[3].message.as_ref().unwrap().content.blocks();
        assert!(second_blocks.iter().any(|b| b.is_thinking()));
    }

    #[test]
    fn empty_assistant_entry_after_removal_is_preserved_not_elided() {
        let session = CanonicalSession::new("s1", vec![user("hi"), assistant_with_tool("t1")]);
        let (cloned, _) = apply_removals(
            &session,
            RemovalOptions {
                tool_removal_percent: 100,
                tool_handling_mode: ToolHandlingModeOrDefault(ToolHandlingMode::Remove),
                thinking_removal_percent: 0,
            },
        );
        assert_eq!(cloned.entries.len(), 2);
        assert!(cloned.entries[1].message.is_some());
    }

    #[test]
    fn truncate_text_leaves_short_text_untouched() {
        assert_eq!(truncate_text("one\ntwo"), "one\ntwo");
    }

    #[test]
    fn truncate_text_keeps_first_three_lines_with_marker() {
        let truncated = truncate_text("a\nb\nc\nd\ne");
        assert_eq!(truncated, "a\nb\nc\n… [2 more lines truncated]");
    }
}
