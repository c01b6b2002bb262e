//! Turn identifier (C5): segments an entry array into turns.

use ctxclone_types::{CanonicalSession, Turn};

/// A turn begins at a non-meta user entry whose first content block is not
/// a `tool_result` (`Entry::starts_turn`), and runs to the entry before the
/// next such boundary, or end of session.
pub fn identify_turns(session: &CanonicalSession) -> Vec<Turn> {
    let boundaries: Vec<usize> = session
        .entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| entry.starts_turn())
        .map(|(index, _)| index)
        .collect();

    boundaries
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = boundaries
                .get(i + 1)
                .map(|&next| next - 1)
                .unwrap_or(session.entries.len() - 1);
            Turn {
                start_index: start,
                end_index: end,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctxclone_types::{CanonicalSession, ContentBlock, Entry, EntryKind, Message, MessageContent, Role};
    use serde_json::{Map, Value};

    fn text_entry(kind: EntryKind, role: Role, text: &str) -> Entry {
        Entry {
            uuid: None,
            parent_uuid: None,
            kind,
            is_meta: false,
            is_sidechain: false,
            agent_id: None,
            message: Some(Message {
                role,
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

    fn tool_result_entry(tool_use_id: &str) -> Entry {
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
                    tool_use_id: tool_use_id.into(),
                    content: Value::String("ok".into()),
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
    fn empty_session_has_no_turns() {
        let session = CanonicalSession::new("s1", vec![]);
        assert!(identify_turns(&session).is_empty());
    }

    #[test]
    fn single_user_assistant_pair_is_one_turn() {
        let session = CanonicalSession::new(
            "s1",
            vec![
                text_entry(EntryKind::User, Role::User, "hello world"),
                text_entry(EntryKind::Assistant, Role::Assistant, "hi there"),
            ],
        );
        let turns = identify_turns(&session);
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].start_index, 0);
        assert_eq!(turns[0].end_index, 1);
    }

    #[test]
    fn tool_result_continuation_stays_within_the_turn() {
        let session = CanonicalSession::new(
            "s1",
            vec![
                text_entry(EntryKind::User, Role::User, "do something"),
                text_entry(EntryKind::Assistant, Role::Assistant, "working on it"),
                tool_result_entry("tool-1"),
                text_entry(EntryKind::Assistant, Role::Assistant, "done"),
                text_entry(EntryKind::User, Role::User, "thanks"),
                text_entry(EntryKind::Assistant, Role::Assistant, "anytime"),
            ],
        );
        let turns = identify_turns(&session);
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].start_index, 0);
        assert_eq!(turns[0].end_index, 3);
        assert_eq!(turns[1].start_index, 4);
        assert_eq!(turns[1].end_index, 5);
    }

    #[test]
    fn meta_user_entries_never_start_a_turn() {
        let mut meta = text_entry(EntryKind::User, Role::User, "system reminder");
        meta.is_meta = true;
        let session = CanonicalSession::new(
            "s1",
            vec![
                meta,
                text_entry(EntryKind::User, Role::User, "real question"),
                text_entry(EntryKind::Assistant, Role::Assistant, "real answer"),
            ],
        );
        let turns = identify_turns(&session);
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].start_index, 1);
    }
}
