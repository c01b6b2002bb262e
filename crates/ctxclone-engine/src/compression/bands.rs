//! Band-based selection (§4.2 "Selection (banding)" and "Task generation").

use ctxclone_types::tokens::estimate_tokens;
use ctxclone_types::{Band, CanonicalSession, CompressionTask, EntryKind, Role};

/// Result of applying the band policy to a session: tasks to run, plus a
/// count of messages skipped for falling below `minTokens` (testable
/// property #5 — band selection is a partition; under-`minTokens` messages
/// are accounted separately from the band partition itself).
#[derive(Debug, Default)]
pub struct TaskSelection {
    pub tasks: Vec<CompressionTask>,
    pub skipped_below_min_tokens: usize,
}

/// Assigns each user/assistant message its positional percentage among all
/// such messages (meta and summary/queue-operation/file-history entries are
/// excluded from the denominator), matches it against the half-open bands,
/// and emits a `CompressionTask` for every match at or above `min_tokens`.
pub fn select_tasks(
    session: &CanonicalSession,
    bands: &[Band],
    min_tokens: u32,
    timeout_initial_ms: u64,
) -> TaskSelection {
    let message_entry_indices: Vec<usize> = session
        .entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| {
            matches!(entry.kind, EntryKind::User | EntryKind::Assistant) && !entry.is_meta
        })
        .map(|(index, _)| index)
        .collect();

    let total = message_entry_indices.len();
    if total == 0 {
        return TaskSelection::default();
    }

    let mut selection = TaskSelection::default();

    for (position, &entry_index) in message_entry_indices.iter().enumerate() {
        let position_percent = (position as f64 / total as f64) * 100.0;
        let Some(band) = bands.iter().find(|b| b.contains(position_percent)) else {
            continue;
        };

        let entry = &session.entries[entry_index];
        let Some(text) = entry.text_content() else {
            continue;
        };
        let estimated_tokens = estimate_tokens(&text);
        if estimated_tokens < min_tokens {
            selection.skipped_below_min_tokens += 1;
            continue;
        }

        let role = entry
            .message
            .as_ref()
            .map(|m| m.role)
            .unwrap_or(Role::User);

        selection.tasks.push(CompressionTask::new(
            entry_index,
            role,
            text,
            band.level,
            estimated_tokens,
            timeout_initial_ms,
        ));
    }

    selection
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctxclone_types::{
        CompressionLevel, ContentBlock, Entry, Message, MessageContent,
    };
    use serde_json::Map;

    fn user_entry(text: &str) -> Entry {
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

    fn assistant_entry(text: &str) -> Entry {
        let mut entry = user_entry(text);
        entry.kind = EntryKind::Assistant;
        entry.message.as_mut().unwrap().role = Role::Assistant;
        entry
    }

    fn long_text(words: usize) -> String {
        std::iter::repeat("filler ").take(words).collect()
    }

    #[test]
    fn messages_outside_every_band_are_skipped() {
        let session = CanonicalSession::new(
            "s1",
            vec![
                user_entry(&long_text(50)),
                assistant_entry(&long_text(50)),
                user_entry(&long_text(50)),
                assistant_entry(&long_text(50)),
            ],
        );
        let bands = vec![Band {
            start_percent: 0.0,
            end_percent: 50.0,
            level: CompressionLevel::Compress,
        }];
        let selection = select_tasks(&session, &bands, 20, 5000);
        assert_eq!(selection.tasks.len(), 2);
        assert_eq!(selection.tasks[0].message_index, 0);
        assert_eq!(selection.tasks[1].message_index, 1);
    }

    #[test]
    fn below_min_tokens_is_skipped_regardless_of_band() {
        let session = CanonicalSession::new("s1", vec![user_entry("hi"), assistant_entry("yo")]);
        let bands = vec![Band {
            start_percent: 0.0,
            end_percent: 100.0,
            level: CompressionLevel::Compress,
        }];
        let selection = select_tasks(&session, &bands, 20, 5000);
        assert!(selection.tasks.is_empty());
        assert_eq!(selection.skipped_below_min_tokens, 2);
    }

    #[test]
    fn heavy_compress_band_is_tagged_on_the_task() {
        let session = CanonicalSession::new(
            "s1",
            vec![user_entry(&long_text(50)), assistant_entry(&long_text(50))],
        );
        let bands = vec![Band {
            start_percent: 0.0,
            end_percent: 100.0,
            level: CompressionLevel::HeavyCompress,
        }];
        let selection = select_tasks(&session, &bands, 20, 5000);
        assert!(selection
            .tasks
            .iter()
            .all(|t| t.level == CompressionLevel::HeavyCompress));
    }

    #[test]
    fn empty_session_yields_no_tasks() {
        let session = CanonicalSession::new("s1", vec![]);
        let selection = select_tasks(&session, &[], 20, 5000);
        assert!(selection.tasks.is_empty());
        assert_eq!(selection.skipped_below_min_tokens, 0);
    }
}
