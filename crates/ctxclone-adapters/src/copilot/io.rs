use std::path::Path;

use ctxclone_types::{CanonicalSession, Entry, EntryKind};

use super::mapper::{map_request, unmap_pair};
use super::schema::ChatSessionDocument;
use crate::Result;

/// Parse a `chatSessions/<uuid>.json` document into a canonical session.
pub fn parse_copilot_session(session_id: &str, bytes: &[u8]) -> Result<CanonicalSession> {
    let doc: ChatSessionDocument = serde_json::from_slice(bytes)?;
    let mut entries = Vec::with_capacity(doc.requests.len() * 2);
    for request in doc.requests {
        let (user, assistant) = map_request(request);
        entries.push(user);
        entries.push(assistant);
    }
    Ok(CanonicalSession::new(session_id.to_string(), entries))
}

/// Re-render a canonical session as a `chatSessions/<uuid>.json` document.
/// Entries are walked in order, pairing each `user` entry with the next
/// `assistant` entry (if any remains after removal/compression).
pub fn render_copilot_session(session: &CanonicalSession) -> Vec<u8> {
    let mut requests = Vec::new();
    let mut iter = session.entries.iter().peekable();

    while let Some(entry) = iter.next() {
        if entry.kind != EntryKind::User {
            continue;
        }
        let assistant = match iter.peek() {
            Some(next) if next.kind == EntryKind::Assistant => {
                let next = *next;
                iter.next();
                Some(next)
            }
            _ => None,
        };
        requests.push(unmap_pair(entry, assistant));
    }

    let doc = ChatSessionDocument {
        requests,
        extra: Default::default(),
    };
    serde_json::to_vec_pretty(&doc).unwrap_or_default()
}

#[derive(Debug, Default, Clone)]
pub struct CopilotHeader {
    pub first_message: Option<String>,
    pub last_timestamp: Option<i64>,
    pub turn_count: usize,
}

/// Header info used by discovery (C10) without building the full canonical
/// model: first non-canceled user message and the most recent timestamp.
pub fn extract_copilot_header(bytes: &[u8]) -> Result<CopilotHeader> {
    let doc: ChatSessionDocument = serde_json::from_slice(bytes)?;
    let mut header = CopilotHeader {
        turn_count: doc.requests.iter().filter(|r| !r.is_canceled).count(),
        ..Default::default()
    };
    for request in &doc.requests {
        if header.first_message.is_none() && !request.is_canceled {
            let text = request.message.text();
            if !text.is_empty() {
                header.first_message = Some(text.to_string());
            }
        }
        if let Some(ts) = request.timestamp {
            header.last_timestamp = Some(header.last_timestamp.map_or(ts, |cur| cur.max(ts)));
        }
    }
    Ok(header)
}

pub fn read_workspace_folder(workspace_json_path: &Path) -> Result<String> {
    let bytes = std::fs::read(workspace_json_path)?;
    let meta: super::schema::WorkspaceMeta = serde_json::from_slice(&bytes)?;
    Ok(meta.folder)
}

/// Collects the entries for a session without the `CanonicalSession`
/// wrapper, for callers assembling cross-file context.
pub fn parse_copilot_entries(bytes: &[u8]) -> Result<Vec<Entry>> {
    let doc: ChatSessionDocument = serde_json::from_slice(bytes)?;
    Ok(doc
        .requests
        .into_iter()
        .flat_map(|r| {
            let (user, assistant) = map_request(r);
            [user, assistant]
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_doc() -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "requests": [
                {
                    "message": "hello there",
                    "timestamp": 1_700_000_000_000i64,
                    "modelId": "gpt-x",
                    "response": [
                        {"kind": "markdownContent", "value": "hi back"},
                        {
                            "kind": "toolInvocationSerialized",
                            "toolCallId": "call-1",
                            "toolName": "readFile",
                            "toolSpecificData": {"path": "a.rs"},
                            "resultDetails": "contents",
                            "isError": false
                        }
                    ],
                    "result": {"requestId": "r1"}
                },
                {
                    "message": "canceled one",
                    "isCanceled": true,
                    "response": []
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn parses_requests_into_user_assistant_pairs() {
        let session = parse_copilot_session("s1", &sample_doc()).unwrap();
        assert_eq!(session.entries.len(), 4);
        assert_eq!(session.entries[0].kind, EntryKind::User);
        assert_eq!(session.entries[1].kind, EntryKind::Assistant);
        assert_eq!(session.entries[0].text_content().as_deref(), Some("hello there"));
    }

    #[test]
    fn tool_invocation_yields_paired_tool_blocks() {
        let session = parse_copilot_session("s1", &sample_doc()).unwrap();
        session.validate_tool_pairing().unwrap();
    }

    #[test]
    fn canceled_request_marks_user_entry_meta() {
        let session = parse_copilot_session("s1", &sample_doc()).unwrap();
        assert!(session.entries[2].is_meta);
        assert!(!session.entries[2].starts_turn());
    }

    #[test]
    fn header_extraction_counts_only_non_canceled_turns() {
        let header = extract_copilot_header(&sample_doc()).unwrap();
        assert_eq!(header.turn_count, 1);
        assert_eq!(header.first_message.as_deref(), Some("hello there"));
    }

    #[test]
    fn render_round_trip_preserves_tool_pairing() {
        let session = parse_copilot_session("s1", &sample_doc()).unwrap();
        let rendered = render_copilot_session(&session);
        let reparsed = parse_copilot_session("s1", &rendered).unwrap();
        reparsed.validate_tool_pairing().unwrap();
        assert_eq!(reparsed.entries.len(), session.entries.len());
    }
}
