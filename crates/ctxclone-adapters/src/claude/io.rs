use std::io::{BufRead, BufReader};
use std::path::Path;

use ctxclone_types::{CanonicalSession, Entry};

use super::mapper::{map_record, unmap_entry};
use super::schema::ClaudeRecord;
use crate::Result;

/// Parse a Claude Code `.jsonl` session file. Invariant #2: a line that
/// fails to parse as JSON or as a known record shape is skipped, not fatal.
pub fn parse_claude_session(session_id: &str, bytes: &[u8]) -> Result<CanonicalSession> {
    let text = String::from_utf8_lossy(bytes);
    let mut entries = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Ok(record) = serde_json::from_str::<ClaudeRecord>(line) else {
            continue;
        };
        if let Some(entry) = map_record(record) {
            entries.push(entry);
        }
    }

    Ok(CanonicalSession::new(session_id.to_string(), entries))
}

/// Re-render a canonical session as Claude Code `.jsonl` bytes, one JSON
/// object per line, in entry order. Entries with no wire representation
/// (kind `Meta`) are dropped.
pub fn render_claude_session(session: &CanonicalSession) -> Vec<u8> {
    let mut out = Vec::new();
    for entry in &session.entries {
        let Some(record) = unmap_entry(entry, &session.session_id) else {
            continue;
        };
        if let Ok(line) = serde_json::to_string(&record) {
            out.extend_from_slice(line.as_bytes());
            out.push(b'\n');
        }
    }
    out
}

/// Minimal header read from the first lines of a session file, used by
/// discovery (C10) to list sessions without parsing the whole file.
#[derive(Debug, Default, Clone)]
pub struct ClaudeHeader {
    pub session_id: Option<String>,
    pub cwd: Option<String>,
    pub timestamp: Option<String>,
    pub first_message: Option<String>,
    pub is_sidechain: bool,
}

pub fn extract_claude_header(path: &Path) -> Result<ClaudeHeader> {
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);
    let mut header = ClaudeHeader::default();

    for line in reader.lines().take(200).map_while(std::result::Result::ok) {
        let Ok(record) = serde_json::from_str::<ClaudeRecord>(&line) else {
            continue;
        };
        match &record {
            ClaudeRecord::User(user) => {
                header.session_id.get_or_insert_with(|| user.session_id.clone());
                header.cwd = header.cwd.take().or_else(|| user.cwd.clone());
                header
                    .timestamp
                    .get_or_insert_with(|| user.timestamp.clone());
                if header.first_message.is_none() && !user.is_sidechain && !user.is_meta {
                    header.first_message = first_text(&user.message.content);
                }
                header.is_sidechain = user.is_sidechain;
            }
            ClaudeRecord::Assistant(asst) => {
                header.session_id.get_or_insert_with(|| asst.session_id.clone());
                header.cwd = header.cwd.take().or_else(|| asst.cwd.clone());
                header
                    .timestamp
                    .get_or_insert_with(|| asst.timestamp.clone());
            }
            _ => {}
        }

        if header.session_id.is_some() && header.cwd.is_some() && header.first_message.is_some() {
            break;
        }
    }

    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_jsonl() -> String {
        [
            r#"{"type":"user","uuid":"u1","parentUuid":null,"sessionId":"s1","timestamp":"2026-01-01T00:00:00Z","cwd":"/home/dev/proj","message":{"role":"user","content":"hello there"}}"#,
            r#"not json at all"#,
            r#"{"type":"assistant","uuid":"a1","parentUuid":"u1","sessionId":"s1","timestamp":"2026-01-01T00:00:01Z","message":{"role":"assistant","model":"claude-x","content":[{"type":"text","text":"hi back"}],"usage":{"input_tokens":5,"output_tokens":3}}}"#,
        ]
        .join("\n")
    }

    #[test]
    fn malformed_lines_are_skipped_not_fatal() {
        let session = parse_claude_session("s1", sample_jsonl().as_bytes()).unwrap();
        assert_eq!(session.entries.len(), 2);
    }

    #[test]
    fn user_and_assistant_entries_round_trip_text() {
        let session = parse_claude_session("s1", sample_jsonl().as_bytes()).unwrap();
        assert_eq!(session.entries[0].text_content().as_deref(), Some("hello there"));
        assert_eq!(session.entries[1].text_content().as_deref(), Some("hi back"));
        assert_eq!(session.entries[1].usage.unwrap().input_tokens, 5);
    }

    #[test]
    fn render_then_reparse_preserves_entry_count_and_text() {
        let session = parse_claude_session("s1", sample_jsonl().as_bytes()).unwrap();
        let rendered = render_claude_session(&session);
        let reparsed = parse_claude_session("s1", &rendered).unwrap();
        assert_eq!(reparsed.entries.len(), session.entries.len());
        for (a, b) in session.entries.iter().zip(reparsed.entries.iter()) {
            assert_eq!(a.text_content(), b.text_content());
            assert_eq!(a.kind, b.kind);
        }
    }

    #[test]
    fn header_extraction_finds_session_id_cwd_and_first_message() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.jsonl");
        std::fs::write(&path, sample_jsonl()).unwrap();
        let header = extract_claude_header(&path).unwrap();
        assert_eq!(header.session_id.as_deref(), Some("s1"));
        assert_eq!(header.cwd.as_deref(), Some("/home/dev/proj"));
        assert_eq!(header.first_message.as_deref(), Some("hello there"));
    }
}

fn first_text(content: &[super::schema::UserContent]) -> Option<String> {
    content.iter().find_map(|c| match c {
        super::schema::UserContent::Text { text } => Some(text.clone()),
        _ => None,
    })
}

/// Entries collected from a single parsed file, for callers that need the
/// raw `Entry` list without the `CanonicalSession` wrapper (sidechain merge).
pub fn parse_claude_entries(bytes: &[u8]) -> Vec<Entry> {
    let text = String::from_utf8_lossy(bytes);
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter_map(|l| serde_json::from_str::<ClaudeRecord>(l).ok())
        .filter_map(map_record)
        .collect()
}
