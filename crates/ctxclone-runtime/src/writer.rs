//! Clone writer (C9): atomic session writes, plus the Copilot SQLite index
//! update with backup rotation. Grounded on `ctxclone_core::atomic::write_atomic`
//! for the temp+rename primitive and `ctxclone_index` for the transactional
//! index protocol described in spec §4.5.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use ctxclone_adapters::claude::render_claude_session;
use ctxclone_adapters::copilot::render_copilot_session;
use ctxclone_core::atomic::write_atomic;
use ctxclone_index::{Database, IndexEntry, InitialLocation};
use ctxclone_types::CanonicalSession;

use crate::Result;

/// Claude path: serialise to a freshly minted UUID filename in
/// `<claudeBase>/projects/<folder>/`, temp+rename into place, mode 0600. No
/// index update.
pub fn write_claude_session(
    claude_base: &Path,
    folder: &str,
    session: &CanonicalSession,
) -> Result<PathBuf> {
    let project_dir = claude_base.join("projects").join(folder);
    std::fs::create_dir_all(&project_dir)?;

    let filename = format!("{}.jsonl", Uuid::new_v4());
    let target = project_dir.join(filename);

    let bytes = render_claude_session(session);
    write_atomic(&target, &bytes)?;
    Ok(target)
}

/// Copilot path (spec §4.5 steps 1-4): backup `state.vscdb`, write the JSON
/// document, then update the index inside a transaction. If the index
/// update fails, the JSON document is removed (best-effort) and the backup
/// is retained for manual restore.
pub fn write_copilot_session(
    vscode_base: &Path,
    workspace_hash: &str,
    session: &CanonicalSession,
    title: Option<String>,
) -> Result<(PathBuf, PathBuf)> {
    let workspace_dir = vscode_base.join(workspace_hash);
    let sessions_dir = workspace_dir.join("chatSessions");
    std::fs::create_dir_all(&sessions_dir)?;

    let db_path = workspace_dir.join("state.vscdb");
    let backup_path = ctxclone_index::rotate_backups(&db_path)?;

    let session_id = Uuid::new_v4().to_string();
    let doc_path = sessions_dir.join(format!("{session_id}.json"));
    let bytes = render_copilot_session(session);
    write_atomic(&doc_path, &bytes)?;

    if let Err(err) = update_copilot_index(&db_path, &session_id, title, session) {
        let _ = std::fs::remove_file(&doc_path);
        return Err(err);
    }

    Ok((doc_path, backup_path))
}

fn update_copilot_index(
    db_path: &Path,
    session_id: &str,
    title: Option<String>,
    session: &CanonicalSession,
) -> Result<()> {
    let mut db = match std::env::var("CTXCLONE_SESSION_INDEX_KEY") {
        Ok(key) => Database::open_with_key(db_path, &key)?,
        Err(_) => Database::open(db_path)?,
    };
    let now_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0);

    let entry = IndexEntry {
        title,
        last_message_date: now_ms,
        is_imported: true,
        initial_location: InitialLocation::Panel,
        is_empty: session.entries.iter().all(|e| e.text_content().is_none()),
    };
    db.upsert_session_entry(session_id, entry)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctxclone_types::{ContentBlock, Entry, EntryKind, Message, MessageContent, Role};
    use tempfile::TempDir;

    fn sample_session() -> CanonicalSession {
        CanonicalSession::new(
            "sess-1",
            vec![
                Entry {
                    uuid: Some("u1".into()),
                    parent_uuid: None,
                    kind: EntryKind::User,
                    is_meta: false,
                    is_sidechain: false,
                    agent_id: None,
                    message: Some(Message {
                        role: Role::User,
                        content: MessageContent::Blocks(vec![ContentBlock::Text {
                            text: "hello".into(),
                        }]),
                    }),
                    timestamp: Some("2026-01-01T00:00:00Z".into()),
                    cwd: Some("/home/dev/app".into()),
                    model: None,
                    stop_reason: None,
                    usage: None,
                    extra: Default::default(),
                },
                Entry {
                    uuid: Some("a1".into()),
                    parent_uuid: Some("u1".into()),
                    kind: EntryKind::Assistant,
                    is_meta: false,
                    is_sidechain: false,
                    agent_id: None,
                    message: Some(Message {
                        role: Role::Assistant,
                        content: MessageContent::Blocks(vec![ContentBlock::Text {
                            text: "hi back".into(),
                        }]),
                    }),
                    timestamp: Some("2026-01-01T00:00:01Z".into()),
                    cwd: None,
                    model: Some("claude-x".into()),
                    stop_reason: None,
                    usage: None,
                    extra: Default::default(),
                },
            ],
        )
    }

    #[test]
    fn write_claude_session_creates_new_uuid_file() {
        let base = TempDir::new().unwrap();
        let path = write_claude_session(base.path(), "-home-dev-app", &sample_session()).unwrap();
        assert!(path.exists());
        assert!(path.extension().unwrap() == "jsonl");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, 0o600);
        }
    }

    #[test]
    fn write_copilot_session_creates_backup_doc_and_index_entry() {
        let base = TempDir::new().unwrap();
        let workspace_dir = base.path().join("abc123");
        std::fs::create_dir_all(&workspace_dir).unwrap();
        let db_path = workspace_dir.join("state.vscdb");
        // A real (if empty) sqlite file, the way VS Code would have already
        // created one in any workspace that has ever opened a chat session.
        drop(Database::open(&db_path).unwrap());

        let (doc_path, backup_path) = write_copilot_session(
            base.path(),
            "abc123",
            &sample_session(),
            Some("Test session".into()),
        )
        .unwrap();

        assert!(doc_path.exists());
        assert!(backup_path.exists());

        let db = Database::open(&db_path).unwrap();
        let index = db.read_session_index().unwrap();
        assert_eq!(index.entries.len(), 1);
    }

    #[test]
    fn write_copilot_session_honors_index_key_override() {
        let base = TempDir::new().unwrap();
        let workspace_dir = base.path().join("abc123");
        std::fs::create_dir_all(&workspace_dir).unwrap();
        let db_path = workspace_dir.join("state.vscdb");
        drop(Database::open(&db_path).unwrap());

        std::env::set_var("CTXCLONE_SESSION_INDEX_KEY", "custom.index.key");
        let result = write_copilot_session(base.path(), "abc123", &sample_session(), None);
        std::env::remove_var("CTXCLONE_SESSION_INDEX_KEY");
        result.unwrap();

        let db = Database::open_with_key(&db_path, "custom.index.key").unwrap();
        let index = db.read_session_index().unwrap();
        assert_eq!(index.entries.len(), 1);
    }

    #[test]
    fn write_copilot_session_cleans_up_doc_when_index_update_fails() {
        let base = TempDir::new().unwrap();
        let workspace_dir = base.path().join("abc123");
        std::fs::create_dir_all(&workspace_dir).unwrap();
        let db_path = workspace_dir.join("state.vscdb");
        // Bytes that are not a valid sqlite header: `std::fs::copy` backs it
        // up fine (it doesn't look at content), but `Database::open`'s
        // schema init fails once it tries to read the corrupt file, forcing
        // the index-update step specifically to fail.
        std::fs::write(&db_path, b"not a real sqlite database file").unwrap();

        let result = write_copilot_session(base.path(), "abc123", &sample_session(), None);
        assert!(result.is_err());

        let sessions_dir = workspace_dir.join("chatSessions");
        let remaining: Vec<_> = std::fs::read_dir(&sessions_dir)
            .map(|rd| rd.filter_map(|e| e.ok()).collect())
            .unwrap_or_default();
        assert!(remaining.is_empty());
    }
}
