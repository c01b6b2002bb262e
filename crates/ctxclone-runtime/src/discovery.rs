//! Discovery (C10): list projects/workspaces and sessions with metadata
//! (first message, mtime, size, turn count), grounded on the teacher's
//! `WalkDir`-based header-scanning pattern in
//! `agtrace-providers::claude::discovery`.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use walkdir::WalkDir;

use ctxclone_adapters::claude::extract_claude_header;
use ctxclone_adapters::copilot::{extract_copilot_header, read_workspace_folder};
use ctxclone_types::pathcodec::decode_claude_folder;
use ctxclone_types::{ProjectRef, SessionSummary};

use crate::Result;

fn rfc3339(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339()
}

/// Every immediate child of `<claudeBase>/projects` is one encoded project
/// folder.
pub fn list_claude_projects(claude_base: &Path) -> Result<Vec<ProjectRef>> {
    let projects_dir = claude_base.join("projects");
    if !projects_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut projects = Vec::new();
    for entry in std::fs::read_dir(&projects_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let folder = entry.file_name().to_string_lossy().into_owned();
        let path = decode_claude_folder(&folder);
        projects.push(ProjectRef { folder, path });
    }
    projects.sort_by(|a, b| a.folder.cmp(&b.folder));
    Ok(projects)
}

/// Lists every `.jsonl` session directly under one encoded project folder.
pub fn list_claude_sessions(claude_base: &Path, folder: &str) -> Result<Vec<SessionSummary>> {
    let project_dir = claude_base.join("projects").join(folder);
    if !project_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut sessions = Vec::new();
    for entry in WalkDir::new(&project_dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.extension().map(|e| e != "jsonl").unwrap_or(true) {
            continue;
        }
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if metadata.len() == 0 {
            continue;
        }
        let Ok(header) = extract_claude_header(path) else {
            continue;
        };
        let Some(session_id) = header.session_id else {
            continue;
        };

        let modified = metadata.modified().unwrap_or_else(|_| SystemTime::now());
        sessions.push(SessionSummary {
            session_id,
            first_message: header.first_message,
            last_modified_at: rfc3339(modified),
            size_bytes: metadata.len(),
            turn_count: count_claude_turns(path),
        });
    }

    sessions.sort_by(|a, b| b.last_modified_at.cmp(&a.last_modified_at));
    Ok(sessions)
}

fn count_claude_turns(path: &Path) -> usize {
    let Ok(bytes) = std::fs::read(path) else {
        return 0;
    };
    let session_id = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let Ok(session) = ctxclone_adapters::claude::parse_claude_session(&session_id, &bytes) else {
        return 0;
    };
    ctxclone_engine::identify_turns(&session).len()
}

/// Finds the file backing `session_id` by scanning every project folder
/// (or just `folder` when given), returning the first match.
pub fn find_claude_session_path(
    claude_base: &Path,
    folder: Option<&str>,
    session_id: &str,
) -> Result<Option<PathBuf>> {
    let projects_dir = claude_base.join("projects");
    let search_root = match folder {
        Some(f) => projects_dir.join(f),
        None => projects_dir,
    };
    if !search_root.is_dir() {
        return Ok(None);
    }

    for entry in WalkDir::new(&search_root)
        .max_depth(2)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.extension().map(|e| e != "jsonl").unwrap_or(true) {
            continue;
        }
        if path.file_stem().map(|s| s == session_id).unwrap_or(false) {
            return Ok(Some(path.to_path_buf()));
        }
    }
    Ok(None)
}

/// Every immediate child of `vscodeBase` holding a `workspace.json` is one
/// workspace, keyed by its hash directory name.
pub fn list_copilot_projects(vscode_base: &Path) -> Result<Vec<ProjectRef>> {
    if !vscode_base.is_dir() {
        return Ok(Vec::new());
    }

    let mut projects = Vec::new();
    for entry in std::fs::read_dir(vscode_base)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let hash = entry.file_name().to_string_lossy().into_owned();
        let workspace_json = entry.path().join("workspace.json");
        if !workspace_json.is_file() {
            continue;
        }
        let path = read_workspace_folder(&workspace_json).unwrap_or_default();
        projects.push(ProjectRef { folder: hash, path });
    }
    projects.sort_by(|a, b| a.folder.cmp(&b.folder));
    Ok(projects)
}

pub fn list_copilot_sessions(
    vscode_base: &Path,
    workspace_hash: &str,
) -> Result<Vec<SessionSummary>> {
    let sessions_dir = vscode_base.join(workspace_hash).join("chatSessions");
    if !sessions_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut sessions = Vec::new();
    for entry in std::fs::read_dir(&sessions_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().map(|e| e != "json").unwrap_or(true) {
            continue;
        }
        let Some(session_id) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            continue;
        };
        let bytes = std::fs::read(&path)?;
        let Ok(header) = extract_copilot_header(&bytes) else {
            continue;
        };
        let metadata = entry.metadata()?;
        let last_modified_at = header
            .last_timestamp
            .and_then(|ms| {
                DateTime::from_timestamp_millis(ms).map(|dt| dt.to_rfc3339())
            })
            .unwrap_or_else(|| rfc3339(metadata.modified().unwrap_or_else(|_| SystemTime::now())));

        sessions.push(SessionSummary {
            session_id,
            first_message: header.first_message,
            last_modified_at,
            size_bytes: metadata.len(),
            turn_count: header.turn_count,
        });
    }

    sessions.sort_by(|a, b| b.last_modified_at.cmp(&a.last_modified_at));
    Ok(sessions)
}

pub fn find_copilot_session_path(
    vscode_base: &Path,
    workspace_hash: &str,
    session_id: &str,
) -> PathBuf {
    vscode_base
        .join(workspace_hash)
        .join("chatSessions")
        .join(format!("{session_id}.json"))
}
