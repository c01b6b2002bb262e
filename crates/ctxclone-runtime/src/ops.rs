//! The four operations an (out-of-scope) HTTP router would call, per
//! SPEC_FULL.md §6: `list_projects`, `list_sessions`, `get_turns`,
//! `clone_session`. Grounded on the `*Service`/`*Request` shape of the
//! teacher's `agtrace-runtime::ops` module, simplified to free functions
//! since the router itself is out of scope here.

use std::path::PathBuf;
use std::sync::Arc;

use uuid::Uuid;

use ctxclone_adapters::claude::parse_claude_session;
use ctxclone_adapters::copilot::parse_copilot_session;
use ctxclone_engine::{
    apply_removals, cumulative_tokens, extract_turn_content, identify_turns, run_compression,
    select_tasks, CompressionConfig, CompressionProvider, RemovalOptions, ToolHandlingMode,
    ToolHandlingModeOrDefault,
};
use ctxclone_types::{
    Band, CanonicalSession, CloneResult, CloneStats, ProjectRef, Source, TokensByType, TurnContent,
};

use crate::config::Config;
use crate::discovery;
use crate::writer;
use crate::{Error, Result};

/// Identifies the on-disk location of one session for `get_turns`/
/// `clone_session`. The router resolves `{source, sessionId, workspaceKey?}`
/// into one of these before calling into the library.
#[derive(Debug, Clone)]
pub enum SessionRef {
    Claude {
        folder: Option<String>,
        session_id: String,
    },
    Copilot {
        workspace_hash: String,
        session_id: String,
    },
}

impl SessionRef {
    pub fn session_id(&self) -> &str {
        match self {
            SessionRef::Claude { session_id, .. } => session_id,
            SessionRef::Copilot { session_id, .. } => session_id,
        }
    }

    pub fn source(&self) -> Source {
        match self {
            SessionRef::Claude { .. } => Source::Claude,
            SessionRef::Copilot { .. } => Source::Copilot,
        }
    }
}

fn validate_session_id(session_id: &str) -> Result<()> {
    Uuid::parse_str(session_id)
        .map(|_| ())
        .map_err(|_| Error::InvalidSessionId(session_id.to_string()))
}

/// `GET /api/projects?source=...`.
pub fn list_projects(config: &Config, source: Source) -> Result<Vec<ProjectRef>> {
    match source {
        Source::Claude => {
            let base = config.resolved_claude_base()?;
            Ok(discovery::list_claude_projects(&base)?)
        }
        Source::Copilot => {
            let base = config.resolved_vscode_base()?;
            Ok(discovery::list_copilot_projects(&base)?)
        }
    }
}

/// `GET /api/projects/:folder/sessions`, sorted by `lastModifiedAt`
/// descending (done inside `discovery`).
pub fn list_sessions(
    config: &Config,
    source: Source,
    folder: &str,
) -> Result<Vec<ctxclone_types::SessionSummary>> {
    match source {
        Source::Claude => {
            let base = config.resolved_claude_base()?;
            Ok(discovery::list_claude_sessions(&base, folder)?)
        }
        Source::Copilot => {
            let base = config.resolved_vscode_base()?;
            Ok(discovery::list_copilot_sessions(&base, folder)?)
        }
    }
}

fn load_session(config: &Config, session_ref: &SessionRef) -> Result<(CanonicalSession, PathBuf)> {
    validate_session_id(session_ref.session_id())?;

    match session_ref {
        SessionRef::Claude { folder, session_id } => {
            let base = config.resolved_claude_base()?;
            let path = discovery::find_claude_session_path(&base, folder.as_deref(), session_id)?
                .ok_or_else(|| Error::NotFound(format!("claude session {session_id}")))?;
            let bytes = std::fs::read(&path)?;
            let session = parse_claude_session(session_id, &bytes)?;
            Ok((session, path))
        }
        SessionRef::Copilot {
            workspace_hash,
            session_id,
        } => {
            let base = config.resolved_vscode_base()?;
            let path = discovery::find_copilot_session_path(&base, workspace_hash, session_id);
            if !path.is_file() {
                return Err(Error::NotFound(format!("copilot session {session_id}")));
            }
            let bytes = std::fs::read(&path)?;
            let session = parse_copilot_session(session_id, &bytes)?;
            Ok((session, path))
        }
    }
}

#[derive(Debug, Clone)]
pub struct TurnAnalysis {
    pub turn_index: usize,
    pub cumulative: TokensByType,
    pub content: TurnContent,
}

#[derive(Debug, Clone)]
pub struct GetTurnsResult {
    pub session_id: String,
    pub total_turns: usize,
    pub turns: Vec<TurnAnalysis>,
}

/// `GET /api/session/:id/turns`.
pub fn get_turns(config: &Config, session_ref: &SessionRef) -> Result<GetTurnsResult> {
    let (session, _path) = load_session(config, session_ref)?;
    let turns = identify_turns(&session);
    let cumulative = cumulative_tokens(&session, &turns);

    let analyses: Vec<TurnAnalysis> = turns
        .iter()
        .zip(cumulative.into_iter())
        .enumerate()
        .map(|(turn_index, (turn, cumulative))| TurnAnalysis {
            turn_index,
            cumulative,
            content: extract_turn_content(&session, turn),
        })
        .collect();

    Ok(GetTurnsResult {
        session_id: session_ref.session_id().to_string(),
        total_turns: turns.len(),
        turns: analyses,
    })
}

/// Options for `POST /api/clone` / `POST /api/copilot/clone`.
#[derive(Debug, Clone)]
pub struct CloneOptions {
    pub tool_removal_percent: u8,
    pub tool_handling_mode: ToolHandlingMode,
    pub thinking_removal_percent: u8,
    pub compression_bands: Vec<Band>,
    pub write_to_disk: bool,
    /// Copilot only: write the clone into a different workspace than the
    /// one it was read from.
    pub target_workspace_hash: Option<String>,
    /// Copilot only: title recorded in the session index.
    pub title: Option<String>,
}

impl Default for CloneOptions {
    fn default() -> Self {
        Self {
            tool_removal_percent: 0,
            tool_handling_mode: ToolHandlingMode::Remove,
            thinking_removal_percent: 0,
            compression_bands: Vec::new(),
            write_to_disk: false,
            target_workspace_hash: None,
            title: None,
        }
    }
}

/// `POST /api/clone` / `POST /api/copilot/clone`. Removal always precedes
/// compression; compression only runs when `compressionBands` is non-empty
/// and a provider is supplied (spec §4: "C8, if bands supplied").
pub async fn clone_session(
    config: &Config,
    session_ref: &SessionRef,
    options: CloneOptions,
    provider: Option<Arc<dyn CompressionProvider>>,
) -> Result<CloneResult> {
    let (session, _source_path) = load_session(config, session_ref)?;
    let original_turns = identify_turns(&session).len();

    let removal_options = RemovalOptions {
        tool_removal_percent: options.tool_removal_percent,
        tool_handling_mode: ToolHandlingModeOrDefault(options.tool_handling_mode),
        thinking_removal_percent: options.thinking_removal_percent,
    };
    let (removed_session, removal_stats) = apply_removals(&session, removal_options);

    let mut stats = CloneStats {
        original_turns,
        cloned_turns: identify_turns(&removed_session).len(),
        tool_calls_removed: removal_stats.tool_calls_removed,
        tool_calls_truncated: removal_stats.tool_calls_truncated,
        thinking_blocks_removed: removal_stats.thinking_blocks_removed,
        compression: None,
    };

    let mut final_session = removed_session;

    if !options.compression_bands.is_empty() {
        if let Some(provider) = provider {
            let selection = select_tasks(
                &final_session,
                &options.compression_bands,
                config.min_tokens,
                config.timeout_initial,
            );
            let compression_config = CompressionConfig {
                concurrency: config.concurrency,
                timeout_initial_ms: config.timeout_initial,
                max_attempts: config.max_attempts,
                thinking_threshold: config.thinking_threshold,
            };
            let (compressed_session, compression_stats) = run_compression(
                &final_session,
                selection.tasks,
                selection.skipped_below_min_tokens,
                provider,
                compression_config,
            )
            .await;
            final_session = compressed_session;
            stats.compression = Some(compression_stats);
        }
    }

    let mut result = CloneResult {
        canonical_session: final_session,
        stats,
        written_to_disk: false,
        session_path: None,
        backup_path: None,
        write_error: None,
        write_error_kind: None,
    };

    if options.write_to_disk {
        // §4.5: any I/O error or conflict aborts the write, but not the
        // whole clone — the in-memory result is still returned with
        // `writtenToDisk=false` and the failure recorded for the caller.
        if let Err(err) = write_clone(config, session_ref, &options, &mut result) {
            result.written_to_disk = false;
            result.write_error_kind = Some(format!("{:?}", err.kind()));
            result.write_error = Some(err.to_string());
        }
    }

    Ok(result)
}

fn write_clone(
    config: &Config,
    session_ref: &SessionRef,
    options: &CloneOptions,
    result: &mut CloneResult,
) -> Result<()> {
    match session_ref {
        SessionRef::Claude { folder, .. } => {
            let base = config.resolved_claude_base()?;
            let Some(folder) = folder.clone().or_else(|| {
                result
                    .canonical_session
                    .first_cwd()
                    .map(|cwd| ctxclone_types::pathcodec::encode_claude_folder(&cwd))
            }) else {
                return Err(Error::SourceUnavailable(
                    "no project folder known for claude clone write".into(),
                ));
            };
            let path = writer::write_claude_session(&base, &folder, &result.canonical_session)?;
            result.written_to_disk = true;
            result.session_path = Some(path.to_string_lossy().into_owned());
        }
        SessionRef::Copilot { workspace_hash, .. } => {
            let base = config.resolved_vscode_base()?;
            let target_hash = options
                .target_workspace_hash
                .as_deref()
                .unwrap_or(workspace_hash);
            let (doc_path, backup_path) = writer::write_copilot_session(
                &base,
                target_hash,
                &result.canonical_session,
                options.title.clone(),
            )?;
            result.written_to_disk = true;
            result.session_path = Some(doc_path.to_string_lossy().into_owned());
            result.backup_path = Some(backup_path.to_string_lossy().into_owned());
        }
    }
    Ok(())
}
