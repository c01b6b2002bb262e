use std::sync::Arc;

use ctxclone_runtime::ops::{CloneOptions, SessionRef};
use ctxclone_runtime::{Config, ErrorKind};
use ctxclone_types::Source;

use crate::args::{config_path_override, Cli, Commands, SourceArg, ToolHandlingArg};

fn load_config(cli: &Cli) -> ctxclone_runtime::Result<Config> {
    let mut config = match config_path_override() {
        Some(path) => Config::load_from(&path)?,
        None => Config::load()?,
    };
    if cli.claude_base.is_some() {
        config.claude_base = cli.claude_base.clone();
    }
    if cli.vscode_base.is_some() {
        config.vscode_base = cli.vscode_base.clone();
    }
    Ok(config)
}

fn source_of(arg: SourceArg) -> Source {
    match arg {
        SourceArg::Claude => Source::Claude,
        SourceArg::Copilot => Source::Copilot,
    }
}

fn tool_handling_of(arg: ToolHandlingArg) -> ctxclone_engine::ToolHandlingMode {
    match arg {
        ToolHandlingArg::Remove => ctxclone_engine::ToolHandlingMode::Remove,
        ToolHandlingArg::Truncate => ctxclone_engine::ToolHandlingMode::Truncate,
    }
}

fn print_json(value: &impl serde::Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(err) => eprintln!("failed to serialize output: {err}"),
    }
}

pub async fn run(cli: Cli) -> ctxclone_runtime::Result<()> {
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Discover { source } => {
            let projects = ctxclone_runtime::ops::list_projects(&config, source_of(source))?;
            print_json(&projects);
        }
        Commands::Sessions { source, folder } => {
            let sessions =
                ctxclone_runtime::ops::list_sessions(&config, source_of(source), &folder)?;
            print_json(&sessions);
        }
        Commands::Turns {
            source,
            session_id,
            folder,
            workspace_hash,
        } => {
            let session_ref = match source_of(source) {
                Source::Claude => SessionRef::Claude { folder, session_id },
                Source::Copilot => SessionRef::Copilot {
                    workspace_hash: workspace_hash.ok_or_else(|| {
                        ctxclone_runtime::Error::Config(
                            "--workspace-hash is required for --source copilot".into(),
                        )
                    })?,
                    session_id,
                },
            };
            let result = ctxclone_runtime::ops::get_turns(&config, &session_ref)?;
            print_json(&serde_json::json!({
                "sessionId": result.session_id,
                "totalTurns": result.total_turns,
                "turns": result.turns.iter().map(|t| serde_json::json!({
                    "turnIndex": t.turn_index,
                    "cumulative": t.cumulative,
                    "content": t.content,
                })).collect::<Vec<_>>(),
            }));
        }
        Commands::Clone {
            session_id,
            folder,
            tool_removal,
            tool_handling_mode,
            thinking_removal,
            write,
            verbose,
        } => {
            let session_ref = SessionRef::Claude { folder, session_id };
            let options = CloneOptions {
                tool_removal_percent: tool_removal,
                tool_handling_mode: tool_handling_of(tool_handling_mode),
                thinking_removal_percent: thinking_removal,
                write_to_disk: write,
                ..Default::default()
            };
            let result =
                ctxclone_runtime::ops::clone_session(&config, &session_ref, options, None).await?;
            print_clone_result(&result, verbose);
            fail_on_write_error(&result)?;
        }
        Commands::CopilotClone {
            session_id,
            workspace_hash,
            target_workspace_hash,
            title,
            tool_removal,
            tool_handling_mode,
            thinking_removal,
            write,
            verbose,
        } => {
            let session_ref = SessionRef::Copilot {
                workspace_hash,
                session_id,
            };
            let options = CloneOptions {
                tool_removal_percent: tool_removal,
                tool_handling_mode: tool_handling_of(tool_handling_mode),
                thinking_removal_percent: thinking_removal,
                write_to_disk: write,
                target_workspace_hash,
                title,
                ..Default::default()
            };
            let provider: Option<Arc<dyn ctxclone_engine::CompressionProvider>> = None;
            let result =
                ctxclone_runtime::ops::clone_session(&config, &session_ref, options, provider)
                    .await?;
            print_clone_result(&result, verbose);
            fail_on_write_error(&result)?;
        }
    }

    Ok(())
}

fn print_clone_result(result: &ctxclone_types::CloneResult, verbose: bool) {
    if verbose {
        print_json(result);
    } else {
        print_json(&serde_json::json!({
            "stats": result.stats,
            "writtenToDisk": result.written_to_disk,
            "sessionPath": result.session_path,
            "backupPath": result.backup_path,
            "writeError": result.write_error,
            "writeErrorKind": result.write_error_kind,
        }));
    }
}

/// The result is always printed above even when the write itself failed
/// (§4.5: the in-memory result is still returned, only `writtenToDisk` is
/// false); this turns that failure into a non-zero process exit so
/// interactive callers still notice, via the same `kind()` exit-code
/// mapping used for every other error.
fn fail_on_write_error(result: &ctxclone_types::CloneResult) -> ctxclone_runtime::Result<()> {
    let Some(kind) = &result.write_error_kind else {
        return Ok(());
    };
    let message = result.write_error.clone().unwrap_or_default();
    Err(match kind.as_str() {
        "WriteConflict" => ctxclone_runtime::Error::WriteConflict(message),
        _ => ctxclone_runtime::Error::Config(message),
    })
}

pub fn exit_code_for(error: &ctxclone_runtime::Error) -> i32 {
    match error.kind() {
        ErrorKind::NotFound => 2,
        ErrorKind::InvalidSessionId => 2,
        ErrorKind::SourceUnavailable => 3,
        ErrorKind::WriteConflict => 4,
        ErrorKind::IOError => 1,
    }
}
