use std::fmt;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum SourceArg {
    Claude,
    Copilot,
}

impl fmt::Display for SourceArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceArg::Claude => write!(f, "claude"),
            SourceArg::Copilot => write!(f, "copilot"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
#[value(rename_all = "lowercase")]
pub enum ToolHandlingArg {
    #[default]
    Remove,
    Truncate,
}

#[derive(Parser)]
#[command(name = "ctxclone")]
#[command(about = "Discover, analyze, and clone Claude Code / Copilot Chat session archives")]
#[command(version)]
pub struct Cli {
    /// Explicit Claude data directory, overriding `CLAUDE_DIR` / config.
    #[arg(long, global = true)]
    pub claude_base: Option<String>,

    /// Explicit VS Code workspaceStorage directory, overriding
    /// `VSCODE_STORAGE_PATH` / config.
    #[arg(long, global = true)]
    pub vscode_base: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List projects/workspaces for a source.
    Discover {
        #[arg(long, value_enum)]
        source: SourceArg,
    },

    /// List sessions under one project/workspace.
    Sessions {
        #[arg(long, value_enum)]
        source: SourceArg,

        /// Encoded Claude project folder, or Copilot workspace hash.
        #[arg(long)]
        folder: String,
    },

    /// Show per-turn cumulative token usage and extracted content.
    Turns {
        #[arg(long, value_enum)]
        source: SourceArg,

        #[arg(long)]
        session_id: String,

        /// Claude project folder (optional: searched if omitted).
        #[arg(long)]
        folder: Option<String>,

        /// Copilot workspace hash (required for `--source copilot`).
        #[arg(long)]
        workspace_hash: Option<String>,
    },

    /// Produce a cloned Claude session, optionally writing it to disk.
    Clone {
        #[arg(long)]
        session_id: String,

        #[arg(long)]
        folder: Option<String>,

        #[arg(long, default_value_t = 0)]
        tool_removal: u8,

        #[arg(long, value_enum, default_value_t = ToolHandlingArg::Remove)]
        tool_handling_mode: ToolHandlingArg,

        #[arg(long, default_value_t = 0)]
        thinking_removal: u8,

        /// Write the clone to `<claudeBase>/projects/<folder>/<newUuid>.jsonl`.
        #[arg(long)]
        write: bool,

        /// Also print the clone's `CanonicalSession` as JSON.
        #[arg(long)]
        verbose: bool,
    },

    /// Produce a cloned Copilot session, optionally writing it to disk.
    CopilotClone {
        #[arg(long)]
        session_id: String,

        #[arg(long)]
        workspace_hash: String,

        #[arg(long)]
        target_workspace_hash: Option<String>,

        #[arg(long)]
        title: Option<String>,

        #[arg(long, default_value_t = 0)]
        tool_removal: u8,

        #[arg(long, value_enum, default_value_t = ToolHandlingArg::Remove)]
        tool_handling_mode: ToolHandlingArg,

        #[arg(long, default_value_t = 0)]
        thinking_removal: u8,

        #[arg(long)]
        write: bool,

        #[arg(long)]
        verbose: bool,
    },
}

/// Overrides the default config file location (`~/.config/ctxclone/config.toml`).
pub fn config_path_override() -> Option<PathBuf> {
    std::env::var("CTXCLONE_CONFIG_PATH").ok().map(PathBuf::from)
}
