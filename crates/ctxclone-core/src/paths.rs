use crate::{Error, Result};
use std::path::PathBuf;

/// Expand a leading `~/` to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Resolve the Claude Code data directory:
/// 1. explicit override
/// 2. `CLAUDE_DIR` environment variable
/// 3. `~/.claude`
pub fn resolve_claude_base(explicit: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(expand_tilde(path));
    }
    if let Ok(env_path) = std::env::var("CLAUDE_DIR") {
        return Ok(expand_tilde(&env_path));
    }
    if let Some(home) = dirs::home_dir() {
        return Ok(home.join(".claude"));
    }
    Err(Error::Config(
        "Could not determine Claude data directory: no HOME directory found".to_string(),
    ))
}

/// Resolve the VS Code Copilot Chat `workspaceStorage` directory:
/// 1. explicit override
/// 2. `VSCODE_STORAGE_PATH` environment variable
/// 3. platform-specific default
pub fn resolve_vscode_base(explicit: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(expand_tilde(path));
    }
    if let Ok(env_path) = std::env::var("VSCODE_STORAGE_PATH") {
        return Ok(expand_tilde(&env_path));
    }

    let config_dir = dirs::config_dir().ok_or_else(|| {
        Error::Config(
            "Could not determine VS Code storage directory: no config directory found"
                .to_string(),
        )
    })?;

    // macOS: dirs::config_dir() -> ~/Library/Application Support
    // Linux:  dirs::config_dir() -> ~/.config
    // Windows: dirs::config_dir() -> %APPDATA%
    Ok(config_dir.join("Code").join("User").join("workspaceStorage"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_tilde_replaces_home() {
        std::env::set_var("HOME", "/home/tester");
        assert_eq!(
            expand_tilde("~/.claude"),
            PathBuf::from("/home/tester/.claude")
        );
    }

    #[test]
    fn expand_tilde_leaves_absolute_paths_alone() {
        assert_eq!(expand_tilde("/opt/claude"), PathBuf::from("/opt/claude"));
    }

    #[test]
    fn resolve_claude_base_prefers_explicit() {
        let resolved = resolve_claude_base(Some("/tmp/explicit-claude")).unwrap();
        assert_eq!(resolved, PathBuf::from("/tmp/explicit-claude"));
    }

    #[test]
    fn resolve_claude_base_uses_env_var() {
        std::env::remove_var("CLAUDE_DIR");
        std::env::set_var("CLAUDE_DIR", "/tmp/env-claude");
        let resolved = resolve_claude_base(None).unwrap();
        assert_eq!(resolved, PathBuf::from("/tmp/env-claude"));
        std::env::remove_var("CLAUDE_DIR");
    }
}
