//! Configuration (§6 "Configuration (enumerated)"): every knob defaults, is
//! loadable from `~/.config/ctxclone/config.toml`, and is overridable by an
//! environment variable, following the same explicit → env → default ladder
//! the teacher workspace uses for its own data directory resolution.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LlmProvider {
    OpenRouter,
    CcCli,
}

impl Default for LlmProvider {
    fn default() -> Self {
        LlmProvider::OpenRouter
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "openrouter" => Ok(LlmProvider::OpenRouter),
            "cc-cli" => Ok(LlmProvider::CcCli),
            other => Err(Error::Config(format!(
                "unknown LLM_PROVIDER '{other}', expected 'openrouter' or 'cc-cli'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub claude_base: Option<String>,
    pub vscode_base: Option<String>,
    pub concurrency: usize,
    pub timeout_initial: u64,
    pub timeout_increment: u64,
    pub max_attempts: u32,
    pub min_tokens: u32,
    pub thinking_threshold: u32,
    pub target_heavy: u8,
    pub target_standard: u8,
    pub llm_provider: LlmProvider,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            claude_base: None,
            vscode_base: None,
            concurrency: 10,
            timeout_initial: 5_000,
            timeout_increment: 0,
            max_attempts: 4,
            min_tokens: 20,
            thinking_threshold: 1_000,
            target_heavy: 10,
            target_standard: 35,
            llm_provider: LlmProvider::OpenRouter,
        }
    }
}

impl Config {
    /// Load from the default config path, falling back to defaults if the
    /// file does not exist, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = Self::default_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str::<Config>(&content)?
        } else {
            Config::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            Error::Config("could not determine config directory: no HOME/APPDATA found".into())
        })?;
        Ok(config_dir.join("ctxclone").join("config.toml"))
    }

    /// `CLAUDE_DIR`, `VSCODE_STORAGE_PATH`, and the compression/provider
    /// knobs each override the file value (or default) when set.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("CLAUDE_DIR") {
            self.claude_base = Some(v);
        }
        if let Ok(v) = std::env::var("VSCODE_STORAGE_PATH") {
            self.vscode_base = Some(v);
        }
        if let Some(v) = parsed_env("CTXCLONE_CONCURRENCY") {
            self.concurrency = v;
        }
        if let Some(v) = parsed_env("CTXCLONE_TIMEOUT_INITIAL") {
            self.timeout_initial = v;
        }
        if let Some(v) = parsed_env("CTXCLONE_TIMEOUT_INCREMENT") {
            self.timeout_increment = v;
        }
        if let Some(v) = parsed_env("CTXCLONE_MAX_ATTEMPTS") {
            self.max_attempts = v;
        }
        if let Some(v) = parsed_env("CTXCLONE_MIN_TOKENS") {
            self.min_tokens = v;
        }
        if let Some(v) = parsed_env("CTXCLONE_THINKING_THRESHOLD") {
            self.thinking_threshold = v;
        }
        if let Some(v) = parsed_env("CTXCLONE_TARGET_HEAVY") {
            self.target_heavy = v;
        }
        if let Some(v) = parsed_env("CTXCLONE_TARGET_STANDARD") {
            self.target_standard = v;
        }
        if let Ok(v) = std::env::var("LLM_PROVIDER") {
            if let Ok(provider) = v.parse::<LlmProvider>() {
                self.llm_provider = provider;
            }
        }
    }

    pub fn resolved_claude_base(&self) -> Result<PathBuf> {
        Ok(ctxclone_core::resolve_claude_base(
            self.claude_base.as_deref(),
        )?)
    }

    pub fn resolved_vscode_base(&self) -> Result<PathBuf> {
        Ok(ctxclone_core::resolve_vscode_base(
            self.vscode_base.as_deref(),
        )?)
    }
}

fn parsed_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_matches_spec_defaults() {
        let config = Config::default();
        assert_eq!(config.concurrency, 10);
        assert_eq!(config.timeout_initial, 5_000);
        assert_eq!(config.max_attempts, 4);
        assert_eq!(config.min_tokens, 20);
        assert_eq!(config.thinking_threshold, 1_000);
        assert_eq!(config.target_heavy, 10);
        assert_eq!(config.target_standard, 35);
        assert_eq!(config.llm_provider, LlmProvider::OpenRouter);
    }

    #[test]
    fn load_nonexistent_path_returns_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.toml");
        std::env::remove_var("CTXCLONE_CONCURRENCY");
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.concurrency, 10);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.concurrency = 4;
        config.save_to(&path).unwrap();

        std::env::remove_var("CTXCLONE_CONCURRENCY");
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.concurrency, 4);
    }

    #[test]
    fn env_var_overrides_file_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let config = Config::default();
        config.save_to(&path).unwrap();

        std::env::set_var("CTXCLONE_CONCURRENCY", "2");
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.concurrency, 2);
        std::env::remove_var("CTXCLONE_CONCURRENCY");
    }

    #[test]
    fn unknown_llm_provider_string_is_rejected() {
        assert!("grok".parse::<LlmProvider>().is_err());
    }
}
