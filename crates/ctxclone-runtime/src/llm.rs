//! Concrete `CompressionProvider` implementations (§4.2 SUPPLEMENT): a
//! `reqwest`-based OpenRouter client, grounded on `vigilo`'s
//! `reqwest::Client` usage in `cursor::api`, and a `claude` CLI subprocess
//! client, grounded on the `claude_cli_call` pattern in
//! `other_examples/caf8b151_yakschuss-wardwell…summarizer.rs`. Both are
//! genuinely external transports (the spec scopes the transport itself out)
//! so they are kept thin and are not exercised in unit tests; only the
//! engine's retry/timeout logic is tested, against an in-memory fake.

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use ctxclone_engine::{CompressionProvider, ProviderError, ProviderResult};
use ctxclone_types::CompressionLevel;

const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

fn instruction_for(level: CompressionLevel) -> &'static str {
    match level {
        CompressionLevel::Compress => {
            "Summarise the following message, retaining roughly 35% of its \
             original length. Preserve any concrete facts, decisions, file \
             paths, or identifiers. Respond with the summary only."
        }
        CompressionLevel::HeavyCompress => {
            "Summarise the following message down to roughly 10% of its \
             original length, keeping only the essential point. Respond \
             with the summary only."
        }
    }
}

/// Calls an OpenRouter chat-completions endpoint with bearer auth from
/// `OPENROUTER_API_KEY`.
pub struct OpenRouterProvider {
    client: reqwest::Client,
    api_key: String,
    small_model: String,
    large_model: String,
}

impl OpenRouterProvider {
    pub fn new(api_key: String, small_model: String, large_model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            small_model,
            large_model,
        }
    }

    pub fn from_env() -> ProviderResult<Self> {
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .map_err(|_| ProviderError::Transport("OPENROUTER_API_KEY not set".into()))?;
        Ok(Self::new(
            api_key,
            std::env::var("OPENROUTER_SMALL_MODEL")
                .unwrap_or_else(|_| "anthropic/claude-3-haiku".into()),
            std::env::var("OPENROUTER_LARGE_MODEL")
                .unwrap_or_else(|_| "anthropic/claude-3-5-sonnet".into()),
        ))
    }
}

#[async_trait]
impl CompressionProvider for OpenRouterProvider {
    async fn compress(
        &self,
        text: &str,
        level: CompressionLevel,
        use_large_model: bool,
    ) -> ProviderResult<String> {
        let model = if use_large_model {
            &self.large_model
        } else {
            &self.small_model
        };

        let body = serde_json::json!({
            "model": model,
            "messages": [
                {"role": "system", "content": instruction_for(level)},
                {"role": "user", "content": text},
            ],
        });

        let response = self
            .client
            .post(OPENROUTER_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Transport(format!(
                "openrouter returned {status}: {body}"
            )));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                ProviderError::InvalidResponse("missing choices[0].message.content".into())
            })?;

        if content.trim().is_empty() {
            return Err(ProviderError::EmptyOutput);
        }
        Ok(content.to_string())
    }
}

/// Spawns the `claude` CLI as a subprocess, writes the prompt to stdin, and
/// parses the `{"result": "..."}` JSON stdout shape.
pub struct ClaudeCliProvider {
    model: String,
}

impl ClaudeCliProvider {
    pub fn new(model: String) -> Self {
        Self { model }
    }

    pub fn from_env() -> Self {
        Self::new(std::env::var("CC_CLI_MODEL").unwrap_or_else(|_| "haiku".into()))
    }
}

#[async_trait]
impl CompressionProvider for ClaudeCliProvider {
    async fn compress(
        &self,
        text: &str,
        level: CompressionLevel,
        _use_large_model: bool,
    ) -> ProviderResult<String> {
        let prompt = format!("{}\n\n---\n\n{text}", instruction_for(level));

        let mut child = tokio::process::Command::new("claude")
            .args([
                "-p",
                "--model",
                &self.model,
                "--output-format",
                "json",
                "--no-session-persistence",
            ])
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ProviderError::Transport(format!("failed to spawn claude: {e}")))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(prompt.as_bytes())
                .await
                .map_err(|e| ProviderError::Transport(format!("failed to write stdin: {e}")))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ProviderError::Transport(format!("claude process error: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProviderError::Transport(format!(
                "claude exited with {}: {stderr}",
                output.status
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let parsed: serde_json::Value = serde_json::from_str(&stdout)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        let result = parsed
            .get("result")
            .and_then(|r| r.as_str())
            .unwrap_or("")
            .to_string();

        if result.trim().is_empty() {
            return Err(ProviderError::EmptyOutput);
        }
        Ok(result)
    }
}
