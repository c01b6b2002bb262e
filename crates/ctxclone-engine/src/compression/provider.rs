//! The LLM capability as a port (§4.2 "LLM capability"). The engine depends
//! only on this trait object; concrete transports (HTTP, subprocess) live in
//! `ctxclone-runtime` and are never imported here.

use std::fmt;

use async_trait::async_trait;
use ctxclone_types::CompressionLevel;

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// A task error (§7 `CompressionTaskError`/`CompressionTimeout`). Recoverable
/// at engine scope: the scheduler retries up to `maxAttempts` and counts a
/// terminal failure in stats rather than propagating it.
#[derive(Debug)]
pub enum ProviderError {
    Transport(String),
    Timeout,
    EmptyOutput,
    InvalidResponse(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Transport(msg) => write!(f, "transport error: {msg}"),
            ProviderError::Timeout => write!(f, "timed out"),
            ProviderError::EmptyOutput => write!(f, "empty output"),
            ProviderError::InvalidResponse(msg) => write!(f, "invalid response: {msg}"),
        }
    }
}

impl std::error::Error for ProviderError {}

/// `compress(text, level, useLargeModel) -> compressed text`. `useLargeModel`
/// is computed by the caller from the "useful-large threshold" (§4.2); the
/// provider itself never decides routing.
#[async_trait]
pub trait CompressionProvider: Send + Sync {
    async fn compress(
        &self,
        text: &str,
        level: CompressionLevel,
        use_large_model: bool,
    ) -> ProviderResult<String>;
}
