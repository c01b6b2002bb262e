use super::session::CanonicalSession;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompressionStats {
    pub messages_compressed: usize,
    pub messages_skipped: usize,
    pub messages_failed: usize,
    pub original_tokens: u64,
    pub compressed_tokens: u64,
    pub tokens_removed: u64,
    pub reduction_percent: u8,
}

impl CompressionStats {
    /// `reductionPercent = round((1 - compressedTokens/originalTokens) * 100)`
    /// clamped to `[0, 100]`; `0` if `originalTokens == 0`.
    pub fn compute_reduction_percent(original_tokens: u64, compressed_tokens: u64) -> u8 {
        if original_tokens == 0 {
            return 0;
        }
        let ratio = 1.0 - (compressed_tokens as f64 / original_tokens as f64);
        let percent = (ratio * 100.0).round();
        percent.clamp(0.0, 100.0) as u8
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CloneStats {
    pub original_turns: usize,
    pub cloned_turns: usize,
    pub tool_calls_removed: usize,
    pub tool_calls_truncated: usize,
    pub thinking_blocks_removed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression: Option<CompressionStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloneResult {
    pub canonical_session: CanonicalSession,
    pub stats: CloneStats,
    pub written_to_disk: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_path: Option<String>,
    /// Set when `writeToDisk` was requested but the write itself failed
    /// (§4.5 "any I/O error or conflict aborts the whole write; the
    /// in-memory result is still returned to the caller but
    /// `writtenToDisk=false`"). `write_error_kind` is the router-facing
    /// `ErrorKind` name (e.g. `"WriteConflict"`) so the caller can still
    /// surface the right status code without the whole request failing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_error_kind: Option<String>,
}
