use super::session::Role;
use serde::{Deserialize, Serialize};

/// Target retained fraction for a compression level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompressionLevel {
    /// Target ~35% of original length.
    Compress,
    /// Target ~10% of original length.
    HeavyCompress,
}

impl CompressionLevel {
    /// Default target retained fraction, overridable via config
    /// (`targetStandard` / `targetHeavy`).
    pub fn default_target_fraction(&self) -> f64 {
        match self {
            CompressionLevel::Compress => 0.35,
            CompressionLevel::HeavyCompress => 0.10,
        }
    }
}

/// A positional range `[startPercent, endPercent)` tagging messages for a
/// compression level. Half-open: a message at exactly `end_percent` falls
/// into the *next* band, not this one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub start_percent: f64,
    pub end_percent: f64,
    pub level: CompressionLevel,
}

impl Band {
    pub fn contains(&self, position_percent: f64) -> bool {
        position_percent >= self.start_percent && position_percent < self.end_percent
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompressionTaskStatus {
    Pending,
    InFlight,
    Success,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionTask {
    pub message_index: usize,
    pub entry_role: Role,
    pub original_content: String,
    pub level: CompressionLevel,
    pub estimated_tokens: u32,
    pub attempt: u32,
    pub timeout_ms: u64,
    pub status: CompressionTaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CompressionTask {
    pub fn new(
        message_index: usize,
        entry_role: Role,
        original_content: String,
        level: CompressionLevel,
        estimated_tokens: u32,
        initial_timeout_ms: u64,
    ) -> Self {
        Self {
            message_index,
            entry_role,
            original_content,
            level,
            estimated_tokens,
            attempt: 0,
            timeout_ms: initial_timeout_ms,
            status: CompressionTaskStatus::Pending,
            result: None,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            CompressionTaskStatus::Success | CompressionTaskStatus::Failed
        )
    }
}
