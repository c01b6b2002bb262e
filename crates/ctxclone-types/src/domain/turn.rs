use serde::{Deserialize, Serialize};

/// `{startIndex, endIndex}` into an ordered entry array (inclusive both ends).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub start_index: usize,
    pub end_index: usize,
}

impl Turn {
    pub fn len(&self) -> usize {
        self.end_index - self.start_index + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Per-turn cumulative token mass partitioned by semantic bucket.
///
/// Invariant: `total == user + assistant + thinking + tool`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokensByType {
    pub user: u64,
    pub assistant: u64,
    pub thinking: u64,
    pub tool: u64,
    pub total: u64,
}

impl TokensByType {
    pub fn new(user: u64, assistant: u64, thinking: u64, tool: u64) -> Self {
        Self {
            user,
            assistant,
            thinking,
            tool,
            total: user + assistant + thinking + tool,
        }
    }

    pub fn add(&mut self, other: &TokensByType) {
        self.user += other.user;
        self.assistant += other.assistant;
        self.thinking += other.thinking;
        self.tool += other.tool;
        self.total += other.total;
    }

    pub fn is_consistent(&self) -> bool {
        self.total == self.user + self.assistant + self.thinking + self.tool
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolBlock {
    pub name: String,
    pub content: String,
}

/// Extracted, human-oriented content of a single turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnContent {
    pub user_prompt: String,
    pub tool_blocks: Vec<ToolBlock>,
    pub tool_results: Vec<ToolBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
    /// Excludes thinking and tool content.
    pub assistant_response: String,
}
