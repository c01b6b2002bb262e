use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The blob stored under `SESSION_INDEX_KEY` in `state.vscdb`'s `ItemTable`.
/// The editor reads this to list sessions without opening every document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionIndex {
    pub version: i32,
    pub entries: HashMap<String, IndexEntry>,
}

impl Default for SessionIndex {
    fn default() -> Self {
        Self {
            version: 1,
            entries: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Epoch milliseconds.
    pub last_message_date: i64,
    #[serde(default)]
    pub is_imported: bool,
    pub initial_location: InitialLocation,
    #[serde(default)]
    pub is_empty: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InitialLocation {
    Panel,
    Editor,
}
