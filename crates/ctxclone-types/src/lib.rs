mod error;
pub mod pathcodec;
pub mod tokens;

pub mod domain;

pub use error::{Error, Result};

pub use domain::clone::{CloneResult, CloneStats, CompressionStats};
pub use domain::compression::{
    Band, CompressionLevel, CompressionTask, CompressionTaskStatus,
};
pub use domain::project::{ProjectRef, SessionSummary, Source};
pub use domain::session::{
    CanonicalSession, ContentBlock, Entry, EntryKind, Message, MessageContent, Role, TokenUsage,
};
pub use domain::turn::{TokensByType, Turn, TurnContent, ToolBlock};
