use std::fmt;

/// Result type for ctxclone-types operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while building or validating the canonical model
#[derive(Debug)]
pub enum Error {
    /// A `tool_result` referenced a `tool_use_id` with no matching `tool_use`
    DanglingToolResult(String),
    /// A required field was absent on an entry that needs it
    InvalidEntry(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DanglingToolResult(id) => {
                write!(f, "tool_result references unknown tool_use id: {}", id)
            }
            Error::InvalidEntry(msg) => write!(f, "invalid entry: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
