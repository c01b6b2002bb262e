use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// The five router-facing kinds from spec §6/§7. The library never encodes
/// HTTP status codes itself; `kind()` gives an (out-of-scope) router enough
/// to pick one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidSessionId,
    SourceUnavailable,
    WriteConflict,
    IOError,
}

#[derive(Debug)]
pub enum Error {
    /// A session, project, or workspace could not be located.
    NotFound(String),
    /// `sessionId` was not a well-formed UUID.
    InvalidSessionId(String),
    /// The configured base directory for a source does not exist or is
    /// unreadable.
    SourceUnavailable(String),
    /// `SQLITE_BUSY` or equivalent surfaced from the Copilot index writer.
    WriteConflict(String),
    Io(std::io::Error),
    Json(serde_json::Error),
    Config(String),
    Types(ctxclone_types::Error),
    Adapters(ctxclone_adapters::Error),
    Index(ctxclone_index::Error),
    Engine(ctxclone_engine::Error),
    Core(ctxclone_core::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::InvalidSessionId(_) => ErrorKind::InvalidSessionId,
            Error::SourceUnavailable(_) => ErrorKind::SourceUnavailable,
            Error::WriteConflict(_) => ErrorKind::WriteConflict,
            _ => ErrorKind::IOError,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound(msg) => write!(f, "not found: {msg}"),
            Error::InvalidSessionId(msg) => write!(f, "invalid session id: {msg}"),
            Error::SourceUnavailable(msg) => write!(f, "source unavailable: {msg}"),
            Error::WriteConflict(msg) => write!(f, "write conflict: {msg}"),
            Error::Io(err) => write!(f, "IO error: {err}"),
            Error::Json(err) => write!(f, "JSON error: {err}"),
            Error::Config(msg) => write!(f, "configuration error: {msg}"),
            Error::Types(err) => write!(f, "{err}"),
            Error::Adapters(err) => write!(f, "{err}"),
            Error::Index(err) => write!(f, "{err}"),
            Error::Engine(err) => write!(f, "{err}"),
            Error::Core(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Json(err) => Some(err),
            Error::Types(err) => Some(err),
            Error::Adapters(err) => Some(err),
            Error::Index(err) => Some(err),
            Error::Engine(err) => Some(err),
            Error::Core(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<ctxclone_types::Error> for Error {
    fn from(err: ctxclone_types::Error) -> Self {
        Error::Types(err)
    }
}

impl From<ctxclone_adapters::Error> for Error {
    fn from(err: ctxclone_adapters::Error) -> Self {
        Error::Adapters(err)
    }
}

impl From<ctxclone_index::Error> for Error {
    fn from(err: ctxclone_index::Error) -> Self {
        match err {
            ctxclone_index::Error::Busy => {
                Error::WriteConflict("session index is locked by another writer".to_string())
            }
            other => Error::Index(other),
        }
    }
}

impl From<ctxclone_engine::Error> for Error {
    fn from(err: ctxclone_engine::Error) -> Self {
        Error::Engine(err)
    }
}

impl From<ctxclone_core::Error> for Error {
    fn from(err: ctxclone_core::Error) -> Self {
        Error::Core(err)
    }
}
