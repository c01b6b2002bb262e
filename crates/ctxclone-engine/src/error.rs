use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Types(ctxclone_types::Error),
    /// A session could not be segmented or analyzed in its current shape
    /// (e.g. a tool-pairing invariant was already broken before the engine
    /// ran).
    InvalidSession(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Types(err) => write!(f, "{err}"),
            Error::InvalidSession(msg) => write!(f, "invalid session: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Types(err) => Some(err),
            Error::InvalidSession(_) => None,
        }
    }
}

impl From<ctxclone_types::Error> for Error {
    fn from(err: ctxclone_types::Error) -> Self {
        Error::Types(err)
    }
}
