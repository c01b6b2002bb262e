//! Discovery (C10), configuration, LLM provider wiring (C8 concrete
//! transports), the clone writer (C9 Claude half), and the orchestration
//! `ops` functions a router would call (spec §6).

pub mod config;
pub mod discovery;
pub mod error;
pub mod llm;
pub mod ops;
pub mod writer;

pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use ops::{CloneOptions, GetTurnsResult, SessionRef, TurnAnalysis};
