//! Copilot session index (C9, Copilot half): the `ItemTable` blob inside
//! `state.vscdb` that the editor reads to list chat sessions, plus backup
//! rotation ahead of every write.

mod backup;
mod db;
mod error;
mod records;
mod schema;

pub use backup::rotate_backups;
pub use db::{Database, SESSION_INDEX_KEY};
pub use error::{Error, Result};
pub use records::{IndexEntry, InitialLocation, SessionIndex};
