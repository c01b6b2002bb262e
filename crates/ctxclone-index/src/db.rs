use std::path::Path;
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};

use crate::records::SessionIndex;
use crate::schema::init_schema;
use crate::Result;

/// Configured key under `ItemTable` that holds the session index blob.
/// Resolved per the Open Question in §9: the host editor's actual key is
/// implementation-specific, so we pin one and let it be overridden.
pub const SESSION_INDEX_KEY: &str = "workbench.panel.chatSessionStore.index";

pub struct Database {
    conn: Connection,
    index_key: String,
}

impl Database {
    pub fn open(db_path: &Path) -> Result<Self> {
        Self::open_with_key(db_path, SESSION_INDEX_KEY)
    }

    pub fn open_with_key(db_path: &Path, index_key: &str) -> Result<Self> {
        if index_key.is_empty() {
            return Err(crate::Error::IndexKeyMissing);
        }
        let conn = Connection::open(db_path)?;
        conn.busy_timeout(Duration::from_millis(2_000))?;
        init_schema(&conn)?;
        Ok(Self {
            conn,
            index_key: index_key.to_string(),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self {
            conn,
            index_key: SESSION_INDEX_KEY.to_string(),
        })
    }

    /// Reads the session index blob, defaulting to an empty index if the
    /// key has never been written (a fresh workspace).
    pub fn read_session_index(&self) -> Result<SessionIndex> {
        let blob: Option<Vec<u8>> = self
            .conn
            .query_row(
                "SELECT value FROM ItemTable WHERE key = ?1",
                params![self.index_key],
                |row| row.get(0),
            )
            .optional()?;

        match blob {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(SessionIndex::default()),
        }
    }

    /// Upserts one session's index entry inside a single immediate
    /// transaction, per the C9 write protocol (§4.5 step 3). A concurrent
    /// writer holding the lock surfaces as `Error::Busy`.
    pub fn upsert_session_entry(
        &mut self,
        session_id: &str,
        entry: crate::records::IndexEntry,
    ) -> Result<()> {
        let tx = self.conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

        let blob: Option<Vec<u8>> = tx
            .query_row(
                "SELECT value FROM ItemTable WHERE key = ?1",
                params![self.index_key],
                |row| row.get(0),
            )
            .optional()?;

        let mut index: SessionIndex = match blob {
            Some(bytes) => serde_json::from_slice(&bytes)?,
            None => SessionIndex::default(),
        };
        index.entries.insert(session_id.to_string(), entry);

        let serialized = serde_json::to_vec(&index)?;
        tx.execute(
            "INSERT INTO ItemTable (key, value) VALUES (?1, ?2)",
            params![self.index_key, serialized],
        )?;
        tx.commit()?;
        Ok(())
    }
}
