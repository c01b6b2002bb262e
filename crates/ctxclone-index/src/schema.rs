use rusqlite::Connection;

use crate::Result;

/// `state.vscdb` is VS Code's generic key-value store; every workbench
/// contribution (including Copilot Chat) shares this one table.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS ItemTable (
            key TEXT UNIQUE ON CONFLICT REPLACE,
            value BLOB
        );
        "#,
    )?;
    Ok(())
}
