use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::Result;

const RETAIN: usize = 3;

/// Copies `db_path` to a timestamped sibling `<name>.backup-<epoch_ms>` and
/// deletes all but the `RETAIN` most recent backups for that db. Returns the
/// path of the newly created backup.
pub fn rotate_backups(db_path: &Path) -> Result<PathBuf> {
    let backup_path = timestamped_backup_path(db_path);
    std::fs::copy(db_path, &backup_path)?;
    prune_old_backups(db_path)?;
    Ok(backup_path)
}

fn timestamped_backup_path(db_path: &Path) -> PathBuf {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let file_name = db_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "state.vscdb".to_string());
    db_path.with_file_name(format!("{file_name}.backup-{millis}"))
}

fn prune_old_backups(db_path: &Path) -> Result<()> {
    let dir = db_path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = db_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let prefix = format!("{file_name}.backup-");

    let mut backups: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .map(|n| n.to_string_lossy().starts_with(&prefix))
                .unwrap_or(false)
        })
        .collect();

    // Backup filenames embed an epoch-millis suffix, so lexicographic order
    // is also chronological order.
    backups.sort();

    if backups.len() > RETAIN {
        for stale in &backups[..backups.len() - RETAIN] {
            let _ = std::fs::remove_file(stale);
        }
    }

    Ok(())
}
