use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;
use tracing::info;

use crate::cli::{BackupMode, DedupeArgs};
use crate::commands::{for_each_database, log_tally};
use crate::content;
use crate::folders;
use crate::progress::Progress;
use crate::util;

pub fn run(args: DedupeArgs, progress: &Progress) -> Result<()> {
    let selected = folders::select(&args.folders)?;
    let table = args.folders.table.as_str();
    let bar = progress.bar(selected.len(), "dedupe");

    let tally = for_each_database(&selected, table, &bar, |folder, connection| {
        if args.preview {
            let stats = content::duplicate_stats(connection, table)?;
            info!(
                folder = %folder.name,
                rows = stats.total_rows,
                duplicate_groups = stats.duplicate_groups,
                without_images = stats.rows_without_images,
                "dedupe preview"
            );
            return Ok(0);
        }

        backup_database(&folder.db_path, args.backup)?;
        dedupe_table(connection, table, args.drop_empty_images)
    });

    log_tally("dedupe", &tally);
    Ok(())
}

/// Copies the database file before it is modified.
///
/// `Once` never overwrites an earlier backup; `Timestamped` writes a new
/// copy under `backup/` every time.
pub fn backup_database(db_path: &Path, mode: BackupMode) -> Result<Option<PathBuf>> {
    let Some(target) = backup_target(db_path, mode) else {
        return Ok(None);
    };

    if mode == BackupMode::Once && target.exists() {
        info!(path = %target.display(), "backup already present");
        return Ok(None);
    }

    let sha256 = util::copy_with_digest(db_path, &target)?;
    info!(path = %target.display(), sha256 = %sha256, "database backed up");
    Ok(Some(target))
}

fn backup_target(db_path: &Path, mode: BackupMode) -> Option<PathBuf> {
    let parent = db_path.parent().unwrap_or_else(|| Path::new("."));
    let stem = db_path
        .file_stem()
        .map(|value| value.to_string_lossy().into_owned())
        .unwrap_or_else(|| "database".to_string());

    match mode {
        BackupMode::Off => None,
        BackupMode::Once => {
            let name = match db_path.extension() {
                Some(ext) => format!("{stem}_backup.{}", ext.to_string_lossy()),
                None => format!("{stem}_backup"),
            };
            Some(parent.join(name))
        }
        BackupMode::Timestamped => Some(
            parent
                .join("backup")
                .join(format!("{stem}_{}.bak", util::utc_compact_string(Utc::now()))),
        ),
    }
}

/// Snapshots the table, removes duplicate SKUs and optionally image-less rows.
pub fn dedupe_table(connection: &Connection, table: &str, drop_empty_images: bool) -> Result<usize> {
    let backup = content::backup_table(connection, table)?;
    let before = content::row_count(connection, table)?;
    let duplicates = content::dedupe_by_sku(connection, table)?;
    let without_images = if drop_empty_images {
        content::delete_rows_without_images(connection, table)?
    } else {
        0
    };

    info!(
        table,
        backup_table = %backup,
        before,
        duplicates,
        without_images,
        "deduplicated"
    );
    Ok(duplicates + without_images)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn once_backup_is_not_overwritten() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("SpiderResult.db3");
        fs::write(&db_path, b"first").expect("write db");

        let target = backup_database(&db_path, BackupMode::Once)
            .expect("backup")
            .expect("created");
        assert_eq!(target, dir.path().join("SpiderResult_backup.db3"));

        fs::write(&db_path, b"second").expect("rewrite db");
        assert!(backup_database(&db_path, BackupMode::Once)
            .expect("backup")
            .is_none());
        assert_eq!(fs::read(&target).expect("read backup"), b"first");
    }

    #[test]
    fn timestamped_backup_goes_under_backup_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("SpiderResult.db3");
        fs::write(&db_path, b"data").expect("write db");

        let target = backup_database(&db_path, BackupMode::Timestamped)
            .expect("backup")
            .expect("created");
        assert_eq!(target.parent(), Some(dir.path().join("backup").as_path()));
        assert!(target.to_string_lossy().ends_with(".bak"));
        assert!(backup_database(&db_path, BackupMode::Off)
            .expect("backup")
            .is_none());
    }
}
