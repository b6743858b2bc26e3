use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::cli::FolderArgs;

/// Inclusive bounds on numeric folder names. A missing bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FolderRange {
    pub start: Option<u64>,
    pub end: Option<u64>,
}

impl FolderRange {
    pub fn new(start: Option<u64>, end: Option<u64>) -> Result<Self> {
        if let (Some(start), Some(end)) = (start, end)
            && start > end
        {
            bail!("folder range start {start} is greater than end {end}");
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, number: u64) -> bool {
        self.start.is_none_or(|start| number >= start) && self.end.is_none_or(|end| number <= end)
    }

    pub fn describe(&self) -> String {
        match (self.start, self.end) {
            (Some(start), Some(end)) => format!("{start}..={end}"),
            (Some(start), None) => format!("{start}.."),
            (None, Some(end)) => format!("..={end}"),
            (None, None) => "all".to_string(),
        }
    }
}

/// A numbered result folder and its database path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultFolder {
    pub number: u64,
    pub name: String,
    pub path: PathBuf,
    pub db_path: PathBuf,
}

/// Parses a folder name made only of ASCII digits.
pub fn folder_number(name: &str) -> Option<u64> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse().ok()
}

/// Lists numeric subfolders of `root` within `range`, sorted by number.
pub fn discover_folders(root: &Path, range: FolderRange) -> Result<Vec<(u64, String, PathBuf)>> {
    if !root.is_dir() {
        bail!("data root is not a directory: {}", root.display());
    }

    let entries =
        fs::read_dir(root).with_context(|| format!("failed to read {}", root.display()))?;

    let mut folders = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in {}", root.display()))?;
        let path = entry.path();
        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_dir()
        {
            continue;
        }

        let Some(name) = entry.file_name().to_str().map(ToOwned::to_owned) else {
            continue;
        };
        let Some(number) = folder_number(&name) else {
            continue;
        };
        if range.contains(number) {
            folders.push((number, name, path));
        }
    }

    folders.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    Ok(folders)
}

/// Like [`discover_folders`], keeping only folders that contain `db_filename`.
pub fn discover_databases(
    root: &Path,
    range: FolderRange,
    db_filename: &str,
) -> Result<Vec<ResultFolder>> {
    let mut found = Vec::new();
    for (number, name, path) in discover_folders(root, range)? {
        let db_path = path.join(db_filename);
        if db_path.is_file() {
            found.push(ResultFolder {
                number,
                name,
                path,
                db_path,
            });
        } else {
            warn!(path = %db_path.display(), "database missing, skipping folder");
        }
    }
    Ok(found)
}

/// Resolves CLI folder arguments into the list of databases to process.
pub fn select(args: &FolderArgs) -> Result<Vec<ResultFolder>> {
    let range = FolderRange::new(args.start, args.end)?;
    let folders = discover_databases(&args.root, range, &args.db_filename)?;

    info!(
        root = %args.root.display(),
        range = %range.describe(),
        folders = folders.len(),
        "selected result folders"
    );

    Ok(folders)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_folder(root: &Path, name: &str, with_db: bool) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).expect("create folder");
        if with_db {
            fs::write(dir.join("SpiderResult.db3"), b"").expect("write db");
        }
    }

    #[test]
    fn range_bounds_are_inclusive_and_optional() {
        let range = FolderRange::new(Some(5), Some(7)).expect("range");
        assert!(!range.contains(4));
        assert!(range.contains(5));
        assert!(range.contains(7));
        assert!(!range.contains(8));

        let open = FolderRange::new(None, Some(3)).expect("range");
        assert!(open.contains(0));
        assert!(!open.contains(4));

        assert!(FolderRange::new(Some(9), Some(1)).is_err());
    }

    #[test]
    fn folder_number_rejects_non_digit_names() {
        assert_eq!(folder_number("0012"), Some(12));
        assert_eq!(folder_number("12a"), None);
        assert_eq!(folder_number("-3"), None);
        assert_eq!(folder_number(""), None);
    }

    #[test]
    fn discover_databases_sorts_numerically_and_skips_missing_databases() {
        let root = tempfile::tempdir().expect("tempdir");
        make_folder(root.path(), "10", true);
        make_folder(root.path(), "9", true);
        make_folder(root.path(), "11", false);
        make_folder(root.path(), "backup", true);
        make_folder(root.path(), "200", true);

        let range = FolderRange::new(Some(1), Some(100)).expect("range");
        let found = discover_databases(root.path(), range, "SpiderResult.db3").expect("found");

        let names: Vec<&str> = found.iter().map(|folder| folder.name.as_str()).collect();
        assert_eq!(names, vec!["9", "10"]);
        assert!(found[0].db_path.ends_with("9/SpiderResult.db3"));
    }

    #[test]
    fn discover_folders_requires_existing_root() {
        let root = tempfile::tempdir().expect("tempdir");
        let missing = root.path().join("nope");
        assert!(discover_folders(&missing, FolderRange::default()).is_err());
    }
}
