use std::cmp::Ordering;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

pub fn now_utc_string() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn utc_compact_string(ts: DateTime<Utc>) -> String {
    ts.format("%Y%m%dT%H%M%SZ").to_string()
}

pub fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))
}

pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .with_context(|| format!("failed to open file for hashing: {}", path.display()))?;

    let mut hasher = Sha256::new();
    let mut buf = [0_u8; 8192];

    loop {
        let count = file
            .read(&mut buf)
            .with_context(|| format!("failed to read file for hashing: {}", path.display()))?;
        if count == 0 {
            break;
        }
        hasher.update(&buf[..count]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Copies `source` to `target` and returns the SHA-256 of the copy.
pub fn copy_with_digest(source: &Path, target: &Path) -> Result<String> {
    if let Some(parent) = target.parent() {
        ensure_directory(parent)?;
    }
    fs::copy(source, target).with_context(|| {
        format!(
            "failed to copy {} to {}",
            source.display(),
            target.display()
        )
    })?;
    sha256_file(target)
}

pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }

    let data = serde_json::to_vec_pretty(value)
        .with_context(|| format!("failed to serialize json: {}", path.display()))?;

    let mut file = File::create(path)
        .with_context(|| format!("failed to create json file: {}", path.display()))?;
    file.write_all(&data)
        .with_context(|| format!("failed to write json file: {}", path.display()))?;
    file.write_all(b"\n")
        .with_context(|| format!("failed to finalize json file: {}", path.display()))?;

    Ok(())
}

/// Reads a UTF-8 text file and returns its trimmed, non-empty lines.
pub fn read_nonempty_lines(path: &Path) -> Result<Vec<String>> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let text = String::from_utf8_lossy(&raw);

    Ok(text
        .lines()
        .map(|line| line.trim().trim_start_matches('\u{feff}').trim())
        .filter(|line| !line.is_empty())
        .map(ToOwned::to_owned)
        .collect())
}

/// Lists files in `dir` whose extension matches `ext` case-insensitively.
pub fn list_files_with_extension(dir: &Path, ext: &str) -> Result<Vec<std::path::PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in {}", dir.display()))?;
        let path = entry.path();
        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        let matches = path
            .extension()
            .and_then(|value| value.to_str())
            .map(|value| value.eq_ignore_ascii_case(ext))
            .unwrap_or(false);
        if matches {
            files.push(path);
        }
    }

    Ok(files)
}

/// Compares names the way a file explorer sorts them: digit runs by value, text case-insensitively.
pub fn natural_cmp(left: &str, right: &str) -> Ordering {
    let left_parts = natural_parts(left);
    let right_parts = natural_parts(right);

    for (a, b) in left_parts.iter().zip(right_parts.iter()) {
        let ordering = match (a, b) {
            (NaturalPart::Number(x), NaturalPart::Number(y)) => x.cmp(y),
            (NaturalPart::Number(_), NaturalPart::Text(_)) => Ordering::Less,
            (NaturalPart::Text(_), NaturalPart::Number(_)) => Ordering::Greater,
            (NaturalPart::Text(x), NaturalPart::Text(y)) => x.cmp(y),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    left_parts.len().cmp(&right_parts.len())
}

#[derive(Debug, PartialEq, Eq)]
enum NaturalPart {
    Number(u128),
    Text(String),
}

fn natural_parts(value: &str) -> Vec<NaturalPart> {
    let mut parts = Vec::new();
    let mut digits = String::new();
    let mut text = String::new();

    for ch in value.chars() {
        if ch.is_ascii_digit() {
            if !text.is_empty() {
                parts.push(NaturalPart::Text(std::mem::take(&mut text)));
            }
            digits.push(ch);
        } else {
            if !digits.is_empty() {
                parts.push(NaturalPart::Number(digits.parse().unwrap_or(u128::MAX)));
                digits.clear();
            }
            text.extend(ch.to_lowercase());
        }
    }

    if !digits.is_empty() {
        parts.push(NaturalPart::Number(digits.parse().unwrap_or(u128::MAX)));
    }
    if !text.is_empty() {
        parts.push(NaturalPart::Text(text));
    }

    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn natural_cmp_orders_digit_runs_by_value() {
        let mut names = vec!["file10.txt", "File2.txt", "file1.txt", "a.txt"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, vec!["a.txt", "file1.txt", "File2.txt", "file10.txt"]);
    }

    #[test]
    fn read_nonempty_lines_trims_and_skips_blank_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("cats.txt");
        fs::write(&path, "\u{feff}Men|||Shirts\n\n  Women  \r\n").expect("write");

        let lines = read_nonempty_lines(&path).expect("lines");
        assert_eq!(lines, vec!["Men|||Shirts", "Women"]);
    }
}
