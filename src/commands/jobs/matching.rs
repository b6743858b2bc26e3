use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::warn;

use crate::fields::SEPARATOR;
use crate::util;

/// File stem a category is expected under when its name is not usable as-is.
pub fn filename_base(category: &str) -> String {
    category.replace(SEPARATOR, "___")
}

/// `.txt` link files of one directory, by stem and in natural order.
#[derive(Debug, Clone, Default)]
pub struct LinkFiles {
    by_stem: HashMap<String, PathBuf>,
    ordered: Vec<PathBuf>,
}

impl LinkFiles {
    pub fn scan(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            bail!("links directory does not exist: {}", dir.display());
        }

        let mut ordered = Vec::new();
        for path in util::list_files_with_extension(dir, "txt")? {
            let absolute = std::path::absolute(&path)
                .with_context(|| format!("failed to resolve {}", path.display()))?;
            ordered.push(absolute);
        }
        ordered.sort_by(|a, b| natural_file_name_cmp(a, b));

        let by_stem = ordered
            .iter()
            .filter_map(|path| {
                let stem = path.file_stem()?.to_str()?.to_string();
                Some((stem, path.clone()))
            })
            .collect();

        Ok(Self { by_stem, ordered })
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// File named exactly after the category, else after [`filename_base`].
    pub fn by_name(&self, category: &str) -> Option<&Path> {
        self.by_stem
            .get(category)
            .or_else(|| self.by_stem.get(&filename_base(category)))
            .map(PathBuf::as_path)
    }

    pub fn by_position(&self, index: usize) -> Option<&Path> {
        self.ordered.get(index).map(PathBuf::as_path)
    }
}

fn natural_file_name_cmp(a: &Path, b: &Path) -> std::cmp::Ordering {
    let name = |path: &Path| {
        path.file_name()
            .map(|value| value.to_string_lossy().into_owned())
            .unwrap_or_default()
    };
    util::natural_cmp(&name(a), &name(b))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unmatched {
    pub category: String,
    pub expected_file: String,
}

pub fn unmatched_categories(categories: &[String], files: &LinkFiles) -> Vec<Unmatched> {
    categories
        .iter()
        .filter(|category| files.by_name(category).is_none())
        .map(|category| Unmatched {
            category: category.clone(),
            expected_file: format!("{}.txt", filename_base(category)),
        })
        .collect()
}

/// `category|||link` lines; the link is the text after the last separator.
///
/// A category listed twice keeps its last link and its first position.
#[derive(Debug, Clone, Default)]
pub struct CategoryLinks {
    order: Vec<String>,
    links: HashMap<String, String>,
    /// 1-based file line numbers that had no separator.
    malformed: Vec<usize>,
}

impl CategoryLinks {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let links = Self::parse(&String::from_utf8_lossy(&raw));

        if !links.malformed.is_empty() {
            warn!(path = %path.display(), lines = ?links.malformed, "skipped malformed category link lines");
        }
        if links.order.is_empty() {
            bail!("no category links in {}", path.display());
        }
        Ok(links)
    }

    fn parse(text: &str) -> Self {
        let mut parsed = Self::default();
        for (index, line) in text.lines().enumerate() {
            let line = line.trim().trim_start_matches('\u{feff}').trim();
            if line.is_empty() {
                continue;
            }
            let Some((category, link)) = line.rsplit_once(SEPARATOR) else {
                parsed.malformed.push(index + 1);
                continue;
            };
            if parsed
                .links
                .insert(category.to_string(), link.to_string())
                .is_none()
            {
                parsed.order.push(category.to_string());
            }
        }
        parsed
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn get(&self, category: &str) -> Option<&str> {
        self.links.get(category).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.order
            .iter()
            .filter_map(|category| Some((category.as_str(), self.get(category)?)))
    }

    #[cfg(test)]
    pub fn malformed_lines(&self) -> &[usize] {
        &self.malformed
    }
}

fn report_path(dir: &Path, prefix: &str) -> PathBuf {
    dir.join(format!(
        "{prefix}_{}.txt",
        util::utc_compact_string(Utc::now())
    ))
}

pub fn write_unmatched_report(dir: &Path, unmatched: &[Unmatched]) -> Result<PathBuf> {
    util::ensure_directory(dir)?;
    let path = report_path(dir, "unmatched_categories");

    let mut body = format!("# unmatched categories, generated {}\n", util::now_utc_string());
    for (index, entry) in unmatched.iter().enumerate() {
        let _ = writeln!(
            body,
            "{:3}. {}\texpected file: {}",
            index + 1,
            entry.category,
            entry.expected_file
        );
    }
    let _ = writeln!(body, "# total: {}", unmatched.len());

    fs::write(&path, body).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Writes one `category|||link` line per failed category.
pub fn write_failed_links_report(
    dir: &Path,
    failed: &[String],
    links: &CategoryLinks,
) -> Result<PathBuf> {
    util::ensure_directory(dir)?;
    let path = report_path(dir, "failed_category_links");

    let mut body = String::new();
    for category in failed {
        let link = links.get(category).unwrap_or("(no link)");
        let _ = writeln!(body, "{category}{SEPARATOR}{link}");
    }

    fs::write(&path, body).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}
