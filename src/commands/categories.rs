use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::cli::FillCategoryArgs;
use crate::commands::{FolderTally, log_tally};
use crate::content;
use crate::folders::{self, ResultFolder};
use crate::progress::Progress;
use crate::util;

pub fn run(args: FillCategoryArgs, progress: &Progress) -> Result<()> {
    let categories = load_categories(&args.categories)?;
    let selected = folders::select(&args.folders)?;

    let tally = fill_categories(&selected, &categories, args.preview, progress)?;
    log_tally("fill-category", &tally);
    Ok(())
}

pub fn load_categories(path: &std::path::Path) -> Result<Vec<String>> {
    let categories = util::read_nonempty_lines(path)?;
    if categories.is_empty() {
        bail!("no categories in {}", path.display());
    }
    info!(path = %path.display(), count = categories.len(), "loaded categories");
    Ok(categories)
}

/// Pairs folder *i* with category line *i*; the shorter list decides the count.
pub fn pair_categories<'a>(
    folders: &'a [ResultFolder],
    categories: &'a [String],
) -> Vec<(&'a ResultFolder, &'a str)> {
    if folders.len() != categories.len() {
        warn!(
            folders = folders.len(),
            categories = categories.len(),
            "folder and category counts differ, using the shorter list"
        );
    }

    folders
        .iter()
        .zip(categories.iter().map(String::as_str))
        .collect()
}

pub fn fill_categories(
    folders: &[ResultFolder],
    categories: &[String],
    preview: bool,
    progress: &Progress,
) -> Result<FolderTally> {
    let pairs = pair_categories(folders, categories);
    let bar = progress.bar(pairs.len(), "categories");
    let mut tally = FolderTally::default();

    for (folder, category) in pairs {
        bar.set_message(folder.name.clone());
        if preview {
            info!(folder = %folder.name, category, "would fill category");
            tally.skipped += 1;
            bar.inc(1);
            continue;
        }

        let outcome = content::open(&folder.db_path)
            .and_then(|connection| content::fill_empty_category_columns(&connection, category));
        match outcome {
            Ok(updated) => {
                tally.succeeded += 1;
                tally.affected += updated;
                info!(folder = %folder.name, category, updated, "category filled");
            }
            Err(err) => {
                tally.failed += 1;
                warn!(folder = %folder.name, error = %format!("{err:#}"), "category fill failed");
            }
        }
        bar.inc(1);
    }

    bar.finish_and_clear();
    Ok(tally)
}
