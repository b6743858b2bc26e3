//! Builds a navigation menu from category paths.

mod builder;
#[cfg(test)]
mod tests;
mod tree;

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::MenuArgs;
use crate::config::SiteConfig;
use crate::content;
use crate::fields;
use crate::folders::{self, ResultFolder};
use crate::model::MenuReport;
use crate::util;
use crate::woo::WooClient;

use builder::{MenuBuilder, MenuTally};

pub fn run(args: MenuArgs, config_path: &Path) -> Result<()> {
    let paths = match &args.from_file {
        Some(path) => paths_from_file(path)?,
        None => {
            let selected = folders::select(&args.folders)?;
            published_paths(&selected, &args.folders.table)
        }
    };

    if paths.is_empty() {
        warn!("no category paths found, nothing to build");
        return Ok(());
    }
    for path in paths.iter().take(20) {
        info!(path = %path, "category path");
    }

    let roots = tree::build_tree(&paths);
    info!(
        paths = paths.len(),
        roots = roots.len(),
        nodes = tree::count_nodes(&roots),
        "built menu tree"
    );

    if args.dry_run {
        for line in tree::render(&roots) {
            println!("{line}");
        }
        info!("dry run, no terms or menu items created");
        return Ok(());
    }

    let config = SiteConfig::load(config_path)?;
    let (user, password) = config.wp_credentials()?;
    let client = WooClient::new(&config.base_url)
        .context("failed to build HTTP client")?
        .with_wp_auth(user, password);

    let mut builder = MenuBuilder::new(&client, args.menu_id, &args.taxonomy);
    let terms_loaded = builder
        .preload_terms()
        .with_context(|| format!("failed to load {} terms", args.taxonomy))?;
    info!(taxonomy = %args.taxonomy, terms_loaded, "preloaded terms");

    let mut tally = MenuTally::default();
    builder.create_nodes(&roots, 0, &mut tally);
    info!(
        menu_id = args.menu_id,
        created = tally.created,
        failed = tally.failed,
        terms_cached = builder.cached_terms(),
        "menu build complete"
    );

    if let Some(path) = &args.report {
        let report = MenuReport {
            generated_at: util::now_utc_string(),
            menu_id: args.menu_id,
            taxonomy: args.taxonomy.clone(),
            path_count: paths.len(),
            root_count: roots.len(),
            terms_loaded,
            created: tally.created,
            failed: tally.failed,
        };
        util::write_json_pretty(path, &report)?;
        info!(path = %path.display(), "wrote menu report");
    }

    Ok(())
}

fn paths_from_file(path: &Path) -> Result<BTreeSet<String>> {
    let paths: BTreeSet<String> = util::read_nonempty_lines(path)?
        .into_iter()
        .filter(|line| !fields::split_multi(line).is_empty())
        .collect();
    info!(path = %path.display(), count = paths.len(), "read category paths");
    Ok(paths)
}

/// Distinct categories of published rows across the selected folders.
///
/// A folder that cannot be read is logged and left out.
fn published_paths(folders: &[ResultFolder], table: &str) -> BTreeSet<String> {
    let mut paths = BTreeSet::new();

    for folder in folders {
        let found = content::open(&folder.db_path).and_then(|connection| {
            if content::table_exists(&connection, table)? {
                content::published_category_paths(&connection, table)
            } else {
                Ok(BTreeSet::new())
            }
        });
        match found {
            Ok(found) => {
                info!(folder = %folder.name, paths = found.len(), "collected published categories");
                paths.extend(found);
            }
            Err(err) => {
                warn!(folder = %folder.name, error = %format!("{err:#}"), "failed to read categories");
            }
        }
    }

    paths
}
