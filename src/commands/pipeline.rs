//! Post-scrape cleanup in one pass: dedupe, discount, SKU, category fill.

use anyhow::{Result, bail};
use tracing::info;

use crate::cli::{BackupMode, PipelineArgs};
use crate::commands::{FolderTally, categories, dedupe, for_each_database, prices, sku};
use crate::content;
use crate::folders;
use crate::progress::Progress;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Dedupe,
    Discount,
    RandomSku,
    FillCategory,
}

impl Step {
    fn label(self) -> &'static str {
        match self {
            Step::Dedupe => "dedupe",
            Step::Discount => "discount",
            Step::RandomSku => "random-sku",
            Step::FillCategory => "fill-category",
        }
    }
}

fn planned_steps(args: &PipelineArgs) -> Vec<Step> {
    let mut steps = Vec::new();
    if !args.skip_dedupe {
        steps.push(Step::Dedupe);
    }
    if !args.skip_discount {
        steps.push(Step::Discount);
    }
    if !args.skip_sku {
        steps.push(Step::RandomSku);
    }
    if args.categories.is_some() {
        steps.push(Step::FillCategory);
    }
    steps
}

pub fn run(args: PipelineArgs, progress: &Progress) -> Result<()> {
    prices::validate_rate(args.discount_rate)?;
    let steps = planned_steps(&args);
    if steps.is_empty() {
        bail!("every pipeline step is switched off");
    }

    let category_lines = match &args.categories {
        Some(path) => categories::load_categories(path)?,
        None => Vec::new(),
    };

    let selected = folders::select(&args.folders)?;
    if selected.is_empty() {
        bail!("no result databases found under {}", args.folders.root.display());
    }
    let table = args.folders.table.as_str();

    info!(
        folders = selected.len(),
        steps = ?steps.iter().map(|step| step.label()).collect::<Vec<_>>(),
        preview = args.preview,
        "pipeline started"
    );

    let overall = progress.bar(steps.len(), "overall");
    let mut generator = sku::generator_for(&args.sku)?;
    let mut results: Vec<(Step, FolderTally)> = Vec::new();

    for step in steps {
        info!(step = step.label(), "step started");
        let bar = progress.bar(selected.len(), step.label());

        let tally = match step {
            Step::Dedupe => for_each_database(&selected, table, &bar, |folder, connection| {
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
                dedupe::backup_database(&folder.db_path, BackupMode::Timestamped)?;
                dedupe::dedupe_table(connection, table, true)
            }),
            Step::Discount => for_each_database(&selected, table, &bar, |folder, connection| {
                if args.preview {
                    let priced = content::count_numeric_prices(connection, table)?;
                    info!(folder = %folder.name, priced, "discount preview");
                    return Ok(0);
                }
                prices::discount_table(connection, table, args.discount_rate)
            }),
            Step::RandomSku => for_each_database(&selected, table, &bar, |folder, connection| {
                if args.preview {
                    let rows = content::row_count(connection, table)?;
                    info!(folder = %folder.name, rows, "sku preview");
                    return Ok(0);
                }
                sku::assign_skus(connection, table, &args.sku.column, &mut generator)
            }),
            Step::FillCategory => {
                bar.finish_and_clear();
                categories::fill_categories(&selected, &category_lines, args.preview, progress)?
            }
        };

        info!(
            step = step.label(),
            succeeded = tally.succeeded,
            failed = tally.failed,
            affected = tally.affected,
            "step finished"
        );
        results.push((step, tally));
        overall.inc(1);
    }
    overall.finish_and_clear();

    for (step, tally) in &results {
        info!(
            step = step.label(),
            succeeded = tally.succeeded,
            total = selected.len(),
            "pipeline summary"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;

    use super::*;
    use crate::cli::{Cli, Commands};

    fn parse(extra: &[&str]) -> PipelineArgs {
        let mut argv = vec!["shopfeed", "pipeline"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Pipeline(args) => args,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn steps_follow_switches_and_category_file() {
        let args = parse(&[]);
        assert_eq!(
            planned_steps(&args),
            vec![Step::Dedupe, Step::Discount, Step::RandomSku]
        );

        let args = parse(&["--skip-dedupe", "--skip-sku", "--categories", "cats.txt"]);
        assert_eq!(args.categories, Some(PathBuf::from("cats.txt")));
        assert_eq!(planned_steps(&args), vec![Step::Discount, Step::FillCategory]);
    }
}
