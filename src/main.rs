mod cli;
mod commands;
mod config;
mod content;
mod fields;
mod folders;
mod model;
mod progress;
mod util;
mod woo;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, FilesCommand, JobsCommand};

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let progress = progress::Progress::new(!cli.no_progress);

    match cli.command {
        Commands::Status(args) => commands::status::run(args),
        Commands::Dedupe(args) => commands::dedupe::run(args, &progress),
        Commands::Discount(args) => commands::prices::run(args, &progress),
        Commands::ReplaceText(args) => commands::columns::replace_text(args, &progress),
        Commands::CopyColumn(args) => commands::columns::copy_column(args, &progress),
        Commands::SplitColors(args) => commands::columns::split_colors(args, &progress),
        Commands::UnifySpecs(args) => commands::columns::unify_specs(args, &progress),
        Commands::RandomSku(args) => commands::sku::run(args, &progress),
        Commands::FillCategory(args) => commands::categories::run(args, &progress),
        Commands::Pipeline(args) => commands::pipeline::run(args, &progress),
        Commands::ExportCsv(args) => commands::csv_transform::export(args),
        Commands::CsvTransform(args) => commands::csv_transform::transform(args),
        Commands::CsvCategories(args) => commands::csv_transform::format_categories(args),
        Commands::Jobs(JobsCommand::Remove(args)) => commands::jobs::remove(args),
        Commands::Jobs(JobsCommand::Assign(args)) => commands::jobs::assign(args, &progress),
        Commands::Jobs(JobsCommand::Unmatched(args)) => commands::jobs::unmatched(args),
        Commands::Jobs(JobsCommand::Links(args)) => commands::jobs::links(args),
        Commands::Publish(args) => commands::publish::run(args, &cli.config, &progress),
        Commands::Menu(args) => commands::menu::run(args, &cli.config),
        Commands::Files(FilesCommand::Mkdirs(args)) => commands::files::mkdirs(args),
        Commands::Files(FilesCommand::HtmlStubs(args)) => commands::files::html_stubs(args),
        Commands::Files(FilesCommand::ExtractLinks(args)) => commands::files::extract_links(args),
        Commands::Files(FilesCommand::Download(args)) => commands::files::download(args),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
