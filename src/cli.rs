use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "shopfeed",
    version,
    about = "Scraper-output migration and WooCommerce publishing tooling"
)]
pub struct Cli {
    #[arg(long, global = true, default_value = "shopfeed.toml")]
    pub config: PathBuf,

    #[arg(long, global = true, default_value_t = false)]
    pub no_progress: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Status(StatusArgs),
    Dedupe(DedupeArgs),
    Discount(DiscountArgs),
    ReplaceText(ReplaceTextArgs),
    CopyColumn(CopyColumnArgs),
    SplitColors(SplitColorsArgs),
    UnifySpecs(UnifySpecsArgs),
    RandomSku(RandomSkuArgs),
    FillCategory(FillCategoryArgs),
    Pipeline(PipelineArgs),
    ExportCsv(ExportCsvArgs),
    CsvTransform(CsvTransformArgs),
    CsvCategories(CsvCategoriesArgs),
    #[command(subcommand)]
    Jobs(JobsCommand),
    Publish(PublishArgs),
    Menu(MenuArgs),
    #[command(subcommand)]
    Files(FilesCommand),
}

/// Selects numbered result folders under a data root.
#[derive(Args, Debug, Clone)]
pub struct FolderArgs {
    #[arg(long, default_value = "Data")]
    pub root: PathBuf,

    #[arg(long)]
    pub start: Option<u64>,

    #[arg(long)]
    pub end: Option<u64>,

    #[arg(long, default_value = "SpiderResult.db3")]
    pub db_filename: String,

    #[arg(long, default_value = "Content")]
    pub table: String,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[command(flatten)]
    pub folders: FolderArgs,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum BackupMode {
    /// Copy to SpiderResult_backup.db3 once, never overwrite.
    Once,
    /// Timestamped copy under backup/.
    Timestamped,
    Off,
}

#[derive(Args, Debug, Clone)]
pub struct DedupeArgs {
    #[command(flatten)]
    pub folders: FolderArgs,

    #[arg(long, value_enum, default_value_t = BackupMode::Once)]
    pub backup: BackupMode,

    #[arg(long, default_value_t = false)]
    pub drop_empty_images: bool,

    #[arg(long, default_value_t = false)]
    pub preview: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DiscountArgs {
    #[command(flatten)]
    pub folders: FolderArgs,

    #[arg(long, default_value_t = 0.3)]
    pub rate: f64,

    /// Also convert the regular price by this factor before discounting.
    #[arg(long)]
    pub currency_factor: Option<f64>,

    #[arg(long, default_value_t = false)]
    pub preview: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ReplaceTextArgs {
    #[command(flatten)]
    pub folders: FolderArgs,

    #[arg(long, default_value = "图片")]
    pub column: String,

    #[arg(long, default_value = "https:////")]
    pub from: String,

    #[arg(long, default_value = "https://")]
    pub to: String,
}

#[derive(Args, Debug, Clone)]
pub struct CopyColumnArgs {
    #[command(flatten)]
    pub folders: FolderArgs,

    #[arg(long, default_value = "颜色1")]
    pub from: String,

    #[arg(long, default_value = "颜色")]
    pub to: String,
}

#[derive(Args, Debug, Clone)]
pub struct SplitColorsArgs {
    #[command(flatten)]
    pub folders: FolderArgs,

    #[arg(long, default_value = "颜色1")]
    pub source: String,
}

#[derive(Args, Debug, Clone)]
pub struct UnifySpecsArgs {
    #[command(flatten)]
    pub folders: FolderArgs,

    #[arg(long, default_value = "XS|||S|||M|||L|||XL")]
    pub value: String,
}

#[derive(Args, Debug, Clone)]
pub struct SkuArgs {
    #[arg(long = "sku-prefix", default_value = "SKU")]
    pub prefix: String,

    #[arg(long = "sku-length", default_value_t = 10)]
    pub length: usize,

    #[arg(long = "sku-column", default_value = "SKU")]
    pub column: String,
}

#[derive(Args, Debug, Clone)]
pub struct RandomSkuArgs {
    #[command(flatten)]
    pub folders: FolderArgs,

    #[command(flatten)]
    pub sku: SkuArgs,

    #[arg(long, default_value_t = false)]
    pub preview: bool,
}

#[derive(Args, Debug, Clone)]
pub struct FillCategoryArgs {
    #[command(flatten)]
    pub folders: FolderArgs,

    #[arg(long)]
    pub categories: PathBuf,

    #[arg(long, default_value_t = false)]
    pub preview: bool,
}

#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    #[command(flatten)]
    pub folders: FolderArgs,

    #[command(flatten)]
    pub sku: SkuArgs,

    #[arg(long)]
    pub categories: Option<PathBuf>,

    #[arg(long, default_value_t = 0.2)]
    pub discount_rate: f64,

    #[arg(long, default_value_t = false)]
    pub skip_dedupe: bool,

    #[arg(long, default_value_t = false)]
    pub skip_discount: bool,

    #[arg(long, default_value_t = false)]
    pub skip_sku: bool,

    #[arg(long, default_value_t = false)]
    pub preview: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExportCsvArgs {
    #[command(flatten)]
    pub folders: FolderArgs,

    #[arg(long, default_value = "Content.csv")]
    pub csv_name: String,
}

#[derive(Args, Debug, Clone)]
pub struct CsvTransformArgs {
    #[command(flatten)]
    pub folders: FolderArgs,

    #[arg(long, default_value = "Content.csv")]
    pub csv_name: String,

    /// Upload directory the rewritten image URLs point at; rewrite is skipped when unset.
    #[arg(long)]
    pub image_base_url: Option<String>,

    #[arg(long, default_value = "-2")]
    pub image_suffix: String,
}

#[derive(Args, Debug, Clone)]
pub struct CsvCategoriesArgs {
    #[arg(long)]
    pub dir: PathBuf,

    #[arg(long, default_value = "Categories")]
    pub field: String,
}

#[derive(Subcommand, Debug)]
pub enum JobsCommand {
    Remove(JobsRemoveArgs),
    Assign(JobsAssignArgs),
    Unmatched(JobsUnmatchedArgs),
    Links(JobsLinksArgs),
}

#[derive(Args, Debug, Clone)]
pub struct JobDbArgs {
    #[arg(long, default_value = "Configuration/config.db3")]
    pub db_path: PathBuf,

    #[arg(long)]
    pub start: i64,

    #[arg(long)]
    pub end: i64,
}

#[derive(Args, Debug, Clone)]
pub struct JobsRemoveArgs {
    #[command(flatten)]
    pub job: JobDbArgs,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    #[arg(long, default_value_t = false)]
    pub backup: bool,

    #[arg(long, default_value_t = false)]
    pub keep_related: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum LinkMatch {
    /// File named after the category (or with ||| replaced by ___).
    Name,
    /// Files in natural-sort order, one per job.
    Order,
}

#[derive(Args, Debug, Clone)]
pub struct JobsAssignArgs {
    #[command(flatten)]
    pub job: JobDbArgs,

    #[arg(long)]
    pub categories: PathBuf,

    #[arg(long)]
    pub links_dir: Option<PathBuf>,

    #[arg(long)]
    pub category_links: Option<PathBuf>,

    #[arg(long = "match", value_enum, default_value_t = LinkMatch::Name)]
    pub match_mode: LinkMatch,

    #[arg(long, default_value_t = false)]
    pub start_from_category: bool,

    #[arg(long, default_value_t = false)]
    pub no_file_prefix: bool,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    #[arg(long, default_value = ".")]
    pub report_dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct JobsUnmatchedArgs {
    #[arg(long)]
    pub categories: PathBuf,

    #[arg(long)]
    pub links_dir: PathBuf,

    #[arg(long, default_value = ".")]
    pub report_dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct JobsLinksArgs {
    #[arg(long)]
    pub category_links: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct PublishArgs {
    #[command(flatten)]
    pub folders: FolderArgs,

    #[arg(long, default_value_t = false)]
    pub reset_sent: bool,

    #[arg(long, default_value_t = 1)]
    pub workers: usize,

    #[arg(long, default_value_t = 600)]
    pub throttle_ms: u64,

    #[arg(long, default_value_t = false)]
    pub no_upload_images: bool,

    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct MenuArgs {
    #[command(flatten)]
    pub folders: FolderArgs,

    /// Read category paths from this file instead of published rows.
    #[arg(long)]
    pub from_file: Option<PathBuf>,

    #[arg(long)]
    pub menu_id: u64,

    #[arg(long, default_value = "product_cat")]
    pub taxonomy: String,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum FilesCommand {
    Mkdirs(DirPairArgs),
    HtmlStubs(DirPairArgs),
    ExtractLinks(ExtractLinksArgs),
    Download(DownloadArgs),
}

#[derive(Args, Debug, Clone)]
pub struct DirPairArgs {
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long)]
    pub output: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ExtractLinksArgs {
    #[command(flatten)]
    pub dirs: DirPairArgs,

    #[arg(long)]
    pub base_url: String,
}

#[derive(Args, Debug, Clone)]
pub struct DownloadArgs {
    #[arg(long)]
    pub url: String,

    #[arg(long, default_value = ".")]
    pub output: PathBuf,
}
