use serde::Serialize;

/// Column names the scraper writes into `Content`.
pub mod columns {
    pub const ID: &str = "ID";
    pub const TITLE: &str = "标题";
    pub const CONTENT: &str = "内容";
    pub const SHORT_DESCRIPTION: &str = "简介";
    pub const CATEGORY: &str = "分类";
    pub const IMAGES: &str = "图片";
    pub const REGULAR_PRICE: &str = "销售价";
    pub const SALE_PRICE: &str = "折扣价";
    pub const SKU: &str = "SKU";
    pub const TAGS: &str = "标签";
    pub const COLOR: &str = "颜色";
    pub const SIZE: &str = "规格";
    pub const BRAND: &str = "品牌";
    pub const STOCK: &str = "库存";
    pub const WEIGHT: &str = "重量";
    pub const SENT: &str = "已发";
    pub const PAGE_URL: &str = "PageUrl";
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct PublishCounts {
    pub rows: usize,
    pub uploaded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub variations: usize,
}

impl PublishCounts {
    pub fn add(&mut self, other: &PublishCounts) {
        self.rows += other.rows;
        self.uploaded += other.uploaded;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.variations += other.variations;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FolderPublishReport {
    pub folder: String,
    pub status: String,
    pub error: Option<String>,
    pub counts: PublishCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishReport {
    pub started_at: String,
    pub finished_at: String,
    pub base_url: String,
    pub workers: usize,
    pub folder_count: usize,
    pub totals: PublishCounts,
    pub folders: Vec<FolderPublishReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MenuReport {
    pub generated_at: String,
    pub menu_id: u64,
    pub taxonomy: String,
    pub path_count: usize,
    pub root_count: usize,
    pub terms_loaded: usize,
    pub created: usize,
    pub failed: usize,
}
