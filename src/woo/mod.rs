//! WooCommerce and WordPress REST access.
//!
//! Commands talk to the store through [`Storefront`] and [`MenuApi`] so the
//! publish and menu logic can run against an in-memory store in tests.

use std::path::Path;

mod client;
mod error;
mod types;

pub use client::WooClient;
pub use error::{WooError, WooResult};
pub use types::{
    Category, CategoryRef, ImageRef, MenuItem, MenuItemPayload, MetaData, Product,
    ProductAttribute, ProductPayload, TagRef, Term, Variation, VariationAttribute,
    VariationPayload,
};

/// Product-side calls used by `publish`.
pub trait Storefront: Sync {
    /// First product carrying `sku`, if any.
    fn find_product_by_sku(&self, sku: &str) -> WooResult<Option<Product>>;

    fn create_product(&self, payload: &ProductPayload) -> WooResult<Product>;

    fn create_variation(&self, product_id: u64, payload: &VariationPayload)
    -> WooResult<Variation>;

    /// Every product category, across all pages.
    fn list_categories(&self) -> WooResult<Vec<Category>>;

    /// Creates a category; `parent` 0 means top level. An existing category
    /// surfaces as [`WooError::TermExists`].
    fn create_category(&self, name: &str, parent: u64) -> WooResult<Category>;

    /// Uploads a local image to the media library and returns its public URL.
    fn upload_media(&self, path: &Path) -> WooResult<String>;
}

/// Taxonomy and menu calls used by `menu`.
pub trait MenuApi {
    fn list_terms(&self, taxonomy: &str) -> WooResult<Vec<Term>>;

    /// Creates a term. An existing term surfaces as [`WooError::TermExists`].
    fn create_term(&self, taxonomy: &str, name: &str, parent: u64) -> WooResult<Term>;

    fn create_menu_item(&self, payload: &MenuItemPayload) -> WooResult<MenuItem>;
}
