use serde::{Deserialize, Serialize};

/// Body of `POST /wc/v3/products`.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ProductPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regular_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manage_stock: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<ProductAttribute>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<TagRef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<CategoryRef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageRef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub meta_data: Vec<MetaData>,
}

impl ProductPayload {
    /// True when no field besides the product type was filled in.
    pub fn is_empty(&self) -> bool {
        let bare = ProductPayload {
            kind: self.kind.clone(),
            ..ProductPayload::default()
        };
        *self == bare
    }

    #[cfg(test)]
    pub fn attribute(&self, name: &str) -> Option<&ProductAttribute> {
        self.attributes.iter().find(|attribute| attribute.name == name)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProductAttribute {
    pub name: String,
    pub visible: bool,
    pub variation: bool,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TagRef {
    pub name: String,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct CategoryRef {
    pub id: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ImageRef {
    pub src: String,
    pub position: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MetaData {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Product {
    pub id: u64,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

impl Product {
    pub fn url(&self) -> Option<&str> {
        self.permalink
            .as_deref()
            .or(self.link.as_deref())
            .filter(|url| !url.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub parent: u64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct VariationPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regular_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manage_stock: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<i64>,
    pub attributes: Vec<VariationAttribute>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct VariationAttribute {
    pub name: String,
    pub option: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Variation {
    pub id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaResponse {
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub guid: Option<Rendered>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Rendered {
    #[serde(default)]
    pub rendered: Option<String>,
}

impl MediaResponse {
    pub fn url(self) -> Option<String> {
        self.source_url
            .filter(|url| !url.is_empty())
            .or_else(|| self.guid.and_then(|guid| guid.rendered))
            .filter(|url| !url.is_empty())
    }
}

/// A WordPress taxonomy term (`/wp/v2/product_cat`).
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Term {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub parent: u64,
}

/// Body of `POST /wp/v2/menu-items`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MenuItemPayload {
    pub title: String,
    pub status: String,
    pub menu_order: usize,
    pub menus: u64,
    pub parent: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub object: String,
    pub object_id: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct MenuItem {
    pub id: u64,
}
