use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response, multipart};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::error::{WooError, WooResult};
use super::types::{
    Category, MediaResponse, MenuItem, MenuItemPayload, Product, ProductPayload, Term, Variation,
    VariationPayload,
};
use super::{MenuApi, Storefront};

const PER_PAGE: usize = 100;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const MEDIA_ATTEMPTS: u32 = 3;
const MEDIA_BACKOFF: Duration = Duration::from_millis(800);

#[derive(Debug, Clone)]
struct Credentials {
    user: String,
    password: String,
}

/// Blocking REST client for one store.
///
/// WooCommerce endpoints authenticate with the consumer key and secret,
/// WordPress endpoints with a user and application password. Media uploads
/// fall back to the WooCommerce pair when no WordPress login is set.
#[derive(Debug, Clone)]
pub struct WooClient {
    http: Client,
    base_url: String,
    woo: Option<Credentials>,
    wp: Option<Credentials>,
}

impl WooClient {
    pub fn new(base_url: &str) -> WooResult<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            woo: None,
            wp: None,
        })
    }

    pub fn with_woo_auth(mut self, key: String, secret: String) -> Self {
        self.woo = Some(Credentials {
            user: key,
            password: secret,
        });
        self
    }

    pub fn with_wp_auth(mut self, user: String, password: String) -> Self {
        self.wp = Some(Credentials { user, password });
        self
    }

    fn wc_url(&self, path: &str) -> String {
        format!("{}/wp-json/wc/v3/{path}", self.base_url)
    }

    fn wp_url(&self, path: &str) -> String {
        format!("{}/wp-json/wp/v2/{path}", self.base_url)
    }

    fn woo_auth(&self) -> WooResult<&Credentials> {
        self.woo
            .as_ref()
            .ok_or_else(|| WooError::Config("WooCommerce credentials are not set".to_string()))
    }

    fn wp_auth(&self) -> WooResult<&Credentials> {
        self.wp
            .as_ref()
            .ok_or_else(|| WooError::Config("WordPress credentials are not set".to_string()))
    }

    fn media_auth(&self) -> WooResult<&Credentials> {
        self.wp_auth().or_else(|_| self.woo_auth())
    }

    /// Follows `page=1,2,…` until a short page comes back.
    fn get_all<T: DeserializeOwned>(&self, url: &str, creds: &Credentials) -> WooResult<Vec<T>> {
        let mut items = Vec::new();
        for page in 1usize.. {
            let response = authed(self.http.get(url), creds)
                .query(&[("per_page", PER_PAGE), ("page", page)])
                .send()?;
            let batch: Vec<T> = match read_json(response) {
                Ok(batch) => batch,
                // WordPress answers 400 for a page past the end.
                Err(WooError::Status { status: 400, .. }) if page > 1 => break,
                Err(err) => return Err(err),
            };

            let count = batch.len();
            items.extend(batch);
            debug!(url, page, count, "fetched page");
            if count < PER_PAGE {
                break;
            }
        }
        Ok(items)
    }

    fn upload_once(&self, creds: &Credentials, bytes: &[u8], file_name: &str) -> WooResult<String> {
        let part = multipart::Part::bytes(bytes.to_vec())
            .file_name(file_name.to_string())
            .mime_str("image/jpeg")?;
        let form = multipart::Form::new().part("file", part);
        let response = authed(self.http.post(self.wp_url("media")), creds)
            .multipart(form)
            .send()?;
        let media: MediaResponse = read_json(response)?;
        media.url().ok_or(WooError::Missing("source_url"))
    }
}

impl Storefront for WooClient {
    fn find_product_by_sku(&self, sku: &str) -> WooResult<Option<Product>> {
        let response = authed(self.http.get(self.wc_url("products")), self.woo_auth()?)
            .query(&[("sku", sku)])
            .send()?;
        let products: Vec<Product> = read_json(response)?;
        Ok(products.into_iter().next())
    }

    fn create_product(&self, payload: &ProductPayload) -> WooResult<Product> {
        let response = authed(self.http.post(self.wc_url("products")), self.woo_auth()?)
            .json(payload)
            .send()?;
        read_json(response)
    }

    fn create_variation(
        &self,
        product_id: u64,
        payload: &VariationPayload,
    ) -> WooResult<Variation> {
        let url = self.wc_url(&format!("products/{product_id}/variations"));
        let response = authed(self.http.post(url), self.woo_auth()?)
            .json(payload)
            .send()?;
        read_json(response)
    }

    fn list_categories(&self) -> WooResult<Vec<Category>> {
        self.get_all(&self.wc_url("products/categories"), self.woo_auth()?)
    }

    fn create_category(&self, name: &str, parent: u64) -> WooResult<Category> {
        let response = authed(
            self.http.post(self.wc_url("products/categories")),
            self.woo_auth()?,
        )
        .json(&name_and_parent(name, parent))
        .send()?;
        surface_term_exists(read_json(response))
    }

    fn upload_media(&self, path: &Path) -> WooResult<String> {
        let creds = self.media_auth()?;
        let bytes = fs::read(path)?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("image.jpg")
            .to_string();

        let mut attempt = 1;
        loop {
            match self.upload_once(creds, &bytes, &file_name) {
                Ok(url) => return Ok(url),
                Err(err) if attempt < MEDIA_ATTEMPTS => {
                    warn!(path = %path.display(), attempt, error = %err, "media upload failed, retrying");
                    thread::sleep(MEDIA_BACKOFF * attempt);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl MenuApi for WooClient {
    fn list_terms(&self, taxonomy: &str) -> WooResult<Vec<Term>> {
        self.get_all(&self.wp_url(taxonomy), self.wp_auth()?)
    }

    fn create_term(&self, taxonomy: &str, name: &str, parent: u64) -> WooResult<Term> {
        let response = authed(self.http.post(self.wp_url(taxonomy)), self.wp_auth()?)
            .json(&name_and_parent(name, parent))
            .send()?;
        surface_term_exists(read_json(response))
    }

    fn create_menu_item(&self, payload: &MenuItemPayload) -> WooResult<MenuItem> {
        let response = authed(self.http.post(self.wp_url("menu-items")), self.wp_auth()?)
            .json(payload)
            .send()?;
        read_json(response)
    }
}

fn authed(builder: RequestBuilder, creds: &Credentials) -> RequestBuilder {
    builder.basic_auth(&creds.user, Some(&creds.password))
}

fn name_and_parent(name: &str, parent: u64) -> Value {
    if parent == 0 {
        json!({ "name": name })
    } else {
        json!({ "name": name, "parent": parent })
    }
}

fn read_json<T: DeserializeOwned>(response: Response) -> WooResult<T> {
    let status = response.status();
    let body = response.text()?;
    if status.as_u16() >= 400 {
        return Err(WooError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(serde_json::from_str(&body)?)
}

fn surface_term_exists<T>(result: WooResult<T>) -> WooResult<T> {
    match result {
        Err(WooError::Status { status, body }) => match term_exists_id(&body) {
            Some(term_id) => Err(WooError::TermExists { term_id }),
            None => Err(WooError::Status { status, body }),
        },
        other => other,
    }
}

/// Existing term id from a `term_exists` error body.
///
/// WordPress puts it in `data.term_id` and WooCommerce in
/// `data.resource_id`; some versions only fill `additional_data[0]`.
pub(super) fn term_exists_id(body: &str) -> Option<u64> {
    let value: Value = serde_json::from_str(body).ok()?;
    if value.get("code")?.as_str()? != "term_exists" {
        return None;
    }
    value
        .pointer("/data/term_id")
        .or_else(|| value.pointer("/data/resource_id"))
        .and_then(json_id)
        .or_else(|| value.get("additional_data")?.get(0).and_then(json_id))
        .filter(|id| *id != 0)
}

fn json_id(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str()?.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn term_exists_id_reads_data_then_additional_data() {
        let nested = r#"{"code":"term_exists","message":"exists","data":{"status":400,"term_id":42}}"#;
        assert_eq!(term_exists_id(nested), Some(42));

        let woo = r#"{"code":"term_exists","message":"exists","data":{"status":400,"resource_id":"31"}}"#;
        assert_eq!(term_exists_id(woo), Some(31));

        let additional = r#"{"code":"term_exists","additional_data":["17"]}"#;
        assert_eq!(term_exists_id(additional), Some(17));

        let other = r#"{"code":"rest_invalid_param","data":{"term_id":9}}"#;
        assert_eq!(term_exists_id(other), None);
        assert_eq!(term_exists_id("<html>"), None);
    }

    #[test]
    fn term_exists_status_becomes_typed_error() {
        let conflict: WooResult<()> = Err(WooError::Status {
            status: 400,
            body: r#"{"code":"term_exists","data":{"resource_id":8}}"#.to_string(),
        });
        assert!(matches!(
            surface_term_exists(conflict),
            Err(WooError::TermExists { term_id: 8 })
        ));

        let other: WooResult<()> = Err(WooError::Status {
            status: 500,
            body: "oops".to_string(),
        });
        assert!(matches!(
            surface_term_exists(other),
            Err(WooError::Status { status: 500, .. })
        ));
    }

    #[test]
    fn name_and_parent_omits_top_level_parent() {
        assert_eq!(name_and_parent("Men", 0), json!({ "name": "Men" }));
        assert_eq!(
            name_and_parent("Shirts", 7),
            json!({ "name": "Shirts", "parent": 7 })
        );
    }

    #[test]
    fn urls_strip_trailing_slash_from_base() {
        let client = WooClient::new("https://shop.example/").expect("client");
        assert_eq!(
            client.wc_url("products"),
            "https://shop.example/wp-json/wc/v3/products"
        );
        assert_eq!(
            client.wp_url("menu-items"),
            "https://shop.example/wp-json/wp/v2/menu-items"
        );
        assert!(client.woo_auth().is_err());
    }
}
