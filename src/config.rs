use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tracing::{debug, info};

const ENV_BASE_URL: &str = "SHOPFEED_BASE_URL";
const ENV_WC_KEY: &str = "WC_CONSUMER_KEY";
const ENV_WC_SECRET: &str = "WC_CONSUMER_SECRET";
const ENV_WP_USER: &str = "WP_USER";
const ENV_WP_PASSWORD: &str = "WP_APP_PASSWORD";

/// Contents of `shopfeed.toml`. Every table is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub site: SiteSection,
    pub woocommerce: WooSection,
    pub wordpress: WordPressSection,
    pub publish: PublishSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SiteSection {
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WooSection {
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WordPressSection {
    pub user: Option<String>,
    pub app_password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PublishSection {
    pub fields: FieldToggles,
}

/// Which `Content` columns are sent to WooCommerce.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FieldToggles {
    pub title: bool,
    pub content: bool,
    pub category: bool,
    pub images: bool,
    pub regular_price: bool,
    pub sale_price: bool,
    pub sku: bool,
    pub short_description: bool,
    pub tags: bool,
    pub color: bool,
    pub size: bool,
    pub brand: bool,
    pub stock: bool,
    pub weight: bool,
    pub page_url: bool,
}

impl Default for FieldToggles {
    fn default() -> Self {
        Self {
            title: true,
            content: true,
            category: true,
            images: true,
            regular_price: true,
            sale_price: true,
            sku: true,
            short_description: true,
            tags: false,
            color: true,
            size: false,
            brand: false,
            stock: true,
            weight: false,
            page_url: true,
        }
    }
}

/// Resolved connection settings for one store.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub base_url: String,
    pub woo_key: Option<String>,
    pub woo_secret: Option<String>,
    pub wp_user: Option<String>,
    pub wp_password: Option<String>,
    pub fields: FieldToggles,
}

impl SiteConfig {
    /// Loads the config file (when present) and applies environment overrides.
    ///
    /// Priority: env vars > config file.
    pub fn load(path: &Path) -> Result<Self> {
        let file = load_config_file(path)?;
        Self::resolve(file, |key| std::env::var(key).ok())
    }

    fn resolve(file: ConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = env(ENV_BASE_URL)
            .or(file.site.base_url)
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty());
        let Some(base_url) = base_url else {
            bail!("missing site base_url; set {ENV_BASE_URL} or [site].base_url");
        };

        Ok(Self {
            base_url,
            woo_key: env(ENV_WC_KEY).or(file.woocommerce.consumer_key),
            woo_secret: env(ENV_WC_SECRET).or(file.woocommerce.consumer_secret),
            wp_user: env(ENV_WP_USER).or(file.wordpress.user),
            wp_password: env(ENV_WP_PASSWORD).or(file.wordpress.app_password),
            fields: file.publish.fields,
        })
    }

    pub fn woo_credentials(&self) -> Result<(String, String)> {
        match (&self.woo_key, &self.woo_secret) {
            (Some(key), Some(secret)) => Ok((key.clone(), secret.clone())),
            _ => bail!(
                "missing WooCommerce credentials; set {ENV_WC_KEY}/{ENV_WC_SECRET} or [woocommerce]"
            ),
        }
    }

    pub fn wp_credentials(&self) -> Result<(String, String)> {
        match (&self.wp_user, &self.wp_password) {
            (Some(user), Some(password)) => Ok((user.clone(), password.clone())),
            _ => bail!(
                "missing WordPress credentials; set {ENV_WP_USER}/{ENV_WP_PASSWORD} or [wordpress]"
            ),
        }
    }
}

fn load_config_file(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        debug!(path = %path.display(), "config file not found, using environment only");
        return Ok(ConfigFile::default());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let parsed: ConfigFile =
        toml::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))?;
    info!(path = %path.display(), "loaded config file");
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_overrides_file_values() {
        let file: ConfigFile = toml::from_str(
            r#"
            [site]
            base_url = "https://file.example/"
            [woocommerce]
            consumer_key = "ck_file"
            consumer_secret = "cs_file"
            [publish.fields]
            tags = true
            weight = true
            "#,
        )
        .expect("valid toml");

        let config = SiteConfig::resolve(file, |key| match key {
            ENV_WC_KEY => Some("ck_env".to_string()),
            _ => None,
        })
        .expect("resolved config");

        assert_eq!(config.base_url, "https://file.example");
        assert_eq!(
            config.woo_credentials().expect("woo credentials"),
            ("ck_env".to_string(), "cs_file".to_string())
        );
        assert!(config.fields.tags);
        assert!(config.fields.weight);
        assert!(config.fields.title);
        assert!(!config.fields.size);
        assert!(config.wp_credentials().is_err());
    }

    #[test]
    fn missing_base_url_is_an_error() {
        let result = SiteConfig::resolve(ConfigFile::default(), |_| None);
        assert!(result.is_err());
    }
}
