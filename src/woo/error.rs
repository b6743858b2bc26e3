/// Errors returned by the WooCommerce and WordPress REST calls.
#[derive(Debug, thiserror::Error)]
pub enum WooError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server error (HTTP {status}): {body}")]
    Status { status: u16, body: String },

    #[error("Term already exists (term_id {term_id})")]
    TermExists { term_id: u64 },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Response is missing {0}")]
    Missing(&'static str),
}

pub type WooResult<T> = Result<T, WooError>;
