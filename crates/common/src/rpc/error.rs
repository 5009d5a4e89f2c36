use reqwest::StatusCode;

use super::WireError;

#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("HTTP request failed: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("remote call failed: {0}")]
    Remote(WireError),
    #[error("HTTP status {0}: {1}")]
    HttpStatus(StatusCode, String),
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}
