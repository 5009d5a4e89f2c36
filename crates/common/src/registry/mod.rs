use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::RegistryConfig;
use crate::dataset::DatasetRef;

mod http;
mod memory;

pub use self::http::HttpRegistryClient;
pub use memory::MemoryRegistry;

#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    #[error("registry does not support pinning")]
    PinningNotSupported,
    #[error("not found in registry: {0}")]
    NotFound(String),
    #[error("registry request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("registry url error: {0}")]
    Url(#[from] url::ParseError),
    #[error("registry responded {0}: {1}")]
    Status(u16, String),
    #[error("registry error: {0}")]
    Other(String),
}

/// What the registry knows about a dataset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStatus {
    pub published: bool,
}

/// Body of a pin request: the dataset plus the addresses the registry can
///  fetch it from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinRequest {
    #[serde(rename = "ref")]
    pub reference: DatasetRef,
    pub addrs: Vec<String>,
}

/// A remote index that advertises datasets and optionally keeps copies
///  of them (pinning).
#[async_trait]
pub trait RegistryClient: Send + Sync + Debug + 'static {
    /// Ask the registry to fetch and keep the dataset from `addrs`
    ///
    /// # Errors
    /// * `RegistryError::PinningNotSupported` - the registry only indexes
    async fn pin(&self, reference: &DatasetRef, addrs: &[String]) -> Result<(), RegistryError>;

    async fn publish(&self, reference: &DatasetRef) -> Result<(), RegistryError>;

    async fn unpublish(&self, reference: &DatasetRef) -> Result<(), RegistryError>;

    async fn status(&self, reference: &DatasetRef) -> Result<RegistryStatus, RegistryError>;
}

/// Registry client for the configured location, or an in-process one
///  when no location is set.
pub fn from_config(config: &RegistryConfig) -> Result<Arc<dyn RegistryClient>, RegistryError> {
    match &config.location {
        Some(location) => Ok(Arc::new(HttpRegistryClient::new(location)?)),
        None => {
            tracing::debug!("no registry location configured, using in-process registry");
            Ok(Arc::new(MemoryRegistry::new()))
        }
    }
}
