use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use super::error::RpcError;
use super::{WireError, LIVEZ_PATH, RPC_PREFIX};

/// Client side of the daemon's remote-call channel
#[derive(Debug, Clone)]
pub struct RpcClient {
    remote: Url,
    client: Client,
}

impl RpcClient {
    pub fn new(remote: &Url) -> Result<Self, RpcError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder().default_headers(default_headers).build()?;

        Ok(Self {
            remote: remote.clone(),
            client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.remote
    }

    /// Invoke `method` with JSON-encoded `params`
    pub async fn call<P, R>(&self, method: &str, params: &P) -> Result<R, RpcError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.remote.join(&format!("{}/{}", RPC_PREFIX, method))?;
        let response = self.client.post(url).json(params).send().await?;

        let status = response.status();
        let body = response.bytes().await?;
        if status.is_success() {
            return Ok(serde_json::from_slice(&body)?);
        }

        match serde_json::from_slice::<WireError>(&body) {
            Ok(wire) => Err(RpcError::Remote(wire)),
            Err(_) => Err(RpcError::HttpStatus(
                status,
                String::from_utf8_lossy(&body).into_owned(),
            )),
        }
    }

    /// Check whether a daemon is answering at the remote
    pub async fn ping(&self) -> Result<(), RpcError> {
        let url = self.remote.join(LIVEZ_PATH)?;
        let response = self.client.get(url).send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(RpcError::HttpStatus(
                response.status(),
                response.text().await?,
            ))
        }
    }
}
