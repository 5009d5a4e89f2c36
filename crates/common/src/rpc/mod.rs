use std::fmt;

use serde::{Deserialize, Serialize};

mod client;
mod error;

pub use client::RpcClient;
pub use error::RpcError;

/// Path prefix procedures are served under, e.g.
///  `POST /rpc/DatasetRequests.List`
pub const RPC_PREFIX: &str = "/rpc";

/// Path of the daemon's liveness probe
pub const LIVEZ_PATH: &str = "/_status/livez";

/// Error body returned by the daemon for any failed call. `kind` names the
///  error variant and `message` carries its payload, which is enough to
///  rebuild the same error on the calling side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireError {
    pub kind: String,
    pub message: String,
}

impl WireError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}
