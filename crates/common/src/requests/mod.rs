//! Request objects: one per domain, each able to run its operations in
//!  process against a local handle or forward them to a daemon.
//!
//! Every operation has the shape
//!  `async fn op(&self, params) -> Result<Output, RequestError>`; with a
//!  remote executor the local logic never runs and exactly one remote call
//!  is made, named `"<Domain>Requests.<Operation>"`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::dataset::{DatasetRef, RefParseError};
use crate::document::PathError;
use crate::node::NodeError;
use crate::registry::RegistryError;
use crate::repo::{Repo, RepoError};
use crate::rpc::{RpcClient, RpcError, WireError};

pub mod dataset;
pub mod log;
pub mod peer;
pub mod profile;
pub mod registry;
pub mod render;
pub mod search;
pub mod selection;

pub use self::dataset::DatasetRequests;
pub use self::log::LogRequests;
pub use self::peer::PeerRequests;
pub use self::profile::ProfileRequests;
pub use self::registry::{RegistryContext, RegistryRequests};
pub use self::render::RenderRequests;
pub use self::search::SearchRequests;
pub use self::selection::SelectionRequests;

const DEFAULT_PAGE_LIMIT: usize = 25;

/// Errors raised while constructing a request object
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("request object given both a local handle and a remote client")]
    BothTargets,
    #[error("request object needs a local handle or a remote client")]
    NoTarget,
}

/// Failure of a request, identical whether the request ran locally or was
///  forwarded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("empty dataset reference")]
    EmptyRef,
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    Exists(String),
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("registry does not support pinning")]
    PinningNotSupported,
    #[error("registry error: {0}")]
    Registry(String),
    #[error("node error: {0}")]
    Node(String),
    #[error("repo error: {0}")]
    Repo(String),
    #[error("unknown method: {0}")]
    UnknownMethod(String),
    #[error("rpc error: {0}")]
    Rpc(String),
    #[error("internal error: {0}")]
    Internal(String),
}

mod kind {
    pub const EMPTY_REF: &str = "empty_ref";
    pub const INVALID_PARAMS: &str = "invalid_params";
    pub const NOT_FOUND: &str = "not_found";
    pub const EXISTS: &str = "exists";
    pub const INVALID_PATH: &str = "invalid_path";
    pub const INVALID_INDEX: &str = "invalid_index";
    pub const PINNING_NOT_SUPPORTED: &str = "pinning_not_supported";
    pub const REGISTRY: &str = "registry";
    pub const NODE: &str = "node";
    pub const REPO: &str = "repo";
    pub const UNKNOWN_METHOD: &str = "unknown_method";
    pub const RPC: &str = "rpc";
    pub const INTERNAL: &str = "internal";
}

impl RequestError {
    /// Encode for transport. The message carries the variant's payload,
    ///  not its display form.
    pub fn to_wire(&self) -> WireError {
        let (k, message) = match self {
            RequestError::EmptyRef => (kind::EMPTY_REF, String::new()),
            RequestError::InvalidParams(m) => (kind::INVALID_PARAMS, m.clone()),
            RequestError::NotFound(m) => (kind::NOT_FOUND, m.clone()),
            RequestError::Exists(m) => (kind::EXISTS, m.clone()),
            RequestError::Path(PathError::InvalidPath(m)) => (kind::INVALID_PATH, m.clone()),
            RequestError::Path(PathError::InvalidIndex(m)) => (kind::INVALID_INDEX, m.clone()),
            RequestError::PinningNotSupported => (kind::PINNING_NOT_SUPPORTED, String::new()),
            RequestError::Registry(m) => (kind::REGISTRY, m.clone()),
            RequestError::Node(m) => (kind::NODE, m.clone()),
            RequestError::Repo(m) => (kind::REPO, m.clone()),
            RequestError::UnknownMethod(m) => (kind::UNKNOWN_METHOD, m.clone()),
            RequestError::Rpc(m) => (kind::RPC, m.clone()),
            RequestError::Internal(m) => (kind::INTERNAL, m.clone()),
        };
        WireError::new(k, message)
    }
}

impl From<WireError> for RequestError {
    fn from(wire: WireError) -> Self {
        let WireError { kind: k, message } = wire;
        match k.as_str() {
            kind::EMPTY_REF => RequestError::EmptyRef,
            kind::INVALID_PARAMS => RequestError::InvalidParams(message),
            kind::NOT_FOUND => RequestError::NotFound(message),
            kind::EXISTS => RequestError::Exists(message),
            kind::INVALID_PATH => RequestError::Path(PathError::InvalidPath(message)),
            kind::INVALID_INDEX => RequestError::Path(PathError::InvalidIndex(message)),
            kind::PINNING_NOT_SUPPORTED => RequestError::PinningNotSupported,
            kind::REGISTRY => RequestError::Registry(message),
            kind::NODE => RequestError::Node(message),
            kind::REPO => RequestError::Repo(message),
            kind::UNKNOWN_METHOD => RequestError::UnknownMethod(message),
            kind::RPC => RequestError::Rpc(message),
            kind::INTERNAL => RequestError::Internal(message),
            _ => RequestError::Internal(format!("{}: {}", k, message)),
        }
    }
}

impl From<RepoError> for RequestError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(m) => RequestError::NotFound(m),
            RepoError::Exists(m) => RequestError::Exists(m),
            other => RequestError::Repo(other.to_string()),
        }
    }
}

impl From<RegistryError> for RequestError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::PinningNotSupported => RequestError::PinningNotSupported,
            RegistryError::NotFound(m) => RequestError::NotFound(m),
            other => RequestError::Registry(other.to_string()),
        }
    }
}

impl From<NodeError> for RequestError {
    fn from(err: NodeError) -> Self {
        RequestError::Node(err.to_string())
    }
}

impl From<RpcError> for RequestError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::Remote(wire) => wire.into(),
            other => RequestError::Rpc(other.to_string()),
        }
    }
}

impl From<RefParseError> for RequestError {
    fn from(err: RefParseError) -> Self {
        match err {
            RefParseError::Empty => RequestError::EmptyRef,
            other => RequestError::InvalidParams(other.to_string()),
        }
    }
}

/// Runs operations in process against `H`
#[derive(Debug, Clone)]
pub struct LocalExecutor<H> {
    handle: H,
}

impl<H> LocalExecutor<H> {
    pub fn handle(&self) -> &H {
        &self.handle
    }
}

/// Forwards operations to a daemon
#[derive(Debug, Clone)]
pub struct RemoteExecutor {
    client: RpcClient,
}

impl RemoteExecutor {
    pub fn client(&self) -> &RpcClient {
        &self.client
    }

    pub async fn call<P, R>(&self, method: &str, params: &P) -> Result<R, RequestError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        tracing::debug!(method, remote = %self.client.base_url(), "forwarding request");
        Ok(self.client.call(method, params).await?)
    }
}

/// Where a request object sends its work. Exactly one target is ever set.
#[derive(Debug, Clone)]
pub enum Executor<H> {
    Local(LocalExecutor<H>),
    Remote(RemoteExecutor),
}

impl<H> Executor<H> {
    pub fn local(handle: H) -> Self {
        Executor::Local(LocalExecutor { handle })
    }

    pub fn remote(client: RpcClient) -> Self {
        Executor::Remote(RemoteExecutor { client })
    }

    pub fn from_parts(local: Option<H>, remote: Option<RpcClient>) -> Result<Self, ConfigError> {
        match (local, remote) {
            (Some(_), Some(_)) => Err(ConfigError::BothTargets),
            (None, None) => Err(ConfigError::NoTarget),
            (Some(handle), None) => Ok(Executor::local(handle)),
            (None, Some(client)) => Ok(Executor::remote(client)),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Executor::Remote(_))
    }
}

/// Paging shared by listing operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    DEFAULT_PAGE_LIMIT
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}

/// Reject empty references, then resolve through the repo
pub(crate) async fn canonicalize(
    repo: &dyn Repo,
    reference: &DatasetRef,
) -> Result<DatasetRef, RequestError> {
    if reference.is_empty() {
        return Err(RequestError::EmptyRef);
    }
    Ok(repo.canonicalize(reference).await?)
}

#[cfg(test)]
mod test {
    use super::*;

    fn client() -> RpcClient {
        RpcClient::new(&"http://127.0.0.1:2504".parse().unwrap()).unwrap()
    }

    #[test]
    fn test_executor_needs_exactly_one_target() {
        assert_eq!(
            Executor::<()>::from_parts(Some(()), Some(client())).unwrap_err(),
            ConfigError::BothTargets
        );
        assert_eq!(
            Executor::<()>::from_parts(None, None).unwrap_err(),
            ConfigError::NoTarget
        );
        assert!(!Executor::from_parts(Some(()), None).unwrap().is_remote());
        assert!(Executor::<()>::from_parts(None, Some(client()))
            .unwrap()
            .is_remote());
    }

    #[test]
    fn test_errors_survive_the_wire() {
        let errors = vec![
            RequestError::EmptyRef,
            RequestError::InvalidParams("limit".to_string()),
            RequestError::NotFound("b5/precip".to_string()),
            RequestError::Exists("precip".to_string()),
            RequestError::Path(PathError::InvalidPath("meta.nope".to_string())),
            RequestError::Path(PathError::InvalidIndex("x".to_string())),
            RequestError::PinningNotSupported,
            RequestError::Registry("502".to_string()),
            RequestError::Node("bind".to_string()),
            RequestError::Repo("disk".to_string()),
            RequestError::UnknownMethod("Nope.Nope".to_string()),
            RequestError::Rpc("refused".to_string()),
            RequestError::Internal("oops".to_string()),
        ];
        for err in errors {
            let wire = serde_json::to_string(&err.to_wire()).unwrap();
            let back: WireError = serde_json::from_str(&wire).unwrap();
            assert_eq!(RequestError::from(back), err);
        }
    }

    #[test]
    fn test_unknown_wire_kind_is_internal() {
        let err = RequestError::from(WireError::new("teapot", "short and stout"));
        assert_eq!(
            err,
            RequestError::Internal("teapot: short and stout".to_string())
        );
    }

    #[test]
    fn test_list_params_defaults() {
        let params: ListParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params, ListParams::default());
        assert_eq!(params.limit, DEFAULT_PAGE_LIMIT);
    }
}
