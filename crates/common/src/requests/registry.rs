use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use super::{canonicalize, ConfigError, Executor, RequestError};
use crate::config::P2pConfig;
use crate::dataset::DatasetRef;
use crate::node::{Node, NodeError, NodeFactory, Progress};
use crate::registry::{RegistryClient, RegistryError, RegistryStatus};
use crate::repo::Repo;
use crate::rpc::RpcClient;

pub const PUBLISH: &str = "RegistryRequests.Publish";
pub const UNPUBLISH: &str = "RegistryRequests.Unpublish";
pub const STATUS: &str = "RegistryRequests.Status";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishParams {
    #[serde(rename = "ref")]
    pub reference: DatasetRef,
    /// also ask the registry to keep a copy, fetched from this peer
    #[serde(default)]
    pub pin: bool,
}

/// Everything the registry operations need to run in process.
///
/// The node is optional: publishing with pinning builds one through the
///  factory the first time it is needed, and this context owns it from
///  then on.
#[derive(Debug)]
pub struct RegistryContext {
    repo: Arc<dyn Repo>,
    registry: Arc<dyn RegistryClient>,
    factory: Arc<dyn NodeFactory>,
    p2p: P2pConfig,
    node: OnceCell<Arc<dyn Node>>,
    progress: Progress,
}

impl RegistryContext {
    pub fn new(
        repo: Arc<dyn Repo>,
        registry: Arc<dyn RegistryClient>,
        factory: Arc<dyn NodeFactory>,
        p2p: P2pConfig,
    ) -> Self {
        Self {
            repo,
            registry,
            factory,
            p2p,
            node: OnceCell::new(),
            progress: Progress::default(),
        }
    }

    /// Use an existing node instead of building one on demand
    pub fn with_node(mut self, node: Arc<dyn Node>) -> Self {
        self.node = OnceCell::new_with(Some(node));
        self
    }

    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    pub fn node(&self) -> Option<&Arc<dyn Node>> {
        self.node.get()
    }

    async fn node_or_build(&self) -> Result<&Arc<dyn Node>, NodeError> {
        self.node
            .get_or_try_init(|| async {
                tracing::info!("no local node, building one with p2p enabled");
                // publishing needs the network even if this peer normally runs offline
                self.factory.build(&self.p2p.force_enabled())
            })
            .await
    }

    async fn publish(&self, params: &PublishParams) -> Result<DatasetRef, RequestError> {
        let reference = canonicalize(self.repo.as_ref(), &params.reference).await?;

        if !params.pin {
            self.registry.publish(&reference).await?;
            tracing::info!(%reference, "published");
            return Ok(reference);
        }

        let node = self.node_or_build().await?;
        if !node.is_online() {
            tracing::info!(id = %node.id(), "bringing node online to pin");
            node.start_online_services(&self.progress).await?;
        }

        let addrs = node.encapsulated_addresses();
        match self.registry.pin(&reference, &addrs).await {
            Ok(()) => tracing::info!(%reference, addrs = addrs.len(), "pinned"),
            Err(RegistryError::PinningNotSupported) => {
                tracing::info!(%reference, "registry does not support pinning, publishing only")
            }
            Err(e) => {
                tracing::warn!(%reference, "pin failed, not publishing: {}", e);
                return Err(e.into());
            }
        }

        self.registry.publish(&reference).await?;
        tracing::info!(%reference, "published");
        Ok(reference)
    }
}

/// Publish datasets to (and withdraw them from) a registry
#[derive(Debug, Clone)]
pub struct RegistryRequests {
    executor: Executor<Arc<RegistryContext>>,
}

impl RegistryRequests {
    pub fn new(
        local: Option<Arc<RegistryContext>>,
        remote: Option<RpcClient>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            executor: Executor::from_parts(local, remote)?,
        })
    }

    /// Publish a dataset, optionally pinning it first. Returns the
    ///  canonical reference that was published.
    pub async fn publish(&self, params: &PublishParams) -> Result<DatasetRef, RequestError> {
        match &self.executor {
            Executor::Remote(remote) => remote.call(PUBLISH, params).await,
            Executor::Local(local) => local.handle().publish(params).await,
        }
    }

    pub async fn unpublish(&self, reference: &DatasetRef) -> Result<DatasetRef, RequestError> {
        let ctx = match &self.executor {
            Executor::Remote(remote) => return remote.call(UNPUBLISH, reference).await,
            Executor::Local(local) => local.handle(),
        };
        let reference = canonicalize(ctx.repo.as_ref(), reference).await?;
        ctx.registry.unpublish(&reference).await?;
        tracing::info!(%reference, "unpublished");
        Ok(reference)
    }

    pub async fn status(&self, reference: &DatasetRef) -> Result<RegistryStatus, RequestError> {
        let ctx = match &self.executor {
            Executor::Remote(remote) => return remote.call(STATUS, reference).await,
            Executor::Local(local) => local.handle(),
        };
        let reference = canonicalize(ctx.repo.as_ref(), reference).await?;
        Ok(ctx.registry.status(&reference).await?)
    }
}
