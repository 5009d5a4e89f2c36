use std::sync::Arc;

use common::node::Node;
use common::repo::Repo;
use common::requests::{
    ConfigError, DatasetRequests, LogRequests, PeerRequests, ProfileRequests, RegistryContext,
    RegistryRequests, RenderRequests, SearchRequests, SelectionRequests,
};
use common::rpc::RpcClient;

/// One request object per domain, all pointed at the same target: either
///  this process's collaborators or a running daemon.
#[derive(Debug, Clone)]
pub struct RequestSet {
    pub datasets: DatasetRequests,
    pub log: LogRequests,
    pub peers: PeerRequests,
    pub profile: ProfileRequests,
    pub registry: RegistryRequests,
    pub render: RenderRequests,
    pub search: SearchRequests,
    pub selection: SelectionRequests,
}

impl RequestSet {
    pub fn local(
        repo: Arc<dyn Repo>,
        node: Arc<dyn Node>,
        registry: Arc<RegistryContext>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            datasets: DatasetRequests::new(Some(repo.clone()), None)?,
            log: LogRequests::new(Some(repo.clone()), None)?,
            peers: PeerRequests::new(Some(node), None)?,
            profile: ProfileRequests::new(Some(repo.clone()), None)?,
            registry: RegistryRequests::new(Some(registry), None)?,
            render: RenderRequests::new(Some(repo.clone()), None)?,
            search: SearchRequests::new(Some(repo.clone()), None)?,
            selection: SelectionRequests::new(Some(repo), None)?,
        })
    }

    pub fn remote(client: RpcClient) -> Result<Self, ConfigError> {
        Ok(Self {
            datasets: DatasetRequests::new(None, Some(client.clone()))?,
            log: LogRequests::new(None, Some(client.clone()))?,
            peers: PeerRequests::new(None, Some(client.clone()))?,
            profile: ProfileRequests::new(None, Some(client.clone()))?,
            registry: RegistryRequests::new(None, Some(client.clone()))?,
            render: RenderRequests::new(None, Some(client.clone()))?,
            search: SearchRequests::new(None, Some(client.clone()))?,
            selection: SelectionRequests::new(None, Some(client))?,
        })
    }
}
