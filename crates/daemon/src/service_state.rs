use std::sync::Arc;

use common::config::P2pConfig;
use common::node::{Node, NodeError, NodeFactory, TcpNodeFactory};
use common::registry::{self, RegistryClient, RegistryError};
use common::repo::{FsRepo, Repo, RepoError};
use common::requests::{ConfigError, RegistryContext};

use super::service_config::Config;
use crate::request_set::RequestSet;
use crate::state::default_profile;

/// Main service state - the collaborators behind every request
#[derive(Debug, Clone)]
pub struct State {
    repo: Arc<dyn Repo>,
    node: Arc<dyn Node>,
    p2p: P2pConfig,
    requests: RequestSet,
}

impl State {
    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        // 1. Open the repo, seeding its profile from our key
        tracing::debug!(path = %config.repo_path.display(), "ServiceState::from_config - opening repo");
        let repo = FsRepo::open(&config.repo_path, default_profile(&config.secret_key)).await?;

        // 2. Registry client for the configured location
        let registry = registry::from_config(&config.registry)?;
        match &config.registry.location {
            Some(location) => tracing::info!("Registry: {}", location),
            None => tracing::info!("Registry: in-process"),
        }

        // 3. Node identity comes from the same key
        let factory = Arc::new(TcpNodeFactory::new(config.secret_key.clone()));

        Self::from_parts(Arc::new(repo), registry, factory, config.p2p.clone())
    }

    /// Assemble state from already-built collaborators.
    ///
    /// A single node is built up front and shared by peer and registry
    ///  requests. It stays offline until the service starts it (when
    ///  `p2p.enabled`) or a publish with pinning needs it.
    pub fn from_parts(
        repo: Arc<dyn Repo>,
        registry: Arc<dyn RegistryClient>,
        factory: Arc<dyn NodeFactory>,
        p2p: P2pConfig,
    ) -> Result<Self, StateSetupError> {
        let node = factory.build(&p2p.force_enabled())?;
        tracing::info!("Node id: {}", node.id());

        let context = Arc::new(
            RegistryContext::new(repo.clone(), registry, factory, p2p.clone())
                .with_node(node.clone()),
        );
        let requests = RequestSet::local(repo.clone(), node.clone(), context)?;

        Ok(Self {
            repo,
            node,
            p2p,
            requests,
        })
    }

    pub fn repo(&self) -> &Arc<dyn Repo> {
        &self.repo
    }

    pub fn node(&self) -> &Arc<dyn Node> {
        &self.node
    }

    pub fn p2p(&self) -> &P2pConfig {
        &self.p2p
    }

    /// Local request objects over this state's collaborators
    pub fn requests(&self) -> &RequestSet {
        &self.requests
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("failed to open repo: {0}")]
    Repo(#[from] RepoError),
    #[error("failed to set up registry client: {0}")]
    Registry(#[from] RegistryError),
    #[error("failed to build node: {0}")]
    Node(#[from] NodeError),
    #[error("failed to build request objects: {0}")]
    Requests(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use common::testkit::{sample_repo, Call, CallLog, RecordingFactory, RecordingRegistry};

    use super::*;

    #[tokio::test]
    async fn test_from_parts_builds_one_offline_node() {
        let log = CallLog::default();
        let state = State::from_parts(
            sample_repo().await,
            Arc::new(RecordingRegistry::new(log.clone())),
            Arc::new(RecordingFactory::new(log.clone())),
            P2pConfig::default(),
        )
        .unwrap();

        assert!(!state.node().is_online());
        assert!(!state.p2p().enabled);
        let builds = log.count(|c| matches!(c, Call::Build(config) if config.enabled));
        assert_eq!(builds, 1);
        assert_eq!(log.count(|c| matches!(c, Call::Start)), 0);
    }

    #[tokio::test]
    async fn test_from_parts_surfaces_factory_failure() {
        let log = CallLog::default();
        let result = State::from_parts(
            sample_repo().await,
            Arc::new(RecordingRegistry::new(log.clone())),
            Arc::new(RecordingFactory::new(log).failing_build()),
            P2pConfig::default(),
        );
        assert!(matches!(result, Err(StateSetupError::Node(_))));
    }

    #[tokio::test]
    async fn test_from_config_opens_repo_on_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let key = common::crypto::SecretKey::generate();
        let config = Config {
            secret_key: key.clone(),
            p2p: P2pConfig::default(),
            rpc_listen_addr: "127.0.0.1:0".parse().unwrap(),
            registry: Default::default(),
            repo_path: tmp.path().join("repo"),
            log_level: tracing::Level::INFO,
            log_dir: None,
        };

        let state = State::from_config(&config).await.unwrap();
        assert_eq!(state.node().id(), key.peer_id());
        assert_eq!(state.repo().profile().await.unwrap().id, key.peer_id());
        assert!(tmp.path().join("repo").join("profile.json").exists());
    }
}
