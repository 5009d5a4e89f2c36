use std::sync::Arc;

use clap::Args;
use url::Url;

use common::config::Config;
use common::repo::Repo;
use common::requests::{ProfileRequests, RequestError};
use strata_daemon::state::{AppState, StateError};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Handle for this peer's datasets (defaults to one derived from the key)
    #[arg(long)]
    pub peername: Option<String>,

    /// Connect to the p2p network whenever the daemon runs
    #[arg(long)]
    pub p2p: bool,

    /// P2P listen port (defaults to an ephemeral port)
    #[arg(long)]
    pub p2p_port: Option<u16>,

    /// Port for the daemon's RPC server
    #[arg(long)]
    pub rpc_port: Option<u16>,

    /// Registry to publish datasets to (defaults to an in-process registry)
    #[arg(long)]
    pub registry: Option<Url>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] StateError),
    #[error("init failed: {0}")]
    Profile(#[from] RequestError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut config = Config::default();
        config.p2p.enabled = self.p2p;
        if let Some(port) = self.p2p_port {
            config.p2p.port = port;
        }
        if let Some(port) = self.rpc_port {
            config.rpc.port = port;
        }
        config.registry.location = self.registry.clone();

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;
        let key = state.load_key()?;
        let repo: Arc<dyn Repo> = Arc::new(state.open_repo(&key).await?);

        let profiles = ProfileRequests::new(Some(repo), None)
            .map_err(|e| RequestError::Internal(e.to_string()))?;
        let mut profile = profiles.get_profile().await?;
        if let Some(peername) = &self.peername {
            profile.peername = peername.clone();
            profile = profiles.save_profile(&profile).await?;
        }

        let p2p_port = match state.config.p2p.port {
            0 => "ephemeral (auto-assigned)".to_string(),
            port => port.to_string(),
        };
        let registry = match &state.config.registry.location {
            Some(location) => location.to_string(),
            None => "in-process".to_string(),
        };

        let output = format!(
            "Initialized strata directory at: {}\n\
             - Key: {}\n\
             - Repo: {}\n\
             - Config: {}\n\
             - Peer id: {}\n\
             - Peername: {}\n\
             - P2P: {} (port {})\n\
             - RPC port: {}\n\
             - Registry: {}",
            state.strata_dir.display(),
            state.key_path.display(),
            state.repo_path.display(),
            state.config_path.display(),
            profile.id,
            profile.peername,
            if state.config.p2p.enabled {
                "enabled"
            } else {
                "disabled"
            },
            p2p_port,
            state.config.rpc.port,
            registry
        );

        Ok(output)
    }
}
