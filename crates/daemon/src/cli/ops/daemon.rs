use clap::Args;

use strata_daemon::state::AppState;
use strata_daemon::{spawn_service, ServiceConfig};

#[derive(Args, Debug, Clone)]
pub struct Daemon {
    /// Override RPC server port (default from config)
    #[arg(long)]
    pub rpc_port: Option<u16>,

    /// Join the p2p network even if the config leaves it off
    #[arg(long)]
    pub p2p: bool,

    /// Directory for log files (logs to stdout only if not set)
    #[arg(long)]
    pub log_dir: Option<std::path::PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("state error: {0}")]
    StateError(#[from] strata_daemon::state::StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Daemon {
    type Error = DaemonError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        // Load state from config path (or default ~/.strata)
        let state = AppState::load(ctx.config_path.clone())?;
        let secret_key = state.load_key()?;

        let mut config = ServiceConfig::from_app_state(&state, secret_key);
        if let Some(port) = self.rpc_port {
            config.rpc_listen_addr.set_port(port);
        }
        if self.p2p {
            config.p2p.enabled = true;
        }
        config.log_dir = self.log_dir.clone();

        spawn_service(&config).await;
        Ok("daemon ended".to_string())
    }
}
