use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use common::config::{P2pConfig, RegistryConfig};
use common::prelude::SecretKey;

use crate::state::AppState;

#[derive(Debug)]
pub struct Config {
    // peer configuration
    /// identity of this peer, also the node's secret
    pub secret_key: SecretKey,
    /// networking options; the node is brought online at start
    ///  only when `p2p.enabled` is set
    pub p2p: P2pConfig,

    // rpc server configuration
    /// address the rpc http server listens on
    pub rpc_listen_addr: SocketAddr,

    // collaborators
    pub registry: RegistryConfig,
    /// directory holding the dataset repo
    pub repo_path: PathBuf,

    // logging
    pub log_level: tracing::Level,
    /// Directory for log files (optional, logs to stdout only if not set)
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Service configuration for the peer living in `state`
    pub fn from_app_state(state: &AppState, secret_key: SecretKey) -> Self {
        let log_level = tracing::Level::from_str(&state.config.logging.level).unwrap_or_else(|_| {
            eprintln!(
                "Warning: unknown log level {:?}, using info",
                state.config.logging.level
            );
            tracing::Level::INFO
        });

        Self {
            secret_key,
            p2p: state.config.p2p.clone(),
            rpc_listen_addr: SocketAddr::from(([127, 0, 0, 1], state.config.rpc.port)),
            registry: state.config.registry.clone(),
            repo_path: state.repo_path.clone(),
            log_level,
            log_dir: None,
        }
    }
}
