use serde::{Deserialize, Serialize};
use url::Url;

/// Top-level peer configuration, stored as `config.toml` in the app
///  directory. Every section falls back to its defaults when omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub p2p: P2pConfig,
    #[serde(default)]
    pub rpc: RpcConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Peer-to-peer networking options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct P2pConfig {
    /// whether this peer connects to the network by default.
    ///  publishing with pinning brings a node up regardless
    #[serde(default)]
    pub enabled: bool,
    /// tcp port to listen on, 0 picks an ephemeral port
    #[serde(default)]
    pub port: u16,
    /// interface to bind the listener to
    #[serde(default = "default_listen_host")]
    pub host: String,
    /// addresses of peers to dial once online
    #[serde(default)]
    pub bootstrap_addrs: Vec<String>,
}

fn default_listen_host() -> String {
    "0.0.0.0".to_string()
}

impl Default for P2pConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 0,
            host: default_listen_host(),
            bootstrap_addrs: Vec::new(),
        }
    }
}

impl P2pConfig {
    /// Copy of this configuration with networking switched on
    pub fn force_enabled(&self) -> Self {
        Self {
            enabled: true,
            ..self.clone()
        }
    }
}

/// Options for the daemon's remote-call endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcConfig {
    /// when set, commands are forwarded to a running daemon if one answers
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_rpc_port")]
    pub port: u16,
}

fn default_true() -> bool {
    true
}

fn default_rpc_port() -> u16 {
    2504
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            port: default_rpc_port(),
        }
    }
}

impl RpcConfig {
    pub fn local_url(&self) -> Url {
        Url::parse(&format!("http://127.0.0.1:{}", self.port)).expect("loopback URL must parse")
    }
}

/// Where datasets get published
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// base URL of the registry, if unset an in-process registry is used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Url>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// default filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_empty_sections_use_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert!(!config.p2p.enabled);
        assert_eq!(config.rpc.port, 2504);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_force_enabled_keeps_other_settings() {
        let p2p = P2pConfig {
            enabled: false,
            port: 4001,
            host: "127.0.0.1".to_string(),
            bootstrap_addrs: vec!["/ip4/10.0.0.1/tcp/4001".to_string()],
        };

        let forced = p2p.force_enabled();
        assert!(forced.enabled);
        assert_eq!(forced.port, 4001);
        assert_eq!(forced.host, "127.0.0.1");
        assert_eq!(forced.bootstrap_addrs, p2p.bootstrap_addrs);
        assert!(!p2p.enabled);
    }
}
