use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::config::P2pConfig;

mod tcp;

pub use tcp::{parse_tcp_addr, TcpNode, TcpNodeFactory};

#[derive(thiserror::Error, Debug)]
pub enum NodeError {
    #[error("p2p networking is disabled")]
    Disabled,
    #[error("p2p socket error: {0}")]
    Bind(#[from] std::io::Error),
    #[error("node error: {0}")]
    Other(String),
}

/// A peer this node knows about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerInfo {
    pub id: String,
    pub addresses: Vec<String>,
}

/// Sink for human-readable bring-up progress. A default `Progress`
///  drops every message.
#[derive(Debug, Clone, Default)]
pub struct Progress(Option<mpsc::UnboundedSender<String>>);

impl Progress {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self(Some(tx)), rx)
    }

    pub fn report(&self, message: impl Into<String>) {
        if let Some(tx) = &self.0 {
            // a dropped receiver just means nobody is watching
            let _ = tx.send(message.into());
        }
    }
}

/// A network-capable peer node.
#[async_trait]
pub trait Node: Send + Sync + Debug + 'static {
    /// Peer id of this node
    fn id(&self) -> String;

    fn is_online(&self) -> bool;

    /// Bring the node's network services up. Calling this on a node that is
    ///  already online (or coming online in another task) returns `Ok`
    ///  once the node is online.
    async fn start_online_services(&self, progress: &Progress) -> Result<(), NodeError>;

    /// Addresses other peers can reach this node at, each ending in
    ///  `/p2p/<peer id>`. Empty while offline.
    fn encapsulated_addresses(&self) -> Vec<String>;

    fn connected_peers(&self) -> Vec<PeerInfo>;
}

/// Builds nodes on demand, e.g. when publishing with pinning from a
///  process that was started offline.
pub trait NodeFactory: Send + Sync + Debug + 'static {
    fn build(&self, config: &P2pConfig) -> Result<Arc<dyn Node>, NodeError>;
}
