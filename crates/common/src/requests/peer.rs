use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{ConfigError, Executor, ListParams, RequestError};
use crate::node::{Node, PeerInfo};
use crate::rpc::RpcClient;

pub const INFO: &str = "PeerRequests.Info";
pub const LIST: &str = "PeerRequests.List";

/// Network view of the local node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub id: String,
    pub online: bool,
    pub addresses: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PeerRequests {
    executor: Executor<Arc<dyn Node>>,
}

impl PeerRequests {
    pub fn new(local: Option<Arc<dyn Node>>, remote: Option<RpcClient>) -> Result<Self, ConfigError> {
        Ok(Self {
            executor: Executor::from_parts(local, remote)?,
        })
    }

    pub async fn info(&self) -> Result<NodeInfo, RequestError> {
        match &self.executor {
            Executor::Remote(remote) => remote.call(INFO, &()).await,
            Executor::Local(local) => {
                let node = local.handle();
                Ok(NodeInfo {
                    id: node.id(),
                    online: node.is_online(),
                    addresses: node.encapsulated_addresses(),
                })
            }
        }
    }

    /// Peers the node currently holds connections to, ordered by id
    pub async fn list(&self, params: &ListParams) -> Result<Vec<PeerInfo>, RequestError> {
        match &self.executor {
            Executor::Remote(remote) => remote.call(LIST, params).await,
            Executor::Local(local) => Ok(local
                .handle()
                .connected_peers()
                .into_iter()
                .skip(params.offset)
                .take(params.limit)
                .collect()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::node::Progress;
    use crate::testkit::{CallLog, RecordingNode};

    fn peers() -> Vec<PeerInfo> {
        ["a", "b", "c"]
            .iter()
            .map(|id| PeerInfo {
                id: id.to_string(),
                addresses: vec![format!("/ip4/10.0.0.1/tcp/4001/p2p/{}", id)],
            })
            .collect()
    }

    #[tokio::test]
    async fn test_info_reflects_online_state() {
        let node = Arc::new(RecordingNode::new(CallLog::default()));
        let requests = PeerRequests::new(Some(node.clone()), None).unwrap();

        let offline = requests.info().await.unwrap();
        assert_eq!(offline.id, "testnode");
        assert!(!offline.online);
        assert!(offline.addresses.is_empty());

        node.start_online_services(&Progress::default()).await.unwrap();
        let online = requests.info().await.unwrap();
        assert!(online.online);
        assert_eq!(online.addresses, vec![node.address()]);
    }

    #[tokio::test]
    async fn test_list_pages_peers() {
        let node = RecordingNode::new(CallLog::default()).with_peers(peers());
        let requests = PeerRequests::new(Some(Arc::new(node)), None).unwrap();

        let page = requests
            .list(&ListParams {
                limit: 2,
                offset: 1,
            })
            .await
            .unwrap();
        let ids: Vec<_> = page.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["b", "c"]);
    }
}
