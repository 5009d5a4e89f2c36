use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::config::P2pConfig;
use crate::dataset::DatasetRef;
use crate::node::{Node, NodeError, NodeFactory, PeerInfo, Progress};
use crate::registry::{RegistryClient, RegistryError, RegistryStatus};

/// A collaborator call, in the order it happened
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Build(P2pConfig),
    Start,
    Addresses,
    Pin(DatasetRef, Vec<String>),
    Publish(DatasetRef),
    Unpublish(DatasetRef),
    Status(DatasetRef),
}

/// Shared, ordered record of collaborator calls
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    pub fn push(&self, call: Call) {
        self.0.lock().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.0.lock().iter().filter(|c| matches(c)).count()
    }
}

/// Node that records calls instead of touching the network
#[derive(Debug)]
pub struct RecordingNode {
    log: CallLog,
    id: String,
    online: AtomicBool,
    fail_start: bool,
    peers: Vec<PeerInfo>,
}

impl RecordingNode {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            id: "testnode".to_string(),
            online: AtomicBool::new(false),
            fail_start: false,
            peers: Vec::new(),
        }
    }

    pub fn online(self) -> Self {
        self.online.store(true, Ordering::SeqCst);
        self
    }

    /// Bring-up fails with a socket error
    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    pub fn with_peers(mut self, peers: Vec<PeerInfo>) -> Self {
        self.peers = peers;
        self
    }

    /// The single address this node reports once online
    pub fn address(&self) -> String {
        format!("/ip4/127.0.0.1/tcp/4001/p2p/{}", self.id)
    }
}

#[async_trait]
impl Node for RecordingNode {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    async fn start_online_services(&self, progress: &Progress) -> Result<(), NodeError> {
        self.log.push(Call::Start);
        if self.fail_start {
            return Err(NodeError::Bind(std::io::Error::new(
                std::io::ErrorKind::AddrInUse,
                "address in use",
            )));
        }
        progress.report("online");
        self.online.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn encapsulated_addresses(&self) -> Vec<String> {
        self.log.push(Call::Addresses);
        if self.is_online() {
            vec![self.address()]
        } else {
            Vec::new()
        }
    }

    fn connected_peers(&self) -> Vec<PeerInfo> {
        self.peers.clone()
    }
}

/// Factory that hands out fresh offline `RecordingNode`s
#[derive(Debug)]
pub struct RecordingFactory {
    log: CallLog,
    fail_build: bool,
    fail_start: bool,
}

impl RecordingFactory {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            fail_build: false,
            fail_start: false,
        }
    }

    pub fn failing_build(mut self) -> Self {
        self.fail_build = true;
        self
    }

    /// Built nodes fail to come online
    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }
}

impl NodeFactory for RecordingFactory {
    fn build(&self, config: &P2pConfig) -> Result<Arc<dyn Node>, NodeError> {
        self.log.push(Call::Build(config.clone()));
        if self.fail_build {
            return Err(NodeError::Other("no identity key".to_string()));
        }
        let mut node = RecordingNode::new(self.log.clone());
        node.fail_start = self.fail_start;
        Ok(Arc::new(node))
    }
}

/// How a `RecordingRegistry` answers pin calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinBehavior {
    Accept,
    Unsupported,
    Fail,
}

/// Registry that records calls and answers from a script
#[derive(Debug)]
pub struct RecordingRegistry {
    log: CallLog,
    pin: PinBehavior,
    fail_publish: bool,
    published: AtomicBool,
}

impl RecordingRegistry {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            pin: PinBehavior::Accept,
            fail_publish: false,
            published: AtomicBool::new(false),
        }
    }

    pub fn pin_behavior(mut self, pin: PinBehavior) -> Self {
        self.pin = pin;
        self
    }

    pub fn failing_publish(mut self) -> Self {
        self.fail_publish = true;
        self
    }
}

#[async_trait]
impl RegistryClient for RecordingRegistry {
    async fn pin(&self, reference: &DatasetRef, addrs: &[String]) -> Result<(), RegistryError> {
        self.log.push(Call::Pin(reference.clone(), addrs.to_vec()));
        match self.pin {
            PinBehavior::Accept => Ok(()),
            PinBehavior::Unsupported => Err(RegistryError::PinningNotSupported),
            PinBehavior::Fail => Err(RegistryError::Status(503, "pin queue full".to_string())),
        }
    }

    async fn publish(&self, reference: &DatasetRef) -> Result<(), RegistryError> {
        self.log.push(Call::Publish(reference.clone()));
        if self.fail_publish {
            return Err(RegistryError::Status(500, "index unavailable".to_string()));
        }
        self.published.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn unpublish(&self, reference: &DatasetRef) -> Result<(), RegistryError> {
        self.log.push(Call::Unpublish(reference.clone()));
        self.published.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn status(&self, reference: &DatasetRef) -> Result<RegistryStatus, RegistryError> {
        self.log.push(Call::Status(reference.clone()));
        Ok(RegistryStatus {
            published: self.published.load(Ordering::SeqCst),
        })
    }
}
