use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use super::{Node, NodeError, NodeFactory, PeerInfo, Progress};
use crate::config::P2pConfig;
use crate::crypto::SecretKey;

type PeerTable = Arc<RwLock<HashMap<String, PeerInfo>>>;

/// Longest peer id line accepted during a handshake, newline included
const MAX_ID_LEN: u64 = 256;

const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Node that listens on a plain TCP socket. Connecting peers exchange
///  their peer ids as a single newline-terminated line each way and stay
///  in the peer table until the connection closes.
#[derive(Debug)]
pub struct TcpNode {
    secret_key: SecretKey,
    config: P2pConfig,
    listening: RwLock<Option<Listening>>,
    // held across bind so concurrent bring-ups bind once
    starting: Mutex<()>,
    peers: PeerTable,
    handshake_timeout: Duration,
    // connection tasks end when this is dropped with the node
    closing: watch::Sender<()>,
}

#[derive(Debug)]
struct Listening {
    local_addr: SocketAddr,
    accept_task: JoinHandle<()>,
}

impl TcpNode {
    pub fn new(secret_key: SecretKey, config: P2pConfig) -> Self {
        Self {
            secret_key,
            config,
            listening: RwLock::new(None),
            starting: Mutex::new(()),
            peers: Arc::new(RwLock::new(HashMap::new())),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            closing: watch::channel(()).0,
        }
    }

    /// How long a dialed or accepted peer gets to send its id
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listening.read().as_ref().map(|l| l.local_addr)
    }

    /// Dial a peer at a `/ip4/<ip>/tcp/<port>[/p2p/<id>]` address and keep
    ///  the connection open in the background.
    pub async fn connect(&self, addr: &str) -> Result<PeerInfo, NodeError> {
        let socket_addr =
            parse_tcp_addr(addr).ok_or_else(|| NodeError::Other(format!("bad address {}", addr)))?;
        let (peer_id, reader) = tokio::time::timeout(self.handshake_timeout, async {
            let stream = TcpStream::connect(socket_addr).await?;
            handshake(stream, &self.id()).await
        })
        .await
        .map_err(|_| NodeError::Other(format!("handshake with {} timed out", addr)))??;

        let info = PeerInfo {
            id: peer_id,
            addresses: vec![addr.to_string()],
        };
        track_peer(
            self.peers.clone(),
            info.clone(),
            reader,
            self.closing.subscribe(),
        );
        Ok(info)
    }
}

impl Drop for TcpNode {
    fn drop(&mut self) {
        if let Some(listening) = self.listening.get_mut().take() {
            listening.accept_task.abort();
        }
        // ends every connection task
        let _ = self.closing.send(());
    }
}

#[async_trait]
impl Node for TcpNode {
    fn id(&self) -> String {
        self.secret_key.peer_id()
    }

    fn is_online(&self) -> bool {
        self.listening.read().is_some()
    }

    async fn start_online_services(&self, progress: &Progress) -> Result<(), NodeError> {
        if !self.config.enabled {
            return Err(NodeError::Disabled);
        }

        let starting = self.starting.lock().await;
        if self.is_online() {
            return Ok(());
        }

        let host: IpAddr = self
            .config
            .host
            .parse()
            .map_err(|_| NodeError::Other(format!("invalid listen host {}", self.config.host)))?;
        progress.report(format!("binding p2p listener on {}:{}", host, self.config.port));
        let listener = TcpListener::bind(SocketAddr::new(host, self.config.port)).await?;
        let local_addr = listener.local_addr()?;

        let accept_task = tokio::spawn(accept_loop(
            listener,
            self.id(),
            self.peers.clone(),
            self.handshake_timeout,
            self.closing.subscribe(),
        ));
        *self.listening.write() = Some(Listening {
            local_addr,
            accept_task,
        });
        tracing::info!(id = %self.id(), %local_addr, "node online");
        progress.report(format!("listening on {}", local_addr));
        drop(starting);

        // each dial is bounded by the handshake timeout
        for addr in &self.config.bootstrap_addrs {
            progress.report(format!("dialing bootstrap peer {}", addr));
            if let Err(e) = self.connect(addr).await {
                tracing::warn!(%addr, "failed to dial bootstrap peer: {}", e);
            }
        }

        Ok(())
    }

    fn encapsulated_addresses(&self) -> Vec<String> {
        let Some(local_addr) = self.local_addr() else {
            return Vec::new();
        };
        let ip = if local_addr.ip().is_unspecified() {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        } else {
            local_addr.ip()
        };
        let proto = match ip {
            IpAddr::V4(_) => "ip4",
            IpAddr::V6(_) => "ip6",
        };
        vec![format!(
            "/{}/{}/tcp/{}/p2p/{}",
            proto,
            ip,
            local_addr.port(),
            self.id()
        )]
    }

    fn connected_peers(&self) -> Vec<PeerInfo> {
        let mut peers: Vec<_> = self.peers.read().values().cloned().collect();
        peers.sort_by(|a, b| a.id.cmp(&b.id));
        peers
    }
}

async fn accept_loop(
    listener: TcpListener,
    id: String,
    peers: PeerTable,
    handshake_timeout: Duration,
    closing: watch::Receiver<()>,
) {
    loop {
        let (stream, remote) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::warn!("p2p accept failed: {}", e);
                continue;
            }
        };
        let id = id.clone();
        let peers = peers.clone();
        let closing = closing.clone();
        tokio::spawn(async move {
            let handshake = tokio::time::timeout(handshake_timeout, handshake(stream, &id));
            match handshake.await {
                Ok(Ok((peer_id, reader))) => {
                    let info = PeerInfo {
                        id: peer_id,
                        addresses: vec![socket_multiaddr(&remote)],
                    };
                    tracing::debug!(peer = %info.id, %remote, "peer connected");
                    track_peer(peers, info, reader, closing);
                }
                Ok(Err(e)) => tracing::debug!(%remote, "handshake failed: {}", e),
                Err(_) => tracing::debug!(%remote, "handshake timed out"),
            }
        });
    }
}

async fn handshake(
    stream: TcpStream,
    own_id: &str,
) -> Result<(String, BufReader<TcpStream>), NodeError> {
    let mut reader = BufReader::new(stream);
    reader
        .get_mut()
        .write_all(format!("{}\n", own_id).as_bytes())
        .await?;

    let mut line = String::new();
    (&mut reader).take(MAX_ID_LEN).read_line(&mut line).await?;
    if !line.ends_with('\n') && line.len() as u64 == MAX_ID_LEN {
        return Err(NodeError::Other("peer id line too long".to_string()));
    }
    let peer_id = line.trim().to_string();
    if peer_id.is_empty() {
        return Err(NodeError::Other("peer closed before identifying".to_string()));
    }
    Ok((peer_id, reader))
}

fn track_peer(
    peers: PeerTable,
    info: PeerInfo,
    mut reader: BufReader<TcpStream>,
    mut closing: watch::Receiver<()>,
) {
    let id = info.id.clone();
    peers.write().insert(id.clone(), info);
    tokio::spawn(async move {
        // nothing else travels over the connection; discard until it closes
        let drain = async {
            let mut buf = [0u8; 1024];
            while let Ok(n) = reader.read(&mut buf).await {
                if n == 0 {
                    break;
                }
            }
        };
        tokio::select! {
            _ = drain => {}
            _ = closing.changed() => {}
        }
        peers.write().remove(&id);
        tracing::debug!(peer = %id, "peer disconnected");
    });
}

fn socket_multiaddr(addr: &SocketAddr) -> String {
    match addr.ip() {
        IpAddr::V4(ip) => format!("/ip4/{}/tcp/{}", ip, addr.port()),
        IpAddr::V6(ip) => format!("/ip6/{}/tcp/{}", ip, addr.port()),
    }
}

/// Socket address of a `/ip4|ip6/<ip>/tcp/<port>` address. Trailing
///  components (e.g. `/p2p/<id>`) are ignored.
pub fn parse_tcp_addr(addr: &str) -> Option<SocketAddr> {
    let mut parts = addr.strip_prefix('/')?.split('/');
    let ip: IpAddr = match (parts.next()?, parts.next()?) {
        ("ip4", ip) | ("ip6", ip) => ip.parse().ok()?,
        _ => return None,
    };
    match (parts.next()?, parts.next()?) {
        ("tcp", port) => Some(SocketAddr::new(ip, port.parse().ok()?)),
        _ => None,
    }
}

/// Builds `TcpNode`s sharing one identity key
#[derive(Debug, Clone)]
pub struct TcpNodeFactory {
    secret_key: SecretKey,
}

impl TcpNodeFactory {
    pub fn new(secret_key: SecretKey) -> Self {
        Self { secret_key }
    }
}

impl NodeFactory for TcpNodeFactory {
    fn build(&self, config: &P2pConfig) -> Result<Arc<dyn Node>, NodeError> {
        if !config.enabled {
            return Err(NodeError::Disabled);
        }
        Ok(Arc::new(TcpNode::new(self.secret_key.clone(), config.clone())))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn loopback() -> P2pConfig {
        P2pConfig {
            enabled: true,
            port: 0,
            host: "127.0.0.1".to_string(),
            bootstrap_addrs: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_offline_until_started() {
        let node = TcpNode::new(SecretKey::generate(), loopback());
        assert!(!node.is_online());
        assert!(node.encapsulated_addresses().is_empty());

        node.start_online_services(&Progress::default()).await.unwrap();
        assert!(node.is_online());

        let addrs = node.encapsulated_addresses();
        assert_eq!(addrs.len(), 1);
        assert!(addrs[0].starts_with("/ip4/127.0.0.1/tcp/"));
        assert!(addrs[0].ends_with(&format!("/p2p/{}", node.id())));
        assert_eq!(parse_tcp_addr(&addrs[0]), node.local_addr());
    }

    #[tokio::test]
    async fn test_concurrent_start_binds_once() {
        let node = Arc::new(TcpNode::new(SecretKey::generate(), loopback()));

        let (pa, pb) = (Progress::default(), Progress::default());
        let (a, b) = tokio::join!(
            node.start_online_services(&pa),
            node.start_online_services(&pb)
        );
        a.unwrap();
        b.unwrap();

        let addr = node.local_addr().unwrap();
        node.start_online_services(&Progress::default()).await.unwrap();
        assert_eq!(node.local_addr().unwrap(), addr);
    }

    #[tokio::test]
    async fn test_disabled_refuses_to_start() {
        let config = P2pConfig {
            enabled: false,
            ..loopback()
        };
        let node = TcpNode::new(SecretKey::generate(), config.clone());
        assert!(matches!(
            node.start_online_services(&Progress::default()).await,
            Err(NodeError::Disabled)
        ));
        assert!(!node.is_online());

        let factory = TcpNodeFactory::new(SecretKey::generate());
        assert!(matches!(factory.build(&config), Err(NodeError::Disabled)));
        assert!(factory.build(&config.force_enabled()).is_ok());
    }

    #[tokio::test]
    async fn test_wildcard_bind_advertises_loopback() {
        let config = P2pConfig {
            host: "0.0.0.0".to_string(),
            ..loopback()
        };
        let node = TcpNode::new(SecretKey::generate(), config);
        node.start_online_services(&Progress::default()).await.unwrap();
        assert!(node.encapsulated_addresses()[0].starts_with("/ip4/127.0.0.1/tcp/"));
    }

    #[tokio::test]
    async fn test_bootstrap_peers_connect() {
        let first = TcpNode::new(SecretKey::generate(), loopback());
        first.start_online_services(&Progress::default()).await.unwrap();

        let config = P2pConfig {
            bootstrap_addrs: first.encapsulated_addresses(),
            ..loopback()
        };
        let second = TcpNode::new(SecretKey::generate(), config);
        let (progress, mut rx) = Progress::channel();
        second.start_online_services(&progress).await.unwrap();
        drop(progress);

        let mut messages = Vec::new();
        while let Some(message) = rx.recv().await {
            messages.push(message);
        }
        assert!(messages.iter().any(|m| m.starts_with("dialing bootstrap peer")));

        let seen = second.connected_peers();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].id, first.id());

        // the listening side registers the peer from its accept task
        let mut attempts = 0;
        while first.connected_peers().is_empty() && attempts < 50 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            attempts += 1;
        }
        assert_eq!(first.connected_peers()[0].id, second.id());
    }

    /// Listener that accepts connections and never writes to them
    async fn silent_listener() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });
        addr
    }

    #[tokio::test]
    async fn test_silent_bootstrap_peer_does_not_block_bring_up() {
        let silent = silent_listener().await;
        let config = P2pConfig {
            bootstrap_addrs: vec![socket_multiaddr(&silent)],
            ..loopback()
        };
        let node = TcpNode::new(SecretKey::generate(), config)
            .with_handshake_timeout(Duration::from_millis(200));

        let started = tokio::time::timeout(
            Duration::from_secs(3),
            node.start_online_services(&Progress::default()),
        )
        .await;
        assert!(matches!(started, Ok(Ok(()))));
        assert!(node.is_online());
        assert!(node.connected_peers().is_empty());

        // a second bring-up is not held up by the first one's dials
        node.start_online_services(&Progress::default()).await.unwrap();
    }

    #[tokio::test]
    async fn test_oversized_peer_id_is_rejected() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let flood = vec![b'a'; 64 * 1024];
            let _ = stream.write_all(&flood).await;
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let node = TcpNode::new(SecretKey::generate(), loopback());
        assert!(node.connect(&socket_multiaddr(&addr)).await.is_err());
        assert!(node.connected_peers().is_empty());
    }

    #[tokio::test]
    async fn test_dropping_node_closes_its_connections() {
        let first = TcpNode::new(SecretKey::generate(), loopback());
        first.start_online_services(&Progress::default()).await.unwrap();

        let second = TcpNode::new(SecretKey::generate(), loopback());
        second.connect(&first.encapsulated_addresses()[0]).await.unwrap();

        let mut attempts = 0;
        while first.connected_peers().is_empty() && attempts < 50 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            attempts += 1;
        }
        assert_eq!(first.connected_peers().len(), 1);

        drop(second);
        let mut attempts = 0;
        while !first.connected_peers().is_empty() && attempts < 50 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            attempts += 1;
        }
        assert!(first.connected_peers().is_empty());
    }

    #[test]
    fn test_parse_tcp_addr() {
        assert_eq!(
            parse_tcp_addr("/ip4/10.0.0.1/tcp/4001/p2p/abc"),
            Some("10.0.0.1:4001".parse().unwrap())
        );
        assert_eq!(
            parse_tcp_addr("/ip6/::1/tcp/80"),
            Some("[::1]:80".parse().unwrap())
        );
        assert_eq!(parse_tcp_addr("/dns/example.com/tcp/80"), None);
        assert_eq!(parse_tcp_addr("10.0.0.1:4001"), None);
        assert_eq!(parse_tcp_addr("/ip4/10.0.0.1/udp/4001"), None);
    }
}
