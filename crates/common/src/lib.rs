/**
 * Peer configuration as stored in `config.toml`.
 */
pub mod config;
/**
 * Identity keys.
 *  - Ed25519 secret and public keys
 *  - PEM encoding for the on-disk key file
 */
pub mod crypto;
/**
 * Dataset versions and the references that
 *  name them.
 */
pub mod dataset;
/**
 * A uniform tree view over datasets, plus the
 *  case-insensitive dotted path resolver that
 *  selects values out of it.
 */
pub mod document;
/**
 * The network-facing side of a peer. Nodes are
 *  brought online on demand and report the
 *  addresses other peers can reach them at.
 */
pub mod node;
pub mod profile;
/**
 * Registries that index published datasets and,
 *  where supported, pin copies of them.
 */
pub mod registry;
/**
 * Local storage of dataset versions and names.
 */
pub mod repo;
/**
 * One request object per domain. Each runs its
 *  operations in process or forwards them to a
 *  running daemon over rpc.
 */
pub mod requests;
/**
 * Client side of the daemon's remote-call channel.
 */
pub mod rpc;
/**
 * Recording test doubles and fixtures.
 */
pub mod testkit;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::config::Config;
    pub use crate::crypto::{PublicKey, SecretKey};
    pub use crate::dataset::{Dataset, DatasetRef};
    pub use crate::document::{resolve, select, Document, PathError, ToDocument};
    pub use crate::node::{Node, NodeFactory};
    pub use crate::profile::Profile;
    pub use crate::registry::RegistryClient;
    pub use crate::repo::Repo;
    pub use crate::requests::{ConfigError, RequestError};
    pub use crate::rpc::RpcClient;
    pub use crate::version::build_info;
}
