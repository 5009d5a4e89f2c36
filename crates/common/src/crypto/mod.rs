//! Peer identity keys.
//!
//! Each peer holds an Ed25519 keypair. The secret key is stored as PEM in
//! the app directory; the hex-encoded public key is the peer id that the
//! node advertises in its addresses.

mod keys;

pub use ed25519_dalek::Signature;
pub use keys::{KeyError, PublicKey, SecretKey};
