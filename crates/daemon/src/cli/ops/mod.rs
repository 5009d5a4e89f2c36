pub mod daemon;
pub mod dataset;
pub mod health;
pub mod init;
pub mod log;
pub mod peers;
pub mod profile;
pub mod query;
pub mod registry;
pub mod version;

pub use daemon::Daemon;
pub use dataset::{Get, List, Remove, Rename, Save};
pub use health::Health;
pub use init::Init;
pub use log::Log;
pub use peers::{Info, Peers};
pub use profile::Profile;
pub use query::{Render, Search, Select};
pub use registry::{Publish, Status, Unpublish};
pub use version::Version;
