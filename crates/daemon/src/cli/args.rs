pub use clap::Parser;

use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(about = "Version, query and publish datasets")]
pub struct Args {
    /// Send every request to the daemon at this URL instead of
    ///  auto-detecting a local one
    #[arg(long, global = true)]
    pub remote: Option<Url>,

    /// Path to the strata config directory (defaults to ~/.strata)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
