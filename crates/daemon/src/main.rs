// CLI modules
mod cli;

use clap::{Parser, Subcommand};
use cli::{
    args::Args, op::Op, Daemon, Get, Health, Info, Init, List, Log, Peers, Profile, Publish,
    Remove, Rename, Render, Save, Search, Select, Status, Unpublish, Version,
};

command_enum! {
    (Init, Init),
    (Daemon, Daemon),
    (Health, Health),
    (Version, Version),
    (List, List),
    (Get, Get),
    (Save, Save),
    (Rename, Rename),
    (Remove, Remove),
    (Log, Log),
    (Publish, Publish),
    (Unpublish, Unpublish),
    (Status, Status),
    (Peers, Peers),
    (Info, Info),
    (Profile, Profile),
    (Search, Search),
    (Render, Render),
    (Select, Select),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Requests pick their target lazily: --remote, a running daemon, or this process
    let ctx = cli::op::OpContext::new(args.remote, args.config_path);

    match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
