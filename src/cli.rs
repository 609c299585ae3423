use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

use qrpages::api::ServeOptions;

#[derive(Parser, Debug)]
#[command(name = "qrpages")]
#[command(about = "Render URLs as QR codes and publish them to GitHub Pages", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server
    Serve(ServeArgs),
}

#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Address to bind the HTTP server to (defaults to server.bind_addr)
    #[arg(long)]
    pub address: Option<SocketAddr>,

    /// Configuration file (defaults to $QRPAGES_CONFIG or config/qrpages.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Keep images in memory instead of committing them (development only)
    #[arg(long)]
    pub in_memory_store: bool,
}

impl From<ServeArgs> for ServeOptions {
    fn from(args: ServeArgs) -> Self {
        Self {
            address: args.address,
            config_path: args.config,
            in_memory_store: args.in_memory_store,
        }
    }
}
