mod cli;

use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    qrpages::observability::init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => qrpages::api::run(args.into()).await?,
    }

    Ok(())
}
