use anyhow::Context;
use clap::Parser;
use sentinelops_server::{Cli, SentinelServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config().context("Failed to load configuration")?;
    let _guard = config
        .logging
        .init()
        .context("Failed to initialize logging")?;

    let server = SentinelServer::new(config).context("Failed to build server")?;
    server.run().await?;
    Ok(())
}
