// Marketplace CLI entry point

mod config;
mod error;
mod router;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, error, info};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

use conduits_market::{
    DryRunWriter, IndexerClient, OwnedDeviceSource, OwnershipIndexClient, SystemClock,
    TokenUriResolver,
};
use config::Config;
use error::CliError;
use router::{run_command, run_local, Cli, Command, Services};

async fn execute(command: Command) -> Result<Vec<String>, CliError> {
    // Conversions need neither configuration nor the indexer
    if let Some(result) = run_local(&command) {
        return result;
    }

    let config = Config::from_env()?;
    let source = IndexerClient::new(config.api_url.as_str())?;
    let metadata = TokenUriResolver::new(config.rpc_url.as_str(), config.ipfs_gateway.as_str())?;
    let ownership = match config.require_graphql_url() {
        Ok(endpoint) => Some(OwnershipIndexClient::new(endpoint)?),
        Err(e) => {
            debug!(error = %e, "Ownership index not configured");
            None
        }
    };
    let writer = DryRunWriter::new();
    let clock = SystemClock::new();

    info!(
        api_url = %config.api_url,
        chain_id = config.chain.id,
        marketplace = %config.marketplace,
        "Configuration loaded"
    );

    let services = Services {
        devices: &source,
        owned: ownership.as_ref().map(|client| client as &dyn OwnedDeviceSource),
        metadata: &metadata,
        writer: &writer,
        clock: &clock,
    };

    run_command(command, &config, &services).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match execute(cli.command).await {
        Ok(lines) => {
            for line in lines {
                println!("{}", line);
            }
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Command failed");
            let (code, response) = e.to_report();
            let payload = response
                .to_json()
                .context("Failed to encode error response")?;
            eprintln!("{}", payload);
            std::process::exit(code);
        }
    }
}
