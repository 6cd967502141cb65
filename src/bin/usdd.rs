//! USDD client CLI
//!
//! Command-line interface for the USDD collateral-backed stablecoin:
//! deposits, minting, redemption, liquidation, and position queries against
//! the on-chain engine through a wallet-backed JSON-RPC endpoint.

use clap::Parser;
use console::style;
use tracing_subscriber::EnvFilter;

use usdd::cli::commands::{run, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}
