//! CLI commands.
//!
//! Argument parsing and the handler for each subcommand. Handlers are thin:
//! resolve the effective configuration, connect an orchestrator, run one
//! action, render the outcome. Precedence for settings is flags over
//! environment over config file.

use std::path::PathBuf;
use std::sync::Arc;

use alloy_primitives::Address;
use clap::{Parser, Subcommand};
use console::style;
use dialoguer::Confirm;
use serde_json::json;

use crate::chain::{Ledger, RpcProvider};
use crate::cli::config::CliConfig;
use crate::cli::output::{create_spinner, OutputFormat, OutputFormatter};
use crate::core::{format_units, parse_address, STABLECOIN_DECIMALS};
use crate::error::Result;
use crate::orchestrator::{ActionReceipt, Orchestrator};

// ═══════════════════════════════════════════════════════════════════════════════
// ARGUMENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Command-line client for the USDD collateral-backed stablecoin
#[derive(Debug, Parser)]
#[command(name = "usdd")]
#[command(version = crate::VERSION)]
#[command(about = "Deposit collateral, mint and redeem USDD, and liquidate positions")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Wallet-backed JSON-RPC endpoint URL
    #[arg(long, global = true)]
    pub rpc_url: Option<String>,

    /// Signing account to use (first wallet account by default)
    #[arg(long, global = true)]
    pub account: Option<String>,

    /// Network profile (sepolia, mainnet, local)
    #[arg(short, long, global = true)]
    pub network: Option<String>,

    /// Output format (text, json, json-pretty)
    #[arg(short, long, global = true, default_value = "text")]
    pub format: String,

    /// Skip confirmation prompts
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// All available commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Deposit collateral into the engine
    Deposit {
        /// Collateral token, by symbol or address
        #[arg(short, long)]
        token: String,

        /// Amount to deposit, in whole tokens
        #[arg(short, long)]
        amount: String,
    },

    /// Redeem deposited collateral back to the wallet
    Redeem {
        /// Collateral token, by symbol or address
        #[arg(short, long)]
        token: String,

        /// Amount to redeem, in whole tokens
        #[arg(short, long)]
        amount: String,
    },

    /// Redeem collateral and burn USDD debt in one call
    RedeemAndBurn {
        /// Collateral token, by symbol or address
        #[arg(short, long)]
        token: String,

        /// Collateral amount to redeem, in whole tokens
        #[arg(short, long)]
        collateral: String,

        /// USDD debt to burn, in whole USDD
        #[arg(short, long)]
        debt: String,
    },

    /// Mint USDD against deposited collateral
    Mint {
        /// Amount to mint, in whole USDD
        #[arg(short, long)]
        amount: String,
    },

    /// Liquidate an undercollateralized position
    Liquidate {
        /// Collateral token to claim, by symbol or address
        #[arg(short, long)]
        token: String,

        /// Address of the position to liquidate
        #[arg(short, long)]
        user: String,

        /// USDD debt to cover, in whole USDD
        #[arg(short, long)]
        debt: String,
    },

    /// Show collateral balances, minted debt, and collateral value
    Balances {
        /// Account to query (the signing account by default)
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Show the health factor of an account
    Health {
        /// Account to query (the signing account by default)
        #[arg(short, long)]
        user: Option<String>,
    },

    /// List the accounts the signing endpoint offers
    Accounts,

    /// Show client, network, and deployment information
    Status,

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigAction),
}

/// Configuration subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write a config file with the current effective settings
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Set one configuration value and save the file
    Set {
        /// Key to set (rpc-url, network, account, timeout-secs, poll-interval-ms)
        key: String,

        /// New value
        value: String,
    },
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIGURATION RESOLUTION
// ═══════════════════════════════════════════════════════════════════════════════

/// Resolve the effective configuration: config file, overlaid with
/// environment variables, overlaid with command-line flags
pub fn effective_config(cli: &Cli) -> Result<(CliConfig, PathBuf)> {
    let path = cli.config.clone().unwrap_or_else(CliConfig::default_path);
    let mut config = CliConfig::load_or_default(&path)?;
    config.apply_env()?;

    if let Some(url) = &cli.rpc_url {
        config.rpc_url = url.clone();
    }
    if let Some(network) = &cli.network {
        config.network = network.parse()?;
    }
    if let Some(account) = &cli.account {
        config.account = Some(parse_address(account)?);
    }

    config.validate()?;
    Ok((config, path))
}

// ═══════════════════════════════════════════════════════════════════════════════
// DISPATCH
// ═══════════════════════════════════════════════════════════════════════════════

/// Execute the parsed command line
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let format: OutputFormat = cli.format.parse()?;
    let output = OutputFormatter::new(format);
    let (config, config_path) = effective_config(&cli)?;

    match &cli.command {
        Command::Config(action) => handle_config(action, &config, &config_path, &output),
        Command::Accounts => handle_accounts(&config, &output).await,
        Command::Status => handle_status(&config, &output).await,
        command => handle_action(command, &cli, &config, &output).await,
    }
}

fn provider(config: &CliConfig) -> Result<Arc<RpcProvider>> {
    Ok(Arc::new(RpcProvider::new(config.rpc_config())?))
}

async fn connect(config: &CliConfig) -> anyhow::Result<Orchestrator> {
    let protocol = config.resolve_protocol()?;
    let ledger: Arc<dyn Ledger> = provider(config)?;
    let orchestrator = Orchestrator::connect(protocol, ledger, config.account).await?;
    Ok(orchestrator)
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROTOCOL ACTIONS
// ═══════════════════════════════════════════════════════════════════════════════

async fn handle_action(
    command: &Command,
    cli: &Cli,
    config: &CliConfig,
    output: &OutputFormatter,
) -> anyhow::Result<()> {
    let orchestrator = connect(config).await?;

    match command {
        Command::Deposit { token, amount } => {
            let token = orchestrator.config().resolve_token(token)?.clone();
            if !confirmed(cli, output, &format!("Deposit {} {} as collateral?", amount, token.symbol))? {
                return Ok(());
            }
            let receipt = with_spinner(output, "Depositing collateral...", async {
                orchestrator.deposit_collateral(&token.symbol, amount).await
            })
            .await?;
            report_receipt(output, &receipt, &format!("Deposited {} {}", amount, token.symbol));
        }

        Command::Redeem { token, amount } => {
            let token = orchestrator.config().resolve_token(token)?.clone();
            if !confirmed(cli, output, &format!("Redeem {} {} of collateral?", amount, token.symbol))? {
                return Ok(());
            }
            let receipt = with_spinner(output, "Redeeming collateral...", async {
                orchestrator.redeem_collateral(&token.symbol, amount).await
            })
            .await?;
            report_receipt(output, &receipt, &format!("Redeemed {} {}", amount, token.symbol));
        }

        Command::RedeemAndBurn {
            token,
            collateral,
            debt,
        } => {
            let token = orchestrator.config().resolve_token(token)?.clone();
            let prompt = format!(
                "Redeem {} {} and burn {} USDD of debt?",
                collateral, token.symbol, debt
            );
            if !confirmed(cli, output, &prompt)? {
                return Ok(());
            }
            let receipt = with_spinner(output, "Redeeming and burning...", async {
                orchestrator
                    .redeem_collateral_and_burn(&token.symbol, collateral, debt)
                    .await
            })
            .await?;
            report_receipt(
                output,
                &receipt,
                &format!("Redeemed {} {} and burned {} USDD", collateral, token.symbol, debt),
            );
        }

        Command::Mint { amount } => {
            if !confirmed(cli, output, &format!("Mint {} USDD?", amount))? {
                return Ok(());
            }
            let receipt = with_spinner(output, "Minting USDD...", async {
                orchestrator.mint(amount).await
            })
            .await?;
            report_receipt(output, &receipt, &format!("Minted {} USDD", amount));
        }

        Command::Liquidate { token, user, debt } => {
            let token = orchestrator.config().resolve_token(token)?.clone();
            let target = parse_address(user)?;

            // Informational pre-check; the engine enforces the threshold.
            let health = orchestrator.query_health_factor(target).await?;
            if !health.is_undercollateralized() {
                output.warning(&format!(
                    "{} has health factor {}; the engine will revert this liquidation",
                    target, health
                ));
            }

            let prompt = format!(
                "Cover {} USDD of {}'s debt for discounted {}?",
                debt, target, token.symbol
            );
            if !confirmed(cli, output, &prompt)? {
                return Ok(());
            }
            let receipt = with_spinner(output, "Liquidating position...", async {
                orchestrator.liquidate(&token.symbol, user, debt).await
            })
            .await?;
            report_receipt(output, &receipt, &format!("Liquidated {} for {} USDD", target, debt));
        }

        Command::Balances { user } => {
            let user = resolve_user(&orchestrator, user.as_deref())?;
            let snapshot = orchestrator.query_collateral_balances(user).await?;

            if output.format().is_json() {
                output.data(&snapshot);
            } else {
                output.section(&format!("Position of {}", user));
                let rows: Vec<Vec<String>> = snapshot
                    .balances
                    .iter()
                    .map(|b| vec![b.symbol.clone(), b.formatted(), b.address.to_string()])
                    .collect();
                output.table(&["TOKEN", "BALANCE", "ADDRESS"], &rows);
                println!();
                output.kv(
                    "Minted USDD",
                    &format_units(snapshot.minted, STABLECOIN_DECIMALS),
                );
                output.kv(
                    "Collateral value (USD)",
                    &format_units(snapshot.collateral_value_usd, 18),
                );
            }
        }

        Command::Health { user } => {
            let user = resolve_user(&orchestrator, user.as_deref())?;
            let health = orchestrator.query_health_factor(user).await?;

            if output.format().is_json() {
                output.data(&json!({
                    "user": user,
                    "health_factor": health.to_string(),
                    "raw": health.raw().to_string(),
                    "status": health.status().to_string(),
                }));
            } else {
                output.kv("Account", &user.to_string());
                output.kv("Health factor", &health.to_string());
                output.kv("Status", &health.status().to_string());
                if health.is_undercollateralized() {
                    output.warning("position is below the liquidation threshold");
                }
            }
        }

        // Handled by the outer dispatch.
        Command::Accounts | Command::Status | Command::Config(_) => unreachable!(),
    }

    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENDPOINT AND CONFIG COMMANDS
// ═══════════════════════════════════════════════════════════════════════════════

async fn handle_accounts(config: &CliConfig, output: &OutputFormatter) -> anyhow::Result<()> {
    let provider = provider(config)?;
    let accounts = provider.request_accounts().await?;

    if output.format().is_json() {
        output.data(&accounts);
    } else if accounts.is_empty() {
        output.warning("the signing endpoint offers no accounts");
    } else {
        let rows: Vec<Vec<String>> = accounts
            .iter()
            .enumerate()
            .map(|(i, a)| vec![i.to_string(), a.to_string()])
            .collect();
        output.table(&["#", "ACCOUNT"], &rows);
    }
    Ok(())
}

async fn handle_status(config: &CliConfig, output: &OutputFormatter) -> anyhow::Result<()> {
    let protocol = config.resolve_protocol()?;
    let provider = provider(config)?;
    let chain_id = provider.chain_id().await.ok();

    if output.format().is_json() {
        output.data(&json!({
            "client": crate::VERSION,
            "stablecoin": crate::STABLECOIN_NAME,
            "network": config.network.name(),
            "rpc_url": config.rpc_url,
            "chain_id": chain_id,
            "engine": protocol.engine,
            "stablecoin_token": protocol.stablecoin,
            "collateral_tokens": protocol.collateral_tokens,
        }));
        return Ok(());
    }

    output.section(&format!("{} client", crate::STABLECOIN_NAME));
    output.kv("Version", crate::VERSION);
    output.kv("Network", config.network.name());
    output.kv("Endpoint", &config.rpc_url);
    match chain_id {
        Some(id) => {
            output.kv("Chain ID", &id.to_string());
            if let Some(expected) = config.network.chain_id() {
                if expected != id {
                    output.warning(&format!(
                        "endpoint reports chain {} but the {} profile expects {}",
                        id, config.network, expected
                    ));
                }
            }
        }
        None => output.kv("Chain ID", "unavailable"),
    }
    output.kv("Engine", &protocol.engine.to_string());
    output.kv("Stablecoin", &protocol.stablecoin.to_string());
    for token in &protocol.collateral_tokens {
        output.kv("Collateral", &token.to_string());
    }
    Ok(())
}

fn handle_config(
    action: &ConfigAction,
    config: &CliConfig,
    path: &std::path::Path,
    output: &OutputFormatter,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            output.data(config);
        }

        ConfigAction::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "config file already exists at {}; use --force to overwrite",
                    path.display()
                );
            }
            config.save(path)?;
            output.success(&format!("config written to {}", path.display()));
        }

        ConfigAction::Set { key, value } => {
            let mut updated = config.clone();
            match key.as_str() {
                "rpc-url" => updated.rpc_url = value.clone(),
                "network" => updated.network = value.parse()?,
                "account" => updated.account = Some(parse_address(value)?),
                "timeout-secs" => {
                    updated.timeout_secs = value
                        .parse()
                        .map_err(|_| anyhow::anyhow!("timeout-secs must be an integer"))?
                }
                "poll-interval-ms" => {
                    updated.poll_interval_ms = value
                        .parse()
                        .map_err(|_| anyhow::anyhow!("poll-interval-ms must be an integer"))?
                }
                other => anyhow::bail!(
                    "unknown config key {:?}; expected rpc-url, network, account, timeout-secs, or poll-interval-ms",
                    other
                ),
            }
            updated.validate()?;
            updated.save(path)?;
            output.success(&format!("{} updated in {}", key, path.display()));
        }
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

fn resolve_user(orchestrator: &Orchestrator, user: Option<&str>) -> Result<Address> {
    match user {
        Some(value) => parse_address(value),
        None => Ok(orchestrator.account()),
    }
}

/// Ask before a state-changing action. Skipped with --yes and in JSON mode,
/// where no interactive prompt is possible.
fn confirmed(cli: &Cli, output: &OutputFormatter, prompt: &str) -> anyhow::Result<bool> {
    if cli.yes || output.format().is_json() {
        return Ok(true);
    }
    let accepted = Confirm::new()
        .with_prompt(prompt.to_string())
        .default(false)
        .interact()?;
    if !accepted {
        println!("{}", style("Aborted.").dim());
    }
    Ok(accepted)
}

async fn with_spinner<F>(output: &OutputFormatter, message: &str, action: F) -> F::Output
where
    F: std::future::Future,
{
    if output.format().is_json() {
        return action.await;
    }
    let spinner = create_spinner(message);
    let result = action.await;
    spinner.finish_and_clear();
    result
}

fn report_receipt(output: &OutputFormatter, receipt: &ActionReceipt, message: &str) {
    if output.format().is_json() {
        output.data(receipt);
        return;
    }
    output.success(message);
    if let Some(tx) = receipt.approval_tx {
        output.kv("Approval tx", &tx.to_string());
    }
    output.kv("Transaction", &receipt.primary_tx.to_string());
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::config::Network;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("arguments should parse")
    }

    #[test]
    fn test_parse_deposit() {
        let cli = parse(&["usdd", "deposit", "--token", "wETH", "--amount", "2.5"]);
        match cli.command {
            Command::Deposit { token, amount } => {
                assert_eq!(token, "wETH");
                assert_eq!(amount, "2.5");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_redeem_and_burn() {
        let cli = parse(&[
            "usdd",
            "redeem-and-burn",
            "--token",
            "wBTC",
            "--collateral",
            "0.5",
            "--debt",
            "1000",
        ]);
        match cli.command {
            Command::RedeemAndBurn {
                token,
                collateral,
                debt,
            } => {
                assert_eq!(token, "wBTC");
                assert_eq!(collateral, "0.5");
                assert_eq!(debt, "1000");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_liquidate() {
        let cli = parse(&[
            "usdd",
            "liquidate",
            "--token",
            "wETH",
            "--user",
            "0x1111111111111111111111111111111111111111",
            "--debt",
            "500",
        ]);
        assert!(matches!(cli.command, Command::Liquidate { .. }));
    }

    #[test]
    fn test_parse_global_flags() {
        let cli = parse(&[
            "usdd",
            "--rpc-url",
            "https://rpc.example.org",
            "--network",
            "local",
            "--format",
            "json",
            "--yes",
            "status",
        ]);
        assert_eq!(cli.rpc_url.as_deref(), Some("https://rpc.example.org"));
        assert_eq!(cli.network.as_deref(), Some("local"));
        assert_eq!(cli.format, "json");
        assert!(cli.yes);
    }

    #[test]
    fn test_parse_config_set() {
        let cli = parse(&["usdd", "config", "set", "rpc-url", "http://localhost:8545"]);
        match cli.command {
            Command::Config(ConfigAction::Set { key, value }) => {
                assert_eq!(key, "rpc-url");
                assert_eq!(value, "http://localhost:8545");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_deposit_requires_amount() {
        assert!(Cli::try_parse_from(["usdd", "deposit", "--token", "wETH"]).is_err());
    }

    #[test]
    fn test_effective_config_flag_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        CliConfig {
            rpc_url: "http://from-file:8545".into(),
            ..CliConfig::default()
        }
        .save(&path)
        .unwrap();

        let cli = parse(&[
            "usdd",
            "--config",
            path.to_str().unwrap(),
            "--rpc-url",
            "http://from-flag:8545",
            "status",
        ]);
        let (config, loaded_path) = effective_config(&cli).unwrap();
        assert_eq!(config.rpc_url, "http://from-flag:8545");
        assert_eq!(loaded_path, path);
    }

    #[test]
    fn test_effective_config_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        CliConfig {
            rpc_url: "http://from-file:8545".into(),
            network: Network::Local,
            ..CliConfig::default()
        }
        .save(&path)
        .unwrap();

        let cli = parse(&["usdd", "--config", path.to_str().unwrap(), "status"]);
        let (config, _) = effective_config(&cli).unwrap();
        assert_eq!(config.rpc_url, "http://from-file:8545");
        assert_eq!(config.network, Network::Local);
    }

    #[test]
    fn test_effective_config_rejects_bad_account_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let cli = parse(&[
            "usdd",
            "--config",
            path.to_str().unwrap(),
            "--account",
            "not-an-address",
            "status",
        ]);
        assert!(effective_config(&cli).is_err());
    }
}
