use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use directories::BaseDirs;
use enhancer_sdk::{interface::AssetId, HttpLedger, Network};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::run_command_mode;
use config::EnhancerConfig;

const LOGO: &str = r#"
  ___ _  _ _  _   _   _  _  ___ ___ ___ 
 | __| \| | || | /_\ | \| |/ __| __| _ \
 | _|| .` | __ |/ _ \| .` | (__| _||   /
 |___|_|\_|_||_/_/ \_\_|\_|\___|___|_|_\
"#;

#[derive(Parser, Debug)]
#[command(
    name = "enhancer",
    about = "Wallet Enhancer CLI - inspect assets and prepare batch transaction groups",
    version
)]
pub struct EnhancerCli {
    #[arg(short = 'c', long, help = "Directory holding config.json")]
    pub config_dir: Option<PathBuf>,

    #[arg(short = 'n', long, help = "Network: mainnet or testnet")]
    pub network: Option<Network>,

    #[arg(long, help = "Algod node URL")]
    pub node_url: Option<String>,

    #[arg(long, help = "Indexer URL")]
    pub indexer_url: Option<String>,

    #[arg(short = 'v', long, help = "Verbose logging")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    OptIn,
    OptOut,
    Destroy,
    Send,
    Transfer,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show balance and asset counters of an account
    Account { address: String },
    /// List assets held by an account, newest opt-in first
    Assets { address: String },
    /// List assets created by an account
    Created { address: String },
    /// Show asset parameters and explorer link
    Asset { id: AssetId },
    /// Resolve ARC-19 / ARC-69 metadata of an asset
    Metadata { id: AssetId },
    /// Classify a metadata URL
    Classify { url: String },
    /// Build unsigned transaction groups for a batch
    Prepare {
        #[arg(value_enum)]
        operation: OperationKind,
        #[arg(short, long, num_args = 1.., value_delimiter = ',')]
        assets: Vec<AssetId>,
        #[arg(short, long, help = "Signer address, defaults to the saved wallet")]
        from: Option<String>,
        #[arg(short, long)]
        receiver: Option<String>,
        #[arg(long, help = "Amount in whole units, e.g. 1.5")]
        amount: Option<String>,
    },
    /// Show or update the saved configuration
    Config {
        #[arg(long, help = "Saved wallet address")]
        wallet: Option<String>,
    },
}

pub struct EnhancerCliContext {
    pub config_dir: PathBuf,
    pub config: EnhancerConfig,
    pub ledger: HttpLedger,
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
}

fn setup(cli: &EnhancerCli) -> Result<EnhancerCliContext> {
    let config_dir = match &cli.config_dir {
        Some(dir) => dir.clone(),
        None => BaseDirs::new()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?
            .config_dir()
            .join("wallet-enhancer"),
    };

    let mut config = EnhancerConfig::load(&config_dir)?;
    config.update_from_cli_args(cli.network, cli.node_url.clone(), cli.indexer_url.clone());
    debug!(
        network = ?config.network,
        node = config.node_url(),
        indexer = config.indexer_url(),
        "using endpoints"
    );
    let ledger = config.ledger();

    Ok(EnhancerCliContext {
        config_dir,
        config,
        ledger,
    })
}

fn main() -> Result<()> {
    let cli = EnhancerCli::parse();
    init_tracing(cli.verbose);

    println!("{}", LOGO.bright_cyan());
    let mut ctx = setup(&cli)?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run_command_mode(&mut ctx, cli.command))
}
