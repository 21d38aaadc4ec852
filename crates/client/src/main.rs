//! NFT marketplace client binary.
//!
//! # Architecture
//!
//! This binary is the composition root that assembles:
//! 1. Wallet and contract connector (EVM) from `MARKET_*` variables
//! 2. IPFS gateway and metadata fetcher from `IPFS_*` variables
//! 3. The marketplace context that drives both
//!
//! # Examples
//!
//! ```bash
//! # List what is on sale against a local hardhat node
//! MARKET_CONTRACT_ADDRESS=0x5FbDB2315678afecb367f032d93F642f64180aa3 nft-market list
//!
//! # Mint with a local image, signing with a dev key
//! MARKET_PRIVATE_KEY=0x... nft-market create --name Ape --description "A rare ape" \
//!     --price 0.05 --file ape.png
//! ```

mod commands;
mod logging;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use client_blockchain_core::{ChainConfig, NftQuery};
use client_blockchain_evm::{EvmConfig, EvmConnector, EvmWallet};
use client_context::{ContextConfig, MarketplaceContext};
use client_storage::{HttpMetadataFetcher, IpfsClient, IpfsConfig};

use commands::{Create, Resell, Upload};

/// Command-line client for the NFT marketplace
#[derive(Parser)]
#[command(name = "nft-market")]
#[command(about = "Mint, list and browse marketplace NFTs", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Show the tagline and any already authorized account
    Status,

    /// Request wallet access
    Connect,

    /// Upload a file to IPFS and print its URL
    Upload(Upload),

    /// Mint a new item and list it for sale
    Create(Create),

    /// Relist an owned item at a new price
    Resell(Resell),

    /// List unsold market items
    List,

    /// List items owned by the connected account
    Mine,

    /// List items the connected account has put on sale
    Listed,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (for MARKET_* and IPFS_* variables)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    logging::setup_logging()?;

    let context = build_context()?;

    match cli.command {
        Command::Status => commands::status(&context).await,
        Command::Connect => commands::connect(&context).await,
        Command::Upload(cmd) => cmd.execute(&context).await,
        Command::Create(cmd) => cmd.execute(&context).await,
        Command::Resell(cmd) => cmd.execute(&context).await,
        Command::List => commands::list(&context).await,
        Command::Mine => commands::account_items(&context, NftQuery::Owned).await,
        Command::Listed => commands::account_items(&context, NftQuery::Listed).await,
    }
}

fn build_context() -> Result<MarketplaceContext> {
    let evm_config = EvmConfig::from_env()
        .map_err(anyhow::Error::msg)
        .context("Invalid EVM configuration")?;
    tracing::info!(
        "EVM configuration loaded: network={}, rpc={}",
        evm_config.network_name(),
        evm_config.rpc_url()
    );

    let ipfs_config = IpfsConfig::from_env();
    ipfs_config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("Invalid IPFS configuration")?;
    tracing::debug!("IPFS configuration loaded: {:?}", ipfs_config);

    let wallet = Arc::new(EvmWallet::from_config(&evm_config)?);
    let connector = EvmConnector::new(evm_config, wallet.clone())
        .context("Failed to initialize marketplace contract")?;

    let metadata = HttpMetadataFetcher::new(&ipfs_config);
    let storage = IpfsClient::new(ipfs_config);

    let context = MarketplaceContext::builder()
        .wallet(wallet)
        .storage(Arc::new(storage))
        .metadata(Arc::new(metadata))
        .contracts(Arc::new(connector))
        .config(ContextConfig::from_env())
        .build()?;

    Ok(context)
}
