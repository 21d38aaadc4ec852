//! CLI subcommands.
//!
//! Each command drives one marketplace context operation and prints its
//! result as pretty JSON on stdout.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser};
use serde::Serialize;
use serde_json::json;

use client_blockchain_core::{ListingInput, NftQuery, SaleKind, U256};
use client_context::MarketplaceContext;

/// Print the tagline and any already authorized account.
pub async fn status(context: &MarketplaceContext) -> Result<()> {
    let account = context.check_if_wallet_connected().await?;
    print_json(&json!({
        "title": context.title_data(),
        "account": account,
    }))
}

/// Request wallet access and print the adopted account.
pub async fn connect(context: &MarketplaceContext) -> Result<()> {
    let account = context.connect_wallet().await?;
    print_json(&json!({ "account": account }))
}

/// Upload a file to IPFS and print its retrieval URL
#[derive(Parser, Debug)]
pub struct Upload {
    /// File to upload
    pub file: PathBuf,
}

impl Upload {
    pub async fn execute(self, context: &MarketplaceContext) -> Result<()> {
        let content = read_content(&self.file)?;
        let url = context.upload_to_ipfs(content).await?;
        print_json(&json!({ "url": url }))
    }
}

/// Where the item's media comes from
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct ImageSource {
    /// Already hosted media URL
    #[arg(long)]
    pub image_url: Option<String>,

    /// Local media file, uploaded first
    #[arg(long)]
    pub file: Option<PathBuf>,
}

/// Mint a new item and list it for sale
#[derive(Parser, Debug)]
pub struct Create {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub description: String,

    /// Price in the native currency, e.g. 0.05
    #[arg(long)]
    pub price: String,

    #[command(flatten)]
    pub image: ImageSource,
}

impl Create {
    pub async fn execute(self, context: &MarketplaceContext) -> Result<()> {
        let file_url = match (self.image.image_url, self.image.file) {
            (Some(url), _) => url,
            (None, Some(path)) => {
                let content = read_content(&path)?;
                context.upload_to_ipfs(content).await?
            }
            (None, None) => anyhow::bail!("Either --image-url or --file is required"),
        };

        let input = ListingInput::new(self.name, self.description, self.price);
        let transaction = context.create_nft(&input, &file_url).await?;
        print_json(&transaction)
    }
}

/// Relist an owned item at a new price
#[derive(Parser, Debug)]
pub struct Resell {
    #[arg(long)]
    pub token_id: u64,

    /// Price in the native currency, e.g. 0.05
    #[arg(long)]
    pub price: String,

    /// Metadata URI to report with the confirmation (default: read from the contract)
    #[arg(long)]
    pub token_uri: Option<String>,
}

impl Resell {
    pub async fn execute(self, context: &MarketplaceContext) -> Result<()> {
        let token_id = U256::from(self.token_id);
        let transaction = match self.token_uri {
            Some(token_uri) => {
                context
                    .create_sale(&token_uri, &self.price, SaleKind::Resell { token_id })
                    .await?
            }
            None => context.resell_nft(token_id, &self.price).await?,
        };
        print_json(&transaction)
    }
}

/// Print unsold market items.
pub async fn list(context: &MarketplaceContext) -> Result<()> {
    let items = context.fetch_nfts().await?;
    print_json(&items)
}

/// Print items owned or listed by the connected account.
pub async fn account_items(context: &MarketplaceContext, query: NftQuery) -> Result<()> {
    let items = context.fetch_my_nfts_or_listed_nfts(query).await?;
    print_json(&items)
}

fn read_content(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
