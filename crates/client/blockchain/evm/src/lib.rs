//! EVM integration for the NFT marketplace client.
//!
//! This crate implements the collaborator traits from `client-blockchain-core`
//! against an EVM chain:
//! - Wallet access over JSON-RPC (`eth_accounts`, `eth_requestAccounts`) or a local key
//! - Marketplace contract calls (listing fee, mint, resell, item queries)
//! - Signer-bound and read-only contract handles
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use client_blockchain_evm::{EvmConfig, EvmConnector, EvmWallet};
//!
//! let config = EvmConfig::from_env()?;
//! let wallet = Arc::new(EvmWallet::from_config(&config)?);
//! let connector = EvmConnector::new(config, wallet.clone())?;
//!
//! let items = connector.read_only()?.fetch_market_items().await?;
//! ```

pub mod config;
pub mod connector;
pub mod contract;
pub mod wallet;

pub use config::{EvmConfig, EvmNetwork};
pub use connector::EvmConnector;
pub use contract::EvmMarketplace;
pub use wallet::EvmWallet;
