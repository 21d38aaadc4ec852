//! Collaborator abstractions for the NFT marketplace client.
//!
//! This crate defines the seams between the marketplace context and the
//! external services it drives.
//!
//! # Architecture
//!
//! ```text
//! Layer 1: ContractConnector
//!          ├── connect_signer() → signer-bound MarketplaceContract
//!          └── read_only()      → unsigned MarketplaceContract
//!
//! Layer 0: WalletProvider, ContentStore, MetadataFetcher, MarketplaceContract
//! ```
//!
//! # Design Philosophy
//!
//! - **Layer 0 (Collaborators)**: One trait per external service, no marketplace flow
//! - **Layer 1 (Connection)**: Hands out contract handles bound to a signer or not
//!
//! Concrete implementations live in `client-blockchain-evm` (wallet, contract)
//! and `client-storage` (IPFS gateway, metadata retrieval). The `mock` feature
//! provides in-memory versions of all of them.
//!
//! # Usage
//!
//! ```ignore
//! use client_blockchain_core::{ContractConnector, units};
//!
//! async fn list(connector: &dyn ContractConnector, uri: &str) -> anyhow::Result<()> {
//!     let contract = connector.connect_signer().await?;
//!     let fee = contract.listing_price().await?;
//!     let tx = contract.create_token(uri, units::parse_price("0.5")?, fee).await?;
//!     contract.wait_for_confirmation(&tx).await?;
//!     Ok(())
//! }
//! ```

pub mod traits;
pub mod types;
pub mod units;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export all traits
pub use traits::{
    ContentStore, ContractConnector, ContractError, MarketplaceContract, MetadataError,
    MetadataFetcher, StorageError, WalletError, WalletProvider,
};

// Re-export all types
pub use types::{
    AddedContent, ChainConfig, ConfirmedTransaction, ListedItem, ListingInput, MarketItem,
    NftMetadata, NftQuery, SaleKind, TransactionId, display_address,
};

pub use units::{PriceError, format_price, parse_price};

// Chain primitives shared by every crate in the workspace
pub use ethers_core::types::{Address, H256, U256};

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockChain, MockContentStore, MockContractConnector, MockWallet};
