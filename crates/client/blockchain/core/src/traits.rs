//! Collaborator traits.
//!
//! This module defines one trait per external service:
//! - WalletProvider: account source and transaction signer
//! - ContentStore: content-addressed storage gateway
//! - MetadataFetcher: retrieval of off-chain token metadata
//! - MarketplaceContract / ContractConnector: the on-chain marketplace

use std::sync::Arc;

use async_trait::async_trait;

use crate::types::{
    AddedContent, ConfirmedTransaction, MarketItem, NftMetadata, TransactionId,
};
use ethers_core::types::{Address, U256};

// ============================================================================
// Error Types
// ============================================================================

/// Wallet provider errors.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("no wallet provider installed")]
    NotInstalled,

    #[error("wallet request rejected: {0}")]
    Rejected(String),

    #[error("wallet returned no accounts")]
    NoAccounts,

    #[error("wallet provider error: {0}")]
    Provider(String),
}

/// Content storage gateway errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("network error: {0}")]
    Network(String),

    #[error("gateway responded with status {status}: {body}")]
    Gateway { status: u16, body: String },

    #[error("invalid gateway response: {0}")]
    InvalidResponse(String),
}

/// Metadata retrieval errors.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("network error fetching {uri}: {reason}")]
    Network { uri: String, reason: String },

    #[error("metadata request to {uri} failed with status {status}")]
    Status { uri: String, status: u16 },

    #[error("invalid metadata document at {uri}: {reason}")]
    Decode { uri: String, reason: String },
}

/// Marketplace contract errors.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("network error: {0}")]
    Network(String),

    #[error("contract call failed: {0}")]
    Call(String),

    #[error("transaction failed: {0}")]
    TransactionFailed(String),

    #[error("contract handle is read-only")]
    ReadOnly,

    #[error("failed to decode contract response: {0}")]
    Decode(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("wallet error: {0}")]
    Wallet(#[from] WalletError),
}

// ============================================================================
// Layer 0: Collaborators
// ============================================================================

/// Account source and signer.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Whether a wallet is present at all.
    fn is_available(&self) -> bool;

    /// List already-authorized accounts without prompting the user.
    async fn accounts(&self) -> Result<Vec<Address>, WalletError>;

    /// Ask the wallet for accounts. May prompt the user.
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError>;
}

/// Content-addressed storage gateway.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Add raw content and return the locator assigned by the gateway.
    async fn add(&self, content: Vec<u8>) -> Result<AddedContent, StorageError>;

    /// Public retrieval URL for a path returned by [`ContentStore::add`].
    fn retrieval_url(&self, path: &str) -> String;
}

/// Off-chain metadata retrieval.
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    /// Fetch and decode the JSON metadata document at `uri`.
    async fn fetch(&self, uri: &str) -> Result<NftMetadata, MetadataError>;
}

/// The deployed marketplace contract.
///
/// Write calls return as soon as the transaction is accepted; callers must use
/// [`MarketplaceContract::wait_for_confirmation`] to observe the on-chain result.
#[async_trait]
pub trait MarketplaceContract: Send + Sync {
    /// Fee required to list an item.
    async fn listing_price(&self) -> Result<U256, ContractError>;

    /// Mint a new token pointing at `token_uri` and list it for `price`.
    async fn create_token(
        &self,
        token_uri: &str,
        price: U256,
        value: U256,
    ) -> Result<TransactionId, ContractError>;

    /// Relist an owned token for `price`.
    async fn resell_token(
        &self,
        token_id: U256,
        price: U256,
        value: U256,
    ) -> Result<TransactionId, ContractError>;

    /// Wait until a submitted transaction is mined. A reverted transaction is an error.
    async fn wait_for_confirmation(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<ConfirmedTransaction, ContractError>;

    /// All unsold items listed on the market.
    async fn fetch_market_items(&self) -> Result<Vec<MarketItem>, ContractError>;

    /// Items owned by the bound account.
    async fn fetch_my_nfts(&self) -> Result<Vec<MarketItem>, ContractError>;

    /// Items listed by the bound account.
    async fn fetch_items_listed(&self) -> Result<Vec<MarketItem>, ContractError>;

    /// Metadata URI stored for a token.
    async fn token_uri(&self, token_id: U256) -> Result<String, ContractError>;
}

// ============================================================================
// Layer 1: Connection
// ============================================================================

/// Hands out contract handles.
#[async_trait]
pub trait ContractConnector: Send + Sync {
    /// Prompt the wallet for a connection and return a handle that signs as
    /// the connected account.
    async fn connect_signer(&self) -> Result<Arc<dyn MarketplaceContract>, ContractError>;

    /// Handle for view calls only. Write calls on it fail with
    /// [`ContractError::ReadOnly`].
    fn read_only(&self) -> Result<Arc<dyn MarketplaceContract>, ContractError>;
}
