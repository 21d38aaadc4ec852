//! Unified error types surfaced by the marketplace context.
//!
//! Wraps failures from the wallet, storage gateway, metadata retrieval and
//! contract so UI code can branch on a single type.

use thiserror::Error;

use client_blockchain_core::{
    ContractError, MetadataError, PriceError, StorageError, U256, WalletError,
};

pub type Result<T> = std::result::Result<T, ContextError>;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error("invalid price: {0}")]
    Price(#[from] PriceError),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("failed to encode token metadata")]
    Encode(#[source] serde_json::Error),

    #[error("token id {0} does not fit in u64")]
    TokenIdOverflow(U256),

    #[error("{0} is required to build the marketplace context")]
    MissingComponent(&'static str),
}
