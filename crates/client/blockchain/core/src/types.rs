//! Common types for marketplace interactions.

use ethers_core::types::{Address, H256, U256};
use serde::{Deserialize, Serialize};

/// Transaction hash of a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub H256);

impl TransactionId {
    pub fn hash(&self) -> H256 {
        self.0
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // H256's Display abbreviates, Debug prints the full hash
        write!(f, "{:?}", self.0)
    }
}

/// A transaction that has been mined successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedTransaction {
    pub transaction_id: TransactionId,

    /// Block the transaction was included in
    pub block_number: u64,

    /// Gas consumed, when the node reports it
    pub gas_used: Option<U256>,
}

/// Locator returned by the storage gateway for added content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddedContent {
    /// Content path (CID) used to build the retrieval URL
    pub path: String,

    /// Stored size in bytes
    pub size: u64,
}

/// Off-chain metadata document stored for each token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftMetadata {
    pub name: String,
    pub description: String,

    /// Retrieval URL of the item's media
    pub image: String,
}

/// User-supplied listing form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingInput {
    pub name: String,
    pub description: String,

    /// Human-readable decimal price in the native currency (e.g. "0.025")
    pub price: String,
}

impl ListingInput {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        price: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            price: price.into(),
        }
    }
}

/// On-chain market item as returned by the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketItem {
    pub token_id: U256,
    pub seller: Address,
    pub owner: Address,

    /// Price in base units
    pub price: U256,
    pub sold: bool,
}

/// Read model handed to the UI: on-chain item joined with its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedItem {
    /// Decimal price in the native currency
    pub price: String,
    pub token_id: u64,
    pub seller: String,
    pub owner: String,
    pub image: String,
    pub name: String,
    pub description: String,
    pub token_uri: String,
}

/// How a sale reaches the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaleKind {
    /// Mint a new token and list it
    Mint,

    /// Relist a token the caller owns
    Resell { token_id: U256 },
}

/// Account-scoped item queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NftQuery {
    /// Items owned by the connected account
    Owned,

    /// Items the connected account has listed
    Listed,
}

/// Checksummed `0x` form of an address, as wallets display it.
pub fn display_address(address: &Address) -> String {
    ethers_core::utils::to_checksum(address, None)
}

/// Chain-specific configuration.
///
/// This is a trait to allow different chains to provide their own config types.
pub trait ChainConfig: Send + Sync {
    /// Human-readable network name (e.g., "evm-sepolia", "evm-local")
    fn network_name(&self) -> &str;

    /// RPC endpoint URL
    fn rpc_url(&self) -> &str;

    /// Validate configuration (e.g., URL format, address format)
    fn validate(&self) -> Result<(), String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_address_is_checksummed() {
        let address: Address = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".parse().unwrap();
        assert_eq!(
            display_address(&address),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
    }

    #[test]
    fn test_transaction_id_displays_full_hash() {
        let id = TransactionId(H256::from_low_u64_be(1));
        let rendered = id.to_string();
        assert_eq!(rendered.len(), 66);
        assert!(rendered.ends_with("01"));
    }
}
