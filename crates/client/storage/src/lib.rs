//! Off-chain storage for the NFT marketplace client.
//!
//! This crate provides the content gateway and metadata retrieval used by the
//! marketplace context:
//! - [`IpfsClient`]: uploads content through the IPFS HTTP API and builds
//!   gateway retrieval URLs ([`client_blockchain_core::ContentStore`])
//! - [`HttpMetadataFetcher`]: downloads token metadata documents
//!   ([`client_blockchain_core::MetadataFetcher`])

pub mod config;
pub mod ipfs;
pub mod metadata;

pub use config::IpfsConfig;
pub use ipfs::{AddResponse, IpfsClient};
pub use metadata::HttpMetadataFetcher;
