//! IPFS content storage integration.
//!
//! ## Integration Pattern
//!
//! We use the IPFS HTTP API for simplicity and stability:
//! 1. Upload content via `POST /api/v0/add` → get the content hash
//! 2. Build a retrieval URL on the configured gateway
//! 3. Store that URL on-chain as the token URI
//!
//! ## Modules
//!
//! - [`client`]: HTTP client for IPFS storage operations
//! - [`types`]: IPFS API response types

pub mod client;
pub mod types;

// Re-export primary types
pub use client::IpfsClient;
pub use types::AddResponse;
