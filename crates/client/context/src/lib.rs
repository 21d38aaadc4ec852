//! Integration context for the NFT marketplace client.
//!
//! [`MarketplaceContext`] owns the session account and drives the wallet,
//! storage gateway and marketplace contract through the collaborator traits
//! in `client-blockchain-core`. UI code holds a clone of the context and
//! listens on [`MarketplaceContext::subscribe`] for changes.
//!
//! ```ignore
//! let context = MarketplaceContext::builder()
//!     .wallet(wallet)
//!     .storage(ipfs.clone())
//!     .metadata(fetcher)
//!     .contracts(connector)
//!     .config(ContextConfig::from_env())
//!     .build()?;
//!
//! context.connect_wallet().await?;
//! let items = context.fetch_nfts().await?;
//! ```

pub mod builder;
pub mod config;
pub mod context;
pub mod error;
pub mod events;

pub use builder::MarketplaceContextBuilder;
pub use config::{ContextConfig, TITLE_DATA};
pub use context::MarketplaceContext;
pub use error::{ContextError, Result};
pub use events::ContextEvent;
