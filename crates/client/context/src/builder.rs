//! Context builder with dependency injection pattern.

use std::sync::Arc;

use client_blockchain_core::{ContentStore, ContractConnector, MetadataFetcher, WalletProvider};

use crate::config::ContextConfig;
use crate::context::MarketplaceContext;
use crate::error::{ContextError, Result};

/// Builder for constructing a [`MarketplaceContext`].
///
/// All four collaborators are required; `build()` fails on the first one
/// that is missing. Configuration falls back to [`ContextConfig::default`].
#[derive(Default)]
pub struct MarketplaceContextBuilder {
    wallet: Option<Arc<dyn WalletProvider>>,
    storage: Option<Arc<dyn ContentStore>>,
    metadata: Option<Arc<dyn MetadataFetcher>>,
    contracts: Option<Arc<dyn ContractConnector>>,
    config: ContextConfig,
}

impl MarketplaceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the wallet provider (required).
    pub fn wallet(mut self, wallet: Arc<dyn WalletProvider>) -> Self {
        self.wallet = Some(wallet);
        self
    }

    /// Set the content-addressed storage gateway (required).
    pub fn storage(mut self, storage: Arc<dyn ContentStore>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Set the metadata fetcher used when assembling listings (required).
    pub fn metadata(mut self, metadata: Arc<dyn MetadataFetcher>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Set the contract connector (required).
    pub fn contracts(mut self, contracts: Arc<dyn ContractConnector>) -> Self {
        self.contracts = Some(contracts);
        self
    }

    pub fn config(mut self, config: ContextConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<MarketplaceContext> {
        let wallet = self.wallet.ok_or(ContextError::MissingComponent("wallet"))?;
        let storage = self
            .storage
            .ok_or(ContextError::MissingComponent("storage"))?;
        let metadata = self
            .metadata
            .ok_or(ContextError::MissingComponent("metadata"))?;
        let contracts = self
            .contracts
            .ok_or(ContextError::MissingComponent("contracts"))?;

        Ok(MarketplaceContext::new(
            wallet,
            storage,
            metadata,
            contracts,
            self.config,
        ))
    }
}
