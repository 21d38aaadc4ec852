//! Wallet provider backed by a JSON-RPC endpoint or a local key.

use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider, ProviderError, RpcError};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::Address;

use client_blockchain_core::{WalletError, WalletProvider};

use crate::config::EvmConfig;

/// EIP-1193 code for a user rejecting a request.
const USER_REJECTED: i64 = 4001;

/// JSON-RPC code for an unknown method.
const METHOD_NOT_FOUND: i64 = -32601;

/// Account source and signer for EVM chains.
///
/// With a local key the key's address is the only account. Otherwise accounts
/// come from the wallet endpoint, which also signs `eth_sendTransaction`.
pub struct EvmWallet {
    provider: Option<Provider<Http>>,
    signer: Option<LocalWallet>,
}

impl EvmWallet {
    /// Build the wallet described by `config`.
    ///
    /// A config with neither a wallet endpoint nor a private key yields a
    /// wallet that reports itself as not installed.
    pub fn from_config(config: &EvmConfig) -> Result<Self, WalletError> {
        let signer = config.local_signer().map_err(WalletError::Provider)?;

        let provider = config
            .wallet_rpc_url
            .as_deref()
            .map(Provider::<Http>::try_from)
            .transpose()
            .map_err(|e| WalletError::Provider(format!("Invalid wallet RPC URL: {}", e)))?;

        Ok(Self { provider, signer })
    }

    /// Wallet that talks to `provider`.
    pub fn with_provider(provider: Provider<Http>) -> Self {
        Self {
            provider: Some(provider),
            signer: None,
        }
    }

    /// Wallet that signs locally with `signer`.
    pub fn with_signer(signer: LocalWallet) -> Self {
        Self {
            provider: None,
            signer: Some(signer),
        }
    }

    /// Wallet with nothing behind it.
    pub fn unavailable() -> Self {
        Self {
            provider: None,
            signer: None,
        }
    }

    pub fn signer(&self) -> Option<&LocalWallet> {
        self.signer.as_ref()
    }

    pub fn provider(&self) -> Option<&Provider<Http>> {
        self.provider.as_ref()
    }
}

fn rpc_error_code(error: &ProviderError) -> Option<i64> {
    error.as_error_response().map(|response| response.code)
}

fn provider_error(error: ProviderError) -> WalletError {
    match rpc_error_code(&error) {
        Some(USER_REJECTED) => WalletError::Rejected(error.to_string()),
        _ => WalletError::Provider(error.to_string()),
    }
}

#[async_trait]
impl WalletProvider for EvmWallet {
    fn is_available(&self) -> bool {
        self.signer.is_some() || self.provider.is_some()
    }

    async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        if let Some(signer) = &self.signer {
            return Ok(vec![signer.address()]);
        }

        let provider = self.provider.as_ref().ok_or(WalletError::NotInstalled)?;
        provider.get_accounts().await.map_err(provider_error)
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        if let Some(signer) = &self.signer {
            return Ok(vec![signer.address()]);
        }

        let provider = self.provider.as_ref().ok_or(WalletError::NotInstalled)?;

        tracing::debug!("Requesting wallet accounts");
        match provider
            .request::<_, Vec<Address>>("eth_requestAccounts", ())
            .await
        {
            Ok(accounts) => Ok(accounts),
            Err(e) if rpc_error_code(&e) == Some(METHOD_NOT_FOUND) => {
                // Dev nodes expose unlocked accounts without an authorization step
                tracing::debug!("eth_requestAccounts unsupported, falling back to eth_accounts");
                provider.get_accounts().await.map_err(provider_error)
            }
            Err(e) => Err(provider_error(e)),
        }
    }
}
