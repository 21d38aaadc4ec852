//! Contract handles for the configured network.

use std::sync::Arc;

use async_trait::async_trait;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::Signer;
use ethers::types::Address;

use client_blockchain_core::{
    ChainConfig, ContractConnector, ContractError, MarketplaceContract, WalletError,
    WalletProvider,
};

use crate::config::EvmConfig;
use crate::contract::EvmMarketplace;
use crate::wallet::EvmWallet;

/// Hands out [`EvmMarketplace`] handles.
///
/// Signer-bound handles sign with the wallet's local key when one is
/// configured, and otherwise send through the wallet endpoint as the first
/// account it authorizes. Either way the signing endpoint must report the
/// chain id of the configured network.
pub struct EvmConnector {
    config: EvmConfig,
    wallet: Arc<EvmWallet>,
    read_provider: Provider<Http>,
    contract_address: Address,
}

impl EvmConnector {
    /// Create a connector for the contract in `config`.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid or names no contract.
    pub fn new(config: EvmConfig, wallet: Arc<EvmWallet>) -> Result<Self, ContractError> {
        config.validate().map_err(ContractError::Config)?;

        let contract_address = config.contract_address().map_err(ContractError::Config)?;
        let read_provider = Provider::<Http>::try_from(config.get_rpc_url())
            .map_err(|e| ContractError::Config(format!("Invalid RPC URL: {}", e)))?;

        tracing::debug!(
            "EVM connector ready: network={}, contract={:?}",
            config.network_name(),
            contract_address
        );

        Ok(Self {
            config,
            wallet,
            read_provider,
            contract_address,
        })
    }

    pub fn config(&self) -> &EvmConfig {
        &self.config
    }

    pub fn contract_address(&self) -> Address {
        self.contract_address
    }

    fn ensure_chain(&self, chain_id: u64) -> Result<(), ContractError> {
        let expected = self.config.network.chain_id();
        if chain_id == expected {
            return Ok(());
        }

        tracing::warn!(
            "Signer is on chain {}, expected {} ({})",
            chain_id,
            expected,
            self.config.network
        );
        Err(ContractError::Config(format!(
            "signer is on chain {}, but network {} is chain {}; check MARKET_NETWORK",
            chain_id, self.config.network, expected
        )))
    }
}

#[async_trait]
impl ContractConnector for EvmConnector {
    async fn connect_signer(&self) -> Result<Arc<dyn MarketplaceContract>, ContractError> {
        if let Some(signer) = self.wallet.signer() {
            let client = SignerMiddleware::new_with_provider_chain(
                self.read_provider.clone(),
                signer.clone(),
            )
            .await
            .map_err(|e| ContractError::Network(e.to_string()))?;

            // The middleware adopts the chain id reported by the read endpoint
            self.ensure_chain(client.signer().chain_id())?;

            let sender = client.address();
            tracing::debug!("Connected local signer {:?}", sender);
            let contract = EvmMarketplace::signer(
                self.contract_address,
                Arc::new(client),
                sender,
                self.config.confirmations,
            )?;
            return Ok(Arc::new(contract));
        }

        let accounts = self.wallet.request_accounts().await?;
        let sender = accounts.first().copied().ok_or(WalletError::NoAccounts)?;
        let provider = self
            .wallet
            .provider()
            .cloned()
            .ok_or(WalletError::NotInstalled)?
            .with_sender(sender);

        let chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| ContractError::Network(e.to_string()))?;
        self.ensure_chain(chain_id.low_u64())?;

        tracing::debug!("Connected wallet account {:?}", sender);
        let contract = EvmMarketplace::signer(
            self.contract_address,
            Arc::new(provider),
            sender,
            self.config.confirmations,
        )?;
        Ok(Arc::new(contract))
    }

    fn read_only(&self) -> Result<Arc<dyn MarketplaceContract>, ContractError> {
        let contract =
            EvmMarketplace::read_only(self.contract_address, Arc::new(self.read_provider.clone()))?;
        Ok(Arc::new(contract))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::signers::LocalWallet;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
    const DEV_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const DEV_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    async fn mount_result(server: &MockServer, rpc_method: &str, result: serde_json::Value) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": rpc_method })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": result
            })))
            .mount(server)
            .await;
    }

    /// Connector whose wallet endpoint is `server`, configured for the local network.
    async fn wallet_connector(server: &MockServer, chain_id: &str) -> EvmConnector {
        mount_result(server, "eth_requestAccounts", json!([DEV_ADDRESS])).await;
        mount_result(server, "eth_chainId", json!(chain_id)).await;

        let wallet = EvmWallet::with_provider(Provider::<Http>::try_from(server.uri()).unwrap());
        let config = EvmConfig::default()
            .with_contract_address(CONTRACT)
            .with_wallet_rpc_url(server.uri());
        EvmConnector::new(config, Arc::new(wallet)).unwrap()
    }

    #[test]
    fn test_requires_contract_address() {
        let wallet = Arc::new(EvmWallet::unavailable());
        let err = EvmConnector::new(EvmConfig::default(), wallet).err().unwrap();
        assert!(matches!(err, ContractError::Config(_)));
    }

    #[tokio::test]
    async fn test_signer_requires_wallet() {
        let wallet = Arc::new(EvmWallet::unavailable());
        let config = EvmConfig::default().with_contract_address(CONTRACT);
        let connector = EvmConnector::new(config, wallet).unwrap();

        assert_eq!(connector.contract_address(), CONTRACT.parse::<Address>().unwrap());
        assert!(connector.read_only().is_ok());
        assert!(matches!(
            connector.connect_signer().await.err().unwrap(),
            ContractError::Wallet(WalletError::NotInstalled)
        ));
    }

    #[tokio::test]
    async fn test_wallet_on_configured_chain_connects() {
        let server = MockServer::start().await;
        // 31337, the local network
        let connector = wallet_connector(&server, "0x7a69").await;

        assert!(connector.connect_signer().await.is_ok());
    }

    #[tokio::test]
    async fn test_wallet_on_other_chain_is_refused() {
        let server = MockServer::start().await;
        let connector = wallet_connector(&server, "0x1").await;

        let err = connector.connect_signer().await.err().unwrap();
        match err {
            ContractError::Config(message) => assert!(message.contains("MARKET_NETWORK")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_local_key_on_other_chain_is_refused() {
        let server = MockServer::start().await;
        mount_result(&server, "eth_chainId", json!("0xaa36a7")).await;

        let signer: LocalWallet = DEV_KEY.parse().unwrap();
        assert_eq!(signer.address(), DEV_ADDRESS.parse::<Address>().unwrap());
        let config = EvmConfig::default()
            .with_contract_address(CONTRACT)
            .with_rpc_url(server.uri());
        let connector =
            EvmConnector::new(config, Arc::new(EvmWallet::with_signer(signer))).unwrap();

        assert!(matches!(
            connector.connect_signer().await.err().unwrap(),
            ContractError::Config(_)
        ));
    }

    #[tokio::test]
    async fn test_local_key_on_configured_chain_connects() {
        let server = MockServer::start().await;
        mount_result(&server, "eth_chainId", json!("0x7a69")).await;

        let config = EvmConfig::default()
            .with_contract_address(CONTRACT)
            .with_rpc_url(server.uri());
        let wallet = EvmWallet::with_signer(DEV_KEY.parse().unwrap());
        let connector = EvmConnector::new(config, Arc::new(wallet)).unwrap();

        assert!(connector.connect_signer().await.is_ok());
    }
}
