//! EVM chain configuration.

use std::env;
use std::fmt;
use std::str::FromStr;

use client_blockchain_core::ChainConfig;
use ethers::signers::LocalWallet;
use ethers::types::Address;

/// EVM network types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvmNetwork {
    /// Ethereum mainnet
    Mainnet,
    /// Sepolia testnet
    Sepolia,
    /// Local development node (hardhat, anvil)
    Local,
}

impl EvmNetwork {
    pub fn default_rpc_url(&self) -> &str {
        match self {
            EvmNetwork::Mainnet => "https://ethereum-rpc.publicnode.com",
            EvmNetwork::Sepolia => "https://ethereum-sepolia-rpc.publicnode.com",
            EvmNetwork::Local => "http://127.0.0.1:8545",
        }
    }

    pub fn chain_id(&self) -> u64 {
        match self {
            EvmNetwork::Mainnet => 1,
            EvmNetwork::Sepolia => 11_155_111,
            EvmNetwork::Local => 31_337,
        }
    }
}

impl FromStr for EvmNetwork {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" => Ok(EvmNetwork::Mainnet),
            "sepolia" => Ok(EvmNetwork::Sepolia),
            "local" | "localhost" | "hardhat" => Ok(EvmNetwork::Local),
            other => Err(format!(
                "Invalid MARKET_NETWORK: {}. Must be mainnet, sepolia, or local",
                other
            )),
        }
    }
}

impl fmt::Display for EvmNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EvmNetwork::Mainnet => "mainnet",
            EvmNetwork::Sepolia => "sepolia",
            EvmNetwork::Local => "local",
        };
        write!(f, "{}", label)
    }
}

/// EVM-specific configuration.
#[derive(Clone)]
pub struct EvmConfig {
    /// Network to connect to
    pub network: EvmNetwork,

    /// Custom read RPC endpoint URL (overrides network default)
    pub rpc_url: Option<String>,

    /// Wallet RPC endpoint that manages accounts and signs transactions
    pub wallet_rpc_url: Option<String>,

    /// Hex private key for local signing (takes precedence over the wallet RPC)
    pub private_key: Option<String>,

    /// Address of the deployed marketplace contract
    pub contract_address: Option<String>,

    /// Blocks to wait for before a transaction counts as confirmed
    pub confirmations: usize,
}

impl EvmConfig {
    /// Create a new EVM configuration.
    pub fn new(network: EvmNetwork) -> Self {
        Self {
            network,
            rpc_url: None,
            wallet_rpc_url: None,
            private_key: None,
            contract_address: None,
            confirmations: 1,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `MARKET_NETWORK` - Network name (mainnet, sepolia, local) (default: local)
    /// - `MARKET_RPC_URL` - Custom read RPC endpoint URL
    /// - `MARKET_WALLET_RPC_URL` - Wallet RPC endpoint (unset: no wallet)
    /// - `MARKET_PRIVATE_KEY` - Private key for local signing
    /// - `MARKET_CONTRACT_ADDRESS` - Deployed marketplace address
    /// - `MARKET_CONFIRMATIONS` - Confirmation blocks (default: 1)
    pub fn from_env() -> Result<Self, String> {
        let network = env::var("MARKET_NETWORK")
            .unwrap_or_else(|_| "local".to_string())
            .parse::<EvmNetwork>()?;

        let confirmations = env::var("MARKET_CONFIRMATIONS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(1);

        Ok(Self {
            network,
            rpc_url: non_empty_var("MARKET_RPC_URL"),
            wallet_rpc_url: non_empty_var("MARKET_WALLET_RPC_URL"),
            private_key: non_empty_var("MARKET_PRIVATE_KEY"),
            contract_address: non_empty_var("MARKET_CONTRACT_ADDRESS"),
            confirmations,
        })
    }

    /// Set custom RPC URL.
    pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = Some(url.into());
        self
    }

    /// Set wallet RPC URL.
    pub fn with_wallet_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.wallet_rpc_url = Some(url.into());
        self
    }

    /// Set private key.
    pub fn with_private_key(mut self, key: impl Into<String>) -> Self {
        self.private_key = Some(key.into());
        self
    }

    /// Set contract address.
    pub fn with_contract_address(mut self, address: impl Into<String>) -> Self {
        self.contract_address = Some(address.into());
        self
    }

    /// Set confirmation depth.
    pub fn with_confirmations(mut self, confirmations: usize) -> Self {
        self.confirmations = confirmations;
        self
    }

    /// Get the RPC URL (custom or default for network).
    pub fn get_rpc_url(&self) -> &str {
        self.rpc_url
            .as_deref()
            .unwrap_or_else(|| self.network.default_rpc_url())
    }

    /// Parsed contract address.
    pub fn contract_address(&self) -> Result<Address, String> {
        let raw = self
            .contract_address
            .as_deref()
            .ok_or_else(|| "MARKET_CONTRACT_ADDRESS is not set".to_string())?;
        raw.parse::<Address>()
            .map_err(|e| format!("Invalid contract address {}: {}", raw, e))
    }

    /// Parsed local signer, if a private key is configured.
    pub fn local_signer(&self) -> Result<Option<LocalWallet>, String> {
        self.private_key
            .as_deref()
            .map(|key| {
                key.parse::<LocalWallet>()
                    .map_err(|e| format!("Invalid private key: {}", e))
            })
            .transpose()
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

impl ChainConfig for EvmConfig {
    fn network_name(&self) -> &str {
        match self.network {
            EvmNetwork::Mainnet => "evm-mainnet",
            EvmNetwork::Sepolia => "evm-sepolia",
            EvmNetwork::Local => "evm-local",
        }
    }

    fn rpc_url(&self) -> &str {
        self.get_rpc_url()
    }

    fn validate(&self) -> Result<(), String> {
        let url = self.get_rpc_url();
        if !is_http_url(url) {
            return Err(format!("Invalid RPC URL format: {}", url));
        }

        if let Some(ref wallet_url) = self.wallet_rpc_url
            && !is_http_url(wallet_url)
        {
            return Err(format!("Invalid wallet RPC URL format: {}", wallet_url));
        }

        if self.confirmations == 0 {
            return Err("Confirmations must be greater than 0".to_string());
        }

        // Contract address is optional until a contract call is made
        if self.contract_address.is_some() {
            self.contract_address()?;
        }

        self.local_signer()?;

        Ok(())
    }
}

impl Default for EvmConfig {
    fn default() -> Self {
        Self::new(EvmNetwork::Local)
    }
}

impl fmt::Debug for EvmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvmConfig")
            .field("network", &self.network)
            .field("rpc_url", &self.get_rpc_url())
            .field("wallet_rpc_url", &self.wallet_rpc_url)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("contract_address", &self.contract_address)
            .field("confirmations", &self.confirmations)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known development key (hardhat/anvil account #0)
    const DEV_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_defaults_point_at_local_node() {
        let config = EvmConfig::default();
        assert_eq!(config.network, EvmNetwork::Local);
        assert_eq!(config.get_rpc_url(), "http://127.0.0.1:8545");
        assert_eq!(config.network_name(), "evm-local");
        assert_eq!(config.confirmations, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_network_parsing() {
        assert_eq!("Sepolia".parse::<EvmNetwork>().unwrap(), EvmNetwork::Sepolia);
        assert_eq!("hardhat".parse::<EvmNetwork>().unwrap(), EvmNetwork::Local);
        assert!("goerli".parse::<EvmNetwork>().is_err());
        assert_eq!(EvmNetwork::Sepolia.chain_id(), 11_155_111);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad_url = EvmConfig::default().with_rpc_url("ws://localhost:8546");
        assert!(bad_url.validate().is_err());

        let bad_address = EvmConfig::default().with_contract_address("0x1234");
        assert!(bad_address.validate().is_err());

        let bad_key = EvmConfig::default().with_private_key("not-a-key");
        assert!(bad_key.validate().is_err());

        let zero_confirmations = EvmConfig::default().with_confirmations(0);
        assert!(zero_confirmations.validate().is_err());
    }

    #[test]
    fn test_contract_address_and_signer_parse() {
        let config = EvmConfig::default()
            .with_contract_address("0x5FbDB2315678afecb367f032d93F642f64180aa3")
            .with_private_key(DEV_KEY);

        assert!(config.validate().is_ok());
        assert!(config.contract_address().is_ok());
        assert!(config.local_signer().unwrap().is_some());
        assert!(EvmConfig::default().contract_address().is_err());
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let config = EvmConfig::default().with_private_key(DEV_KEY);
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains(DEV_KEY));
        assert!(rendered.contains("<redacted>"));
    }
}
