//! Marketplace contract binding.
//!
//! ## Solidity Reference
//!
//! ```solidity
//! contract NFTMarketplace is ERC721URIStorage {
//!     struct MarketItem {
//!         uint256 tokenId;
//!         address payable seller;
//!         address payable owner;
//!         uint256 price;
//!         bool sold;
//!     }
//!
//!     function getListingPrice() public view returns (uint256);
//!     function createToken(string memory tokenURI, uint256 price) public payable returns (uint256);
//!     function reSellToken(uint256 tokenId, uint256 price) public payable;
//!     function fetchMarketItems() public view returns (MarketItem[] memory);
//!     function fetchMyNFTs() public view returns (MarketItem[] memory);
//!     function fetchItemsListed() public view returns (MarketItem[] memory);
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use ethers::abi::{Abi, Detokenize, Tokenize, parse_abi};
use ethers::contract::{Contract, ContractCall};
use ethers::providers::{Middleware, PendingTransaction};
use ethers::types::{Address, U64, U256};

use client_blockchain_core::{
    ConfirmedTransaction, ContractError, MarketItem, MarketplaceContract, TransactionId,
};

/// Human-readable ABI of the calls this client makes.
///
/// Tuple returns must go through a named struct; the parser reads an inline
/// `(..)[]` return as separate scalar outputs.
const MARKETPLACE_ABI: &[&str] = &[
    "struct MarketItem { uint256 tokenId; address seller; address owner; uint256 price; bool sold; }",
    "function getListingPrice() external view returns (uint256)",
    "function createToken(string tokenURI, uint256 price) external payable returns (uint256)",
    "function reSellToken(uint256 tokenId, uint256 price) external payable",
    "function fetchMarketItems() external view returns (MarketItem[])",
    "function fetchMyNFTs() external view returns (MarketItem[])",
    "function fetchItemsListed() external view returns (MarketItem[])",
    "function tokenURI(uint256 tokenId) external view returns (string)",
];

/// `MarketItem` as decoded from the ABI tuple.
type RawMarketItem = (U256, Address, Address, U256, bool);

pub fn marketplace_abi() -> Result<Abi, ContractError> {
    parse_abi(MARKETPLACE_ABI).map_err(|e| ContractError::Config(format!("invalid ABI: {}", e)))
}

fn into_market_item((token_id, seller, owner, price, sold): RawMarketItem) -> MarketItem {
    MarketItem {
        token_id,
        seller,
        owner,
        price,
        sold,
    }
}

fn call_error(error: impl std::fmt::Display) -> ContractError {
    ContractError::Call(error.to_string())
}

/// Marketplace contract bound to a middleware.
///
/// The middleware decides who signs: a `SignerMiddleware` with a local key, a
/// provider with a default sender for wallet-managed accounts, or a bare
/// provider for read-only access. Signer-bound handles also set `from` on
/// view calls, since `fetchMyNFTs` and `fetchItemsListed` filter on
/// `msg.sender` and a bare provider leaves it unset.
pub struct EvmMarketplace<M: Middleware> {
    contract: Contract<M>,
    client: Arc<M>,
    sender: Option<Address>,
    confirmations: usize,
}

impl<M: Middleware + 'static> EvmMarketplace<M> {
    /// Handle that submits transactions and queries as `sender`.
    pub fn signer(
        address: Address,
        client: Arc<M>,
        sender: Address,
        confirmations: usize,
    ) -> Result<Self, ContractError> {
        Self::new(address, client, Some(sender), confirmations)
    }

    /// Handle for view calls only.
    pub fn read_only(address: Address, client: Arc<M>) -> Result<Self, ContractError> {
        Self::new(address, client, None, 1)
    }

    fn new(
        address: Address,
        client: Arc<M>,
        sender: Option<Address>,
        confirmations: usize,
    ) -> Result<Self, ContractError> {
        let abi = marketplace_abi()?;
        Ok(Self {
            contract: Contract::new(address, abi, client.clone()),
            client,
            sender,
            confirmations: confirmations.max(1),
        })
    }

    pub fn address(&self) -> Address {
        self.contract.address()
    }

    pub fn sender(&self) -> Option<Address> {
        self.sender
    }

    /// Build a call to `function`, sent from the bound account if any.
    fn method<T, D>(&self, function: &str, args: T) -> Result<ContractCall<M, D>, ContractError>
    where
        T: Tokenize,
        D: Detokenize,
    {
        let call = self
            .contract
            .method::<_, D>(function, args)
            .map_err(call_error)?;

        Ok(match self.sender {
            Some(sender) => call.from(sender),
            None => call,
        })
    }

    async fn fetch_items(&self, function: &str) -> Result<Vec<MarketItem>, ContractError> {
        let raw = self
            .method::<_, Vec<RawMarketItem>>(function, ())?
            .call()
            .await
            .map_err(call_error)?;

        tracing::debug!("{} returned {} items", function, raw.len());
        Ok(raw.into_iter().map(into_market_item).collect())
    }

    async fn send_payable<T>(
        &self,
        function: &str,
        args: T,
        value: U256,
    ) -> Result<TransactionId, ContractError>
    where
        T: Tokenize + Send,
    {
        if self.sender.is_none() {
            return Err(ContractError::ReadOnly);
        }

        let call = self.method::<_, ()>(function, args)?.value(value);

        let pending = call.send().await.map_err(call_error)?;
        let transaction_id = TransactionId(*pending);

        tracing::info!("Submitted {} transaction {}", function, transaction_id);
        Ok(transaction_id)
    }
}

#[async_trait]
impl<M: Middleware + 'static> MarketplaceContract for EvmMarketplace<M> {
    async fn listing_price(&self) -> Result<U256, ContractError> {
        self.method::<_, U256>("getListingPrice", ())?
            .call()
            .await
            .map_err(call_error)
    }

    async fn create_token(
        &self,
        token_uri: &str,
        price: U256,
        value: U256,
    ) -> Result<TransactionId, ContractError> {
        self.send_payable("createToken", (token_uri.to_string(), price), value)
            .await
    }

    async fn resell_token(
        &self,
        token_id: U256,
        price: U256,
        value: U256,
    ) -> Result<TransactionId, ContractError> {
        self.send_payable("reSellToken", (token_id, price), value).await
    }

    async fn wait_for_confirmation(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<ConfirmedTransaction, ContractError> {
        tracing::debug!(
            "Waiting for {} confirmation(s) of {}",
            self.confirmations,
            transaction_id
        );

        let receipt = PendingTransaction::new(transaction_id.hash(), self.client.provider())
            .confirmations(self.confirmations)
            .await
            .map_err(|e| ContractError::Network(e.to_string()))?
            .ok_or_else(|| {
                ContractError::TransactionFailed(format!(
                    "{} was dropped before confirmation",
                    transaction_id
                ))
            })?;

        if receipt.status == Some(U64::zero()) {
            return Err(ContractError::TransactionFailed(format!(
                "{} reverted",
                transaction_id
            )));
        }

        let block_number = receipt
            .block_number
            .map(|number| number.as_u64())
            .unwrap_or_default();

        tracing::info!("✓ {} confirmed in block {}", transaction_id, block_number);

        Ok(ConfirmedTransaction {
            transaction_id: *transaction_id,
            block_number,
            gas_used: receipt.gas_used,
        })
    }

    async fn fetch_market_items(&self) -> Result<Vec<MarketItem>, ContractError> {
        self.fetch_items("fetchMarketItems").await
    }

    async fn fetch_my_nfts(&self) -> Result<Vec<MarketItem>, ContractError> {
        self.fetch_items("fetchMyNFTs").await
    }

    async fn fetch_items_listed(&self) -> Result<Vec<MarketItem>, ContractError> {
        self.fetch_items("fetchItemsListed").await
    }

    async fn token_uri(&self, token_id: U256) -> Result<String, ContractError> {
        self.method::<_, String>("tokenURI", token_id)?
            .call()
            .await
            .map_err(call_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::abi::{Token, encode};
    use ethers::providers::{Http, Provider};
    use ethers::types::Bytes;
    use serde_json::{Value, json};
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MARKET: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
    const DEV_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    fn provider_for(server: &MockServer) -> Arc<Provider<Http>> {
        Arc::new(Provider::<Http>::try_from(server.uri()).unwrap())
    }

    fn read_only_handle(server: &MockServer) -> EvmMarketplace<Provider<Http>> {
        EvmMarketplace::read_only(MARKET.parse().unwrap(), provider_for(server)).unwrap()
    }

    fn signer_handle(server: &MockServer) -> EvmMarketplace<Provider<Http>> {
        let sender: Address = DEV_ADDRESS.parse().unwrap();
        let provider = Provider::<Http>::try_from(server.uri())
            .unwrap()
            .with_sender(sender);
        EvmMarketplace::signer(MARKET.parse().unwrap(), Arc::new(provider), sender, 1).unwrap()
    }

    /// Answer every `eth_call` with `tokens` ABI-encoded.
    async fn mount_call_result(server: &MockServer, tokens: &[Token]) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": "eth_call" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": Bytes::from(encode(tokens)),
            })))
            .mount(server)
            .await;
    }

    fn item_token(token_id: u64, seller: Address, owner: Address, price: u64) -> Token {
        Token::Tuple(vec![
            Token::Uint(U256::from(token_id)),
            Token::Address(seller),
            Token::Address(owner),
            Token::Uint(U256::from(price)),
            Token::Bool(false),
        ])
    }

    /// Transaction object of the first `eth_call` the server received.
    async fn first_call_params(server: &MockServer) -> Value {
        let requests = server.received_requests().await.unwrap();
        requests
            .iter()
            .map(|request| serde_json::from_slice::<Value>(&request.body).unwrap())
            .find(|body| body["method"] == "eth_call")
            .map(|body| body["params"][0].clone())
            .unwrap()
    }

    #[test]
    fn test_abi_declares_every_call() {
        let abi = marketplace_abi().unwrap();
        for name in [
            "getListingPrice",
            "createToken",
            "reSellToken",
            "fetchMarketItems",
            "fetchMyNFTs",
            "fetchItemsListed",
            "tokenURI",
        ] {
            assert!(abi.function(name).is_ok(), "missing {name}");
        }
    }

    #[test]
    fn test_item_queries_return_one_tuple_array() {
        let abi = marketplace_abi().unwrap();
        for name in ["fetchMarketItems", "fetchMyNFTs", "fetchItemsListed"] {
            let outputs = &abi.function(name).unwrap().outputs;
            assert_eq!(outputs.len(), 1, "{name}");
            assert_eq!(
                outputs[0].kind.to_string(),
                "(uint256,address,address,uint256,bool)[]",
                "{name}"
            );
        }
    }

    #[test]
    fn test_raw_item_conversion() {
        let seller = Address::repeat_byte(1);
        let owner = Address::repeat_byte(2);
        let item = into_market_item((U256::from(7u64), seller, owner, U256::from(100u64), false));

        assert_eq!(item.token_id, U256::from(7u64));
        assert_eq!(item.seller, seller);
        assert_eq!(item.owner, owner);
        assert_eq!(item.price, U256::from(100u64));
        assert!(!item.sold);
    }

    #[tokio::test]
    async fn test_fetch_market_items_decodes_contract_response() {
        let server = MockServer::start().await;
        let seller = Address::repeat_byte(1);
        let market: Address = MARKET.parse().unwrap();
        mount_call_result(
            &server,
            &[Token::Array(vec![
                item_token(1, seller, market, 500),
                item_token(2, seller, market, 700),
            ])],
        )
        .await;

        let items = read_only_handle(&server).fetch_market_items().await.unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].token_id, U256::from(1u64));
        assert_eq!(items[0].seller, seller);
        assert_eq!(items[0].owner, market);
        assert_eq!(items[1].price, U256::from(700u64));
        assert!(!items[1].sold);
    }

    #[tokio::test]
    async fn test_fetch_market_items_empty() {
        let server = MockServer::start().await;
        mount_call_result(&server, &[Token::Array(Vec::new())]).await;

        let items = read_only_handle(&server).fetch_market_items().await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_listing_price_and_token_uri() {
        let server = MockServer::start().await;
        mount_call_result(&server, &[Token::Uint(U256::from(25u64))]).await;
        let price = read_only_handle(&server).listing_price().await.unwrap();
        assert_eq!(price, U256::from(25u64));

        let server = MockServer::start().await;
        mount_call_result(&server, &[Token::String("ipfs://meta/1".to_string())]).await;
        let uri = read_only_handle(&server).token_uri(U256::one()).await.unwrap();
        assert_eq!(uri, "ipfs://meta/1");
    }

    #[tokio::test]
    async fn test_account_queries_carry_the_sender() {
        let server = MockServer::start().await;
        let sender: Address = DEV_ADDRESS.parse().unwrap();
        mount_call_result(
            &server,
            &[Token::Array(vec![item_token(3, Address::repeat_byte(9), sender, 1)])],
        )
        .await;

        let handle = signer_handle(&server);
        assert_eq!(handle.sender(), Some(sender));

        let items = handle.fetch_my_nfts().await.unwrap();
        assert_eq!(items[0].owner, sender);

        let params = first_call_params(&server).await;
        let from: Address = params["from"].as_str().unwrap().parse().unwrap();
        assert_eq!(from, sender);
    }

    #[tokio::test]
    async fn test_read_only_queries_have_no_sender() {
        let server = MockServer::start().await;
        mount_call_result(&server, &[Token::Array(Vec::new())]).await;

        read_only_handle(&server).fetch_market_items().await.unwrap();

        let params = first_call_params(&server).await;
        assert!(params.get("from").is_none_or(Value::is_null));
    }

    #[tokio::test]
    async fn test_call_revert_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": 3, "message": "execution reverted" }
            })))
            .mount(&server)
            .await;

        let err = read_only_handle(&server).token_uri(U256::one()).await.unwrap_err();
        assert!(matches!(err, ContractError::Call(_)));
    }

    #[tokio::test]
    async fn test_read_only_handle_refuses_writes() {
        let server = MockServer::start().await;
        let contract = read_only_handle(&server);
        assert_eq!(contract.address(), MARKET.parse::<Address>().unwrap());
        assert_eq!(contract.sender(), None);

        let err = contract
            .create_token("ipfs://x", U256::one(), U256::one())
            .await
            .unwrap_err();
        assert!(matches!(err, ContractError::ReadOnly));

        let err = contract
            .resell_token(U256::one(), U256::one(), U256::one())
            .await
            .unwrap_err();
        assert!(matches!(err, ContractError::ReadOnly));
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
