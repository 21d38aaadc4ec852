//! In-memory collaborators for testing.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ethers_core::types::{Address, H256, U256};
use sha2::{Digest, Sha256};

use crate::traits::{
    ContentStore, ContractConnector, ContractError, MarketplaceContract, MetadataError,
    MetadataFetcher, StorageError, WalletError, WalletProvider,
};
use crate::types::{AddedContent, ConfirmedTransaction, MarketItem, NftMetadata, TransactionId};

// ============================================================================
// Wallet
// ============================================================================

/// Mock wallet with a fixed set of accounts.
pub struct MockWallet {
    installed: bool,
    accounts: Vec<Address>,
    authorized: AtomicBool,
    reject: bool,
    requests: AtomicUsize,
}

impl MockWallet {
    /// Wallet that has already authorized `accounts`.
    pub fn new(accounts: Vec<Address>) -> Self {
        Self {
            installed: true,
            accounts,
            authorized: AtomicBool::new(true),
            reject: false,
            requests: AtomicUsize::new(0),
        }
    }

    /// Wallet that only exposes `accounts` after a request.
    pub fn unauthorized(accounts: Vec<Address>) -> Self {
        let wallet = Self::new(accounts);
        wallet.authorized.store(false, Ordering::SeqCst);
        wallet
    }

    /// No wallet present.
    pub fn not_installed() -> Self {
        Self {
            installed: false,
            ..Self::new(Vec::new())
        }
    }

    /// Wallet whose user rejects every request.
    pub fn rejecting(accounts: Vec<Address>) -> Self {
        Self {
            reject: true,
            ..Self::unauthorized(accounts)
        }
    }

    /// Number of account requests (prompts) seen.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    fn is_available(&self) -> bool {
        self.installed
    }

    async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        if !self.installed {
            return Err(WalletError::NotInstalled);
        }
        if self.authorized.load(Ordering::SeqCst) {
            Ok(self.accounts.clone())
        } else {
            Ok(Vec::new())
        }
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        if !self.installed {
            return Err(WalletError::NotInstalled);
        }
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.reject {
            return Err(WalletError::Rejected("User rejected the request.".to_string()));
        }
        self.authorized.store(true, Ordering::SeqCst);
        Ok(self.accounts.clone())
    }
}

// ============================================================================
// Content store
// ============================================================================

/// Mock storage gateway that addresses content by its SHA-256 digest.
///
/// It also serves stored JSON back as metadata, so documents written through
/// [`ContentStore::add`] can be read through [`MetadataFetcher::fetch`].
pub struct MockContentStore {
    gateway_url: String,
    entries: Mutex<HashMap<String, Vec<u8>>>,
    fail_uploads: AtomicBool,
    adds: AtomicUsize,
}

impl MockContentStore {
    pub const GATEWAY_URL: &'static str = "https://mock-gateway.test/ipfs";

    pub fn new() -> Self {
        Self {
            gateway_url: Self::GATEWAY_URL.to_string(),
            entries: Mutex::new(HashMap::new()),
            fail_uploads: AtomicBool::new(false),
            adds: AtomicUsize::new(0),
        }
    }

    /// Make every following upload fail with a gateway error.
    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Number of add calls seen, including failed ones.
    pub fn add_count(&self) -> usize {
        self.adds.load(Ordering::SeqCst)
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.entries.lock().unwrap().get(path).cloned()
    }

    /// Store a document directly, bypassing the add counter. Returns its URL.
    pub fn insert(&self, content: Vec<u8>) -> String {
        let path = content_path(&content);
        self.entries.lock().unwrap().insert(path.clone(), content);
        self.retrieval_url(&path)
    }

    /// Drop stored content so later fetches of it fail.
    pub fn remove(&self, path: &str) {
        self.entries.lock().unwrap().remove(path);
    }
}

impl Default for MockContentStore {
    fn default() -> Self {
        Self::new()
    }
}

fn content_path(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}

#[async_trait]
impl ContentStore for MockContentStore {
    async fn add(&self, content: Vec<u8>) -> Result<AddedContent, StorageError> {
        self.adds.fetch_add(1, Ordering::SeqCst);
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::Gateway {
                status: 500,
                body: "mock gateway failure".to_string(),
            });
        }

        let path = content_path(&content);
        let size = content.len() as u64;
        self.entries.lock().unwrap().insert(path.clone(), content);

        Ok(AddedContent { path, size })
    }

    fn retrieval_url(&self, path: &str) -> String {
        format!("{}/{}", self.gateway_url, path)
    }
}

#[async_trait]
impl MetadataFetcher for MockContentStore {
    async fn fetch(&self, uri: &str) -> Result<NftMetadata, MetadataError> {
        let path = uri
            .strip_prefix(&self.gateway_url)
            .map(|rest| rest.trim_start_matches('/'))
            .unwrap_or(uri);

        let content = self.get(path).ok_or_else(|| MetadataError::Status {
            uri: uri.to_string(),
            status: 404,
        })?;

        serde_json::from_slice(&content).map_err(|e| MetadataError::Decode {
            uri: uri.to_string(),
            reason: e.to_string(),
        })
    }
}

// ============================================================================
// Marketplace contract
// ============================================================================

enum PendingWrite {
    Mint {
        sender: Address,
        token_uri: String,
        price: U256,
    },
    Resell {
        sender: Address,
        token_id: U256,
        price: U256,
    },
}

struct ChainState {
    listing_price: U256,
    next_token_id: u64,
    next_tx: u64,
    block_number: u64,
    items: BTreeMap<U256, MarketItem>,
    token_uris: HashMap<U256, String>,
    pending: HashMap<TransactionId, PendingWrite>,
    submissions: usize,
    confirmations: usize,
    revert_next: Option<String>,
    broken_token_uris: Vec<U256>,
}

/// In-memory marketplace contract.
///
/// Writes are validated on submission and applied on confirmation, so state
/// changes are only visible after [`MarketplaceContract::wait_for_confirmation`].
#[derive(Clone)]
pub struct MockChain {
    state: Arc<Mutex<ChainState>>,
}

impl MockChain {
    /// Address the contract holds listed items under.
    pub fn market_address() -> Address {
        Address::repeat_byte(0xaa)
    }

    pub fn new(listing_price: U256) -> Self {
        Self {
            state: Arc::new(Mutex::new(ChainState {
                listing_price,
                next_token_id: 1,
                next_tx: 1,
                block_number: 100,
                items: BTreeMap::new(),
                token_uris: HashMap::new(),
                pending: HashMap::new(),
                submissions: 0,
                confirmations: 0,
                revert_next: None,
                broken_token_uris: Vec::new(),
            })),
        }
    }

    pub fn listing_price(&self) -> U256 {
        self.state.lock().unwrap().listing_price
    }

    /// Mint and list an item directly, as if confirmed on-chain.
    pub fn seed_item(&self, seller: Address, token_uri: &str, price: U256) -> U256 {
        let mut state = self.state.lock().unwrap();
        mint(&mut state, seller, token_uri.to_string(), price)
    }

    /// Transfer a listed item to `buyer`.
    pub fn mark_sold(&self, token_id: U256, buyer: Address) {
        let mut state = self.state.lock().unwrap();
        if let Some(item) = state.items.get_mut(&token_id) {
            item.owner = buyer;
            item.sold = true;
        }
    }

    pub fn items(&self) -> Vec<MarketItem> {
        self.state.lock().unwrap().items.values().cloned().collect()
    }

    /// Make the next confirmed transaction revert with `reason`.
    pub fn revert_next(&self, reason: &str) {
        self.state.lock().unwrap().revert_next = Some(reason.to_string());
    }

    /// Make `token_uri` calls for `token_id` fail.
    pub fn break_token_uri(&self, token_id: U256) {
        self.state.lock().unwrap().broken_token_uris.push(token_id);
    }

    /// Transactions accepted so far.
    pub fn submissions(&self) -> usize {
        self.state.lock().unwrap().submissions
    }

    /// Transactions confirmed so far.
    pub fn confirmations(&self) -> usize {
        self.state.lock().unwrap().confirmations
    }

    fn submit(&self, write: PendingWrite) -> TransactionId {
        let mut state = self.state.lock().unwrap();
        let tx_id = TransactionId(H256::from_low_u64_be(state.next_tx));
        state.next_tx += 1;
        state.submissions += 1;
        state.pending.insert(tx_id, write);
        tx_id
    }
}

fn mint(state: &mut ChainState, seller: Address, token_uri: String, price: U256) -> U256 {
    let token_id = U256::from(state.next_token_id);
    state.next_token_id += 1;
    state.token_uris.insert(token_id, token_uri);
    state.items.insert(
        token_id,
        MarketItem {
            token_id,
            seller,
            owner: MockChain::market_address(),
            price,
            sold: false,
        },
    );
    token_id
}

/// Contract handle over a [`MockChain`], optionally bound to a sender.
pub struct MockMarketplace {
    chain: MockChain,
    sender: Option<Address>,
}

impl MockMarketplace {
    fn sender(&self) -> Result<Address, ContractError> {
        self.sender.ok_or(ContractError::ReadOnly)
    }
}

#[async_trait]
impl MarketplaceContract for MockMarketplace {
    async fn listing_price(&self) -> Result<U256, ContractError> {
        Ok(self.chain.listing_price())
    }

    async fn create_token(
        &self,
        token_uri: &str,
        price: U256,
        value: U256,
    ) -> Result<TransactionId, ContractError> {
        let sender = self.sender()?;
        if value != self.chain.listing_price() {
            return Err(ContractError::Call(
                "Price must be equal to listing price".to_string(),
            ));
        }
        if price.is_zero() {
            return Err(ContractError::Call("Price must be at least 1 wei".to_string()));
        }

        Ok(self.chain.submit(PendingWrite::Mint {
            sender,
            token_uri: token_uri.to_string(),
            price,
        }))
    }

    async fn resell_token(
        &self,
        token_id: U256,
        price: U256,
        value: U256,
    ) -> Result<TransactionId, ContractError> {
        let sender = self.sender()?;
        {
            let state = self.chain.state.lock().unwrap();
            let owner = state.items.get(&token_id).map(|item| item.owner);
            if owner != Some(sender) {
                return Err(ContractError::Call(
                    "Only item owner can perform this operation".to_string(),
                ));
            }
            if value != state.listing_price {
                return Err(ContractError::Call(
                    "Price must be equal to listing price".to_string(),
                ));
            }
        }

        Ok(self.chain.submit(PendingWrite::Resell {
            sender,
            token_id,
            price,
        }))
    }

    async fn wait_for_confirmation(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<ConfirmedTransaction, ContractError> {
        let mut state = self.chain.state.lock().unwrap();
        let write = state.pending.remove(transaction_id).ok_or_else(|| {
            ContractError::Network(format!("unknown transaction {transaction_id}"))
        })?;

        state.block_number += 1;
        if let Some(reason) = state.revert_next.take() {
            return Err(ContractError::TransactionFailed(format!(
                "{transaction_id} reverted: {reason}"
            )));
        }

        match write {
            PendingWrite::Mint {
                sender,
                token_uri,
                price,
            } => {
                mint(&mut state, sender, token_uri, price);
            }
            PendingWrite::Resell {
                sender,
                token_id,
                price,
            } => {
                if let Some(item) = state.items.get_mut(&token_id) {
                    item.seller = sender;
                    item.owner = MockChain::market_address();
                    item.price = price;
                    item.sold = false;
                }
            }
        }
        state.confirmations += 1;

        Ok(ConfirmedTransaction {
            transaction_id: *transaction_id,
            block_number: state.block_number,
            gas_used: Some(U256::from(21_000u64)),
        })
    }

    async fn fetch_market_items(&self) -> Result<Vec<MarketItem>, ContractError> {
        let market = MockChain::market_address();
        Ok(self
            .chain
            .items()
            .into_iter()
            .filter(|item| item.owner == market)
            .collect())
    }

    async fn fetch_my_nfts(&self) -> Result<Vec<MarketItem>, ContractError> {
        let caller = self.sender.unwrap_or_default();
        Ok(self
            .chain
            .items()
            .into_iter()
            .filter(|item| item.owner == caller)
            .collect())
    }

    async fn fetch_items_listed(&self) -> Result<Vec<MarketItem>, ContractError> {
        let caller = self.sender.unwrap_or_default();
        Ok(self
            .chain
            .items()
            .into_iter()
            .filter(|item| item.seller == caller)
            .collect())
    }

    async fn token_uri(&self, token_id: U256) -> Result<String, ContractError> {
        let state = self.chain.state.lock().unwrap();
        if state.broken_token_uris.contains(&token_id) {
            return Err(ContractError::Call(format!("tokenURI({token_id}) failed")));
        }
        state
            .token_uris
            .get(&token_id)
            .cloned()
            .ok_or_else(|| ContractError::Call("URI query for nonexistent token".to_string()))
    }
}

/// Connector handing out [`MockMarketplace`] handles.
pub struct MockContractConnector {
    chain: MockChain,
    wallet: Arc<dyn WalletProvider>,
    signer_connections: AtomicUsize,
}

impl MockContractConnector {
    pub fn new(chain: MockChain, wallet: Arc<dyn WalletProvider>) -> Self {
        Self {
            chain,
            wallet,
            signer_connections: AtomicUsize::new(0),
        }
    }

    /// Number of signer-bound handles handed out.
    pub fn signer_connections(&self) -> usize {
        self.signer_connections.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContractConnector for MockContractConnector {
    async fn connect_signer(&self) -> Result<Arc<dyn MarketplaceContract>, ContractError> {
        self.signer_connections.fetch_add(1, Ordering::SeqCst);
        let accounts = self.wallet.request_accounts().await?;
        let sender = accounts.first().copied().ok_or(WalletError::NoAccounts)?;

        Ok(Arc::new(MockMarketplace {
            chain: self.chain.clone(),
            sender: Some(sender),
        }))
    }

    fn read_only(&self) -> Result<Arc<dyn MarketplaceContract>, ContractError> {
        Ok(Arc::new(MockMarketplace {
            chain: self.chain.clone(),
            sender: None,
        }))
    }
}
