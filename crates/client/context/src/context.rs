//! Marketplace context: the single place UI code goes through for wallet,
//! storage and contract work.
//!
//! Every operation returns a typed [`ContextError`] and also logs it at `warn`
//! before returning.

use std::sync::Arc;

use futures::future::try_join_all;
use tokio::sync::{RwLock, broadcast};

use client_blockchain_core::{
    Address, ConfirmedTransaction, ContentStore, ContractConnector, ListedItem, ListingInput,
    MarketItem, MarketplaceContract, MetadataFetcher, NftMetadata, NftQuery, SaleKind, U256,
    WalletError, WalletProvider, display_address, format_price, parse_price,
};

use crate::builder::MarketplaceContextBuilder;
use crate::config::{ContextConfig, TITLE_DATA};
use crate::error::{ContextError, Result};
use crate::events::ContextEvent;

/// Shared marketplace state and operations.
///
/// Cloning is cheap and clones share the session account and the
/// notification channel.
#[derive(Clone)]
pub struct MarketplaceContext {
    wallet: Arc<dyn WalletProvider>,
    storage: Arc<dyn ContentStore>,
    metadata: Arc<dyn MetadataFetcher>,
    contracts: Arc<dyn ContractConnector>,
    session: Arc<RwLock<Option<Address>>>,
    events: broadcast::Sender<ContextEvent>,
}

impl MarketplaceContext {
    pub fn builder() -> MarketplaceContextBuilder {
        MarketplaceContextBuilder::new()
    }

    pub(crate) fn new(
        wallet: Arc<dyn WalletProvider>,
        storage: Arc<dyn ContentStore>,
        metadata: Arc<dyn MetadataFetcher>,
        contracts: Arc<dyn ContractConnector>,
        config: ContextConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));

        Self {
            wallet,
            storage,
            metadata,
            contracts,
            session: Arc::new(RwLock::new(None)),
            events,
        }
    }

    /// Fixed marketplace tagline.
    pub fn title_data(&self) -> &'static str {
        TITLE_DATA
    }

    /// Subscribe to session and transaction notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ContextEvent> {
        self.events.subscribe()
    }

    /// Session account in checksummed form, if any.
    pub async fn current_account(&self) -> Option<String> {
        self.current_address().await.map(|a| display_address(&a))
    }

    pub async fn current_address(&self) -> Option<Address> {
        *self.session.read().await
    }

    // ------------------------------------------------------------------------
    // Session
    // ------------------------------------------------------------------------

    /// Look up an already authorized account without prompting the user.
    ///
    /// Returns `Ok(None)` when the wallet exposes no account yet; the session
    /// is left untouched in that case.
    pub async fn check_if_wallet_connected(&self) -> Result<Option<String>> {
        self.try_check_wallet()
            .await
            .inspect_err(|e| tracing::warn!("Wallet connection check failed: {}", e))
    }

    async fn try_check_wallet(&self) -> Result<Option<String>> {
        if !self.wallet.is_available() {
            return Err(WalletError::NotInstalled.into());
        }

        let accounts = self.wallet.accounts().await?;
        match accounts.first() {
            Some(account) => {
                self.set_session(Some(*account)).await;
                Ok(Some(display_address(account)))
            }
            None => {
                tracing::info!("No authorized wallet account found");
                Ok(None)
            }
        }
    }

    /// Ask the wallet for account access and adopt the first account.
    ///
    /// On failure the previous session account is kept.
    pub async fn connect_wallet(&self) -> Result<String> {
        self.try_connect_wallet()
            .await
            .inspect_err(|e| tracing::warn!("Error while connecting to wallet: {}", e))
    }

    async fn try_connect_wallet(&self) -> Result<String> {
        if !self.wallet.is_available() {
            return Err(WalletError::NotInstalled.into());
        }

        let accounts = self.wallet.request_accounts().await?;
        let account = accounts.first().copied().ok_or(WalletError::NoAccounts)?;
        self.set_session(Some(account)).await;

        let shown = display_address(&account);
        tracing::info!(account = %shown, "Wallet connected");
        Ok(shown)
    }

    /// Forget the session account. The wallet's own authorization is untouched.
    pub async fn disconnect(&self) {
        self.set_session(None).await;
    }

    async fn set_session(&self, account: Option<Address>) {
        let changed = {
            let mut session = self.session.write().await;
            let changed = *session != account;
            *session = account;
            changed
        };

        if changed {
            self.publish(ContextEvent::AccountChanged {
                account: account.as_ref().map(display_address),
            });
        }
    }

    fn publish(&self, event: ContextEvent) {
        if self.events.send(event).is_err() {
            // No subscribers - this is normal, not an error
            tracing::trace!("No subscribers for context event");
        }
    }

    // ------------------------------------------------------------------------
    // Storage
    // ------------------------------------------------------------------------

    /// Add raw content to the storage gateway and return its retrieval URL.
    pub async fn upload_to_ipfs(&self, content: Vec<u8>) -> Result<String> {
        self.try_upload(content)
            .await
            .inspect_err(|e| tracing::warn!("Error uploading to IPFS: {}", e))
    }

    async fn try_upload(&self, content: Vec<u8>) -> Result<String> {
        let size = content.len();
        let added = self.storage.add(content).await?;
        let url = self.storage.retrieval_url(&added.path);

        tracing::debug!(size, path = %added.path, "Content added");
        self.publish(ContextEvent::ContentUploaded { url: url.clone() });
        Ok(url)
    }

    // ------------------------------------------------------------------------
    // Sales
    // ------------------------------------------------------------------------

    /// Publish metadata for a new item and mint it at `input.price`.
    ///
    /// Input is checked before anything leaves the process: blank fields and
    /// unparsable prices fail without touching the gateway or the chain.
    pub async fn create_nft(
        &self,
        input: &ListingInput,
        file_url: &str,
    ) -> Result<ConfirmedTransaction> {
        self.try_create_nft(input, file_url)
            .await
            .inspect_err(|e| match e {
                ContextError::MissingField(field) => tracing::warn!(field, "Data missing"),
                _ => tracing::warn!("Error while creating NFT: {}", e),
            })
    }

    async fn try_create_nft(
        &self,
        input: &ListingInput,
        file_url: &str,
    ) -> Result<ConfirmedTransaction> {
        validate_listing(input, file_url)?;
        parse_price(&input.price)?;

        let metadata = NftMetadata {
            name: input.name.trim().to_string(),
            description: input.description.trim().to_string(),
            image: file_url.trim().to_string(),
        };
        let document = serde_json::to_vec(&metadata).map_err(ContextError::Encode)?;

        let added = self.storage.add(document).await?;
        let token_uri = self.storage.retrieval_url(&added.path);
        tracing::debug!(%token_uri, "Token metadata stored");

        self.try_create_sale(&token_uri, &input.price, SaleKind::Mint)
            .await
    }

    /// Mint or relist a token at `price`, paying the contract's listing fee,
    /// and wait for the transaction to be mined.
    pub async fn create_sale(
        &self,
        token_uri: &str,
        price: &str,
        kind: SaleKind,
    ) -> Result<ConfirmedTransaction> {
        self.try_create_sale(token_uri, price, kind)
            .await
            .inspect_err(|e| tracing::warn!("Error while creating sale: {}", e))
    }

    async fn try_create_sale(
        &self,
        token_uri: &str,
        price: &str,
        kind: SaleKind,
    ) -> Result<ConfirmedTransaction> {
        let price = parse_price(price)?;
        let contract = self.contracts.connect_signer().await?;

        self.submit_sale(contract.as_ref(), token_uri, price, kind)
            .await
    }

    /// Relist an owned token at `price`.
    ///
    /// The token's metadata URI is read from the contract, so only the id and
    /// the new price are needed.
    pub async fn resell_nft(&self, token_id: U256, price: &str) -> Result<ConfirmedTransaction> {
        self.try_resell_nft(token_id, price)
            .await
            .inspect_err(|e| tracing::warn!(%token_id, "Error while reselling NFT: {}", e))
    }

    async fn try_resell_nft(&self, token_id: U256, price: &str) -> Result<ConfirmedTransaction> {
        let price = parse_price(price)?;
        let contract = self.contracts.connect_signer().await?;

        let token_uri = contract.token_uri(token_id).await?;
        tracing::debug!(%token_id, %token_uri, "Token metadata located");

        self.submit_sale(
            contract.as_ref(),
            &token_uri,
            price,
            SaleKind::Resell { token_id },
        )
        .await
    }

    async fn submit_sale(
        &self,
        contract: &dyn MarketplaceContract,
        token_uri: &str,
        price: U256,
        kind: SaleKind,
    ) -> Result<ConfirmedTransaction> {
        let listing_price = contract.listing_price().await?;

        let transaction_id = match kind {
            SaleKind::Mint => {
                contract
                    .create_token(token_uri, price, listing_price)
                    .await?
            }
            SaleKind::Resell { token_id } => {
                contract
                    .resell_token(token_id, price, listing_price)
                    .await?
            }
        };
        tracing::info!(tx = %transaction_id, ?kind, "Sale submitted");

        let transaction = contract.wait_for_confirmation(&transaction_id).await?;
        tracing::info!(
            tx = %transaction_id,
            block = transaction.block_number,
            "Sale confirmed"
        );

        self.publish(ContextEvent::SaleConfirmed {
            kind,
            token_uri: token_uri.to_string(),
            transaction: transaction.clone(),
        });
        Ok(transaction)
    }

    // ------------------------------------------------------------------------
    // Listings
    // ------------------------------------------------------------------------

    /// Unsold items currently listed on the market. Needs no wallet.
    pub async fn fetch_nfts(&self) -> Result<Vec<ListedItem>> {
        self.try_fetch_nfts()
            .await
            .inspect_err(|e| tracing::warn!("Error while fetching NFTs: {}", e))
    }

    async fn try_fetch_nfts(&self) -> Result<Vec<ListedItem>> {
        let contract = self.contracts.read_only()?;
        let items = contract.fetch_market_items().await?;
        assemble_items(contract.as_ref(), self.metadata.as_ref(), items).await
    }

    /// Items owned or listed by the connected account.
    pub async fn fetch_my_nfts_or_listed_nfts(&self, query: NftQuery) -> Result<Vec<ListedItem>> {
        self.try_fetch_account_items(query)
            .await
            .inspect_err(|e| tracing::warn!("Error while fetching {:?} NFTs: {}", query, e))
    }

    async fn try_fetch_account_items(&self, query: NftQuery) -> Result<Vec<ListedItem>> {
        let contract = self.contracts.connect_signer().await?;
        let items = match query {
            NftQuery::Owned => contract.fetch_my_nfts().await?,
            NftQuery::Listed => contract.fetch_items_listed().await?,
        };
        assemble_items(contract.as_ref(), self.metadata.as_ref(), items).await
    }
}

fn validate_listing(input: &ListingInput, file_url: &str) -> Result<()> {
    let fields = [
        ("name", input.name.as_str()),
        ("description", input.description.as_str()),
        ("price", input.price.as_str()),
        ("file_url", file_url),
    ];

    match fields.iter().find(|(_, value)| value.trim().is_empty()) {
        Some((field, _)) => Err(ContextError::MissingField(*field)),
        None => Ok(()),
    }
}

/// Join each item with its metadata, preserving contract order.
///
/// Lookups run concurrently; the first failure fails the whole batch.
async fn assemble_items(
    contract: &dyn MarketplaceContract,
    metadata: &dyn MetadataFetcher,
    items: Vec<MarketItem>,
) -> Result<Vec<ListedItem>> {
    try_join_all(
        items
            .into_iter()
            .map(|item| assemble_item(contract, metadata, item)),
    )
    .await
}

async fn assemble_item(
    contract: &dyn MarketplaceContract,
    metadata: &dyn MetadataFetcher,
    item: MarketItem,
) -> Result<ListedItem> {
    let token_uri = contract.token_uri(item.token_id).await?;
    let meta = metadata.fetch(&token_uri).await?;
    let price = format_price(item.price)?;

    Ok(ListedItem {
        price,
        token_id: token_id_to_u64(item.token_id)?,
        seller: display_address(&item.seller),
        owner: display_address(&item.owner),
        image: meta.image,
        name: meta.name,
        description: meta.description,
        token_uri,
    })
}

fn token_id_to_u64(token_id: U256) -> Result<u64> {
    if token_id > U256::from(u64::MAX) {
        return Err(ContextError::TokenIdOverflow(token_id));
    }
    Ok(token_id.as_u64())
}
