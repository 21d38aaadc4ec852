//! Token metadata retrieval over HTTP.

use async_trait::async_trait;

use client_blockchain_core::{MetadataError, MetadataFetcher, NftMetadata};

use crate::config::IpfsConfig;
use crate::ipfs::client::resolve_with_gateway;

/// Fetches metadata documents with plain GET requests.
///
/// `ipfs://` URIs are rewritten onto the configured gateway first.
pub struct HttpMetadataFetcher {
    gateway_url: String,
    http_client: reqwest::Client,
}

impl HttpMetadataFetcher {
    pub fn new(config: &IpfsConfig) -> Self {
        Self {
            gateway_url: config.gateway_url.clone(),
            http_client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpMetadataFetcher {
    fn default() -> Self {
        Self::new(&IpfsConfig::default())
    }
}

#[async_trait]
impl MetadataFetcher for HttpMetadataFetcher {
    async fn fetch(&self, uri: &str) -> Result<NftMetadata, MetadataError> {
        let url = resolve_with_gateway(&self.gateway_url, uri);
        tracing::debug!("Fetching metadata from {}", url);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| MetadataError::Network {
                uri: uri.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(MetadataError::Status {
                uri: uri.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| MetadataError::Network {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;

        serde_json::from_slice(&body).map_err(|e| MetadataError::Decode {
            uri: uri.to_string(),
            reason: e.to_string(),
        })
    }
}
