//! IPFS HTTP client implementation.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use client_blockchain_core::{AddedContent, ContentStore, StorageError};

use super::types::AddResponse;
use crate::config::IpfsConfig;

/// IPFS storage client using the HTTP API.
///
/// Uploads go to the API endpoint; retrieval URLs point at the gateway.
pub struct IpfsClient {
    config: IpfsConfig,

    /// HTTP client
    http_client: reqwest::Client,
}

impl IpfsClient {
    pub fn new(config: IpfsConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    /// Create a client from `IPFS_*` environment variables.
    pub fn from_env() -> Self {
        Self::new(IpfsConfig::from_env())
    }

    pub fn config(&self) -> &IpfsConfig {
        &self.config
    }

    /// Upload `data` and return the raw API response.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Network request fails
    /// - The API returns a non-success status
    /// - Response parsing fails
    pub async fn add_bytes(&self, data: Vec<u8>) -> Result<AddResponse, StorageError> {
        let url = format!("{}/add", self.config.api_url);
        let size = data.len();

        tracing::debug!("Uploading {} bytes to IPFS", size);

        let form = Form::new().part("file", Part::bytes(data).file_name("file"));
        let mut request = self.http_client.post(&url).multipart(form);
        if let Some(ref project_id) = self.config.project_id {
            request = request.basic_auth(project_id, self.config.project_secret.as_ref());
        }

        let response = request
            .send()
            .await
            .map_err(|e| StorageError::Network(format!("IPFS upload request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(StorageError::Gateway {
                status: status.as_u16(),
                body,
            });
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| StorageError::Network(format!("Failed to read IPFS response: {}", e)))?;

        let added: AddResponse = serde_json::from_str(&response_text).map_err(|e| {
            StorageError::InvalidResponse(format!(
                "{}. Raw response: {}",
                e, response_text
            ))
        })?;

        tracing::info!("✓ Content added to IPFS: {} ({} bytes)", added.hash, size);
        Ok(added)
    }

    /// Rewrite an `ipfs://` URI onto the configured gateway.
    ///
    /// Other URIs are returned unchanged.
    pub fn resolve_uri(&self, uri: &str) -> String {
        resolve_with_gateway(&self.config.gateway_url, uri)
    }
}

pub(crate) fn resolve_with_gateway(gateway_url: &str, uri: &str) -> String {
    match uri.strip_prefix("ipfs://") {
        Some(rest) => {
            let path = rest.strip_prefix("ipfs/").unwrap_or(rest);
            format!("{}/{}", gateway_url, path)
        }
        None => uri.to_string(),
    }
}

#[async_trait]
impl ContentStore for IpfsClient {
    async fn add(&self, content: Vec<u8>) -> Result<AddedContent, StorageError> {
        let added = self.add_bytes(content).await?;
        Ok(AddedContent {
            path: added.hash,
            size: added.size,
        })
    }

    fn retrieval_url(&self, path: &str) -> String {
        format!("{}/{}", self.config.gateway_url, path.trim_start_matches('/'))
    }
}

impl Default for IpfsClient {
    fn default() -> Self {
        Self::new(IpfsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> IpfsClient {
        IpfsClient::new(IpfsConfig::new(
            format!("{}/api/v0", server.uri()),
            "https://gateway.test/ipfs",
        ))
    }

    #[test]
    fn test_retrieval_url_interpolates_path() {
        let client = IpfsClient::default();
        assert_eq!(
            client.retrieval_url("QmHash"),
            "https://ipfs.infura.io/ipfs/QmHash"
        );
        assert!(!client.retrieval_url("QmHash").contains("${"));
    }

    #[test]
    fn test_resolve_uri() {
        let client = IpfsClient::default();
        assert_eq!(
            client.resolve_uri("ipfs://QmHash"),
            "https://ipfs.infura.io/ipfs/QmHash"
        );
        assert_eq!(
            client.resolve_uri("ipfs://ipfs/QmHash/meta.json"),
            "https://ipfs.infura.io/ipfs/QmHash/meta.json"
        );
        assert_eq!(client.resolve_uri("https://x/y"), "https://x/y");
    }

    #[tokio::test]
    async fn test_add_returns_hash_as_path() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v0/add"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"Name":"file","Hash":"QmUploaded","Size":"5"}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let added = client.add(b"hello".to_vec()).await.unwrap();

        assert_eq!(added.path, "QmUploaded");
        assert_eq!(added.size, 5);
        assert_eq!(
            client.retrieval_url(&added.path),
            "https://gateway.test/ipfs/QmUploaded"
        );
    }

    #[tokio::test]
    async fn test_credentials_are_sent_as_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v0/add"))
            .and(header_exists("authorization"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"Hash":"QmAuth","Size":"1"}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let config = IpfsConfig::new(format!("{}/api/v0", server.uri()), "https://g/ipfs")
            .with_credentials("project", "secret");
        let added = IpfsClient::new(config).add(vec![1]).await.unwrap();
        assert_eq!(added.path, "QmAuth");
    }

    #[tokio::test]
    async fn test_gateway_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("project id required"))
            .mount(&server)
            .await;

        let err = client_for(&server).add(b"x".to_vec()).await.unwrap_err();
        match err {
            StorageError::Gateway { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "project id required");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_response_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client_for(&server).add(b"x".to_vec()).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_a_network_error() {
        let client = IpfsClient::new(IpfsConfig::new(
            "http://127.0.0.1:9/api/v0",
            "http://127.0.0.1:9/ipfs",
        ));
        let err = client.add(b"x".to_vec()).await.unwrap_err();
        assert!(matches!(err, StorageError::Network(_)));
    }
}
