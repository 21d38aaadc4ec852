//! IPFS gateway configuration.

use std::env;
use std::fmt;

pub const DEFAULT_API_URL: &str = "https://ipfs.infura.io:5001/api/v0";
pub const DEFAULT_GATEWAY_URL: &str = "https://ipfs.infura.io/ipfs";

/// Endpoints and credentials for the IPFS HTTP API.
#[derive(Clone)]
pub struct IpfsConfig {
    /// Base URL of the HTTP API (`/add` is appended)
    pub api_url: String,

    /// Base URL that retrieval paths are appended to
    pub gateway_url: String,

    /// Project id for basic auth (Infura-style gateways)
    pub project_id: Option<String>,

    /// Project secret for basic auth
    pub project_secret: Option<String>,
}

impl IpfsConfig {
    pub fn new(api_url: impl Into<String>, gateway_url: impl Into<String>) -> Self {
        Self {
            api_url: trim_slash(api_url.into()),
            gateway_url: trim_slash(gateway_url.into()),
            project_id: None,
            project_secret: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `IPFS_API_URL` - HTTP API base URL (default: Infura)
    /// - `IPFS_GATEWAY_URL` - Retrieval gateway base URL (default: Infura)
    /// - `IPFS_PROJECT_ID` - Basic auth user
    /// - `IPFS_PROJECT_SECRET` - Basic auth password
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = env::var("IPFS_API_URL") {
            config.api_url = trim_slash(url);
        }
        if let Ok(url) = env::var("IPFS_GATEWAY_URL") {
            config.gateway_url = trim_slash(url);
        }
        config.project_id = env::var("IPFS_PROJECT_ID").ok();
        config.project_secret = env::var("IPFS_PROJECT_SECRET").ok();

        config
    }

    pub fn with_credentials(
        mut self,
        project_id: impl Into<String>,
        project_secret: impl Into<String>,
    ) -> Self {
        self.project_id = Some(project_id.into());
        self.project_secret = Some(project_secret.into());
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, url) in [("API", &self.api_url), ("gateway", &self.gateway_url)] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(format!("Invalid IPFS {} URL format: {}", name, url));
            }
        }

        if self.project_secret.is_some() && self.project_id.is_none() {
            return Err("IPFS_PROJECT_SECRET is set without IPFS_PROJECT_ID".to_string());
        }

        Ok(())
    }
}

fn trim_slash(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

impl Default for IpfsConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL, DEFAULT_GATEWAY_URL)
    }
}

impl fmt::Debug for IpfsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IpfsConfig")
            .field("api_url", &self.api_url)
            .field("gateway_url", &self.gateway_url)
            .field("project_id", &self.project_id)
            .field("project_secret", &self.project_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoints() {
        let config = IpfsConfig::default();
        assert_eq!(config.api_url, "https://ipfs.infura.io:5001/api/v0");
        assert_eq!(config.gateway_url, "https://ipfs.infura.io/ipfs");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_trailing_slashes_are_dropped() {
        let config =
            IpfsConfig::new("http://localhost:5001/api/v0/", "http://localhost:8080/ipfs/");
        assert_eq!(config.api_url, "http://localhost:5001/api/v0");
        assert_eq!(config.gateway_url, "http://localhost:8080/ipfs");
    }

    #[test]
    fn test_validate() {
        assert!(IpfsConfig::new("ftp://x", DEFAULT_GATEWAY_URL).validate().is_err());

        let mut secret_only = IpfsConfig::default();
        secret_only.project_secret = Some("s".to_string());
        assert!(secret_only.validate().is_err());

        let debug = format!("{:?}", IpfsConfig::default().with_credentials("id", "hunter2"));
        assert!(!debug.contains("hunter2"));
    }
}
