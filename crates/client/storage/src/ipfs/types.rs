//! IPFS HTTP API type definitions.

use serde::{Deserialize, Deserializer, Serialize};

/// Response from `POST /api/v0/add`.
///
/// Kubo returns `Size` as a string; some gateways return a number. Both are
/// accepted.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddResponse {
    /// File name as sent in the multipart form
    #[serde(default)]
    pub name: String,

    /// Content identifier, used as the retrieval path
    pub hash: String,

    /// Stored size in bytes
    #[serde(default, deserialize_with = "size_from_string_or_number")]
    pub size: u64,
}

fn size_from_string_or_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Size {
        Text(String),
        Number(u64),
    }

    match Size::deserialize(deserializer)? {
        Size::Number(n) => Ok(n),
        Size::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_kubo_response() {
        let raw = r#"{"Name":"file","Hash":"QmT78zSuBmuS4z925WZfrqQ1qHaJ56DQaTfyMUF7F8ff5o","Size":"19"}"#;
        let response: AddResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.hash, "QmT78zSuBmuS4z925WZfrqQ1qHaJ56DQaTfyMUF7F8ff5o");
        assert_eq!(response.size, 19);
    }

    #[test]
    fn test_parses_numeric_size_and_missing_name() {
        let raw = r#"{"Hash":"bafy","Size":42}"#;
        let response: AddResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.name, "");
        assert_eq!(response.size, 42);
    }
}
