//! Wire types for the KV v2 and token endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `LIST .../metadata/...` response.
#[derive(Debug, Deserialize)]
pub(crate) struct ListResponse {
    pub data: ListData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListData {
    #[serde(default)]
    pub keys: Vec<String>,
}

/// `GET .../data/...` response.
#[derive(Debug, Deserialize)]
pub(crate) struct ReadResponse {
    pub data: ReadData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReadData {
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
    #[serde(default)]
    pub metadata: Option<EntryMetadata>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EntryMetadata {
    #[serde(default)]
    pub version: u64,
}

/// A KV entry as returned by a read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecretEntry {
    /// Entry fields (`username`, `password`, `title`, ...).
    pub data: Map<String, Value>,
    /// Current version, used as the check-and-set value on update.
    pub version: u64,
}

/// Body of a KV v2 write.
#[derive(Debug, Serialize)]
pub(crate) struct WriteRequest<'a> {
    pub data: &'a Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<WriteOptions>,
}

#[derive(Debug, Serialize)]
pub(crate) struct WriteOptions {
    pub cas: u64,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub password: &'a str,
}

/// `auth` block of a login or renew response.
#[derive(Debug, Deserialize)]
pub(crate) struct AuthResponse {
    pub auth: Option<AuthBlock>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthBlock {
    #[serde(default)]
    pub client_token: Option<String>,
    #[serde(default)]
    pub policies: Vec<String>,
    #[serde(default)]
    pub lease_duration: u64,
}

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginAuth {
    pub client_token: String,
    pub policies: Vec<String>,
    pub lease_duration: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LookupResponse {
    pub data: TokenInfo,
}

/// `auth/token/lookup-self` data block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Remaining time-to-live in seconds.
    pub ttl: u64,
    #[serde(default)]
    pub policies: Vec<String>,
    #[serde(default = "renewable_by_default")]
    pub renewable: bool,
    #[serde(default)]
    pub display_name: Option<String>,
}

fn renewable_by_default() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub(crate) struct RenewRequest<'a> {
    pub increment: &'a str,
}

/// Error body returned by the server on failures.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_response_parses_data_and_version() {
        let raw = r#"{"data":{"data":{"username":"alice","password":"pw"},"metadata":{"version":3}}}"#;
        let parsed: ReadResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.data.metadata.unwrap().version, 3);
        assert_eq!(parsed.data.data.unwrap()["username"], "alice");
    }

    #[test]
    fn write_request_omits_options_without_cas() {
        let data = Map::new();
        let body = WriteRequest {
            data: &data,
            options: None,
        };
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"data":{}}"#);
    }

    #[test]
    fn lookup_tolerates_missing_optional_fields() {
        let parsed: LookupResponse = serde_json::from_str(r#"{"data":{"ttl":120}}"#).unwrap();
        assert_eq!(parsed.data.ttl, 120);
        assert!(parsed.data.policies.is_empty());
        assert!(parsed.data.renewable);

        let parsed: LookupResponse =
            serde_json::from_str(r#"{"data":{"ttl":0,"renewable":false}}"#).unwrap();
        assert!(!parsed.data.renewable);
    }
}
