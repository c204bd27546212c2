//! Key Vault REST client for secret reads.
//!
//! Only `GET {vault}/secrets/{name}` is used. The bearer token is requested
//! on every call, so credential failures surface through the same error path
//! as lookup failures.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::secrets::credential::{TokenCredential, KEY_VAULT_SCOPE};
use crate::secrets::error::{SecretError, SecretResult};

/// Key Vault data-plane API version.
pub const API_VERSION: &str = "7.4";

/// A secret as returned by Key Vault.
#[derive(Clone, Deserialize)]
pub struct KeyVaultSecret {
    pub value: String,
    #[serde(default)]
    pub id: Option<String>,
}

impl fmt::Debug for KeyVaultSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyVaultSecret")
            .field("id", &self.id)
            .field("value", &"<redacted>")
            .finish()
    }
}

/// Read access to named secrets.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get_secret(&self, name: &str) -> SecretResult<KeyVaultSecret>;
}

/// Parse and check a vault endpoint.
///
/// `https` is required; plain `http` is accepted for localhost only.
pub fn parse_vault_uri(raw: &str) -> SecretResult<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SecretError::invalid_uri(raw, "empty"));
    }

    let url = Url::parse(trimmed).map_err(|e| SecretError::invalid_uri(raw, e.to_string()))?;
    let host = url
        .host_str()
        .ok_or_else(|| SecretError::invalid_uri(raw, "missing host"))?;

    match url.scheme() {
        "https" => Ok(url),
        "http" if host == "localhost" || host == "127.0.0.1" => Ok(url),
        "http" => Err(SecretError::invalid_uri(raw, "http is only allowed for localhost")),
        other => Err(SecretError::invalid_uri(raw, format!("unsupported scheme '{other}'"))),
    }
}

/// Authenticated client for one vault.
pub struct KeyVaultClient {
    http: reqwest::Client,
    vault_uri: Url,
    credential: Arc<dyn TokenCredential>,
}

impl KeyVaultClient {
    /// Validates the endpoint; no network traffic happens here.
    pub fn new(
        vault_uri: &str,
        credential: Arc<dyn TokenCredential>,
        http: reqwest::Client,
    ) -> SecretResult<Self> {
        let vault_uri = parse_vault_uri(vault_uri)?;
        Ok(Self {
            http,
            vault_uri,
            credential,
        })
    }

    pub fn vault_uri(&self) -> &Url {
        &self.vault_uri
    }

    fn secret_url(&self, name: &str) -> SecretResult<Url> {
        let mut url = self.vault_uri.clone();
        url.path_segments_mut()
            .map_err(|_| SecretError::invalid_uri(self.vault_uri.as_str(), "cannot be a base"))?
            .pop_if_empty()
            .extend(["secrets", name]);
        url.query_pairs_mut().append_pair("api-version", API_VERSION);
        Ok(url)
    }
}

#[async_trait]
impl SecretStore for KeyVaultClient {
    async fn get_secret(&self, name: &str) -> SecretResult<KeyVaultSecret> {
        let url = self.secret_url(name)?;
        let token = self.credential.get_token(KEY_VAULT_SCOPE).await?;

        tracing::debug!(secret_name = %name, credential = self.credential.name(), "Fetching secret");

        let response = self
            .http
            .get(url)
            .bearer_auth(&token.token)
            .header("Accept", "application/json")
            .send()
            .await?;

        match response.status().as_u16() {
            200 => response
                .json::<KeyVaultSecret>()
                .await
                .map_err(|e| SecretError::InvalidResponse(e.to_string())),
            401 | 403 => Err(SecretError::Unauthorized(response.status().as_u16())),
            404 => Err(SecretError::NotFound(name.to_string())),
            429 => Err(SecretError::Throttled),
            status => Err(SecretError::Service(status)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::credential::AccessToken;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct StaticToken;

    #[async_trait]
    impl TokenCredential for StaticToken {
        fn name(&self) -> &'static str {
            "static"
        }

        async fn get_token(&self, scope: &str) -> SecretResult<AccessToken> {
            assert_eq!(scope, KEY_VAULT_SCOPE);
            Ok(AccessToken::new("test-token"))
        }
    }

    struct NoIdentity;

    #[async_trait]
    impl TokenCredential for NoIdentity {
        fn name(&self) -> &'static str {
            "none"
        }

        async fn get_token(&self, _scope: &str) -> SecretResult<AccessToken> {
            Err(SecretError::CredentialUnavailable("no identity".into()))
        }
    }

    fn client_for(server: &MockServer) -> KeyVaultClient {
        KeyVaultClient::new(&server.uri(), Arc::new(StaticToken), reqwest::Client::new()).unwrap()
    }

    #[test]
    fn test_parse_vault_uri() {
        assert!(parse_vault_uri("https://kv-abs.vault.azure.net/").is_ok());
        assert!(parse_vault_uri("http://localhost:8200").is_ok());
        assert!(parse_vault_uri("http://127.0.0.1:1234/").is_ok());
        assert!(parse_vault_uri("").is_err());
        assert!(parse_vault_uri("   ").is_err());
        assert!(parse_vault_uri("not a uri").is_err());
        assert!(parse_vault_uri("http://kv.vault.azure.net").is_err());
        assert!(parse_vault_uri("ftp://kv.vault.azure.net").is_err());
    }

    #[test]
    fn test_secret_url_building() {
        let client = KeyVaultClient::new(
            "https://kv-abs.vault.azure.net/",
            Arc::new(StaticToken),
            reqwest::Client::new(),
        )
        .unwrap();
        assert_eq!(
            client.secret_url("db-credentials").unwrap().as_str(),
            "https://kv-abs.vault.azure.net/secrets/db-credentials?api-version=7.4"
        );
        // Names are a single, escaped path segment.
        assert_eq!(
            client.secret_url("a/b c").unwrap().as_str(),
            "https://kv-abs.vault.azure.net/secrets/a%2Fb%20c?api-version=7.4"
        );
    }

    #[test]
    fn test_secret_debug_is_redacted() {
        let secret = KeyVaultSecret {
            value: "pw123".into(),
            id: None,
        };
        assert!(!format!("{secret:?}").contains("pw123"));
    }

    #[tokio::test]
    async fn test_get_secret_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/secrets/db-credentials"))
            .and(query_param("api-version", API_VERSION))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": "pw123",
                "id": "https://kv-abs.vault.azure.net/secrets/db-credentials/abc"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let secret = client_for(&server).get_secret("db-credentials").await.unwrap();
        assert_eq!(secret.value, "pw123");
        assert!(secret.id.is_some());
    }

    #[tokio::test]
    async fn test_get_secret_status_mapping() {
        let cases = [
            (401, "unauthorized"),
            (403, "unauthorized"),
            (404, "not-found"),
            (429, "throttled"),
            (503, "service"),
        ];

        for (status, expected) in cases {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(status))
                .mount(&server)
                .await;

            let err = client_for(&server).get_secret("x").await.unwrap_err();
            let kind = match err {
                SecretError::Unauthorized(_) => "unauthorized",
                SecretError::NotFound(_) => "not-found",
                SecretError::Throttled => "throttled",
                SecretError::Service(_) => "service",
                _ => "other",
            };
            assert_eq!(kind, expected, "status {status}");
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).get_secret("x").await.unwrap_err();
        assert!(matches!(err, SecretError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_credential_failure_skips_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client =
            KeyVaultClient::new(&server.uri(), Arc::new(NoIdentity), reqwest::Client::new()).unwrap();
        let err = client.get_secret("x").await.unwrap_err();
        assert!(matches!(err, SecretError::CredentialUnavailable(_)));
    }
}
