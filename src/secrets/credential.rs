//! Ambient credential discovery.
//!
//! # Sources
//! - `EnvironmentCredential`: service principal secret from `AZURE_*` vars
//! - `ManagedIdentityCredential`: App Service identity endpoint, else IMDS
//! - `DefaultCredential`: tries each source in order, first token wins
//!
//! Environment lookups go through [`Env`] so tests can supply variables
//! without touching the process environment.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::secrets::error::{SecretError, SecretResult};

/// Token scope for Azure Key Vault data-plane calls.
pub const KEY_VAULT_SCOPE: &str = "https://vault.azure.net/.default";

const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
const DEFAULT_IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
const IMDS_API_VERSION: &str = "2018-02-01";
const APP_SERVICE_API_VERSION: &str = "2019-08-01";

/// Bearer token issued by an identity provider.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
}

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken").field("token", &"<redacted>").finish()
    }
}

/// Something that can produce a bearer token for a scope.
#[async_trait]
pub trait TokenCredential: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Acquire a token for `scope`.
    async fn get_token(&self, scope: &str) -> SecretResult<AccessToken>;
}

/// Read-only view of environment variables.
#[derive(Clone, Default)]
pub struct Env {
    vars: Option<Arc<HashMap<String, String>>>,
}

impl Env {
    /// Reads from the real process environment.
    pub fn process() -> Self {
        Self { vars: None }
    }

    /// Fixed set of variables.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            vars: Some(Arc::new(vars)),
        }
    }

    /// Look up a variable. Empty values count as unset.
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match &self.vars {
            None => std::env::var(key).ok(),
            Some(vars) => vars.get(key).cloned(),
        };
        value.filter(|v| !v.trim().is_empty())
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

async fn read_token(response: reqwest::Response, source: &str) -> SecretResult<AccessToken> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SecretError::Authentication(format!(
            "{source} returned status {status}: {body}"
        )));
    }

    let body: TokenResponse = response
        .json()
        .await
        .map_err(|e| SecretError::InvalidResponse(format!("{source} token response: {e}")))?;
    Ok(AccessToken::new(body.access_token))
}

/// Resource identifier for the v1 token endpoints (scope minus `/.default`).
fn scope_to_resource(scope: &str) -> &str {
    scope.strip_suffix("/.default").unwrap_or(scope)
}

/// Service principal with a client secret.
pub struct EnvironmentCredential {
    http: reqwest::Client,
    authority_host: String,
    tenant_id: String,
    client_id: String,
    client_secret: String,
}

impl EnvironmentCredential {
    /// Returns `None` unless tenant, client id and secret are all set.
    pub fn from_env(env: &Env, http: reqwest::Client) -> Option<Self> {
        let tenant_id = env.get("AZURE_TENANT_ID")?;
        let client_id = env.get("AZURE_CLIENT_ID")?;
        let client_secret = env.get("AZURE_CLIENT_SECRET")?;
        let authority_host = env
            .get("AZURE_AUTHORITY_HOST")
            .unwrap_or_else(|| DEFAULT_AUTHORITY_HOST.to_string());

        Some(Self {
            http,
            authority_host: authority_host.trim_end_matches('/').to_string(),
            tenant_id,
            client_id,
            client_secret,
        })
    }
}

#[async_trait]
impl TokenCredential for EnvironmentCredential {
    fn name(&self) -> &'static str {
        "environment"
    }

    async fn get_token(&self, scope: &str) -> SecretResult<AccessToken> {
        let url = format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host, self.tenant_id
        );
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", scope),
        ];

        let response = self.http.post(&url).form(&form).send().await?;
        read_token(response, "token endpoint").await
    }
}

enum IdentityEndpoint {
    AppService { endpoint: String, header: String },
    Imds { endpoint: String },
}

/// Managed identity of the hosting Azure resource.
pub struct ManagedIdentityCredential {
    http: reqwest::Client,
    endpoint: IdentityEndpoint,
    client_id: Option<String>,
}

impl ManagedIdentityCredential {
    /// App Service when `IDENTITY_ENDPOINT`/`IDENTITY_HEADER` are set, IMDS otherwise.
    /// `AZURE_CLIENT_ID` selects a user-assigned identity.
    pub fn from_env(env: &Env, http: reqwest::Client) -> Self {
        let endpoint = match (env.get("IDENTITY_ENDPOINT"), env.get("IDENTITY_HEADER")) {
            (Some(endpoint), Some(header)) => IdentityEndpoint::AppService { endpoint, header },
            _ => IdentityEndpoint::Imds {
                endpoint: env
                    .get("IMDS_ENDPOINT")
                    .unwrap_or_else(|| DEFAULT_IMDS_ENDPOINT.to_string()),
            },
        };

        Self {
            http,
            endpoint,
            client_id: env.get("AZURE_CLIENT_ID"),
        }
    }
}

#[async_trait]
impl TokenCredential for ManagedIdentityCredential {
    fn name(&self) -> &'static str {
        match self.endpoint {
            IdentityEndpoint::AppService { .. } => "managed-identity(app-service)",
            IdentityEndpoint::Imds { .. } => "managed-identity(imds)",
        }
    }

    async fn get_token(&self, scope: &str) -> SecretResult<AccessToken> {
        let resource = scope_to_resource(scope);
        let mut query = vec![("resource", resource)];
        if let Some(client_id) = &self.client_id {
            query.push(("client_id", client_id.as_str()));
        }

        let request = match &self.endpoint {
            IdentityEndpoint::AppService { endpoint, header } => {
                query.push(("api-version", APP_SERVICE_API_VERSION));
                self.http
                    .get(endpoint)
                    .query(&query)
                    .header("X-IDENTITY-HEADER", header)
            }
            IdentityEndpoint::Imds { endpoint } => {
                query.push(("api-version", IMDS_API_VERSION));
                self.http.get(endpoint).query(&query).header("Metadata", "true")
            }
        };

        // An unreachable identity endpoint means we are not running on Azure.
        let response = request
            .send()
            .await
            .map_err(|e| SecretError::CredentialUnavailable(format!("{}: {e}", self.name())))?;
        read_token(response, self.name()).await
    }
}

/// Ordered chain of credential sources.
pub struct DefaultCredential {
    sources: Vec<Arc<dyn TokenCredential>>,
}

impl DefaultCredential {
    /// Environment service principal (when configured), then managed identity.
    pub fn from_env(env: &Env, http: reqwest::Client) -> Self {
        let mut sources: Vec<Arc<dyn TokenCredential>> = Vec::new();
        if let Some(credential) = EnvironmentCredential::from_env(env, http.clone()) {
            sources.push(Arc::new(credential));
        }
        sources.push(Arc::new(ManagedIdentityCredential::from_env(env, http)));
        Self { sources }
    }

    pub fn with_sources(sources: Vec<Arc<dyn TokenCredential>>) -> Self {
        Self { sources }
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }
}

#[async_trait]
impl TokenCredential for DefaultCredential {
    fn name(&self) -> &'static str {
        "default"
    }

    async fn get_token(&self, scope: &str) -> SecretResult<AccessToken> {
        let mut failures = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            match source.get_token(scope).await {
                Ok(token) => {
                    tracing::debug!(source = source.name(), "Acquired access token");
                    return Ok(token);
                }
                Err(e) => {
                    tracing::debug!(source = source.name(), error = %e, "Credential source failed");
                    failures.push(format!("{}: {}", source.name(), e));
                }
            }
        }

        Err(SecretError::CredentialUnavailable(failures.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Failing;

    #[async_trait]
    impl TokenCredential for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn get_token(&self, _scope: &str) -> SecretResult<AccessToken> {
            Err(SecretError::CredentialUnavailable("not configured".into()))
        }
    }

    struct Fixed(&'static str);

    #[async_trait]
    impl TokenCredential for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn get_token(&self, _scope: &str) -> SecretResult<AccessToken> {
            Ok(AccessToken::new(self.0))
        }
    }

    #[test]
    fn test_env_treats_empty_as_unset() {
        let env = Env::from_pairs([("A", "1"), ("B", "  ")]);
        assert_eq!(env.get("A").as_deref(), Some("1"));
        assert_eq!(env.get("B"), None);
        assert_eq!(env.get("C"), None);
    }

    #[test]
    fn test_access_token_debug_is_redacted() {
        let token = AccessToken::new("super-secret");
        assert!(!format!("{token:?}").contains("super-secret"));
    }

    #[test]
    fn test_scope_to_resource() {
        assert_eq!(scope_to_resource(KEY_VAULT_SCOPE), "https://vault.azure.net");
        assert_eq!(scope_to_resource("https://x"), "https://x");
    }

    #[test]
    fn test_environment_credential_requires_all_vars() {
        let env = Env::from_pairs([("AZURE_TENANT_ID", "t"), ("AZURE_CLIENT_ID", "c")]);
        assert!(EnvironmentCredential::from_env(&env, reqwest::Client::new()).is_none());
    }

    #[test]
    fn test_default_chain_order() {
        let env = Env::from_pairs([
            ("AZURE_TENANT_ID", "t"),
            ("AZURE_CLIENT_ID", "c"),
            ("AZURE_CLIENT_SECRET", "s"),
        ]);
        let chain = DefaultCredential::from_env(&env, reqwest::Client::new());
        assert_eq!(chain.source_names(), vec!["environment", "managed-identity(imds)"]);

        let chain = DefaultCredential::from_env(
            &Env::from_pairs(Vec::<(String, String)>::new()),
            reqwest::Client::new(),
        );
        assert_eq!(chain.source_names(), vec!["managed-identity(imds)"]);
    }

    #[tokio::test]
    async fn test_environment_credential_posts_client_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/v2.0/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=app-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token_type": "Bearer",
                "expires_in": 3599,
                "access_token": "sp-token"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let env = Env::from_pairs([
            ("AZURE_TENANT_ID", "tenant-1".to_string()),
            ("AZURE_CLIENT_ID", "app-1".to_string()),
            ("AZURE_CLIENT_SECRET", "shh".to_string()),
            ("AZURE_AUTHORITY_HOST", server.uri()),
        ]);
        let credential = EnvironmentCredential::from_env(&env, reqwest::Client::new()).unwrap();
        let token = credential.get_token(KEY_VAULT_SCOPE).await.unwrap();
        assert_eq!(token.token, "sp-token");
    }

    #[tokio::test]
    async fn test_environment_credential_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
            .mount(&server)
            .await;

        let env = Env::from_pairs([
            ("AZURE_TENANT_ID", "t".to_string()),
            ("AZURE_CLIENT_ID", "c".to_string()),
            ("AZURE_CLIENT_SECRET", "s".to_string()),
            ("AZURE_AUTHORITY_HOST", server.uri()),
        ]);
        let credential = EnvironmentCredential::from_env(&env, reqwest::Client::new()).unwrap();
        let err = credential.get_token(KEY_VAULT_SCOPE).await.unwrap_err();
        assert!(matches!(err, SecretError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_app_service_identity() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/msi/token"))
            .and(header("X-IDENTITY-HEADER", "secret-header"))
            .and(query_param("api-version", APP_SERVICE_API_VERSION))
            .and(query_param("resource", "https://vault.azure.net"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "app-service-token",
                "expires_on": "1700000000"
            })))
            .mount(&server)
            .await;

        let env = Env::from_pairs([
            ("IDENTITY_ENDPOINT", format!("{}/msi/token", server.uri())),
            ("IDENTITY_HEADER", "secret-header".to_string()),
        ]);
        let credential = ManagedIdentityCredential::from_env(&env, reqwest::Client::new());
        assert_eq!(credential.name(), "managed-identity(app-service)");
        let token = credential.get_token(KEY_VAULT_SCOPE).await.unwrap();
        assert_eq!(token.token, "app-service-token");
    }

    #[tokio::test]
    async fn test_imds_identity_with_client_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/metadata/identity/oauth2/token"))
            .and(header("Metadata", "true"))
            .and(query_param("api-version", IMDS_API_VERSION))
            .and(query_param("client_id", "user-assigned"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "imds-token"
            })))
            .mount(&server)
            .await;

        let env = Env::from_pairs([
            ("IMDS_ENDPOINT", format!("{}/metadata/identity/oauth2/token", server.uri())),
            ("AZURE_CLIENT_ID", "user-assigned".to_string()),
        ]);
        let credential = ManagedIdentityCredential::from_env(&env, reqwest::Client::new());
        let token = credential.get_token(KEY_VAULT_SCOPE).await.unwrap();
        assert_eq!(token.token, "imds-token");
    }

    #[tokio::test]
    async fn test_default_chain_falls_through() {
        let chain = DefaultCredential::with_sources(vec![Arc::new(Failing), Arc::new(Fixed("second"))]);
        let token = chain.get_token(KEY_VAULT_SCOPE).await.unwrap();
        assert_eq!(token.token, "second");
    }

    #[tokio::test]
    async fn test_default_chain_reports_every_failure() {
        let chain = DefaultCredential::with_sources(vec![Arc::new(Failing), Arc::new(Failing)]);
        match chain.get_token(KEY_VAULT_SCOPE).await {
            Err(SecretError::CredentialUnavailable(msg)) => {
                assert_eq!(msg.matches("failing:").count(), 2);
            }
            other => panic!("expected CredentialUnavailable, got {other:?}"),
        }
    }
}
