//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use keyvault_webapp::config::AppConfig;
use keyvault_webapp::http::HttpServer;
use keyvault_webapp::lifecycle::Shutdown;
use keyvault_webapp::secrets::{AccessToken, ResolvedSecret, SecretResult, TokenCredential};
use tokio::net::TcpListener;

/// Credential that always hands out the same token.
pub struct StaticCredential(pub &'static str);

#[async_trait]
impl TokenCredential for StaticCredential {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn get_token(&self, _scope: &str) -> SecretResult<AccessToken> {
        Ok(AccessToken::new(self.0))
    }
}

/// Serve `secret` on an ephemeral port. Trigger the returned handle to stop.
pub async fn start_app(secret: ResolvedSecret) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(&AppConfig::default(), secret);

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// Client that never goes through a proxy and never reuses connections.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

/// GET `path` and return status and body.
pub async fn get(addr: SocketAddr, path: &str) -> (u16, String) {
    let response = http_client()
        .get(format!("http://{addr}{path}"))
        .send()
        .await
        .expect("app unreachable");
    let status = response.status().as_u16();
    (status, response.text().await.unwrap())
}
