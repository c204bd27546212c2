//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the two public routes
//! - Wire up middleware (tracing, timeout, request ID)
//! - Serve on a bound listener until shutdown is signalled

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::secrets::ResolvedSecret;

/// Body of `GET /`.
pub const GREETING: &str = "Hello World from a .Net core web app!!!";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub secret: Arc<ResolvedSecret>,
}

/// HTTP server for the web app.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// `secret` is the startup resolution result; it is shared read-only
    /// by every request.
    pub fn new(config: &AppConfig, secret: ResolvedSecret) -> Self {
        let state = AppState {
            secret: Arc::new(secret),
        };
        let router = Self::build_router(config, state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        Router::new()
            .route("/", get(hello))
            .route("/keyvault", get(keyvault))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// Router with state and middleware applied, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn hello() -> &'static str {
    GREETING
}

async fn keyvault(State(state): State<AppState>) -> String {
    state.secret.as_str().to_owned()
}
