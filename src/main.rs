//! Key Vault demo web app.
//!
//! # Architecture Overview
//!
//! ```text
//!   startup                                        per request
//!   ───────                                        ───────────
//!   config/appsettings.json                        GET /         → greeting
//!       │                                          GET /keyvault → AppState.secret
//!       ▼                                                              ▲
//!   DefaultCredential ─▶ KeyVaultClient ─▶ retry/backoff ─▶ ResolvedSecret
//!   (env / managed identity)  (REST)        (2s..16s, 6 tries)   (value | fallback)
//! ```

use std::path::PathBuf;

use clap::Parser;

use keyvault_webapp::config::{loader, validation};
use keyvault_webapp::http::HttpServer;
use keyvault_webapp::lifecycle::{startup, Shutdown};
use keyvault_webapp::observability::logging;
use keyvault_webapp::secrets::Env;

#[derive(Parser)]
#[command(name = "keyvault-webapp")]
#[command(about = "Serves a greeting and one Azure Key Vault secret", long_about = None)]
struct Cli {
    /// Settings file (.json or .toml). Defaults to config/appsettings.json when present.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override Listener.BindAddress.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = loader::load_or_default(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        validation::validate_config(&config).map_err(loader::ConfigError::Validation)?;
    }

    logging::init_logging(&config.logging);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "keyvault-webapp starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        vault_uri = %config.environment_config.vault_uri,
        secret_name = %config.environment_config.secret_name,
        "Configuration loaded"
    );

    let secret = startup::resolve_secret(&config, &Env::process()).await?;
    let listener = startup::bind(&config).await?;

    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    shutdown.trigger_on_signal();

    HttpServer::new(&config, secret)
        .run(listener, server_shutdown)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
