//! Stockroom Gateway - HTTP API server
//!
//! This is the main entry point for the gateway service. `users` are served
//! from memory or from `RocksDB` depending on `USER_BACKEND`; `products`
//! always live in memory.
//!
//! # Dev Mode
//!
//! Build with `--features dev-mode` to use a mock token verifier instead of
//! the HMAC one. Use tokens in format: `test-token:<user>`

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "dev-mode")]
use stockroom_auth::MockTokenVerifier;
#[cfg(not(feature = "dev-mode"))]
use stockroom_auth::{AuthConfig, HmacVerifier};
use stockroom_auth::TokenVerifier;
use stockroom_control::ResourceController;
use stockroom_core::ResourceKind;
use stockroom_gateway::{create_router, GatewayConfig, GatewayState, UserBackend};
use stockroom_store::{MemoryStore, ResourceStore, RocksStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,stockroom=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Stockroom Gateway");

    let config = GatewayConfig::from_env()?;

    tracing::info!(
        listen_addr = %config.listen_addr,
        user_backend = ?config.user_backend,
        store_path = %config.store_path.display(),
        max_body_bytes = config.max_body_bytes,
        "Gateway configuration loaded"
    );

    // Initialize token verifier
    #[cfg(feature = "dev-mode")]
    let verifier = {
        tracing::warn!("DEV MODE ENABLED - using mock token verifier");
        tracing::warn!("Use tokens in format: test-token:<user>");
        Arc::new(MockTokenVerifier)
    };

    #[cfg(not(feature = "dev-mode"))]
    let verifier = {
        let secret = match std::env::var("JWT_SECRET") {
            Ok(secret) => secret,
            Err(_) if config.user_backend.requires_auth() => {
                return Err("JWT_SECRET must be set for the persistent user backend".into());
            }
            Err(_) => String::new(),
        };
        Arc::new(HmacVerifier::new(AuthConfig::new(secret)))
    };

    let products = ResourceController::new(Arc::new(MemoryStore::new(ResourceKind::Product)));

    match config.user_backend {
        UserBackend::Memory => {
            let users = ResourceController::new(Arc::new(MemoryStore::new(ResourceKind::User)));
            serve(GatewayState::new(users, products, verifier, config)).await
        }
        UserBackend::Persistent => {
            tracing::info!(path = %config.store_path.display(), "Opening RocksDB store");
            std::fs::create_dir_all(&config.store_path)?;
            let store = RocksStore::open(&config.store_path, ResourceKind::User)?;
            let users = ResourceController::new(Arc::new(store));
            serve(GatewayState::new(users, products, verifier, config)).await
        }
    }
}

async fn serve<U, P, V>(state: GatewayState<U, P, V>) -> Result<(), Box<dyn std::error::Error>>
where
    U: ResourceStore + 'static,
    P: ResourceStore + 'static,
    V: TokenVerifier + 'static,
{
    let listen_addr = state.config.listen_addr.clone();
    let app = create_router(state);

    tracing::info!(listen_addr = %listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
