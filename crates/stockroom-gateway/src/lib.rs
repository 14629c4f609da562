//! HTTP gateway for the stockroom users and products API.
//!
//! This crate provides the public-facing REST API. It handles:
//!
//! - CRUD routes for every resource kind
//! - An ordered request pipeline (logging, body parsing, auth gate)
//! - Bearer-token authentication for protected route groups
//! - Uniform error bodies, body limits, timeouts and panic recovery
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Clients                            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     stockroom-gateway                       │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────────┐    │
//! │  │  Pipeline   │ │  Auth Gate  │ │  Router + Handlers  │    │
//! │  └─────────────┘ └─────────────┘ └─────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!               ┌──────────────┴──────────────┐
//!               ▼                             ▼
//!        ┌──────────────┐              ┌──────────────┐
//!        │  Controllers │              │  Auth (JWT)  │
//!        └──────────────┘              └──────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use stockroom_auth::{AuthConfig, HmacVerifier};
//! use stockroom_control::ResourceController;
//! use stockroom_core::ResourceKind;
//! use stockroom_gateway::{create_router, GatewayConfig, GatewayState};
//! use stockroom_store::MemoryStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let users = ResourceController::new(Arc::new(MemoryStore::new(ResourceKind::User)));
//! let products = ResourceController::new(Arc::new(MemoryStore::new(ResourceKind::Product)));
//! let verifier = Arc::new(HmacVerifier::new(AuthConfig::new("change-me")));
//!
//! let state = GatewayState::new(users, products, verifier, GatewayConfig::default());
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod pipeline;
pub mod routes;
pub mod state;

pub use config::{ConfigError, GatewayConfig, UserBackend};
pub use error::ApiError;
pub use pipeline::{Flow, Payload, Pipeline, Stage};
pub use routes::create_router;
pub use state::GatewayState;

// Re-export key types for convenience
pub use auth::{AuthGate, AuthUser};
