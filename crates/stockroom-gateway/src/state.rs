//! Gateway application state.
//!
//! This module defines the services the router is assembled from.

use std::sync::Arc;

use stockroom_auth::TokenVerifier;
use stockroom_control::ResourceController;
use stockroom_store::ResourceStore;

use crate::config::GatewayConfig;

/// Shared application state for the gateway.
///
/// `U` backs the `users` resource and `P` the `products` resource; each
/// controller becomes the state of its own route group.
pub struct GatewayState<U, P, V>
where
    U: ResourceStore,
    P: ResourceStore,
    V: TokenVerifier,
{
    /// Controller for `/users`.
    pub users: ResourceController<U>,
    /// Controller for `/products`.
    pub products: ResourceController<P>,
    /// The token verifier used by the auth gate.
    pub verifier: Arc<V>,
    /// Gateway configuration.
    pub config: GatewayConfig,
}

impl<U, P, V> GatewayState<U, P, V>
where
    U: ResourceStore,
    P: ResourceStore,
    V: TokenVerifier,
{
    /// Create a new gateway state.
    #[must_use]
    pub fn new(
        users: ResourceController<U>,
        products: ResourceController<P>,
        verifier: Arc<V>,
        config: GatewayConfig,
    ) -> Self {
        Self {
            users,
            products,
            verifier,
            config,
        }
    }
}

impl<U, P, V> Clone for GatewayState<U, P, V>
where
    U: ResourceStore,
    P: ResourceStore,
    V: TokenVerifier,
{
    fn clone(&self) -> Self {
        Self {
            users: self.users.clone(),
            products: self.products.clone(),
            verifier: Arc::clone(&self.verifier),
            config: self.config.clone(),
        }
    }
}
