//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::any::Any as PanicPayload;

use axum::body::{Bytes, HttpBody};
use axum::http::StatusCode;
use axum::middleware::{from_fn_with_state, map_response};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{BoxError, Router};
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use stockroom_auth::TokenVerifier;
use stockroom_control::ResourceController;
use stockroom_store::ResourceStore;

use crate::auth::AuthGate;
use crate::error::ApiError;
use crate::handlers::{health, resources};
use crate::pipeline::{run_pipeline, BodyParser, Pipeline, RequestLogger};
use crate::state::GatewayState;

/// Create the gateway router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - `GET /about` - Service banner
///
/// ## Resources (`users`, `products`)
/// - `GET /{collection}` - List records
/// - `POST /{collection}` - Create record
/// - `GET /{collection}/:id` - Get record
/// - `PUT /{collection}/:id` - Update record
/// - `DELETE /{collection}/:id` - Delete record
///
/// `users` routes require a bearer token when the user backend is persistent.
pub fn create_router<U, P, V>(state: GatewayState<U, P, V>) -> Router
where
    U: ResourceStore + 'static,
    P: ResourceStore + 'static,
    V: TokenVerifier + 'static,
{
    let GatewayState {
        users,
        products,
        verifier,
        config,
    } = state;

    let mut user_routes = resource_routes(users);
    if config.user_backend.requires_auth() {
        let gate = Pipeline::new().stage(AuthGate::new(verifier));
        user_routes = user_routes.layer(from_fn_with_state(gate, run_pipeline));
    }

    let pipeline = Pipeline::new()
        .stage(RequestLogger)
        .stage(BodyParser::new(config.max_body_bytes));

    Router::new()
        .route("/health", get(health::health))
        .route("/about", get(health::about))
        .merge(user_routes)
        .merge(resource_routes(products))
        .layer(from_fn_with_state(pipeline, run_pipeline))
        .layer(
            ServiceBuilder::new()
                .layer(TimeoutLayer::new(config.request_timeout()))
                .layer(map_response(payload_too_large_as_json))
                .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
                .layer(build_cors_layer(&config.cors_origins))
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::custom(handle_panic)),
        )
}

/// The five CRUD routes of one resource kind, bound to its controller.
fn resource_routes<S>(controller: ResourceController<S>) -> Router
where
    S: ResourceStore + 'static,
{
    let collection = format!("/{}", controller.kind().collection());
    let member = format!("{collection}/:id");

    Router::new()
        .route(
            &collection,
            get(resources::list::<S>).post(resources::create::<S>),
        )
        .route(
            &member,
            get(resources::get_one::<S>)
                .put(resources::update::<S>)
                .delete(resources::delete::<S>),
        )
        .with_state(controller)
}

/// Give 413 responses from the body limit layer the API error body.
async fn payload_too_large_as_json<B>(response: Response<B>) -> Response
where
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    if response.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge.into_response()
    } else {
        response.into_response()
    }
}

/// Turn a handler panic into the generic 500 response.
fn handle_panic(payload: Box<dyn PanicPayload + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    ApiError::Internal(format!("handler panicked: {detail}")).into_response()
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
