//! Service information endpoints.
//!
//! Both endpoints are public and bypass every auth gate.

use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process serves requests.
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
    /// Crate version.
    pub version: &'static str,
}

/// Liveness probe.
///
/// ```text
/// GET /health
///
/// Response: 200 OK
/// { "status": "ok", "service": "stockroom", "version": "0.1.0" }
/// ```
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "stockroom",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Plain-text service banner.
pub async fn about() -> impl IntoResponse {
    concat!("Stockroom inventory service v", env!("CARGO_PKG_VERSION"))
}
