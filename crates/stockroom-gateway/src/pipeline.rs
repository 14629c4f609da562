//! Ordered request pipeline.
//!
//! A [`Pipeline`] is a list of [`Stage`]s evaluated in registration order.
//! Each stage either passes the (possibly modified) request on or answers it
//! itself; the first answer short-circuits the rest of the pipeline and the
//! handler. A pipeline is mounted on a router with [`run_pipeline`]:
//!
//! ```text
//! request ─▶ RequestLogger ─▶ BodyParser ─▶ AuthGate ─▶ handler
//!                                 │             │
//!                                 ▼             ▼
//!                              413/500       401/403
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::{SecondsFormat, Utc};
use serde_json::Value;

use stockroom_core::RequestId;
use stockroom_store::Fields;

use crate::error::ApiError;

/// The outcome of one stage.
pub enum Flow {
    /// Hand the request to the next stage.
    Continue(Request),
    /// Answer now; later stages and the handler never run.
    Respond(Response),
}

/// One step of a [`Pipeline`].
#[async_trait]
pub trait Stage: Send + Sync {
    /// Inspect or transform the request, or answer it.
    async fn handle(&self, request: Request) -> Flow;
}

/// An ordered list of stages.
#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<Arc<dyn Stage>>,
}

impl Pipeline {
    /// An empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage.
    #[must_use]
    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Number of registered stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns `true` if no stage is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage in order, stopping at the first response.
    pub async fn run(&self, mut request: Request) -> Flow {
        for stage in &self.stages {
            match stage.handle(request).await {
                Flow::Continue(next) => request = next,
                respond @ Flow::Respond(_) => return respond,
            }
        }
        Flow::Continue(request)
    }
}

/// Middleware running a [`Pipeline`] before the wrapped routes.
///
/// Mount with `axum::middleware::from_fn_with_state(pipeline, run_pipeline)`.
pub async fn run_pipeline(
    State(pipeline): State<Pipeline>,
    request: Request,
    next: Next,
) -> Response {
    match pipeline.run(request).await {
        Flow::Continue(request) => next.run(request).await,
        Flow::Respond(response) => response,
    }
}

// =============================================================================
// Request logging
// =============================================================================

/// Logs every request and tags it with a [`RequestId`] extension.
#[derive(Debug, Default)]
pub struct RequestLogger;

#[async_trait]
impl Stage for RequestLogger {
    async fn handle(&self, mut request: Request) -> Flow {
        let request_id = RequestId::generate();
        tracing::info!(
            timestamp = %Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            method = %request.method(),
            path = %request.uri().path(),
            request_id = %request_id,
            "Request"
        );
        request.extensions_mut().insert(request_id);
        Flow::Continue(request)
    }
}

// =============================================================================
// Body parsing
// =============================================================================

/// Decoded request body fields, stored as a request extension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedBody(pub Fields);

/// Supported body encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyFormat {
    Json,
    Form,
}

impl BodyFormat {
    fn of(headers: &HeaderMap) -> Option<Self> {
        let content_type = headers.get(CONTENT_TYPE)?.to_str().ok()?;
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if mime == "application/json" || mime.ends_with("+json") {
            Some(Self::Json)
        } else if mime == "application/x-www-form-urlencoded" {
            Some(Self::Form)
        } else {
            None
        }
    }
}

/// Reads the request body and decodes it into a [`ParsedBody`].
///
/// JSON objects and URL-encoded forms become fields; any other content type,
/// an empty body, or a JSON value that is not an object yields no fields.
#[derive(Debug)]
pub struct BodyParser {
    max_body_bytes: usize,
}

impl BodyParser {
    /// Create a parser reading at most `max_body_bytes`.
    #[must_use]
    pub const fn new(max_body_bytes: usize) -> Self {
        Self { max_body_bytes }
    }

    fn declared_length(headers: &HeaderMap) -> Option<usize> {
        headers.get(CONTENT_LENGTH)?.to_str().ok()?.parse().ok()
    }
}

/// Decode a body in the given format.
fn decode(format: Option<BodyFormat>, bytes: &[u8]) -> Result<Fields, ApiError> {
    if bytes.is_empty() {
        return Ok(Fields::new());
    }

    match format {
        Some(BodyFormat::Json) => {
            let value: Value = serde_json::from_slice(bytes)
                .map_err(|e| ApiError::Internal(format!("malformed JSON body: {e}")))?;
            Ok(match value {
                Value::Object(fields) => fields,
                _ => Fields::new(),
            })
        }
        Some(BodyFormat::Form) => Ok(url::form_urlencoded::parse(bytes)
            .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
            .collect()),
        None => Ok(Fields::new()),
    }
}

#[async_trait]
impl Stage for BodyParser {
    async fn handle(&self, request: Request) -> Flow {
        let (mut parts, body) = request.into_parts();

        if Self::declared_length(&parts.headers).is_some_and(|len| len > self.max_body_bytes) {
            return Flow::Respond(ApiError::PayloadTooLarge.into_response());
        }

        let bytes: Bytes = match axum::body::to_bytes(body, self.max_body_bytes).await {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::debug!(error = %err, limit = self.max_body_bytes, "Body read failed");
                return Flow::Respond(ApiError::PayloadTooLarge.into_response());
            }
        };

        match decode(BodyFormat::of(&parts.headers), &bytes) {
            Ok(fields) => {
                parts.extensions.insert(ParsedBody(fields));
                Flow::Continue(Request::from_parts(parts, Body::from(bytes)))
            }
            Err(err) => Flow::Respond(err.into_response()),
        }
    }
}

/// Extractor for the fields decoded by [`BodyParser`].
///
/// Yields empty fields if no parser ran.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload(pub Fields);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Payload
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .extensions
                .remove::<ParsedBody>()
                .map(|ParsedBody(fields)| fields)
                .unwrap_or_default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;

    struct Tag(&'static str);

    #[async_trait]
    impl Stage for Tag {
        async fn handle(&self, mut request: Request) -> Flow {
            let mut seen = request
                .extensions()
                .get::<Vec<&'static str>>()
                .cloned()
                .unwrap_or_default();
            seen.push(self.0);
            request.extensions_mut().insert(seen);
            Flow::Continue(request)
        }
    }

    struct Refuse;

    #[async_trait]
    impl Stage for Refuse {
        async fn handle(&self, _request: Request) -> Flow {
            Flow::Respond(StatusCode::IM_A_TEAPOT.into_response())
        }
    }

    fn json_request(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/products")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    fn parsed(flow: Flow) -> Fields {
        match flow {
            Flow::Continue(request) => request.extensions().get::<ParsedBody>().unwrap().0.clone(),
            Flow::Respond(response) => panic!("unexpected response: {}", response.status()),
        }
    }

    fn status(flow: Flow) -> StatusCode {
        match flow {
            Flow::Respond(response) => response.status(),
            Flow::Continue(_) => panic!("expected a response"),
        }
    }

    #[tokio::test]
    async fn stages_run_in_order() {
        let pipeline = Pipeline::new().stage(Tag("first")).stage(Tag("second"));
        assert_eq!(pipeline.len(), 2);

        match pipeline.run(json_request("{}")).await {
            Flow::Continue(request) => {
                let seen = request.extensions().get::<Vec<&'static str>>().unwrap();
                assert_eq!(seen, &vec!["first", "second"]);
            }
            Flow::Respond(_) => panic!("pipeline answered"),
        }
    }

    #[tokio::test]
    async fn response_short_circuits() {
        let pipeline = Pipeline::new().stage(Refuse).stage(Tag("never"));
        assert_eq!(status(pipeline.run(json_request("{}")).await), StatusCode::IM_A_TEAPOT);
    }

    #[tokio::test]
    async fn empty_pipeline_continues() {
        let pipeline = Pipeline::new();
        assert!(pipeline.is_empty());
        assert!(matches!(pipeline.run(json_request("{}")).await, Flow::Continue(_)));
    }

    #[tokio::test]
    async fn logger_tags_request_id() {
        match RequestLogger.handle(json_request("{}")).await {
            Flow::Continue(request) => assert!(request.extensions().get::<RequestId>().is_some()),
            Flow::Respond(_) => panic!("logger answered"),
        }
    }

    #[tokio::test]
    async fn parses_json_object() {
        let fields = parsed(
            BodyParser::new(1024)
                .handle(json_request(r#"{"name":"Lamp","price":20}"#))
                .await,
        );
        assert_eq!(Value::Object(fields), json!({ "name": "Lamp", "price": 20 }));
    }

    #[tokio::test]
    async fn non_object_json_yields_no_fields() {
        let fields = parsed(BodyParser::new(1024).handle(json_request("[1,2]")).await);
        assert!(fields.is_empty());
    }

    #[tokio::test]
    async fn malformed_json_is_internal_error() {
        let flow = BodyParser::new(1024).handle(json_request("{bad")).await;
        assert_eq!(status(flow), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let flow = BodyParser::new(4)
            .handle(json_request(r#"{"name":"Lamp"}"#))
            .await;
        assert_eq!(status(flow), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn parses_form_body() {
        let request = Request::builder()
            .method("POST")
            .uri("/products")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded; charset=utf-8")
            .body(Body::from("name=Desk+Lamp&price=20"))
            .unwrap();

        let fields = parsed(BodyParser::new(1024).handle(request).await);
        assert_eq!(
            Value::Object(fields),
            json!({ "name": "Desk Lamp", "price": "20" })
        );
    }

    #[tokio::test]
    async fn unsupported_content_type_yields_no_fields() {
        let request = Request::builder()
            .method("POST")
            .uri("/products")
            .header(CONTENT_TYPE, "text/plain")
            .body(Body::from("name=Lamp"))
            .unwrap();

        assert!(parsed(BodyParser::new(1024).handle(request).await).is_empty());
    }
}
