//! # reqvld-tower — Tower middleware for `reqvld` request validation
//!
//! A [`tower_layer::Layer`] that validates every partition of an incoming
//! HTTP request (JSON body, headers, path parameters, query string) against
//! a [`RequestSchema`]. Works with any Tower-compatible framework.
//!
//! On **success** the sanitized body replaces the request body and a
//! [`ValidatedRequest`] holding every sanitized partition is stored in the
//! request extensions.
//!
//! On **failure** the inner service is never called:
//! - malformed JSON → `400` with `{ "error": "Invalid JSON", "message": ... }`
//! - validation errors → `400` with
//!   `{ "name": "InputDataValidationError", "errors": [{ "path", "value", "msg" }] }`
//! - an evaluator fault → `500`
//!
//! Path parameters come from a [`PathParams`] extension inserted by the
//! router.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use reqvld::request::RequestSchema;
//! use reqvld_tower::ValidateRequestLayer;
//!
//! let schema = RequestSchema::new().body(
//!     reqvld::bind(&reqvld::object().field("titulo", reqvld::string().not_null()).into()).unwrap(),
//! );
//! let layer = ValidateRequestLayer::new(schema);
//! // let app = Router::new().route("/libros", post(handler)).layer(layer);
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Request, Response, StatusCode};
use http_body::Body;
use http_body_util::{BodyExt, Full};
use reqvld::format::to_payload;
use reqvld::request::{RequestInput, RequestSchema};
use serde_json::{Map, Value};

pub mod query;

pub use query::{parse_query_string, url_decode};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

// ---------------------------------------------------------------------------
// Extensions
// ---------------------------------------------------------------------------

/// Path parameters extracted by the router, as raw strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathParams(pub Map<String, Value>);

impl PathParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), Value::String(value.into()));
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), |p, (k, v)| p.with(k, v))
    }
}

/// Every sanitized partition of a request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest(pub RequestInput);

impl ValidatedRequest {
    pub fn body(&self) -> &Value {
        &self.0.body
    }

    pub fn params(&self) -> &Value {
        &self.0.params
    }

    pub fn query(&self) -> &Value {
        &self.0.query
    }

    pub fn headers(&self) -> &Value {
        &self.0.headers
    }
}

// ---------------------------------------------------------------------------
// Layer
// ---------------------------------------------------------------------------

/// A [`tower_layer::Layer`] that validates requests with a
/// [`RequestSchema`]. The schema is shared by every service it creates.
#[derive(Clone)]
pub struct ValidateRequestLayer {
    schema: Arc<RequestSchema>,
}

impl ValidateRequestLayer {
    pub fn new(schema: RequestSchema) -> Self {
        Self {
            schema: Arc::new(schema),
        }
    }
}

impl<S> tower_layer::Layer<S> for ValidateRequestLayer {
    type Service = ValidateRequestService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ValidateRequestService {
            inner,
            schema: Arc::clone(&self.schema),
        }
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// The middleware [`Service`](tower_service::Service) created by
/// [`ValidateRequestLayer`].
#[derive(Clone)]
pub struct ValidateRequestService<S> {
    inner: S,
    schema: Arc<RequestSchema>,
}

impl<S, ReqBody, ResBody> tower_service::Service<Request<ReqBody>> for ValidateRequestService<S>
where
    S: tower_service::Service<Request<Full<Bytes>>, Response = Response<ResBody>>
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
    S::Error: Into<BoxError>,
    ReqBody: Body + Send + 'static,
    ReqBody::Data: Send,
    ReqBody::Error: Into<BoxError>,
    ResBody: From<Full<Bytes>> + Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let mut inner = self.inner.clone();
        std::mem::swap(&mut self.inner, &mut inner);
        let schema = Arc::clone(&self.schema);

        Box::pin(async move {
            let (mut parts, body) = req.into_parts();
            let bytes = body
                .collect()
                .await
                .map_err(|e| -> BoxError { e.into() })?
                .to_bytes();

            let body = match parse_body(&parts.headers, &bytes) {
                Ok(v) => v,
                Err(e) => {
                    tracing::debug!(error = %e, "request body is not valid JSON");
                    let payload = serde_json::json!({
                        "error": "Invalid JSON",
                        "message": e.to_string(),
                    });
                    return Ok(json_response(StatusCode::BAD_REQUEST, &payload));
                }
            };

            let mut input = RequestInput {
                body,
                headers: headers_to_json(&parts.headers),
                params: parts
                    .extensions
                    .get::<PathParams>()
                    .map(|p| Value::Object(p.0.clone()))
                    .unwrap_or_else(|| Value::Object(Map::new())),
                query: Value::Object(parts.uri.query().map(parse_query_string).unwrap_or_default()),
            };

            match schema.check(&mut input).await {
                Ok(()) => {
                    let sanitized = Bytes::from(serde_json::to_vec(&input.body)?);
                    parts
                        .headers
                        .insert(http::header::CONTENT_LENGTH, HeaderValue::from(sanitized.len()));
                    parts.extensions.insert(ValidatedRequest(input));
                    let req = Request::from_parts(parts, Full::new(sanitized));
                    inner.call(req).await.map_err(Into::into)
                }
                Err(reqvld::Error::Validation(failure)) => {
                    tracing::debug!(
                        method = %parts.method,
                        uri = %parts.uri,
                        errors = failure.len(),
                        "request failed validation"
                    );
                    Ok(json_response(StatusCode::BAD_REQUEST, &to_payload(&failure)))
                }
                Err(e) => {
                    tracing::warn!(error = %e, method = %parts.method, uri = %parts.uri, "request validation aborted");
                    let payload = serde_json::json!({ "error": "Internal Server Error" });
                    Ok(json_response(StatusCode::INTERNAL_SERVER_ERROR, &payload))
                }
            }
        })
    }
}

/// The body as JSON. An empty body, or one with a non-JSON content type, is
/// read as `{}`.
fn parse_body(headers: &HeaderMap, bytes: &Bytes) -> Result<Value, serde_json::Error> {
    let is_json = headers
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/json") || ct.contains("+json"))
        .unwrap_or(true);
    if bytes.is_empty() || !is_json {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(bytes)
}

/// Header names are lowercase; values that are not visible ASCII are
/// skipped. Repeated headers are joined with `", "`.
fn headers_to_json(headers: &HeaderMap) -> Value {
    let mut map = Map::new();
    for name in headers.keys() {
        let values: Vec<&str> = headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        if !values.is_empty() {
            map.insert(name.as_str().to_string(), Value::String(values.join(", ")));
        }
    }
    Value::Object(map)
}

fn json_response<ResBody: From<Full<Bytes>>>(status: StatusCode, payload: &Value) -> Response<ResBody> {
    let bytes = serde_json::to_vec(payload).unwrap_or_default();
    let mut resp = Response::new(ResBody::from(Full::new(Bytes::from(bytes))));
    *resp.status_mut() = status;
    resp.headers_mut().insert(
        http::header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    resp
}

// ---------------------------------------------------------------------------
// Helper: extract validated partitions from request extensions
// ---------------------------------------------------------------------------

/// The sanitized partitions stored by [`ValidateRequestService`], or `None`
/// if the middleware was not applied.
pub fn try_validated<B>(req: &Request<B>) -> Option<&ValidatedRequest> {
    req.extensions().get::<ValidatedRequest>()
}

/// Prelude — import everything you need.
pub mod prelude {
    pub use crate::{
        try_validated, PathParams, ValidateRequestLayer, ValidateRequestService, ValidatedRequest,
    };
}
