//! Content processors and their registry.
//!
//! Processors own the transport layer of a media type: a
//! [`BodyProcessor`] turns the raw request payload into a deserialized
//! primitive value (before schema validation), a [`ResponseProcessor`]
//! turns a validated value plus a status into the final response. The
//! [`ProcessorRegistry`] maps media types to both kinds, with built-in
//! defaults that user registrations override per media type.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{Response, StatusCode};
use indexmap::IndexMap;
use serde_json::Value;

use crate::context::RequestContext;

/// What a body processor produced.
pub enum ProcessedBody {
    /// A deserialized value, to be validated against the declared schema.
    Value(Value),
    /// A final response signalling a transport-level parse failure; it
    /// terminates the request without schema validation.
    Response(Response<Bytes>),
}

/// The input handed to a response processor: the schema-transformed
/// value and the declared status.
#[derive(Debug, Clone)]
pub struct ProcessorPayload {
    /// The value to serialize.
    pub data: Value,
    /// The status of the response to build.
    pub status: StatusCode,
}

/// Deserializes a raw request body for one media type.
#[async_trait]
pub trait BodyProcessor: Send + Sync {
    /// Processes the buffered body synchronously.
    fn process(&self, ctx: &RequestContext) -> ProcessedBody;

    /// Processes the body in async dispatch. Defaults to the synchronous
    /// path; implementations that need to await override this.
    async fn process_async(&self, ctx: &RequestContext) -> ProcessedBody {
        self.process(ctx)
    }
}

/// Serializes a validated value into the final response for one media
/// type.
pub trait ResponseProcessor: Send + Sync {
    /// Builds the response.
    fn process(&self, payload: ProcessorPayload) -> Response<Bytes>;
}

/// JSON request bodies. Invalid syntax is a transport failure and yields
/// a plain-text 400 rather than a validation error.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBodyProcessor;

impl BodyProcessor for JsonBodyProcessor {
    fn process(&self, ctx: &RequestContext) -> ProcessedBody {
        match serde_json::from_slice(ctx.body()) {
            Ok(value) => ProcessedBody::Value(value),
            Err(error) => {
                tracing::debug!(%error, "request body is not valid JSON");
                ProcessedBody::Response(
                    Response::builder()
                        .status(StatusCode::BAD_REQUEST)
                        .header(CONTENT_TYPE, "text/plain")
                        .body(Bytes::from_static(b"Invalid JSON"))
                        .expect("Failed to build response"),
                )
            }
        }
    }
}

/// URL-encoded form bodies, decoded to an object of string fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormBodyProcessor;

impl BodyProcessor for FormBodyProcessor {
    fn process(&self, ctx: &RequestContext) -> ProcessedBody {
        let pairs: Vec<(String, String)> =
            serde_urlencoded::from_bytes(ctx.body()).unwrap_or_default();
        let fields = pairs
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        ProcessedBody::Value(Value::Object(fields))
    }
}

/// JSON responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonResponseProcessor;

impl ResponseProcessor for JsonResponseProcessor {
    fn process(&self, payload: ProcessorPayload) -> Response<Bytes> {
        let body = serde_json::to_vec(&payload.data).expect("JSON value serialization is infallible");
        Response::builder()
            .status(payload.status)
            .header(CONTENT_TYPE, "application/json")
            .body(Bytes::from(body))
            .expect("Failed to build response")
    }
}

/// Plain-text responses. Strings are emitted verbatim; other values fall
/// back to their JSON rendering.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextResponseProcessor;

impl ResponseProcessor for PlainTextResponseProcessor {
    fn process(&self, payload: ProcessorPayload) -> Response<Bytes> {
        let body = match payload.data {
            Value::String(text) => text,
            other => other.to_string(),
        };
        Response::builder()
            .status(payload.status)
            .header(CONTENT_TYPE, "text/plain")
            .body(Bytes::from(body))
            .expect("Failed to build response")
    }
}

/// Media type → processor maps for request bodies and responses.
///
/// The defaults mirror the built-in content support: JSON and
/// URL-encoded forms on the request side, JSON and plain text on the
/// response side. Registering a processor for a media type replaces the
/// default for that media type only.
#[derive(Clone)]
pub struct ProcessorRegistry {
    request: IndexMap<String, Arc<dyn BodyProcessor>>,
    response: IndexMap<String, Arc<dyn ResponseProcessor>>,
}

impl ProcessorRegistry {
    /// Creates a registry holding only the built-in processors.
    #[must_use]
    pub fn new() -> Self {
        let mut request: IndexMap<String, Arc<dyn BodyProcessor>> = IndexMap::new();
        request.insert("application/json".to_string(), Arc::new(JsonBodyProcessor));
        request.insert(
            "application/x-www-form-urlencoded".to_string(),
            Arc::new(FormBodyProcessor),
        );

        let mut response: IndexMap<String, Arc<dyn ResponseProcessor>> = IndexMap::new();
        response.insert(
            "application/json".to_string(),
            Arc::new(JsonResponseProcessor),
        );
        response.insert("text/plain".to_string(), Arc::new(PlainTextResponseProcessor));

        Self { request, response }
    }

    /// Registers (or overrides) a request-body processor for a media
    /// type.
    pub fn register_request(
        &mut self,
        media_type: impl Into<String>,
        processor: Arc<dyn BodyProcessor>,
    ) {
        self.request.insert(media_type.into(), processor);
    }

    /// Registers (or overrides) a response processor for a media type.
    pub fn register_response(
        &mut self,
        media_type: impl Into<String>,
        processor: Arc<dyn ResponseProcessor>,
    ) {
        self.response.insert(media_type.into(), processor);
    }

    /// Looks up the request-body processor for a media type.
    #[must_use]
    pub fn request_processor(&self, media_type: &str) -> Option<&Arc<dyn BodyProcessor>> {
        self.request.get(media_type)
    }

    /// Looks up the response processor for a media type.
    #[must_use]
    pub fn response_processor(&self, media_type: &str) -> Option<&Arc<dyn ResponseProcessor>> {
        self.response.get(media_type)
    }
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProcessorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorRegistry")
            .field("request", &self.request.keys().collect::<Vec<_>>())
            .field("response", &self.response.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Request;
    use serde_json::json;

    fn context(content_type: &str, body: &'static [u8]) -> RequestContext {
        let request = Request::builder()
            .uri("/")
            .header(CONTENT_TYPE, content_type)
            .body(Bytes::from_static(body))
            .unwrap();
        RequestContext::new(request, heron_route::Params::new())
    }

    #[test]
    fn test_json_body_processor_parses() {
        let ctx = context("application/json", b"{\"a\": 1}");
        match JsonBodyProcessor.process(&ctx) {
            ProcessedBody::Value(value) => assert_eq!(value, json!({"a": 1})),
            ProcessedBody::Response(_) => panic!("expected a value"),
        }
    }

    #[test]
    fn test_json_body_processor_invalid_syntax() {
        let ctx = context("application/json", b"abc");
        match JsonBodyProcessor.process(&ctx) {
            ProcessedBody::Response(response) => {
                assert_eq!(response.status(), StatusCode::BAD_REQUEST);
                assert_eq!(
                    response.headers().get(CONTENT_TYPE).unwrap(),
                    "text/plain"
                );
                assert_eq!(response.body().as_ref(), b"Invalid JSON");
            }
            ProcessedBody::Value(_) => panic!("expected a response"),
        }
    }

    #[test]
    fn test_form_body_processor() {
        let ctx = context("application/x-www-form-urlencoded", b"a=1&b=two");
        match FormBodyProcessor.process(&ctx) {
            ProcessedBody::Value(value) => {
                assert_eq!(value, json!({"a": "1", "b": "two"}));
            }
            ProcessedBody::Response(_) => panic!("expected a value"),
        }
    }

    #[test]
    fn test_json_response_processor() {
        let response = JsonResponseProcessor.process(ProcessorPayload {
            data: json!({"ok": true}),
            status: StatusCode::CREATED,
        });
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(response.body().as_ref(), br#"{"ok":true}"#);
    }

    #[test]
    fn test_plain_text_response_processor() {
        let response = PlainTextResponseProcessor.process(ProcessorPayload {
            data: json!("hello"),
            status: StatusCode::OK,
        });
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "text/plain");
        assert_eq!(response.body().as_ref(), b"hello");
    }

    #[test]
    fn test_registry_defaults() {
        let registry = ProcessorRegistry::new();
        assert!(registry.request_processor("application/json").is_some());
        assert!(registry
            .request_processor("application/x-www-form-urlencoded")
            .is_some());
        assert!(registry.response_processor("application/json").is_some());
        assert!(registry.response_processor("text/plain").is_some());
        assert!(registry.request_processor("text/csv").is_none());
    }

    #[test]
    fn test_registry_override() {
        struct Empty;
        impl BodyProcessor for Empty {
            fn process(&self, _: &RequestContext) -> ProcessedBody {
                ProcessedBody::Value(Value::Null)
            }
        }

        let mut registry = ProcessorRegistry::new();
        registry.register_request("application/json", Arc::new(Empty));

        let ctx = context("application/json", b"not json at all");
        let processor = registry.request_processor("application/json").unwrap();
        match processor.process(&ctx) {
            ProcessedBody::Value(value) => assert_eq!(value, Value::Null),
            ProcessedBody::Response(_) => panic!("override did not take effect"),
        }
    }

    #[tokio::test]
    async fn test_process_async_defaults_to_sync() {
        let ctx = context("application/json", b"[1, 2]");
        match JsonBodyProcessor.process_async(&ctx).await {
            ProcessedBody::Value(value) => assert_eq!(value, json!([1, 2])),
            ProcessedBody::Response(_) => panic!("expected a value"),
        }
    }
}
