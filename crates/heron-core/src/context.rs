//! Per-request state threaded through the binding pipeline.
//!
//! A [`RequestContext`] owns the buffered request, the path captures the
//! host router extracted, the argument map the binders fill in, and the
//! request-scoped stack of pending response descriptors. One context
//! exists per in-flight request and is never shared, so any number of
//! concurrent requests see independent descriptor stacks.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, COOKIE};
use http::{HeaderMap, Method, Request, Uri};
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::media::MediaType;

/// One declared `(status, media type, schema)` triple visible to
/// `responseify` while a response layer is active.
#[derive(Debug, Clone)]
pub struct PendingResponse {
    /// The declared status code.
    pub status: http::StatusCode,
    /// The media type the descriptor serializes to.
    pub media_type: String,
    /// The schema binding applied to the raw handler value.
    pub media: MediaType,
}

/// The state of one in-flight request.
pub struct RequestContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    path_params: heron_route::Params,
    args: IndexMap<String, Value>,
    pending: Vec<PendingResponse>,
}

impl RequestContext {
    /// Creates a context from a buffered request plus the variables the
    /// host router captured from the matched path.
    #[must_use]
    pub fn new(request: Request<Bytes>, path_params: heron_route::Params) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            path_params,
            args: IndexMap::new(),
            pending: Vec::new(),
        }
    }

    /// The request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// The request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The buffered request body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The request's media type: the Content-Type value with its
    /// parameters (`; charset=...`) stripped, lowercased.
    #[must_use]
    pub fn media_type(&self) -> Option<String> {
        let value = self.headers.get(CONTENT_TYPE)?.to_str().ok()?;
        let essence = value.split(';').next().unwrap_or(value);
        Some(essence.trim().to_ascii_lowercase())
    }

    /// The raw path captures.
    #[must_use]
    pub fn path_params(&self) -> &heron_route::Params {
        &self.path_params
    }

    /// Removes a raw path capture.
    ///
    /// The path binder calls this after binding the typed value, so the
    /// raw string does not linger next to its validated replacement.
    pub fn remove_path_param(&mut self, name: &str) -> Option<String> {
        self.path_params.remove(name)
    }

    /// The decoded query string as an argument set (last value wins per
    /// repeated key). A missing or undecodable query string is empty.
    #[must_use]
    pub fn query_arguments(&self) -> Map<String, Value> {
        let Some(query) = self.uri.query() else {
            return Map::new();
        };
        let pairs: Vec<(String, String)> =
            serde_urlencoded::from_str(query).unwrap_or_default();
        pairs
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect()
    }

    /// The path captures as an argument set.
    #[must_use]
    pub fn path_arguments(&self) -> Map<String, Value> {
        self.path_params
            .iter()
            .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
            .collect()
    }

    /// The request headers as an argument set, keyed by lowercase header
    /// name. Non-UTF-8 header values are skipped.
    #[must_use]
    pub fn header_arguments(&self) -> Map<String, Value> {
        self.headers
            .iter()
            .filter_map(|(name, value)| {
                let value = value.to_str().ok()?;
                Some((name.as_str().to_string(), Value::String(value.to_string())))
            })
            .collect()
    }

    /// The request cookies as an argument set, parsed from every Cookie
    /// header (last value wins per repeated name).
    #[must_use]
    pub fn cookie_arguments(&self) -> Map<String, Value> {
        let mut set = Map::new();
        for header in self.headers.get_all(COOKIE) {
            let Ok(header) = header.to_str() else {
                continue;
            };
            for pair in header.split(';') {
                if let Some((name, value)) = pair.split_once('=') {
                    set.insert(
                        name.trim().to_string(),
                        Value::String(value.trim().to_string()),
                    );
                }
            }
        }
        set
    }

    /// The validated arguments bound so far, in binding order.
    #[must_use]
    pub fn args(&self) -> &IndexMap<String, Value> {
        &self.args
    }

    /// Looks up one bound argument.
    #[must_use]
    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    /// Binds a validated value under its declared name.
    pub fn bind_arg(&mut self, name: impl Into<String>, value: Value) {
        self.args.insert(name.into(), value);
    }

    /// Prepends a response layer's descriptors to the pending stack.
    ///
    /// Inner layers prepend after outer ones, so their descriptors are
    /// seen first. Returns the count to hand back to
    /// [`pop_response_layer`](Self::pop_response_layer).
    pub fn push_response_layer(&mut self, descriptors: Vec<PendingResponse>) -> usize {
        let count = descriptors.len();
        self.pending.splice(0..0, descriptors);
        count
    }

    /// Removes the `count` descriptors a layer prepended, restoring the
    /// stack the layer found. Must run on every exit path of the layer.
    pub fn pop_response_layer(&mut self, count: usize) {
        self.pending.drain(..count.min(self.pending.len()));
    }

    /// The pending response descriptors currently visible, innermost
    /// layer first.
    #[must_use]
    pub fn pending_responses(&self) -> &[PendingResponse] {
        &self.pending
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("args", &self.args)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use serde_json::json;

    fn context(request: Request<Bytes>) -> RequestContext {
        RequestContext::new(request, heron_route::Params::new())
    }

    fn get(uri: &str) -> RequestContext {
        context(Request::builder().uri(uri).body(Bytes::new()).unwrap())
    }

    #[test]
    fn test_query_arguments() {
        let ctx = get("/items?a=1&b=two");
        let args = ctx.query_arguments();
        assert_eq!(args.get("a"), Some(&json!("1")));
        assert_eq!(args.get("b"), Some(&json!("two")));
    }

    #[test]
    fn test_query_arguments_last_value_wins() {
        let ctx = get("/items?a=1&a=2");
        assert_eq!(ctx.query_arguments().get("a"), Some(&json!("2")));
    }

    #[test]
    fn test_query_arguments_absent() {
        assert!(get("/items").query_arguments().is_empty());
    }

    #[test]
    fn test_media_type_strips_parameters() {
        let ctx = context(
            Request::builder()
                .uri("/")
                .header(CONTENT_TYPE, "Application/JSON; charset=utf-8")
                .body(Bytes::new())
                .unwrap(),
        );
        assert_eq!(ctx.media_type().as_deref(), Some("application/json"));
    }

    #[test]
    fn test_media_type_absent() {
        assert_eq!(get("/").media_type(), None);
    }

    #[test]
    fn test_header_arguments_lowercase_keys() {
        let ctx = context(
            Request::builder()
                .uri("/")
                .header("X-Token", "abc")
                .body(Bytes::new())
                .unwrap(),
        );
        assert_eq!(ctx.header_arguments().get("x-token"), Some(&json!("abc")));
    }

    #[test]
    fn test_cookie_arguments() {
        let ctx = context(
            Request::builder()
                .uri("/")
                .header(COOKIE, "session=s1; theme=dark")
                .body(Bytes::new())
                .unwrap(),
        );
        let args = ctx.cookie_arguments();
        assert_eq!(args.get("session"), Some(&json!("s1")));
        assert_eq!(args.get("theme"), Some(&json!("dark")));
    }

    #[test]
    fn test_path_param_removal() {
        let mut params = heron_route::Params::new();
        params.push("uid", "1000");
        let mut ctx =
            RequestContext::new(Request::builder().uri("/users/1000").body(Bytes::new()).unwrap(), params);

        assert_eq!(ctx.path_arguments().get("uid"), Some(&json!("1000")));
        assert_eq!(ctx.remove_path_param("uid").as_deref(), Some("1000"));
        assert!(ctx.path_arguments().is_empty());
    }

    #[test]
    fn test_response_layers_prepend_and_restore() {
        let mut ctx = get("/");
        let outer = ctx.push_response_layer(vec![PendingResponse {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            media_type: "application/json".to_string(),
            media: MediaType::passthrough(),
        }]);
        let inner = ctx.push_response_layer(vec![PendingResponse {
            status: StatusCode::OK,
            media_type: "application/json".to_string(),
            media: MediaType::passthrough(),
        }]);

        let statuses: Vec<_> = ctx.pending_responses().iter().map(|d| d.status).collect();
        assert_eq!(
            statuses,
            vec![StatusCode::OK, StatusCode::UNPROCESSABLE_ENTITY]
        );

        ctx.pop_response_layer(inner);
        assert_eq!(ctx.pending_responses().len(), 1);
        ctx.pop_response_layer(outer);
        assert!(ctx.pending_responses().is_empty());
    }
}
