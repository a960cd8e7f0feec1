//! Error taxonomy for the routing layer.
//!
//! Two kinds of failure exist and never mix:
//!
//! - Client-input failures are [`ValidationError`](crate::schema::ValidationError)
//!   values, recovered locally into 422 responses inside the pipeline and
//!   never surfaced through [`Error`].
//! - Programmer/configuration failures are [`Error`] variants: they indicate
//!   a bug in route declarations and are surfaced loudly from dispatch
//!   rather than downgraded to a client-facing response.

use http::StatusCode;
use thiserror::Error;

use crate::schema::ValidationError;

/// Errors surfaced by registration, dispatch, spec synthesis, and
/// `responseify`.
#[derive(Debug, Error)]
pub enum Error {
    /// `responseify` found no pending response descriptor matching the
    /// requested status/media-type filter.
    #[error("no response descriptor matches (status: {status:?}, media type: {media_type:?})")]
    NoResponseDescriptor {
        /// The status filter, if one was given.
        status: Option<StatusCode>,
        /// The media-type filter, if one was given.
        media_type: Option<String>,
    },

    /// `responseify` found more than one matching pending response
    /// descriptor; the filter must narrow the candidates to exactly one.
    #[error("{count} response descriptors match (status: {status:?}, media type: {media_type:?})")]
    AmbiguousResponseDescriptor {
        /// How many descriptors matched.
        count: usize,
        /// The status filter, if one was given.
        status: Option<StatusCode>,
        /// The media-type filter, if one was given.
        media_type: Option<String>,
    },

    /// Schema compilation was requested for an OpenAPI version other than
    /// 3.0.x.
    #[error("unsupported OpenAPI version: {0}")]
    UnsupportedOpenApiVersion(String),

    /// An OpenAPI version string could not be parsed at all.
    #[error("invalid OpenAPI version string: {0:?}")]
    InvalidOpenApiVersion(String),

    /// The same parameter name was declared twice on one operation.
    #[error("parameter {name:?} declared more than once on one operation")]
    DuplicateParameter {
        /// The colliding parameter name.
        name: String,
    },

    /// A request body was declared with an empty content map.
    #[error("request body {bind_to:?} declares no media types")]
    EmptyBodyContent {
        /// The body's bind-to name.
        bind_to: String,
    },

    /// The request's media type was declared but no request-content
    /// processor is registered for it.
    #[error("no request content processor registered for {media_type:?}")]
    MissingRequestProcessor {
        /// The media type missing a processor.
        media_type: String,
    },

    /// A response descriptor matched but no response-content processor is
    /// registered for its media type.
    #[error("no response content processor registered for {media_type:?}")]
    MissingResponseProcessor {
        /// The media type missing a processor.
        media_type: String,
    },

    /// A handler's return value failed its declared response schema.
    #[error("response value failed its declared schema: {0}")]
    ResponseValidation(#[source] ValidationError),

    /// An async handler was reached through the synchronous dispatch path.
    #[error("async handler reached synchronous dispatch; use dispatch_async")]
    AsyncHandlerInSyncDispatch,

    /// A path template failed to parse or render.
    #[error(transparent)]
    Template(#[from] heron_route::TemplateError),

    /// A handler signalled that the addressed entity does not exist.
    ///
    /// Framework adapters map this to a 404 response.
    #[error("{resource} not found")]
    NotFound {
        /// Description of what was looked up.
        resource: String,
    },
}

impl Error {
    /// Creates a not-found error for the given resource description.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Returns the HTTP status an adapter should map this error to.
    ///
    /// Programmer/configuration errors all map to 500: they are bugs in
    /// route declarations, not conditions a client can correct.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
