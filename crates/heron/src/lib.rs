//! # Heron
//!
//! **Declarative routing layer with OpenAPI 3.0 synthesis**
//!
//! Heron augments a host web framework's handlers with:
//!
//! - schema-validated extraction of request parameters (path, query,
//!   header, cookie) and request bodies, with structured 422 error bodies
//! - content-negotiated response serialization through declared
//!   `(status, media type, schema)` descriptors
//! - OpenAPI 3.0 Path Item synthesis from the same declarations used at
//!   request time, so routes and documentation never drift apart
//!
//! ## Quick start
//!
//! ```rust
//! use heron::{schema, ApiRouter, OpenApiVersion, Operation, Resource};
//! use http::StatusCode;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), heron::Error> {
//! let users = Resource::builder()
//!     .get(
//!         Operation::builder()
//!             .path("uid", schema::integer())
//!             .json_response(StatusCode::OK, None)
//!             .handle(|inv| inv.respond(json!({"id": inv.arg("uid")})))?,
//!     )
//!     .build()?;
//!
//! let mut router = ApiRouter::new();
//! router.add("/users/{uid}", users)?;
//!
//! let paths = router.spec(OpenApiVersion::V3_0)?;
//! assert!(paths.contains_key("/users/{uid}"));
//! # Ok(())
//! # }
//! ```
//!
//! Path matching stays with the host framework: [`ApiRouter`] exposes each
//! route's native path rendering through [`Route::router_path`], and the
//! adapter hands the captured variables back as [`Params`] when it builds
//! the per-request [`RequestContext`].

#![doc(html_root_url = "https://docs.rs/heron/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod router;

pub use router::{ApiRouter, Route};

pub use heron_core::{
    schema, BodyProcessor, Definition, DefinitionRegistry, Error, MediaType, OpenApiVersion,
    ParameterDefinition, ParameterLocation, PendingResponse, ProcessedBody, ProcessorPayload,
    ProcessorRegistry, RequestBodyDefinition, RequestContext, ResourceRegistry, ResponseDefinition,
    ResponseProcessor, Schema, SchemaKind, ValidationError,
};
pub use heron_docs::{path_item, OperationItem, PathItem};
pub use heron_extract::{
    responseify, Invocation, Operation, OperationBuilder, Resource, ResourceBuilder, ResponseFilter,
};
pub use heron_route::{Params, PathTemplate, Segment, TemplateError};
