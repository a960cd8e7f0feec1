//! Parameter binding against a request's argument sets.

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{Response, StatusCode};
use serde_json::{json, Map, Value};

use heron_core::{ParameterDefinition, ParameterLocation, RequestContext, ValidationError};

use crate::pipeline::Outcome;

/// Builds the 422 response for a client-input validation failure.
///
/// The body names the failing location (`query`, `path`, `header`,
/// `cookie`, or `body`) and carries the structured issue list.
pub(crate) fn validation_response(location: &str, error: &ValidationError) -> Response<Bytes> {
    let body = json!({
        "in": location,
        "errors": error.format_errors(),
    });
    let body = serde_json::to_vec(&body).expect("JSON value serialization is infallible");
    Response::builder()
        .status(StatusCode::UNPROCESSABLE_ENTITY)
        .header(CONTENT_TYPE, "application/json")
        .body(Bytes::from(body))
        .expect("Failed to build response")
}

/// Reads the argument set for a parameter's location.
///
/// Header names arrive lowercased from the wire; a declared name in mixed
/// case gets an alias so the definition finds it as declared.
fn argumentset(param: &ParameterDefinition, ctx: &RequestContext) -> Map<String, Value> {
    match param.location() {
        ParameterLocation::Query => ctx.query_arguments(),
        ParameterLocation::Path => ctx.path_arguments(),
        ParameterLocation::Cookie => ctx.cookie_arguments(),
        ParameterLocation::Header => {
            let mut set = ctx.header_arguments();
            let lowered = param.name().to_ascii_lowercase();
            if lowered != param.name() {
                if let Some(value) = set.get(&lowered).cloned() {
                    set.insert(param.name().to_string(), value);
                }
            }
            set
        }
    }
}

/// Binds one declared parameter, terminating with a 422 on validation
/// failure.
///
/// A successfully bound path parameter also removes its raw capture, so
/// only the typed value remains visible under the declared name.
pub(crate) fn bind_parameter(param: &ParameterDefinition, ctx: &mut RequestContext) -> Outcome {
    let argumentset = argumentset(param, ctx);
    match param.bind(&argumentset) {
        Ok(Some(value)) => {
            if param.location() == ParameterLocation::Path {
                ctx.remove_path_param(param.name());
            }
            ctx.bind_arg(param.name(), value);
            Outcome::Continue
        }
        Ok(None) => Outcome::Continue,
        Err(error) => {
            tracing::debug!(
                parameter = param.name(),
                location = param.location().as_str(),
                %error,
                "parameter validation failed"
            );
            Outcome::Terminate(validation_response(param.location().as_str(), &error))
        }
    }
}
