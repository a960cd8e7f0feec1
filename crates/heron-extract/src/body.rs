//! Request-body binding: content negotiation, deserialization, and
//! schema validation.

use bytes::Bytes;
use http::{Response, StatusCode};

use heron_core::{Error, ProcessedBody, ProcessorRegistry, RequestBodyDefinition, RequestContext};

use crate::binder::validation_response;
use crate::pipeline::Outcome;

fn unsupported_media_type(body: &RequestBodyDefinition, media_type: Option<&str>) -> Outcome {
    tracing::debug!(
        bind_to = body.bind_to(),
        media_type,
        "request media type not declared"
    );
    Outcome::Terminate(
        Response::builder()
            .status(StatusCode::UNSUPPORTED_MEDIA_TYPE)
            .body(Bytes::new())
            .expect("Failed to build response"),
    )
}

enum Negotiated<'a> {
    Proceed(heron_core::MediaType, &'a std::sync::Arc<dyn heron_core::BodyProcessor>),
    Stop(Outcome),
}

/// Resolves the declared media binding and its processor, or the reason
/// to stop. The 415 check runs before any deserialization.
fn negotiate<'a>(
    body: &RequestBodyDefinition,
    ctx: &RequestContext,
    processors: &'a ProcessorRegistry,
) -> Result<Negotiated<'a>, Error> {
    let Some(media_type) = ctx.media_type() else {
        return Ok(Negotiated::Stop(unsupported_media_type(body, None)));
    };
    let Some(media) = body.media(&media_type) else {
        return Ok(Negotiated::Stop(unsupported_media_type(
            body,
            Some(&media_type),
        )));
    };

    let processor = processors
        .request_processor(&media_type)
        .ok_or_else(|| Error::MissingRequestProcessor {
            media_type: media_type.clone(),
        })?;
    Ok(Negotiated::Proceed(media.clone(), processor))
}

/// Validates the deserialized value and binds it under the bind-to name.
fn finish(
    body: &RequestBodyDefinition,
    media: &heron_core::MediaType,
    ctx: &mut RequestContext,
    processed: ProcessedBody,
) -> Outcome {
    let data = match processed {
        ProcessedBody::Value(data) => data,
        ProcessedBody::Response(response) => return Outcome::Terminate(response),
    };

    match media.parse(data) {
        Ok(value) => {
            ctx.bind_arg(body.bind_to(), value);
            Outcome::Continue
        }
        Err(error) => {
            tracing::debug!(bind_to = body.bind_to(), %error, "request body validation failed");
            Outcome::Terminate(validation_response("body", &error))
        }
    }
}

/// Binds the request body synchronously.
pub(crate) fn bind_body(
    body: &RequestBodyDefinition,
    ctx: &mut RequestContext,
    processors: &ProcessorRegistry,
) -> Result<Outcome, Error> {
    let (media, processor) = match negotiate(body, ctx, processors)? {
        Negotiated::Proceed(media, processor) => (media, processor),
        Negotiated::Stop(outcome) => return Ok(outcome),
    };
    let processed = processor.process(ctx);
    Ok(finish(body, &media, ctx, processed))
}

/// Binds the request body, awaiting the processor.
pub(crate) async fn bind_body_async(
    body: &RequestBodyDefinition,
    ctx: &mut RequestContext,
    processors: &ProcessorRegistry,
) -> Result<Outcome, Error> {
    let (media, processor) = match negotiate(body, ctx, processors)? {
        Negotiated::Proceed(media, processor) => (media, std::sync::Arc::clone(processor)),
        Negotiated::Stop(outcome) => return Ok(outcome),
    };
    let processed = processor.process_async(ctx).await;
    Ok(finish(body, &media, ctx, processed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use heron_core::{schema, MediaType};
    use http::header::CONTENT_TYPE;
    use http::Request;
    use indexmap::IndexMap;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn json_body() -> RequestBodyDefinition {
        let mut content = IndexMap::new();
        content.insert(
            "application/json".to_string(),
            MediaType::of(Arc::new(
                schema::ObjectSchema::new().field("a", schema::integer()),
            )),
        );
        RequestBodyDefinition::new("body", content).unwrap()
    }

    fn context(content_type: Option<&str>, payload: &'static [u8]) -> RequestContext {
        let mut builder = Request::builder().uri("/").method("POST");
        if let Some(content_type) = content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        RequestContext::new(
            builder.body(Bytes::from_static(payload)).unwrap(),
            heron_route::Params::new(),
        )
    }

    #[test]
    fn test_valid_body_binds() {
        let mut ctx = context(Some("application/json"), b"{\"a\": 1}");
        let outcome = bind_body(&json_body(), &mut ctx, &ProcessorRegistry::new()).unwrap();

        assert!(matches!(outcome, Outcome::Continue));
        assert_eq!(ctx.arg("body"), Some(&json!({"a": 1})));
    }

    #[test]
    fn test_undeclared_content_type_is_415() {
        let mut ctx = context(Some("text/plain"), b"abc");
        let outcome = bind_body(&json_body(), &mut ctx, &ProcessorRegistry::new()).unwrap();

        let Outcome::Terminate(response) = outcome else {
            panic!("expected termination");
        };
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn test_missing_content_type_is_415() {
        let mut ctx = context(None, b"{}");
        let outcome = bind_body(&json_body(), &mut ctx, &ProcessorRegistry::new()).unwrap();
        assert!(matches!(
            outcome,
            Outcome::Terminate(r) if r.status() == StatusCode::UNSUPPORTED_MEDIA_TYPE
        ));
    }

    #[test]
    fn test_invalid_json_is_processor_response() {
        let mut ctx = context(Some("application/json"), b"abc");
        let outcome = bind_body(&json_body(), &mut ctx, &ProcessorRegistry::new()).unwrap();

        let Outcome::Terminate(response) = outcome else {
            panic!("expected termination");
        };
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.body().as_ref(), b"Invalid JSON");
    }

    #[test]
    fn test_schema_failure_is_422_in_body() {
        let mut ctx = context(Some("application/json"), b"{\"a\": \"abc\"}");
        let outcome = bind_body(&json_body(), &mut ctx, &ProcessorRegistry::new()).unwrap();

        let Outcome::Terminate(response) = outcome else {
            panic!("expected termination");
        };
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let parsed: Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(parsed["in"], json!("body"));
        assert_eq!(parsed["errors"][0]["loc"], json!(["a"]));
    }

    #[test]
    fn test_missing_processor_is_programmer_error() {
        let mut content = IndexMap::new();
        content.insert("text/csv".to_string(), MediaType::passthrough());
        let body = RequestBodyDefinition::new("body", content).unwrap();

        let mut ctx = context(Some("text/csv"), b"a,b");
        let err = bind_body(&body, &mut ctx, &ProcessorRegistry::new()).unwrap_err();
        assert!(matches!(err, Error::MissingRequestProcessor { media_type } if media_type == "text/csv"));
    }

    #[tokio::test]
    async fn test_async_binding_matches_sync() {
        let mut ctx = context(Some("application/json"), b"{\"a\": 7}");
        let outcome = bind_body_async(&json_body(), &mut ctx, &ProcessorRegistry::new())
            .await
            .unwrap();

        assert!(matches!(outcome, Outcome::Continue));
        assert_eq!(ctx.arg("body"), Some(&json!({"a": 7})));
    }
}
