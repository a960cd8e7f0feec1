//! Response serialization against the pending-descriptor stack.

use bytes::Bytes;
use http::{Response, StatusCode};
use serde_json::Value;

use heron_core::{Error, ProcessorPayload, ProcessorRegistry, RequestContext};

/// Narrows the visible pending response descriptors down to one.
///
/// An empty filter matches every descriptor; `responseify` still demands
/// that exactly one survives, so handlers with several declared responses
/// must say which one they mean.
#[derive(Debug, Clone, Default)]
pub struct ResponseFilter {
    status: Option<StatusCode>,
    media_type: Option<String>,
}

impl ResponseFilter {
    /// A filter matching every descriptor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps only descriptors declared for `status`.
    #[must_use]
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Keeps only descriptors declared for `media_type`.
    #[must_use]
    pub fn media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }
}

/// Serializes a raw handler value through the one matching pending
/// response descriptor.
///
/// Filters the visible descriptors by the filter's status, then by its
/// media type; validates the raw value through the surviving descriptor's
/// schema binding and hands the result to the registered response
/// processor for that media type.
///
/// # Errors
///
/// Zero or multiple surviving descriptors, a missing response processor,
/// and a raw value failing the declared schema are all declaration bugs,
/// surfaced as [`Error`] rather than client-facing responses.
pub fn responseify(
    ctx: &RequestContext,
    processors: &ProcessorRegistry,
    raw: Value,
    filter: &ResponseFilter,
) -> Result<Response<Bytes>, Error> {
    let candidates: Vec<_> = ctx
        .pending_responses()
        .iter()
        .filter(|d| filter.status.map_or(true, |s| d.status == s))
        .filter(|d| {
            filter
                .media_type
                .as_deref()
                .map_or(true, |mt| d.media_type == mt)
        })
        .collect();

    let descriptor = match candidates.as_slice() {
        [one] => *one,
        [] => {
            return Err(Error::NoResponseDescriptor {
                status: filter.status,
                media_type: filter.media_type.clone(),
            })
        }
        many => {
            return Err(Error::AmbiguousResponseDescriptor {
                count: many.len(),
                status: filter.status,
                media_type: filter.media_type.clone(),
            })
        }
    };

    let data = descriptor
        .media
        .parse(raw)
        .map_err(Error::ResponseValidation)?;
    let processor = processors
        .response_processor(&descriptor.media_type)
        .ok_or_else(|| Error::MissingResponseProcessor {
            media_type: descriptor.media_type.clone(),
        })?;
    Ok(processor.process(ProcessorPayload {
        data,
        status: descriptor.status,
    }))
}
