//! # Heron Core
//!
//! Core types for the Heron declarative routing layer.
//!
//! This crate provides the vocabulary the binding pipeline and the spec
//! synthesis share:
//!
//! - [`Schema`] - the validation capability, with reference schemas in [`schema`]
//! - [`MediaType`] - a content type's optional schema binding
//! - [`ParameterDefinition`], [`RequestBodyDefinition`], [`ResponseDefinition`] -
//!   route declarations, collected into a [`DefinitionRegistry`]
//! - [`RequestContext`] - per-request state, including the pending-response
//!   descriptor stack
//! - [`ProcessorRegistry`] - media type → content processor maps
//! - [`Error`] - programmer/configuration errors; client-input failures are
//!   [`ValidationError`] values

#![doc(html_root_url = "https://docs.rs/heron-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod definition;
mod error;
mod media;
mod processor;
pub mod schema;

pub use context::{PendingResponse, RequestContext};
pub use definition::{
    Definition, DefinitionRegistry, ParameterDefinition, ParameterLocation, RequestBodyDefinition,
    ResourceRegistry, ResponseDefinition,
};
pub use error::Error;
pub use media::{MediaType, OpenApiVersion};
pub use processor::{
    BodyProcessor, FormBodyProcessor, JsonBodyProcessor, JsonResponseProcessor, PlainTextResponseProcessor,
    ProcessedBody, ProcessorPayload, ProcessorRegistry, ResponseProcessor,
};
pub use schema::{Schema, SchemaKind, ValidationError};
