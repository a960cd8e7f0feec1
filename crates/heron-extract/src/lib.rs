//! # Heron Extract
//!
//! The request-binding pipeline of the Heron declarative routing layer.
//!
//! A [`Resource`] maps HTTP verbs to [`Operation`]s. Each operation is
//! declared once through a builder - parameters, request body, responses -
//! and compiles into an ordered pipeline of binding stages that run before
//! the handler on every request. Stages validate client input against the
//! declared schemas (422 on failure), negotiate the request content type
//! (415 when undeclared), and scope the pending response descriptors that
//! [`responseify`] consumes when the handler serializes its return value.
//!
//! The same declarations feed OpenAPI Path Item synthesis through
//! [`Resource::registry`].

#![doc(html_root_url = "https://docs.rs/heron-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod binder;
mod body;
mod operation;
mod pipeline;
mod resource;
mod respond;

pub use operation::{Operation, OperationBuilder};
pub use pipeline::{AsyncHandlerFn, Invocation, Outcome, SyncHandlerFn};
pub use resource::{Resource, ResourceBuilder};
pub use respond::{responseify, ResponseFilter};
