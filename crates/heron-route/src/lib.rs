//! # Heron Route
//!
//! Path templates and path-capture storage for the Heron declarative
//! routing layer.
//!
//! This crate knows how to *translate* templated paths, not how to match
//! them: [`PathTemplate`] parses `{name}` / `{converter:name}` syntax once
//! at registration time and renders the OpenAPI-style and native-router
//! path strings from the same parse. [`Params`] stores the raw variable
//! values a host router captured for a single request.

#![doc(html_root_url = "https://docs.rs/heron-route/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod params;
mod template;

pub use params::Params;
pub use template::{PathTemplate, Segment};

use thiserror::Error;

/// Errors produced while parsing or rendering a path template.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The template did not start with `/`.
    #[error("path must start with '/': {path:?}")]
    MissingLeadingSlash {
        /// The offending template string.
        path: String,
    },

    /// A variable segment had an empty name or converter tag.
    #[error("invalid variable segment {segment:?}")]
    EmptyVariable {
        /// The offending segment text.
        segment: String,
    },

    /// A converter tag the native-router rendering does not understand.
    #[error("unknown path converter {converter:?} on variable {variable:?} (only 'path' is supported)")]
    UnknownConverter {
        /// The unrecognized converter tag.
        converter: String,
        /// The variable the tag was attached to.
        variable: String,
    },
}
