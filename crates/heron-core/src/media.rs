//! Media types and OpenAPI version gating.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::error::Error;
use crate::schema::{Schema, ValidationError};

/// A target OpenAPI version for schema compilation.
///
/// Only the major and minor components matter: patch releases of the
/// OpenAPI specification do not change schema-object syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenApiVersion {
    major: u32,
    minor: u32,
}

impl OpenApiVersion {
    /// OpenAPI 3.0, the only version this layer compiles schemas for.
    pub const V3_0: Self = Self { major: 3, minor: 0 };

    /// Parses a `major.minor` or `major.minor.patch` version string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOpenApiVersion`] if the string is not a
    /// dotted sequence of at least two integers.
    pub fn parse(s: &str) -> Result<Self, Error> {
        let invalid = || Error::InvalidOpenApiVersion(s.to_string());

        let mut parts = s.split('.');
        let major = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(invalid)?;
        let minor = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(invalid)?;
        if let Some(patch) = parts.next() {
            if patch.parse::<u32>().is_err() || parts.next().is_some() {
                return Err(invalid());
            }
        }
        Ok(Self { major, minor })
    }

    /// Ensures this version is one the layer can compile schemas for.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOpenApiVersion`] for anything other
    /// than 3.0.x.
    pub fn ensure_supported(self) -> Result<Self, Error> {
        if self == Self::V3_0 {
            Ok(self)
        } else {
            Err(Error::UnsupportedOpenApiVersion(self.to_string()))
        }
    }
}

impl fmt::Display for OpenApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for OpenApiVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Default for OpenApiVersion {
    fn default() -> Self {
        Self::V3_0
    }
}

/// A media-type declaration: an optional schema under one content type.
///
/// With no schema attached, validation is a passthrough and the compiled
/// media-type object is empty. With a schema, `parse` delegates to it and
/// the compiled object carries the schema fragment.
#[derive(Clone, Default)]
pub struct MediaType {
    schema: Option<Arc<dyn Schema>>,
}

impl MediaType {
    /// A media type with no schema; values pass through unvalidated.
    #[must_use]
    pub fn passthrough() -> Self {
        Self { schema: None }
    }

    /// A media type validated by `schema`.
    #[must_use]
    pub fn of(schema: Arc<dyn Schema>) -> Self {
        Self {
            schema: Some(schema),
        }
    }

    /// Returns the attached schema, if any.
    #[must_use]
    pub fn schema(&self) -> Option<&Arc<dyn Schema>> {
        self.schema.as_ref()
    }

    /// Validates `value` against the attached schema, or passes it through.
    ///
    /// # Errors
    ///
    /// Returns the schema's [`ValidationError`] when validation fails.
    pub fn parse(&self, value: Value) -> Result<Value, ValidationError> {
        match &self.schema {
            Some(schema) => schema.parse(value),
            None => Ok(value),
        }
    }

    /// Compiles the OpenAPI media-type object for `version`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOpenApiVersion`] when `version` is not
    /// 3.0.x.
    pub fn to_spec(&self, version: OpenApiVersion) -> Result<Value, Error> {
        version.ensure_supported()?;
        Ok(match &self.schema {
            Some(schema) => json!({"schema": schema.to_openapi()}),
            None => json!({}),
        })
    }
}

impl fmt::Debug for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaType")
            .field("schema", &self.schema.as_ref().map(|_| "<schema>"))
            .finish()
    }
}
