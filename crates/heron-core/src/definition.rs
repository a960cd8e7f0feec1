//! Route declarations and their registries.
//!
//! A [`Definition`] is one declared fact about an operation: a request
//! parameter, a request body, or a response. Definitions are created once
//! at registration time, collected in declaration order into a
//! [`DefinitionRegistry`], and reused for every request. The same
//! definitions later drive OpenAPI Path Item synthesis, which is what
//! keeps routes and documentation from drifting apart.

use std::fmt;
use std::sync::Arc;

use http::{Method, StatusCode};
use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use crate::error::Error;
use crate::media::{MediaType, OpenApiVersion};
use crate::schema::{Schema, SchemaKind, ValidationError};

/// Where a declared request parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterLocation {
    /// The decoded query string.
    Query,
    /// Variables captured from the matched path.
    Path,
    /// Request headers.
    Header,
    /// Request cookies.
    Cookie,
}

impl ParameterLocation {
    /// The OpenAPI `in` value and 422-body `in` value for this location.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Path => "path",
            Self::Header => "header",
            Self::Cookie => "cookie",
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared request parameter.
#[derive(Clone)]
pub struct ParameterDefinition {
    name: String,
    location: ParameterLocation,
    schema: Arc<dyn Schema>,
    required: bool,
    description: Option<String>,
}

impl ParameterDefinition {
    /// Declares a required parameter read from `location`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        location: ParameterLocation,
        schema: Arc<dyn Schema>,
    ) -> Self {
        Self {
            name: name.into(),
            location,
            schema,
            required: true,
            description: None,
        }
    }

    /// Marks the parameter optional: an absent value binds nothing and
    /// raises nothing.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Attaches a description for the compiled parameter object.
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The declared name the validated value binds under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The location this parameter is read from.
    #[must_use]
    pub fn location(&self) -> ParameterLocation {
        self.location
    }

    /// Whether an absent value is a validation failure.
    #[must_use]
    pub fn required(&self) -> bool {
        self.required
    }

    /// Validates this parameter against a location's argument set.
    ///
    /// A structured schema consumes the entire argument set as one
    /// composite payload; a scalar schema reads the single value under the
    /// declared name. Returns `Ok(None)` when an optional parameter is
    /// absent. Every issue location is prefixed with the declared name.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the value is absent but
    /// required, or fails the schema.
    pub fn bind(&self, argumentset: &Map<String, Value>) -> Result<Option<Value>, ValidationError> {
        if self.schema.kind() == SchemaKind::Structured {
            return match self.schema.parse(Value::Object(argumentset.clone())) {
                Ok(value) => Ok(Some(value)),
                Err(e) => Err(e.prefixed(&self.name)),
            };
        }

        match argumentset.get(&self.name) {
            Some(raw) => match self.schema.parse(raw.clone()) {
                Ok(value) => Ok(Some(value)),
                Err(e) => Err(e.prefixed(&self.name)),
            },
            None if self.required => {
                Err(ValidationError::message("This field is required").prefixed(&self.name))
            }
            None => Ok(None),
        }
    }

    /// Compiles the OpenAPI parameter object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOpenApiVersion`] when `version` is not
    /// 3.0.x.
    pub fn to_spec(&self, version: OpenApiVersion) -> Result<Value, Error> {
        version.ensure_supported()?;
        let mut spec = json!({
            "name": self.name,
            "in": self.location.as_str(),
            "schema": self.schema.to_openapi(),
        });
        if self.required {
            spec["required"] = json!(true);
        }
        if let Some(description) = &self.description {
            spec["description"] = json!(description);
        }
        Ok(spec)
    }
}

impl fmt::Debug for ParameterDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterDefinition")
            .field("name", &self.name)
            .field("location", &self.location)
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

/// A declared request body: a bind-to name plus a content map.
#[derive(Clone)]
pub struct RequestBodyDefinition {
    bind_to: String,
    content: IndexMap<String, MediaType>,
    required: bool,
    description: Option<String>,
}

impl RequestBodyDefinition {
    /// Declares a required request body bound under `bind_to`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyBodyContent`] when `content` declares no
    /// media types; a body that accepts nothing rejects every request.
    pub fn new(
        bind_to: impl Into<String>,
        content: IndexMap<String, MediaType>,
    ) -> Result<Self, Error> {
        let bind_to = bind_to.into();
        if content.is_empty() {
            return Err(Error::EmptyBodyContent { bind_to });
        }
        Ok(Self {
            bind_to,
            content,
            required: true,
            description: None,
        })
    }

    /// Marks the body optional in the compiled spec.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Attaches a description for the compiled request-body object.
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The name the deserialized body binds under.
    #[must_use]
    pub fn bind_to(&self) -> &str {
        &self.bind_to
    }

    /// Looks up the declared [`MediaType`] for a request media type.
    ///
    /// `None` is the 415 condition.
    #[must_use]
    pub fn media(&self, media_type: &str) -> Option<&MediaType> {
        self.content.get(media_type)
    }

    /// Compiles the OpenAPI request-body object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOpenApiVersion`] when `version` is not
    /// 3.0.x.
    pub fn to_spec(&self, version: OpenApiVersion) -> Result<Value, Error> {
        let mut content = Map::new();
        for (media_type, media) in &self.content {
            content.insert(media_type.clone(), media.to_spec(version)?);
        }

        let mut spec = json!({"content": content});
        if let Some(description) = &self.description {
            spec["description"] = json!(description);
        }
        if self.required {
            spec["required"] = json!(true);
        }
        Ok(spec)
    }
}

impl fmt::Debug for RequestBodyDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBodyDefinition")
            .field("bind_to", &self.bind_to)
            .field("media_types", &self.content.keys().collect::<Vec<_>>())
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

/// One declared response: a status plus an optional content map.
///
/// Each content entry also contributes one pending response descriptor at
/// request time; a content-less response is documentation only.
#[derive(Clone)]
pub struct ResponseDefinition {
    status: StatusCode,
    content: IndexMap<String, MediaType>,
    description: Option<String>,
}

impl ResponseDefinition {
    /// Declares a content-less response for `status`.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            content: IndexMap::new(),
            description: None,
        }
    }

    /// Attaches the content map.
    #[must_use]
    pub fn with_content(mut self, content: IndexMap<String, MediaType>) -> Self {
        self.content = content;
        self
    }

    /// Attaches a single media-type entry.
    #[must_use]
    pub fn media(mut self, media_type: impl Into<String>, media: MediaType) -> Self {
        self.content.insert(media_type.into(), media);
        self
    }

    /// Attaches a description; the compiled spec otherwise falls back to
    /// the status's canonical reason phrase.
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The declared status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The declared content map, in declaration order.
    #[must_use]
    pub fn content(&self) -> &IndexMap<String, MediaType> {
        &self.content
    }

    /// Compiles the OpenAPI response object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOpenApiVersion`] when `version` is not
    /// 3.0.x.
    pub fn to_spec(&self, version: OpenApiVersion) -> Result<Value, Error> {
        let description = match &self.description {
            Some(description) => description.as_str(),
            None => self.status.canonical_reason().unwrap_or("Response"),
        };

        let mut spec = json!({"description": description});
        if !self.content.is_empty() {
            let mut content = Map::new();
            for (media_type, media) in &self.content {
                content.insert(media_type.clone(), media.to_spec(version)?);
            }
            spec["content"] = Value::Object(content);
        }
        Ok(spec)
    }
}

impl fmt::Debug for ResponseDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseDefinition")
            .field("status", &self.status)
            .field("media_types", &self.content.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// The closed set of declaration kinds.
#[derive(Debug, Clone)]
pub enum Definition {
    /// A declared request parameter.
    Parameter(ParameterDefinition),
    /// A declared request body.
    RequestBody(RequestBodyDefinition),
    /// A declared response.
    Response(ResponseDefinition),
}

/// The declarations of one operation (or of a resource's shared layer),
/// in declaration order.
#[derive(Debug, Clone, Default)]
pub struct DefinitionRegistry {
    definitions: Vec<Definition>,
}

impl DefinitionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a parameter declaration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateParameter`] when the registry already
    /// holds a parameter with the same name; redeclaring a name would
    /// silently shadow the earlier binding at request time.
    pub fn push_parameter(&mut self, parameter: ParameterDefinition) -> Result<(), Error> {
        let duplicate = self.parameters().any(|p| p.name() == parameter.name());
        if duplicate {
            return Err(Error::DuplicateParameter {
                name: parameter.name().to_string(),
            });
        }
        self.definitions.push(Definition::Parameter(parameter));
        Ok(())
    }

    /// Records a request-body declaration.
    pub fn push_request_body(&mut self, body: RequestBodyDefinition) {
        self.definitions.push(Definition::RequestBody(body));
    }

    /// Records a response declaration.
    pub fn push_response(&mut self, response: ResponseDefinition) {
        self.definitions.push(Definition::Response(response));
    }

    /// Iterates every definition in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Definition> {
        self.definitions.iter()
    }

    /// Iterates the parameter definitions in declaration order.
    pub fn parameters(&self) -> impl Iterator<Item = &ParameterDefinition> {
        self.definitions.iter().filter_map(|d| match d {
            Definition::Parameter(p) => Some(p),
            _ => None,
        })
    }

    /// Iterates the response definitions in declaration order.
    pub fn responses(&self) -> impl Iterator<Item = &ResponseDefinition> {
        self.definitions.iter().filter_map(|d| match d {
            Definition::Response(r) => Some(r),
            _ => None,
        })
    }

    /// Returns whether the registry holds no definitions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl<'a> IntoIterator for &'a DefinitionRegistry {
    type Item = &'a Definition;
    type IntoIter = std::slice::Iter<'a, Definition>;

    fn into_iter(self) -> Self::IntoIter {
        self.definitions.iter()
    }
}

/// The declarations of a whole resource: the shared (dispatch-level)
/// registry plus one registry per implemented verb, in registration order.
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    shared: DefinitionRegistry,
    verbs: IndexMap<Method, DefinitionRegistry>,
}

impl ResourceRegistry {
    /// Creates a registry with no shared definitions and no verbs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry from a shared layer and per-verb registries.
    #[must_use]
    pub fn with_parts(
        shared: DefinitionRegistry,
        verbs: IndexMap<Method, DefinitionRegistry>,
    ) -> Self {
        Self { shared, verbs }
    }

    /// The shared (dispatch-level) registry.
    #[must_use]
    pub fn shared(&self) -> &DefinitionRegistry {
        &self.shared
    }

    /// Iterates implemented verbs with their registries, in registration
    /// order.
    pub fn verbs(&self) -> impl Iterator<Item = (&Method, &DefinitionRegistry)> {
        self.verbs.iter()
    }
}
