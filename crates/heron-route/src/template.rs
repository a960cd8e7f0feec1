//! Templated URL paths.
//!
//! A [`PathTemplate`] is a parsed URL pattern made of literal segments and
//! variable segments. It is created once at route-registration time and
//! only ever rendered, never matched: actual path matching stays with the
//! host framework's router.

use std::fmt;

use crate::TemplateError;

/// One segment of a parsed path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal path text (may be empty for a trailing slash).
    Literal(String),
    /// A variable segment, optionally tagged with a converter.
    Variable {
        /// Converter tag (`{path:file}` has converter `path`), if any.
        converter: Option<String>,
        /// The variable name.
        name: String,
    },
}

/// A parsed, renderable URL template.
///
/// Templates use `{name}` or `{converter:name}` variable syntax. The only
/// converter this crate understands is `path`, which permits embedded
/// separators when rendered for a native router; other converter tags are
/// carried through for adapters to interpret and are rejected by
/// [`PathTemplate::router_path`].
///
/// # Example
///
/// ```rust
/// use heron_route::PathTemplate;
///
/// let template = PathTemplate::parse("/users/{uid}").unwrap();
/// assert_eq!(template.openapi_path(), "/users/{uid}");
/// assert_eq!(template.router_path().unwrap(), "/users/{uid}");
///
/// let files = PathTemplate::parse("/files/{path:file}").unwrap();
/// assert_eq!(files.openapi_path(), "/files/{file}");
/// assert_eq!(files.router_path().unwrap(), "/files/*file");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Parses a templated path string.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::MissingLeadingSlash`] if the path does not
    /// start with `/`, or [`TemplateError::EmptyVariable`] for a `{}` or
    /// `{conv:}` segment.
    pub fn parse(path: &str) -> Result<Self, TemplateError> {
        let Some(rest) = path.strip_prefix('/') else {
            return Err(TemplateError::MissingLeadingSlash {
                path: path.to_string(),
            });
        };

        let mut segments = Vec::new();
        for part in rest.split('/') {
            segments.push(Self::parse_segment(part)?);
        }
        Ok(Self { segments })
    }

    fn parse_segment(part: &str) -> Result<Segment, TemplateError> {
        let Some(inner) = part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) else {
            return Ok(Segment::Literal(part.to_string()));
        };

        let (converter, name) = match inner.split_once(':') {
            Some((converter, name)) => (Some(converter.to_string()), name),
            None => (None, inner),
        };
        if name.is_empty() || converter.as_deref() == Some("") {
            return Err(TemplateError::EmptyVariable {
                segment: part.to_string(),
            });
        }
        Ok(Segment::Variable {
            converter,
            name: name.to_string(),
        })
    }

    /// Returns the parsed segments in order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the names of the variable segments in order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Literal(_) => None,
            Segment::Variable { name, .. } => Some(name.as_str()),
        })
    }

    /// Renders the OpenAPI-style path string (`{var}` syntax).
    ///
    /// Converter tags are dropped: `/files/{path:file}` renders as
    /// `/files/{file}`.
    #[must_use]
    pub fn openapi_path(&self) -> String {
        self.render(|_, name| Ok::<_, TemplateError>(format!("{{{name}}}")))
            .expect("openapi rendering accepts every converter")
    }

    /// Renders the native radix-router path string.
    ///
    /// Plain variables render as `{var}`. The `path` converter renders as a
    /// catch-all `*var` segment, which permits embedded separators.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::UnknownConverter`] for any converter tag
    /// other than `path`.
    pub fn router_path(&self) -> Result<String, TemplateError> {
        self.render(|converter, name| match converter {
            None => Ok(format!("{{{name}}}")),
            Some("path") => Ok(format!("*{name}")),
            Some(other) => Err(TemplateError::UnknownConverter {
                converter: other.to_string(),
                variable: name.to_string(),
            }),
        })
    }

    fn render<E>(
        &self,
        mut variable: impl FnMut(Option<&str>, &str) -> Result<String, E>,
    ) -> Result<String, E> {
        let mut parts = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => parts.push(text.clone()),
                Segment::Variable { converter, name } => {
                    parts.push(variable(converter.as_deref(), name)?);
                }
            }
        }
        Ok(format!("/{}", parts.join("/")))
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.openapi_path())
    }
}
