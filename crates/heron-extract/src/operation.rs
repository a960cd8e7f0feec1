//! One HTTP verb's declarations plus its handler.

use std::sync::Arc;

use bytes::Bytes;
use futures_core::future::BoxFuture;
use http::Response;

use heron_core::{
    DefinitionRegistry, Error, MediaType, ParameterDefinition, ParameterLocation, PendingResponse,
    RequestBodyDefinition, ResponseDefinition, Schema,
};
use indexmap::IndexMap;

use crate::pipeline::{Handler, Invocation, Stage};

/// A fully declared operation: the ordered binding stages, the handler,
/// and the definition registry the stages were compiled from.
///
/// Built once at registration time through [`Operation::builder`];
/// immutable and shared across requests afterwards.
pub struct Operation {
    stages: Vec<Stage>,
    handler: Handler,
    registry: DefinitionRegistry,
}

impl Operation {
    /// Starts declaring an operation.
    #[must_use]
    pub fn builder() -> OperationBuilder {
        OperationBuilder {
            registry: DefinitionRegistry::new(),
            stages: Vec::new(),
            error: None,
        }
    }

    pub(crate) fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub(crate) fn handler(&self) -> &Handler {
        &self.handler
    }

    /// The declarations this operation was built from, in declaration
    /// order.
    #[must_use]
    pub fn registry(&self) -> &DefinitionRegistry {
        &self.registry
    }
}

impl std::fmt::Debug for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("stages", &self.stages.len())
            .finish_non_exhaustive()
    }
}

pub(crate) fn descriptors_of(response: &ResponseDefinition) -> Vec<PendingResponse> {
    response
        .content()
        .iter()
        .map(|(media_type, media)| PendingResponse {
            status: response.status(),
            media_type: media_type.clone(),
            media: media.clone(),
        })
        .collect()
}

/// Declares an operation's parameters, body, and responses, in the order
/// they should run, then takes the handler.
///
/// Declaration failures (a duplicate parameter name, an empty body
/// content map) are held until the terminal [`handle`](Self::handle) /
/// [`handle_async`](Self::handle_async) call, so declarations chain
/// without intermediate `?`.
///
/// # Example
///
/// ```rust
/// use heron_core::schema;
/// use heron_extract::Operation;
/// use http::StatusCode;
/// use serde_json::json;
///
/// let operation = Operation::builder()
///     .query("limit", schema::integer())
///     .json_response(StatusCode::OK, None)
///     .handle(|inv| inv.respond(json!({"limit": inv.arg("limit")})))
///     .unwrap();
/// ```
pub struct OperationBuilder {
    registry: DefinitionRegistry,
    stages: Vec<Stage>,
    error: Option<Error>,
}

impl OperationBuilder {
    /// Declares a parameter.
    #[must_use]
    pub fn parameter(mut self, parameter: ParameterDefinition) -> Self {
        if self.error.is_none() {
            match self.registry.push_parameter(parameter.clone()) {
                Ok(()) => self.stages.push(Stage::Parameter(parameter)),
                Err(error) => self.error = Some(error),
            }
        }
        self
    }

    /// Declares a required query parameter.
    #[must_use]
    pub fn query(self, name: impl Into<String>, schema: Arc<dyn Schema>) -> Self {
        self.parameter(ParameterDefinition::new(
            name,
            ParameterLocation::Query,
            schema,
        ))
    }

    /// Declares a required path parameter.
    #[must_use]
    pub fn path(self, name: impl Into<String>, schema: Arc<dyn Schema>) -> Self {
        self.parameter(ParameterDefinition::new(
            name,
            ParameterLocation::Path,
            schema,
        ))
    }

    /// Declares a required header parameter.
    #[must_use]
    pub fn header(self, name: impl Into<String>, schema: Arc<dyn Schema>) -> Self {
        self.parameter(ParameterDefinition::new(
            name,
            ParameterLocation::Header,
            schema,
        ))
    }

    /// Declares a required cookie parameter.
    #[must_use]
    pub fn cookie(self, name: impl Into<String>, schema: Arc<dyn Schema>) -> Self {
        self.parameter(ParameterDefinition::new(
            name,
            ParameterLocation::Cookie,
            schema,
        ))
    }

    /// Declares the request body from a prebuilt definition.
    #[must_use]
    pub fn request_body(mut self, body: RequestBodyDefinition) -> Self {
        if self.error.is_none() {
            self.registry.push_request_body(body.clone());
            self.stages.push(Stage::Body(body));
        }
        self
    }

    /// Declares the request body from a bind-to name and a content map.
    #[must_use]
    pub fn body(
        mut self,
        bind_to: impl Into<String>,
        content: IndexMap<String, MediaType>,
    ) -> Self {
        if self.error.is_none() {
            match RequestBodyDefinition::new(bind_to, content) {
                Ok(body) => return self.request_body(body),
                Err(error) => self.error = Some(error),
            }
        }
        self
    }

    /// Declares a response.
    ///
    /// Each content entry contributes one pending response descriptor
    /// visible to the handler; a content-less response only documents.
    #[must_use]
    pub fn response(mut self, response: ResponseDefinition) -> Self {
        if self.error.is_none() {
            self.registry.push_response(response.clone());
            self.stages.push(Stage::ResponseLayer(descriptors_of(&response)));
        }
        self
    }

    /// Declares an `application/json` response for `status`, validated by
    /// `schema` when one is given.
    #[must_use]
    pub fn json_response(self, status: http::StatusCode, schema: Option<Arc<dyn Schema>>) -> Self {
        let media = match schema {
            Some(schema) => MediaType::of(schema),
            None => MediaType::passthrough(),
        };
        self.response(ResponseDefinition::new(status).media("application/json", media))
    }

    /// Finishes the declaration with a synchronous handler.
    ///
    /// # Errors
    ///
    /// Surfaces the first declaration failure held by the builder.
    pub fn handle(
        self,
        handler: impl Fn(Invocation<'_>) -> Result<Response<Bytes>, Error> + Send + Sync + 'static,
    ) -> Result<Operation, Error> {
        self.finish(Handler::Sync(Arc::new(handler)))
    }

    /// Finishes the declaration with an asynchronous handler.
    ///
    /// # Errors
    ///
    /// Surfaces the first declaration failure held by the builder.
    pub fn handle_async(
        self,
        handler: impl for<'a> Fn(Invocation<'a>) -> BoxFuture<'a, Result<Response<Bytes>, Error>>
            + Send
            + Sync
            + 'static,
    ) -> Result<Operation, Error> {
        self.finish(Handler::Async(Arc::new(handler)))
    }

    fn finish(self, handler: Handler) -> Result<Operation, Error> {
        if let Some(error) = self.error {
            return Err(error);
        }
        Ok(Operation {
            stages: self.stages,
            handler,
            registry: self.registry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heron_core::schema;
    use http::StatusCode;
    use serde_json::json;

    #[test]
    fn test_duplicate_parameter_fails_at_build() {
        let err = Operation::builder()
            .query("a", schema::integer())
            .query("a", schema::string())
            .handle(|_| unreachable!())
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateParameter { name } if name == "a"));
    }

    #[test]
    fn test_empty_body_content_fails_at_build() {
        let err = Operation::builder()
            .body("payload", IndexMap::new())
            .handle(|_| unreachable!())
            .unwrap_err();
        assert!(matches!(err, Error::EmptyBodyContent { bind_to } if bind_to == "payload"));
    }

    #[test]
    fn test_registry_records_declaration_order() {
        let operation = Operation::builder()
            .query("a", schema::integer())
            .json_response(StatusCode::OK, None)
            .handle(|inv| inv.respond(json!(null)))
            .unwrap();

        let names: Vec<_> = operation
            .registry()
            .parameters()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, vec!["a"]);
        assert_eq!(operation.registry().responses().count(), 1);
    }

    #[test]
    fn test_descriptors_follow_content_entries() {
        let response = ResponseDefinition::new(StatusCode::OK)
            .media("application/json", MediaType::passthrough())
            .media("text/plain", MediaType::passthrough());

        let descriptors = descriptors_of(&response);
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].media_type, "application/json");
        assert_eq!(descriptors[1].media_type, "text/plain");
        assert!(descriptors.iter().all(|d| d.status == StatusCode::OK));
    }
}
