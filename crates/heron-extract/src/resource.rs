//! A resource: one operation per HTTP verb plus a shared layer.

use std::sync::Arc;

use bytes::Bytes;
use http::{Method, Response, StatusCode};
use indexmap::IndexMap;

use heron_core::{
    DefinitionRegistry, Error, MediaType, ParameterDefinition, ParameterLocation,
    ProcessorRegistry, RequestBodyDefinition, RequestContext, ResourceRegistry,
    ResponseDefinition, Schema,
};

use crate::operation::{descriptors_of, Operation};
use crate::pipeline::{run_async, run_sync, Stage};

fn method_not_allowed() -> Response<Bytes> {
    Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .body(Bytes::new())
        .expect("Failed to build response")
}

/// A registered resource.
///
/// Holds an explicit verb → operation map built once at registration
/// time; a request whose verb has no entry gets a 405 without touching
/// any binding stage. The shared layer's stages run outside every
/// operation's own stages, so shared response descriptors sit below
/// operation-level ones on the pending stack.
pub struct Resource {
    shared_stages: Vec<Stage>,
    shared_registry: DefinitionRegistry,
    operations: IndexMap<Method, Operation>,
}

impl Resource {
    /// Starts declaring a resource.
    #[must_use]
    pub fn builder() -> ResourceBuilder {
        ResourceBuilder {
            shared_stages: Vec::new(),
            shared_registry: DefinitionRegistry::new(),
            operations: IndexMap::new(),
            error: None,
        }
    }

    /// Runs one request through the shared and operation stages
    /// synchronously.
    ///
    /// # Errors
    ///
    /// Declaration bugs surfaced by a stage, `responseify`, or an async
    /// handler on this path.
    pub fn dispatch(
        &self,
        ctx: &mut RequestContext,
        processors: &ProcessorRegistry,
    ) -> Result<Response<Bytes>, Error> {
        let Some(operation) = self.operations.get(ctx.method()) else {
            tracing::debug!(method = %ctx.method(), "method not implemented on resource");
            return Ok(method_not_allowed());
        };
        let stages: Vec<&Stage> = self
            .shared_stages
            .iter()
            .chain(operation.stages().iter())
            .collect();
        run_sync(&stages, ctx, processors, operation.handler())
    }

    /// Runs one request through the pipeline, awaiting the body processor
    /// and the handler. Stage-for-stage identical to [`dispatch`](Self::dispatch).
    ///
    /// # Errors
    ///
    /// Declaration bugs surfaced by a stage or `responseify`.
    pub async fn dispatch_async(
        &self,
        ctx: &mut RequestContext,
        processors: &ProcessorRegistry,
    ) -> Result<Response<Bytes>, Error> {
        let Some(operation) = self.operations.get(ctx.method()) else {
            tracing::debug!(method = %ctx.method(), "method not implemented on resource");
            return Ok(method_not_allowed());
        };
        let stages: Vec<&Stage> = self
            .shared_stages
            .iter()
            .chain(operation.stages().iter())
            .collect();
        run_async(&stages, ctx, processors, operation.handler()).await
    }

    /// The implemented verbs, in registration order.
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.operations.keys()
    }

    /// Snapshots the declarations for spec synthesis.
    #[must_use]
    pub fn registry(&self) -> ResourceRegistry {
        let verbs = self
            .operations
            .iter()
            .map(|(method, operation)| (method.clone(), operation.registry().clone()))
            .collect();
        ResourceRegistry::with_parts(self.shared_registry.clone(), verbs)
    }
}

impl std::fmt::Debug for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("methods", &self.operations.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Declares a resource's shared layer and its per-verb operations.
///
/// Shared declarations (parameters, a body, responses) apply to every
/// verb: they run first at request time and contribute to every verb in
/// the synthesized spec. Like [`OperationBuilder`](crate::OperationBuilder),
/// declaration failures are held until [`build`](Self::build).
pub struct ResourceBuilder {
    shared_stages: Vec<Stage>,
    shared_registry: DefinitionRegistry,
    operations: IndexMap<Method, Operation>,
    error: Option<Error>,
}

impl ResourceBuilder {
    /// Declares a shared parameter.
    #[must_use]
    pub fn parameter(mut self, parameter: ParameterDefinition) -> Self {
        if self.error.is_none() {
            match self.shared_registry.push_parameter(parameter.clone()) {
                Ok(()) => self.shared_stages.push(Stage::Parameter(parameter)),
                Err(error) => self.error = Some(error),
            }
        }
        self
    }

    /// Declares a shared required query parameter.
    #[must_use]
    pub fn query(self, name: impl Into<String>, schema: Arc<dyn Schema>) -> Self {
        self.parameter(ParameterDefinition::new(
            name,
            ParameterLocation::Query,
            schema,
        ))
    }

    /// Declares a shared required path parameter.
    #[must_use]
    pub fn path(self, name: impl Into<String>, schema: Arc<dyn Schema>) -> Self {
        self.parameter(ParameterDefinition::new(
            name,
            ParameterLocation::Path,
            schema,
        ))
    }

    /// Declares a shared required header parameter.
    #[must_use]
    pub fn header(self, name: impl Into<String>, schema: Arc<dyn Schema>) -> Self {
        self.parameter(ParameterDefinition::new(
            name,
            ParameterLocation::Header,
            schema,
        ))
    }

    /// Declares a shared required cookie parameter.
    #[must_use]
    pub fn cookie(self, name: impl Into<String>, schema: Arc<dyn Schema>) -> Self {
        self.parameter(ParameterDefinition::new(
            name,
            ParameterLocation::Cookie,
            schema,
        ))
    }

    /// Declares a shared request body.
    #[must_use]
    pub fn request_body(mut self, body: RequestBodyDefinition) -> Self {
        if self.error.is_none() {
            self.shared_registry.push_request_body(body.clone());
            self.shared_stages.push(Stage::Body(body));
        }
        self
    }

    /// Declares a shared request body from a bind-to name and content
    /// map.
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

    /// Declares a shared response, visible to every verb's handler and
    /// replayed into every verb's spec.
    #[must_use]
    pub fn response(mut self, response: ResponseDefinition) -> Self {
        if self.error.is_none() {
            self.shared_registry.push_response(response.clone());
            self.shared_stages
                .push(Stage::ResponseLayer(descriptors_of(&response)));
        }
        self
    }

    /// Registers the operation for an arbitrary verb.
    #[must_use]
    pub fn operation(mut self, method: Method, operation: Operation) -> Self {
        self.operations.insert(method, operation);
        self
    }

    /// Registers the GET operation.
    #[must_use]
    pub fn get(self, operation: Operation) -> Self {
        self.operation(Method::GET, operation)
    }

    /// Registers the POST operation.
    #[must_use]
    pub fn post(self, operation: Operation) -> Self {
        self.operation(Method::POST, operation)
    }

    /// Registers the PUT operation.
    #[must_use]
    pub fn put(self, operation: Operation) -> Self {
        self.operation(Method::PUT, operation)
    }

    /// Registers the DELETE operation.
    #[must_use]
    pub fn delete(self, operation: Operation) -> Self {
        self.operation(Method::DELETE, operation)
    }

    /// Registers the PATCH operation.
    #[must_use]
    pub fn patch(self, operation: Operation) -> Self {
        self.operation(Method::PATCH, operation)
    }

    /// Registers the HEAD operation.
    #[must_use]
    pub fn head(self, operation: Operation) -> Self {
        self.operation(Method::HEAD, operation)
    }

    /// Registers the OPTIONS operation.
    #[must_use]
    pub fn options(self, operation: Operation) -> Self {
        self.operation(Method::OPTIONS, operation)
    }

    /// Registers the TRACE operation.
    #[must_use]
    pub fn trace(self, operation: Operation) -> Self {
        self.operation(Method::TRACE, operation)
    }

    /// Finishes the resource.
    ///
    /// # Errors
    ///
    /// Surfaces the first shared-declaration failure held by the builder.
    pub fn build(self) -> Result<Resource, Error> {
        if let Some(error) = self.error {
            return Err(error);
        }
        Ok(Resource {
            shared_stages: self.shared_stages,
            shared_registry: self.shared_registry,
            operations: self.operations,
        })
    }
}
