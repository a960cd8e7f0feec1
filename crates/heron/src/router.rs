//! The route table tying path templates to resources.

use std::sync::Arc;

use indexmap::IndexMap;

use heron_core::{Error, OpenApiVersion};
use heron_docs::PathItem;
use heron_extract::Resource;
use heron_route::PathTemplate;

/// One registered route.
#[derive(Clone)]
pub struct Route {
    template: PathTemplate,
    router_path: String,
    name: Option<String>,
    resource: Arc<Resource>,
}

impl Route {
    /// The parsed path template.
    #[must_use]
    pub fn template(&self) -> &PathTemplate {
        &self.template
    }

    /// The native radix-router path string, for adapter integration.
    #[must_use]
    pub fn router_path(&self) -> &str {
        &self.router_path
    }

    /// The OpenAPI-rendered path string keying this route in the spec.
    #[must_use]
    pub fn openapi_path(&self) -> String {
        self.template.openapi_path()
    }

    /// The optional route name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The resource handling this route.
    #[must_use]
    pub fn resource(&self) -> &Arc<Resource> {
        &self.resource
    }
}

/// Registers resources under path templates and derives the whole API's
/// paths spec from them.
///
/// Bad templates are rejected at registration time: a path without a
/// leading `/` and a converter tag other than `path` both fail `add`
/// before the route exists, never at request time.
#[derive(Default)]
pub struct ApiRouter {
    routes: Vec<Route>,
}

impl ApiRouter {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a resource under a path template.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] when the template fails to parse or
    /// uses a converter the native rendering does not support.
    pub fn add(&mut self, path: &str, resource: Resource) -> Result<(), Error> {
        self.register(path, resource, None)
    }

    /// Registers a named resource under a path template.
    ///
    /// # Errors
    ///
    /// Same conditions as [`add`](Self::add).
    pub fn add_named(
        &mut self,
        path: &str,
        resource: Resource,
        name: impl Into<String>,
    ) -> Result<(), Error> {
        self.register(path, resource, Some(name.into()))
    }

    fn register(
        &mut self,
        path: &str,
        resource: Resource,
        name: Option<String>,
    ) -> Result<(), Error> {
        let template = PathTemplate::parse(path)?;
        let router_path = template.router_path()?;
        self.routes.push(Route {
            template,
            router_path,
            name,
            resource: Arc::new(resource),
        });
        Ok(())
    }

    /// The registered routes, in registration order.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    /// Derives the Path Item Object for every registered route, keyed by
    /// OpenAPI-rendered path string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOpenApiVersion`] for any version other
    /// than 3.0.x.
    pub fn spec(&self, version: OpenApiVersion) -> Result<IndexMap<String, PathItem>, Error> {
        let mut paths = IndexMap::new();
        for route in &self.routes {
            let item = heron_docs::path_item(&route.resource.registry(), version)?;
            paths.insert(route.openapi_path(), item);
        }
        Ok(paths)
    }
}

impl std::fmt::Debug for ApiRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiRouter")
            .field(
                "routes",
                &self.routes.iter().map(Route::router_path).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heron_extract::Operation;
    use heron_route::TemplateError;
    use http::StatusCode;

    fn resource() -> Resource {
        Resource::builder()
            .get(
                Operation::builder()
                    .json_response(StatusCode::OK, None)
                    .handle(|inv| inv.respond(serde_json::json!(null)))
                    .unwrap(),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_add_rejects_missing_leading_slash() {
        let mut router = ApiRouter::new();
        let err = router.add("users/{uid}", resource()).unwrap_err();
        assert!(matches!(
            err,
            Error::Template(TemplateError::MissingLeadingSlash { .. })
        ));
    }

    #[test]
    fn test_add_rejects_unknown_converter() {
        let mut router = ApiRouter::new();
        let err = router.add("/users/{int:uid}", resource()).unwrap_err();
        assert!(matches!(
            err,
            Error::Template(TemplateError::UnknownConverter { .. })
        ));
        assert_eq!(router.routes().count(), 0);
    }

    #[test]
    fn test_route_table_renderings() {
        let mut router = ApiRouter::new();
        router
            .add_named("/files/{path:file}", resource(), "files")
            .unwrap();

        let route = router.routes().next().unwrap();
        assert_eq!(route.router_path(), "/files/*file");
        assert_eq!(route.openapi_path(), "/files/{file}");
        assert_eq!(route.name(), Some("files"));
    }

    #[test]
    fn test_spec_keyed_by_openapi_path() {
        let mut router = ApiRouter::new();
        router.add("/users/{uid}", resource()).unwrap();

        let paths = router.spec(OpenApiVersion::V3_0).unwrap();
        assert!(paths.contains_key("/users/{uid}"));
        assert!(paths["/users/{uid}"].operation(&http::Method::GET).is_some());
    }
}
