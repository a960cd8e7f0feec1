//! # Heron Docs
//!
//! OpenAPI 3.0 Path Item synthesis.
//!
//! [`path_item`] re-derives the Path Item Object for a resource from the
//! same [`ResourceRegistry`] its binding pipeline was compiled from, so
//! routes and documentation cannot drift apart. Synthesis is a pure read
//! of the registry: calling it twice yields identical output.

#![doc(html_root_url = "https://docs.rs/heron-docs/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use http::Method;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use heron_core::{Definition, Error, OpenApiVersion, ResourceRegistry};

/// One verb's entry in a Path Item Object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OperationItem {
    /// The verb's `parameters` array.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Value>,

    /// The verb's `requestBody` object, if a body is declared.
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,

    /// The verb's `responses` map, keyed by status code.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub responses: IndexMap<String, Value>,
}

/// An OpenAPI 3.0 Path Item Object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PathItem {
    /// Parameters shared by every operation on the path.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Value>,

    /// Per-verb operations, keyed by lowercase verb name.
    #[serde(flatten)]
    pub operations: IndexMap<String, OperationItem>,
}

impl PathItem {
    /// Looks up the entry for a verb.
    #[must_use]
    pub fn operation(&self, method: &Method) -> Option<&OperationItem> {
        self.operations.get(&method.as_str().to_ascii_lowercase())
    }
}

/// Verbs are emitted in this fixed order; two registration orders of the
/// same operations synthesize identical Path Items.
const VERB_ORDER: [Method; 8] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::HEAD,
    Method::OPTIONS,
    Method::TRACE,
];

fn verb_rank(method: &Method) -> usize {
    VERB_ORDER
        .iter()
        .position(|m| m == method)
        .unwrap_or(VERB_ORDER.len())
}

/// Synthesizes the Path Item Object for a resource's declarations.
///
/// Shared parameters become Path-Item-level `parameters`; the remaining
/// shared definitions are replayed before each verb's own, so a shared
/// response appears under every verb. Verbs appear in a fixed canonical
/// order (get, post, put, delete, patch, head, options, trace) regardless
/// of registration order. Within one verb, parameters append in
/// declaration order, while `responses` entries and `requestBody` let the
/// last declaration for a status (or for the body) win.
///
/// # Errors
///
/// Returns [`Error::UnsupportedOpenApiVersion`] for any version other
/// than 3.0.x.
pub fn path_item(registry: &ResourceRegistry, version: OpenApiVersion) -> Result<PathItem, Error> {
    version.ensure_supported()?;

    let mut item = PathItem::default();
    let mut replayed = Vec::new();
    for definition in registry.shared() {
        match definition {
            Definition::Parameter(parameter) => item.parameters.push(parameter.to_spec(version)?),
            other => replayed.push(other),
        }
    }

    let mut verbs: Vec<_> = registry.verbs().collect();
    verbs.sort_by_key(|(method, _)| verb_rank(method));
    for (method, definitions) in verbs {
        let mut operation = OperationItem::default();
        for definition in replayed.iter().copied().chain(definitions) {
            match definition {
                Definition::Parameter(parameter) => {
                    operation.parameters.push(parameter.to_spec(version)?);
                }
                Definition::Response(response) => {
                    operation.responses.insert(
                        response.status().as_u16().to_string(),
                        response.to_spec(version)?,
                    );
                }
                Definition::RequestBody(body) => {
                    operation.request_body = Some(body.to_spec(version)?);
                }
            }
        }
        item.operations
            .insert(method.as_str().to_ascii_lowercase(), operation);
    }
    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use heron_core::schema;
    use heron_core::{
        DefinitionRegistry, MediaType, ParameterDefinition, ParameterLocation,
        RequestBodyDefinition, ResponseDefinition,
    };
    use http::StatusCode;
    use serde_json::json;

    fn registry() -> ResourceRegistry {
        let mut shared = DefinitionRegistry::new();
        shared
            .push_parameter(ParameterDefinition::new(
                "tenant",
                ParameterLocation::Header,
                schema::string(),
            ))
            .unwrap();
        shared.push_response(
            ResponseDefinition::new(StatusCode::UNPROCESSABLE_ENTITY)
                .media("application/json", MediaType::passthrough()),
        );

        let mut get = DefinitionRegistry::new();
        get.push_parameter(ParameterDefinition::new(
            "limit",
            ParameterLocation::Query,
            schema::integer(),
        ))
        .unwrap();
        get.push_response(
            ResponseDefinition::new(StatusCode::OK)
                .media("application/json", MediaType::of(schema::integer())),
        );

        let mut post = DefinitionRegistry::new();
        let mut content = IndexMap::new();
        content.insert(
            "application/json".to_string(),
            MediaType::of(schema::integer()),
        );
        post.push_request_body(RequestBodyDefinition::new("body", content).unwrap());
        post.push_response(ResponseDefinition::new(StatusCode::CREATED));

        let mut verbs = IndexMap::new();
        verbs.insert(Method::GET, get);
        verbs.insert(Method::POST, post);
        ResourceRegistry::with_parts(shared, verbs)
    }

    #[test]
    fn test_shared_parameters_lift_to_path_item() {
        let item = path_item(&registry(), OpenApiVersion::V3_0).unwrap();
        assert_eq!(item.parameters.len(), 1);
        assert_eq!(item.parameters[0]["name"], json!("tenant"));
        assert_eq!(item.parameters[0]["in"], json!("header"));
    }

    #[test]
    fn test_shared_responses_replay_into_every_verb() {
        let item = path_item(&registry(), OpenApiVersion::V3_0).unwrap();
        for method in [Method::GET, Method::POST] {
            let operation = item.operation(&method).unwrap();
            assert!(operation.responses.contains_key("422"), "{method} lacks 422");
        }
    }

    #[test]
    fn test_verb_entries() {
        let item = path_item(&registry(), OpenApiVersion::V3_0).unwrap();

        let get = item.operation(&Method::GET).unwrap();
        assert_eq!(get.parameters[0]["name"], json!("limit"));
        assert!(get.responses.contains_key("200"));
        assert!(get.request_body.is_none());

        let post = item.operation(&Method::POST).unwrap();
        let body = post.request_body.as_ref().unwrap();
        assert_eq!(
            body["content"]["application/json"]["schema"],
            json!({"type": "integer"})
        );
        assert_eq!(post.responses["201"], json!({"description": "Created"}));
    }

    #[test]
    fn test_duplicate_status_last_wins() {
        let mut get = DefinitionRegistry::new();
        get.push_response(ResponseDefinition::new(StatusCode::OK).describe("first"));
        get.push_response(ResponseDefinition::new(StatusCode::OK).describe("second"));

        let mut verbs = IndexMap::new();
        verbs.insert(Method::GET, get);
        let registry = ResourceRegistry::with_parts(DefinitionRegistry::new(), verbs);

        let item = path_item(&registry, OpenApiVersion::V3_0).unwrap();
        assert_eq!(
            item.operation(&Method::GET).unwrap().responses["200"],
            json!({"description": "second"})
        );
    }

    #[test]
    fn test_verbs_emitted_in_canonical_order() {
        let operation = || {
            let mut defs = DefinitionRegistry::new();
            defs.push_response(ResponseDefinition::new(StatusCode::OK));
            defs
        };

        let mut forward = IndexMap::new();
        forward.insert(Method::GET, operation());
        forward.insert(Method::DELETE, operation());
        forward.insert(Method::POST, operation());
        let mut reversed = IndexMap::new();
        reversed.insert(Method::POST, operation());
        reversed.insert(Method::DELETE, operation());
        reversed.insert(Method::GET, operation());

        let first = path_item(
            &ResourceRegistry::with_parts(DefinitionRegistry::new(), forward),
            OpenApiVersion::V3_0,
        )
        .unwrap();
        let second = path_item(
            &ResourceRegistry::with_parts(DefinitionRegistry::new(), reversed),
            OpenApiVersion::V3_0,
        )
        .unwrap();

        let keys: Vec<_> = first.operations.keys().cloned().collect();
        assert_eq!(keys, vec!["get", "post", "delete"]);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_synthesis_is_idempotent() {
        let registry = registry();
        let first = path_item(&registry, OpenApiVersion::V3_0).unwrap();
        let second = path_item(&registry, OpenApiVersion::V3_0).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let version = OpenApiVersion::parse("3.1").unwrap();
        let err = path_item(&registry(), version).unwrap_err();
        assert!(matches!(err, Error::UnsupportedOpenApiVersion(_)));
    }

    #[test]
    fn test_serialized_shape() {
        let item = path_item(&registry(), OpenApiVersion::V3_0).unwrap();
        let value = serde_json::to_value(&item).unwrap();

        assert!(value.get("parameters").is_some());
        assert!(value.get("get").is_some());
        assert!(value.get("post").is_some());
        assert!(value["get"].get("requestBody").is_none());
    }
}
