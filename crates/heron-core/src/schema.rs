//! Schema capability and reference schemas.
//!
//! The routing layer treats validation as an opaque capability: anything
//! implementing [`Schema`] can parse a value (returning the validated,
//! possibly transformed value or a [`ValidationError`]) and compile itself
//! to an OpenAPI 3.0 schema fragment.
//!
//! The reference implementations in this module cover the scalar and
//! structured shapes request parameters and bodies actually take. Scalar
//! schemas coerce from strings, since query strings, headers, cookies, and
//! path captures always arrive as text.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};

/// Distinguishes scalar schemas from structured (object-shaped) ones.
///
/// A structured schema declared on a request parameter consumes the whole
/// argument set as one composite payload instead of a single named value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    /// Validates one value.
    Scalar,
    /// Validates an object of named fields.
    Structured,
}

/// A validation schema.
///
/// `parse` either returns the validated value (possibly coerced, e.g. the
/// string `"5"` through an integer schema becomes the number `5`) or a
/// [`ValidationError`] describing every failing location.
pub trait Schema: Send + Sync {
    /// Validates `value`, returning the validated value.
    fn parse(&self, value: Value) -> Result<Value, ValidationError>;

    /// Compiles this schema to an OpenAPI 3.0 schema fragment.
    fn to_openapi(&self) -> Value;

    /// Returns whether this schema is scalar or structured.
    fn kind(&self) -> SchemaKind {
        SchemaKind::Scalar
    }
}

/// One segment of a validation error location path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocSegment {
    /// An object field name.
    Key(String),
    /// A list index.
    Index(usize),
}

impl Serialize for LocSegment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Key(key) => serializer.serialize_str(key),
            Self::Index(index) => serializer.serialize_u64(*index as u64),
        }
    }
}

impl fmt::Display for LocSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// One failing location with its messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    /// Path segments from the validated root to the failing value.
    pub loc: Vec<LocSegment>,
    /// Human-readable failure messages for that location.
    pub msgs: Vec<String>,
}

/// A client-input validation failure.
///
/// Collects every failing location of one `parse` call. This is a value,
/// not a pipeline error: the binding stages convert it into a 422 response
/// with body `{"in": <location>, "errors": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    issues: Vec<Issue>,
}

impl ValidationError {
    /// Creates an error with a single message at the root location.
    #[must_use]
    pub fn message(msg: impl Into<String>) -> Self {
        Self {
            issues: vec![Issue {
                loc: Vec::new(),
                msgs: vec![msg.into()],
            }],
        }
    }

    /// Creates an error from pre-built issues.
    #[must_use]
    pub fn from_issues(issues: Vec<Issue>) -> Self {
        Self { issues }
    }

    /// Returns the collected issues.
    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Returns this error with `key` prepended to every issue location.
    #[must_use]
    pub fn prefixed(mut self, key: impl Into<String>) -> Self {
        let segment = LocSegment::Key(key.into());
        for issue in &mut self.issues {
            issue.loc.insert(0, segment.clone());
        }
        self
    }

    /// Returns this error with a list index prepended to every location.
    #[must_use]
    pub fn indexed(mut self, index: usize) -> Self {
        for issue in &mut self.issues {
            issue.loc.insert(0, LocSegment::Index(index));
        }
        self
    }

    /// Absorbs another error's issues after this one's.
    pub fn merge(&mut self, other: ValidationError) {
        self.issues.extend(other.issues);
    }

    /// Formats the issues as the wire-level error array.
    #[must_use]
    pub fn format_errors(&self) -> Value {
        serde_json::to_value(&self.issues).expect("issue serialization is infallible")
    }
}

impl Serialize for ValidationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.issues.len()))?;
        for issue in &self.issues {
            seq.serialize_element(issue)?;
        }
        seq.end()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let first = self
            .issues
            .first()
            .and_then(|i| i.msgs.first().map(String::as_str))
            .unwrap_or("invalid value");
        write!(f, "{} issue(s), first: {first}", self.issues.len())
    }
}

impl std::error::Error for ValidationError {}

/// Returns the wire-level name for a JSON value's type.
fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

fn expected(kind: &str, value: &Value) -> ValidationError {
    ValidationError::message(format!("Expected {kind}, received {}", type_name(value)))
}

/// String schema.
#[derive(Debug, Clone, Default)]
pub struct StringSchema;

impl Schema for StringSchema {
    fn parse(&self, value: Value) -> Result<Value, ValidationError> {
        match value {
            Value::String(_) => Ok(value),
            other => Err(expected("str", &other)),
        }
    }

    fn to_openapi(&self) -> Value {
        json!({"type": "string"})
    }
}

/// Integer schema with lenient string coercion.
///
/// Accepts integers and strings that parse as integers, so text-only
/// argument sources (query strings, path captures, headers, cookies)
/// validate without a separate conversion step.
#[derive(Debug, Clone, Default)]
pub struct IntegerSchema;

impl Schema for IntegerSchema {
    fn parse(&self, value: Value) -> Result<Value, ValidationError> {
        match &value {
            Value::Number(n) if !n.is_f64() => Ok(value),
            Value::String(s) => match s.trim().parse::<i64>() {
                Ok(n) => Ok(Value::from(n)),
                Err(_) => Err(expected("int", &value)),
            },
            other => Err(expected("int", other)),
        }
    }

    fn to_openapi(&self) -> Value {
        json!({"type": "integer"})
    }
}

/// Floating-point schema with lenient string coercion.
#[derive(Debug, Clone, Default)]
pub struct FloatSchema;

impl Schema for FloatSchema {
    fn parse(&self, value: Value) -> Result<Value, ValidationError> {
        match &value {
            Value::Number(_) => Ok(value),
            Value::String(s) => match s.trim().parse::<f64>() {
                Ok(n) => Ok(json!(n)),
                Err(_) => Err(expected("float", &value)),
            },
            other => Err(expected("float", other)),
        }
    }

    fn to_openapi(&self) -> Value {
        json!({"type": "number"})
    }
}

/// Boolean schema accepting `true`/`false` string forms.
#[derive(Debug, Clone, Default)]
pub struct BooleanSchema;

impl Schema for BooleanSchema {
    fn parse(&self, value: Value) -> Result<Value, ValidationError> {
        match &value {
            Value::Bool(_) => Ok(value),
            Value::String(s) if s == "true" => Ok(Value::Bool(true)),
            Value::String(s) if s == "false" => Ok(Value::Bool(false)),
            other => Err(expected("bool", other)),
        }
    }

    fn to_openapi(&self) -> Value {
        json!({"type": "boolean"})
    }
}

/// List schema validating every item against one item schema.
#[derive(Clone)]
pub struct ListSchema {
    item: Arc<dyn Schema>,
}

impl ListSchema {
    /// Creates a list schema over the given item schema.
    #[must_use]
    pub fn new(item: Arc<dyn Schema>) -> Self {
        Self { item }
    }
}

impl Schema for ListSchema {
    fn parse(&self, value: Value) -> Result<Value, ValidationError> {
        let items = match value {
            Value::Array(items) => items,
            other => return Err(expected("list", &other)),
        };

        let mut parsed = Vec::with_capacity(items.len());
        let mut error: Option<ValidationError> = None;
        for (index, item) in items.into_iter().enumerate() {
            match self.item.parse(item) {
                Ok(v) => parsed.push(v),
                Err(e) => {
                    let e = e.indexed(index);
                    match &mut error {
                        Some(acc) => acc.merge(e),
                        None => error = Some(e),
                    }
                }
            }
        }
        match error {
            Some(e) => Err(e),
            None => Ok(Value::Array(parsed)),
        }
    }

    fn to_openapi(&self) -> Value {
        json!({"type": "array", "items": self.item.to_openapi()})
    }
}

/// One declared field of an [`ObjectSchema`].
#[derive(Clone)]
struct Field {
    schema: Arc<dyn Schema>,
    required: bool,
}

/// Object schema with per-field required/optional handling.
///
/// An absent optional field produces no value and no error; an absent
/// required field produces an issue located at the field name. Undeclared
/// keys are dropped from the parsed value.
#[derive(Clone, Default)]
pub struct ObjectSchema {
    fields: IndexMap<String, Field>,
}

impl ObjectSchema {
    /// Creates an empty object schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a required field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, schema: Arc<dyn Schema>) -> Self {
        self.fields.insert(
            name.into(),
            Field {
                schema,
                required: true,
            },
        );
        self
    }

    /// Declares an optional field.
    #[must_use]
    pub fn optional_field(mut self, name: impl Into<String>, schema: Arc<dyn Schema>) -> Self {
        self.fields.insert(
            name.into(),
            Field {
                schema,
                required: false,
            },
        );
        self
    }
}

impl Schema for ObjectSchema {
    fn parse(&self, value: Value) -> Result<Value, ValidationError> {
        let mut input = match value {
            Value::Object(input) => input,
            other => return Err(expected("object", &other)),
        };

        let mut parsed = Map::new();
        let mut error: Option<ValidationError> = None;
        let mut push = |e: ValidationError, error: &mut Option<ValidationError>| match error {
            Some(acc) => acc.merge(e),
            None => *error = Some(e),
        };

        for (name, field) in &self.fields {
            match input.remove(name) {
                Some(raw) => match field.schema.parse(raw) {
                    Ok(v) => {
                        parsed.insert(name.clone(), v);
                    }
                    Err(e) => push(e.prefixed(name), &mut error),
                },
                None if field.required => push(
                    ValidationError::message("This field is required").prefixed(name),
                    &mut error,
                ),
                None => {}
            }
        }
        match error {
            Some(e) => Err(e),
            None => Ok(Value::Object(parsed)),
        }
    }

    fn to_openapi(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, field)| (name.clone(), field.schema.to_openapi()))
            .collect();
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|(_, f)| f.required)
            .map(|(name, _)| name.as_str())
            .collect();

        let mut spec = json!({"type": "object", "properties": properties});
        if !required.is_empty() {
            spec["required"] = json!(required);
        }
        spec
    }

    fn kind(&self) -> SchemaKind {
        SchemaKind::Structured
    }
}

/// Shorthand for a shared [`StringSchema`].
#[must_use]
pub fn string() -> Arc<dyn Schema> {
    Arc::new(StringSchema)
}

/// Shorthand for a shared [`IntegerSchema`].
#[must_use]
pub fn integer() -> Arc<dyn Schema> {
    Arc::new(IntegerSchema)
}

/// Shorthand for a shared [`FloatSchema`].
#[must_use]
pub fn float() -> Arc<dyn Schema> {
    Arc::new(FloatSchema)
}

/// Shorthand for a shared [`BooleanSchema`].
#[must_use]
pub fn boolean() -> Arc<dyn Schema> {
    Arc::new(BooleanSchema)
}

/// Shorthand for a shared [`ListSchema`] over `item`.
#[must_use]
pub fn list(item: Arc<dyn Schema>) -> Arc<dyn Schema> {
    Arc::new(ListSchema::new(item))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_schema() {
        assert_eq!(string().parse(json!("abc")).unwrap(), json!("abc"));

        let err = string().parse(json!(5)).unwrap_err();
        assert_eq!(err.issues()[0].msgs, vec!["Expected str, received int"]);
    }

    #[test]
    fn test_integer_schema_accepts_numbers() {
        assert_eq!(integer().parse(json!(42)).unwrap(), json!(42));
    }

    #[test]
    fn test_integer_schema_coerces_strings() {
        assert_eq!(integer().parse(json!("42")).unwrap(), json!(42));
    }

    #[test]
    fn test_integer_schema_rejects_text() {
        let err = integer().parse(json!("abc")).unwrap_err();
        assert_eq!(err.issues()[0].msgs, vec!["Expected int, received str"]);
        assert!(err.issues()[0].loc.is_empty());
    }

    #[test]
    fn test_integer_schema_rejects_float() {
        let err = integer().parse(json!(1.5)).unwrap_err();
        assert_eq!(err.issues()[0].msgs, vec!["Expected int, received float"]);
    }

    #[test]
    fn test_float_schema() {
        assert_eq!(float().parse(json!(1.5)).unwrap(), json!(1.5));
        assert_eq!(float().parse(json!("2.5")).unwrap(), json!(2.5));
        assert!(float().parse(json!("abc")).is_err());
    }

    #[test]
    fn test_boolean_schema() {
        assert_eq!(boolean().parse(json!(true)).unwrap(), json!(true));
        assert_eq!(boolean().parse(json!("false")).unwrap(), json!(false));

        let err = boolean().parse(json!(1)).unwrap_err();
        assert_eq!(err.issues()[0].msgs, vec!["Expected bool, received int"]);
    }

    #[test]
    fn test_list_schema_reports_indexed_locations() {
        let schema = list(integer());
        let err = schema.parse(json!([1, "abc", 3, "def"])).unwrap_err();

        assert_eq!(err.issues().len(), 2);
        assert_eq!(err.issues()[0].loc, vec![LocSegment::Index(1)]);
        assert_eq!(err.issues()[1].loc, vec![LocSegment::Index(3)]);
    }

    #[test]
    fn test_object_schema_required_field() {
        let schema = ObjectSchema::new().field("a", integer());
        let err = schema.parse(json!({})).unwrap_err();

        assert_eq!(err.issues()[0].loc, vec![LocSegment::Key("a".to_string())]);
        assert_eq!(err.issues()[0].msgs, vec!["This field is required"]);
    }

    #[test]
    fn test_object_schema_optional_field_absent() {
        let schema = ObjectSchema::new().optional_field("a", integer());
        assert_eq!(schema.parse(json!({})).unwrap(), json!({}));
    }

    #[test]
    fn test_object_schema_nested_location() {
        let schema = ObjectSchema::new().field("a", integer());
        let err = schema.parse(json!({"a": "abc"})).unwrap_err();

        assert_eq!(err.issues()[0].loc, vec![LocSegment::Key("a".to_string())]);
        assert_eq!(err.issues()[0].msgs, vec!["Expected int, received str"]);
    }

    #[test]
    fn test_object_schema_drops_undeclared_keys() {
        let schema = ObjectSchema::new().field("a", integer());
        let parsed = schema.parse(json!({"a": 1, "extra": true})).unwrap();
        assert_eq!(parsed, json!({"a": 1}));
    }

    #[test]
    fn test_object_schema_is_structured() {
        assert_eq!(ObjectSchema::new().kind(), SchemaKind::Structured);
        assert_eq!(integer().kind(), SchemaKind::Scalar);
    }

    #[test]
    fn test_object_schema_openapi_fragment() {
        let schema = ObjectSchema::new()
            .field("a", integer())
            .optional_field("b", string());

        assert_eq!(
            schema.to_openapi(),
            json!({
                "type": "object",
                "properties": {"a": {"type": "integer"}, "b": {"type": "string"}},
                "required": ["a"],
            })
        );
    }

    #[test]
    fn test_format_errors_wire_shape() {
        let schema = ObjectSchema::new().field("a", integer());
        let err = schema.parse(json!({"a": "abc"})).unwrap_err();

        assert_eq!(
            err.format_errors(),
            json!([{"loc": ["a"], "msgs": ["Expected int, received str"]}])
        );
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::message("Expected int, received str");
        assert!(err.to_string().contains("Expected int, received str"));
    }
}
