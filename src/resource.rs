//! Typed views over the resources carried in a function request.
//!
//! A resource is a self-describing document: `apiVersion`, `kind`,
//! `metadata.name` and an arbitrary nested field tree. The function never
//! interprets more of it than it has to.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::FunctionError;
use crate::extraction::{json_type_name, Extractor, FieldPath, PathSegment};

/// Name of a composed resource within the desired state.
///
/// This is the pipeline-level key, not `metadata.name`: two functions that add
/// resources under the same `Name` overwrite each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Name(String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Name(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Name(s.to_string())
    }
}

impl From<String> for Name {
    fn from(s: String) -> Self {
        Name(s)
    }
}

/// An unstructured resource document.
///
/// Always a JSON object. Documents built through `TryFrom<Value>` also carry
/// string `apiVersion` and `kind` fields; `from_object` skips that check for
/// documents another function owns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Unstructured {
    object: Map<String, Value>,
}

impl Unstructured {
    /// Build a resource with the given type and no other fields.
    pub fn new(api_version: impl Into<String>, kind: impl Into<String>) -> Self {
        let mut object = Map::new();
        object.insert("apiVersion".to_string(), Value::String(api_version.into()));
        object.insert("kind".to_string(), Value::String(kind.into()));
        Self { object }
    }

    pub fn api_version(&self) -> &str {
        self.object.get("apiVersion").and_then(Value::as_str).unwrap_or_default()
    }

    pub fn kind(&self) -> &str {
        self.object.get("kind").and_then(Value::as_str).unwrap_or_default()
    }

    /// `metadata.name`, or an empty string when unset.
    pub fn name(&self) -> &str {
        self.get_string("metadata.name").unwrap_or_default()
    }

    /// Look up a value by dotted field path.
    pub fn get_value(&self, path: &str) -> Option<&Value> {
        self.extract(&FieldPath::from_dotted(path))
    }

    /// Look up a string by dotted field path.
    pub fn get_string(&self, path: &str) -> Result<&str, FunctionError> {
        self.extract_string(&FieldPath::from_dotted(path))
    }

    /// Set a value by dotted field path, creating parent objects as needed.
    pub fn set_value(&mut self, path: &str, value: Value) -> Result<(), FunctionError> {
        let field_path = FieldPath::from_dotted(path);
        let mut root = Value::Object(std::mem::take(&mut self.object));
        let result = field_path.set(&mut root, value);
        if let Value::Object(object) = root {
            self.object = object;
        }
        result
    }

    pub fn set_string(&mut self, path: &str, value: impl Into<String>) -> Result<(), FunctionError> {
        self.set_value(path, Value::String(value.into()))
    }

    pub fn as_object(&self) -> &Map<String, Value> {
        &self.object
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.object)
    }
}

impl Extractor for Unstructured {
    fn extract(&self, path: &FieldPath) -> Option<&Value> {
        let (first, rest) = path.segments.split_first()?;
        let head = match first {
            PathSegment::Field(name) => self.object.get(name)?,
            PathSegment::Index(_) => return None,
        };
        FieldPath {
            raw: path.raw.clone(),
            segments: rest.to_vec(),
        }
        .resolve(head)
    }
}

impl Unstructured {
    /// Wrap any JSON object as a resource, without checking its type fields.
    ///
    /// Used for composed resources contributed by other functions, which are
    /// passed through as received.
    pub fn from_object(value: Value) -> Result<Self, FunctionError> {
        match value {
            Value::Object(object) => Ok(Self { object }),
            other => Err(FunctionError::Conversion(format!(
                "resource must be an object, got {}",
                json_type_name(&other)
            ))),
        }
    }
}

impl TryFrom<Value> for Unstructured {
    type Error = FunctionError;

    /// Convert an arbitrary document into a resource.
    ///
    /// Fails unless the document is an object with string `apiVersion` and
    /// `kind` fields.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let object = Self::from_object(value)?.object;

        for field in ["apiVersion", "kind"] {
            match object.get(field) {
                Some(Value::String(s)) if !s.is_empty() => {}
                Some(other) if !other.is_string() => {
                    return Err(FunctionError::Conversion(format!(
                        "{} must be a string, got {}",
                        field,
                        json_type_name(other)
                    )))
                }
                _ => {
                    return Err(FunctionError::Conversion(format!("{} is required", field)))
                }
            }
        }

        Ok(Self { object })
    }
}

/// Readiness of a desired composed resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Ready {
    #[default]
    #[serde(rename = "READY_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "READY_TRUE")]
    True,
    #[serde(rename = "READY_FALSE")]
    False,
}

/// Connection details published by a composed resource, keyed by secret key.
///
/// Values are kept in their wire (base64) form; the function never reads them.
pub type ConnectionDetails = IndexMap<String, String>;

/// A composed resource the pipeline wants to exist.
#[derive(Debug, Clone, PartialEq)]
pub struct DesiredComposed {
    pub resource: Unstructured,
    pub connection_details: ConnectionDetails,
    pub ready: Ready,
}

impl DesiredComposed {
    pub fn new(resource: Unstructured) -> Self {
        Self {
            resource,
            connection_details: ConnectionDetails::new(),
            ready: Ready::Unspecified,
        }
    }
}

/// A composed resource as it currently exists.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedComposed {
    pub resource: Unstructured,
    pub connection_details: ConnectionDetails,
}

/// The composite resource, observed or desired.
#[derive(Debug, Clone, PartialEq)]
pub struct Composite {
    pub resource: Unstructured,
    pub connection_details: ConnectionDetails,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_try_from_valid_document() {
        let resource = Unstructured::try_from(json!({
            "apiVersion": "example.atlassian.com/v1alpha1",
            "kind": "XNetworks",
            "metadata": {"name": "test"},
            "spec": {"parameters": {"routingMode": "GLOBAL"}}
        }))
        .unwrap();

        assert_eq!(resource.api_version(), "example.atlassian.com/v1alpha1");
        assert_eq!(resource.kind(), "XNetworks");
        assert_eq!(resource.name(), "test");
        assert_eq!(
            resource.get_value("spec.parameters.routingMode"),
            Some(&json!("GLOBAL"))
        );
    }

    #[test]
    fn test_try_from_rejects_non_object() {
        let err = Unstructured::try_from(json!(["not", "a", "resource"])).unwrap_err();
        assert_eq!(
            err,
            FunctionError::Conversion("resource must be an object, got array".to_string())
        );
    }

    #[test]
    fn test_try_from_requires_kind() {
        let err = Unstructured::try_from(json!({"apiVersion": "v1"})).unwrap_err();
        assert_eq!(err, FunctionError::Conversion("kind is required".to_string()));

        let err = Unstructured::try_from(json!({"apiVersion": "v1", "kind": 7})).unwrap_err();
        assert_eq!(
            err,
            FunctionError::Conversion("kind must be a string, got number".to_string())
        );
    }

    #[test]
    fn test_from_object_skips_type_fields() {
        let resource =
            Unstructured::from_object(json!({"kind": "ConfigMap", "metadata": {"name": "x"}}))
                .unwrap();
        assert_eq!(resource.api_version(), "");
        assert_eq!(resource.kind(), "ConfigMap");
        assert_eq!(
            resource.into_value(),
            json!({"kind": "ConfigMap", "metadata": {"name": "x"}})
        );

        let err = Unstructured::from_object(json!("not-an-object")).unwrap_err();
        assert_eq!(
            err,
            FunctionError::Conversion("resource must be an object, got string".to_string())
        );
    }

    #[test]
    fn test_set_string_builds_metadata() {
        let mut resource = Unstructured::new("example.org/v1alpha1", "SQLInstance");
        resource.set_string("metadata.name", "test").unwrap();

        assert_eq!(resource.name(), "test");
        assert_eq!(
            resource.into_value(),
            json!({
                "apiVersion": "example.org/v1alpha1",
                "kind": "SQLInstance",
                "metadata": {"name": "test"}
            })
        );
    }

    #[test]
    fn test_get_string_wrong_type() {
        let resource = Unstructured::try_from(json!({
            "apiVersion": "v1",
            "kind": "XNetworks",
            "metadata": {"name": {"nested": true}}
        }))
        .unwrap();

        assert!(matches!(
            resource.get_string("metadata.name"),
            Err(FunctionError::FieldTypeMismatch { expected: "string", .. })
        ));
        assert_eq!(resource.name(), "");
    }
}
