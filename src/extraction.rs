//! Field-path addressing for resource documents.
//!
//! Resources are free-form JSON trees. This module resolves dotted paths such as
//! `metadata.name` or `spec.forProvider.subnets.[0]` against them.

use serde_json::{Map, Value};
use std::fmt;

use crate::error::FunctionError;

/// Represents a path to a field in a resource document
///
/// # Examples
///
/// - `metadata.name` - a nested object field
/// - `spec.parameters.regions.[0]` - an array element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    /// The raw path string
    pub raw: String,
    /// Parsed path segments
    pub segments: Vec<PathSegment>,
}

/// A segment in a field path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A named field (e.g., "metadata", "name")
    Field(String),
    /// An array index (e.g., [0], [5])
    Index(usize),
}

impl FieldPath {
    /// Parse a field path with a given delimiter
    ///
    /// # Example
    ///
    /// ```
    /// use function_sqlinstance::extraction::FieldPath;
    ///
    /// let path = FieldPath::parse("spec/parameters/routingMode", "/");
    /// assert_eq!(path.segments.len(), 3);
    /// ```
    pub fn parse(path: &str, delimiter: &str) -> Self {
        let segments = path
            .split(delimiter)
            .filter(|s| !s.is_empty())
            .map(|s| {
                if s.starts_with('[') && s.ends_with(']') {
                    if let Ok(index) = s[1..s.len() - 1].parse::<usize>() {
                        return PathSegment::Index(index);
                    }
                }
                PathSegment::Field(s.to_string())
            })
            .collect();

        Self {
            raw: path.to_string(),
            segments,
        }
    }

    /// Create a field path from a dotted string (common format)
    pub fn from_dotted(path: &str) -> Self {
        Self::parse(path, ".")
    }

    /// Resolve this path against a document.
    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.segments.iter().try_fold(root, |current, segment| match segment {
            PathSegment::Field(name) => current.as_object()?.get(name),
            PathSegment::Index(index) => current.as_array()?.get(*index),
        })
    }

    /// Write `value` at this path, creating intermediate objects as needed.
    ///
    /// Array segments must address an existing element; a path that runs into
    /// a scalar is rejected rather than overwritten.
    pub fn set(&self, root: &mut Value, value: Value) -> Result<(), FunctionError> {
        let Some((last, parents)) = self.segments.split_last() else {
            *root = value;
            return Ok(());
        };

        let mut current = root;
        for segment in parents {
            current = match segment {
                PathSegment::Field(name) => {
                    let object = as_object_mut(current, &self.raw)?;
                    object
                        .entry(name.clone())
                        .or_insert_with(|| Value::Object(Map::new()))
                }
                PathSegment::Index(index) => current
                    .as_array_mut()
                    .and_then(|arr| arr.get_mut(*index))
                    .ok_or_else(|| FunctionError::FieldNotFound {
                        path: self.raw.clone(),
                    })?,
            };
        }

        match last {
            PathSegment::Field(name) => {
                as_object_mut(current, &self.raw)?.insert(name.clone(), value);
            }
            PathSegment::Index(index) => {
                let slot = current
                    .as_array_mut()
                    .and_then(|arr| arr.get_mut(*index))
                    .ok_or_else(|| FunctionError::FieldNotFound {
                        path: self.raw.clone(),
                    })?;
                *slot = value;
            }
        }
        Ok(())
    }
}

fn as_object_mut<'a>(value: &'a mut Value, path: &str) -> Result<&'a mut Map<String, Value>, FunctionError> {
    if value.is_null() {
        *value = Value::Object(Map::new());
    }
    let actual = json_type_name(value);
    value.as_object_mut().ok_or_else(|| FunctionError::FieldTypeMismatch {
        path: path.to_string(),
        expected: "object",
        actual: actual.to_string(),
    })
}

/// Name of a JSON value's type, for error messages
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Trait for types that can extract values by field path
pub trait Extractor {
    /// Extract a value at the given field path
    ///
    /// Returns `Some(value)` if the path exists, `None` otherwise
    fn extract(&self, path: &FieldPath) -> Option<&Value>;

    /// Extract a string value, distinguishing a missing field from a wrong type
    fn extract_string(&self, path: &FieldPath) -> Result<&str, FunctionError> {
        let value = self.extract(path).ok_or_else(|| FunctionError::FieldNotFound {
            path: path.raw.clone(),
        })?;

        value.as_str().ok_or_else(|| FunctionError::FieldTypeMismatch {
            path: path.raw.clone(),
            expected: "string",
            actual: json_type_name(value).to_string(),
        })
    }
}

impl Extractor for Value {
    fn extract(&self, path: &FieldPath) -> Option<&Value> {
        path.resolve(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_path_parse() {
        let path = FieldPath::parse("metadata.labels.app", ".");

        assert_eq!(path.segments.len(), 3);
        assert_eq!(path.segments[0], PathSegment::Field("metadata".to_string()));
        assert_eq!(path.segments[1], PathSegment::Field("labels".to_string()));
        assert_eq!(path.segments[2], PathSegment::Field("app".to_string()));
    }

    #[test]
    fn test_field_path_with_index() {
        let path = FieldPath::parse("spec.regions.[1].name", ".");

        assert_eq!(path.segments.len(), 4);
        assert_eq!(path.segments[2], PathSegment::Index(1));
    }

    #[test]
    fn test_resolve_nested_and_indexed() {
        let doc = json!({
            "metadata": {"name": "test"},
            "spec": {"regions": [{"name": "us"}, {"name": "eu"}]}
        });

        assert_eq!(
            FieldPath::from_dotted("metadata.name").resolve(&doc),
            Some(&json!("test"))
        );
        assert_eq!(
            FieldPath::from_dotted("spec.regions.[1].name").resolve(&doc),
            Some(&json!("eu"))
        );
        assert_eq!(FieldPath::from_dotted("spec.missing").resolve(&doc), None);
        assert_eq!(FieldPath::from_dotted("metadata.name.inner").resolve(&doc), None);
    }

    #[test]
    fn test_extract_string_errors() {
        let doc = json!({"metadata": {"name": 42}});

        let wrong_type = doc.extract_string(&FieldPath::from_dotted("metadata.name"));
        assert_eq!(
            wrong_type,
            Err(FunctionError::FieldTypeMismatch {
                path: "metadata.name".to_string(),
                expected: "string",
                actual: "number".to_string(),
            })
        );

        let missing = doc.extract_string(&FieldPath::from_dotted("metadata.namespace"));
        assert!(matches!(missing, Err(FunctionError::FieldNotFound { .. })));
    }

    #[test]
    fn test_set_creates_intermediate_objects() {
        let mut doc = json!({"kind": "SQLInstance"});

        FieldPath::from_dotted("metadata.name")
            .set(&mut doc, json!("test"))
            .unwrap();

        assert_eq!(doc, json!({"kind": "SQLInstance", "metadata": {"name": "test"}}));
    }

    #[test]
    fn test_set_rejects_scalar_parent() {
        let mut doc = json!({"metadata": "oops"});

        let result = FieldPath::from_dotted("metadata.name").set(&mut doc, json!("test"));
        assert!(matches!(result, Err(FunctionError::FieldTypeMismatch { .. })));
    }
}
