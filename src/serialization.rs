//! Reading request records from disk.
//!
//! Used by the `run` subcommand to feed a captured or hand-written request
//! through the function without a pipeline host.

use std::path::Path;

use crate::proto::RunFunctionRequest;

/// Error type for serialization operations
#[derive(Debug)]
pub enum SerializationError {
    YamlError(serde_yaml::Error),
    JsonError(serde_json::Error),
    IoError(std::io::Error),
}

impl From<serde_yaml::Error> for SerializationError {
    fn from(err: serde_yaml::Error) -> Self {
        SerializationError::YamlError(err)
    }
}

impl From<serde_json::Error> for SerializationError {
    fn from(err: serde_json::Error) -> Self {
        SerializationError::JsonError(err)
    }
}

impl From<std::io::Error> for SerializationError {
    fn from(err: std::io::Error) -> Self {
        SerializationError::IoError(err)
    }
}

impl std::fmt::Display for SerializationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SerializationError::YamlError(e) => write!(f, "YAML error: {}", e),
            SerializationError::JsonError(e) => write!(f, "JSON error: {}", e),
            SerializationError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for SerializationError {}

/// Parse a request from YAML or JSON text.
///
/// YAML is a superset of JSON, so one parser covers both. The document goes
/// through `serde_json::Value` first so YAML and JSON inputs produce identical
/// resource trees.
pub fn parse_request(contents: &str) -> Result<RunFunctionRequest, SerializationError> {
    let value: serde_json::Value = serde_yaml::from_str(contents)?;
    Ok(serde_json::from_value(value)?)
}

/// Load a request from a YAML or JSON file.
pub fn load_request<P: AsRef<Path>>(path: P) -> Result<RunFunctionRequest, SerializationError> {
    let contents = std::fs::read_to_string(path)?;
    parse_request(&contents)
}
