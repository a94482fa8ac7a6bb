//! Error types for the composition function.
//!
//! Every failure the function can hit is structural: the request is malformed
//! or a desired resource can't be materialized. Errors carry a context chain so
//! the message surfaced to the user names the step that failed.

use std::fmt;

/// Error type for function operations
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionError {
    /// A required part of the request record is absent
    MissingState(String),
    /// A field path did not resolve to a value
    FieldNotFound {
        path: String,
    },
    /// A field path resolved, but to the wrong JSON type
    FieldTypeMismatch {
        path: String,
        expected: &'static str,
        actual: String,
    },
    /// A string field that must be non-empty was empty
    EmptyField {
        path: String,
    },
    /// A document could not be converted into a resource
    Conversion(String),
    /// Another error annotated with the step that produced it
    Context {
        context: String,
        source: Box<FunctionError>,
    },
}

impl FunctionError {
    /// Wrap this error with a message describing what was being attempted.
    ///
    /// The rendered message reads `"<context>: <cause>"`.
    pub fn wrap(self, context: impl Into<String>) -> Self {
        FunctionError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with all context stripped.
    pub fn root_cause(&self) -> &FunctionError {
        match self {
            FunctionError::Context { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl fmt::Display for FunctionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionError::MissingState(what) => write!(f, "{} is not set", what),
            FunctionError::FieldNotFound { path } => write!(f, "{}: no such field", path),
            FunctionError::FieldTypeMismatch { path, expected, actual } => {
                write!(f, "{}: expected {}, got {}", path, expected, actual)
            }
            FunctionError::EmptyField { path } => write!(f, "{}: must not be empty", path),
            FunctionError::Conversion(msg) => write!(f, "conversion failed: {}", msg),
            FunctionError::Context { context, source } => write!(f, "{}: {}", context, source),
        }
    }
}

impl std::error::Error for FunctionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FunctionError::Context { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Extension for attaching context to a `Result` in one call.
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T, FunctionError>;
}

impl<T> ResultExt<T> for Result<T, FunctionError> {
    fn context(self, context: impl Into<String>) -> Result<T, FunctionError> {
        self.map_err(|e| e.wrap(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_wrap_prefixes_context() {
        let err = FunctionError::FieldNotFound {
            path: "metadata.name".to_string(),
        }
        .wrap("cannot read metadata.name field of XNetworks");

        assert_eq!(
            err.to_string(),
            "cannot read metadata.name field of XNetworks: metadata.name: no such field"
        );
    }

    #[test]
    fn test_source_chain() {
        let err = FunctionError::Conversion("not an object".to_string())
            .wrap("inner")
            .wrap("outer");

        let inner = err.source().unwrap();
        assert_eq!(inner.to_string(), "inner: conversion failed: not an object");
        assert_eq!(
            err.root_cause(),
            &FunctionError::Conversion("not an object".to_string())
        );
    }

    #[test]
    fn test_result_context() {
        let result: Result<(), FunctionError> =
            Err(FunctionError::MissingState("observed state".to_string()));

        let err = result.context("cannot get observed composite resource").unwrap_err();
        assert!(matches!(err, FunctionError::Context { .. }));
        assert_eq!(
            err.to_string(),
            "cannot get observed composite resource: observed state is not set"
        );
    }
}
