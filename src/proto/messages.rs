/// Wire records exchanged with the function host
///
/// JSON rendition of the function runner protocol: camelCase fields, enum
/// values spelled as their protobuf names.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::resource::{ConnectionDetails, Ready};

/// Request to run a function
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunFunctionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<RequestMeta>,

    /// Current state of the composite and its composed resources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed: Option<State>,

    /// Desired state accumulated by previous functions in the pipeline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired: Option<State>,

    /// Optional input configured for this function step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,

    /// Opaque pipeline context, passed from function to function
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMeta {
    /// Opaque tag identifying the request; identical requests carry identical tags
    #[serde(default)]
    pub tag: String,
}

/// Response from a function run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunFunctionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired: Option<State>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<FunctionResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

impl RunFunctionResponse {
    /// The first fatal result, if any. A fatal result stops the pipeline.
    pub fn fatal(&self) -> Option<&FunctionResult> {
        self.results.iter().find(|r| r.severity == Severity::Fatal)
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal().is_some()
    }

    /// Find the condition asserted for `condition_type`.
    pub fn condition(&self, condition_type: &str) -> Option<&Condition> {
        self.conditions
            .iter()
            .rev()
            .find(|c| c.condition_type == condition_type)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    /// Opaque tag echoed from the request
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag: String,

    /// How long the host may cache this response
    #[serde(default, with = "super::duration", skip_serializing_if = "Option::is_none")]
    pub ttl: Option<Duration>,
}

/// State of the composite resource and any composed resources
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composite: Option<Resource>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub resources: IndexMap<String, Resource>,
}

/// A resource plus the metadata the pipeline attaches to it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    /// The resource document. Validated only when a helper reads it.
    #[serde(default)]
    pub resource: Value,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub connection_details: ConnectionDetails,

    #[serde(default, skip_serializing_if = "is_unspecified")]
    pub ready: Ready,
}

fn is_unspecified(ready: &Ready) -> bool {
    *ready == Ready::Unspecified
}

/// Severity of a function result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Severity {
    #[default]
    #[serde(rename = "SEVERITY_UNSPECIFIED")]
    Unspecified,
    /// Stop the pipeline and surface the message as an error
    #[serde(rename = "SEVERITY_FATAL")]
    Fatal,
    /// Emit a warning event
    #[serde(rename = "SEVERITY_WARNING")]
    Warning,
    /// Emit a normal event
    #[serde(rename = "SEVERITY_NORMAL")]
    Normal,
}

/// Which object an event or condition is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Target {
    #[default]
    #[serde(rename = "TARGET_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "TARGET_COMPOSITE")]
    Composite,
    #[serde(rename = "TARGET_COMPOSITE_AND_CLAIM")]
    CompositeAndClaim,
}

/// A result (event) emitted by a function
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionResult {
    pub severity: Severity,

    #[serde(default)]
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,
}

/// Status of a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    #[serde(rename = "STATUS_CONDITION_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "STATUS_CONDITION_UNKNOWN")]
    Unknown,
    #[serde(rename = "STATUS_CONDITION_TRUE")]
    True,
    #[serde(rename = "STATUS_CONDITION_FALSE")]
    False,
}

/// A status condition to set on the composite (and optionally its claim)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,

    pub status: Status,

    pub reason: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_from_json() {
        let req: RunFunctionRequest = serde_json::from_value(json!({
            "meta": {"tag": "abc"},
            "observed": {
                "composite": {
                    "resource": {
                        "apiVersion": "example.atlassian.com/v1alpha1",
                        "kind": "XNetworks",
                        "metadata": {"name": "test"}
                    }
                }
            },
            "desired": {
                "resources": {
                    "other-key": {
                        "resource": {"apiVersion": "v1", "kind": "ConfigMap"},
                        "ready": "READY_TRUE"
                    }
                }
            }
        }))
        .unwrap();

        assert_eq!(req.meta.unwrap().tag, "abc");
        let desired = req.desired.unwrap();
        assert_eq!(desired.resources["other-key"].ready, Ready::True);
        assert!(req.observed.unwrap().composite.is_some());
        assert!(req.context.is_none());
    }

    #[test]
    fn test_response_to_json() {
        let rsp = RunFunctionResponse {
            meta: Some(ResponseMeta {
                tag: String::new(),
                ttl: Some(Duration::from_secs(60)),
            }),
            conditions: vec![Condition {
                condition_type: "FunctionSuccess".to_string(),
                status: Status::True,
                reason: "Success".to_string(),
                message: None,
                target: Some(Target::CompositeAndClaim),
            }],
            ..Default::default()
        };

        assert_eq!(
            serde_json::to_value(&rsp).unwrap(),
            json!({
                "meta": {"ttl": "60s"},
                "conditions": [{
                    "type": "FunctionSuccess",
                    "status": "STATUS_CONDITION_TRUE",
                    "reason": "Success",
                    "target": "TARGET_COMPOSITE_AND_CLAIM"
                }]
            })
        );
    }

    #[test]
    fn test_fatal_lookup() {
        let mut rsp = RunFunctionResponse::default();
        assert!(!rsp.is_fatal());

        rsp.results.push(FunctionResult {
            severity: Severity::Warning,
            message: "careful".to_string(),
            ..Default::default()
        });
        rsp.results.push(FunctionResult {
            severity: Severity::Fatal,
            message: "stop".to_string(),
            ..Default::default()
        });

        assert_eq!(rsp.fatal().unwrap().message, "stop");
    }
}
