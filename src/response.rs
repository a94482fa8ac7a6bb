//! Builders for a `RunFunctionResponse`.
//!
//! A response starts as a copy of the request's desired state and context
//! (`to`), then functions add resources, conditions and results to it.

use indexmap::IndexMap;
use std::time::Duration;

use crate::error::FunctionError;
use crate::proto::{
    Condition, FunctionResult, Resource, ResponseMeta, RunFunctionRequest, RunFunctionResponse,
    Severity, State, Status, Target,
};
use crate::resource::{DesiredComposed, Name};

/// Default time the host may cache a response for
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Create a response to `req`.
///
/// Desired state and pipeline context are copied from the request so a
/// function that does nothing passes them through untouched.
pub fn to(req: &RunFunctionRequest, ttl: Duration) -> RunFunctionResponse {
    RunFunctionResponse {
        meta: Some(ResponseMeta {
            tag: req.meta.as_ref().map(|m| m.tag.clone()).unwrap_or_default(),
            ttl: Some(ttl),
        }),
        desired: req.desired.clone(),
        context: req.context.clone(),
        ..Default::default()
    }
}

/// Replace the response's desired composed resources.
///
/// The desired composite, if any, is left alone.
pub fn set_desired_composed_resources(
    rsp: &mut RunFunctionResponse,
    desired: &IndexMap<Name, DesiredComposed>,
) -> Result<(), FunctionError> {
    let resources = desired
        .iter()
        .map(|(name, dc)| {
            let document = serde_json::to_value(&dc.resource).map_err(|e| {
                FunctionError::Conversion(format!("cannot serialize resource {}: {}", name, e))
            })?;
            Ok::<_, FunctionError>((
                name.to_string(),
                Resource {
                    resource: document,
                    connection_details: dc.connection_details.clone(),
                    ready: dc.ready,
                },
            ))
        })
        .collect::<Result<IndexMap<_, _>, _>>()?;

    rsp.desired.get_or_insert_with(State::default).resources = resources;
    Ok(())
}

/// Emit a fatal result. The host stops the pipeline and reports `err`.
pub fn fatal(rsp: &mut RunFunctionResponse, err: &FunctionError) {
    rsp.results.push(FunctionResult {
        severity: Severity::Fatal,
        message: err.to_string(),
        ..Default::default()
    });
}

/// Emit a warning event.
pub fn warning(rsp: &mut RunFunctionResponse, message: impl Into<String>) -> ResultBuilder<'_> {
    push_result(rsp, Severity::Warning, message.into())
}

/// Emit a normal event.
pub fn normal(rsp: &mut RunFunctionResponse, message: impl Into<String>) -> ResultBuilder<'_> {
    push_result(rsp, Severity::Normal, message.into())
}

fn push_result(rsp: &mut RunFunctionResponse, severity: Severity, message: String) -> ResultBuilder<'_> {
    rsp.results.push(FunctionResult {
        severity,
        message,
        target: Some(Target::Composite),
        ..Default::default()
    });
    let index = rsp.results.len() - 1;
    ResultBuilder { rsp, index }
}

/// Refines the result most recently pushed by `warning` or `normal`
pub struct ResultBuilder<'a> {
    rsp: &'a mut RunFunctionResponse,
    index: usize,
}

impl ResultBuilder<'_> {
    fn result(&mut self) -> &mut FunctionResult {
        &mut self.rsp.results[self.index]
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.result().reason = Some(reason.into());
        self
    }

    pub fn target_composite(mut self) {
        self.result().target = Some(Target::Composite);
    }

    pub fn target_composite_and_claim(mut self) {
        self.result().target = Some(Target::CompositeAndClaim);
    }
}

/// Assert a condition with status true.
pub fn condition_true(
    rsp: &mut RunFunctionResponse,
    condition_type: impl Into<String>,
    reason: impl Into<String>,
) -> ConditionBuilder<'_> {
    set_condition(rsp, condition_type.into(), Status::True, reason.into())
}

/// Assert a condition with status false.
pub fn condition_false(
    rsp: &mut RunFunctionResponse,
    condition_type: impl Into<String>,
    reason: impl Into<String>,
) -> ConditionBuilder<'_> {
    set_condition(rsp, condition_type.into(), Status::False, reason.into())
}

/// Assert a condition with status unknown.
pub fn condition_unknown(
    rsp: &mut RunFunctionResponse,
    condition_type: impl Into<String>,
    reason: impl Into<String>,
) -> ConditionBuilder<'_> {
    set_condition(rsp, condition_type.into(), Status::Unknown, reason.into())
}

// One condition per type: asserting a type again replaces the earlier one.
fn set_condition(
    rsp: &mut RunFunctionResponse,
    condition_type: String,
    status: Status,
    reason: String,
) -> ConditionBuilder<'_> {
    rsp.conditions.retain(|c| c.condition_type != condition_type);
    rsp.conditions.push(Condition {
        condition_type,
        status,
        reason,
        message: None,
        target: Some(Target::Composite),
    });
    let index = rsp.conditions.len() - 1;
    ConditionBuilder { rsp, index }
}

/// Refines the condition most recently asserted
pub struct ConditionBuilder<'a> {
    rsp: &'a mut RunFunctionResponse,
    index: usize,
}

impl ConditionBuilder<'_> {
    fn condition(&mut self) -> &mut Condition {
        &mut self.rsp.conditions[self.index]
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.condition().message = Some(message.into());
        self
    }

    pub fn target_composite(mut self) {
        self.condition().target = Some(Target::Composite);
    }

    pub fn target_composite_and_claim(mut self) {
        self.condition().target = Some(Target::CompositeAndClaim);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::RequestMeta;
    use crate::resource::{Ready, Unstructured};
    use serde_json::json;

    #[test]
    fn test_to_copies_desired_and_context() {
        let req: RunFunctionRequest = serde_json::from_value(json!({
            "meta": {"tag": "t-1"},
            "desired": {"resources": {"other-key": {"resource": {"apiVersion": "v1", "kind": "ConfigMap"}}}},
            "context": {"k": "v"}
        }))
        .unwrap();

        let rsp = to(&req, DEFAULT_TTL);

        assert_eq!(rsp.desired, req.desired);
        assert_eq!(rsp.context, Some(json!({"k": "v"})));
        let meta = rsp.meta.unwrap();
        assert_eq!(meta.ttl, Some(Duration::from_secs(60)));
        assert_eq!(meta.tag, "t-1");
    }

    #[test]
    fn test_to_without_desired() {
        let req = RunFunctionRequest {
            meta: Some(RequestMeta::default()),
            ..Default::default()
        };

        let rsp = to(&req, Duration::from_secs(5));
        assert!(rsp.desired.is_none());
        assert!(rsp.context.is_none());
    }

    #[test]
    fn test_condition_builder() {
        let mut rsp = RunFunctionResponse::default();
        condition_false(&mut rsp, "FunctionSuccess", "InternalError")
            .with_message("Something went wrong.")
            .target_composite_and_claim();

        assert_eq!(
            rsp.conditions,
            vec![Condition {
                condition_type: "FunctionSuccess".to_string(),
                status: Status::False,
                reason: "InternalError".to_string(),
                message: Some("Something went wrong.".to_string()),
                target: Some(Target::CompositeAndClaim),
            }]
        );
    }

    #[test]
    fn test_condition_last_write_wins() {
        let mut rsp = RunFunctionResponse::default();
        condition_unknown(&mut rsp, "Ready", "Creating");
        condition_true(&mut rsp, "Ready", "Available");

        assert_eq!(rsp.conditions.len(), 1);
        assert_eq!(rsp.condition("Ready").unwrap().status, Status::True);
    }

    #[test]
    fn test_events_and_fatal() {
        let mut rsp = RunFunctionResponse::default();
        normal(&mut rsp, "created SQLInstance").with_reason("Created");
        warning(&mut rsp, "something went wrong").target_composite_and_claim();
        fatal(&mut rsp, &FunctionError::MissingState("observed state".to_string()));

        assert_eq!(rsp.results.len(), 3);
        assert_eq!(rsp.results[0].target, Some(Target::Composite));
        assert_eq!(rsp.results[0].reason.as_deref(), Some("Created"));
        assert_eq!(rsp.results[1].severity, Severity::Warning);
        assert_eq!(rsp.results[1].target, Some(Target::CompositeAndClaim));
        assert_eq!(rsp.fatal().unwrap().message, "observed state is not set");
    }

    #[test]
    fn test_set_desired_composed_resources() {
        let mut rsp = RunFunctionResponse::default();
        let mut desired = IndexMap::new();
        desired.insert(
            Name::from("sqlinstance-test"),
            DesiredComposed::new(Unstructured::new("example.org/v1alpha1", "SQLInstance")),
        );

        set_desired_composed_resources(&mut rsp, &desired).unwrap();

        let state = rsp.desired.unwrap();
        assert_eq!(
            state.resources["sqlinstance-test"].resource,
            json!({"apiVersion": "example.org/v1alpha1", "kind": "SQLInstance"})
        );
        assert!(state.resources["sqlinstance-test"].connection_details.is_empty());
    }

    #[test]
    fn test_set_desired_composed_resources_writes_connection_details() {
        let mut rsp = RunFunctionResponse::default();
        let mut composed = DesiredComposed::new(Unstructured::new("v1", "Secret"));
        composed
            .connection_details
            .insert("password".to_string(), "c2VjcmV0".to_string());
        composed.ready = Ready::True;
        let mut desired = IndexMap::new();
        desired.insert(Name::from("other-key"), composed);

        set_desired_composed_resources(&mut rsp, &desired).unwrap();

        let state = rsp.desired.unwrap();
        assert_eq!(
            serde_json::to_value(&state.resources["other-key"]).unwrap(),
            json!({
                "resource": {"apiVersion": "v1", "kind": "Secret"},
                "connectionDetails": {"password": "c2VjcmV0"},
                "ready": "READY_TRUE"
            })
        );
    }
}
