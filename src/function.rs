//! The composition function.
//!
//! For every observed XNetworks composite resource the function adds a
//! SQLInstance to the desired composed resources, named after the composite.
//! It is a pure function of the composite's `metadata.name`: the host calls it
//! on every reconcile, so the same input must always produce the same desired
//! entry under the same key.

use serde_json::{Map, Value};
use std::time::Duration;
use tracing::Span;

use crate::error::{FunctionError, ResultExt};
use crate::proto::{RunFunctionRequest, RunFunctionResponse};
use crate::request;
use crate::resource::{DesiredComposed, Name, Unstructured};
use crate::response;

/// Prefix of the composed resource name, keeping it clear of other functions' keys
pub const COMPOSED_NAME_PREFIX: &str = "sqlinstance-";

pub const SQL_INSTANCE_API_VERSION: &str = "example.org/v1alpha1";
pub const SQL_INSTANCE_KIND: &str = "SQLInstance";

/// Condition type reporting whether the function succeeded
pub const CONDITION_FUNCTION_SUCCESS: &str = "FunctionSuccess";
pub const REASON_SUCCESS: &str = "Success";
pub const REASON_INTERNAL_ERROR: &str = "InternalError";

/// The function runner interface the pipeline host calls.
///
/// Failures never surface as `Err`: a function reports them inside the
/// response as a fatal result, alongside the conditions and events the user
/// should see.
pub trait FunctionRunner: Send + Sync {
    fn run_function(&self, req: &RunFunctionRequest) -> RunFunctionResponse;
}

/// Adds a SQLInstance composed resource for the observed composite.
#[derive(Debug, Clone)]
pub struct Function {
    log: Span,
    ttl: Duration,
}

impl Function {
    /// Create a function that logs under `log`.
    ///
    /// Pass `Span::none()` to silence it, e.g. in tests.
    pub fn new(log: Span) -> Self {
        Self {
            log,
            ttl: response::DEFAULT_TTL,
        }
    }

    /// Override how long the host may cache responses.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn compose(
        &self,
        req: &RunFunctionRequest,
        rsp: &mut RunFunctionResponse,
    ) -> Result<(), FunctionError> {
        let xr = request::get_observed_composite_resource(req)
            .context("cannot get observed composite resource from request")?;

        let log = tracing::info_span!(
            parent: &self.log,
            "composite",
            "xr-version" = xr.resource.api_version(),
            "xr-kind" = xr.resource.kind(),
            "xr-name" = xr.resource.name(),
        );
        let _entered = log.enter();

        let name = xr
            .resource
            .get_string("metadata.name")
            .and_then(|name| {
                if name.is_empty() {
                    Err(FunctionError::EmptyField {
                        path: "metadata.name".to_string(),
                    })
                } else {
                    Ok(name)
                }
            })
            .context(format!("cannot read metadata.name field of {}", xr.resource.kind()))?;

        // Get, update, set: entries added by other functions must survive.
        let mut desired = request::get_desired_composed_resources(req)
            .context("cannot get desired composed resources from request")?;

        let sql = sql_instance(name)
            .context(format!("cannot convert {} to a composed resource", SQL_INSTANCE_KIND))?;
        desired.insert(composed_resource_name(name), sql);

        response::set_desired_composed_resources(rsp, &desired)
            .context("cannot set desired composed resources in response")?;

        tracing::info!(composite = name, count = desired.len(), "Added desired resource(s)");
        Ok(())
    }
}

impl FunctionRunner for Function {
    fn run_function(&self, req: &RunFunctionRequest) -> RunFunctionResponse {
        let _entered = self.log.enter();
        let tag = req.meta.as_ref().map(|m| m.tag.as_str()).unwrap_or_default();
        tracing::info!(tag, "Running function");

        let mut rsp = response::to(req, self.ttl);

        match self.compose(req, &mut rsp) {
            Ok(()) => {
                response::condition_true(&mut rsp, CONDITION_FUNCTION_SUCCESS, REASON_SUCCESS)
                    .target_composite_and_claim();
            }
            Err(err) => {
                tracing::warn!(error = %err, "Function failed");

                // Nothing from a failed run is trusted: hand back the desired
                // state exactly as received.
                rsp.desired = req.desired.clone();

                response::condition_false(&mut rsp, CONDITION_FUNCTION_SUCCESS, REASON_INTERNAL_ERROR)
                    .with_message(err.to_string())
                    .target_composite_and_claim();
                response::warning(&mut rsp, err.to_string()).target_composite_and_claim();
                response::fatal(&mut rsp, &err);
            }
        }

        rsp
    }
}

/// The pipeline key for the SQLInstance composed from the composite `name`.
///
/// Plain concatenation; a composite whose name already starts with the prefix
/// is not special-cased.
pub fn composed_resource_name(name: &str) -> Name {
    Name::new(format!("{}{}", COMPOSED_NAME_PREFIX, name))
}

/// The desired SQLInstance for the composite `name`.
///
/// Only the name is taken from the composite; everything else is fixed.
pub fn sql_instance(name: &str) -> Result<DesiredComposed, FunctionError> {
    let mut metadata = Map::new();
    metadata.insert("name".to_string(), Value::String(name.to_string()));

    let mut document = Map::new();
    document.insert(
        "apiVersion".to_string(),
        Value::String(SQL_INSTANCE_API_VERSION.to_string()),
    );
    document.insert("kind".to_string(), Value::String(SQL_INSTANCE_KIND.to_string()));
    document.insert("metadata".to_string(), Value::Object(metadata));
    document.insert("spec".to_string(), Value::Object(Map::new()));

    let resource = Unstructured::try_from(Value::Object(document))?;
    Ok(DesiredComposed::new(resource))
}
