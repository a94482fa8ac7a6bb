//! Typed accessors over a `RunFunctionRequest`.
//!
//! The wire request carries raw documents; these helpers validate and convert
//! them into the `resource` module's types. They never mutate the request.

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::FunctionError;
use crate::proto::{Resource, RunFunctionRequest};
use crate::resource::{Composite, DesiredComposed, Name, ObservedComposed, Unstructured};

/// The observed composite resource.
///
/// Fails when the observed state or its composite is absent, or when the
/// composite document isn't a well-formed resource.
pub fn get_observed_composite_resource(req: &RunFunctionRequest) -> Result<Composite, FunctionError> {
    let composite = req
        .observed
        .as_ref()
        .ok_or_else(|| FunctionError::MissingState("observed state".to_string()))?
        .composite
        .as_ref()
        .ok_or_else(|| FunctionError::MissingState("observed composite resource".to_string()))?;

    to_composite(composite)
}

/// The desired composite resource, if a previous function set one.
pub fn get_desired_composite_resource(
    req: &RunFunctionRequest,
) -> Result<Option<Composite>, FunctionError> {
    req.desired
        .as_ref()
        .and_then(|state| state.composite.as_ref())
        .map(to_composite)
        .transpose()
}

/// Composed resources that currently exist, keyed by pipeline name.
pub fn get_observed_composed_resources(
    req: &RunFunctionRequest,
) -> Result<IndexMap<Name, ObservedComposed>, FunctionError> {
    let Some(state) = req.observed.as_ref() else {
        return Ok(IndexMap::new());
    };

    state
        .resources
        .iter()
        .map(|(name, r)| {
            let resource = Unstructured::from_object(r.resource.clone())
                .map_err(|e| e.wrap(format!("observed composed resource {:?}", name)))?;
            Ok::<_, FunctionError>((
                Name::from(name.as_str()),
                ObservedComposed {
                    resource,
                    connection_details: r.connection_details.clone(),
                },
            ))
        })
        .collect()
}

/// Composed resources earlier functions want, keyed by pipeline name.
///
/// Callers update this map and hand it back with
/// `response::set_desired_composed_resources`, so entries contributed by
/// other functions survive. Those entries only need to be objects; their
/// type fields and connection details are carried as received.
pub fn get_desired_composed_resources(
    req: &RunFunctionRequest,
) -> Result<IndexMap<Name, DesiredComposed>, FunctionError> {
    let Some(state) = req.desired.as_ref() else {
        return Ok(IndexMap::new());
    };

    state
        .resources
        .iter()
        .map(|(name, r)| {
            let resource = Unstructured::from_object(r.resource.clone())
                .map_err(|e| e.wrap(format!("desired composed resource {:?}", name)))?;
            Ok::<_, FunctionError>((
                Name::from(name.as_str()),
                DesiredComposed {
                    resource,
                    connection_details: r.connection_details.clone(),
                    ready: r.ready,
                },
            ))
        })
        .collect()
}

/// A key from the pipeline context, if present.
pub fn get_context<'a>(req: &'a RunFunctionRequest, key: &str) -> Option<&'a Value> {
    req.context.as_ref()?.as_object()?.get(key)
}

fn to_composite(r: &Resource) -> Result<Composite, FunctionError> {
    Ok(Composite {
        resource: Unstructured::try_from(r.resource.clone())?,
        connection_details: r.connection_details.clone(),
    })
}
