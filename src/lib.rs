//! # function-sqlinstance: a composition function
//!
//! Given the observed state of an `XNetworks` composite resource, the function
//! adds a `SQLInstance` composed resource to the pipeline's desired state and
//! reports a `FunctionSuccess` condition.
//!
//! ## Contract
//!
//! - The desired state is only ever added to. Resources contributed by other
//!   functions in the pipeline pass through untouched.
//! - The composed resource is keyed `sqlinstance-<composite name>`, so calling
//!   the function again for the same composite converges on the same entry.
//! - A malformed request produces a fatal result, a `FunctionSuccess=False`
//!   condition and a warning event, and leaves the desired state as received.
//!
//! ## Example
//!
//! ```
//! use function_sqlinstance::{Function, FunctionRunner, RunFunctionRequest};
//! use serde_json::json;
//!
//! let req: RunFunctionRequest = serde_json::from_value(json!({
//!     "observed": {"composite": {"resource": {
//!         "apiVersion": "example.atlassian.com/v1alpha1",
//!         "kind": "XNetworks",
//!         "metadata": {"name": "test"}
//!     }}}
//! })).unwrap();
//!
//! let rsp = Function::new(tracing::Span::none()).run_function(&req);
//! assert!(rsp.desired.unwrap().resources.contains_key("sqlinstance-test"));
//! ```

// Core modules
pub mod error;
pub mod extraction;
pub mod resource;
pub mod function;

// Wire protocol and the SDK-style helpers around it
pub mod proto;
pub mod request;
pub mod response;
pub mod serialization;

// Process concerns
pub mod config;
pub mod server;

// Re-export key types
pub use error::{FunctionError, ResultExt};
pub use extraction::{Extractor, FieldPath};
pub use resource::{Composite, DesiredComposed, Name, ObservedComposed, Ready, Unstructured};
pub use function::{composed_resource_name, sql_instance, Function, FunctionRunner};
pub use proto::{Condition, FunctionResult, RunFunctionRequest, RunFunctionResponse, Severity, Status, Target};
pub use serialization::{load_request, parse_request, SerializationError};
pub use config::{ConfigError, FunctionConfig};
