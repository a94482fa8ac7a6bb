/// Function runner wire protocol
///
/// Request and response records exchanged between the pipeline host and the
/// function, plus the serde adapters they need.

pub mod messages;
pub mod duration;

pub use messages::{
    Condition, FunctionResult, RequestMeta, Resource, ResponseMeta, RunFunctionRequest,
    RunFunctionResponse, Severity, State, Status, Target,
};
