//! k1s0-exception-handler: API exception handling for k1s0 servers.
//!
//! Normalizes faults raised while serving a request into either a structured
//! JSON error body (API-scoped requests) or a hand-off to the host's default
//! renderer. Maintenance signals are remapped into the application's own
//! exception kinds, and unknown faults are only disclosed in debug posture or
//! when the caller explicitly asks for test mode.

pub mod config;
pub mod context;
pub mod error;
pub mod fault;
pub mod registry;
pub mod report;
pub mod resolver;
pub mod response;

#[cfg(feature = "axum")]
pub mod maintenance;
#[cfg(feature = "axum")]
pub mod middleware;
#[cfg(feature = "axum")]
pub mod renderer;

pub use config::{ConfigError, HandlerConfig};
pub use context::{Posture, RequestContext};
pub use error::HandlerError;
pub use fault::{ApiFault, DomainFault, Fault, MaintenanceSignal};
pub use registry::{ExceptionKindRegistry, ExceptionKindRegistryBuilder, ExceptionRole};
pub use report::Reporter;
pub use resolver::{Outcome, ResponseResolver};
pub use response::{ErrorBody, ErrorCode, ErrorDetail, ErrorResponse};

#[cfg(feature = "axum")]
pub use maintenance::{maintenance_middleware, MaintenanceSwitch};
#[cfg(feature = "axum")]
pub use middleware::{exception_middleware, ExceptionHandler};
#[cfg(feature = "axum")]
pub use renderer::{DefaultRenderer, PlainTextRenderer};

#[cfg(all(feature = "axum", feature = "mock"))]
pub use renderer::MockDefaultRenderer;
