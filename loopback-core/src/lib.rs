//! loopback-core: transport-agnostic building blocks for the Loopback simulator.
//!
//! Everything here is free of storage and token concerns: the pattern router,
//! the error taxonomy, tenant context, request/response envelopes and the
//! key/value configuration store.

pub mod config;
pub mod envelope;
pub mod errors;
pub mod request;
pub mod router;
pub mod tenant;

pub use config::{ConfigError, ConfigSnapshot, ConfigStore};
pub use envelope::{Body, Pagination, Rejection, RejectedResponse, ResponseEnvelope};
pub use errors::{ApiError, ErrorKind};
pub use request::{ApiRequest, RequestDescriptor};
pub use router::{PathParams, Pattern, PatternError, Router};
pub use tenant::{TenantContext, TenantId};
