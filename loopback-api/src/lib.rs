//! loopback-api: the simulated backend behind an in-process transport.
//!
//! [`Adapter`] is the entry point. It owns a [`Dispatcher`], which resolves
//! a request to a typed [`Endpoint`] and runs its handler against the
//! [`loopback_store::Repository`].

pub mod adapter;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod endpoint;
pub mod handlers;

pub use adapter::{Adapter, Transport};
pub use config::{SimConfig, ENV_PREFIX};
pub use context::{HandlerCtx, Reply};
pub use dispatcher::Dispatcher;
pub use endpoint::{route_table, Endpoint, Resource, RouteKey, Transition};

pub use loopback_core::{Rejection, RequestDescriptor, ResponseEnvelope};
