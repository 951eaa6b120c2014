//! # Hermes Core
//!
//! Event synthesis, handler model and invocation normalization for Hermes.
//!
//! This crate provides the types that sit between a matched route and a
//! normalized response:
//!
//! - [`ApiGatewayEvent`] - The gateway-style event a handler receives
//! - [`InvocationContext`] - Request id, function identity and declared environment
//! - [`Handler`] - Direct or callback-style handler, adapted to one future
//! - [`HandlerRegistry`] - Handler references mapped to registered handlers
//! - [`NormalizedResponse`] - Uniform result, with `502` for handler failures
//! - [`EnvScope`] - Scoped, serialized process-environment application

mod context;
mod env;
mod error;
mod event;
mod handler;
mod invoke;
mod registry;
mod response;

pub use context::{InvocationContext, RequestId};
pub use env::{snapshot_env, EnvScope};
pub use error::{CoreError, CoreResult, HandlerFailure};
pub use event::{ApiGatewayEvent, COMPUTED_FIELDS};
pub use handler::{
    BoxedHandlerFuture, Callback, CallbackFn, DirectFn, Handler, HandlerResult, InvocationStyle,
};
pub use invoke::{invoke_handler, EnvMode};
pub use registry::HandlerRegistry;
pub use response::{HandlerResponse, NormalizedResponse, INTERNAL_SERVER_ERROR_MESSAGE};
