//! Handler registration.
//!
//! Manifests reference handlers as `module.export`. The registry maps those
//! references to Rust handlers; the test author registers one handler per
//! reference the exercised routes need.
//!
//! # Example
//!
//! ```rust
//! use hermes_core::{HandlerRegistry, HandlerResponse};
//!
//! let mut registry = HandlerRegistry::new();
//! registry
//!     .direct("handler.hello", |_event, _ctx| async move {
//!         Ok(HandlerResponse::ok().body("hello"))
//!     })
//!     .callback("handler.callback", |_event, _ctx, done| {
//!         done.succeed(HandlerResponse::ok());
//!     });
//!
//! assert_eq!(registry.len(), 2);
//! assert!(registry.contains("handler.hello"));
//! ```

use std::collections::HashMap;
use std::future::Future;

use hermes_router::HandlerRef;

use crate::context::InvocationContext;
use crate::event::ApiGatewayEvent;
use crate::handler::{Callback, Handler, HandlerResult};

/// Registry of handlers keyed by handler reference.
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<HandlerRef, Handler>,
}

impl HandlerRegistry {
    /// Creates a new empty handler registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler, replacing any previous one for the reference.
    pub fn register(&mut self, handler_ref: impl Into<HandlerRef>, handler: Handler) -> &mut Self {
        self.handlers.insert(handler_ref.into(), handler);
        self
    }

    /// Registers an async handler.
    pub fn direct<F, Fut>(&mut self, handler_ref: impl Into<HandlerRef>, func: F) -> &mut Self
    where
        F: Fn(ApiGatewayEvent, InvocationContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(handler_ref, Handler::direct(func))
    }

    /// Registers a callback-style handler.
    pub fn callback<F>(&mut self, handler_ref: impl Into<HandlerRef>, func: F) -> &mut Self
    where
        F: Fn(ApiGatewayEvent, InvocationContext, Callback) + Send + Sync + 'static,
    {
        self.register(handler_ref, Handler::callback(func))
    }

    /// Registers a handler, builder style.
    #[must_use]
    pub fn with(mut self, handler_ref: impl Into<HandlerRef>, handler: Handler) -> Self {
        self.register(handler_ref, handler);
        self
    }

    /// Looks up a handler by reference.
    #[must_use]
    pub fn get(&self, handler_ref: &HandlerRef) -> Option<&Handler> {
        self.handlers.get(handler_ref)
    }

    /// Returns true if a handler is registered for the reference.
    #[must_use]
    pub fn contains(&self, handler_ref: &str) -> bool {
        self.handlers.contains_key(&HandlerRef::new(handler_ref))
    }

    /// Iterates over registered references, in no particular order.
    pub fn handler_refs(&self) -> impl Iterator<Item = &HandlerRef> {
        self.handlers.keys()
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
