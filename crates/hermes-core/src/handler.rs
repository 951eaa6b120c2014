//! Handler model and the uniform completion contract.
//!
//! Handlers come in two styles:
//!
//! - **Direct**: an async function returning `Result<HandlerResponse, anyhow::Error>`
//! - **Callback**: a function receiving a single-use [`Callback`] it must complete
//!
//! [`Handler::call`] adapts both into one future whose error side is a
//! [`HandlerFailure`]. Panics in either style, and a callback dropped without
//! being completed, are failures too.

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;

use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::context::InvocationContext;
use crate::error::HandlerFailure;
use crate::event::ApiGatewayEvent;
use crate::response::HandlerResponse;

/// What a handler produces: a response, or an error describing the failure.
pub type HandlerResult = Result<HandlerResponse, anyhow::Error>;

/// Type alias for a boxed handler future.
pub type BoxedHandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send>>;

/// A type-erased direct handler.
pub type DirectFn = Arc<dyn Fn(ApiGatewayEvent, InvocationContext) -> BoxedHandlerFuture + Send + Sync>;

/// A type-erased callback handler.
pub type CallbackFn = Arc<dyn Fn(ApiGatewayEvent, InvocationContext, Callback) + Send + Sync>;

/// How a handler signals completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationStyle {
    /// Completion is the returned future's output.
    Direct,
    /// Completion is a call to the supplied [`Callback`].
    Callback,
}

/// Single-use completion handle for callback-style handlers.
///
/// Every method consumes the callback, so it can be completed at most once.
/// Dropping it without completing fails the invocation.
#[derive(Debug)]
pub struct Callback {
    tx: oneshot::Sender<HandlerResult>,
}

impl Callback {
    fn channel() -> (Self, oneshot::Receiver<HandlerResult>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Completes the invocation with a result.
    pub fn complete(self, result: HandlerResult) {
        // The receiver is gone only if the invocation was abandoned.
        let _ = self.tx.send(result);
    }

    /// Completes the invocation successfully.
    pub fn succeed(self, response: HandlerResponse) {
        self.complete(Ok(response));
    }

    /// Completes the invocation with an error.
    pub fn fail(self, error: impl Into<anyhow::Error>) {
        self.complete(Err(error.into()));
    }
}

/// A registered handler.
///
/// # Example
///
/// ```
/// use hermes_core::{ApiGatewayEvent, Handler, HandlerResponse, InvocationContext, InvocationStyle};
///
/// let direct = Handler::direct(|event: ApiGatewayEvent, _ctx: InvocationContext| async move {
///     Ok(HandlerResponse::ok().body(event.path))
/// });
/// assert_eq!(direct.style(), InvocationStyle::Direct);
///
/// let callback = Handler::callback(|_event, _ctx, done| {
///     done.succeed(HandlerResponse::ok().body("called back"));
/// });
/// assert_eq!(callback.style(), InvocationStyle::Callback);
/// ```
#[derive(Clone)]
pub enum Handler {
    /// An async handler.
    Direct(DirectFn),
    /// A handler completing through a [`Callback`].
    Callback(CallbackFn),
}

impl Handler {
    /// Wraps an async function as a direct handler.
    pub fn direct<F, Fut>(func: F) -> Self
    where
        F: Fn(ApiGatewayEvent, InvocationContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self::Direct(Arc::new(move |event, ctx| Box::pin(func(event, ctx))))
    }

    /// Wraps a function as a callback handler.
    pub fn callback<F>(func: F) -> Self
    where
        F: Fn(ApiGatewayEvent, InvocationContext, Callback) + Send + Sync + 'static,
    {
        Self::Callback(Arc::new(func))
    }

    /// Returns the handler's invocation style.
    #[must_use]
    pub const fn style(&self) -> InvocationStyle {
        match self {
            Self::Direct(_) => InvocationStyle::Direct,
            Self::Callback(_) => InvocationStyle::Callback,
        }
    }

    /// Invokes the handler and waits for it to complete.
    ///
    /// # Example
    ///
    /// ```
    /// use hermes_core::{ApiGatewayEvent, Handler, InvocationContext};
    /// use serde_json::json;
    ///
    /// let handler = Handler::callback(|_event, _ctx, done| {
    ///     done.fail(anyhow::anyhow!("Error passed to callback"));
    /// });
    ///
    /// let event: ApiGatewayEvent = serde_json::from_value(json!({
    ///     "httpMethod": "GET", "path": "/", "resource": "/",
    ///     "pathParameters": {}, "queryStringParameters": {},
    /// }))
    /// .unwrap();
    ///
    /// let failure = tokio_test::block_on(handler.call(event, InvocationContext::new("f", "h.f")))
    ///     .unwrap_err();
    /// assert_eq!(failure.message, "Error passed to callback");
    /// ```
    pub async fn call(
        &self,
        event: ApiGatewayEvent,
        ctx: InvocationContext,
    ) -> Result<HandlerResponse, HandlerFailure> {
        let result = match self {
            Self::Direct(func) => {
                let future = panic::catch_unwind(AssertUnwindSafe(|| func(event, ctx)))
                    .map_err(|payload| HandlerFailure::from_panic(payload.as_ref()))?;
                AssertUnwindSafe(future)
                    .catch_unwind()
                    .await
                    .map_err(|payload| HandlerFailure::from_panic(payload.as_ref()))?
            }
            Self::Callback(func) => {
                let (callback, completion) = Callback::channel();
                panic::catch_unwind(AssertUnwindSafe(|| func(event, ctx, callback)))
                    .map_err(|payload| HandlerFailure::from_panic(payload.as_ref()))?;
                completion
                    .await
                    .map_err(|_| HandlerFailure::callback_dropped())?
            }
        };

        result.map_err(|err| HandlerFailure::from_error(&err))
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Handler").field(&self.style()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event() -> ApiGatewayEvent {
        serde_json::from_value(json!({
            "httpMethod": "GET",
            "path": "/api/hello",
            "resource": "/api/hello",
            "pathParameters": {},
            "queryStringParameters": {},
        }))
        .unwrap()
    }

    fn ctx() -> InvocationContext {
        InvocationContext::new("hello", "handler.hello")
    }

    #[tokio::test]
    async fn test_direct_success() {
        let handler = Handler::direct(|event: ApiGatewayEvent, _ctx| async move {
            Ok(HandlerResponse::ok().body(event.path))
        });
        let response = handler.call(event(), ctx()).await.unwrap();
        assert_eq!(response.body.as_deref(), Some("/api/hello"));
    }

    #[tokio::test]
    async fn test_direct_error() {
        let handler = Handler::direct(|_event, _ctx| async move {
            Err::<HandlerResponse, _>(anyhow::anyhow!("Error thrown from handler"))
        });
        let failure = handler.call(event(), ctx()).await.unwrap_err();
        assert_eq!(failure.message, "Error thrown from handler");
    }

    #[tokio::test]
    async fn test_direct_panic_before_future() {
        let handler = Handler::direct(|_event, _ctx| -> std::future::Ready<HandlerResult> {
            panic!("sync boom")
        });
        let failure = handler.call(event(), ctx()).await.unwrap_err();
        assert_eq!(failure.message, "sync boom");
    }

    #[tokio::test]
    async fn test_direct_panic_inside_future() {
        let handler = Handler::direct(|_event, _ctx| async move {
            if true {
                panic!("async boom");
            }
            Ok(HandlerResponse::ok())
        });
        let failure = handler.call(event(), ctx()).await.unwrap_err();
        assert_eq!(failure.message, "async boom");
    }

    #[tokio::test]
    async fn test_callback_success() {
        let handler = Handler::callback(|_event, ctx, done| {
            done.succeed(HandlerResponse::ok().body(ctx.function_name().to_string()));
        });
        let response = handler.call(event(), ctx()).await.unwrap();
        assert_eq!(response.body.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_callback_completed_from_task() {
        let handler = Handler::callback(|_event, _ctx, done| {
            tokio::spawn(async move {
                tokio::task::yield_now().await;
                done.succeed(HandlerResponse::new(201));
            });
        });
        let response = handler.call(event(), ctx()).await.unwrap();
        assert_eq!(response.status_code, 201);
    }

    #[tokio::test]
    async fn test_callback_error() {
        let handler = Handler::callback(|_event, _ctx, done| {
            done.fail(anyhow::anyhow!("Error passed to callback"));
        });
        let failure = handler.call(event(), ctx()).await.unwrap_err();
        assert_eq!(failure.message, "Error passed to callback");
    }

    #[tokio::test]
    async fn test_callback_dropped() {
        let handler = Handler::callback(|_event, _ctx, _done| {});
        let failure = handler.call(event(), ctx()).await.unwrap_err();
        assert_eq!(failure, HandlerFailure::callback_dropped());
    }

    #[tokio::test]
    async fn test_callback_panic() {
        let handler = Handler::callback(|_event, _ctx, _done| panic!("callback boom"));
        let failure = handler.call(event(), ctx()).await.unwrap_err();
        assert_eq!(failure.message, "callback boom");
    }

    #[test]
    fn test_handler_debug_shows_style() {
        let handler = Handler::callback(|_e, _c, done| done.succeed(HandlerResponse::ok()));
        assert_eq!(format!("{handler:?}"), "Handler(Callback)");
    }
}
