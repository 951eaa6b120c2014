//! The invocation normalizer.
//!
//! Runs a handler under the uniform completion contract and maps its outcome
//! into a [`NormalizedResponse`]: a success is passed through with its JSON
//! body parsed, a handler failure becomes a `502`.

use tracing::{debug, error};

use crate::context::InvocationContext;
use crate::env::EnvScope;
use crate::error::CoreResult;
use crate::event::ApiGatewayEvent;
use crate::handler::Handler;
use crate::response::NormalizedResponse;

/// Where the declared environment is made visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvMode {
    /// Context plus the process environment, restored afterwards.
    #[default]
    Process,
    /// Only through [`InvocationContext::environment`].
    ContextOnly,
}

/// Invokes a handler and normalizes its outcome.
///
/// Handler failures never surface as `Err`: they are logged and turned into
/// a `502` response. An `Err` means a JSON-declared body failed to parse.
///
/// # Example
///
/// ```
/// use hermes_core::{invoke_handler, ApiGatewayEvent, EnvMode, Handler, InvocationContext};
/// use serde_json::json;
///
/// let handler = Handler::direct(|_event, _ctx| async move {
///     Err::<hermes_core::HandlerResponse, _>(anyhow::anyhow!("nope"))
/// });
/// let event: ApiGatewayEvent = serde_json::from_value(json!({
///     "httpMethod": "GET", "path": "/", "resource": "/",
///     "pathParameters": {}, "queryStringParameters": {},
/// }))
/// .unwrap();
///
/// let response = tokio_test::block_on(invoke_handler(
///     &handler,
///     event,
///     InvocationContext::new("f", "h.f"),
///     EnvMode::ContextOnly,
/// ))
/// .unwrap();
///
/// assert_eq!(response.status_code, 502);
/// assert_eq!(response.body["debug_error_message"], "nope");
/// ```
pub async fn invoke_handler(
    handler: &Handler,
    event: ApiGatewayEvent,
    ctx: InvocationContext,
    env_mode: EnvMode,
) -> CoreResult<NormalizedResponse> {
    let request_id = ctx.request_id();
    let function = ctx.function_name().to_string();

    let outcome = match env_mode {
        EnvMode::Process => {
            let vars = ctx.environment().clone();
            EnvScope::run(&vars, handler.call(event, ctx)).await
        }
        EnvMode::ContextOnly => handler.call(event, ctx).await,
    };

    match outcome {
        Ok(response) => {
            debug!(
                request_id = %request_id,
                function = %function,
                status = response.status_code,
                "handler completed"
            );
            NormalizedResponse::from_handler(response)
        }
        Err(failure) => {
            error!(
                request_id = %request_id,
                function = %function,
                error = %failure.message,
                stack = %failure.stack,
                "handler failed"
            );
            Ok(NormalizedResponse::bad_gateway(&failure))
        }
    }
}
