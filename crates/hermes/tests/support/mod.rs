//! Handlers for the `basic` fixture service.

use std::path::PathBuf;

use anyhow::anyhow;
use hermes::{HandlerRegistry, HandlerResponse};
use serde_json::json;

pub fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/basic")
}

pub fn registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();

    registry
        .direct("handler.hello", |event, _ctx| async move {
            Ok(HandlerResponse::ok().json(&json!({
                "message": "Go Serverless v1.0! Your function executed successfully!",
                "input": event,
            }))?)
        })
        .direct("handler.env", |event, ctx| async move {
            let simple = std::env::var("MY_SIMPLE").unwrap_or_default();
            Ok(HandlerResponse::ok().json(&json!({
                "message": format!("process.env.MY_SIMPLE=={simple}"),
                "context": ctx.environment(),
                "clientContext": ctx.client_context(),
                "input": event,
            }))?)
        })
        .direct("handler.postit", |event, _ctx| async move {
            let body = event.body().unwrap_or_default();
            Ok(HandlerResponse::ok().json(&json!({ "message": format!("postit:{body}") }))?)
        })
        .direct("handler.throwWorld", |_event, _ctx| async move {
            Err::<HandlerResponse, _>(anyhow!("This is an error"))
        })
        .callback("handler.errorWorld", |_event, _ctx, done| {
            done.fail(anyhow!("Error passed to callback"));
        })
        .callback("handler.callbackWorld", |event, _ctx, done| {
            let response = HandlerResponse::ok()
                .header("content-type", "application/json; charset=utf-8")
                .body(json!({ "path": event.path }).to_string());
            done.succeed(response);
        })
        .direct("handler.panicWorld", |_event, _ctx| async move {
            let status: u16 = "teapot".parse().unwrap_or_else(|_| panic!("handler blew up"));
            Ok(HandlerResponse::new(status))
        })
        .callback("handler.forgetWorld", |_event, _ctx, done| {
            drop(done);
        });

    registry
}
