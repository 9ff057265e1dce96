//! Endpoint handlers for the mock backend.
//!
//! | Method   | Path      | Response                                         |
//! |----------|-----------|--------------------------------------------------|
//! | GET      | `/health` | `{status, server}`, `Cache-Control: no-cache`    |
//! | GET      | `/api/*`  | cached resource, `200` or `304` via ETag         |
//! | GET      | other     | request echo, `Cache-Control: max-age=60`        |
//! | POST/PUT | any       | request echo including the body                  |
//! | DELETE   | any       | `{message, path, timestamp}`                     |
//!
//! Every handler logs one `[<server>] <METHOD> <target>` line. No handler
//! fails: odd input degrades to defaults.

use std::borrow::Cow;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::cache::{CachePolicy, Freshness, compute_etag, evaluate};
use crate::context::{RequestEcho, ServerContext, timestamp};
use crate::{Request, Response, Router, StatusCode};

/// The mock backend: its shared context plus the route table over it.
pub struct MockBackend {
    context: ServerContext,
    router: Router<ServerContext>,
}

impl MockBackend {
    pub fn new(context: ServerContext) -> Self {
        Self {
            context,
            router: routes(),
        }
    }

    pub fn context(&self) -> &ServerContext {
        &self.context
    }

    /// Produces the response for one request.
    pub fn handle(&self, request: &Request) -> Response {
        self.router.route(&self.context, request)
    }
}

/// Route table of the mock backend, most specific first.
pub fn routes() -> Router<ServerContext> {
    let mut router: Router<ServerContext> = Router::new();
    router
        .get("/health", health)
        .get("/api/*", cached_resource)
        .get("*", echo_get)
        .post("*", echo_write)
        .put("*", echo_write)
        .delete("*", echo_delete);
    router
}

#[derive(Serialize)]
struct HealthStatus<'a> {
    status: &'static str,
    server: &'a str,
}

#[derive(Serialize)]
struct ResourceEnvelope<'a> {
    server: &'a str,
    data: &'a Value,
    timestamp: String,
}

#[derive(Serialize)]
struct EchoEnvelope<'a> {
    message: String,
    path: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    method: Option<&'a str>,
    timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<Cow<'a, str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    headers: Option<Map<String, Value>>,
}

fn health(ctx: &ServerContext, request: &Request) -> Response {
    log_request(ctx, request);
    let status = HealthStatus {
        status: "healthy",
        server: ctx.name(),
    };
    Response::new(StatusCode::Ok)
        .header("Cache-Control", CachePolicy::NoCache.header_value())
        .json(to_json(&status, false))
}

fn cached_resource(ctx: &ServerContext, request: &Request) -> Response {
    let record = ctx.resources().resolve(request.target());
    let etag = compute_etag(&record);

    if evaluate(request.headers(), &etag) == Freshness::NotModified {
        info!("[{}] 304 Not Modified (ETag match)", ctx.name());
        return Response::new(StatusCode::NotModified)
            .header("ETag", etag)
            .header("Cache-Control", CachePolicy::Revalidated.header_value())
            .header("Last-Modified", ctx.last_modified());
    }

    log_request(ctx, request);
    let envelope = ResourceEnvelope {
        server: ctx.name(),
        data: &record.data,
        timestamp: timestamp(),
    };
    let body = to_json(&envelope, true);

    Response::new(StatusCode::Ok)
        .header("Content-Type", "application/json")
        .header("Content-Length", body.len().to_string())
        .header("ETag", etag)
        .header("Last-Modified", ctx.last_modified())
        .header("Cache-Control", CachePolicy::Resource.header_value())
        .header("Vary", "Accept-Encoding")
        .body(body)
}

fn echo_get(ctx: &ServerContext, request: &Request) -> Response {
    log_request(ctx, request);
    let echo = RequestEcho::capture(request);
    let envelope = EchoEnvelope {
        message: format!("Hello from {}", ctx.name()),
        path: echo.path,
        method: Some("GET"),
        timestamp: timestamp(),
        body: None,
        headers: Some(echo.headers),
    };
    Response::new(StatusCode::Ok)
        .header("Cache-Control", CachePolicy::Echo.header_value())
        .json(to_json(&envelope, true))
}

// PUT shares this handler and is reported as a POST.
fn echo_write(ctx: &ServerContext, request: &Request) -> Response {
    log_request(ctx, request);
    let echo = RequestEcho::capture(request);
    let envelope = EchoEnvelope {
        message: format!("POST received by {}", ctx.name()),
        path: echo.path,
        method: Some("POST"),
        timestamp: timestamp(),
        body: Some(echo.body),
        headers: Some(echo.headers),
    };
    Response::new(StatusCode::Ok).json(to_json(&envelope, true))
}

fn echo_delete(ctx: &ServerContext, request: &Request) -> Response {
    log_request(ctx, request);
    let envelope = EchoEnvelope {
        message: format!("DELETE received by {}", ctx.name()),
        path: request.target(),
        method: None,
        timestamp: timestamp(),
        body: None,
        headers: None,
    };
    Response::new(StatusCode::Ok).json(to_json(&envelope, true))
}

fn log_request(ctx: &ServerContext, request: &Request) {
    info!("[{}] {} {}", ctx.name(), request.method(), request.target());
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> String {
    let encoded = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    encoded.unwrap_or_else(|e| {
        warn!(error = %e, "failed to encode response body");
        String::from("{}")
    })
}
