//! Request routing — map HTTP methods and path patterns to handler functions.
//!
//! [`Router`] is an ordered dispatch table. Each entry pairs a [`Method`] and a
//! path pattern with a plain function pointer that receives the shared state
//! and the request. Three pattern styles are supported:
//!
//! | Pattern    | Example match     |
//! |------------|-------------------|
//! | `/health`  | `/health` only    |
//! | `/api/*`   | `/api/users`      |
//! | `*`        | any path          |
//!
//! Patterns are compared against the full request target, query string
//! included: `/health/` and `/health?x=1` do not match `/health`.
//! Routes are matched in registration order; the first route whose method and
//! pattern both match the incoming request wins.

use crate::{Method, Request, Response, StatusCode};

/// A route handler: shared state plus the request in, response out.
pub type Handler<S> = fn(&S, &Request) -> Response;

// Compiled representation of a route pattern string.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Pattern {
    // Matches one exact path string, e.g. `/health`.
    Exact(String),
    // Matches any path under the prefix, which keeps its trailing slash, e.g. `/api/`.
    Prefix(String),
    // Matches every path.
    Any,
}

impl Pattern {
    /// Parse a route pattern string into a `Pattern`.
    ///
    /// 1. `*` → [`Pattern::Any`].
    /// 2. Ends with `/*` → [`Pattern::Prefix`] over everything before the `*`.
    /// 3. Otherwise → [`Pattern::Exact`].
    fn parse(pattern: &str) -> Self {
        if pattern == "*" {
            return Pattern::Any;
        }

        if let Some(prefix) = pattern.strip_suffix('*').filter(|p| p.ends_with('/')) {
            return Pattern::Prefix(prefix.to_string());
        }

        Pattern::Exact(pattern.to_string())
    }

    fn matches(&self, path: &str) -> bool {
        match self {
            Pattern::Exact(p) => p == path,
            Pattern::Prefix(prefix) => path.starts_with(prefix.as_str()),
            Pattern::Any => true,
        }
    }
}

// A single registered route binding a method + pattern to a handler.
struct Route<S> {
    method: Method,
    pattern: Pattern,
    handler: Handler<S>,
}

impl<S> Route<S> {
    fn matches(&self, method: &Method, path: &str) -> bool {
        &self.method == method && self.pattern.matches(path)
    }
}

/// HTTP request router over shared state `S`.
///
/// When no route matches, `501 Not Implemented` is returned, mirroring a
/// server that has no handler for the request's method.
///
/// # Examples
///
/// ```
/// use mock_upstream::{Request, Response, Router, StatusCode};
///
/// fn pong(_state: &(), _req: &Request) -> Response {
///     Response::new(StatusCode::Ok).body("pong")
/// }
///
/// let mut router: Router<()> = Router::new();
/// router.get("/ping", pong);
///
/// let (req, _) = Request::parse(b"GET /ping HTTP/1.1\r\n\r\n").unwrap();
/// assert_eq!(router.route(&(), &req).status(), StatusCode::Ok);
/// ```
pub struct Router<S> {
    routes: Vec<Route<S>>,
}

impl<S> Default for Router<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Router<S> {
    /// Create a new, empty `Router` with no registered routes.
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Register a handler for `GET` requests matching `pattern`.
    pub fn get(&mut self, pattern: &str, handler: Handler<S>) -> &mut Self {
        self.add_route(Method::Get, pattern, handler)
    }

    /// Register a handler for `POST` requests matching `pattern`.
    pub fn post(&mut self, pattern: &str, handler: Handler<S>) -> &mut Self {
        self.add_route(Method::Post, pattern, handler)
    }

    /// Register a handler for `PUT` requests matching `pattern`.
    pub fn put(&mut self, pattern: &str, handler: Handler<S>) -> &mut Self {
        self.add_route(Method::Put, pattern, handler)
    }

    /// Register a handler for `DELETE` requests matching `pattern`.
    pub fn delete(&mut self, pattern: &str, handler: Handler<S>) -> &mut Self {
        self.add_route(Method::Delete, pattern, handler)
    }

    fn add_route(&mut self, method: Method, pattern: &str, handler: Handler<S>) -> &mut Self {
        self.routes.push(Route {
            method,
            pattern: Pattern::parse(pattern),
            handler,
        });
        self
    }

    /// Return the number of routes registered in this router.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Return `true` if no routes have been registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Dispatch `request` to the first matching route and return its response.
    pub fn route(&self, state: &S, request: &Request) -> Response {
        let method = request.method();
        let target = request.target();

        match self.routes.iter().find(|route| route.matches(method, target)) {
            Some(route) => (route.handler)(state, request),
            None => Response::new(StatusCode::NotImplemented)
                .body(format!("Unsupported method ('{method}')")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_request(method: &str, path: &str) -> Request {
        let raw = format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\n\r\n");
        let (req, _) = Request::parse(raw.as_bytes()).unwrap();
        req
    }

    fn ok(_: &(), _: &Request) -> Response {
        Response::new(StatusCode::Ok).body("ok")
    }

    fn exact(_: &(), _: &Request) -> Response {
        Response::new(StatusCode::Ok).body("exact")
    }

    fn prefix(_: &(), _: &Request) -> Response {
        Response::new(StatusCode::Ok).body("prefix")
    }

    fn any(_: &(), _: &Request) -> Response {
        Response::new(StatusCode::Ok).body("any")
    }

    fn echo_state(state: &String, _: &Request) -> Response {
        Response::new(StatusCode::Ok).body(state.clone())
    }

    // ── Pattern ───────────────────────────────────────────────────────────────

    #[test]
    fn pattern_parse_variants() {
        assert_eq!(Pattern::parse("/health"), Pattern::Exact("/health".into()));
        assert_eq!(Pattern::parse("/api/*"), Pattern::Prefix("/api/".into()));
        assert_eq!(Pattern::parse("*"), Pattern::Any);
    }

    #[test]
    fn exact_pattern_is_verbatim() {
        let pat = Pattern::parse("/health");
        assert!(pat.matches("/health"));
        assert!(!pat.matches("/health/"));
        assert!(!pat.matches("/healthz"));
    }

    #[test]
    fn prefix_pattern_requires_separator() {
        let pat = Pattern::parse("/api/*");
        assert!(pat.matches("/api/users"));
        assert!(pat.matches("/api/"));
        assert!(pat.matches("/api/a/b/c"));
        assert!(!pat.matches("/api"));
        assert!(!pat.matches("/apiary"));
    }

    // ── Router ────────────────────────────────────────────────────────────────

    #[test]
    fn router_starts_empty() {
        let router: Router<()> = Router::default();
        assert!(router.is_empty());
        assert_eq!(router.len(), 0);
    }

    #[test]
    fn unmatched_method_is_not_implemented() {
        let mut router: Router<()> = Router::new();
        router.get("*", ok);
        let res = router.route(&(), &make_request("PATCH", "/"));
        assert_eq!(res.status(), StatusCode::NotImplemented);
        assert_eq!(res.content(), b"Unsupported method ('PATCH')");
    }

    #[test]
    fn first_matching_route_wins() {
        let mut router: Router<()> = Router::new();
        router.get("/health", exact).get("/api/*", prefix).get("*", any);
        assert_eq!(router.len(), 3);

        let content = |path| router.route(&(), &make_request("GET", path)).content().to_vec();
        assert_eq!(content("/health"), b"exact");
        assert_eq!(content("/api/users"), b"prefix");
        assert_eq!(content("/other"), b"any");
    }

    #[test]
    fn query_string_is_part_of_the_matched_target() {
        let mut router: Router<()> = Router::new();
        router.get("/health", exact).get("/api/*", prefix).get("*", any);
        let content = |path| router.route(&(), &make_request("GET", path)).content().to_vec();
        assert_eq!(content("/health?verbose=1"), b"any");
        assert_eq!(content("/api/users?page=2"), b"prefix");
    }

    #[test]
    fn method_variants_registered() {
        let mut router: Router<()> = Router::new();
        router.post("*", ok).put("*", ok).delete("*", ok);
        for method in ["POST", "PUT", "DELETE"] {
            let res = router.route(&(), &make_request(method, "/r"));
            assert_eq!(res.status(), StatusCode::Ok, "{method}");
        }
        let res = router.route(&(), &make_request("GET", "/r"));
        assert_eq!(res.status(), StatusCode::NotImplemented);
    }

    #[test]
    fn handlers_receive_state() {
        let mut router: Router<String> = Router::new();
        router.get("*", echo_state);
        let res = router.route(&"backend-a".to_string(), &make_request("GET", "/"));
        assert_eq!(res.content(), b"backend-a");
    }
}
