//! Process-wide and per-request state handed to handlers.
//!
//! [`ServerContext`] is built once at startup and passed by reference into
//! every handler; it is never mutated afterwards. [`RequestEcho`] is the
//! transient snapshot of a request that the echo endpoints serialize back.

use std::borrow::Cow;
use std::time::SystemTime;

use serde_json::{Map, Value};

use crate::Request;
use crate::cache::ResourceStore;

/// Immutable state shared by all connections.
#[derive(Debug, Clone)]
pub struct ServerContext {
    name: String,
    resources: ResourceStore,
    last_modified: String,
}

impl ServerContext {
    /// Creates a context over the seeded dataset, stamping `Last-Modified`
    /// with the current time.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_resources(name, ResourceStore::seeded())
    }

    pub fn with_resources(name: impl Into<String>, resources: ResourceStore) -> Self {
        Self {
            name: name.into(),
            resources,
            last_modified: httpdate::fmt_http_date(SystemTime::now()),
        }
    }

    /// Overrides the fixed `Last-Modified` instant.
    #[must_use]
    pub fn last_modified_at(mut self, at: SystemTime) -> Self {
        self.last_modified = httpdate::fmt_http_date(at);
        self
    }

    /// Name echoed into response bodies and log lines.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resources(&self) -> &ResourceStore {
        &self.resources
    }

    /// HTTP-date sent as `Last-Modified` on every `/api/*` response.
    pub fn last_modified(&self) -> &str {
        &self.last_modified
    }
}

/// The parts of a request reported back by the echo endpoints.
#[derive(Debug)]
pub struct RequestEcho<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub headers: Map<String, Value>,
    pub body: Cow<'a, str>,
}

impl<'a> RequestEcho<'a> {
    /// Snapshots `request`. `path` is the full request target; for repeated
    /// header names the first value is kept.
    pub fn capture(request: &'a Request) -> Self {
        let mut headers = Map::new();
        for (name, value) in request.headers().iter() {
            headers
                .entry(name)
                .or_insert_with(|| Value::String(value.to_owned()));
        }

        Self {
            method: request.method().as_str(),
            path: request.target(),
            headers,
            body: request.body_text(),
        }
    }
}

/// Local wall-clock time, ISO-8601 with microseconds and no offset.
pub fn timestamp() -> String {
    chrono::Local::now()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}
