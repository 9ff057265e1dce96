use tracing::trace;

use crate::http::Headers;

/// Outcome of checking a request's validators against the current ETag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// The client's copy is current; answer `304`.
    NotModified,
    /// Send the full representation.
    Modified,
}

/// Compares the request's conditional headers with `etag`.
///
/// `If-None-Match` must equal the ETag byte for byte, quotes included. Weak
/// validators, lists and `*` are not recognised. `If-Modified-Since` is read
/// but never compared with `Last-Modified`.
pub fn evaluate(headers: &Headers, etag: &str) -> Freshness {
    if headers.get("if-none-match") == Some(etag) {
        return Freshness::NotModified;
    }

    if let Some(since) = headers.get("if-modified-since") {
        trace!(since, "If-Modified-Since present, not compared");
    }

    Freshness::Modified
}
