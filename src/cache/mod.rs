//! Caching layer — validators, conditional requests, and cache-control policy.
//!
//! The mock backend serves a small immutable dataset under `/api/*`. Each
//! [`ResourceRecord`] folds its content and version into a strong ETag; a
//! request whose `If-None-Match` repeats that ETag verbatim is answered with
//! `304 Not Modified`.
//!
//! Nothing here expires or evicts: records live as long as the process.

pub mod conditional;
pub mod etag;
pub mod store;

pub use conditional::{Freshness, evaluate};
pub use etag::compute_etag;
pub use store::{ResourceRecord, ResourceStore};

/// `Cache-Control` directives the backend attaches to its responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// `/health` — proxies must always revalidate.
    NoCache,
    /// Plain GET echo responses.
    Echo,
    /// Full `/api/*` representations.
    Resource,
    /// `304` answers to a matching `If-None-Match`.
    Revalidated,
}

impl CachePolicy {
    /// Returns the `Cache-Control` header value for this policy.
    pub fn header_value(self) -> &'static str {
        match self {
            Self::NoCache => "no-cache",
            Self::Echo => "max-age=60",
            Self::Resource => "max-age=30, must-revalidate",
            Self::Revalidated => "max-age=120, must-revalidate",
        }
    }
}
