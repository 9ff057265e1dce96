//! # mock-upstream
//!
//! A small HTTP/1.1 backend that answers a reverse proxy with JSON describing
//! each request it received, plus ETag-based conditional caching for a seeded
//! dataset under `/api/*`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use mock_upstream::{MockBackend, Request, Server, ServerContext};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::bind("127.0.0.1:9090").await?;
//!     let backend = Arc::new(MockBackend::new(ServerContext::new("server1")));
//!     server.run(move |req: Request| {
//!         let backend = Arc::clone(&backend);
//!         async move { backend.handle(&req) }
//!     }).await?;
//!     Ok(())
//! }
//! ```

// ── Transport ─────────────────────────────────────────────────────────────────
pub mod http;
pub mod router;
pub mod server;

// ── Mock backend ──────────────────────────────────────────────────────────────
pub mod cache;
pub mod config;
pub mod context;
pub mod handlers;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use config::Config;
pub use context::ServerContext;
pub use handlers::MockBackend;
pub use http::{Headers, Method, Request, Response, StatusCode};
pub use router::Router;
pub use server::{Server, ServerError};
