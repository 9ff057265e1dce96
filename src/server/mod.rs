//! Async TCP server using Tokio.
//!
//! Accepts TCP connections and dispatches HTTP/1.1 requests to a handler function.
//! Connections are persistent (keep-alive) until the peer closes them or sends
//! `Connection: close`. The accept loop stops when the shutdown future resolves.

use std::future::{self, Future};
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::BytesMut;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::http::{
    StatusCode,
    request::{Request, RequestError},
    response::Response,
};

/// Errors produced by the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Maximum size of a complete HTTP request we will buffer before rejecting it (8 MiB).
const MAX_REQUEST_SIZE: usize = 8 * 1024 * 1024;

/// Initial read buffer capacity per connection.
const INITIAL_BUF_SIZE: usize = 4096;

/// The mock backend's HTTP listener.
///
/// # Examples
///
/// ```rust,no_run
/// use mock_upstream::server::Server;
/// use mock_upstream::http::{Request, Response, StatusCode};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let server = Server::bind("0.0.0.0:9090").await?;
///     server
///         .run_until(
///             |_req: Request| async { Response::new(StatusCode::Ok).body("up") },
///             async {
///                 let _ = tokio::signal::ctrl_c().await;
///             },
///         )
///         .await?;
///     Ok(())
/// }
/// ```
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl Server {
    /// Binds the server to the given TCP address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound
    /// (e.g. port already in use, insufficient permissions).
    pub async fn bind(addr: impl AsRef<str>) -> Result<Self, ServerError> {
        let addr = addr.as_ref();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.to_owned(),
                source: e,
            })?;
        let local_addr = listener.local_addr()?;
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serves requests forever.
    ///
    /// # Errors
    ///
    /// See [`Server::run_until`].
    pub async fn run<H, F>(self, handler: H) -> Result<(), ServerError>
    where
        H: Fn(Request) -> F + Send + Sync + 'static,
        F: Future<Output = Response> + Send + 'static,
    {
        self.run_until(handler, future::pending()).await
    }

    /// Accepts connections and dispatches requests to `handler` until
    /// `shutdown` resolves, then closes the listener.
    ///
    /// The handler is wrapped in an [`Arc`] and shared across all spawned
    /// Tokio tasks. Connections already in flight are not awaited.
    ///
    /// # Errors
    ///
    /// Individual accept failures are logged and skipped; this currently
    /// always returns `Ok(())`.
    pub async fn run_until<H, F, S>(self, handler: H, shutdown: S) -> Result<(), ServerError>
    where
        H: Fn(Request) -> F + Send + Sync + 'static,
        F: Future<Output = Response> + Send + 'static,
        S: Future<Output = ()>,
    {
        let handler = Arc::new(handler);
        tokio::pin!(shutdown);
        info!(address = %self.local_addr, "mock upstream listening");

        loop {
            let accepted = tokio::select! {
                biased;
                () = &mut shutdown => {
                    info!(address = %self.local_addr, "shutdown requested, closing listener");
                    break;
                }
                accepted = self.listener.accept() => accepted,
            };

            let (stream, peer_addr) = match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    error!(error = %e, "failed to accept connection");
                    continue;
                }
            };

            debug!(peer = %peer_addr, "connection accepted");
            let handler = Arc::clone(&handler);

            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, peer_addr, handler).await {
                    warn!(peer = %peer_addr, error = %e, "connection closed with error");
                }
            });
        }

        Ok(())
    }
}

/// Handles a single TCP connection over its lifetime.
///
/// One request is answered per iteration; pipelined bytes beyond the current
/// request stay in the buffer for the next one.
async fn handle_connection<H, F>(
    mut stream: TcpStream,
    peer_addr: SocketAddr,
    handler: Arc<H>,
) -> Result<(), std::io::Error>
where
    H: Fn(Request) -> F + Send + Sync + 'static,
    F: Future<Output = Response> + Send + 'static,
{
    let mut buf = BytesMut::with_capacity(INITIAL_BUF_SIZE);

    loop {
        // Only read when the buffer cannot already yield a full request.
        let (request, total_needed) = match Request::parse(&buf) {
            Ok((request, body_offset)) => {
                let total_needed = request.frame_len(body_offset);
                if buf.len() >= total_needed {
                    (request, total_needed)
                } else if !read_more(&mut stream, &mut buf, peer_addr).await? {
                    break;
                } else {
                    continue;
                }
            }
            Err(RequestError::Incomplete) => {
                if !read_more(&mut stream, &mut buf, peer_addr).await? {
                    break;
                }
                continue;
            }
            Err(e) => {
                warn!(peer = %peer_addr, error = %e, "bad request — sending 400");
                let response = Response::new(StatusCode::BadRequest)
                    .body(format!("Bad Request: {e}"))
                    .keep_alive(false);
                stream.write_all(&response.into_bytes()).await?;
                break;
            }
        };

        let keep_alive = request.is_keep_alive();

        debug!(
            peer = %peer_addr,
            method = %request.method(),
            path = %request.path(),
            "dispatching request"
        );

        let response = handler(request).await.keep_alive(keep_alive);
        stream.write_all(&response.into_bytes()).await?;
        stream.flush().await?;

        let _ = buf.split_to(total_needed);

        if !keep_alive {
            debug!(peer = %peer_addr, "Connection: close — shutting down");
            break;
        }
    }

    Ok(())
}

/// Reads more bytes into `buf`. Returns `Ok(false)` when the peer has closed
/// the connection or the buffered request has outgrown [`MAX_REQUEST_SIZE`]
/// (after answering it with `413`).
async fn read_more(
    stream: &mut TcpStream,
    buf: &mut BytesMut,
    peer_addr: SocketAddr,
) -> Result<bool, std::io::Error> {
    if buf.len() > MAX_REQUEST_SIZE {
        warn!(peer = %peer_addr, "request too large — sending 413");
        let response = Response::new(StatusCode::PayloadTooLarge)
            .body("Request entity too large")
            .keep_alive(false);
        stream.write_all(&response.into_bytes()).await?;
        return Ok(false);
    }

    if stream.read_buf(buf).await? == 0 {
        debug!(peer = %peer_addr, "connection closed by peer");
        return Ok(false);
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;

    use super::*;
    use crate::context::ServerContext;
    use crate::handlers::MockBackend;

    async fn spawn_backend(name: &str) -> (SocketAddr, oneshot::Sender<()>, tokio::task::JoinHandle<()>) {
        let server = Server::bind("127.0.0.1:0").await.unwrap();
        let addr = server.local_addr();
        let backend = Arc::new(MockBackend::new(ServerContext::new(name)));
        let (tx, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            server
                .run_until(
                    move |req: Request| {
                        let backend = Arc::clone(&backend);
                        async move { backend.handle(&req) }
                    },
                    async {
                        let _ = rx.await;
                    },
                )
                .await
                .unwrap();
        });
        (addr, tx, task)
    }

    /// Sends `raw` on a fresh connection and reads until the server closes it.
    async fn exchange(addr: SocketAddr, raw: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(raw.as_bytes()).await.unwrap();
        let mut out = Vec::new();
        stream.read_to_end(&mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    fn header<'a>(response: &'a str, name: &str) -> Option<&'a str> {
        let (head, _) = response.split_once("\r\n\r\n")?;
        head.lines().skip(1).find_map(|line| {
            let (k, v) = line.split_once(':')?;
            k.eq_ignore_ascii_case(name).then(|| v.trim())
        })
    }

    fn body(response: &str) -> &str {
        response.split_once("\r\n\r\n").map(|(_, b)| b).unwrap_or("")
    }

    #[tokio::test]
    async fn health_over_the_wire() {
        let (addr, _tx, _task) = spawn_backend("wire").await;
        let res = exchange(addr, "GET /health HTTP/1.1\r\nConnection: close\r\n\r\n").await;
        assert!(res.starts_with("HTTP/1.1 200 OK\r\n"));
        assert_eq!(header(&res, "cache-control"), Some("no-cache"));
        assert_eq!(header(&res, "connection"), Some("close"));
        let json: serde_json::Value = serde_json::from_str(body(&res)).unwrap();
        assert_eq!(json["server"], "wire");
    }

    #[tokio::test]
    async fn etag_round_trip_over_one_connection() {
        let (addr, _tx, _task) = spawn_backend("wire").await;

        let first = exchange(addr, "GET /api/users HTTP/1.1\r\nConnection: close\r\n\r\n").await;
        let etag = header(&first, "etag").unwrap().to_owned();
        assert_eq!(
            header(&first, "content-length").unwrap(),
            body(&first).len().to_string()
        );

        let raw = format!(
            "GET /api/users HTTP/1.1\r\nIf-None-Match: {etag}\r\nConnection: close\r\n\r\n"
        );
        let second = exchange(addr, &raw).await;
        assert!(second.starts_with("HTTP/1.1 304 Not Modified\r\n"));
        assert_eq!(header(&second, "etag"), Some(etag.as_str()));
        assert!(body(&second).is_empty());
        assert_eq!(header(&second, "content-length"), None);
    }

    #[tokio::test]
    async fn pipelined_requests_are_answered_in_order() {
        let (addr, _tx, _task) = spawn_backend("pipe").await;
        let raw = "POST /a HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello\
                   DELETE /b HTTP/1.1\r\nConnection: close\r\n\r\n";
        let res = exchange(addr, raw).await;
        let post_at = res.find("\"body\": \"hello\"").unwrap();
        let delete_at = res.find("DELETE received by pipe").unwrap();
        assert!(post_at < delete_at);
        assert_eq!(res.matches("HTTP/1.1 200 OK").count(), 2);
    }

    #[tokio::test]
    async fn body_split_across_writes_is_awaited() {
        let (addr, _tx, _task) = spawn_backend("split").await;
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"PUT /x HTTP/1.1\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhe")
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        stream.write_all(b"llo").await.unwrap();
        let mut out = String::new();
        stream.read_to_string(&mut out).await.unwrap();
        assert!(out.contains("\"body\": \"hello\""));
    }

    #[tokio::test]
    async fn malformed_request_gets_400() {
        let (addr, _tx, _task) = spawn_backend("bad").await;
        let res = exchange(addr, "\x01BAD\r\n\r\n").await;
        assert!(res.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    }

    #[tokio::test]
    async fn shutdown_stops_accept_loop() {
        let (addr, tx, task) = spawn_backend("stop").await;
        tx.send(()).unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(5), task)
            .await
            .expect("accept loop did not stop")
            .unwrap();
        assert!(TcpStream::connect(addr).await.is_err());
    }

    #[tokio::test]
    async fn bind_conflict_is_reported() {
        let server = Server::bind("127.0.0.1:0").await.unwrap();
        let taken = server.local_addr().to_string();
        match Server::bind(&taken).await {
            Err(ServerError::Bind { addr, .. }) => assert_eq!(addr, taken),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("second bind on {taken} succeeded"),
        }
    }
}
