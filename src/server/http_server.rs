//! HTTP server implementation.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use log::{debug, error, info, warn};

use crate::parser::{find_head_end, parse_request, HttpRequest, Method};
use crate::server::config::ServerConfig;
use crate::server::error::Error;
use crate::server::mux::not_found;
use crate::server::response::{HttpResponse, StatusCode};

/// Size of each read from the socket while collecting the request head.
const READ_CHUNK_SIZE: usize = 1024;

/// Pause before accepting again after a transient accept error.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// An HTTP server.
///
/// The configuration is frozen when the server is created; connection tasks
/// share it read-only.
pub struct HttpServer {
    config: Arc<ServerConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// The configuration this server was built with.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bind the configured address and serve until a fatal error.
    ///
    /// Never returns `Ok`: either the address cannot be bound
    /// ([`Error::Bind`]) or accepting connections fails for good.
    pub async fn listen_and_serve(&self) -> Result<(), Error> {
        let listener = self.setup_listener().await?;
        self.serve(listener).await
    }

    /// Set up the TCP listener.
    async fn setup_listener(&self) -> Result<TcpListener, Error> {
        let bind_addr = self.config.bind_addr();
        TcpListener::bind(&bind_addr).await.map_err(|source| Error::Bind {
            addr: self.config.addr.clone(),
            source,
        })
    }

    /// Log the effective configuration.
    fn display_server_info(&self, local_addr: Option<SocketAddr>) {
        match local_addr {
            Some(addr) => info!("Server listening on http://{addr}"),
            None => info!("Server listening on {addr}", addr = self.config.addr),
        }
        info!(
            "read timeout {read:?}, write timeout {write:?}, max connections {max}",
            read = self.config.read_timeout,
            write = self.config.write_timeout,
            max = self.config.max_connections,
        );
        if self.config.handler.is_none() {
            warn!("No handler configured, every request will get 404");
        }
    }

    /// Accept connections on `listener` and serve each one on its own task.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), Error> {
        self.display_server_info(listener.local_addr().ok());

        // Bounds the number of connections served concurrently
        let permits = self.config.max_connections.min(Semaphore::MAX_PERMITS);
        let semaphore = Arc::new(Semaphore::new(permits));

        loop {
            match listener.accept().await {
                Ok((socket, addr)) => self.handle_new_connection(socket, addr, &semaphore),
                Err(e) => {
                    if is_fatal_accept_error(&e) {
                        error!("Critical error accepting connection: {e}");
                        return Err(Error::IoError(e));
                    }
                    warn!("Error accepting connection: {e}; retrying in {ACCEPT_RETRY_DELAY:?}");
                    tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                }
            }
        }
    }

    /// Spawn the task serving a freshly accepted connection.
    fn handle_new_connection(&self, mut socket: TcpStream, addr: SocketAddr, semaphore: &Arc<Semaphore>) {
        let config = Arc::clone(&self.config);

        let Ok(permit) = Arc::clone(semaphore).try_acquire_owned() else {
            warn!("Connection limit reached, rejecting connection from {addr}");
            tokio::spawn(async move {
                let response = HttpResponse::new(StatusCode::ServiceUnavailable)
                    .with_content_type("text/plain")
                    .with_body_string("Server is at capacity, please try again later");
                if let Err(e) = write_response(&mut socket, &response, config.write_timeout).await {
                    debug!("Failed to reject {addr}: {e}");
                }
            });
            return;
        };

        debug!("Accepted connection from {addr}");
        tokio::spawn(async move {
            // The permit is dropped when the task completes, releasing the slot
            let _permit = permit;

            match Self::handle_connection(&mut socket, &config).await {
                Ok(()) => {}
                Err(e @ (Error::ReadTimeout | Error::WriteTimeout)) => {
                    warn!("Connection from {addr}: {e}");
                }
                Err(e) => error!("Error handling connection from {addr}: {e}"),
            }
        });
    }

    /// Serve a single request on `socket`.
    ///
    /// The request is read under the read timeout and the handler plus the
    /// response write run under the write timeout. A timed-out connection is
    /// abandoned without a response.
    pub async fn handle_connection(
        socket: &mut (impl AsyncRead + AsyncWrite + Unpin),
        config: &ServerConfig,
    ) -> Result<(), Error> {
        let read = read_request(socket, config.read_buffer_size, config.max_body_size);
        let request = match within(config.read_timeout, read).await {
            None => return Err(Error::ReadTimeout),
            Some(Ok(Some(request))) => request,
            Some(Ok(None)) => return Ok(()), // Connection closed before a request
            Some(Err(e)) => {
                if let Some(response) = error_response(&e) {
                    write_response(socket, &response, config.write_timeout).await?;
                }
                return Err(e);
            }
        };

        debug!("{method} {path}", method = request.method, path = request.path);
        let head_only = request.method == Method::HEAD;

        let respond = async {
            let result = match &config.handler {
                Some(handler) => handler.call(request).await,
                None => Ok(not_found(&request.path)),
            };

            let (response, outcome) = match result {
                Ok(response) => (response, Ok(())),
                Err(e) => {
                    let response = HttpResponse::new(StatusCode::InternalServerError)
                        .with_content_type("text/plain")
                        .with_body_string(format!("Internal server error: {e}"));
                    (response, Err(e))
                }
            };

            // HEAD responses keep Content-Length but carry no body
            let bytes = if head_only { response.head_bytes() } else { response.to_bytes() };
            socket.write_all(&bytes).await?;
            socket.flush().await?;
            outcome
        };

        within(config.write_timeout, respond)
            .await
            .unwrap_or(Err(Error::WriteTimeout))
    }
}

/// Run `fut` to completion, or give up after `limit`. A zero limit never expires.
async fn within<F: Future>(limit: Duration, fut: F) -> Option<F::Output> {
    if limit.is_zero() {
        Some(fut.await)
    } else {
        tokio::time::timeout(limit, fut).await.ok()
    }
}

/// Read one request: the head up to `max_head` bytes, then a `Content-Length`
/// body of at most `max_body` bytes. `Ok(None)` means the peer closed without
/// sending.
async fn read_request(
    socket: &mut (impl AsyncRead + Unpin),
    max_head: usize,
    max_body: usize,
) -> Result<Option<HttpRequest>, Error> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    let head_end = loop {
        if let Some(end) = find_head_end(&buf) {
            break end;
        }
        if buf.len() >= max_head {
            return Err(Error::HeaderTooLarge(max_head));
        }

        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            if buf.is_empty() {
                return Ok(None);
            }
            return Err(Error::IoError(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed mid-request",
            )));
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    if head_end > max_head {
        return Err(Error::HeaderTooLarge(max_head));
    }

    let request = parse_request(&buf[..head_end])?;
    let content_length = request.content_length()?;
    if content_length > max_body {
        return Err(Error::BodyTooLarge(max_body));
    }

    let mut body = buf.split_off(head_end);
    body.truncate(content_length);
    if body.len() < content_length {
        let missing = (content_length - body.len()) as u64;
        socket.take(missing).read_to_end(&mut body).await?;
        if body.len() < content_length {
            return Err(Error::IoError(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed mid-body",
            )));
        }
    }

    Ok(Some(request.with_body(body)))
}

/// The response sent before dropping a request that could not be read.
fn error_response(e: &Error) -> Option<HttpResponse> {
    match e {
        Error::ParseError(parse_error) => Some(
            HttpResponse::new(StatusCode::BadRequest)
                .with_content_type("text/plain")
                .with_body_string(format!("Error parsing request: {parse_error}")),
        ),
        Error::HeaderTooLarge(_) => Some(
            HttpResponse::new(StatusCode::RequestHeaderFieldsTooLarge)
                .with_content_type("text/plain")
                .with_body_string(e.to_string()),
        ),
        Error::BodyTooLarge(_) => Some(
            HttpResponse::new(StatusCode::PayloadTooLarge)
                .with_content_type("text/plain")
                .with_body_string(e.to_string()),
        ),
        _ => None,
    }
}

async fn write_response(
    socket: &mut (impl AsyncWrite + Unpin),
    response: &HttpResponse,
    limit: Duration,
) -> Result<(), Error> {
    let write = async {
        socket.write_all(&response.to_bytes()).await?;
        socket.flush().await
    };
    match within(limit, write).await {
        Some(result) => Ok(result?),
        None => Err(Error::WriteTimeout),
    }
}

/// Accept errors that mean the listener itself is unusable.
fn is_fatal_accept_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::BrokenPipe | io::ErrorKind::InvalidInput | io::ErrorKind::NotConnected
    )
}
