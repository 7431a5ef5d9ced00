//! A small HTTP server assembled from functional options.
//!
//! A [`ServerConfig`] starts from fixed defaults (`":8080"`, 5 second read and
//! write timeouts, no handler) and is adjusted by a sequence of
//! [`ServerOption`]s. Later options override earlier ones that touch the same
//! field.
//!
//! # Examples
//!
//! ```no_run
//! use std::time::Duration;
//! use serveopt::{new_server, with_address, with_handler, with_timeouts, bootstrap};
//!
//! # async fn run() -> Result<(), serveopt::ServerError> {
//! let server = new_server([
//!     with_address(":8099"),
//!     with_handler(bootstrap::ping_mux()),
//!     with_timeouts(Duration::from_secs(15), Duration::from_secs(15)),
//! ]);
//! server.listen_and_serve().await
//! # }
//! ```
//!
//! Handlers are `async` functions or closures from [`HttpRequest`] to
//! `Result<HttpResponse, ServerError>`:
//!
//! ```
//! use serveopt::{HttpRequest, HttpResponse, ServeMux, ServerError, StatusCode};
//!
//! async fn hello(req: HttpRequest) -> Result<HttpResponse, ServerError> {
//!     Ok(HttpResponse::new(StatusCode::Ok)
//!         .with_content_type("text/plain")
//!         .with_body_string(format!("hello from {}", req.path)))
//! }
//!
//! let mut mux = ServeMux::new();
//! mux.handle("/hello", hello);
//! ```

pub mod bootstrap;
pub mod parser;
pub mod server;

// Re-export commonly used items for convenience
pub use parser::{Error as ParserError, HttpRequest, HttpVersion, Method, parse_request};
pub use server::{
    new_server, with_address, with_handler, with_max_body_size, with_max_connections,
    with_read_buffer_size, with_read_timeout, with_shared_handler, with_timeouts,
    with_write_timeout, Error as ServerError, Handler, HttpResponse, HttpServer, ServeMux,
    ServerConfig, ServerOption, StatusCode,
};
