//! Functional-options HTTP server.
//!
//! [`ServerConfig`] is assembled from [`ServerOption`]s and frozen into an
//! [`HttpServer`], which runs a tokio accept loop and dispatches every request
//! to the configured [`Handler`].

mod response;
mod config;
mod error;
mod handler;
mod http_server;
mod mux;
mod options;
mod tests;

// Re-export public items
pub use response::{HttpResponse, StatusCode, SERVER_NAME};
pub use config::{
    ServerConfig, DEFAULT_ADDR, DEFAULT_MAX_BODY_SIZE, DEFAULT_MAX_CONNECTIONS,
    DEFAULT_READ_BUFFER_SIZE, DEFAULT_READ_TIMEOUT, DEFAULT_WRITE_TIMEOUT,
};
pub use error::Error;
pub use handler::{Handler, HandlerFuture, SharedHandler};
pub use http_server::HttpServer;
pub use mux::{Route, ServeMux};
pub use options::{
    new_server, with_address, with_handler, with_max_body_size, with_max_connections,
    with_read_buffer_size, with_read_timeout, with_shared_handler, with_timeouts,
    with_write_timeout, ServerOption,
};
