//! Error types for the HTTP server.

use thiserror::Error;

use crate::parser::Error as ParserError;

/// Errors that can occur while starting or running the server.
#[derive(Debug, Error)]
pub enum Error {
    /// Error parsing an HTTP request.
    #[error("Parse error: {0}")]
    ParseError(#[from] ParserError),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The listening socket could not be bound.
    #[error("listen {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The client did not deliver the request within the read timeout.
    #[error("read timed out")]
    ReadTimeout,

    /// The response was not written within the write timeout.
    #[error("write timed out")]
    WriteTimeout,

    /// The request head did not fit into the read buffer.
    #[error("request head exceeds {0} bytes")]
    HeaderTooLarge(usize),

    /// The announced request body exceeds the configured limit.
    #[error("request body exceeds {0} bytes")]
    BodyTooLarge(usize),

    /// Internal server error.
    #[error("Internal server error: {0}")]
    InternalError(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
