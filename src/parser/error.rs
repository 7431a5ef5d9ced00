//! Error types for the HTTP parser.

use thiserror::Error;

/// Errors that can occur while parsing a request head.
#[derive(Debug, Error)]
pub enum Error {
    /// The HTTP method in the request is not supported.
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// The request target is empty or not an absolute path.
    #[error("Invalid request target: {0}")]
    InvalidTarget(String),

    /// The request line does not have exactly three parts.
    #[error("Malformed request line: {0}")]
    MalformedRequestLine(String),

    /// The HTTP version in the request is not supported.
    #[error("Invalid HTTP version: {0}")]
    InvalidVersion(String),

    /// A required header is missing from the request.
    #[error("Required header is missing: {0}")]
    MissingHeader(String),

    /// A header line has no colon or an empty name.
    #[error("Invalid header line: {0}")]
    InvalidHeaderFormat(String),

    /// `Content-Length` is not a decimal number.
    #[error("Invalid Content-Length: {0}")]
    InvalidContentLength(String),

    /// The request is empty.
    #[error("Empty request")]
    EmptyRequest,

    /// The request head is not valid UTF-8.
    #[error("Request head is not valid UTF-8")]
    InvalidEncoding,

    /// `Content-Length` appears more than once with different values.
    #[error("Conflicting Content-Length values: {0} and {1}")]
    ConflictingContentLength(String, String),
}
