//! HTTP/1.x request head parsing.
//!
//! The server reads bytes off a connection until [`find_head_end`] reports a
//! complete head, then hands those bytes to [`parse_request`].

mod request;
mod method;
mod version;
mod error;

// Re-export public items
pub use request::HttpRequest;
pub use method::Method;
pub use version::HttpVersion;
pub use error::Error;

pub use request::{find_head_end, parse_request};
