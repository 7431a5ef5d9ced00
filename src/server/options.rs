//! Functional options for [`ServerConfig`].
//!
//! Each `with_*` function returns a [`ServerOption`] that overwrites one or
//! more configuration fields. Options are applied in the order given, so a
//! later option wins over an earlier one touching the same field:
//!
//! ```
//! use std::time::Duration;
//! use serveopt::{ServerConfig, with_address, with_timeouts};
//!
//! let config = ServerConfig::from_options([
//!     with_address(":9000"),
//!     with_timeouts(Duration::from_secs(1), Duration::from_secs(2)),
//!     with_address(":9001"),
//! ]);
//! assert_eq!(config.addr, ":9001");
//! assert_eq!(config.read_timeout, Duration::from_secs(1));
//! assert_eq!(config.write_timeout, Duration::from_secs(2));
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::server::config::ServerConfig;
use crate::server::handler::{Handler, SharedHandler};
use crate::server::http_server::HttpServer;

/// A reusable mutation of a [`ServerConfig`].
pub struct ServerOption(Box<dyn Fn(&mut ServerConfig) + Send + Sync>);

impl ServerOption {
    /// Wrap a closure as an option.
    pub fn new(apply: impl Fn(&mut ServerConfig) + Send + Sync + 'static) -> Self {
        Self(Box::new(apply))
    }

    /// Apply this option to `config` in place.
    pub fn apply(&self, config: &mut ServerConfig) {
        (self.0)(config)
    }
}

impl fmt::Debug for ServerOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ServerOption")
    }
}

impl ServerConfig {
    /// Start from the defaults and apply every option in order.
    pub fn from_options<I>(opts: I) -> Self
    where
        I: IntoIterator<Item = ServerOption>,
    {
        let mut config = Self::default();
        for opt in opts {
            opt.apply(&mut config);
        }
        config
    }
}

/// Build a server from the defaults plus `opts`.
pub fn new_server<I>(opts: I) -> HttpServer
where
    I: IntoIterator<Item = ServerOption>,
{
    HttpServer::new(ServerConfig::from_options(opts))
}

/// Set the listen address.
pub fn with_address(addr: impl Into<String>) -> ServerOption {
    let addr = addr.into();
    ServerOption::new(move |config| config.addr = addr.clone())
}

/// Set the read timeout.
pub fn with_read_timeout(timeout: Duration) -> ServerOption {
    ServerOption::new(move |config| config.read_timeout = timeout)
}

/// Set the write timeout.
pub fn with_write_timeout(timeout: Duration) -> ServerOption {
    ServerOption::new(move |config| config.write_timeout = timeout)
}

/// Set the read timeout, then the write timeout.
pub fn with_timeouts(read_timeout: Duration, write_timeout: Duration) -> ServerOption {
    let read = with_read_timeout(read_timeout);
    let write = with_write_timeout(write_timeout);
    ServerOption::new(move |config| {
        read.apply(config);
        write.apply(config);
    })
}

/// Set the request handler.
pub fn with_handler<H: Handler + 'static>(handler: H) -> ServerOption {
    with_shared_handler(Arc::new(handler))
}

/// Set a request handler that is already shared.
pub fn with_shared_handler(handler: SharedHandler) -> ServerOption {
    ServerOption::new(move |config| config.handler = Some(Arc::clone(&handler)))
}

/// Cap the number of connections served at once.
pub fn with_max_connections(max_connections: usize) -> ServerOption {
    ServerOption::new(move |config| config.max_connections = max_connections)
}

/// Set the largest request head the server reads.
pub fn with_read_buffer_size(read_buffer_size: usize) -> ServerOption {
    ServerOption::new(move |config| config.read_buffer_size = read_buffer_size)
}

/// Set the largest request body the server accepts.
pub fn with_max_body_size(max_body_size: usize) -> ServerOption {
    ServerOption::new(move |config| config.max_body_size = max_body_size)
}
