//! Server configuration.

use std::fmt;
use std::time::Duration;

use crate::server::handler::SharedHandler;

/// Address used when no address option is given.
pub const DEFAULT_ADDR: &str = ":8080";
/// Read timeout used when no timeout option is given.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);
/// Write timeout used when no timeout option is given.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);
/// Default cap on concurrently served connections.
pub const DEFAULT_MAX_CONNECTIONS: usize = 1024;
/// Default size of the request head buffer.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 8192;
/// Default cap on the request body, in bytes.
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// HTTP server configuration.
///
/// Built by applying [`ServerOption`](crate::server::ServerOption)s to
/// [`ServerConfig::default`]; values are not validated.
#[derive(Clone)]
pub struct ServerConfig {
    /// The address to listen on, e.g. `":8080"` or `"127.0.0.1:0"`.
    pub addr: String,
    /// Maximum time to receive a complete request. Zero disables it.
    pub read_timeout: Duration,
    /// Maximum time to produce and write the response. Zero disables it.
    pub write_timeout: Duration,
    /// The handler every request is dispatched to.
    pub handler: Option<SharedHandler>,
    /// The maximum number of concurrent connections.
    pub max_connections: usize,
    /// The largest request head accepted, in bytes.
    pub read_buffer_size: usize,
    /// The largest `Content-Length` accepted, in bytes.
    pub max_body_size: usize,
}

impl ServerConfig {
    /// The address handed to the socket layer.
    ///
    /// A missing host (`":8080"`) means every interface and an empty address
    /// means port 80 on every interface.
    pub fn bind_addr(&self) -> String {
        if self.addr.is_empty() {
            "0.0.0.0:80".to_string()
        } else if self.addr.starts_with(':') {
            format!("0.0.0.0{addr}", addr = self.addr)
        } else {
            self.addr.clone()
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            handler: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("addr", &self.addr)
            .field("read_timeout", &self.read_timeout)
            .field("write_timeout", &self.write_timeout)
            .field("handler", &self.handler.as_ref().map(|_| "<handler>"))
            .field("max_connections", &self.max_connections)
            .field("read_buffer_size", &self.read_buffer_size)
            .field("max_body_size", &self.max_body_size)
            .finish()
    }
}
