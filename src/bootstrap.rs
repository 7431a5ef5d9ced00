//! The ping service wired up by the `serveopt` binary.

use std::time::Duration;
use serde::Serialize;

use crate::parser::HttpRequest;
use crate::server::{
    new_server, with_address, with_handler, with_timeouts, Error, HttpResponse, HttpServer,
    ServeMux, StatusCode,
};

/// Address the binary listens on.
pub const ADDR: &str = ":8099";

/// Read and write timeout used by the binary.
pub const TIMEOUT: Duration = Duration::from_secs(15);

/// Path of the ping endpoint.
pub const PING_PATH: &str = "/ping";

#[derive(Debug, Serialize)]
struct Pong {
    message: &'static str,
}

/// Answer any request with `{"message":"pong"}`.
pub async fn ping(_request: HttpRequest) -> Result<HttpResponse, Error> {
    HttpResponse::new(StatusCode::Ok).with_json(&Pong { message: "pong" })
}

/// A multiplexer with [`ping`] registered at [`PING_PATH`] for every method.
pub fn ping_mux() -> ServeMux {
    let mut mux = ServeMux::new();
    mux.handle(PING_PATH, ping);
    mux
}

/// The server run by the binary: [`ping_mux`] on [`ADDR`] with symmetric
/// [`TIMEOUT`]s.
pub fn server() -> HttpServer {
    new_server([
        with_address(ADDR),
        with_handler(ping_mux()),
        with_timeouts(TIMEOUT, TIMEOUT),
    ])
}
