//! The request handler capability.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::parser::HttpRequest;
use crate::server::{Error, HttpResponse};

/// A boxed future that resolves to a response.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<HttpResponse, Error>> + Send>>;

/// A handler shared between the configuration and connection tasks.
pub type SharedHandler = Arc<dyn Handler>;

/// Something that turns a request into a response.
///
/// Implemented for every `Fn(HttpRequest) -> impl Future<Output = Result<HttpResponse, Error>>`,
/// so plain `async fn`s and closures can be registered directly.
pub trait Handler: Send + Sync {
    /// Handle one request.
    fn call(&self, request: HttpRequest) -> HandlerFuture;
}

impl<F, Fut> Handler for F
where
    F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HttpResponse, Error>> + Send + 'static,
{
    fn call(&self, request: HttpRequest) -> HandlerFuture {
        Box::pin(self(request))
    }
}
