//! Exact-path request multiplexer.

use std::sync::Arc;
use log::{debug, warn};

use crate::parser::{HttpRequest, Method};
use crate::server::handler::{Handler, HandlerFuture, SharedHandler};
use crate::server::response::{HttpResponse, StatusCode};

/// A registered path.
pub struct Route {
    /// The path to match, compared without the query string.
    pub path: String,
    /// Accepted methods; `None` accepts any method.
    pub methods: Option<Vec<Method>>,
    /// The handler function.
    pub handler: SharedHandler,
}

/// Dispatches requests to the handler registered for their exact path.
///
/// Requests for unknown paths get `404 Not Found`; requests whose method a
/// route does not accept get `405 Method Not Allowed` with an `Allow` header.
#[derive(Default)]
pub struct ServeMux {
    routes: Vec<Route>,
}

impl ServeMux {
    /// Create an empty multiplexer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `path`, accepting any method.
    pub fn handle<H: Handler + 'static>(&mut self, path: impl Into<String>, handler: H) -> &mut Self {
        self.insert(Route {
            path: path.into(),
            methods: None,
            handler: Arc::new(handler),
        })
    }

    /// Register `handler` for `path`, accepting only `methods`.
    pub fn handle_methods<H: Handler + 'static>(
        &mut self,
        path: impl Into<String>,
        methods: Vec<Method>,
        handler: H,
    ) -> &mut Self {
        self.insert(Route {
            path: path.into(),
            methods: Some(methods),
            handler: Arc::new(handler),
        })
    }

    /// Registered routes, in registration order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    fn insert(&mut self, route: Route) -> &mut Self {
        if let Some(existing) = self.routes.iter_mut().find(|r| r.path == route.path) {
            warn!("Replacing handler for {path}", path = route.path);
            *existing = route;
        } else {
            self.routes.push(route);
        }
        self
    }
}

impl Handler for ServeMux {
    fn call(&self, request: HttpRequest) -> HandlerFuture {
        let Some(route) = self.routes.iter().find(|route| route.path == request.path) else {
            debug!("No route for {path}", path = request.path);
            let response = not_found(&request.path);
            return Box::pin(async move { Ok(response) });
        };

        match &route.methods {
            Some(methods) if !methods.contains(&request.method) => {
                let allowed = methods
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                let response = HttpResponse::new(StatusCode::MethodNotAllowed)
                    .with_header("Allow", allowed.clone())
                    .with_content_type("text/plain")
                    .with_body_string(format!(
                        "Method {method} not allowed for path: {path}. Allowed methods: {allowed}",
                        method = request.method,
                        path = request.path,
                    ));
                Box::pin(async move { Ok(response) })
            }
            _ => route.handler.call(request),
        }
    }
}

/// The response for a path nobody handles.
pub(crate) fn not_found(path: &str) -> HttpResponse {
    HttpResponse::new(StatusCode::NotFound)
        .with_content_type("text/plain")
        .with_body_string(format!("Not found: {path}"))
}
