//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. A failing handler's error
//! goes to the router's [`ErrorHandler`], the single terminal error stage.

use std::collections::HashMap;
use std::sync::Arc;

use http::{Method, StatusCode};
use matchit::Router as MatchitRouter;

use crate::handler::{BoxedHandler, Handler};
use crate::middleware::error_handler::{ErrorHandler, Next};
use crate::request::Request;
use crate::response::Response;

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Each registration returns `self` so calls chain naturally.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    errors: ErrorHandler,
}

impl Router {
    /// An empty router with a sparse [`ErrorHandler`].
    pub fn new() -> Self {
        Self { routes: HashMap::new(), errors: ErrorHandler::default() }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `{name}` syntax — `req.param("name")` retrieves them.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route or conflicts with one already
    /// registered. Routes are fixed at startup, so this is a programming error.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::GET, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::POST, path, handler)
    }

    pub fn put(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::PUT, path, handler)
    }

    pub fn delete(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::DELETE, path, handler)
    }

    /// Replace the terminal error stage.
    pub fn error_handler(mut self, errors: ErrorHandler) -> Self {
        self.errors = errors;
        self
    }

    /// Routes one request and produces exactly one response.
    ///
    /// Unmatched routes get a bare `404`; they are not errors raised by a
    /// handler, so the error stage never sees them.
    pub async fn handle(&self, mut req: Request) -> Response {
        let Some((handler, params)) = self.lookup(req.method(), req.path()) else {
            return Response::status(StatusCode::NOT_FOUND);
        };
        req.params = params;
        let head = req.head().clone();

        match handler.call(req).await {
            Ok(res) => res,
            Err(err) => {
                let mut slot = None;
                self.errors.handle(err, &head, &mut slot, Next::terminal());
                slot.unwrap_or_else(|| Response::status(StatusCode::INTERNAL_SERVER_ERROR))
            }
        }
    }

    fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
