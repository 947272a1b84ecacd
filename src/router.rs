//! Radix-tree request router and the middleware pipeline.
//!
//! One tree per HTTP method, O(path-length) lookup. A matched request runs
//! through the global layers, then the route's own middleware, then the
//! handler. The first middleware error skips everything after it and goes to
//! the error stage instead.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use http::{Method, StatusCode};
use matchit::Router as MatchitRouter;
use tracing::debug;

use crate::error::Error;
use crate::handler::{BoxedHandler, Handler};
use crate::middleware::{BoxedMiddleware, Middleware};
use crate::request::Request;
use crate::response::{IntoResponse, Response};

type BoxedCatch = Arc<dyn Fn(Error) -> Response + Send + Sync + 'static>;

struct Route {
    handler: BoxedHandler,
    middleware: Vec<BoxedMiddleware>,
}

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve),
/// or drive it directly with [`Router::handle`].
///
/// ```rust
/// use http::Method;
/// use sieve::middleware::validate;
/// use sieve::schema::Field;
/// use sieve::{Request, Response, Router};
///
/// # fn main() -> Result<(), sieve::SchemaError> {
/// let app = Router::new()
///     .on(Method::GET, "/users/{id}", get_user)
///     .on_with(Method::POST, "/users", validate(Field::string("name"))?, create_user);
/// # Ok(())
/// # }
/// # async fn get_user(_: Request) -> Response { Response::text("") }
/// # async fn create_user(_: Request) -> Response { Response::text("") }
/// ```
pub struct Router {
    routes: HashMap<Method, MatchitRouter<Arc<Route>>>,
    layers: Vec<BoxedMiddleware>,
    catch: BoxedCatch,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            layers: Vec::new(),
            catch: Arc::new(Error::into_response),
        }
    }

    /// Registers a handler for a method + path pair.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route or conflicts with one already
    /// registered for `method`. Routes are registered at startup.
    pub fn on(self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.add(method, path, Vec::new(), handler)
    }

    /// Like [`on`](Router::on), with middleware that only this route runs.
    pub fn on_with(
        self,
        method: Method,
        path: &str,
        middleware: impl Middleware,
        handler: impl Handler,
    ) -> Self {
        self.add(method, path, vec![Arc::new(middleware)], handler)
    }

    /// Adds middleware that runs for every matched route, before the route's
    /// own middleware. Layers run in the order they are added.
    pub fn layer(mut self, middleware: impl Middleware) -> Self {
        self.layers.push(Arc::new(middleware));
        self
    }

    /// Replaces the error stage, which turns errors into responses.
    ///
    /// It sees every middleware error, and also the [`Error::Malformed`]
    /// raised by the server when a body or query string cannot be parsed.
    /// Unmatched routes answer `404` without reaching it.
    ///
    /// The default renders validation failures as `422` JSON; see
    /// [`Error`]'s [`IntoResponse`] impl.
    pub fn catch<F>(mut self, f: F) -> Self
    where
        F: Fn(Error) -> Response + Send + Sync + 'static,
    {
        self.catch = Arc::new(f);
        self
    }

    fn add(
        mut self,
        method: Method,
        path: &str,
        middleware: Vec<BoxedMiddleware>,
        handler: impl Handler,
    ) -> Self {
        let route = Arc::new(Route { handler: handler.into_boxed_handler(), middleware });
        self.routes
            .entry(method)
            .or_default()
            .insert(path, route)
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    fn lookup(&self, method: &Method, path: &str) -> Option<(Arc<Route>, HashMap<String, String>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let route = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((route, params))
    }

    /// Runs one request through the pipeline and returns its response.
    pub async fn handle(&self, mut req: Request) -> Response {
        let Some((route, params)) = self.lookup(&req.method, &req.path) else {
            debug!(method = %req.method, path = %req.path, "no route");
            return Response::status(StatusCode::NOT_FOUND);
        };
        req.set_params(params);

        for middleware in self.layers.iter().chain(&route.middleware) {
            if let Err(e) = middleware.handle(&mut req) {
                return self.reject(e);
            }
        }

        route.handler.call(req).await
    }

    /// Parses a request from hyper's head and collected body, then runs it.
    /// Parse failures go to the error stage.
    pub(crate) async fn dispatch(&self, parts: http::request::Parts, raw: Bytes) -> Response {
        match Request::from_parts(parts, raw) {
            Ok(req) => self.handle(req).await,
            Err(e) => {
                debug!("rejecting unparseable request: {e}");
                self.reject(e)
            }
        }
    }

    /// Hands an error straight to the error stage.
    pub(crate) fn reject(&self, e: Error) -> Response {
        (self.catch)(e)
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
