//! Middleware layer.
//!
//! Middleware runs after routing and before the handler. It sees the request
//! mutably and either lets it through (`Ok(())`) or diverts it to the
//! router's error stage (`Err`). It never writes a response itself, so one
//! error stage decides what every failure looks like to the client.
//!
//! Built-in middleware:
//! - [`validate`] / [`validate_with`]: schema validation of the body or
//!   query string
//!
//! Anything else is a closure away:
//!
//! ```rust
//! use sieve::middleware::from_fn;
//! use sieve::Request;
//!
//! let tag = from_fn(|req: &mut Request| {
//!     tracing::debug!(path = req.path(), "incoming");
//!     Ok(())
//! });
//! ```

mod validate;

use std::sync::Arc;

use crate::error::Error;
use crate::request::Request;

pub use validate::{validate, validate_with, Validator};

/// A step of the request pipeline.
pub trait Middleware: Send + Sync + 'static {
    /// `Ok(())` continues to the next step; `Err` skips the rest of the
    /// chain and the handler, and goes to the error stage.
    fn handle(&self, req: &mut Request) -> Result<(), Error>;
}

/// Shared between every route the middleware is registered on.
pub(crate) type BoxedMiddleware = Arc<dyn Middleware>;

/// Middleware from a closure. See the [module docs](self).
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: Fn(&mut Request) -> Result<(), Error> + Send + Sync + 'static,
{
    FromFn(f)
}

/// Returned by [`from_fn`].
pub struct FromFn<F>(F);

impl<F> Middleware for FromFn<F>
where
    F: Fn(&mut Request) -> Result<(), Error> + Send + Sync + 'static,
{
    fn handle(&self, req: &mut Request) -> Result<(), Error> {
        (self.0)(req)
    }
}
