//! Handler trait and type erasure.
//!
//! # Storing handlers of different types
//!
//! Every `async fn` has its own anonymous type, but a route table holds one
//! type per slot. Each handler is therefore hidden behind the
//! [`ErasedHandler`] trait object when it is registered, and every route
//! stores the same `Arc<dyn ErasedHandler>`:
//!
//! ```text
//! async fn create(req: Request) -> impl IntoResponse   ← user writes this
//!        ↓ router.on_with(Method::POST, "/users", validator, create)
//! create.into_boxed_handler()                          ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(create))                          ← stored as BoxedHandler
//!        ↓ at request time, once middleware has passed
//! handler.call(req)                                    ← one vtable call
//!        ↓
//! Box::pin(async { create(req).await.into_response() })  ← BoxFuture
//! ```
//!
//! Per request that costs one `Arc` clone of the route and one virtual call.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// A heap-allocated, type-erased future resolving to a [`Response`].
///
/// Pinned because the runtime polls it in place; `Send + 'static` so tokio
/// can move it between worker threads.
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// `#[doc(hidden)] pub` rather than `pub(crate)`: it shows up in the return
/// type of `Handler::into_boxed_handler`.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture;
}

/// Shared by every request routed to the handler; cloning bumps a count.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// Implemented for every valid route handler:
///
/// ```text
/// async fn name(req: Request) -> impl IntoResponse
/// ```
///
/// Return `Result<T, Error>` to use `?`; errors are rendered the same way
/// the router's default error stage renders middleware failures.
///
/// Sealed through the private `Sealed` supertrait: only the blanket impl
/// below satisfies it, so it cannot be implemented outside this crate.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

/// Bridges a concrete handler `F` to the trait-object world.
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        // The concrete future is mapped through `IntoResponse` and boxed so
        // the return type matches every other handler's.
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}
