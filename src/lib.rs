//! # sieve
//!
//! A minimal hyper-based HTTP framework whose one trick is request
//! validation: describe the fields a route accepts, and the validator
//! middleware checks the body (or the query string, for requests without a
//! JSON/form body) before the handler ever runs.
//!
//! - Radix-tree routing via [`matchit`]
//! - Synchronous [`Middleware`](middleware::Middleware) chain with a single
//!   error stage
//! - [`validate`] builds validator middleware from [`schema::Field`]
//!   descriptors; [`validate_with`] plugs in any other schema engine
//! - Graceful shutdown on SIGTERM / Ctrl-C
//!
//! On success the validated, normalized data replaces the payload and the
//! untouched original stays readable through [`Request::original`]. On
//! failure the handler is skipped and the error stage answers with `422`.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use http::Method;
//! use serde_json::json;
//! use sieve::schema::Field;
//! use sieve::{validate, Request, Response, Router, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sieve::Error> {
//!     let app = Router::new().on_with(
//!         Method::POST,
//!         "/users",
//!         validate(vec![
//!             Field::string("name").length(Some(1), Some(64)),
//!             Field::integer("age").coerce().optional(),
//!         ])?,
//!         create_user,
//!     );
//!
//!     Server::bind("0.0.0.0:3000")?.serve(app).await
//! }
//!
//! async fn create_user(req: Request) -> Response {
//!     // already validated and normalized
//!     let name = req.body().and_then(|b| b["name"].as_str()).unwrap_or_default();
//!     Response::builder()
//!         .status(http::StatusCode::CREATED)
//!         .json_value(&json!({ "name": name }))
//! }
//! ```

mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod middleware;
pub mod schema;

pub use error::{Error, ErrorKind, ValidationError};
pub use handler::Handler;
pub use middleware::{validate, validate_with, Middleware, Validator};
pub use request::{Request, Source};
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use schema::{
    structure, Engine, EngineError, Field, IntoFields, Schema, SchemaError, Struct, StructError,
};
pub use server::Server;
