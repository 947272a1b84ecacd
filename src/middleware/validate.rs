//! Schema validation middleware.
//!
//! [`validate`] compiles a schema once and returns a [`Validator`]; every
//! request it then sees goes through three steps:
//!
//! 1. **Pick the payload.** The body if it is an object with at least one
//!    key, the query string otherwise. An absent payload validates as `{}`.
//! 2. **Validate it.** Rejections become [`ValidationError`]s carrying the
//!    engine's reason, and go to the router's error stage. The request is
//!    left untouched.
//! 3. **Swap in the result.** On success the original payload moves to its
//!    backup slot ([`Request::original`]) and the normalized data takes its
//!    place, so handlers read validated data from `body()` / `query()` as
//!    usual.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Error, ValidationError};
use crate::request::{Request, Source};
use crate::schema::{structure, EngineError, Field, IntoFields, Schema, SchemaError, Struct};

use super::Middleware;

/// Validation middleware around a compiled schema.
///
/// Holds no per-request state; the schema is read-only and shared by every
/// request the router dispatches through this middleware.
#[derive(Debug)]
pub struct Validator<S> {
    schema: S,
}

/// Builds a validator from `fields` using the default engine,
/// [`schema::structure`](crate::schema::structure).
///
/// `fields` may be a single [`Field`], a `Vec` or an array of them.
///
/// ```rust
/// use http::Method;
/// use serde_json::json;
/// use sieve::middleware::{validate, Middleware};
/// use sieve::schema::Field;
/// use sieve::Request;
///
/// let validator = validate(Field::string("name")).unwrap();
///
/// let mut req = Request::new(Method::GET, "/hello").with_query(json!({"name": "Ada"}));
/// validator.handle(&mut req).unwrap();
/// assert_eq!(req.query(), Some(&json!({"name": "Ada"})));
/// ```
pub fn validate(fields: impl IntoFields<Field>) -> Result<Validator<Struct>, SchemaError> {
    validate_with(fields, structure)
}

/// Builds a validator with a custom schema constructor.
///
/// `structure` is called exactly once, here, with the normalized field list;
/// its error is returned as is. Use this with a configured
/// [`Engine`](crate::schema::Engine) or an engine of your own:
///
/// ```rust
/// use sieve::middleware::validate_with;
/// use sieve::schema::{Engine, Field};
///
/// let engine = Engine::new().allow_unknown(true);
/// let validator = validate_with(
///     vec![Field::string("name"), Field::integer("age").optional()],
///     |fields| engine.structure(fields),
/// ).unwrap();
/// ```
pub fn validate_with<D, S, C>(
    fields: impl IntoFields<D>,
    structure: C,
) -> Result<Validator<S>, SchemaError>
where
    S: Schema,
    C: FnOnce(Vec<D>) -> Result<S, SchemaError>,
{
    let fields = fields.into_fields();
    let count = fields.len();
    let schema = structure(fields)?;
    debug!(fields = count, "validator schema built");
    Ok(Validator { schema })
}

impl<S: Schema> Validator<S> {
    pub fn schema(&self) -> &S {
        &self.schema
    }

    /// Validates `req` and applies the result, returning which source was
    /// validated. This is [`Middleware::handle`] without the error wrapping.
    pub fn check(&self, req: &mut Request) -> Result<Source, ValidationError> {
        let source = Source::select(req);

        let outcome = match req.payload(source) {
            None | Some(Value::Null) => self.schema.validate(&Value::Object(Map::new())),
            Some(payload) => self.schema.validate(payload),
        };

        match outcome {
            Ok(data) => {
                debug!(%source, path = req.path(), "payload accepted");
                req.replace_payload(source, data);
                Ok(source)
            }
            Err(e) => {
                let err = normalize(&e);
                debug!(%source, path = req.path(), reason = err.reason(), "payload rejected");
                Err(err)
            }
        }
    }
}

impl<S: Schema> Middleware for Validator<S> {
    fn handle(&self, req: &mut Request) -> Result<(), Error> {
        self.check(req)?;
        Ok(())
    }
}

/// The engine's reason if it has one, its message otherwise.
fn normalize<E: EngineError>(e: &E) -> ValidationError {
    match e.reason() {
        Some(reason) => ValidationError::new(reason),
        None => ValidationError::new(e.to_string()),
    }
}
