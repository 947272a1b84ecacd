//! Unified error type.
//!
//! Everything that can go wrong in sieve ends up as an [`Error`]. Middleware
//! returns it to signal the error path; the router's error stage turns it
//! into a [`Response`].

use std::fmt;

use http::StatusCode;
use serde::Serialize;
use tracing::{error, warn};

use crate::response::{IntoResponse, Response};
use crate::schema::SchemaError;

/// Discriminant for [`Error`], for error handlers that branch on the kind of
/// failure without matching on payloads.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    Io,
    Addr,
    Malformed,
    Validation,
    Schema,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Io         => "IoError",
            Self::Addr       => "AddrError",
            Self::Malformed  => "MalformedError",
            Self::Validation => "ValidationError",
            Self::Schema     => "SchemaError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error type returned by sieve's fallible operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid socket address: {0}")]
    Addr(#[from] std::net::AddrParseError),

    /// The body or query string could not be parsed.
    #[error("malformed request: {0}")]
    Malformed(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_)         => ErrorKind::Io,
            Self::Addr(_)       => ErrorKind::Addr,
            Self::Malformed(_)  => ErrorKind::Malformed,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Schema(_)     => ErrorKind::Schema,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(e) => Some(e),
            _ => None,
        }
    }
}

/// A request payload was rejected by its schema.
///
/// There are no subtypes: whether a field was missing, mistyped or unknown is
/// spelled out in [`reason`](ValidationError::reason), which comes straight
/// from the schema engine.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ValidationError {
    reason: String,
}

impl ValidationError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

impl std::error::Error for ValidationError {}

// ── Error responses ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ErrorBody<'a> {
    #[serde(rename = "type")]
    error_type: &'a str,
    message: String,
}

#[derive(Serialize)]
struct ErrorWrapper<'a> {
    error: ErrorBody<'a>,
}

/// The router's default error stage.
///
/// Validation failures become `422` with a JSON body; malformed requests
/// become `400`. Anything else is an infrastructure failure and its details
/// stay in the logs.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            Self::Validation(e) => {
                warn!(reason = %e, "request rejected by validator");
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", e.reason().to_owned())
            }
            Self::Malformed(detail) => {
                warn!(%detail, "malformed request");
                (StatusCode::BAD_REQUEST, "malformed_request", self.to_string())
            }
            other => {
                error!(kind = %other.kind(), "request failed: {other}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal server error".to_owned(),
                )
            }
        };

        let body = ErrorWrapper { error: ErrorBody { error_type, message } };
        match serde_json::to_vec(&body) {
            Ok(bytes) => Response::builder().status(status).json(bytes),
            Err(_) => Response::status(status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_kind_discriminates() {
        let err = Error::from(ValidationError::new("Expected a string for `name`, got a number"));
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.kind().as_str(), "ValidationError");
        assert!(err.is_validation());
        assert_eq!(
            err.as_validation().map(ValidationError::reason),
            Some("Expected a string for `name`, got a number"),
        );
        assert_eq!(err.to_string(), "Expected a string for `name`, got a number");
    }

    #[test]
    fn other_kinds_are_not_validation() {
        let err = Error::Malformed("eof".into());
        assert!(!err.is_validation());
        assert!(err.as_validation().is_none());
    }

    #[test]
    fn validation_error_renders_unprocessable_json() {
        let res = Error::from(ValidationError::new("bad")).into_response();
        assert_eq!(res.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let json: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(json["error"]["type"], "validation_error");
        assert_eq!(json["error"]["message"], "bad");
    }

    #[test]
    fn malformed_error_renders_bad_request() {
        let res = Error::Malformed("expected value".into()).into_response();
        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn io_error_hides_details() {
        let io = std::io::Error::other("disk on fire");
        let res = Error::from(io).into_response();
        assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let json: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(json["error"]["message"], "internal server error");
    }
}
