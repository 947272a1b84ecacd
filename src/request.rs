//! Incoming HTTP request type.
//!
//! The server parses JSON and url-encoded bodies into [`Request::body`] and
//! the query string into [`Request::query`], both as [`serde_json::Value`]
//! objects. Middleware may rewrite either one; the validator keeps the
//! pre-validation value in a backup slot (see [`Request::original`]).

use std::collections::HashMap;

use bytes::Bytes;
use http::{HeaderMap, Method};
use serde_json::map::Entry;
use serde_json::{Map, Value};

use crate::error::Error;

/// Which part of a request carries the payload being validated.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Source {
    Body,
    Query,
}

impl Source {
    /// Body when it is an object with at least one key, query otherwise.
    pub fn select(req: &Request) -> Self {
        match &req.body {
            Some(Value::Object(map)) if !map.is_empty() => Self::Body,
            _ => Self::Query,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Body  => "body",
            Self::Query => "query",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An incoming HTTP request.
#[derive(Debug)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) headers: HeaderMap,
    pub(crate) raw: Bytes,
    pub(crate) body: Option<Value>,
    pub(crate) query: Option<Value>,
    pub(crate) original_body: Option<Value>,
    pub(crate) original_query: Option<Value>,
    pub(crate) params: HashMap<String, String>,
}

impl Request {
    /// A bare request with no headers, body or query. Useful for driving a
    /// [`Router`](crate::Router) or a middleware directly.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            raw: Bytes::new(),
            body: None,
            query: None,
            original_body: None,
            original_query: None,
            params: HashMap::new(),
        }
    }

    /// Builds a request from hyper's head and the collected body bytes.
    ///
    /// `application/json` bodies are parsed as JSON and
    /// `application/x-www-form-urlencoded` bodies as a flat object of
    /// strings. Any other content type leaves [`body`](Request::body) empty;
    /// the bytes stay available through [`raw_body`](Request::raw_body).
    pub(crate) fn from_parts(parts: http::request::Parts, raw: Bytes) -> Result<Self, Error> {
        let query = match parts.uri.query() {
            Some(q) if !q.is_empty() => Some(parse_urlencoded(q.as_bytes())?),
            _ => None,
        };

        let mut req = Self::new(parts.method, parts.uri.path());
        req.headers = parts.headers;
        req.body = parse_body(req.header("content-type"), &raw)?;
        req.query = query;
        req.raw = raw;
        Ok(req)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, query: Value) -> Self {
        self.query = Some(query);
        self
    }

    pub fn with_header(mut self, name: http::HeaderName, value: http::HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn raw_body(&self) -> &[u8] { &self.raw }
    pub fn body(&self) -> Option<&Value> { self.body.as_ref() }
    pub fn query(&self) -> Option<&Value> { self.query.as_ref() }

    pub fn set_body(&mut self, body: Option<Value>) { self.body = body; }
    pub fn set_query(&mut self, query: Option<Value>) { self.query = query; }

    /// Case-insensitive header lookup. Non-UTF-8 values are skipped.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn payload(&self, source: Source) -> Option<&Value> {
        match source {
            Source::Body  => self.body.as_ref(),
            Source::Query => self.query.as_ref(),
        }
    }

    /// The value `source` held before a validator replaced it.
    ///
    /// `None` until a validator has accepted that source, and also when the
    /// source was absent at the time.
    pub fn original(&self, source: Source) -> Option<&Value> {
        match source {
            Source::Body  => self.original_body.as_ref(),
            Source::Query => self.original_query.as_ref(),
        }
    }

    pub fn original_body(&self) -> Option<&Value> { self.original_body.as_ref() }
    pub fn original_query(&self) -> Option<&Value> { self.original_query.as_ref() }

    /// Moves the current value of `source` into its backup slot and installs
    /// `data` as the live value.
    pub(crate) fn replace_payload(&mut self, source: Source, data: Value) {
        let (live, backup) = match source {
            Source::Body  => (&mut self.body, &mut self.original_body),
            Source::Query => (&mut self.query, &mut self.original_query),
        };
        *backup = live.replace(data);
    }

    pub(crate) fn set_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }
}

fn parse_body(content_type: Option<&str>, raw: &[u8]) -> Result<Option<Value>, Error> {
    if raw.is_empty() {
        return Ok(None);
    }
    let Some(content_type) = content_type else {
        return Ok(None);
    };

    let mime = content_type.split(';').next().unwrap_or("").trim();
    if mime.eq_ignore_ascii_case("application/json") || mime.ends_with("+json") {
        serde_json::from_slice(raw)
            .map(Some)
            .map_err(|e| Error::Malformed(format!("json body: {e}")))
    } else if mime.eq_ignore_ascii_case("application/x-www-form-urlencoded") {
        parse_urlencoded(raw).map(Some)
    } else {
        Ok(None)
    }
}

/// Decodes `a=1&b=2&b=3` into `{"a":"1","b":["2","3"]}`.
fn parse_urlencoded(input: &[u8]) -> Result<Value, Error> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(input)
        .map_err(|e| Error::Malformed(format!("urlencoded data: {e}")))?;

    let mut map = Map::new();
    for (key, value) in pairs {
        match map.entry(key) {
            Entry::Vacant(slot) => { slot.insert(Value::String(value)); }
            Entry::Occupied(mut slot) => match slot.get_mut() {
                Value::Array(items) => items.push(Value::String(value)),
                existing => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, Value::String(value)]);
                }
            },
        }
    }
    Ok(Value::Object(map))
}
