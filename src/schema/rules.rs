//! Rule checks for the built-in engine.
//!
//! Rules are compiled once, when the schema is built: user patterns become
//! [`Regex`]es there and a bad pattern is a construction error, never a
//! request-time one.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use super::SchemaError;
use super::field::Rule;

static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
static URL_REGEX: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_REGEX.get_or_init(|| {
        // RFC 5322, simplified
        Regex::new(
            r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
        )
        .expect("email pattern compiles")
    })
}

fn url_regex() -> &'static Regex {
    URL_REGEX.get_or_init(|| {
        Regex::new(r"^(https?|ftp)://[^\s/$.?#].[^\s]*$").expect("url pattern compiles")
    })
}

/// A rule ready to run against values.
#[derive(Debug)]
pub(crate) enum Check {
    Length { min: Option<usize>, max: Option<usize> },
    Range { min: Option<f64>, max: Option<f64> },
    Pattern(Regex),
    Email,
    Url,
    OneOf(Vec<Value>),
}

/// A failed check: a short code and the message shown to the client.
pub(crate) struct Violation {
    pub code: &'static str,
    pub message: String,
}

impl Violation {
    fn new(code: &'static str, message: String) -> Self {
        Self { code, message }
    }
}

impl Check {
    pub(crate) fn compile(field: &str, rule: &Rule) -> Result<Self, SchemaError> {
        Ok(match rule {
            Rule::Length { min, max } => Self::Length { min: *min, max: *max },
            Rule::Range { min, max } => Self::Range { min: *min, max: *max },
            Rule::Pattern(p) => Self::Pattern(Regex::new(p).map_err(|source| {
                SchemaError::Pattern { field: field.to_owned(), source }
            })?),
            Rule::Email => Self::Email,
            Rule::Url => Self::Url,
            Rule::OneOf(values) => Self::OneOf(values.clone()),
        })
    }

    /// Runs the check. Rules that do not apply to the value's JSON type pass;
    /// the type itself was already checked.
    pub(crate) fn run(&self, field: &str, value: &Value) -> Result<(), Violation> {
        match self {
            Self::Length { min, max } => {
                let (len, unit) = match value {
                    Value::String(s) => (s.chars().count(), "characters"),
                    Value::Array(items) => (items.len(), "items"),
                    _ => return Ok(()),
                };
                if let Some(min) = *min {
                    if len < min {
                        return Err(Violation::new("length", format!(
                            "Expected `{field}` to have at least {min} {unit}, got {len}"
                        )));
                    }
                }
                if let Some(max) = *max {
                    if len > max {
                        return Err(Violation::new("length", format!(
                            "Expected `{field}` to have at most {max} {unit}, got {len}"
                        )));
                    }
                }
                Ok(())
            }
            Self::Range { min, max } => {
                let Some(n) = value.as_f64() else { return Ok(()) };
                if let Some(min) = *min {
                    if n < min {
                        return Err(Violation::new("range", format!(
                            "Expected `{field}` to be at least {min}, got {value}"
                        )));
                    }
                }
                if let Some(max) = *max {
                    if n > max {
                        return Err(Violation::new("range", format!(
                            "Expected `{field}` to be at most {max}, got {value}"
                        )));
                    }
                }
                Ok(())
            }
            Self::Pattern(re) => match value.as_str() {
                Some(s) if !re.is_match(s) => Err(Violation::new("pattern", format!(
                    "Expected `{field}` to match `{}`", re.as_str()
                ))),
                _ => Ok(()),
            },
            Self::Email => match value.as_str() {
                Some(s) if !email_regex().is_match(s) => Err(Violation::new("email", format!(
                    "Expected `{field}` to be an email address"
                ))),
                _ => Ok(()),
            },
            Self::Url => match value.as_str() {
                Some(s) if !url_regex().is_match(s) => Err(Violation::new("url", format!(
                    "Expected `{field}` to be a URL"
                ))),
                _ => Ok(()),
            },
            Self::OneOf(allowed) => {
                if allowed.contains(value) {
                    Ok(())
                } else {
                    let list = allowed.iter().map(Value::to_string).collect::<Vec<_>>().join(", ");
                    Err(Violation::new("one_of", format!(
                        "Expected `{field}` to be one of {list}, got {value}"
                    )))
                }
            }
        }
    }
}
