//! The built-in engine: strict object schemas compiled from [`Field`]s.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Number, Value};

use super::field::{describe, Field, Kind};
use super::rules::{Check, Violation};
use super::{EngineError, Schema, SchemaError};

/// Check function behind a custom type. `Err` carries the reason shown to
/// the client.
type KindCheck = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

// ── Engine ────────────────────────────────────────────────────────────────────

/// Configuration for building [`Struct`] schemas.
///
/// The plain [`structure`] function uses `Engine::new()`. Build your own to
/// register custom types or to let unknown keys through:
///
/// ```rust
/// use serde_json::json;
/// use sieve::schema::{Engine, Field, Schema};
///
/// let engine = Engine::new().kind("slug", |v| match v.as_str() {
///     Some(s) if !s.is_empty() && s.chars().all(|c| c.is_ascii_lowercase() || c == '-') => Ok(()),
///     _ => Err("Expected a lowercase slug".to_owned()),
/// });
///
/// let schema = engine.structure(vec![Field::custom("slug", "slug")]).unwrap();
/// assert!(schema.validate(&json!({"slug": "hello-world"})).is_ok());
/// ```
#[derive(Clone, Default)]
pub struct Engine {
    kinds: HashMap<String, KindCheck>,
    allow_unknown: bool,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a custom type usable through [`Field::custom`].
    pub fn kind<F>(mut self, name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.kinds.insert(name.into(), Arc::new(check));
        self
    }

    /// Copy keys the schema does not declare into the output instead of
    /// rejecting the payload.
    pub fn allow_unknown(mut self, allow: bool) -> Self {
        self.allow_unknown = allow;
        self
    }

    /// Compiles `fields` into a schema.
    ///
    /// Fails if there are no fields, a name repeats, a custom type is not
    /// registered, a pattern does not compile, or a default value breaks its
    /// own field's rules.
    pub fn structure(&self, fields: Vec<Field>) -> Result<Struct, SchemaError> {
        if fields.is_empty() {
            return Err(SchemaError::NoFields);
        }

        let mut seen = HashSet::new();
        let mut compiled = Vec::with_capacity(fields.len());

        for field in fields {
            if !seen.insert(field.name.clone()) {
                return Err(SchemaError::DuplicateField(field.name));
            }

            let custom = match &field.kind {
                Kind::Custom(kind) => Some(self.kinds.get(kind).cloned().ok_or_else(|| {
                    SchemaError::UnknownType { field: field.name.clone(), kind: kind.clone() }
                })?),
                _ => None,
            };

            let checks = field.rules.iter()
                .map(|rule| Check::compile(&field.name, rule))
                .collect::<Result<Vec<_>, _>>()?;

            let slot = Compiled { field, custom, checks };
            if let Some(default) = &slot.field.default {
                slot.check(default).map_err(|e| SchemaError::InvalidDefault {
                    field: slot.field.name.clone(),
                    message: e.message,
                })?;
            }
            compiled.push(slot);
        }

        Ok(Struct { fields: compiled, allow_unknown: self.allow_unknown })
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.kinds.keys().collect();
        kinds.sort();
        f.debug_struct("Engine")
            .field("kinds", &kinds)
            .field("allow_unknown", &self.allow_unknown)
            .finish()
    }
}

/// Compiles `fields` with the default [`Engine`]: built-in types only,
/// unknown keys rejected.
pub fn structure(fields: Vec<Field>) -> Result<Struct, SchemaError> {
    Engine::new().structure(fields)
}

// ── Struct ────────────────────────────────────────────────────────────────────

/// A compiled object schema.
///
/// Validation walks the declared fields in order and reports the first
/// failure, then rejects undeclared keys (unless the engine allows them).
/// The output is normalized: defaults are filled in, coerced values replace
/// their string spelling, and optional fields given as `null` are dropped.
pub struct Struct {
    fields: Vec<Compiled>,
    allow_unknown: bool,
}

impl Struct {
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|c| c.field.name.as_str())
    }
}

impl fmt::Debug for Struct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Struct")
            .field("fields", &self.fields.iter().map(|c| &c.field).collect::<Vec<_>>())
            .field("allow_unknown", &self.allow_unknown)
            .finish()
    }
}

impl Schema for Struct {
    type Error = StructError;

    fn validate(&self, data: &Value) -> Result<Value, StructError> {
        let Value::Object(input) = data else {
            return Err(StructError {
                code: "type",
                path: None,
                message: format!("Expected an object, got {}", describe(data)),
                reason: None,
            });
        };

        let mut output = Map::new();

        for slot in &self.fields {
            let field = &slot.field;
            match input.get(&field.name) {
                None | Some(Value::Null) if field.optional => {
                    if let Some(default) = &field.default {
                        output.insert(field.name.clone(), default.clone());
                    }
                }
                None => {
                    return Err(slot.fail(Violation {
                        code: "required",
                        message: format!(
                            "Expected {} for `{}`, got nothing",
                            field.kind.article(),
                            field.name,
                        ),
                    }));
                }
                Some(value) => {
                    let value = slot.check(value).map_err(|v| slot.fail(v))?;
                    output.insert(field.name.clone(), value);
                }
            }
        }

        for (key, value) in input {
            if self.fields.iter().any(|c| &c.field.name == key) {
                continue;
            }
            if !self.allow_unknown {
                return Err(StructError {
                    code: "unknown",
                    path: Some(key.clone()),
                    message: format!("Unexpected key `{key}`"),
                    reason: None,
                });
            }
            output.insert(key.clone(), value.clone());
        }

        Ok(Value::Object(output))
    }
}

struct Compiled {
    field: Field,
    custom: Option<KindCheck>,
    checks: Vec<Check>,
}

/// Custom-type failures carry the check's own reason.
const CUSTOM: &str = "custom";

impl Compiled {
    /// Coerces, type-checks and rule-checks one present value.
    fn check(&self, value: &Value) -> Result<Value, Violation> {
        let field = &self.field;
        let value = if field.coerce { coerce(&field.kind, value) } else { value.clone() };

        if let Some(custom) = &self.custom {
            custom(&value).map_err(|reason| Violation { code: CUSTOM, message: reason })?;
        } else if !matches_kind(&field.kind, &value) {
            return Err(Violation {
                code: "type",
                message: format!(
                    "Expected {} for `{}`, got {}",
                    field.kind.article(),
                    field.name,
                    describe(&value),
                ),
            });
        }

        for check in &self.checks {
            check.run(&field.name, &value)?;
        }
        Ok(value)
    }

    fn fail(&self, violation: Violation) -> StructError {
        let reason = match (&self.field.message, violation.code) {
            (Some(custom), _) => Some(custom.clone()),
            (None, CUSTOM) => Some(violation.message.clone()),
            (None, _) => None,
        };
        let message = if violation.code == CUSTOM {
            format!("Expected {} for `{}`", self.field.kind.article(), self.field.name)
        } else {
            violation.message
        };
        StructError { code: violation.code, path: Some(self.field.name.clone()), message, reason }
    }
}

fn matches_kind(kind: &Kind, value: &Value) -> bool {
    match kind {
        Kind::String    => value.is_string(),
        Kind::Number    => value.is_number(),
        Kind::Integer   => value.is_i64() || value.is_u64(),
        Kind::Boolean   => value.is_boolean(),
        Kind::Array     => value.is_array(),
        Kind::Object    => value.is_object(),
        Kind::Any       => true,
        Kind::Custom(_) => true,
    }
}

/// Best-effort conversion toward `kind`. Values that cannot be converted are
/// returned unchanged so the type check reports them.
fn coerce(kind: &Kind, value: &Value) -> Value {
    match (kind, value) {
        (Kind::Integer, Value::String(s)) => s.trim().parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| value.clone()),
        (Kind::Number, Value::String(s)) => s.trim().parse::<f64>().ok()
            .and_then(Number::from_f64)
            .map(|n| match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Value::from(f as i64),
                _ => Value::Number(n),
            })
            .unwrap_or_else(|| value.clone()),
        (Kind::Boolean, Value::String(s)) => match s.as_str() {
            "true" | "1" => Value::Bool(true),
            "false" | "0" => Value::Bool(false),
            _ => value.clone(),
        },
        (Kind::Array, Value::Array(_) | Value::Null) => value.clone(),
        (Kind::Array, other) => Value::Array(vec![other.clone()]),
        _ => value.clone(),
    }
}

// ── StructError ───────────────────────────────────────────────────────────────

/// Why a payload failed a [`Struct`] schema.
///
/// `Display` is the generated message. [`reason`](EngineError::reason) is
/// only set when a custom type or a field's [`message`](Field::message)
/// supplied one, and then takes precedence.
#[derive(Clone, Debug, PartialEq)]
pub struct StructError {
    code: &'static str,
    path: Option<String>,
    message: String,
    reason: Option<String>,
}

impl StructError {
    /// Short machine-readable code: `type`, `required`, `unknown`, `length`,
    /// `range`, `pattern`, `email`, `url`, `one_of` or `custom`.
    pub fn code(&self) -> &str { self.code }

    /// The offending key; `None` when the payload itself is not an object.
    pub fn path(&self) -> Option<&str> { self.path.as_deref() }

    pub fn message(&self) -> &str { &self.message }
}

impl fmt::Display for StructError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for StructError {}

impl EngineError for StructError {
    fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}
