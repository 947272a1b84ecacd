//! Field descriptors for the built-in engine.

use std::fmt;

use serde_json::Value;

use super::Descriptor;

/// The type a field's value must have.
#[derive(Clone, Debug, PartialEq)]
pub enum Kind {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Any,
    /// A type registered on an [`Engine`](super::Engine) under this name.
    Custom(String),
}

impl Kind {
    /// The phrase used in error messages, e.g. "a string".
    pub(crate) fn article(&self) -> String {
        match self {
            Self::String    => "a string".to_owned(),
            Self::Number    => "a number".to_owned(),
            Self::Integer   => "an integer".to_owned(),
            Self::Boolean   => "a boolean".to_owned(),
            Self::Array     => "an array".to_owned(),
            Self::Object    => "an object".to_owned(),
            Self::Any       => "a value".to_owned(),
            Self::Custom(n) => format!("a value of type `{n}`"),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String    => f.write_str("string"),
            Self::Number    => f.write_str("number"),
            Self::Integer   => f.write_str("integer"),
            Self::Boolean   => f.write_str("boolean"),
            Self::Array     => f.write_str("array"),
            Self::Object    => f.write_str("object"),
            Self::Any       => f.write_str("any"),
            Self::Custom(n) => f.write_str(n),
        }
    }
}

/// A constraint checked after the type.
#[derive(Clone, Debug, PartialEq)]
pub enum Rule {
    /// Character count for strings, element count for arrays. Inclusive.
    Length { min: Option<usize>, max: Option<usize> },
    /// Inclusive numeric bounds.
    Range { min: Option<f64>, max: Option<f64> },
    Pattern(String),
    Email,
    Url,
    OneOf(Vec<Value>),
}

/// Describes one field of an object payload.
///
/// Fields are required unless marked [`optional`](Field::optional) or given
/// a [`default`](Field::default).
///
/// ```rust
/// use serde_json::json;
/// use sieve::schema::Field;
///
/// let fields = vec![
///     Field::string("email").email(),
///     Field::integer("age").range(Some(18.0), None).optional(),
///     Field::string("role").one_of([json!("admin"), json!("user")]).default(json!("user")),
/// ];
/// ```
#[derive(Clone, Debug)]
pub struct Field {
    pub(crate) name: String,
    pub(crate) kind: Kind,
    pub(crate) optional: bool,
    pub(crate) default: Option<Value>,
    pub(crate) coerce: bool,
    pub(crate) rules: Vec<Rule>,
    pub(crate) message: Option<String>,
}

impl Descriptor for Field {}

impl Field {
    pub fn new(name: impl Into<String>, kind: Kind) -> Self {
        Self {
            name: name.into(),
            kind,
            optional: false,
            default: None,
            coerce: false,
            rules: Vec::new(),
            message: None,
        }
    }

    pub fn string(name: impl Into<String>) -> Self { Self::new(name, Kind::String) }
    pub fn number(name: impl Into<String>) -> Self { Self::new(name, Kind::Number) }
    pub fn integer(name: impl Into<String>) -> Self { Self::new(name, Kind::Integer) }
    pub fn boolean(name: impl Into<String>) -> Self { Self::new(name, Kind::Boolean) }
    pub fn array(name: impl Into<String>) -> Self { Self::new(name, Kind::Array) }
    pub fn object(name: impl Into<String>) -> Self { Self::new(name, Kind::Object) }
    pub fn any(name: impl Into<String>) -> Self { Self::new(name, Kind::Any) }

    /// A field checked by a type registered with [`Engine::kind`](super::Engine::kind).
    pub fn custom(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::new(name, Kind::Custom(kind.into()))
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Value inserted when the field is missing or `null`. Implies optional.
    pub fn default(mut self, value: Value) -> Self {
        self.optional = true;
        self.default = Some(value);
        self
    }

    /// Accept the string spelling of numbers and booleans, and a lone value
    /// where an array is expected. Query strings only ever carry strings.
    pub fn coerce(mut self) -> Self {
        self.coerce = true;
        self
    }

    pub fn length(self, min: Option<usize>, max: Option<usize>) -> Self {
        self.rule(Rule::Length { min, max })
    }

    pub fn range(self, min: Option<f64>, max: Option<f64>) -> Self {
        self.rule(Rule::Range { min, max })
    }

    pub fn pattern(self, pattern: impl Into<String>) -> Self {
        self.rule(Rule::Pattern(pattern.into()))
    }

    pub fn email(self) -> Self { self.rule(Rule::Email) }
    pub fn url(self) -> Self { self.rule(Rule::Url) }

    pub fn one_of(self, values: impl IntoIterator<Item = Value>) -> Self {
        self.rule(Rule::OneOf(values.into_iter().collect()))
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Reason reported instead of the generated message when this field fails.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn kind(&self) -> &Kind { &self.kind }
    pub fn is_optional(&self) -> bool { self.optional }
}

/// How a received value is described in messages: "a number", "null", ...
pub(crate) fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null      => "null",
        Value::Bool(_)   => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_)  => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_implies_optional() {
        let field = Field::integer("page").default(json!(1));
        assert!(field.is_optional());
        assert_eq!(field.default, Some(json!(1)));
    }

    #[test]
    fn rules_accumulate_in_order() {
        let field = Field::string("code").length(Some(2), Some(4)).pattern("^[A-Z]+$");
        assert_eq!(field.rules, vec![
            Rule::Length { min: Some(2), max: Some(4) },
            Rule::Pattern("^[A-Z]+$".to_owned()),
        ]);
    }

    #[test]
    fn kinds_read_naturally() {
        assert_eq!(Kind::Integer.article(), "an integer");
        assert_eq!(Kind::Custom("uuid".into()).article(), "a value of type `uuid`");
        assert_eq!(describe(&json!(42)), "a number");
    }
}
