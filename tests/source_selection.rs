//! Property tests for which part of a request the validator reads and writes.

use std::collections::BTreeMap;

use http::Method;
use proptest::prelude::*;
use serde_json::{Map, Value};
use sieve::schema::{Engine, Field};
use sieve::{validate_with, Request, Source, Validator};

fn passthrough() -> Validator<sieve::schema::Struct> {
    let engine = Engine::new().allow_unknown(true);
    validate_with(Field::any("marker").optional(), |fields| engine.structure(fields)).unwrap()
}

fn object(entries: BTreeMap<String, String>) -> Value {
    Value::Object(entries.into_iter().map(|(k, v)| (k, Value::String(v))).collect::<Map<_, _>>())
}

fn non_empty_object() -> impl Strategy<Value = Value> {
    prop::collection::btree_map("[a-z]{1,6}", "[a-z0-9]{0,6}", 1..5).prop_map(object)
}

/// Bodies that must not be picked: absent, `{}`, or not an object at all.
fn unusable_body() -> impl Strategy<Value = Option<Value>> {
    prop_oneof![
        Just(None),
        Just(Some(Value::Object(Map::new()))),
        Just(Some(Value::Null)),
        "[a-z]{0,8}".prop_map(|s| Some(Value::String(s))),
        prop::collection::vec(any::<i32>(), 0..4)
            .prop_map(|v| Some(Value::Array(v.into_iter().map(Value::from).collect()))),
    ]
}

fn request(body: Option<Value>, query: Option<Value>) -> Request {
    let mut req = Request::new(Method::POST, "/items");
    req.set_body(body);
    req.set_query(query);
    req
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A non-empty object body is always the validated source, and the query
    /// string is left exactly as it was.
    #[test]
    fn prop_non_empty_body_wins(
        body in non_empty_object(),
        query in prop::option::of(non_empty_object()),
    ) {
        let mut req = request(Some(body.clone()), query.clone());

        let source = passthrough().check(&mut req).unwrap();

        prop_assert_eq!(source, Source::Body);
        prop_assert_eq!(req.body(), Some(&body));
        prop_assert_eq!(req.original_body(), Some(&body));
        prop_assert_eq!(req.query(), query.as_ref());
        prop_assert_eq!(req.original_query(), None);
    }

    /// Anything else falls back to the query string; the body is untouched.
    #[test]
    fn prop_otherwise_query_is_validated(
        body in unusable_body(),
        query in prop::option::of(non_empty_object()),
    ) {
        let mut req = request(body.clone(), query.clone());

        let source = passthrough().check(&mut req).unwrap();

        prop_assert_eq!(source, Source::Query);
        prop_assert_eq!(req.body(), body.as_ref());
        prop_assert_eq!(req.original_body(), None);
        prop_assert_eq!(req.original_query(), query.as_ref());

        let expected = query.unwrap_or_else(|| Value::Object(Map::new()));
        prop_assert_eq!(req.query(), Some(&expected));
    }

    /// A rejected payload leaves every slot of the request as it was.
    #[test]
    fn prop_rejection_changes_nothing(
        body in prop::option::of(non_empty_object()),
        query in prop::option::of(non_empty_object()),
    ) {
        let strict = sieve::validate(Field::boolean("flag")).unwrap();
        let mut req = request(body.clone(), query.clone());

        prop_assert!(strict.check(&mut req).is_err());
        prop_assert_eq!(req.body(), body.as_ref());
        prop_assert_eq!(req.query(), query.as_ref());
        prop_assert_eq!(req.original_body(), None);
        prop_assert_eq!(req.original_query(), None);
    }
}
