//! End-to-end request handling through the router with validator middleware.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use http::{Method, StatusCode};
use serde_json::{json, Value};
use sieve::middleware::from_fn;
use sieve::schema::{Engine, Field};
use sieve::{validate, validate_with, Error, Request, Response, Router};

fn json_of(res: &Response) -> Value {
    serde_json::from_slice(res.body()).unwrap()
}

async fn echo(req: Request) -> Response {
    Response::json_value(&json!({
        "body": req.body(),
        "query": req.query(),
        "original_body": req.original_body(),
        "original_query": req.original_query(),
    }))
}

fn users() -> Router {
    Router::new()
        .on_with(
            Method::POST,
            "/users",
            validate(vec![
                Field::string("name").length(Some(1), Some(32)),
                Field::integer("age").coerce().range(Some(0.0), Some(150.0)).optional(),
            ])
            .unwrap(),
            echo,
        )
        .on_with(
            Method::GET,
            "/users",
            validate(vec![
                Field::integer("page").coerce().default(json!(1)),
                Field::array("tag").coerce().optional(),
            ])
            .unwrap(),
            echo,
        )
}

#[tokio::test]
async fn valid_body_is_normalized_and_original_kept() {
    let req = Request::new(Method::POST, "/users").with_body(json!({"name": "ada", "age": "36"}));
    let res = users().handle(req).await;

    assert_eq!(res.status_code(), StatusCode::OK);
    let out = json_of(&res);
    assert_eq!(out["body"], json!({"name": "ada", "age": 36}));
    assert_eq!(out["original_body"], json!({"name": "ada", "age": "36"}));
    assert_eq!(out["query"], Value::Null);
}

#[tokio::test]
async fn query_is_validated_when_there_is_no_body() {
    let req = Request::new(Method::GET, "/users").with_query(json!({"tag": "rust"}));
    let res = users().handle(req).await;

    assert_eq!(res.status_code(), StatusCode::OK);
    let out = json_of(&res);
    assert_eq!(out["query"], json!({"page": 1, "tag": ["rust"]}));
    assert_eq!(out["original_query"], json!({"tag": "rust"}));
}

#[tokio::test]
async fn missing_query_gets_defaults() {
    let res = users().handle(Request::new(Method::GET, "/users")).await;

    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(json_of(&res)["query"], json!({"page": 1}));
}

#[tokio::test]
async fn invalid_body_is_rejected_with_422() {
    let req = Request::new(Method::POST, "/users").with_body(json!({"name": 42}));
    let res = users().handle(req).await;

    assert_eq!(res.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        json_of(&res),
        json!({
            "error": {
                "type": "validation_error",
                "message": "Expected a string for `name`, got a number",
            }
        }),
    );
}

#[tokio::test]
async fn missing_required_field_is_named() {
    let req = Request::new(Method::POST, "/users").with_body(json!({"age": 3}));
    let res = users().handle(req).await;

    assert_eq!(res.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        json_of(&res)["error"]["message"],
        "Expected a string for `name`, got nothing",
    );
}

#[tokio::test]
async fn empty_body_object_falls_back_to_query() {
    let req = Request::new(Method::POST, "/users")
        .with_body(json!({}))
        .with_query(json!({"name": "grace"}));
    let res = users().handle(req).await;

    assert_eq!(res.status_code(), StatusCode::OK);
    let out = json_of(&res);
    assert_eq!(out["body"], json!({}));
    assert_eq!(out["query"], json!({"name": "grace"}));
}

#[tokio::test]
async fn custom_reason_reaches_the_client() {
    let engine = Engine::new().kind("slug", |v| match v.as_str() {
        Some(s) if !s.is_empty() && s.chars().all(|c| c.is_ascii_lowercase() || c == '-') => Ok(()),
        _ => Err("must be a lowercase slug".to_owned()),
    });
    let app = Router::new().on_with(
        Method::POST,
        "/posts",
        validate_with(Field::custom("slug", "slug"), |f| engine.structure(f)).unwrap(),
        echo,
    );

    let req = Request::new(Method::POST, "/posts").with_body(json!({"slug": "Not A Slug"}));
    let res = app.handle(req).await;

    assert_eq!(res.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_of(&res)["error"]["message"], "must be a lowercase slug");
}

#[tokio::test]
async fn custom_error_stage_sees_the_validation_reason() {
    let handled = Arc::new(AtomicUsize::new(0));
    let h = Arc::clone(&handled);

    let app = Router::new()
        .on_with(
            Method::POST,
            "/users",
            validate(Field::string("name").message("name is required")).unwrap(),
            move |_req: Request| {
                h.fetch_add(1, Ordering::SeqCst);
                async { Response::status(StatusCode::CREATED) }
            },
        )
        .catch(|e: Error| {
            let reason = e.as_validation().map(|v| v.reason().to_owned()).unwrap_or_default();
            Response::builder()
                .status(StatusCode::BAD_REQUEST)
                .json_value(&json!({ "why": reason }))
        });

    let res = app.handle(Request::new(Method::POST, "/users")).await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(json_of(&res), json!({"why": "name is required"}));
    assert_eq!(handled.load(Ordering::SeqCst), 0);

    let req = Request::new(Method::POST, "/users").with_body(json!({"name": "ok"}));
    let res = app.handle(req).await;
    assert_eq!(res.status_code(), StatusCode::CREATED);
    assert_eq!(handled.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn global_layer_can_prepare_the_payload() {
    let app = Router::new()
        .layer(from_fn(|req: &mut Request| {
            if let Some(Value::Object(body)) = req.body().cloned() {
                let trimmed = body.into_iter()
                    .map(|(k, v)| match v {
                        Value::String(s) => (k, Value::String(s.trim().to_owned())),
                        other => (k, other),
                    })
                    .collect();
                req.set_body(Some(Value::Object(trimmed)));
            }
            Ok(())
        }))
        .on_with(
            Method::POST,
            "/users",
            validate(Field::string("name").length(Some(1), Some(4))).unwrap(),
            echo,
        );

    let req = Request::new(Method::POST, "/users").with_body(json!({"name": "  ada  "}));
    let res = app.handle(req).await;

    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(json_of(&res)["body"], json!({"name": "ada"}));
}

#[tokio::test]
async fn one_validator_serves_many_requests() {
    let app = Arc::new(users());

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..16 {
        let app = Arc::clone(&app);
        tasks.spawn(async move {
            let body = if i % 2 == 0 { json!({"name": format!("u{i}")}) } else { json!({"name": i}) };
            app.handle(Request::new(Method::POST, "/users").with_body(body)).await.status_code()
        });
    }

    let mut ok = 0;
    let mut rejected = 0;
    while let Some(status) = tasks.join_next().await {
        match status.unwrap() {
            StatusCode::OK => ok += 1,
            StatusCode::UNPROCESSABLE_ENTITY => rejected += 1,
            other => panic!("unexpected status {other}"),
        }
    }
    assert_eq!((ok, rejected), (8, 8));
}
