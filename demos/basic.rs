//! Validated JSON endpoints.
//!
//! Run with:
//!   cargo run --example basic
//!
//! Try:
//!   curl -X POST http://localhost:3000/users \
//!        -H 'content-type: application/json' \
//!        -d '{"name":"alice","age":"36"}'
//!   curl -X POST http://localhost:3000/users \
//!        -H 'content-type: application/json' \
//!        -d '{"name":42}'
//!   curl 'http://localhost:3000/users?page=2&tag=a&tag=b'
//!   curl 'http://localhost:3000/users?page=zero'

use http::{Method, StatusCode};
use serde_json::json;
use sieve::schema::Field;
use sieve::{validate, Request, Response, Router, Server};

#[tokio::main]
async fn main() -> Result<(), sieve::Error> {
    tracing_subscriber::fmt::init();

    let app = Router::new()
        .on_with(
            Method::POST,
            "/users",
            validate(vec![
                Field::string("name").length(Some(1), Some(64)),
                Field::integer("age").coerce().range(Some(0.0), None).optional(),
                Field::string("email").email().optional(),
            ])?,
            create_user,
        )
        .on_with(
            Method::GET,
            "/users",
            validate(vec![
                Field::integer("page").coerce().range(Some(1.0), None).default(json!(1)),
                Field::array("tag").coerce().optional(),
            ])?,
            list_users,
        );

    Server::bind("0.0.0.0:3000")?.serve(app).await
}

// POST /users
//
// req.body() is the validated data: "36" has become 36. The raw submission
// is still there in req.original_body().
async fn create_user(req: Request) -> Response {
    let body = req.body().cloned().unwrap_or_default();
    Response::builder()
        .status(StatusCode::CREATED)
        .header("location", "/users/99")
        .json_value(&json!({ "id": 99, "user": body }))
}

// GET /users?page=2&tag=a&tag=b
async fn list_users(req: Request) -> Response {
    let query = req.query().cloned().unwrap_or_default();
    Response::json_value(&json!({ "users": [], "filter": query }))
}
