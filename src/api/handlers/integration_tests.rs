//! Router-level tests against a real Postgres (skipped without a container runtime).

use super::state::fixtures;
use crate::api::router;
use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{header::SET_COOKIE, HeaderMap, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sqlx::{PgPool, Row};
use test_support::{postgres::PostgresContainer, runtime, TestNetwork};
use tokio::sync::OnceCell;
use tower::ServiceExt;
use uuid::Uuid;

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

static TEST_CONTAINER: OnceCell<PostgresContainer> = OnceCell::const_new();

async fn get_test_pool() -> Result<PgPool> {
    let container = TEST_CONTAINER
        .get_or_try_init(|| async {
            let network = TestNetwork::new("todos-handlers-test");
            PostgresContainer::start(network.name()).await
        })
        .await?;

    container.pool_with_schema(SCHEMA_SQL).await
}

struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Result<Response> {
    let mut request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        request = request.header("authorization", format!("Bearer {token}"));
    }
    let body = body.map_or_else(Body::empty, |value| Body::from(value.to_string()));

    let response = app.clone().oneshot(request.body(body)?).await?;
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    Ok(Response {
        status,
        headers,
        body,
    })
}

fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", Uuid::new_v4().simple())
}

async fn register(app: &Router, email: &str, password: &str) -> Result<Response> {
    send(
        app,
        "POST",
        "/api/register",
        None,
        Some(json!({ "email": email, "password": password, "username": "tester" })),
    )
    .await
}

async fn login(app: &Router, email: &str, password: &str) -> Result<Response> {
    send(
        app,
        "POST",
        "/api/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await
}

async fn token_for(app: &Router, prefix: &str) -> Result<String> {
    let email = unique_email(prefix);
    register(app, &email, "correct horse").await?;
    let response = login(app, &email, "correct horse").await?;
    response.body["token"]
        .as_str()
        .map(ToString::to_string)
        .context("login did not return a token")
}

async fn setup() -> Result<Option<(Router, PgPool)>> {
    if let Err(err) = runtime::ensure_container_runtime() {
        eprintln!("Skipping integration test: {err}");
        return Ok(None);
    }
    let pool = get_test_pool().await?;
    Ok(Some((router(pool.clone(), fixtures::auth_state()), pool)))
}

#[tokio::test]
async fn register_then_login() -> Result<()> {
    let Some((app, _pool)) = setup().await? else {
        return Ok(());
    };

    let email = unique_email("login");
    let registered = register(&app, &email, "s3cret!").await?;
    assert_eq!(registered.status, StatusCode::CREATED);
    assert_eq!(registered.body["message"], "User registered successfully.");
    assert_eq!(registered.body["user"]["email"], email.as_str());
    assert!(registered.body["user"].get("password").is_none());

    let logged_in = login(&app, &email, "s3cret!").await?;
    assert_eq!(logged_in.status, StatusCode::OK);
    assert_eq!(logged_in.body["message"], "Login successful.");
    let token = logged_in.body["token"].as_str().unwrap_or_default();
    assert!(!token.is_empty());

    let cookie = logged_in
        .headers
        .get(SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    assert!(cookie.starts_with(&format!("token={token}")));
    assert!(cookie.contains("HttpOnly"));

    let claims = fixtures::auth_state().tokens().verify(token)?;
    assert_eq!(claims.email, email);
    Ok(())
}

#[tokio::test]
async fn email_is_case_insensitive() -> Result<()> {
    let Some((app, _pool)) = setup().await? else {
        return Ok(());
    };

    let email = unique_email("case");
    register(&app, &email, "pw").await?;

    let duplicate = register(&app, &email.to_uppercase(), "pw").await?;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);
    assert_eq!(duplicate.body["error"], "User already exists.");

    let logged_in = login(&app, &format!("  {}", email.to_uppercase()), "pw").await?;
    assert_eq!(logged_in.status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn same_password_yields_distinct_records() -> Result<()> {
    let Some((app, pool)) = setup().await? else {
        return Ok(());
    };

    let first = unique_email("same-a");
    let second = unique_email("same-b");
    register(&app, &first, "shared password").await?;
    register(&app, &second, "shared password").await?;

    let rows = sqlx::query("SELECT password FROM users WHERE email = $1 OR email = $2")
        .bind(&first)
        .bind(&second)
        .fetch_all(&pool)
        .await?;
    let records: Vec<String> = rows
        .iter()
        .map(|row| row.try_get("password"))
        .collect::<Result<_, _>>()?;
    assert_eq!(records.len(), 2);
    assert_ne!(records[0], records[1]);
    for record in &records {
        assert!(!record.contains("shared password"));
        assert!(fixtures::auth_state()
            .hasher()
            .verify("shared password", record)?);
    }

    assert_eq!(login(&app, &first, "shared password").await?.status, StatusCode::OK);
    assert_eq!(login(&app, &second, "shared password").await?.status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn bad_credentials_share_one_response() -> Result<()> {
    let Some((app, _pool)) = setup().await? else {
        return Ok(());
    };

    let email = unique_email("bad");
    register(&app, &email, "right").await?;

    let wrong_password = login(&app, &email, "wrong").await?;
    let unknown_user = login(&app, &unique_email("nobody"), "right").await?;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body, unknown_user.body);
    assert_eq!(wrong_password.body["error"], "Invalid email or password.");
    Ok(())
}

#[tokio::test]
async fn malformed_stored_record_denies_login() -> Result<()> {
    let Some((app, pool)) = setup().await? else {
        return Ok(());
    };

    let email = unique_email("malformed");
    register(&app, &email, "pw").await?;
    sqlx::query("UPDATE users SET password = 'no-delimiter-here' WHERE email = $1")
        .bind(&email)
        .execute(&pool)
        .await?;

    let response = login(&app, &email, "pw").await?;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.body.get("token").is_none());
    Ok(())
}

#[tokio::test]
async fn todo_lifecycle() -> Result<()> {
    let Some((app, _pool)) = setup().await? else {
        return Ok(());
    };
    let token = token_for(&app, "crud").await?;

    let created = send(
        &app,
        "POST",
        "/api/todo",
        Some(&token),
        Some(json!({ "title": "Buy milk", "content": "2 liters" })),
    )
    .await?;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["title"], "Buy milk");
    let id = created.body["id"].as_str().unwrap_or_default().to_string();

    let listed = send(&app, "GET", "/api/todo", Some(&token), None).await?;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body.as_array().map(Vec::len), Some(1));
    assert_eq!(listed.body[0]["userId"], created.body["userId"]);

    let updated = send(
        &app,
        "PUT",
        "/api/todo",
        Some(&token),
        Some(json!({ "id": id, "content": "3 liters" })),
    )
    .await?;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["title"], "Buy milk");
    assert_eq!(updated.body["content"], "3 liters");

    let deleted = send(
        &app,
        "DELETE",
        "/api/todo",
        Some(&token),
        Some(json!({ "id": id })),
    )
    .await?;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["message"], "Todo deleted successfully");

    let listed = send(&app, "GET", "/api/todo", Some(&token), None).await?;
    assert_eq!(listed.body.as_array().map(Vec::len), Some(0));
    Ok(())
}

#[tokio::test]
async fn todos_are_private_to_their_owner() -> Result<()> {
    let Some((app, _pool)) = setup().await? else {
        return Ok(());
    };
    let owner = token_for(&app, "owner").await?;
    let intruder = token_for(&app, "intruder").await?;

    let created = send(
        &app,
        "POST",
        "/api/todo",
        Some(&owner),
        Some(json!({ "title": "Private" })),
    )
    .await?;
    let id = created.body["id"].clone();

    let listed = send(&app, "GET", "/api/todo", Some(&intruder), None).await?;
    assert_eq!(listed.body.as_array().map(Vec::len), Some(0));

    let update = send(
        &app,
        "PUT",
        "/api/todo",
        Some(&intruder),
        Some(json!({ "id": id, "title": "Mine now" })),
    )
    .await?;
    assert_eq!(update.status, StatusCode::FORBIDDEN);
    assert_eq!(update.body["error"], "Unauthorized or Todo not found");

    let delete = send(
        &app,
        "DELETE",
        "/api/todo",
        Some(&intruder),
        Some(json!({ "id": id })),
    )
    .await?;
    assert_eq!(delete.status, StatusCode::FORBIDDEN);

    let missing = send(
        &app,
        "DELETE",
        "/api/todo",
        Some(&owner),
        Some(json!({ "id": Uuid::new_v4() })),
    )
    .await?;
    assert_eq!(missing.status, StatusCode::FORBIDDEN);
    assert_eq!(missing.body, delete.body);

    let listed = send(&app, "GET", "/api/todo", Some(&owner), None).await?;
    assert_eq!(listed.body[0]["title"], "Private");
    Ok(())
}

#[tokio::test]
async fn cookie_token_authenticates_api_calls() -> Result<()> {
    let Some((app, _pool)) = setup().await? else {
        return Ok(());
    };
    let token = token_for(&app, "cookie").await?;

    let request = Request::builder()
        .method("GET")
        .uri("/api/todo")
        .header("cookie", format!("theme=dark; token={token}"))
        .body(Body::empty())?;
    let response = app.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn health_reports_database_ok() -> Result<()> {
    let Some((app, _pool)) = setup().await? else {
        return Ok(());
    };

    let response = send(&app, "GET", "/health", None, None).await?;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["database"], "ok");
    assert_eq!(response.body["name"], env!("CARGO_PKG_NAME"));
    Ok(())
}
