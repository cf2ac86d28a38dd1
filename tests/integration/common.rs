use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Local, NaiveDate};
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

use pretmat_server::{
    api,
    config::AppConfig,
    models::user::{Role, UserClaims},
    AppState,
};

/// Router over the given pool with default configuration
pub fn build_test_app(pool: PgPool) -> Router {
    api::create_router(AppState::new(pool, AppConfig::default()))
}

/// Bearer token for a seeded user, signed with the default secret
pub fn token(user_id: i32, role: Role) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = UserClaims {
        sub: format!("user{}", user_id),
        user_id,
        role,
        exp: now + 3600,
        iat: now,
    };
    claims
        .create_token(&AppConfig::default().auth.jwt_secret)
        .expect("token")
}

/// Day relative to today
pub fn day(offset: i64) -> NaiveDate {
    Local::now().date_naive() + Duration::days(offset)
}

pub fn date(offset: i64) -> String {
    day(offset).format("%Y-%m-%d").to_string()
}

pub async fn seed_user(pool: &PgPool, login: &str, role: &str) -> i32 {
    sqlx::query_scalar("INSERT INTO users (login, firstname, lastname, role) VALUES ($1, $1, 'Test', $2) RETURNING id")
        .bind(login)
        .bind(role)
        .fetch_one(pool)
        .await
        .expect("seed user")
}

pub async fn seed_material(pool: &PgPool, name: &str, reference: &str) -> i32 {
    sqlx::query_scalar("INSERT INTO materials (name, reference, condition) VALUES ($1, $2, 'bon') RETURNING id")
        .bind(name)
        .bind(reference)
        .fetch_one(pool)
        .await
        .expect("seed material")
}

pub async fn seed_loan(pool: &PgPool, material_id: i32, user_id: i32, start: i64, end: i64, kind: &str) -> i32 {
    sqlx::query_scalar(
        "INSERT INTO loans (material_id, user_id, start_date, end_date, kind) VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(material_id)
    .bind(user_id)
    .bind(day(start))
    .bind(day(end))
    .bind(kind)
    .fetch_one(pool)
    .await
    .expect("seed loan")
}

/// Send a request and decode the JSON body (Null when empty)
pub async fn send(app: Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

pub async fn get(app: Router, uri: &str, token: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post(app: Router, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn material_available(pool: &PgPool, material_id: i32) -> bool {
    sqlx::query_scalar("SELECT available FROM materials WHERE id = $1")
        .bind(material_id)
        .fetch_one(pool)
        .await
        .expect("material")
}

pub async fn count_loans(pool: &PgPool, material_id: i32) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE material_id = $1")
        .bind(material_id)
        .fetch_one(pool)
        .await
        .expect("count loans")
}
