use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;

use pretmat_server::models::user::Role;

use crate::common::{self, get, post, seed_loan, seed_material, seed_user, token};

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn return_records_degradation_once(pool: PgPool) {
    let grace = seed_user(&pool, "grace", "student").await;
    let material = seed_material(&pool, "Perceuse", "PER-001").await;
    let loan = seed_loan(&pool, material, grace, -2, 2, "En cours").await;
    let app = common::build_test_app(pool.clone());
    let grace_token = token(grace, Role::Student);

    let (status, body) = post(
        app.clone(),
        "/api/v1/dashboard?action=return",
        &grace_token,
        json!({ "id": loan, "condition": "passable" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["label"], "degrade:bon->passable");

    let condition: String = sqlx::query_scalar("SELECT condition FROM materials WHERE id = $1")
        .bind(material)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(condition, "passable");

    let (status, body) = post(
        app,
        "/api/v1/dashboard?action=return",
        &grace_token,
        json!({ "id": loan }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Emprunt déjà rendu");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn return_cannot_improve_condition(pool: PgPool) {
    let admin = seed_user(&pool, "admin", "admin").await;
    let henry = seed_user(&pool, "henry", "student").await;
    let material = seed_material(&pool, "Scie", "SCI-001").await;
    let loan = seed_loan(&pool, material, henry, -1, 1, "En cours").await;
    let app = common::build_test_app(pool);

    let (status, _) = post(
        app,
        "/api/v1/dashboard?action=return",
        &token(admin, Role::Admin),
        json!({ "id": loan, "condition": "neuf" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn cancellation_request_is_owner_only(pool: PgPool) {
    let ida = seed_user(&pool, "ida", "student").await;
    let jack = seed_user(&pool, "jack", "student").await;
    let material = seed_material(&pool, "Casque", "CAS-001").await;
    let loan = seed_loan(&pool, material, ida, 3, 5, "En cours").await;
    let app = common::build_test_app(pool);

    let (status, _) = post(
        app.clone(),
        "/api/v1/dashboard?action=cancel_request",
        &token(jack, Role::Student),
        json!({ "id": loan }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = post(
        app.clone(),
        "/api/v1/dashboard?action=cancel_request",
        &token(ida, Role::Student),
        json!({ "id": loan }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["loan"]["kind"], "Annulation demandee");

    let (status, body) = get(app, "/api/v1/dashboard", &token(ida, Role::Student)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["loans"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn global_dashboard_is_admin_only(pool: PgPool) {
    let kim = seed_user(&pool, "kim", "professor").await;
    let app = common::build_test_app(pool);

    let (status, _) = get(app, "/api/v1/dashboard?scope=all", &token(kim, Role::Professor)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
