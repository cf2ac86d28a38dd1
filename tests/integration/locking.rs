//! Workflows that meet on the same material must queue behind its row lock
//! instead of deadlocking.

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;

use pretmat_server::models::user::Role;

use crate::common::{self, post, seed_loan, seed_material, seed_user, token};

/// Take the material lock the way maintenance does, then touch `statement`
/// while `call` is in flight
async fn hold_material_then<F>(
    pool: &PgPool,
    material_id: i32,
    statement: &str,
    row_id: i32,
    call: F,
) -> (StatusCode, serde_json::Value)
where
    F: std::future::Future<Output = (StatusCode, serde_json::Value)> + Send + 'static,
{
    let mut tx = pool.begin().await.unwrap();
    sqlx::query("SELECT id FROM materials WHERE id = $1 FOR UPDATE")
        .bind(material_id)
        .execute(&mut *tx)
        .await
        .unwrap();

    let handle = tokio::spawn(call);
    tokio::time::sleep(Duration::from_millis(500)).await;

    sqlx::query(statement).bind(row_id).execute(&mut *tx).await.unwrap();
    tx.commit().await.unwrap();

    tokio::time::timeout(Duration::from_secs(10), handle)
        .await
        .expect("workflow finished")
        .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn return_waits_for_material_lock(pool: PgPool) {
    let mia = seed_user(&pool, "mia", "student").await;
    let material = seed_material(&pool, "Enceinte", "ENC-001").await;
    let loan = seed_loan(&pool, material, mia, -1, 3, "En cours").await;
    let app = common::build_test_app(pool.clone());

    let bearer = token(mia, Role::Student);
    let call = async move {
        post(app, "/api/v1/dashboard?action=return", &bearer, json!({ "id": loan })).await
    };
    let (status, body) = hold_material_then(
        &pool,
        material,
        "UPDATE loans SET end_date = end_date WHERE id = $1",
        loan,
        call,
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["status"], "ok");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn maintenance_decision_waits_for_material_lock(pool: PgPool) {
    let admin = seed_user(&pool, "admin", "admin").await;
    let tech = seed_user(&pool, "tech", "technician").await;
    let material = seed_material(&pool, "Imprimante", "IMP-001").await;
    let request: i32 = sqlx::query_scalar(
        "INSERT INTO pending_requests (kind, material_id, user_id, start_date, end_date) \
         VALUES ('maintenance', $1, $2, $3, $4) RETURNING id",
    )
    .bind(material)
    .bind(tech)
    .bind(common::day(5))
    .bind(common::day(6))
    .fetch_one(&pool)
    .await
    .unwrap();
    let app = common::build_test_app(pool.clone());

    let bearer = token(admin, Role::Admin);
    let call = async move {
        post(app, "/api/v1/equipment?action=maintenance_decide", &bearer, json!({ "id": request, "decision": "approve" })).await
    };
    let (status, body) = hold_material_then(
        &pool,
        material,
        "UPDATE pending_requests SET created_at = NOW() WHERE id = $1",
        request,
        call,
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["request"]["status"], "approved");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn reservation_decision_waits_for_material_lock(pool: PgPool) {
    let admin = seed_user(&pool, "admin", "admin").await;
    let nina = seed_user(&pool, "nina", "student").await;
    let material = seed_material(&pool, "Tablette", "TAB-001").await;
    let request: i32 = sqlx::query_scalar(
        "INSERT INTO pending_requests (kind, material_id, user_id, start_date, end_date) \
         VALUES ('reservation', $1, $2, $3, $4) RETURNING id",
    )
    .bind(material)
    .bind(nina)
    .bind(common::day(5))
    .bind(common::day(6))
    .fetch_one(&pool)
    .await
    .unwrap();
    let app = common::build_test_app(pool.clone());

    let bearer = token(admin, Role::Admin);
    let call = async move {
        post(app, "/api/v1/equipment?action=reservation_decide", &bearer, json!({ "id": request, "decision": "reject" })).await
    };
    let (status, body) = hold_material_then(
        &pool,
        material,
        "UPDATE pending_requests SET created_at = NOW() WHERE id = $1",
        request,
        call,
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["request"]["status"], "rejected");
}
