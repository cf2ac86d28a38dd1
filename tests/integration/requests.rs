use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;

use pretmat_server::models::user::Role;

use crate::common::{self, date, get, post, seed_loan, seed_material, seed_user, token};

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn repeated_request_overwrites_pending_one(pool: PgPool) {
    let admin = seed_user(&pool, "admin", "admin").await;
    let tech = seed_user(&pool, "tech", "technician").await;
    let lou = seed_user(&pool, "lou", "student").await;
    let material = seed_material(&pool, "Soudeuse", "SOU-001").await;
    seed_loan(&pool, material, lou, 4, 8, "En cours").await;
    let app = common::build_test_app(pool);
    let tech_token = token(tech, Role::Technician);

    for (start, end) in [(3, 5), (6, 9)] {
        let (status, body) = post(
            app.clone(),
            "/api/v1/equipment?action=maintenance",
            &tech_token,
            json!({ "id": material, "start": date(start), "end": date(end) }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "pending");
    }

    let (status, body) = get(app.clone(), "/api/v1/requests?kind=maintenance", &token(admin, Role::Admin)).await;
    assert_eq!(status, StatusCode::OK);
    let pending = body.as_array().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["start_date"], date(6));

    let (status, body) = post(
        app.clone(),
        "/api/v1/equipment?action=maintenance_decide",
        &token(admin, Role::Admin),
        json!({ "id": pending[0]["id"], "decision": "approve" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["request"]["status"], "approved");

    let (_, body) = get(app, "/api/v1/notifications", &token(lou, Role::Student)).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}
