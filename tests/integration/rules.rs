//! Booking rules: past dates, availability, rejections, delay counting.

use axum::http::{Method, StatusCode};
use serde_json::json;
use sqlx::PgPool;

use pretmat_server::models::user::Role;

use crate::common::{
    self, count_loans, date, material_available, post, seed_loan, seed_material, seed_user, token,
};

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn reservation_starting_in_the_past_is_rejected(pool: PgPool) {
    let olga = seed_user(&pool, "olga", "student").await;
    let material = seed_material(&pool, "Drone", "DRO-001").await;
    let app = common::build_test_app(pool.clone());

    let (status, body) = post(
        app,
        "/api/v1/equipment?action=reserve",
        &token(olga, Role::Student),
        json!({ "id": material, "start": date(-1), "end": date(1) }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");
    assert_eq!(count_loans(&pool, material).await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn maintenance_over_maintenance_is_a_conflict(pool: PgPool) {
    let admin = seed_user(&pool, "admin", "admin").await;
    let material = seed_material(&pool, "Laser", "LAS-001").await;
    seed_loan(&pool, material, admin, 4, 6, "Maintenance").await;
    let app = common::build_test_app(pool.clone());

    let (status, body) = post(
        app,
        "/api/v1/equipment?action=maintenance",
        &token(admin, Role::Admin),
        json!({ "id": material, "start": date(6), "end": date(8) }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Une maintenance est déjà planifiée sur cette période");
    assert_eq!(count_loans(&pool, material).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn availability_follows_bookings_covering_today(pool: PgPool) {
    let admin = seed_user(&pool, "admin", "admin").await;
    let paul = seed_user(&pool, "paul", "student").await;
    let laptop = seed_material(&pool, "Portable", "POR-001").await;
    let lathe = seed_material(&pool, "Tour", "TOU-001").await;
    let app = common::build_test_app(pool.clone());

    let (status, _) = post(
        app.clone(),
        "/api/v1/equipment?action=reserve",
        &token(paul, Role::Student),
        json!({ "id": laptop, "start": date(0), "end": date(1) }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!material_available(&pool, laptop).await);

    let loan: i32 = sqlx::query_scalar("SELECT id FROM loans WHERE material_id = $1")
        .bind(laptop)
        .fetch_one(&pool)
        .await
        .unwrap();
    let (status, _) = post(
        app.clone(),
        "/api/v1/dashboard?action=return",
        &token(paul, Role::Student),
        json!({ "id": loan }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(material_available(&pool, laptop).await);

    // A future booking leaves the flag alone
    let (status, _) = post(
        app.clone(),
        "/api/v1/equipment?action=reserve",
        &token(paul, Role::Student),
        json!({ "id": lathe, "start": date(3), "end": date(4) }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(material_available(&pool, lathe).await);

    let (status, _) = post(
        app,
        "/api/v1/equipment?action=maintenance",
        &token(admin, Role::Admin),
        json!({ "id": lathe, "start": date(0), "end": date(1) }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!material_available(&pool, lathe).await);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn rejected_requests_create_no_loan(pool: PgPool) {
    let admin = seed_user(&pool, "admin", "admin").await;
    let tech = seed_user(&pool, "tech", "technician").await;
    let quinn = seed_user(&pool, "quinn", "student").await;
    let material = seed_material(&pool, "Ponceuse", "PON-001").await;
    let other = seed_material(&pool, "Niveau", "NIV-001").await;
    for offset in [40, 30, 20] {
        seed_loan(&pool, other, quinn, -offset, -offset + 2, "En cours").await;
    }
    let app = common::build_test_app(pool.clone());

    let (_, body) = post(
        app.clone(),
        "/api/v1/equipment?action=reserve",
        &token(quinn, Role::Student),
        json!({ "id": material, "start": date(5), "end": date(6) }),
    )
    .await;
    assert_eq!(body["status"], "pending");
    let reservation = body["request_id"].as_i64().unwrap();

    let (status, body) = post(
        app.clone(),
        "/api/v1/equipment?action=reservation_decide",
        &token(admin, Role::Admin),
        json!({ "id": reservation, "decision": "reject" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["request"]["status"], "rejected");
    assert!(body.get("loan_id").is_none());
    assert_eq!(count_loans(&pool, material).await, 0);

    // Technician maintenance over Quinn's booking of `other` waits for a decision
    seed_loan(&pool, other, quinn, 10, 12, "En cours").await;
    let (_, body) = post(
        app.clone(),
        "/api/v1/equipment?action=maintenance",
        &token(tech, Role::Technician),
        json!({ "id": other, "start": date(11), "end": date(13) }),
    )
    .await;
    assert_eq!(body["status"], "pending");
    let maintenance = body["request_id"].as_i64().unwrap();

    let (status, body) = post(
        app,
        "/api/v1/equipment?action=maintenance_decide",
        &token(admin, Role::Admin),
        json!({ "id": maintenance, "decision": "reject" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["request"]["status"], "rejected");

    let maintenance_loans: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE material_id = $1 AND kind = 'Maintenance'")
            .bind(other)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(maintenance_loans, 0);
    let end: chrono::NaiveDate =
        sqlx::query_scalar("SELECT MAX(end_date) FROM loans WHERE material_id = $1")
            .bind(other)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(end, common::day(12));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn overdue_maintenance_does_not_count_as_delay(pool: PgPool) {
    let rose = seed_user(&pool, "rose", "student").await;
    let material = seed_material(&pool, "Lampe", "LAM-001").await;
    let other = seed_material(&pool, "Ecran", "ECR-001").await;
    for offset in [40, 30, 20] {
        seed_loan(&pool, other, rose, -offset, -offset + 2, "Maintenance").await;
    }
    let app = common::build_test_app(pool);

    let (status, body) = post(
        app,
        "/api/v1/equipment?action=reserve",
        &token(rose, Role::Student),
        json!({ "id": material, "start": date(2), "end": date(3) }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn second_pending_reservation_replaces_first(pool: PgPool) {
    let sam = seed_user(&pool, "sam", "student").await;
    let material = seed_material(&pool, "Micro", "MIC-001").await;
    let other = seed_material(&pool, "Pied", "PIE-001").await;
    for offset in [40, 30, 20] {
        seed_loan(&pool, other, sam, -offset, -offset + 2, "En cours").await;
    }
    let app = common::build_test_app(pool.clone());
    let sam_token = token(sam, Role::Student);

    let mut ids = Vec::new();
    for (start, end) in [(5, 6), (8, 9)] {
        let (status, body) = post(
            app.clone(),
            "/api/v1/equipment?action=reserve",
            &sam_token,
            json!({ "id": material, "start": date(start), "end": date(end) }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "pending");
        ids.push(body["request_id"].as_i64().unwrap());
    }
    assert_eq!(ids[0], ids[1]);

    let rows: Vec<(chrono::NaiveDate, chrono::NaiveDate)> = sqlx::query_as(
        "SELECT start_date, end_date FROM pending_requests WHERE material_id = $1 AND user_id = $2",
    )
    .bind(material)
    .bind(sam)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(rows, vec![(common::day(8), common::day(9))]);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn malformed_action_body_gets_error_response(pool: PgPool) {
    let tina = seed_user(&pool, "tina", "student").await;
    let app = common::build_test_app(pool);
    let bearer = token(tina, Role::Student);

    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/v1/equipment?action=reserve")
        .header(axum::http::header::AUTHORIZATION, format!("Bearer {}", bearer))
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from("{\"id\": 1,"))
        .unwrap();
    let response = tower::ServiceExt::oneshot(app.clone(), request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "BadValue");

    // No Content-Type header at all
    let (status, body) = common::send(
        app,
        Method::POST,
        "/api/v1/dashboard?action=return",
        Some(&bearer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");
}
