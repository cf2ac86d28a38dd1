//! API handlers for Pretmat REST endpoints

pub mod dashboard;
pub mod equipment;
pub mod health;
pub mod notifications;
pub mod openapi;
pub mod requests;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    routing::get,
    Router,
};
use serde::de::DeserializeOwned;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    error::{AppError, AppResult},
    models::user::{RequestContext, UserClaims},
    AppState,
};

/// Extractor for the authenticated caller, from the session JWT
pub struct AuthenticatedUser(pub RequestContext);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Session requise".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(RequestContext::from(&claims)))
    }
}

/// Decode an action body whose shape depends on the `action` parameter
pub(crate) fn parse_body<T: DeserializeOwned>(body: serde_json::Value) -> AppResult<T> {
    serde_json::from_value(body).map_err(|e| AppError::Validation(format!("Requête invalide: {}", e)))
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // Open CORS for the local front-end
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route(
            "/equipment",
            get(equipment::list_equipment).post(equipment::equipment_action),
        )
        .route(
            "/dashboard",
            get(dashboard::get_dashboard).post(dashboard::dashboard_action),
        )
        .route("/requests", get(requests::list_pending_requests))
        .route("/notifications", get(notifications::list_notifications))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
