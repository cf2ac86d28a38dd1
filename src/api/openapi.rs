//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{dashboard, equipment, health, notifications, requests};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pretmat API",
        version = "1.0.0",
        description = "Equipment lending REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Equipment
        equipment::list_equipment,
        equipment::equipment_action,
        // Dashboard
        dashboard::get_dashboard,
        dashboard::dashboard_action,
        // Requests
        requests::list_pending_requests,
        // Notifications
        notifications::list_notifications,
    ),
    components(
        schemas(
            // Equipment
            crate::models::material::Condition,
            crate::models::material::MaterialStatus,
            crate::models::material::Material,
            crate::models::material::CreateMaterial,
            crate::models::material::ReservationPeriod,
            crate::models::material::CatalogEntry,
            equipment::EquipmentAction,
            // Loans
            crate::models::loan::LoanKind,
            crate::models::loan::Loan,
            crate::models::loan::ReturnState,
            crate::models::loan::ReturnRecord,
            crate::models::loan::LoanSummary,
            crate::models::loan::LoanStats,
            crate::models::loan::DashboardScope,
            crate::models::loan::Dashboard,
            crate::models::loan::PeriodRequest,
            crate::models::loan::ReturnLoanRequest,
            crate::models::loan::CancelLoanRequest,
            dashboard::DashboardAction,
            dashboard::ReturnResponse,
            dashboard::CancelResponse,
            // Requests
            crate::models::request::RequestKind,
            crate::models::request::RequestStatus,
            crate::models::request::PendingRequest,
            crate::models::request::PendingRequestDetails,
            crate::models::request::Decision,
            crate::models::request::DecideRequest,
            crate::models::request::OutcomeStatus,
            crate::models::request::WorkflowOutcome,
            crate::models::request::DecisionOutcome,
            // Users
            crate::models::user::Role,
            crate::models::user::User,
            crate::models::notification::Notification,
            crate::calendar::DateRange,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "equipment", description = "Catalog, reservations and maintenance"),
        (name = "dashboard", description = "Loans, returns and cancellations"),
        (name = "requests", description = "Pending requests awaiting an admin"),
        (name = "notifications", description = "User notifications")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
