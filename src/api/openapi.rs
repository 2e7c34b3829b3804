//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{assignments, health, projects, stats, tools, workers};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Toolroom API",
        version = "1.0.0",
        description = "Tool check-out / check-in inventory REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api", description = "API")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Tools
        tools::list_tools,
        tools::get_tool,
        tools::create_tool,
        tools::update_tool,
        tools::delete_tool,
        // Workers
        workers::list_workers,
        workers::get_worker,
        workers::create_worker,
        workers::update_worker,
        workers::delete_worker,
        // Projects
        projects::list_projects,
        projects::get_project,
        projects::create_project,
        projects::update_project,
        projects::delete_project,
        // Assignments
        assignments::list_assignments,
        assignments::get_assignment,
        assignments::checkout,
        assignments::checkin,
        // Stats
        stats::get_stats,
    ),
    components(
        schemas(
            // Tools
            crate::models::tool::Tool,
            crate::models::tool::ToolStatus,
            crate::models::tool::CreateTool,
            crate::models::tool::UpdateTool,
            // Workers & projects
            crate::models::worker::Worker,
            crate::models::worker::WorkerData,
            crate::models::project::Project,
            crate::models::project::ProjectData,
            // Assignments
            crate::models::assignment::AssignmentStatus,
            crate::models::assignment::ToolCondition,
            crate::models::assignment::ToolRequest,
            crate::models::assignment::CheckoutRequest,
            crate::models::assignment::CheckinRequest,
            crate::models::assignment::AssignedTool,
            crate::models::assignment::AssignmentDetails,
            // Stats
            crate::models::stats::DashboardStats,
            crate::models::stats::StatusCounts,
            crate::models::stats::CalibrationAlert,
            // Common
            health::HealthResponse,
            super::MessageResponse,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "tools", description = "Tool catalog"),
        (name = "workers", description = "Worker management"),
        (name = "projects", description = "Project management"),
        (name = "assignments", description = "Tool checkout and check-in"),
        (name = "stats", description = "Statistics")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
