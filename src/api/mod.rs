//! API handlers for the Toolroom REST endpoints

pub mod assignments;
pub mod health;
pub mod openapi;
pub mod projects;
pub mod stats;
pub mod tools;
pub mod workers;

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    routing::{get, put},
    Json, Router,
};
use serde::{de::DeserializeOwned, Serialize};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::ToSchema;

use crate::{error::AppError, AppState};

/// JSON request body; malformed payloads are reported as validation errors
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(JsonBody(value))
    }
}

/// JSON request body that may be left out; an empty body reads as `T::default()`
pub struct OptionalJsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for OptionalJsonBody<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(OptionalJsonBody(T::default()));
        }

        let value = serde_json::from_slice(&bytes).map_err(|e| {
            AppError::Validation(format!("Failed to parse the request body as JSON: {}", e))
        })?;
        Ok(OptionalJsonBody(value))
    }
}

/// Query string filters, with the same error shape as [`JsonBody`]
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(QueryParams(value))
    }
}

/// Confirmation returned by delete endpoints
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self { message: message.into() })
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Tools
        .route("/tools", get(tools::list_tools).post(tools::create_tool))
        .route(
            "/tools/:id",
            get(tools::get_tool).put(tools::update_tool).delete(tools::delete_tool),
        )
        // Workers
        .route("/workers", get(workers::list_workers).post(workers::create_worker))
        .route(
            "/workers/:id",
            get(workers::get_worker)
                .put(workers::update_worker)
                .delete(workers::delete_worker),
        )
        // Projects
        .route("/projects", get(projects::list_projects).post(projects::create_project))
        .route(
            "/projects/:id",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
        // Assignments
        .route(
            "/assignments",
            get(assignments::list_assignments).post(assignments::checkout),
        )
        .route("/assignments/:id", get(assignments::get_assignment))
        .route("/assignments/:id/checkin", put(assignments::checkin))
        // Statistics
        .route("/stats", get(stats::get_stats))
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .merge(openapi::create_openapi_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
