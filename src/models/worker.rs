//! Worker model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Someone who borrows tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Worker {
    pub id: i64,
    pub name: String,
    /// Unique staff identifier (EMP001...)
    pub employee_id: String,
}

/// Create / update worker request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkerData {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Employee ID is required"))]
    pub employee_id: String,
}
