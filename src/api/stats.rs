//! Statistics endpoints

use axum::{extract::State, Json};

use crate::{error::AppResult, models::stats::DashboardStats};

/// Tool room overview
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardStats)
    )
)]
pub async fn get_stats(State(state): State<crate::AppState>) -> AppResult<Json<DashboardStats>> {
    let stats = state.services.stats.dashboard().await?;
    Ok(Json(stats))
}
