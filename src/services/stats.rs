//! Dashboard statistics service

use chrono::{NaiveDate, Utc};

use crate::{
    error::AppResult,
    models::{
        assignment::{Assignment, AssignmentQuery},
        stats::{CalibrationAlert, DashboardStats, StatusCounts},
        tool::{Tool, ToolQuery, ToolStatus},
    },
    repository::Repository,
};

/// Calibrable tools due within this many days are flagged
pub const CALIBRATION_WINDOW_DAYS: i64 = 30;

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Overview of the tool room as of today
    pub async fn dashboard(&self) -> AppResult<DashboardStats> {
        let mut reader = self.repository.reader().await?;
        let tools = reader.tools(&ToolQuery::default()).await?;
        let assignments = reader.assignments(&AssignmentQuery::default()).await?;

        let mut reserved_units = 0;
        for tool in &tools {
            reserved_units += reader.reserved_units(tool.id, None).await?;
        }

        Ok(summarize(&tools, &assignments, reserved_units, Utc::now().date_naive()))
    }
}

/// Build dashboard figures from a snapshot of the inventory
pub fn summarize(
    tools: &[Tool],
    assignments: &[Assignment],
    reserved_units: i64,
    today: NaiveDate,
) -> DashboardStats {
    let mut by_status = StatusCounts::default();
    for tool in tools {
        let counter = match tool.status {
            ToolStatus::Available => &mut by_status.available,
            ToolStatus::InUse => &mut by_status.in_use,
            ToolStatus::Damaged => &mut by_status.damaged,
            ToolStatus::Lost => &mut by_status.lost,
            ToolStatus::CalibrationDue => &mut by_status.calibration_due,
        };
        *counter += 1;
    }

    let active = assignments.iter().filter(|a| a.is_active()).count() as i64;

    let mut calibration_alerts: Vec<CalibrationAlert> = tools
        .iter()
        .filter(|t| t.is_calibrable)
        .filter_map(|t| {
            let due = t.calibration_due?;
            let days_remaining = (due - today).num_days();
            (days_remaining <= CALIBRATION_WINDOW_DAYS).then(|| CalibrationAlert {
                tool_id: t.id,
                name: t.name.clone(),
                calibration_due: due,
                days_remaining,
            })
        })
        .collect();
    calibration_alerts.sort_by_key(|alert| (alert.days_remaining, alert.tool_id));

    DashboardStats {
        total_tools: tools.len() as i64,
        tools_by_status: by_status,
        available_units: tools.iter().map(|t| t.quantity).sum(),
        reserved_units,
        active_assignments: active,
        completed_assignments: assignments.len() as i64 - active,
        calibration_alerts,
    }
}
