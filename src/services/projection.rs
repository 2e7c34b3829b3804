//! Assembles assignment views with their worker, project and tools

use crate::{
    error::{AppError, AppResult},
    models::assignment::{AssignedTool, Assignment, AssignmentDetails},
    repository::InventoryReader,
};

/// Join an assignment with its worker, project and held tools as currently stored
pub async fn details<R>(reader: &mut R, assignment: Assignment) -> AppResult<AssignmentDetails>
where
    R: InventoryReader + ?Sized,
{
    let worker = reader.worker(assignment.worker_id).await?.ok_or_else(|| {
        AppError::Internal(format!(
            "Assignment {} references missing worker {}",
            assignment.id, assignment.worker_id
        ))
    })?;
    let project = reader.project(assignment.project_id).await?.ok_or_else(|| {
        AppError::Internal(format!(
            "Assignment {} references missing project {}",
            assignment.id, assignment.project_id
        ))
    })?;

    let lines = reader.assignment_tools(assignment.id).await?;
    let mut tools = Vec::with_capacity(lines.len());
    for line in lines {
        let tool = reader.tool(line.tool_id).await?.ok_or_else(|| {
            AppError::Internal(format!(
                "Assignment {} references missing tool {}",
                assignment.id, line.tool_id
            ))
        })?;
        tools.push(AssignedTool::new(tool, line.quantity));
    }

    Ok(AssignmentDetails {
        id: assignment.id,
        checkout_date: assignment.checkout_date,
        checkin_date: assignment.checkin_date,
        status: assignment.status,
        checkin_notes: assignment.checkin_notes,
        tool_conditions: assignment.tool_conditions,
        worker,
        project,
        tools,
    })
}
