//! Assignment lifecycle: checkout and check-in

use chrono::Utc;

use super::{ledger, projection};
use crate::{
    error::{AppError, AppResult},
    models::assignment::{
        AssignmentDetails, AssignmentQuery, AssignmentStatus, AssignmentTool, CheckinRequest,
        CheckoutOrder, CheckoutRequest, NewAssignment,
    },
    repository::{finish, InventoryTx, Repository},
};

#[derive(Clone)]
pub struct AssignmentsService {
    repository: Repository,
}

impl AssignmentsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List assignments, most recent checkout first
    pub async fn list(&self, query: &AssignmentQuery) -> AppResult<Vec<AssignmentDetails>> {
        let mut reader = self.repository.reader().await?;
        let assignments = reader.assignments(query).await?;

        let mut views = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            views.push(projection::details(reader.as_mut(), assignment).await?);
        }
        Ok(views)
    }

    /// Get one assignment
    pub async fn get(&self, id: i64) -> AppResult<AssignmentDetails> {
        let mut reader = self.repository.reader().await?;
        let assignment = reader
            .assignment(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Assignment {} not found", id)))?;
        projection::details(reader.as_mut(), assignment).await
    }

    /// Open an assignment and reserve every requested tool, or nothing at all
    pub async fn checkout(&self, request: CheckoutRequest) -> AppResult<AssignmentDetails> {
        let order = CheckoutOrder::try_from(request)?;

        let mut tx = self.repository.begin().await?;
        let result = open_assignment(tx.as_mut(), &order).await;
        let details = finish(tx, result).await?;

        tracing::info!(
            assignment_id = details.id,
            worker_id = order.worker_id,
            project_id = order.project_id,
            tools = order.tools.len(),
            "Tools checked out"
        );
        Ok(details)
    }

    /// Close an active assignment and put its tools back on the shelf
    pub async fn checkin(&self, id: i64, request: CheckinRequest) -> AppResult<AssignmentDetails> {
        let mut tx = self.repository.begin().await?;
        let result = close_assignment(tx.as_mut(), id, request).await;
        let details = finish(tx, result).await?;

        tracing::info!(
            assignment_id = id,
            tools = details.tools.len(),
            "Assignment checked in"
        );
        Ok(details)
    }
}

async fn open_assignment(
    tx: &mut dyn InventoryTx,
    order: &CheckoutOrder,
) -> AppResult<AssignmentDetails> {
    if tx.worker(order.worker_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Worker {} not found", order.worker_id)));
    }
    if tx.project(order.project_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Project {} not found", order.project_id)));
    }

    let assignment = tx
        .insert_assignment(&NewAssignment {
            checkout_date: order.checkout_date,
            worker_id: order.worker_id,
            project_id: order.project_id,
        })
        .await?;

    for line in &order.tools {
        ledger::reserve(&mut *tx, line.tool_id, line.quantity).await?;
        tx.insert_assignment_tool(&AssignmentTool {
            assignment_id: assignment.id,
            tool_id: line.tool_id,
            quantity: line.quantity,
        })
        .await?;
    }

    projection::details(&mut *tx, assignment).await
}

async fn close_assignment(
    tx: &mut dyn InventoryTx,
    id: i64,
    request: CheckinRequest,
) -> AppResult<AssignmentDetails> {
    let mut assignment = tx
        .assignment(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Assignment {} not found", id)))?;

    if !assignment.is_active() {
        tracing::warn!(assignment_id = id, "Check-in refused: assignment already completed");
        return Err(AppError::AlreadyCheckedIn(id));
    }

    assignment.status = AssignmentStatus::Completed;
    assignment.checkin_date = Some(Utc::now());
    assignment.checkin_notes = request.checkin_notes.filter(|notes| !notes.trim().is_empty());
    // Stored as submitted; conditions for tools outside this assignment are kept but unused.
    assignment.tool_conditions = request.tool_conditions.unwrap_or_default();
    tx.update_assignment(&assignment).await?;

    for line in tx.assignment_tools(id).await? {
        let condition = assignment.condition_of(line.tool_id);
        ledger::release(&mut *tx, id, line.tool_id, line.quantity, condition).await?;
    }

    projection::details(&mut *tx, assignment).await
}
