//! Worker management service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::worker::{Worker, WorkerData},
    repository::{finish, InventoryTx, Repository},
};

#[derive(Clone)]
pub struct WorkersService {
    repository: Repository,
}

impl WorkersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<Vec<Worker>> {
        self.repository.reader().await?.workers().await
    }

    pub async fn get(&self, id: i64) -> AppResult<Worker> {
        self.repository
            .reader()
            .await?
            .worker(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Worker {} not found", id)))
    }

    /// Create a worker; the employee ID must be unused
    pub async fn create(&self, data: WorkerData) -> AppResult<Worker> {
        data.validate()?;
        let mut tx = self.repository.begin().await?;
        let result = tx.insert_worker(&data).await;
        let worker = finish(tx, result).await?;

        tracing::info!(worker_id = worker.id, employee_id = %worker.employee_id, "Worker created");
        Ok(worker)
    }

    pub async fn update(&self, id: i64, data: WorkerData) -> AppResult<Worker> {
        data.validate()?;
        let mut tx = self.repository.begin().await?;
        let result = rename(tx.as_mut(), id, data).await;
        finish(tx, result).await
    }

    /// Delete a worker and their completed assignments.
    /// Refused while the worker still has tools checked out.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let mut tx = self.repository.begin().await?;
        let result = remove(tx.as_mut(), id).await;
        finish(tx, result).await?;

        tracing::info!(worker_id = id, "Worker deleted");
        Ok(())
    }
}

async fn rename(tx: &mut dyn InventoryTx, id: i64, data: WorkerData) -> AppResult<Worker> {
    let mut worker = tx
        .worker(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Worker {} not found", id)))?;
    worker.name = data.name;
    worker.employee_id = data.employee_id;
    tx.update_worker(&worker).await?;
    Ok(worker)
}

async fn remove(tx: &mut dyn InventoryTx, id: i64) -> AppResult<()> {
    if tx.worker(id).await?.is_none() {
        return Err(AppError::NotFound(format!("Worker {} not found", id)));
    }
    if tx.active_assignments_for_worker(id).await? > 0 {
        tracing::warn!(worker_id = id, "Delete refused: worker has active assignments");
        return Err(AppError::HasActiveAssignments(
            "Cannot delete worker with active assignments".to_string(),
        ));
    }
    tx.delete_worker(id).await?;
    Ok(())
}
