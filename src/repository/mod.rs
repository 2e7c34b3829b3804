//! Repository layer: the inventory store
//!
//! Every mutation runs inside an [`InventoryTx`] which is applied completely
//! on [`InventoryTx::commit`] or not at all. Reads go through an
//! [`InventoryReader`], a consistent view of the store at the time it was
//! opened.

pub mod memory;
pub mod seed;
pub mod sqlite;

use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{
        assignment::{Assignment, AssignmentQuery, AssignmentTool, NewAssignment},
        project::{Project, ProjectData},
        tool::{NewTool, Tool, ToolQuery},
        worker::{Worker, WorkerData},
    },
};

/// Read access to tools, workers, projects and assignments
#[async_trait]
pub trait InventoryReader: Send {
    async fn tool(&mut self, id: i64) -> AppResult<Option<Tool>>;

    /// Tools matching `query`, sorted by name
    async fn tools(&mut self, query: &ToolQuery) -> AppResult<Vec<Tool>>;

    async fn worker(&mut self, id: i64) -> AppResult<Option<Worker>>;

    async fn worker_by_employee_id(&mut self, employee_id: &str) -> AppResult<Option<Worker>>;

    /// All workers, sorted by name
    async fn workers(&mut self) -> AppResult<Vec<Worker>>;

    async fn project(&mut self, id: i64) -> AppResult<Option<Project>>;

    /// All projects, sorted by name
    async fn projects(&mut self) -> AppResult<Vec<Project>>;

    async fn assignment(&mut self, id: i64) -> AppResult<Option<Assignment>>;

    /// Assignments matching `query`, most recent checkout first
    async fn assignments(&mut self, query: &AssignmentQuery) -> AppResult<Vec<Assignment>>;

    async fn assignment_tools(&mut self, assignment_id: i64) -> AppResult<Vec<AssignmentTool>>;

    /// Units of `tool_id` held by active assignments, leaving out `excluding`
    async fn reserved_units(&mut self, tool_id: i64, excluding: Option<i64>) -> AppResult<i64>;

    async fn active_assignments_for_worker(&mut self, worker_id: i64) -> AppResult<i64>;

    async fn active_assignments_for_project(&mut self, project_id: i64) -> AppResult<i64>;
}

/// A write transaction. Dropping it without committing discards its effects.
#[async_trait]
pub trait InventoryTx: InventoryReader {
    async fn insert_tool(&mut self, tool: &NewTool) -> AppResult<Tool>;

    /// Overwrite a tool row; fails with `NotFound` if it does not exist
    async fn update_tool(&mut self, tool: &Tool) -> AppResult<()>;

    /// Delete a tool and its assignment lines; false when it did not exist
    async fn delete_tool(&mut self, id: i64) -> AppResult<bool>;

    /// Fails with `Conflict` on a duplicate employee id
    async fn insert_worker(&mut self, data: &WorkerData) -> AppResult<Worker>;

    async fn update_worker(&mut self, worker: &Worker) -> AppResult<()>;

    /// Delete a worker along with their assignment history
    async fn delete_worker(&mut self, id: i64) -> AppResult<bool>;

    async fn insert_project(&mut self, data: &ProjectData) -> AppResult<Project>;

    async fn update_project(&mut self, project: &Project) -> AppResult<()>;

    /// Delete a project along with its assignment history
    async fn delete_project(&mut self, id: i64) -> AppResult<bool>;

    /// Open an active assignment with no tools and no conditions
    async fn insert_assignment(&mut self, data: &NewAssignment) -> AppResult<Assignment>;

    async fn update_assignment(&mut self, assignment: &Assignment) -> AppResult<()>;

    async fn insert_assignment_tool(&mut self, line: &AssignmentTool) -> AppResult<()>;

    async fn commit(self: Box<Self>) -> AppResult<()>;

    async fn rollback(self: Box<Self>) -> AppResult<()>;
}

/// Backing store for the inventory
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Open a consistent read view
    async fn reader(&self) -> AppResult<Box<dyn InventoryReader>>;

    /// Start a write transaction. Write transactions never interleave.
    async fn begin(&self) -> AppResult<Box<dyn InventoryTx>>;

    /// Check that the store answers
    async fn ping(&self) -> AppResult<()>;
}

/// Shared handle on the inventory store
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn InventoryStore>,
}

impl Repository {
    /// Create a new repository on top of the given store
    pub fn new(store: impl InventoryStore + 'static) -> Self {
        Self { store: Arc::new(store) }
    }

    /// Repository backed by an in-process store
    pub fn in_memory() -> Self {
        Self::new(memory::MemoryStore::new())
    }

    pub async fn reader(&self) -> AppResult<Box<dyn InventoryReader>> {
        self.store.reader().await
    }

    pub async fn begin(&self) -> AppResult<Box<dyn InventoryTx>> {
        self.store.begin().await
    }

    pub async fn ping(&self) -> AppResult<()> {
        self.store.ping().await
    }
}

/// Commit `tx` if `result` is a success, roll it back otherwise.
///
/// The original error is returned even when the rollback itself fails.
pub async fn finish<T>(tx: Box<dyn InventoryTx>, result: AppResult<T>) -> AppResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!("Rollback failed: {}", rollback_err);
            }
            Err(e)
        }
    }
}
