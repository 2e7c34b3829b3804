//! Store failures in the middle of a transaction must leave no trace

use async_trait::async_trait;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use toolroom_server::{
    error::{AppError, AppResult},
    models::{
        assignment::{Assignment, AssignmentQuery, AssignmentStatus, AssignmentTool, NewAssignment, ToolCondition},
        project::{Project, ProjectData},
        tool::{NewTool, Tool, ToolQuery, ToolStatus},
        worker::{Worker, WorkerData},
    },
    repository::{memory::MemoryStore, InventoryReader, InventoryStore, InventoryTx, Repository},
    services::Services,
};

use crate::common::{add_tool, checkin, checkout, fixture, tool};

const UNLIMITED: usize = usize::MAX;

/// In-memory store whose tool writes start failing once a budget runs out
#[derive(Clone)]
struct FailingStore {
    inner: MemoryStore,
    tool_writes_left: Arc<AtomicUsize>,
}

impl FailingStore {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            tool_writes_left: Arc::new(AtomicUsize::new(UNLIMITED)),
        }
    }

    /// Allow `writes` more tool updates, then fail every one after
    fn fail_after_tool_writes(&self, writes: usize) {
        self.tool_writes_left.store(writes, Ordering::SeqCst);
    }
}

#[async_trait]
impl InventoryStore for FailingStore {
    async fn reader(&self) -> AppResult<Box<dyn InventoryReader>> {
        self.inner.reader().await
    }

    async fn begin(&self) -> AppResult<Box<dyn InventoryTx>> {
        Ok(Box::new(FailingTx {
            inner: self.inner.begin().await?,
            tool_writes_left: self.tool_writes_left.clone(),
        }))
    }

    async fn ping(&self) -> AppResult<()> {
        self.inner.ping().await
    }
}

struct FailingTx {
    inner: Box<dyn InventoryTx>,
    tool_writes_left: Arc<AtomicUsize>,
}

#[async_trait]
impl InventoryReader for FailingTx {
    async fn tool(&mut self, id: i64) -> AppResult<Option<Tool>> {
        self.inner.tool(id).await
    }

    async fn tools(&mut self, query: &ToolQuery) -> AppResult<Vec<Tool>> {
        self.inner.tools(query).await
    }

    async fn worker(&mut self, id: i64) -> AppResult<Option<Worker>> {
        self.inner.worker(id).await
    }

    async fn worker_by_employee_id(&mut self, employee_id: &str) -> AppResult<Option<Worker>> {
        self.inner.worker_by_employee_id(employee_id).await
    }

    async fn workers(&mut self) -> AppResult<Vec<Worker>> {
        self.inner.workers().await
    }

    async fn project(&mut self, id: i64) -> AppResult<Option<Project>> {
        self.inner.project(id).await
    }

    async fn projects(&mut self) -> AppResult<Vec<Project>> {
        self.inner.projects().await
    }

    async fn assignment(&mut self, id: i64) -> AppResult<Option<Assignment>> {
        self.inner.assignment(id).await
    }

    async fn assignments(&mut self, query: &AssignmentQuery) -> AppResult<Vec<Assignment>> {
        self.inner.assignments(query).await
    }

    async fn assignment_tools(&mut self, assignment_id: i64) -> AppResult<Vec<AssignmentTool>> {
        self.inner.assignment_tools(assignment_id).await
    }

    async fn reserved_units(&mut self, tool_id: i64, excluding: Option<i64>) -> AppResult<i64> {
        self.inner.reserved_units(tool_id, excluding).await
    }

    async fn active_assignments_for_worker(&mut self, worker_id: i64) -> AppResult<i64> {
        self.inner.active_assignments_for_worker(worker_id).await
    }

    async fn active_assignments_for_project(&mut self, project_id: i64) -> AppResult<i64> {
        self.inner.active_assignments_for_project(project_id).await
    }
}

#[async_trait]
impl InventoryTx for FailingTx {
    async fn insert_tool(&mut self, tool: &NewTool) -> AppResult<Tool> {
        self.inner.insert_tool(tool).await
    }

    async fn update_tool(&mut self, tool: &Tool) -> AppResult<()> {
        let left = self.tool_writes_left.load(Ordering::SeqCst);
        if left == 0 {
            let io = std::io::Error::new(std::io::ErrorKind::Other, "disk I/O error");
            return Err(AppError::Database(sqlx::Error::Io(io)));
        }
        if left != UNLIMITED {
            self.tool_writes_left.store(left - 1, Ordering::SeqCst);
        }
        self.inner.update_tool(tool).await
    }

    async fn delete_tool(&mut self, id: i64) -> AppResult<bool> {
        self.inner.delete_tool(id).await
    }

    async fn insert_worker(&mut self, data: &WorkerData) -> AppResult<Worker> {
        self.inner.insert_worker(data).await
    }

    async fn update_worker(&mut self, worker: &Worker) -> AppResult<()> {
        self.inner.update_worker(worker).await
    }

    async fn delete_worker(&mut self, id: i64) -> AppResult<bool> {
        self.inner.delete_worker(id).await
    }

    async fn insert_project(&mut self, data: &ProjectData) -> AppResult<Project> {
        self.inner.insert_project(data).await
    }

    async fn update_project(&mut self, project: &Project) -> AppResult<()> {
        self.inner.update_project(project).await
    }

    async fn delete_project(&mut self, id: i64) -> AppResult<bool> {
        self.inner.delete_project(id).await
    }

    async fn insert_assignment(&mut self, data: &NewAssignment) -> AppResult<Assignment> {
        self.inner.insert_assignment(data).await
    }

    async fn update_assignment(&mut self, assignment: &Assignment) -> AppResult<()> {
        self.inner.update_assignment(assignment).await
    }

    async fn insert_assignment_tool(&mut self, line: &AssignmentTool) -> AppResult<()> {
        self.inner.insert_assignment_tool(line).await
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.inner.commit().await
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        self.inner.rollback().await
    }
}

#[tokio::test]
async fn test_failed_checkin_leaves_assignment_active() {
    let store = FailingStore::new();
    let services = Services::new(Repository::new(store.clone()));

    let f = fixture(&services, 3).await;
    let second = add_tool(&services, "Safety Harness", 2).await;
    let opened = services
        .assignments
        .checkout(checkout(f.worker_id, f.project_id, &[(f.tool_id, 2), (second.id, 2)]))
        .await
        .unwrap();

    let first_before = tool(&services, f.tool_id).await;
    let second_before = tool(&services, second.id).await;
    assert_eq!(first_before.quantity, 1);
    assert_eq!(second_before.quantity, 0);
    assert_eq!(second_before.status, ToolStatus::InUse);

    // The first tool is released, the second write fails
    store.fail_after_tool_writes(1);
    let err = services
        .assignments
        .checkin(
            opened.id,
            checkin(&[(f.tool_id, ToolCondition::Damaged), (second.id, ToolCondition::Good)]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Database(_)));

    let stored = services.assignments.get(opened.id).await.unwrap();
    assert_eq!(stored.status, AssignmentStatus::Active);
    assert!(stored.checkin_date.is_none());
    assert!(stored.checkin_notes.is_none());
    assert!(stored.tool_conditions.is_empty());
    assert_eq!(tool(&services, f.tool_id).await, first_before);
    assert_eq!(tool(&services, second.id).await, second_before);

    // Once the store recovers the same check-in goes through exactly once
    store.fail_after_tool_writes(UNLIMITED);
    let closed = services
        .assignments
        .checkin(
            opened.id,
            checkin(&[(f.tool_id, ToolCondition::Damaged), (second.id, ToolCondition::Good)]),
        )
        .await
        .unwrap();
    assert_eq!(closed.status, AssignmentStatus::Completed);
    let first_after = tool(&services, f.tool_id).await;
    assert_eq!(first_after.quantity, 3);
    assert_eq!(first_after.status, ToolStatus::Damaged);
    assert_eq!(tool(&services, second.id).await.quantity, 2);
}

#[tokio::test]
async fn test_failed_checkout_reserves_nothing() {
    let store = FailingStore::new();
    let services = Services::new(Repository::new(store.clone()));

    let f = fixture(&services, 3).await;
    let second = add_tool(&services, "Safety Harness", 2).await;

    store.fail_after_tool_writes(1);
    let err = services
        .assignments
        .checkout(checkout(f.worker_id, f.project_id, &[(f.tool_id, 1), (second.id, 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Database(_)));

    assert!(services.assignments.list(&AssignmentQuery::default()).await.unwrap().is_empty());
    let first = tool(&services, f.tool_id).await;
    assert_eq!(first.quantity, 3);
    assert_eq!(first.status, ToolStatus::Available);
    assert_eq!(tool(&services, second.id).await.quantity, 2);
}
