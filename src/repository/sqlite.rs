//! SQLite-backed inventory store

use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    types::Json,
    Pool, QueryBuilder, Sqlite, SqliteConnection, Transaction,
};
use std::{str::FromStr, sync::Arc, time::Duration};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{InventoryReader, InventoryStore, InventoryTx};
use crate::{
    config::DatabaseConfig,
    error::{AppError, AppResult},
    models::{
        assignment::{
            Assignment, AssignmentQuery, AssignmentRow, AssignmentTool, AssignmentToolRow,
            NewAssignment,
        },
        project::{Project, ProjectData},
        tool::{NewTool, Tool, ToolQuery, ToolRow},
        worker::{Worker, WorkerData},
    },
};

/// Inventory store on a single SQLite database file
#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
    /// Held for the whole life of a write transaction
    writer: Arc<Mutex<()>>,
    max_busy_retries: u32,
}

impl SqliteStore {
    pub fn new(pool: Pool<Sqlite>, max_busy_retries: u32) -> Self {
        Self {
            pool,
            writer: Arc::new(Mutex::new(())),
            max_busy_retries,
        }
    }

    /// Open (creating if needed) the database file and bring its schema up to date
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms));

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self::new(pool, config.max_busy_retries))
    }

    /// Start a transaction, retrying a bounded number of times while the
    /// database file is locked by someone else
    async fn begin_with_retry(&self) -> AppResult<Transaction<'static, Sqlite>> {
        let mut attempt = 0;
        loop {
            match self.pool.begin().await {
                Ok(tx) => return Ok(tx),
                Err(e) if is_busy(&e) && attempt < self.max_busy_retries => {
                    attempt += 1;
                    tracing::warn!(attempt, "Database busy, retrying transaction start");
                    tokio::time::sleep(Duration::from_millis(50 * u64::from(attempt))).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// SQLITE_BUSY / SQLITE_LOCKED, including their extended codes
fn is_busy(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => db
            .code()
            .and_then(|code| code.parse::<i32>().ok())
            .map_or(false, |code| matches!(code & 0xff, 5 | 6)),
        sqlx::Error::PoolTimedOut => true,
        _ => false,
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl InventoryStore for SqliteStore {
    async fn reader(&self) -> AppResult<Box<dyn InventoryReader>> {
        // A deferred transaction that is never committed: a stable snapshot
        // under WAL that does not block writers.
        let tx = self.begin_with_retry().await?;
        Ok(Box::new(SqliteReader { tx }))
    }

    async fn begin(&self) -> AppResult<Box<dyn InventoryTx>> {
        let writer = self.writer.clone().lock_owned().await;
        let tx = self.begin_with_retry().await?;
        Ok(Box::new(SqliteTx { tx, _writer: writer }))
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

pub struct SqliteReader {
    tx: Transaction<'static, Sqlite>,
}

pub struct SqliteTx {
    tx: Transaction<'static, Sqlite>,
    _writer: OwnedMutexGuard<()>,
}

macro_rules! impl_reader {
    ($ty:ty) => {
        #[async_trait]
        impl InventoryReader for $ty {
            async fn tool(&mut self, id: i64) -> AppResult<Option<Tool>> {
                fetch_tool(&mut self.tx, id).await
            }

            async fn tools(&mut self, query: &ToolQuery) -> AppResult<Vec<Tool>> {
                fetch_tools(&mut self.tx, query).await
            }

            async fn worker(&mut self, id: i64) -> AppResult<Option<Worker>> {
                Ok(sqlx::query_as::<_, Worker>(
                    "SELECT id, name, employee_id FROM workers WHERE id = ?",
                )
                .bind(id)
                .fetch_optional(&mut *self.tx)
                .await?)
            }

            async fn worker_by_employee_id(&mut self, employee_id: &str) -> AppResult<Option<Worker>> {
                Ok(sqlx::query_as::<_, Worker>(
                    "SELECT id, name, employee_id FROM workers WHERE employee_id = ?",
                )
                .bind(employee_id)
                .fetch_optional(&mut *self.tx)
                .await?)
            }

            async fn workers(&mut self) -> AppResult<Vec<Worker>> {
                Ok(sqlx::query_as::<_, Worker>(
                    "SELECT id, name, employee_id FROM workers ORDER BY name, id",
                )
                .fetch_all(&mut *self.tx)
                .await?)
            }

            async fn project(&mut self, id: i64) -> AppResult<Option<Project>> {
                Ok(sqlx::query_as::<_, Project>("SELECT id, name FROM projects WHERE id = ?")
                    .bind(id)
                    .fetch_optional(&mut *self.tx)
                    .await?)
            }

            async fn projects(&mut self) -> AppResult<Vec<Project>> {
                Ok(sqlx::query_as::<_, Project>("SELECT id, name FROM projects ORDER BY name, id")
                    .fetch_all(&mut *self.tx)
                    .await?)
            }

            async fn assignment(&mut self, id: i64) -> AppResult<Option<Assignment>> {
                fetch_assignment(&mut self.tx, id).await
            }

            async fn assignments(&mut self, query: &AssignmentQuery) -> AppResult<Vec<Assignment>> {
                fetch_assignments(&mut self.tx, query).await
            }

            async fn assignment_tools(&mut self, assignment_id: i64) -> AppResult<Vec<AssignmentTool>> {
                let rows = sqlx::query_as::<_, AssignmentToolRow>(
                    "SELECT assignment_id, tool_id, quantity FROM assignment_tools WHERE assignment_id = ? ORDER BY id",
                )
                .bind(assignment_id)
                .fetch_all(&mut *self.tx)
                .await?;
                Ok(rows.into_iter().map(AssignmentTool::from).collect())
            }

            async fn reserved_units(&mut self, tool_id: i64, excluding: Option<i64>) -> AppResult<i64> {
                let units: i64 = sqlx::query_scalar(
                    r#"
                    SELECT COALESCE(SUM(COALESCE(at.quantity, 1)), 0)
                    FROM assignment_tools at
                    JOIN assignments a ON at.assignment_id = a.id
                    WHERE at.tool_id = ? AND a.status = 'active'
                      AND (? IS NULL OR a.id != ?)
                    "#,
                )
                .bind(tool_id)
                .bind(excluding)
                .bind(excluding)
                .fetch_one(&mut *self.tx)
                .await?;
                Ok(units)
            }

            async fn active_assignments_for_worker(&mut self, worker_id: i64) -> AppResult<i64> {
                let count: i64 = sqlx::query_scalar(
                    "SELECT COUNT(*) FROM assignments WHERE worker_id = ? AND status = 'active'",
                )
                .bind(worker_id)
                .fetch_one(&mut *self.tx)
                .await?;
                Ok(count)
            }

            async fn active_assignments_for_project(&mut self, project_id: i64) -> AppResult<i64> {
                let count: i64 = sqlx::query_scalar(
                    "SELECT COUNT(*) FROM assignments WHERE project_id = ? AND status = 'active'",
                )
                .bind(project_id)
                .fetch_one(&mut *self.tx)
                .await?;
                Ok(count)
            }
        }
    };
}

impl_reader!(SqliteReader);
impl_reader!(SqliteTx);

async fn fetch_tool(conn: &mut SqliteConnection, id: i64) -> AppResult<Option<Tool>> {
    sqlx::query_as::<_, ToolRow>("SELECT * FROM tools WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await?
        .map(Tool::try_from)
        .transpose()
}

async fn fetch_tools(conn: &mut SqliteConnection, query: &ToolQuery) -> AppResult<Vec<Tool>> {
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM tools WHERE 1 = 1");
    if let Some(ref category) = query.category {
        builder.push(" AND category = ").push_bind(category.clone());
    }
    if let Some(status) = query.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    builder.push(" ORDER BY name, id");

    builder
        .build_query_as::<ToolRow>()
        .fetch_all(conn)
        .await?
        .into_iter()
        .map(Tool::try_from)
        .collect()
}

async fn fetch_assignment(conn: &mut SqliteConnection, id: i64) -> AppResult<Option<Assignment>> {
    sqlx::query_as::<_, AssignmentRow>("SELECT * FROM assignments WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await?
        .map(Assignment::try_from)
        .transpose()
}

async fn fetch_assignments(
    conn: &mut SqliteConnection,
    query: &AssignmentQuery,
) -> AppResult<Vec<Assignment>> {
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM assignments WHERE 1 = 1");
    if let Some(status) = query.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(worker_id) = query.worker_id {
        builder.push(" AND worker_id = ").push_bind(worker_id);
    }
    if let Some(project_id) = query.project_id {
        builder.push(" AND project_id = ").push_bind(project_id);
    }
    builder.push(" ORDER BY checkout_date DESC, id DESC");

    builder
        .build_query_as::<AssignmentRow>()
        .fetch_all(conn)
        .await?
        .into_iter()
        .map(Assignment::try_from)
        .collect()
}

#[async_trait]
impl InventoryTx for SqliteTx {
    async fn insert_tool(&mut self, tool: &NewTool) -> AppResult<Tool> {
        let row = sqlx::query_as::<_, ToolRow>(
            r#"
            INSERT INTO tools (name, category, status, is_calibrable, calibration_due,
                               certificate_number, quantity, image, custom_attributes)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&tool.name)
        .bind(&tool.category)
        .bind(tool.status.as_str())
        .bind(tool.is_calibrable)
        .bind(tool.calibration_due)
        .bind(&tool.certificate_number)
        .bind(tool.quantity)
        .bind(&tool.image)
        .bind(Json(&tool.custom_attributes))
        .fetch_one(&mut *self.tx)
        .await?;
        Tool::try_from(row)
    }

    async fn update_tool(&mut self, tool: &Tool) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE tools
            SET name = ?, category = ?, status = ?, is_calibrable = ?, calibration_due = ?,
                certificate_number = ?, quantity = ?, image = ?, custom_attributes = ?,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
        )
        .bind(&tool.name)
        .bind(&tool.category)
        .bind(tool.status.as_str())
        .bind(tool.is_calibrable)
        .bind(tool.calibration_due)
        .bind(&tool.certificate_number)
        .bind(tool.quantity)
        .bind(&tool.image)
        .bind(Json(&tool.custom_attributes))
        .bind(tool.id)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Tool {} not found", tool.id)));
        }
        Ok(())
    }

    async fn delete_tool(&mut self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM tools WHERE id = ?")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_worker(&mut self, data: &WorkerData) -> AppResult<Worker> {
        sqlx::query_as::<_, Worker>(
            "INSERT INTO workers (name, employee_id) VALUES (?, ?) RETURNING id, name, employee_id",
        )
        .bind(&data.name)
        .bind(&data.employee_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Employee ID already exists".to_string())
            } else {
                e.into()
            }
        })
    }

    async fn update_worker(&mut self, worker: &Worker) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE workers SET name = ?, employee_id = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        )
        .bind(&worker.name)
        .bind(&worker.employee_id)
        .bind(worker.id)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Employee ID already exists".to_string())
            } else {
                AppError::from(e)
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Worker {} not found", worker.id)));
        }
        Ok(())
    }

    async fn delete_worker(&mut self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM workers WHERE id = ?")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_project(&mut self, data: &ProjectData) -> AppResult<Project> {
        Ok(sqlx::query_as::<_, Project>(
            "INSERT INTO projects (name) VALUES (?) RETURNING id, name",
        )
        .bind(&data.name)
        .fetch_one(&mut *self.tx)
        .await?)
    }

    async fn update_project(&mut self, project: &Project) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE projects SET name = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        )
        .bind(&project.name)
        .bind(project.id)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Project {} not found", project.id)));
        }
        Ok(())
    }

    async fn delete_project(&mut self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_assignment(&mut self, data: &NewAssignment) -> AppResult<Assignment> {
        let row = sqlx::query_as::<_, AssignmentRow>(
            r#"
            INSERT INTO assignments (checkout_date, worker_id, project_id, status)
            VALUES (?, ?, ?, 'active')
            RETURNING *
            "#,
        )
        .bind(data.checkout_date)
        .bind(data.worker_id)
        .bind(data.project_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Assignment::try_from(row)
    }

    async fn update_assignment(&mut self, assignment: &Assignment) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE assignments
            SET checkin_date = ?, status = ?, checkin_notes = ?, tool_conditions = ?,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
        )
        .bind(assignment.checkin_date)
        .bind(assignment.status.as_str())
        .bind(&assignment.checkin_notes)
        .bind(Json(&assignment.tool_conditions))
        .bind(assignment.id)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Assignment {} not found", assignment.id)));
        }
        Ok(())
    }

    async fn insert_assignment_tool(&mut self, line: &AssignmentTool) -> AppResult<()> {
        sqlx::query("INSERT INTO assignment_tools (assignment_id, tool_id, quantity) VALUES (?, ?, ?)")
            .bind(line.assignment_id)
            .bind(line.tool_id)
            .bind(line.quantity)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
