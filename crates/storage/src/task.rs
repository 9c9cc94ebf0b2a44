use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use timetrack_core::repository::TaskRepository;
use timetrack_core::{RepositoryResult, Task};

use crate::{backend, write_error};

/// Repository backed by the `tasks` table.
#[derive(Clone)]
pub struct SqlTaskRepository {
    pool: SqlitePool,
}

impl SqlTaskRepository {
    pub(crate) fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TaskRow {
    id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Task {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_TASK: &str = "SELECT id, name, created_at, updated_at FROM tasks";

#[async_trait]
impl TaskRepository for SqlTaskRepository {
    async fn save(&self, task: &Task) -> RepositoryResult<()> {
        sqlx::query(
            "INSERT INTO tasks (id, name, created_at, updated_at) \
             VALUES (?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE \
             SET name = excluded.name, updated_at = excluded.updated_at",
        )
        .bind(task.id)
        .bind(&task.name)
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&self.pool)
        .await
        .map_err(write_error)?;
        Ok(())
    }

    async fn find_one_by_id(&self, id: Uuid) -> RepositoryResult<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>(&format!("{SELECT_TASK} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        Ok(row.map(Task::from))
    }

    async fn find_one_by_name(&self, name: &str) -> RepositoryResult<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>(&format!("{SELECT_TASK} WHERE name = ?"))
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        Ok(row.map(Task::from))
    }

    async fn find_all(&self) -> RepositoryResult<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>(&format!("{SELECT_TASK} ORDER BY name ASC"))
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        Ok(rows.into_iter().map(Task::from).collect())
    }
}
