use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use timetrack_core::repository::ActivityRepository;
use timetrack_core::{Activity, Customer, Project, RepositoryError, RepositoryResult, Task};

use crate::project::PROJECT_COLUMNS;
use crate::{backend, to_time};

/// Repository backed by the `activities` table.
#[derive(Clone)]
pub struct SqlActivityRepository {
    pool: SqlitePool,
}

impl SqlActivityRepository {
    pub(crate) fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Activity row joined with its project, customer and task.
#[derive(Debug, sqlx::FromRow)]
struct ActivityRow {
    id: Uuid,
    date: NaiveDate,
    time: i64,
    summary: Option<String>,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    project_id: Uuid,
    project_name: String,
    project_created_at: DateTime<Utc>,
    project_updated_at: DateTime<Utc>,
    customer_id: Uuid,
    customer_name: String,
    customer_created_at: DateTime<Utc>,
    customer_updated_at: DateTime<Utc>,
    task_id: Uuid,
    task_name: String,
    task_created_at: DateTime<Utc>,
    task_updated_at: DateTime<Utc>,
}

impl TryFrom<ActivityRow> for Activity {
    type Error = RepositoryError;

    fn try_from(row: ActivityRow) -> Result<Self, Self::Error> {
        Ok(Activity {
            id: row.id,
            date: row.date,
            time: to_time("activities.time", row.time)?,
            summary: row.summary,
            project: Project {
                id: row.project_id,
                name: row.project_name,
                customer: Customer {
                    id: row.customer_id,
                    name: row.customer_name,
                    created_at: row.customer_created_at,
                    updated_at: row.customer_updated_at,
                },
                created_at: row.project_created_at,
                updated_at: row.project_updated_at,
            },
            task: Task {
                id: row.task_id,
                name: row.task_name,
                created_at: row.task_created_at,
                updated_at: row.task_updated_at,
            },
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn select_activities(filter: &str) -> String {
    format!(
        "SELECT a.id, a.date, a.time, a.summary, a.user_id, a.created_at, a.updated_at, \
                {PROJECT_COLUMNS}, \
                t.id AS task_id, \
                t.name AS task_name, \
                t.created_at AS task_created_at, \
                t.updated_at AS task_updated_at \
         FROM activities AS a \
         INNER JOIN projects AS p ON p.id = a.project_id \
         INNER JOIN customers AS c ON c.id = p.customer_id \
         INNER JOIN tasks AS t ON t.id = a.task_id \
         {filter}"
    )
}

#[async_trait]
impl ActivityRepository for SqlActivityRepository {
    async fn save(&self, activity: &Activity) -> RepositoryResult<()> {
        sqlx::query(
            "INSERT INTO activities \
             (id, date, time, summary, project_id, task_id, user_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE \
             SET date = excluded.date, \
                 time = excluded.time, \
                 summary = excluded.summary, \
                 project_id = excluded.project_id, \
                 task_id = excluded.task_id, \
                 updated_at = excluded.updated_at",
        )
        .bind(activity.id)
        .bind(activity.date)
        .bind(i64::from(activity.time))
        .bind(&activity.summary)
        .bind(activity.project.id)
        .bind(activity.task.id)
        .bind(activity.user_id)
        .bind(activity.created_at)
        .bind(activity.updated_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }

    async fn remove(&self, activity: &Activity) -> RepositoryResult<()> {
        sqlx::query("DELETE FROM activities WHERE id = ?")
            .bind(activity.id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn find_one_by_id(&self, id: Uuid) -> RepositoryResult<Option<Activity>> {
        let row = sqlx::query_as::<_, ActivityRow>(&select_activities("WHERE a.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        row.map(Activity::try_from).transpose()
    }

    async fn find_by_user_between(
        &self,
        user_id: Uuid,
        first_day: NaiveDate,
        last_day: NaiveDate,
    ) -> RepositoryResult<Vec<Activity>> {
        let rows = sqlx::query_as::<_, ActivityRow>(&select_activities(
            "WHERE a.user_id = ? AND a.date >= ? AND a.date <= ? \
             ORDER BY a.date ASC, a.created_at ASC",
        ))
        .bind(user_id)
        .bind(first_day)
        .bind(last_day)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        rows.into_iter().map(Activity::try_from).collect()
    }

    async fn sum_time_spent_by_day(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        excluding: Option<Uuid>,
    ) -> RepositoryResult<u32> {
        let total: (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(time), 0) FROM activities \
             WHERE user_id = ?1 AND date = ?2 AND (?3 IS NULL OR id != ?3)",
        )
        .bind(user_id)
        .bind(date)
        .bind(excluding)
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;
        to_time("SUM(activities.time)", total.0)
    }
}
