use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use timetrack_core::repository::ProjectRepository;
use timetrack_core::{Customer, Project, RepositoryResult};

use crate::{backend, write_error};

/// Repository backed by the `projects` table, joined with the owning customer.
#[derive(Clone)]
pub struct SqlProjectRepository {
    pool: SqlitePool,
}

impl SqlProjectRepository {
    pub(crate) fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Project row joined with its customer.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProjectRow {
    pub project_id: Uuid,
    pub project_name: String,
    pub project_created_at: DateTime<Utc>,
    pub project_updated_at: DateTime<Utc>,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub customer_created_at: DateTime<Utc>,
    pub customer_updated_at: DateTime<Utc>,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Project {
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
        }
    }
}

/// Column list shared with the activity queries, which join the same tables.
pub(crate) const PROJECT_COLUMNS: &str = "p.id AS project_id, \
     p.name AS project_name, \
     p.created_at AS project_created_at, \
     p.updated_at AS project_updated_at, \
     c.id AS customer_id, \
     c.name AS customer_name, \
     c.created_at AS customer_created_at, \
     c.updated_at AS customer_updated_at";

fn select_projects(filter: &str) -> String {
    format!(
        "SELECT {PROJECT_COLUMNS} \
         FROM projects AS p \
         INNER JOIN customers AS c ON c.id = p.customer_id \
         {filter}"
    )
}

#[async_trait]
impl ProjectRepository for SqlProjectRepository {
    async fn save(&self, project: &Project) -> RepositoryResult<()> {
        sqlx::query(
            "INSERT INTO projects (id, name, customer_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE \
             SET name = excluded.name, \
                 customer_id = excluded.customer_id, \
                 updated_at = excluded.updated_at",
        )
        .bind(project.id)
        .bind(&project.name)
        .bind(project.customer.id)
        .bind(project.created_at)
        .bind(project.updated_at)
        .execute(&self.pool)
        .await
        .map_err(write_error)?;
        Ok(())
    }

    async fn find_one_by_id(&self, id: Uuid) -> RepositoryResult<Option<Project>> {
        let row = sqlx::query_as::<_, ProjectRow>(&select_projects("WHERE p.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        Ok(row.map(Project::from))
    }

    async fn find_one_by_name(&self, name: &str) -> RepositoryResult<Option<Project>> {
        let row = sqlx::query_as::<_, ProjectRow>(&select_projects("WHERE p.name = ?"))
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        Ok(row.map(Project::from))
    }

    async fn find_all(&self, customer_id: Option<Uuid>) -> RepositoryResult<Vec<Project>> {
        let rows = sqlx::query_as::<_, ProjectRow>(&select_projects(
            "WHERE (?1 IS NULL OR p.customer_id = ?1) ORDER BY p.name ASC",
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        Ok(rows.into_iter().map(Project::from).collect())
    }
}
