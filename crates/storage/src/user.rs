use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use timetrack_core::repository::UserRepository;
use timetrack_core::{RepositoryResult, User};

use crate::{backend, write_error};

/// Repository backed by the `users` table.
#[derive(Clone)]
pub struct SqlUserRepository {
    pool: SqlitePool,
}

impl SqlUserRepository {
    pub(crate) fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn find_one_where(&self, column: &str, value: &str) -> RepositoryResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE {column} = ?"))
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        Ok(row.map(User::from))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    password_hash: String,
    api_token: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            password_hash: row.password_hash,
            api_token: row.api_token,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_USER: &str = "SELECT id, first_name, last_name, email, password_hash, api_token, \
     created_at, updated_at FROM users";

#[async_trait]
impl UserRepository for SqlUserRepository {
    async fn save(&self, user: &User) -> RepositoryResult<()> {
        sqlx::query(
            "INSERT INTO users \
             (id, first_name, last_name, email, password_hash, api_token, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE \
             SET first_name = excluded.first_name, \
                 last_name = excluded.last_name, \
                 email = excluded.email, \
                 password_hash = excluded.password_hash, \
                 api_token = excluded.api_token, \
                 updated_at = excluded.updated_at",
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.api_token)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(write_error)?;
        Ok(())
    }

    async fn find_one_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        Ok(row.map(User::from))
    }

    async fn find_one_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        self.find_one_where("email", email).await
    }

    async fn find_one_by_api_token(&self, api_token: &str) -> RepositoryResult<Option<User>> {
        self.find_one_where("api_token", api_token).await
    }

    async fn find_all(&self) -> RepositoryResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "{SELECT_USER} ORDER BY last_name ASC, first_name ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        Ok(rows.into_iter().map(User::from).collect())
    }
}
