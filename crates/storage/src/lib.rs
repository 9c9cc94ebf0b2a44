use std::{str::FromStr, time::Duration};

use sqlx::{
    migrate::MigrateError,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    SqlitePool,
};
use thiserror::Error;
use timetrack_core::RepositoryError;

mod activity;
mod customer;
mod project;
mod task;
mod user;

pub use activity::SqlActivityRepository;
pub use customer::SqlCustomerRepository;
pub use project::SqlProjectRepository;
pub use task::SqlTaskRepository;
pub use user::SqlUserRepository;

/// Top-level database handle that owns the SQLite connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Establishes a new SQLite connection pool for the provided connection string.
    ///
    /// The database file is created when missing. Every pooled connection runs
    /// with foreign keys enforced, WAL journaling and a 5s busy timeout.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(StorageError::Connect)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_millis(5000));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(StorageError::Connect)?;

        Ok(Self { pool })
    }

    /// Applies migrations located under `migrations/`.
    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(StorageError::Migration)?;
        tracing::info!(stage = "storage", "database migrations applied");
        Ok(())
    }

    /// Returns a handle to the customers table.
    pub fn customers(&self) -> SqlCustomerRepository {
        SqlCustomerRepository::new(self.pool.clone())
    }

    /// Returns a handle to the projects table.
    pub fn projects(&self) -> SqlProjectRepository {
        SqlProjectRepository::new(self.pool.clone())
    }

    /// Returns a handle to the tasks table.
    pub fn tasks(&self) -> SqlTaskRepository {
        SqlTaskRepository::new(self.pool.clone())
    }

    /// Returns a handle to the users table.
    pub fn users(&self) -> SqlUserRepository {
        SqlUserRepository::new(self.pool.clone())
    }

    /// Returns a handle to the activities table.
    pub fn activities(&self) -> SqlActivityRepository {
        SqlActivityRepository::new(self.pool.clone())
    }

    /// Round-trips a trivial statement to check the pool is usable.
    pub async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Exposes the inner pool when lower level access is required.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// General storage level errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to connect to sqlite: {0}")]
    Connect(sqlx::Error),
    #[error("failed to run database migrations: {0}")]
    Migration(MigrateError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

fn backend(err: sqlx::Error) -> RepositoryError {
    RepositoryError::backend(err)
}

/// Like [`backend`], but reports unique index violations as conflicts.
fn write_error(err: sqlx::Error) -> RepositoryError {
    if let Some(db) = err.as_database_error() {
        if db.is_unique_violation() {
            return RepositoryError::Conflict(db.message().to_string());
        }
    }
    RepositoryError::backend(err)
}

fn to_time(column: &str, value: i64) -> Result<u32, RepositoryError> {
    u32::try_from(value).map_err(|_| RepositoryError::Corrupt(format!("{column} = {value}")))
}
