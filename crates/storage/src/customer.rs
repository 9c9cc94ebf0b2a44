use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use timetrack_core::repository::CustomerRepository;
use timetrack_core::{Customer, RepositoryResult};

use crate::{backend, write_error};

/// Repository backed by the `customers` table.
#[derive(Clone)]
pub struct SqlCustomerRepository {
    pool: SqlitePool,
}

impl SqlCustomerRepository {
    pub(crate) fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_CUSTOMER: &str = "SELECT id, name, created_at, updated_at FROM customers";

#[async_trait]
impl CustomerRepository for SqlCustomerRepository {
    async fn save(&self, customer: &Customer) -> RepositoryResult<()> {
        sqlx::query(
            "INSERT INTO customers (id, name, created_at, updated_at) \
             VALUES (?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE \
             SET name = excluded.name, updated_at = excluded.updated_at",
        )
        .bind(customer.id)
        .bind(&customer.name)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(write_error)?;
        Ok(())
    }

    async fn find_one_by_id(&self, id: Uuid) -> RepositoryResult<Option<Customer>> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!("{SELECT_CUSTOMER} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        Ok(row.map(Customer::from))
    }

    async fn find_one_by_name(&self, name: &str) -> RepositoryResult<Option<Customer>> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!("{SELECT_CUSTOMER} WHERE name = ?"))
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        Ok(row.map(Customer::from))
    }

    async fn find_all(&self) -> RepositoryResult<Vec<Customer>> {
        let rows = sqlx::query_as::<_, CustomerRow>(&format!("{SELECT_CUSTOMER} ORDER BY name ASC"))
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        Ok(rows.into_iter().map(Customer::from).collect())
    }
}
