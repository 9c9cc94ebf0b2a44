//! Persistence ports implemented by the storage crate.
//!
//! `save` is an upsert keyed by the entity identifier. Finders return `None`
//! rather than an error when nothing matches.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::RepositoryResult;
use crate::types::{Activity, Customer, Project, Task, User};

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn save(&self, customer: &Customer) -> RepositoryResult<()>;
    async fn find_one_by_id(&self, id: Uuid) -> RepositoryResult<Option<Customer>>;
    async fn find_one_by_name(&self, name: &str) -> RepositoryResult<Option<Customer>>;
    /// Lists every customer ordered by name.
    async fn find_all(&self) -> RepositoryResult<Vec<Customer>>;
}

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn save(&self, project: &Project) -> RepositoryResult<()>;
    async fn find_one_by_id(&self, id: Uuid) -> RepositoryResult<Option<Project>>;
    async fn find_one_by_name(&self, name: &str) -> RepositoryResult<Option<Project>>;
    /// Lists projects ordered by name, restricted to one customer when given.
    async fn find_all(&self, customer_id: Option<Uuid>) -> RepositoryResult<Vec<Project>>;
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn save(&self, task: &Task) -> RepositoryResult<()>;
    async fn find_one_by_id(&self, id: Uuid) -> RepositoryResult<Option<Task>>;
    async fn find_one_by_name(&self, name: &str) -> RepositoryResult<Option<Task>>;
    async fn find_all(&self) -> RepositoryResult<Vec<Task>>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn save(&self, user: &User) -> RepositoryResult<()>;
    async fn find_one_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>>;
    async fn find_one_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;
    async fn find_one_by_api_token(&self, api_token: &str) -> RepositoryResult<Option<User>>;
    /// Lists users ordered by last name then first name.
    async fn find_all(&self) -> RepositoryResult<Vec<User>>;
}

#[async_trait]
pub trait ActivityRepository: Send + Sync {
    async fn save(&self, activity: &Activity) -> RepositoryResult<()>;
    async fn remove(&self, activity: &Activity) -> RepositoryResult<()>;
    async fn find_one_by_id(&self, id: Uuid) -> RepositoryResult<Option<Activity>>;
    /// Activities of `user_id` dated within `first_day..=last_day`, oldest first.
    async fn find_by_user_between(
        &self,
        user_id: Uuid,
        first_day: NaiveDate,
        last_day: NaiveDate,
    ) -> RepositoryResult<Vec<Activity>>;
    /// Sum of `time` logged by `user_id` on `date`, skipping the `excluding` activity.
    async fn sum_time_spent_by_day(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        excluding: Option<Uuid>,
    ) -> RepositoryResult<u32>;
}

/// One-way password hashing used for user credentials.
pub trait PasswordEncoder: Send + Sync {
    fn hash(&self, plain: &str) -> Result<String, PasswordEncoderError>;
    fn verify(&self, plain: &str, hash: &str) -> Result<bool, PasswordEncoderError>;
}

#[derive(Debug, thiserror::Error)]
#[error("password encoder failure: {0}")]
pub struct PasswordEncoderError(pub String);
