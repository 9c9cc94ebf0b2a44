//! Business rules checked by command handlers before any mutation.

use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::RepositoryResult;
use crate::repository::{
    ActivityRepository, CustomerRepository, ProjectRepository, TaskRepository, UserRepository,
};
use crate::types::MAXIMUM_TIME_SPENT_PER_DAY;

/// A customer with exactly this name already exists.
#[derive(Clone)]
pub struct IsCustomerAlreadyExist {
    repository: Arc<dyn CustomerRepository>,
}

impl IsCustomerAlreadyExist {
    pub fn new(repository: Arc<dyn CustomerRepository>) -> Self {
        Self { repository }
    }

    pub async fn is_satisfied_by(&self, name: &str) -> RepositoryResult<bool> {
        Ok(self.repository.find_one_by_name(name).await?.is_some())
    }
}

/// A project with exactly this name already exists.
#[derive(Clone)]
pub struct IsProjectAlreadyExist {
    repository: Arc<dyn ProjectRepository>,
}

impl IsProjectAlreadyExist {
    pub fn new(repository: Arc<dyn ProjectRepository>) -> Self {
        Self { repository }
    }

    pub async fn is_satisfied_by(&self, name: &str) -> RepositoryResult<bool> {
        Ok(self.repository.find_one_by_name(name).await?.is_some())
    }
}

#[derive(Clone)]
pub struct IsTaskAlreadyExist {
    repository: Arc<dyn TaskRepository>,
}

impl IsTaskAlreadyExist {
    pub fn new(repository: Arc<dyn TaskRepository>) -> Self {
        Self { repository }
    }

    pub async fn is_satisfied_by(&self, name: &str) -> RepositoryResult<bool> {
        Ok(self.repository.find_one_by_name(name).await?.is_some())
    }
}

#[derive(Clone)]
pub struct IsEmailAlreadyExist {
    repository: Arc<dyn UserRepository>,
}

impl IsEmailAlreadyExist {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    pub async fn is_satisfied_by(&self, email: &str) -> RepositoryResult<bool> {
        Ok(self.repository.find_one_by_email(email).await?.is_some())
    }
}

/// Logging `time` more on `date` would exceed [`MAXIMUM_TIME_SPENT_PER_DAY`].
///
/// `excluding` names an activity being edited whose current time must not be
/// counted twice.
#[derive(Clone)]
pub struct IsMaximumTimeSpentReached {
    repository: Arc<dyn ActivityRepository>,
}

impl IsMaximumTimeSpentReached {
    pub fn new(repository: Arc<dyn ActivityRepository>) -> Self {
        Self { repository }
    }

    pub async fn is_satisfied_by(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        time: u32,
        excluding: Option<Uuid>,
    ) -> RepositoryResult<bool> {
        let spent = self
            .repository
            .sum_time_spent_by_day(user_id, date, excluding)
            .await?;
        Ok(spent.saturating_add(time) > MAXIMUM_TIME_SPENT_PER_DAY)
    }
}
