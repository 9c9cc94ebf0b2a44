use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use crate::error::RepositoryResult;
use crate::repository::{ActivityRepository, CustomerRepository};
use crate::types::{Activity, Customer, Project, Task};

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
}

pub fn customer(name: &str) -> Customer {
    Customer::new(name, fixed_now())
}

pub fn project(customer: Customer) -> Project {
    Project::new("Website", customer, fixed_now())
}

pub fn task(name: &str) -> Task {
    Task::new(name, fixed_now())
}

#[derive(Default)]
pub struct InMemoryCustomers {
    rows: Mutex<Vec<Customer>>,
}

impl InMemoryCustomers {
    pub fn with(rows: Vec<Customer>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }
}

#[async_trait]
impl CustomerRepository for InMemoryCustomers {
    async fn save(&self, customer: &Customer) -> RepositoryResult<()> {
        let mut rows = self.rows.lock().unwrap();
        rows.retain(|row| row.id != customer.id);
        rows.push(customer.clone());
        Ok(())
    }

    async fn find_one_by_id(&self, id: Uuid) -> RepositoryResult<Option<Customer>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|row| row.id == id).cloned())
    }

    async fn find_one_by_name(&self, name: &str) -> RepositoryResult<Option<Customer>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|row| row.name == name).cloned())
    }

    async fn find_all(&self) -> RepositoryResult<Vec<Customer>> {
        Ok(self.rows.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct InMemoryActivities {
    rows: Mutex<Vec<Activity>>,
}

impl InMemoryActivities {
    pub fn with(rows: Vec<Activity>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }
}

#[async_trait]
impl ActivityRepository for InMemoryActivities {
    async fn save(&self, activity: &Activity) -> RepositoryResult<()> {
        let mut rows = self.rows.lock().unwrap();
        rows.retain(|row| row.id != activity.id);
        rows.push(activity.clone());
        Ok(())
    }

    async fn remove(&self, activity: &Activity) -> RepositoryResult<()> {
        self.rows.lock().unwrap().retain(|row| row.id != activity.id);
        Ok(())
    }

    async fn find_one_by_id(&self, id: Uuid) -> RepositoryResult<Option<Activity>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|row| row.id == id).cloned())
    }

    async fn find_by_user_between(
        &self,
        user_id: Uuid,
        first_day: NaiveDate,
        last_day: NaiveDate,
    ) -> RepositoryResult<Vec<Activity>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|row| row.user_id == user_id && row.date >= first_day && row.date <= last_day)
            .cloned()
            .collect())
    }

    async fn sum_time_spent_by_day(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        excluding: Option<Uuid>,
    ) -> RepositoryResult<u32> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|row| row.user_id == user_id && row.date == date)
            .filter(|row| Some(row.id) != excluding)
            .map(|row| row.time)
            .sum())
    }
}
