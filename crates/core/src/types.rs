use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Upper bound, in hundredths of a day, a user may log on a single day.
pub const MAXIMUM_TIME_SPENT_PER_DAY: u32 = 100;

/// A client the work is billed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn update_name(&mut self, name: impl Into<String>, now: DateTime<Utc>) {
        self.name = name.into();
        self.updated_at = now;
    }
}

/// A project carried out for a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub customer: Customer,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(name: impl Into<String>, customer: Customer, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            customer,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn update(&mut self, name: impl Into<String>, customer: Customer, now: DateTime<Utc>) {
        self.name = name.into();
        self.customer = customer;
        self.updated_at = now;
    }
}

/// A kind of work (development, meeting, support...) activities are tagged with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn update_name(&mut self, name: impl Into<String>, now: DateTime<Utc>) {
        self.name = name.into();
        self.updated_at = now;
    }
}

/// An account able to log activities and call the API.
///
/// `password_hash` holds a PHC string and `api_token` the bearer token the
/// client presents on every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub api_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        api_token: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            api_token: api_token.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn update(
        &mut self,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        now: DateTime<Utc>,
    ) {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self.email = email.into();
        self.updated_at = now;
    }

    pub fn update_password_hash(&mut self, password_hash: impl Into<String>, now: DateTime<Utc>) {
        self.password_hash = password_hash.into();
        self.updated_at = now;
    }
}

/// Time a user spent on a project task during one day.
///
/// `time` is expressed in hundredths of a day: `100` is a full day and `25`
/// a quarter of a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: Uuid,
    pub date: NaiveDate,
    pub time: u32,
    pub summary: Option<String>,
    pub project: Project,
    pub task: Task,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Activity {
    pub fn new(
        date: NaiveDate,
        time: u32,
        summary: Option<String>,
        project: Project,
        task: Task,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            time,
            summary,
            project,
            task,
            user_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn update(
        &mut self,
        date: NaiveDate,
        time: u32,
        summary: Option<String>,
        project: Project,
        task: Task,
        now: DateTime<Utc>,
    ) {
        self.date = date;
        self.time = time;
        self.summary = summary;
        self.project = project;
        self.task = task;
        self.updated_at = now;
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    /// Returns `true` when `time` is a loggable amount for a single activity.
    pub fn is_valid_time(time: u32) -> bool {
        (1..=MAXIMUM_TIME_SPENT_PER_DAY).contains(&time)
    }
}
