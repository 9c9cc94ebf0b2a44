//! In-memory repository fakes that journal every call, plus HTTP helpers.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use timetrack_core::repository::{
    ActivityRepository, CustomerRepository, PasswordEncoder, PasswordEncoderError,
    ProjectRepository, TaskRepository, UserRepository,
};
use timetrack_core::{Activity, Customer, Project, RepositoryResult, Task, User};
use timetrack_storage::Database;

use crate::application::{Clock, Repositories};
use crate::router::{app_router, AppState};
use crate::telemetry;

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
}

pub fn fixed_clock() -> Clock {
    Arc::new(fixed_now)
}

pub fn customer(name: &str) -> Customer {
    Customer::new(name, fixed_now())
}

pub fn project(name: &str, customer: Customer) -> Project {
    Project::new(name, customer, fixed_now())
}

pub fn task(name: &str) -> Task {
    Task::new(name, fixed_now())
}

pub fn user(email: &str) -> User {
    User::new(
        "Ada",
        "Lovelace",
        email,
        "hashed:secret",
        format!("token-{email}"),
        fixed_now(),
    )
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Ordered log of repository calls shared by every fake of a test.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    fn record(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Entries that wrote to storage.
    pub fn mutations(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.contains(".save") || entry.contains(".remove"))
            .collect()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.entries()
            .iter()
            .filter(|entry| entry.starts_with(prefix))
            .count()
    }
}

pub trait Keyed {
    fn key(&self) -> Uuid;
}

macro_rules! keyed {
    ($($ty:ty),*) => {
        $(impl Keyed for $ty {
            fn key(&self) -> Uuid {
                self.id
            }
        })*
    };
}

keyed!(Customer, Project, Task, User, Activity);

/// Vector-backed repository recording each call in a [`Journal`].
pub struct Fake<T> {
    rows: Mutex<Vec<T>>,
    journal: Journal,
}

impl<T: Clone + Keyed> Fake<T> {
    pub fn new(journal: &Journal) -> Arc<Self> {
        Self::with(journal, Vec::new())
    }

    pub fn with(journal: &Journal, rows: Vec<T>) -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(rows),
            journal: journal.clone(),
        })
    }

    pub fn rows(&self) -> Vec<T> {
        self.rows.lock().unwrap().clone()
    }

    fn upsert(&self, value: &T) {
        let mut rows = self.rows.lock().unwrap();
        rows.retain(|row| row.key() != value.key());
        rows.push(value.clone());
    }

    fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        self.rows.lock().unwrap().iter().find(|row| predicate(row)).cloned()
    }
}

#[async_trait]
impl CustomerRepository for Fake<Customer> {
    async fn save(&self, customer: &Customer) -> RepositoryResult<()> {
        self.journal.record(format!("customers.save:{}", customer.name));
        self.upsert(customer);
        Ok(())
    }

    async fn find_one_by_id(&self, id: Uuid) -> RepositoryResult<Option<Customer>> {
        self.journal.record("customers.find_one_by_id");
        Ok(self.find(|row| row.id == id))
    }

    async fn find_one_by_name(&self, name: &str) -> RepositoryResult<Option<Customer>> {
        self.journal.record(format!("customers.find_one_by_name:{name}"));
        Ok(self.find(|row| row.name == name))
    }

    async fn find_all(&self) -> RepositoryResult<Vec<Customer>> {
        self.journal.record("customers.find_all");
        let mut rows = self.rows();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }
}

#[async_trait]
impl ProjectRepository for Fake<Project> {
    async fn save(&self, project: &Project) -> RepositoryResult<()> {
        self.journal.record(format!("projects.save:{}", project.name));
        self.upsert(project);
        Ok(())
    }

    async fn find_one_by_id(&self, id: Uuid) -> RepositoryResult<Option<Project>> {
        self.journal.record("projects.find_one_by_id");
        Ok(self.find(|row| row.id == id))
    }

    async fn find_one_by_name(&self, name: &str) -> RepositoryResult<Option<Project>> {
        self.journal.record(format!("projects.find_one_by_name:{name}"));
        Ok(self.find(|row| row.name == name))
    }

    async fn find_all(&self, customer_id: Option<Uuid>) -> RepositoryResult<Vec<Project>> {
        self.journal.record("projects.find_all");
        let mut rows: Vec<_> = self
            .rows()
            .into_iter()
            .filter(|row| customer_id.map_or(true, |id| row.customer.id == id))
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }
}

#[async_trait]
impl TaskRepository for Fake<Task> {
    async fn save(&self, task: &Task) -> RepositoryResult<()> {
        self.journal.record(format!("tasks.save:{}", task.name));
        self.upsert(task);
        Ok(())
    }

    async fn find_one_by_id(&self, id: Uuid) -> RepositoryResult<Option<Task>> {
        self.journal.record("tasks.find_one_by_id");
        Ok(self.find(|row| row.id == id))
    }

    async fn find_one_by_name(&self, name: &str) -> RepositoryResult<Option<Task>> {
        self.journal.record(format!("tasks.find_one_by_name:{name}"));
        Ok(self.find(|row| row.name == name))
    }

    async fn find_all(&self) -> RepositoryResult<Vec<Task>> {
        self.journal.record("tasks.find_all");
        let mut rows = self.rows();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }
}

#[async_trait]
impl UserRepository for Fake<User> {
    async fn save(&self, user: &User) -> RepositoryResult<()> {
        self.journal.record(format!("users.save:{}", user.email));
        self.upsert(user);
        Ok(())
    }

    async fn find_one_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>> {
        self.journal.record("users.find_one_by_id");
        Ok(self.find(|row| row.id == id))
    }

    async fn find_one_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        self.journal.record(format!("users.find_one_by_email:{email}"));
        Ok(self.find(|row| row.email == email))
    }

    async fn find_one_by_api_token(&self, api_token: &str) -> RepositoryResult<Option<User>> {
        self.journal.record("users.find_one_by_api_token");
        Ok(self.find(|row| row.api_token == api_token))
    }

    async fn find_all(&self) -> RepositoryResult<Vec<User>> {
        self.journal.record("users.find_all");
        let mut rows = self.rows();
        rows.sort_by(|a, b| (&a.last_name, &a.first_name).cmp(&(&b.last_name, &b.first_name)));
        Ok(rows)
    }
}

#[async_trait]
impl ActivityRepository for Fake<Activity> {
    async fn save(&self, activity: &Activity) -> RepositoryResult<()> {
        self.journal.record(format!("activities.save:{}", activity.time));
        self.upsert(activity);
        Ok(())
    }

    async fn remove(&self, activity: &Activity) -> RepositoryResult<()> {
        self.journal.record("activities.remove");
        self.rows.lock().unwrap().retain(|row| row.id != activity.id);
        Ok(())
    }

    async fn find_one_by_id(&self, id: Uuid) -> RepositoryResult<Option<Activity>> {
        self.journal.record("activities.find_one_by_id");
        Ok(self.find(|row| row.id == id))
    }

    async fn find_by_user_between(
        &self,
        user_id: Uuid,
        first_day: NaiveDate,
        last_day: NaiveDate,
    ) -> RepositoryResult<Vec<Activity>> {
        self.journal.record("activities.find_by_user_between");
        let mut rows: Vec<_> = self
            .rows()
            .into_iter()
            .filter(|row| row.user_id == user_id && row.date >= first_day && row.date <= last_day)
            .collect();
        rows.sort_by_key(|row| row.date);
        Ok(rows)
    }

    async fn sum_time_spent_by_day(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        excluding: Option<Uuid>,
    ) -> RepositoryResult<u32> {
        self.journal.record("activities.sum_time_spent_by_day");
        Ok(self
            .rows()
            .iter()
            .filter(|row| row.user_id == user_id && row.date == date)
            .filter(|row| Some(row.id) != excluding)
            .map(|row| row.time)
            .sum())
    }
}

/// Fakes for every repository port sharing one journal.
pub struct FakeRepositories {
    pub journal: Journal,
    pub customers: Arc<Fake<Customer>>,
    pub projects: Arc<Fake<Project>>,
    pub tasks: Arc<Fake<Task>>,
    pub users: Arc<Fake<User>>,
    pub activities: Arc<Fake<Activity>>,
}

impl FakeRepositories {
    pub fn new() -> Self {
        let journal = Journal::default();
        Self {
            customers: Fake::new(&journal),
            projects: Fake::new(&journal),
            tasks: Fake::new(&journal),
            users: Fake::new(&journal),
            activities: Fake::new(&journal),
            journal,
        }
    }

    pub fn ports(&self) -> Repositories {
        Repositories {
            customers: self.customers.clone(),
            projects: self.projects.clone(),
            tasks: self.tasks.clone(),
            users: self.users.clone(),
            activities: self.activities.clone(),
        }
    }
}

/// Reversible "hash" keeping handler tests fast and deterministic.
pub struct PlainPasswordEncoder;

impl PasswordEncoder for PlainPasswordEncoder {
    fn hash(&self, plain: &str) -> Result<String, PasswordEncoderError> {
        Ok(format!("hashed:{plain}"))
    }

    fn verify(&self, plain: &str, hash: &str) -> Result<bool, PasswordEncoderError> {
        Ok(hash == format!("hashed:{plain}"))
    }
}

/// Application state over a throw-away SQLite file.
pub struct TestApp {
    pub state: AppState,
    pub database: Database,
    _dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let metrics = telemetry::init_metrics().expect("metrics init");
        let dir = tempfile::tempdir().expect("tempdir");
        let url = format!("sqlite://{}", dir.path().join("app.db").display());
        let database = Database::connect(&url).await.expect("connect");
        database.run_migrations().await.expect("migrations");
        let state = AppState::new(metrics, database.clone()).with_clock(fixed_clock());

        Self {
            state,
            database,
            _dir: dir,
        }
    }

    pub fn router(&self) -> Router {
        app_router(self.state.clone())
    }

    /// Stores a user whose bearer token is `token-<email>` and password `secret`.
    pub async fn seed_user(&self, email: &str) -> User {
        let mut user = user(email);
        user.password_hash = crate::auth::Argon2PasswordEncoder
            .hash("secret")
            .expect("hash password");
        self.database.users().save(&user).await.expect("seed user");
        user
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body should read")
            .to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }
}
