//! Command and query handlers.
//!
//! Each resource module owns its messages, views and handlers. Handlers only
//! talk to the repository ports and specifications from `timetrack-core`, so
//! they are exercised in tests against in-memory fakes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::Mutex;

use timetrack_core::repository::{
    ActivityRepository, CustomerRepository, PasswordEncoder, PasswordEncoderError,
    ProjectRepository, TaskRepository, UserRepository,
};
use timetrack_core::specification::{
    IsCustomerAlreadyExist, IsEmailAlreadyExist, IsMaximumTimeSpentReached, IsProjectAlreadyExist,
    IsTaskAlreadyExist,
};
use timetrack_core::{DomainError, RepositoryError};
use timetrack_storage::Database;

use crate::bus::{CommandBus, QueryBus};

pub mod activity;
pub mod customer;
pub mod project;
pub mod task;
pub mod user;

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Serializes the daily time check with the activity write that follows it.
pub type ActivityWriteLock = Arc<Mutex<()>>;

/// Failure of a command or query handler.
#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Password(#[from] PasswordEncoderError),
    #[error("no handler registered for {0}")]
    UnregisteredHandler(&'static str),
}

/// Maps a unique index conflict raised by a save to `domain`.
///
/// The specification check runs before the save, so a conflict here means a
/// concurrent writer claimed the same key in between.
pub(crate) fn on_conflict(
    domain: DomainError,
) -> impl FnOnce(RepositoryError) -> ApplicationError {
    move |err| match err {
        RepositoryError::Conflict(_) => ApplicationError::Domain(domain),
        other => ApplicationError::Repository(other),
    }
}

/// Repository ports shared by every handler.
#[derive(Clone)]
pub struct Repositories {
    pub customers: Arc<dyn CustomerRepository>,
    pub projects: Arc<dyn ProjectRepository>,
    pub tasks: Arc<dyn TaskRepository>,
    pub users: Arc<dyn UserRepository>,
    pub activities: Arc<dyn ActivityRepository>,
}

impl Repositories {
    pub fn from_database(database: &Database) -> Self {
        Self {
            customers: Arc::new(database.customers()),
            projects: Arc::new(database.projects()),
            tasks: Arc::new(database.tasks()),
            users: Arc::new(database.users()),
            activities: Arc::new(database.activities()),
        }
    }
}

/// Wires every command handler onto a bus.
pub fn command_bus(
    repositories: &Repositories,
    password_encoder: Arc<dyn PasswordEncoder>,
    clock: Clock,
) -> CommandBus {
    use activity::{
        AddActivityCommand, AddActivityCommandHandler, DeleteActivityCommand,
        DeleteActivityCommandHandler, UpdateActivityCommand, UpdateActivityCommandHandler,
    };
    use customer::{
        CreateCustomerCommand, CreateCustomerCommandHandler, UpdateCustomerCommand,
        UpdateCustomerCommandHandler,
    };
    use project::{
        CreateProjectCommand, CreateProjectCommandHandler, UpdateProjectCommand,
        UpdateProjectCommandHandler,
    };
    use task::{
        CreateTaskCommand, CreateTaskCommandHandler, UpdateTaskCommand, UpdateTaskCommandHandler,
    };
    use user::{
        CreateUserCommand, CreateUserCommandHandler, UpdateProfileCommand,
        UpdateProfileCommandHandler,
    };

    let is_customer_already_exist = IsCustomerAlreadyExist::new(repositories.customers.clone());
    let is_project_already_exist = IsProjectAlreadyExist::new(repositories.projects.clone());
    let is_task_already_exist = IsTaskAlreadyExist::new(repositories.tasks.clone());
    let is_email_already_exist = IsEmailAlreadyExist::new(repositories.users.clone());
    let is_maximum_time_spent_reached =
        IsMaximumTimeSpentReached::new(repositories.activities.clone());
    let activity_write_lock = ActivityWriteLock::default();

    CommandBus::builder()
        .register::<CreateCustomerCommand, _>(CreateCustomerCommandHandler::new(
            repositories.customers.clone(),
            is_customer_already_exist.clone(),
            clock.clone(),
        ))
        .register::<UpdateCustomerCommand, _>(UpdateCustomerCommandHandler::new(
            repositories.customers.clone(),
            is_customer_already_exist,
            clock.clone(),
        ))
        .register::<CreateProjectCommand, _>(CreateProjectCommandHandler::new(
            repositories.projects.clone(),
            repositories.customers.clone(),
            is_project_already_exist.clone(),
            clock.clone(),
        ))
        .register::<UpdateProjectCommand, _>(UpdateProjectCommandHandler::new(
            repositories.projects.clone(),
            repositories.customers.clone(),
            is_project_already_exist,
            clock.clone(),
        ))
        .register::<CreateTaskCommand, _>(CreateTaskCommandHandler::new(
            repositories.tasks.clone(),
            is_task_already_exist.clone(),
            clock.clone(),
        ))
        .register::<UpdateTaskCommand, _>(UpdateTaskCommandHandler::new(
            repositories.tasks.clone(),
            is_task_already_exist,
            clock.clone(),
        ))
        .register::<CreateUserCommand, _>(CreateUserCommandHandler::new(
            repositories.users.clone(),
            is_email_already_exist.clone(),
            password_encoder.clone(),
            clock.clone(),
        ))
        .register::<UpdateProfileCommand, _>(UpdateProfileCommandHandler::new(
            repositories.users.clone(),
            is_email_already_exist,
            password_encoder,
            clock.clone(),
        ))
        .register::<AddActivityCommand, _>(AddActivityCommandHandler::new(
            repositories.clone(),
            is_maximum_time_spent_reached.clone(),
            activity_write_lock.clone(),
            clock.clone(),
        ))
        .register::<UpdateActivityCommand, _>(UpdateActivityCommandHandler::new(
            repositories.clone(),
            is_maximum_time_spent_reached,
            activity_write_lock,
            clock,
        ))
        .register::<DeleteActivityCommand, _>(DeleteActivityCommandHandler::new(
            repositories.activities.clone(),
        ))
        .build()
}

/// Wires every query handler onto a bus.
pub fn query_bus(
    repositories: &Repositories,
    password_encoder: Arc<dyn PasswordEncoder>,
) -> QueryBus {
    use activity::{
        GetActivitiesByUserAndMonthQuery, GetActivitiesByUserAndMonthQueryHandler,
        GetActivityByIdQuery, GetActivityByIdQueryHandler,
    };
    use customer::{
        GetCustomerByIdQuery, GetCustomerByIdQueryHandler, GetCustomersQuery,
        GetCustomersQueryHandler,
    };
    use project::{
        GetProjectByIdQuery, GetProjectByIdQueryHandler, GetProjectsQuery, GetProjectsQueryHandler,
    };
    use task::{GetTaskByIdQuery, GetTaskByIdQueryHandler, GetTasksQuery, GetTasksQueryHandler};
    use user::{
        GetUserByApiTokenQuery, GetUserByApiTokenQueryHandler, GetUserByIdQuery,
        GetUserByIdQueryHandler, GetUsersQuery, GetUsersQueryHandler, LoginQuery,
        LoginQueryHandler,
    };

    let customers = &repositories.customers;
    let projects = &repositories.projects;
    let tasks = &repositories.tasks;
    let users = &repositories.users;
    let activities = &repositories.activities;

    QueryBus::builder()
        .register::<GetCustomerByIdQuery, _>(GetCustomerByIdQueryHandler::new(customers.clone()))
        .register::<GetCustomersQuery, _>(GetCustomersQueryHandler::new(customers.clone()))
        .register::<GetProjectByIdQuery, _>(GetProjectByIdQueryHandler::new(projects.clone()))
        .register::<GetProjectsQuery, _>(GetProjectsQueryHandler::new(projects.clone()))
        .register::<GetTaskByIdQuery, _>(GetTaskByIdQueryHandler::new(tasks.clone()))
        .register::<GetTasksQuery, _>(GetTasksQueryHandler::new(tasks.clone()))
        .register::<GetUserByIdQuery, _>(GetUserByIdQueryHandler::new(users.clone()))
        .register::<GetUsersQuery, _>(GetUsersQueryHandler::new(users.clone()))
        .register::<GetUserByApiTokenQuery, _>(GetUserByApiTokenQueryHandler::new(users.clone()))
        .register::<LoginQuery, _>(LoginQueryHandler::new(users.clone(), password_encoder))
        .register::<GetActivityByIdQuery, _>(GetActivityByIdQueryHandler::new(activities.clone()))
        .register::<GetActivitiesByUserAndMonthQuery, _>(
            GetActivitiesByUserAndMonthQueryHandler::new(users.clone(), activities.clone()),
        )
        .build()
}
