use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use timetrack_core::repository::{CustomerRepository, ProjectRepository};
use timetrack_core::specification::IsProjectAlreadyExist;
use timetrack_core::{Customer, DomainError, Project};

use super::customer::CustomerView;
use super::{on_conflict, ApplicationError, Clock};
use crate::bus::{Command, CommandHandler, Query, QueryHandler};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectView {
    pub id: Uuid,
    pub name: String,
    pub customer: CustomerView,
}

impl From<&Project> for ProjectView {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id,
            name: project.name.clone(),
            customer: CustomerView::from(&project.customer),
        }
    }
}

async fn load_customer(
    customers: &dyn CustomerRepository,
    id: Uuid,
) -> Result<Customer, ApplicationError> {
    let customer = customers
        .find_one_by_id(id)
        .await?
        .ok_or(DomainError::CustomerNotFound)?;
    Ok(customer)
}

#[derive(Debug, Clone)]
pub struct CreateProjectCommand {
    pub name: String,
    pub customer_id: Uuid,
}

impl Command for CreateProjectCommand {
    type Output = Uuid;
    const NAME: &'static str = "CreateProjectCommand";
}

pub struct CreateProjectCommandHandler {
    projects: Arc<dyn ProjectRepository>,
    customers: Arc<dyn CustomerRepository>,
    is_project_already_exist: IsProjectAlreadyExist,
    clock: Clock,
}

impl CreateProjectCommandHandler {
    pub fn new(
        projects: Arc<dyn ProjectRepository>,
        customers: Arc<dyn CustomerRepository>,
        is_project_already_exist: IsProjectAlreadyExist,
        clock: Clock,
    ) -> Self {
        Self {
            projects,
            customers,
            is_project_already_exist,
            clock,
        }
    }
}

#[async_trait]
impl CommandHandler<CreateProjectCommand> for CreateProjectCommandHandler {
    async fn execute(&self, command: CreateProjectCommand) -> Result<Uuid, ApplicationError> {
        let customer = load_customer(self.customers.as_ref(), command.customer_id).await?;

        if self
            .is_project_already_exist
            .is_satisfied_by(&command.name)
            .await?
        {
            return Err(DomainError::ProjectAlreadyExist.into());
        }

        let project = Project::new(command.name, customer, (self.clock)());
        self.projects.save(&project)
            .await
            .map_err(on_conflict(DomainError::ProjectAlreadyExist))?;

        Ok(project.id)
    }
}

#[derive(Debug, Clone)]
pub struct UpdateProjectCommand {
    pub id: Uuid,
    pub name: String,
    pub customer_id: Uuid,
}

impl Command for UpdateProjectCommand {
    type Output = ProjectView;
    const NAME: &'static str = "UpdateProjectCommand";
}

pub struct UpdateProjectCommandHandler {
    projects: Arc<dyn ProjectRepository>,
    customers: Arc<dyn CustomerRepository>,
    is_project_already_exist: IsProjectAlreadyExist,
    clock: Clock,
}

impl UpdateProjectCommandHandler {
    pub fn new(
        projects: Arc<dyn ProjectRepository>,
        customers: Arc<dyn CustomerRepository>,
        is_project_already_exist: IsProjectAlreadyExist,
        clock: Clock,
    ) -> Self {
        Self {
            projects,
            customers,
            is_project_already_exist,
            clock,
        }
    }
}

#[async_trait]
impl CommandHandler<UpdateProjectCommand> for UpdateProjectCommandHandler {
    async fn execute(&self, command: UpdateProjectCommand) -> Result<ProjectView, ApplicationError> {
        let mut project = self
            .projects
            .find_one_by_id(command.id)
            .await?
            .ok_or(DomainError::ProjectNotFound)?;

        let customer = load_customer(self.customers.as_ref(), command.customer_id).await?;

        if project.name != command.name
            && self
                .is_project_already_exist
                .is_satisfied_by(&command.name)
                .await?
        {
            return Err(DomainError::ProjectAlreadyExist.into());
        }

        project.update(command.name, customer, (self.clock)());
        self.projects.save(&project)
            .await
            .map_err(on_conflict(DomainError::ProjectAlreadyExist))?;

        Ok(ProjectView::from(&project))
    }
}

#[derive(Debug, Clone)]
pub struct GetProjectByIdQuery {
    pub id: Uuid,
}

impl Query for GetProjectByIdQuery {
    type Output = ProjectView;
    const NAME: &'static str = "GetProjectByIdQuery";
}

pub struct GetProjectByIdQueryHandler {
    projects: Arc<dyn ProjectRepository>,
}

impl GetProjectByIdQueryHandler {
    pub fn new(projects: Arc<dyn ProjectRepository>) -> Self {
        Self { projects }
    }
}

#[async_trait]
impl QueryHandler<GetProjectByIdQuery> for GetProjectByIdQueryHandler {
    async fn execute(&self, query: GetProjectByIdQuery) -> Result<ProjectView, ApplicationError> {
        let project = self
            .projects
            .find_one_by_id(query.id)
            .await?
            .ok_or(DomainError::ProjectNotFound)?;
        Ok(ProjectView::from(&project))
    }
}

/// Lists projects, optionally only those of one customer.
#[derive(Debug, Clone, Default)]
pub struct GetProjectsQuery {
    pub customer_id: Option<Uuid>,
}

impl Query for GetProjectsQuery {
    type Output = Vec<ProjectView>;
    const NAME: &'static str = "GetProjectsQuery";
}

pub struct GetProjectsQueryHandler {
    projects: Arc<dyn ProjectRepository>,
}

impl GetProjectsQueryHandler {
    pub fn new(projects: Arc<dyn ProjectRepository>) -> Self {
        Self { projects }
    }
}

#[async_trait]
impl QueryHandler<GetProjectsQuery> for GetProjectsQueryHandler {
    async fn execute(&self, query: GetProjectsQuery) -> Result<Vec<ProjectView>, ApplicationError> {
        let projects = self.projects.find_all(query.customer_id).await?;
        Ok(projects.iter().map(ProjectView::from).collect())
    }
}
