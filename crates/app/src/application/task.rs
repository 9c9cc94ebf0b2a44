use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use timetrack_core::repository::TaskRepository;
use timetrack_core::specification::IsTaskAlreadyExist;
use timetrack_core::{Task, DomainError};

use super::{on_conflict, ApplicationError, Clock};
use crate::bus::{Command, CommandHandler, Query, QueryHandler};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub id: Uuid,
    pub name: String,
}

impl From<&Task> for TaskView {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            name: task.name.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateTaskCommand {
    pub name: String,
}

impl Command for CreateTaskCommand {
    type Output = Uuid;
    const NAME: &'static str = "CreateTaskCommand";
}

pub struct CreateTaskCommandHandler {
    repository: Arc<dyn TaskRepository>,
    is_task_already_exist: IsTaskAlreadyExist,
    clock: Clock,
}

impl CreateTaskCommandHandler {
    pub fn new(
        repository: Arc<dyn TaskRepository>,
        is_task_already_exist: IsTaskAlreadyExist,
        clock: Clock,
    ) -> Self {
        Self {
            repository,
            is_task_already_exist,
            clock,
        }
    }
}

#[async_trait]
impl CommandHandler<CreateTaskCommand> for CreateTaskCommandHandler {
    async fn execute(&self, command: CreateTaskCommand) -> Result<Uuid, ApplicationError> {
        if self
            .is_task_already_exist
            .is_satisfied_by(&command.name)
            .await?
        {
            return Err(DomainError::TaskAlreadyExist.into());
        }

        let task = Task::new(command.name, (self.clock)());
        self.repository.save(&task)
            .await
            .map_err(on_conflict(DomainError::TaskAlreadyExist))?;

        Ok(task.id)
    }
}

#[derive(Debug, Clone)]
pub struct UpdateTaskCommand {
    pub id: Uuid,
    pub name: String,
}

impl Command for UpdateTaskCommand {
    type Output = TaskView;
    const NAME: &'static str = "UpdateTaskCommand";
}

pub struct UpdateTaskCommandHandler {
    repository: Arc<dyn TaskRepository>,
    is_task_already_exist: IsTaskAlreadyExist,
    clock: Clock,
}

impl UpdateTaskCommandHandler {
    pub fn new(
        repository: Arc<dyn TaskRepository>,
        is_task_already_exist: IsTaskAlreadyExist,
        clock: Clock,
    ) -> Self {
        Self {
            repository,
            is_task_already_exist,
            clock,
        }
    }
}

#[async_trait]
impl CommandHandler<UpdateTaskCommand> for UpdateTaskCommandHandler {
    async fn execute(
        &self,
        command: UpdateTaskCommand,
    ) -> Result<TaskView, ApplicationError> {
        let mut task = self
            .repository
            .find_one_by_id(command.id)
            .await?
            .ok_or(DomainError::TaskNotFound)?;

        if task.name != command.name
            && self
                .is_task_already_exist
                .is_satisfied_by(&command.name)
                .await?
        {
            return Err(DomainError::TaskAlreadyExist.into());
        }

        task.update_name(command.name, (self.clock)());
        self.repository.save(&task)
            .await
            .map_err(on_conflict(DomainError::TaskAlreadyExist))?;

        Ok(TaskView::from(&task))
    }
}

#[derive(Debug, Clone)]
pub struct GetTaskByIdQuery {
    pub id: Uuid,
}

impl Query for GetTaskByIdQuery {
    type Output = TaskView;
    const NAME: &'static str = "GetTaskByIdQuery";
}

pub struct GetTaskByIdQueryHandler {
    repository: Arc<dyn TaskRepository>,
}

impl GetTaskByIdQueryHandler {
    pub fn new(repository: Arc<dyn TaskRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl QueryHandler<GetTaskByIdQuery> for GetTaskByIdQueryHandler {
    async fn execute(
        &self,
        query: GetTaskByIdQuery,
    ) -> Result<TaskView, ApplicationError> {
        let task = self
            .repository
            .find_one_by_id(query.id)
            .await?
            .ok_or(DomainError::TaskNotFound)?;
        Ok(TaskView::from(&task))
    }
}

#[derive(Debug, Clone, Default)]
pub struct GetTasksQuery;

impl Query for GetTasksQuery {
    type Output = Vec<TaskView>;
    const NAME: &'static str = "GetTasksQuery";
}

pub struct GetTasksQueryHandler {
    repository: Arc<dyn TaskRepository>,
}

impl GetTasksQueryHandler {
    pub fn new(repository: Arc<dyn TaskRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl QueryHandler<GetTasksQuery> for GetTasksQueryHandler {
    async fn execute(
        &self,
        _query: GetTasksQuery,
    ) -> Result<Vec<TaskView>, ApplicationError> {
        let tasks = self.repository.find_all().await?;
        Ok(tasks.iter().map(TaskView::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixed_clock, task, Fake, Journal};

    fn handlers(repository: Arc<Fake<Task>>) -> (CreateTaskCommandHandler, UpdateTaskCommandHandler) {
        let is_task_already_exist = IsTaskAlreadyExist::new(repository.clone());
        (
            CreateTaskCommandHandler::new(
                repository.clone(),
                is_task_already_exist.clone(),
                fixed_clock(),
            ),
            UpdateTaskCommandHandler::new(repository, is_task_already_exist, fixed_clock()),
        )
    }

    #[tokio::test]
    async fn create_then_rename() {
        let journal = Journal::default();
        let repository: Arc<Fake<Task>> = Fake::new(&journal);
        let (create, update) = handlers(repository.clone());

        let id = create
            .execute(CreateTaskCommand {
                name: "Development".to_string(),
            })
            .await
            .expect("created");
        let view = update
            .execute(UpdateTaskCommand {
                id,
                name: "Maintenance".to_string(),
            })
            .await
            .expect("renamed");

        assert_eq!(view.id, id);
        assert_eq!(view.name, "Maintenance");
        assert_eq!(
            journal.mutations(),
            ["tasks.save:Development", "tasks.save:Maintenance"]
        );
    }

    #[tokio::test]
    async fn duplicate_names_are_rejected() {
        let journal = Journal::default();
        let existing = task("Development");
        let other = task("Meeting");
        let repository = Fake::with(&journal, vec![existing, other.clone()]);
        let (create, update) = handlers(repository);

        let err = create
            .execute(CreateTaskCommand {
                name: "Development".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::TaskAlreadyExist)
        ));

        let err = update
            .execute(UpdateTaskCommand {
                id: other.id,
                name: "Development".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "task.errors.already_exist");
        assert!(journal.mutations().is_empty());
    }

    #[tokio::test]
    async fn missing_task_is_not_found() {
        let journal = Journal::default();
        let repository: Arc<Fake<Task>> = Fake::new(&journal);
        let (_, update) = handlers(repository.clone());

        let err = update
            .execute(UpdateTaskCommand {
                id: Uuid::new_v4(),
                name: "Development".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::Domain(DomainError::TaskNotFound)));

        let err = GetTaskByIdQueryHandler::new(repository)
            .execute(GetTaskByIdQuery { id: Uuid::new_v4() })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "task.errors.not_found");
    }

    #[tokio::test]
    async fn list_is_sorted_by_name() {
        let journal = Journal::default();
        let repository = Fake::with(&journal, vec![task("Testing"), task("Analysis")]);

        let names: Vec<_> = GetTasksQueryHandler::new(repository)
            .execute(GetTasksQuery)
            .await
            .expect("listed")
            .into_iter()
            .map(|view| view.name)
            .collect();
        assert_eq!(names, ["Analysis", "Testing"]);
    }
}
