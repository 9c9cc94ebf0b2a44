use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use timetrack_core::calendar::{days_of_month, is_weekend, month_bounds};
use timetrack_core::repository::{
    ActivityRepository, ProjectRepository, TaskRepository, UserRepository,
};
use timetrack_core::specification::IsMaximumTimeSpentReached;
use timetrack_core::{Activity, DomainError, Project, Task};

use super::project::ProjectView;
use super::task::TaskView;
use super::{ActivityWriteLock, ApplicationError, Clock, Repositories};
use crate::bus::{Command, CommandHandler, Query, QueryHandler};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityView {
    pub id: Uuid,
    pub date: NaiveDate,
    pub time: u32,
    pub summary: Option<String>,
    pub project: ProjectView,
    pub task: TaskView,
    pub user_id: Uuid,
}

impl From<&Activity> for ActivityView {
    fn from(activity: &Activity) -> Self {
        Self {
            id: activity.id,
            date: activity.date,
            time: activity.time,
            summary: activity.summary.clone(),
            project: ProjectView::from(&activity.project),
            task: TaskView::from(&activity.task),
            user_id: activity.user_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitiesByDayView {
    pub date: NaiveDate,
    pub weekend: bool,
    pub activities: Vec<ActivityView>,
}

/// One user's month: every calendar day, with or without activities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyActivitiesView {
    pub total_time_spent: u32,
    pub days: Vec<ActivitiesByDayView>,
}

/// Checks shared by add and update, in the order their errors are reported.
async fn resolve_entry(
    repositories: &Repositories,
    time: u32,
    project_id: Uuid,
    task_id: Uuid,
) -> Result<(Project, Task), ApplicationError> {
    if !Activity::is_valid_time(time) {
        return Err(DomainError::InvalidTimeSpent.into());
    }

    let project = repositories
        .projects
        .find_one_by_id(project_id)
        .await?
        .ok_or(DomainError::ProjectNotFound)?;
    let task = repositories
        .tasks
        .find_one_by_id(task_id)
        .await?
        .ok_or(DomainError::TaskNotFound)?;

    Ok((project, task))
}

async fn find_owned(
    activities: &dyn ActivityRepository,
    id: Uuid,
    user_id: Uuid,
) -> Result<Activity, ApplicationError> {
    let activity = activities
        .find_one_by_id(id)
        .await?
        .ok_or(DomainError::ActivityNotFound)?;
    if !activity.is_owned_by(user_id) {
        return Err(DomainError::NotActivityOwner.into());
    }
    Ok(activity)
}

#[derive(Debug, Clone)]
pub struct AddActivityCommand {
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub time: u32,
    pub summary: Option<String>,
    pub project_id: Uuid,
    pub task_id: Uuid,
}

impl Command for AddActivityCommand {
    type Output = Uuid;
    const NAME: &'static str = "AddActivityCommand";
}

pub struct AddActivityCommandHandler {
    repositories: Repositories,
    is_maximum_time_spent_reached: IsMaximumTimeSpentReached,
    write_lock: ActivityWriteLock,
    clock: Clock,
}

impl AddActivityCommandHandler {
    pub fn new(
        repositories: Repositories,
        is_maximum_time_spent_reached: IsMaximumTimeSpentReached,
        write_lock: ActivityWriteLock,
        clock: Clock,
    ) -> Self {
        Self {
            repositories,
            is_maximum_time_spent_reached,
            write_lock,
            clock,
        }
    }
}

#[async_trait]
impl CommandHandler<AddActivityCommand> for AddActivityCommandHandler {
    async fn execute(&self, command: AddActivityCommand) -> Result<Uuid, ApplicationError> {
        let (project, task) = resolve_entry(
            &self.repositories,
            command.time,
            command.project_id,
            command.task_id,
        )
        .await?;

        // Held until the activity is saved so concurrent adds see each other.
        let _write = self.write_lock.lock().await;
        if self
            .is_maximum_time_spent_reached
            .is_satisfied_by(command.user_id, command.date, command.time, None)
            .await?
        {
            return Err(DomainError::MaximumTimeSpentReached.into());
        }

        let activity = Activity::new(
            command.date,
            command.time,
            command.summary,
            project,
            task,
            command.user_id,
            (self.clock)(),
        );
        self.repositories.activities.save(&activity).await?;

        Ok(activity.id)
    }
}

#[derive(Debug, Clone)]
pub struct UpdateActivityCommand {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub time: u32,
    pub summary: Option<String>,
    pub project_id: Uuid,
    pub task_id: Uuid,
}

impl Command for UpdateActivityCommand {
    type Output = ActivityView;
    const NAME: &'static str = "UpdateActivityCommand";
}

pub struct UpdateActivityCommandHandler {
    repositories: Repositories,
    is_maximum_time_spent_reached: IsMaximumTimeSpentReached,
    write_lock: ActivityWriteLock,
    clock: Clock,
}

impl UpdateActivityCommandHandler {
    pub fn new(
        repositories: Repositories,
        is_maximum_time_spent_reached: IsMaximumTimeSpentReached,
        write_lock: ActivityWriteLock,
        clock: Clock,
    ) -> Self {
        Self {
            repositories,
            is_maximum_time_spent_reached,
            write_lock,
            clock,
        }
    }
}

#[async_trait]
impl CommandHandler<UpdateActivityCommand> for UpdateActivityCommandHandler {
    async fn execute(
        &self,
        command: UpdateActivityCommand,
    ) -> Result<ActivityView, ApplicationError> {
        let mut activity = find_owned(
            self.repositories.activities.as_ref(),
            command.id,
            command.user_id,
        )
        .await?;

        let (project, task) = resolve_entry(
            &self.repositories,
            command.time,
            command.project_id,
            command.task_id,
        )
        .await?;

        let _write = self.write_lock.lock().await;
        if self
            .is_maximum_time_spent_reached
            .is_satisfied_by(command.user_id, command.date, command.time, Some(activity.id))
            .await?
        {
            return Err(DomainError::MaximumTimeSpentReached.into());
        }

        activity.update(
            command.date,
            command.time,
            command.summary,
            project,
            task,
            (self.clock)(),
        );
        self.repositories.activities.save(&activity).await?;

        Ok(ActivityView::from(&activity))
    }
}

#[derive(Debug, Clone)]
pub struct DeleteActivityCommand {
    pub id: Uuid,
    pub user_id: Uuid,
}

impl Command for DeleteActivityCommand {
    type Output = ();
    const NAME: &'static str = "DeleteActivityCommand";
}

pub struct DeleteActivityCommandHandler {
    activities: Arc<dyn ActivityRepository>,
}

impl DeleteActivityCommandHandler {
    pub fn new(activities: Arc<dyn ActivityRepository>) -> Self {
        Self { activities }
    }
}

#[async_trait]
impl CommandHandler<DeleteActivityCommand> for DeleteActivityCommandHandler {
    async fn execute(&self, command: DeleteActivityCommand) -> Result<(), ApplicationError> {
        let activity = find_owned(self.activities.as_ref(), command.id, command.user_id).await?;
        self.activities.remove(&activity).await?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct GetActivityByIdQuery {
    pub id: Uuid,
}

impl Query for GetActivityByIdQuery {
    type Output = ActivityView;
    const NAME: &'static str = "GetActivityByIdQuery";
}

pub struct GetActivityByIdQueryHandler {
    activities: Arc<dyn ActivityRepository>,
}

impl GetActivityByIdQueryHandler {
    pub fn new(activities: Arc<dyn ActivityRepository>) -> Self {
        Self { activities }
    }
}

#[async_trait]
impl QueryHandler<GetActivityByIdQuery> for GetActivityByIdQueryHandler {
    async fn execute(&self, query: GetActivityByIdQuery) -> Result<ActivityView, ApplicationError> {
        let activity = self
            .activities
            .find_one_by_id(query.id)
            .await?
            .ok_or(DomainError::ActivityNotFound)?;
        Ok(ActivityView::from(&activity))
    }
}

/// `date` may be any day of the wanted month.
#[derive(Debug, Clone)]
pub struct GetActivitiesByUserAndMonthQuery {
    pub user_id: Uuid,
    pub date: NaiveDate,
}

impl Query for GetActivitiesByUserAndMonthQuery {
    type Output = MonthlyActivitiesView;
    const NAME: &'static str = "GetActivitiesByUserAndMonthQuery";
}

pub struct GetActivitiesByUserAndMonthQueryHandler {
    users: Arc<dyn UserRepository>,
    activities: Arc<dyn ActivityRepository>,
}

impl GetActivitiesByUserAndMonthQueryHandler {
    pub fn new(users: Arc<dyn UserRepository>, activities: Arc<dyn ActivityRepository>) -> Self {
        Self { users, activities }
    }
}

#[async_trait]
impl QueryHandler<GetActivitiesByUserAndMonthQuery> for GetActivitiesByUserAndMonthQueryHandler {
    async fn execute(
        &self,
        query: GetActivitiesByUserAndMonthQuery,
    ) -> Result<MonthlyActivitiesView, ApplicationError> {
        if self.users.find_one_by_id(query.user_id).await?.is_none() {
            return Err(DomainError::UserNotFound.into());
        }

        let (first_day, last_day) = month_bounds(query.date);
        let activities = self
            .activities
            .find_by_user_between(query.user_id, first_day, last_day)
            .await?;

        let total_time_spent = activities.iter().map(|activity| activity.time).sum();
        let days = days_of_month(query.date)
            .map(|day| ActivitiesByDayView {
                date: day,
                weekend: is_weekend(day),
                activities: activities
                    .iter()
                    .filter(|activity| activity.date == day)
                    .map(ActivityView::from)
                    .collect(),
            })
            .collect();

        Ok(MonthlyActivitiesView {
            total_time_spent,
            days,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        customer, date, fixed_clock, fixed_now, project, task, user, FakeRepositories,
    };

    struct Fixture {
        fakes: FakeRepositories,
        owner: Uuid,
        project: Project,
        task: Task,
    }

    async fn fixture() -> Fixture {
        let fakes = FakeRepositories::new();
        let owner = user("ada@example.com");
        let website = project("Website", customer("Acme"));
        let development = task("Development");
        fakes.users.save(&owner).await.unwrap();
        fakes.projects.save(&website).await.unwrap();
        fakes.tasks.save(&development).await.unwrap();
        Fixture {
            owner: owner.id,
            project: website,
            task: development,
            fakes,
        }
    }

    impl Fixture {
        fn add_handler(&self) -> AddActivityCommandHandler {
            AddActivityCommandHandler::new(
                self.fakes.ports(),
                IsMaximumTimeSpentReached::new(self.fakes.activities.clone()),
                ActivityWriteLock::default(),
                fixed_clock(),
            )
        }

        fn update_handler(&self) -> UpdateActivityCommandHandler {
            UpdateActivityCommandHandler::new(
                self.fakes.ports(),
                IsMaximumTimeSpentReached::new(self.fakes.activities.clone()),
                ActivityWriteLock::default(),
                fixed_clock(),
            )
        }

        fn add(&self, day: NaiveDate, time: u32) -> AddActivityCommand {
            AddActivityCommand {
                user_id: self.owner,
                date: day,
                time,
                summary: Some("Sprint review".to_string()),
                project_id: self.project.id,
                task_id: self.task.id,
            }
        }

        fn update(&self, id: Uuid, time: u32) -> UpdateActivityCommand {
            UpdateActivityCommand {
                id,
                user_id: self.owner,
                date: date(2024, 1, 2),
                time,
                summary: None,
                project_id: self.project.id,
                task_id: self.task.id,
            }
        }

        async fn stored(&self, day: NaiveDate, time: u32) -> Activity {
            let activity = Activity::new(
                day,
                time,
                None,
                self.project.clone(),
                self.task.clone(),
                self.owner,
                fixed_now(),
            );
            self.fakes.activities.save(&activity).await.unwrap();
            activity
        }

        fn mutations_since(&self, before: usize) -> Vec<String> {
            self.fakes.journal.mutations().split_off(before)
        }
    }

    #[tokio::test]
    async fn add_saves_activity() {
        let fixture = fixture().await;
        let before = fixture.fakes.journal.mutations().len();

        let id = fixture
            .add_handler()
            .execute(fixture.add(date(2024, 1, 2), 50))
            .await
            .expect("added");

        let rows = fixture.fakes.activities.rows();
        assert_eq!(rows[0].id, id);
        assert_eq!(rows[0].project, fixture.project);
        assert_eq!(fixture.mutations_since(before), ["activities.save:50"]);
    }

    #[tokio::test]
    async fn add_rejects_time_out_of_range() {
        let fixture = fixture().await;
        let before = fixture.fakes.journal.entries().len();

        for time in [0, 101] {
            let err = fixture
                .add_handler()
                .execute(fixture.add(date(2024, 1, 2), time))
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                ApplicationError::Domain(DomainError::InvalidTimeSpent)
            ));
        }
        assert_eq!(fixture.fakes.journal.entries().len(), before);
    }

    #[tokio::test]
    async fn add_requires_known_project_and_task() {
        let fixture = fixture().await;
        let handler = fixture.add_handler();

        let mut command = fixture.add(date(2024, 1, 2), 50);
        command.project_id = Uuid::new_v4();
        let err = handler.execute(command).await.unwrap_err();
        assert_eq!(err.to_string(), "project.errors.not_found");

        let mut command = fixture.add(date(2024, 1, 2), 50);
        command.task_id = Uuid::new_v4();
        let err = handler.execute(command).await.unwrap_err();
        assert_eq!(err.to_string(), "task.errors.not_found");

        assert!(fixture.fakes.activities.rows().is_empty());
    }

    #[tokio::test]
    async fn add_enforces_daily_maximum() {
        let fixture = fixture().await;
        fixture.stored(date(2024, 1, 2), 75).await;
        let handler = fixture.add_handler();

        let err = handler
            .execute(fixture.add(date(2024, 1, 2), 50))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::MaximumTimeSpentReached)
        ));

        handler
            .execute(fixture.add(date(2024, 1, 2), 25))
            .await
            .expect("fills the day exactly");
        handler
            .execute(fixture.add(date(2024, 1, 3), 100))
            .await
            .expect("other days are independent");
    }

    #[tokio::test]
    async fn update_ignores_previous_time_of_the_edited_activity() {
        let fixture = fixture().await;
        let existing = fixture.stored(date(2024, 1, 2), 75).await;
        fixture.stored(date(2024, 1, 2), 25).await;

        let view = fixture
            .update_handler()
            .execute(fixture.update(existing.id, 75))
            .await
            .expect("updated");
        assert_eq!(view.time, 75);
        assert_eq!(view.summary, None);

        let err = fixture
            .update_handler()
            .execute(fixture.update(existing.id, 80))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::MaximumTimeSpentReached)
        ));
    }

    #[tokio::test]
    async fn only_the_owner_can_change_an_activity() {
        let fixture = fixture().await;
        let existing = fixture.stored(date(2024, 1, 2), 50).await;
        let before = fixture.fakes.journal.mutations().len();

        let mut command = fixture.update(existing.id, 25);
        command.user_id = Uuid::new_v4();
        let err = fixture.update_handler().execute(command).await.unwrap_err();
        assert_eq!(err.to_string(), "activity.errors.not_owner");

        let delete = DeleteActivityCommandHandler::new(fixture.fakes.activities.clone());
        let err = delete
            .execute(DeleteActivityCommand {
                id: existing.id,
                user_id: Uuid::new_v4(),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::NotActivityOwner)
        ));
        assert!(fixture.mutations_since(before).is_empty());

        delete
            .execute(DeleteActivityCommand {
                id: existing.id,
                user_id: fixture.owner,
            })
            .await
            .expect("deleted");
        assert_eq!(fixture.mutations_since(before), ["activities.remove"]);
        assert!(fixture.fakes.activities.rows().is_empty());
    }

    #[tokio::test]
    async fn missing_activity_is_not_found() {
        let fixture = fixture().await;

        let err = DeleteActivityCommandHandler::new(fixture.fakes.activities.clone())
            .execute(DeleteActivityCommand {
                id: Uuid::new_v4(),
                user_id: fixture.owner,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::ActivityNotFound)
        ));

        let err = GetActivityByIdQueryHandler::new(fixture.fakes.activities.clone())
            .execute(GetActivityByIdQuery { id: Uuid::new_v4() })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "activity.errors.not_found");
    }

    #[tokio::test]
    async fn month_view_lists_every_day() {
        let fixture = fixture().await;
        fixture.stored(date(2024, 2, 5), 50).await;
        fixture.stored(date(2024, 2, 5), 25).await;
        fixture.stored(date(2024, 2, 29), 100).await;
        fixture.stored(date(2024, 3, 1), 100).await;

        let handler = GetActivitiesByUserAndMonthQueryHandler::new(
            fixture.fakes.users.clone(),
            fixture.fakes.activities.clone(),
        );
        let month = handler
            .execute(GetActivitiesByUserAndMonthQuery {
                user_id: fixture.owner,
                date: date(2024, 2, 14),
            })
            .await
            .expect("month");

        assert_eq!(month.total_time_spent, 175);
        assert_eq!(month.days.len(), 29);
        assert_eq!(month.days[0].date, date(2024, 2, 1));
        assert_eq!(month.days[4].activities.len(), 2);
        assert!(month.days[2].weekend);
        assert!(!month.days[4].weekend);
        assert_eq!(month.days[28].activities[0].time, 100);

        let err = handler
            .execute(GetActivitiesByUserAndMonthQuery {
                user_id: Uuid::new_v4(),
                date: date(2024, 2, 14),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::UserNotFound)
        ));
    }
}
