use std::sync::Arc;

use async_trait::async_trait;
use rand::{rngs::OsRng, RngCore};
use serde::Serialize;
use uuid::Uuid;

use timetrack_core::repository::{PasswordEncoder, UserRepository};
use timetrack_core::specification::IsEmailAlreadyExist;
use timetrack_core::{DomainError, User};

use super::{on_conflict, ApplicationError, Clock};
use crate::bus::{Command, CommandHandler, Query, QueryHandler};

const API_TOKEN_BYTES: usize = 32;

/// Issues a fresh bearer token: random bytes, hex encoded.
pub fn generate_api_token() -> String {
    let mut bytes = [0u8; API_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Returned by login only; the one view carrying the API token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedUserView {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub api_token: String,
}

impl From<&User> for LoggedUserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            api_token: user.api_token.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateUserCommand {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl Command for CreateUserCommand {
    type Output = Uuid;
    const NAME: &'static str = "CreateUserCommand";
}

pub struct CreateUserCommandHandler {
    repository: Arc<dyn UserRepository>,
    is_email_already_exist: IsEmailAlreadyExist,
    password_encoder: Arc<dyn PasswordEncoder>,
    clock: Clock,
}

impl CreateUserCommandHandler {
    pub fn new(
        repository: Arc<dyn UserRepository>,
        is_email_already_exist: IsEmailAlreadyExist,
        password_encoder: Arc<dyn PasswordEncoder>,
        clock: Clock,
    ) -> Self {
        Self {
            repository,
            is_email_already_exist,
            password_encoder,
            clock,
        }
    }
}

#[async_trait]
impl CommandHandler<CreateUserCommand> for CreateUserCommandHandler {
    async fn execute(&self, command: CreateUserCommand) -> Result<Uuid, ApplicationError> {
        if self
            .is_email_already_exist
            .is_satisfied_by(&command.email)
            .await?
        {
            return Err(DomainError::EmailAlreadyExist.into());
        }

        let password_hash = self.password_encoder.hash(&command.password)?;
        let user = User::new(
            command.first_name,
            command.last_name,
            command.email,
            password_hash,
            generate_api_token(),
            (self.clock)(),
        );
        self.repository.save(&user)
            .await
            .map_err(on_conflict(DomainError::EmailAlreadyExist))?;

        Ok(user.id)
    }
}

/// Edits the caller's own account. The password is only replaced when given.
#[derive(Debug, Clone)]
pub struct UpdateProfileCommand {
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: Option<String>,
}

impl Command for UpdateProfileCommand {
    type Output = UserView;
    const NAME: &'static str = "UpdateProfileCommand";
}

pub struct UpdateProfileCommandHandler {
    repository: Arc<dyn UserRepository>,
    is_email_already_exist: IsEmailAlreadyExist,
    password_encoder: Arc<dyn PasswordEncoder>,
    clock: Clock,
}

impl UpdateProfileCommandHandler {
    pub fn new(
        repository: Arc<dyn UserRepository>,
        is_email_already_exist: IsEmailAlreadyExist,
        password_encoder: Arc<dyn PasswordEncoder>,
        clock: Clock,
    ) -> Self {
        Self {
            repository,
            is_email_already_exist,
            password_encoder,
            clock,
        }
    }
}

#[async_trait]
impl CommandHandler<UpdateProfileCommand> for UpdateProfileCommandHandler {
    async fn execute(&self, command: UpdateProfileCommand) -> Result<UserView, ApplicationError> {
        let mut user = self
            .repository
            .find_one_by_id(command.user_id)
            .await?
            .ok_or(DomainError::UserNotFound)?;

        if user.email != command.email
            && self
                .is_email_already_exist
                .is_satisfied_by(&command.email)
                .await?
        {
            return Err(DomainError::EmailAlreadyExist.into());
        }

        let now = (self.clock)();
        user.update(command.first_name, command.last_name, command.email, now);
        if let Some(password) = command.password.as_deref() {
            user.update_password_hash(self.password_encoder.hash(password)?, now);
        }
        self.repository.save(&user)
            .await
            .map_err(on_conflict(DomainError::EmailAlreadyExist))?;

        Ok(UserView::from(&user))
    }
}

#[derive(Debug, Clone)]
pub struct LoginQuery {
    pub email: String,
    pub password: String,
}

impl Query for LoginQuery {
    type Output = LoggedUserView;
    const NAME: &'static str = "LoginQuery";
}

pub struct LoginQueryHandler {
    repository: Arc<dyn UserRepository>,
    password_encoder: Arc<dyn PasswordEncoder>,
}

impl LoginQueryHandler {
    pub fn new(
        repository: Arc<dyn UserRepository>,
        password_encoder: Arc<dyn PasswordEncoder>,
    ) -> Self {
        Self {
            repository,
            password_encoder,
        }
    }
}

#[async_trait]
impl QueryHandler<LoginQuery> for LoginQueryHandler {
    async fn execute(&self, query: LoginQuery) -> Result<LoggedUserView, ApplicationError> {
        let user = self
            .repository
            .find_one_by_email(&query.email)
            .await?
            .ok_or(DomainError::UserNotFound)?;

        if !self
            .password_encoder
            .verify(&query.password, &user.password_hash)?
        {
            return Err(DomainError::PasswordNotMatch.into());
        }

        Ok(LoggedUserView::from(&user))
    }
}

#[derive(Debug, Clone)]
pub struct GetUserByIdQuery {
    pub id: Uuid,
}

impl Query for GetUserByIdQuery {
    type Output = UserView;
    const NAME: &'static str = "GetUserByIdQuery";
}

pub struct GetUserByIdQueryHandler {
    repository: Arc<dyn UserRepository>,
}

impl GetUserByIdQueryHandler {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl QueryHandler<GetUserByIdQuery> for GetUserByIdQueryHandler {
    async fn execute(&self, query: GetUserByIdQuery) -> Result<UserView, ApplicationError> {
        let user = self
            .repository
            .find_one_by_id(query.id)
            .await?
            .ok_or(DomainError::UserNotFound)?;
        Ok(UserView::from(&user))
    }
}

#[derive(Debug, Clone, Default)]
pub struct GetUsersQuery;

impl Query for GetUsersQuery {
    type Output = Vec<UserView>;
    const NAME: &'static str = "GetUsersQuery";
}

pub struct GetUsersQueryHandler {
    repository: Arc<dyn UserRepository>,
}

impl GetUsersQueryHandler {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl QueryHandler<GetUsersQuery> for GetUsersQueryHandler {
    async fn execute(&self, _query: GetUsersQuery) -> Result<Vec<UserView>, ApplicationError> {
        let users = self.repository.find_all().await?;
        Ok(users.iter().map(UserView::from).collect())
    }
}

/// Resolves the user behind a bearer token.
#[derive(Debug, Clone)]
pub struct GetUserByApiTokenQuery {
    pub api_token: String,
}

impl Query for GetUserByApiTokenQuery {
    type Output = UserView;
    const NAME: &'static str = "GetUserByApiTokenQuery";
}

pub struct GetUserByApiTokenQueryHandler {
    repository: Arc<dyn UserRepository>,
}

impl GetUserByApiTokenQueryHandler {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl QueryHandler<GetUserByApiTokenQuery> for GetUserByApiTokenQueryHandler {
    async fn execute(&self, query: GetUserByApiTokenQuery) -> Result<UserView, ApplicationError> {
        let user = self
            .repository
            .find_one_by_api_token(&query.api_token)
            .await?
            .ok_or(DomainError::UserNotFound)?;
        Ok(UserView::from(&user))
    }
}
