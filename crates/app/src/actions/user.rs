use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{email, required};
use crate::application::user::{
    CreateUserCommand, GetUserByIdQuery, GetUsersQuery, LoggedUserView, LoginQuery,
    UpdateProfileCommand, UserView,
};
use crate::auth::LoggedUser;
use crate::problem::ProblemResponse;
use crate::router::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginBody {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserBody {
    first_name: String,
    last_name: String,
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileBody {
    first_name: String,
    last_name: String,
    email: String,
    #[serde(default)]
    password: Option<String>,
}

fn password(value: &str) -> Result<String, ProblemResponse> {
    if value.is_empty() {
        return Err(ProblemResponse::validation("password must not be empty"));
    }
    Ok(value.to_string())
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<Json<LoggedUserView>, ProblemResponse> {
    let query = LoginQuery {
        email: email(&body.email)?,
        password: password(&body.password)?,
    };
    state
        .query_bus()
        .execute(query)
        .await
        .map(Json)
        .map_err(ProblemResponse::from_login)
}

pub async fn me(LoggedUser(user): LoggedUser) -> Json<UserView> {
    Json(user)
}

pub async fn list(
    State(state): State<AppState>,
    _user: LoggedUser,
) -> Result<Json<Vec<UserView>>, ProblemResponse> {
    state
        .query_bus()
        .execute(GetUsersQuery)
        .await
        .map(Json)
        .map_err(ProblemResponse::from_query)
}

pub async fn get(
    State(state): State<AppState>,
    _user: LoggedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserView>, ProblemResponse> {
    state
        .query_bus()
        .execute(GetUserByIdQuery { id })
        .await
        .map(Json)
        .map_err(ProblemResponse::from_query)
}

pub async fn create(
    State(state): State<AppState>,
    _user: LoggedUser,
    Json(body): Json<CreateUserBody>,
) -> Result<(StatusCode, Json<UserView>), ProblemResponse> {
    let command = CreateUserCommand {
        first_name: required("firstName", &body.first_name)?,
        last_name: required("lastName", &body.last_name)?,
        email: email(&body.email)?,
        password: password(&body.password)?,
    };
    let id = state
        .command_bus()
        .execute(command)
        .await
        .map_err(ProblemResponse::from_command)?;

    let view = state
        .query_bus()
        .execute(GetUserByIdQuery { id })
        .await
        .map_err(ProblemResponse::from_query)?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn update_profile(
    State(state): State<AppState>,
    LoggedUser(user): LoggedUser,
    Json(body): Json<UpdateProfileBody>,
) -> Result<Json<UserView>, ProblemResponse> {
    let command = UpdateProfileCommand {
        user_id: user.id,
        first_name: required("firstName", &body.first_name)?,
        last_name: required("lastName", &body.last_name)?,
        email: email(&body.email)?,
        password: body
            .password
            .filter(|value| !value.is_empty()),
    };
    state
        .command_bus()
        .execute(command)
        .await
        .map(Json)
        .map_err(ProblemResponse::from_command)
}
