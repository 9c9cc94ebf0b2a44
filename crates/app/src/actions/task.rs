use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::required;
use crate::application::task::{
    CreateTaskCommand, GetTaskByIdQuery, GetTasksQuery, TaskView, UpdateTaskCommand,
};
use crate::auth::LoggedUser;
use crate::problem::ProblemResponse;
use crate::router::AppState;

#[derive(Debug, Deserialize)]
pub struct TaskBody {
    name: String,
}

pub async fn list(
    State(state): State<AppState>,
    _user: LoggedUser,
) -> Result<Json<Vec<TaskView>>, ProblemResponse> {
    state
        .query_bus()
        .execute(GetTasksQuery)
        .await
        .map(Json)
        .map_err(ProblemResponse::from_query)
}

pub async fn get(
    State(state): State<AppState>,
    _user: LoggedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TaskView>, ProblemResponse> {
    state
        .query_bus()
        .execute(GetTaskByIdQuery { id })
        .await
        .map(Json)
        .map_err(ProblemResponse::from_query)
}

pub async fn create(
    State(state): State<AppState>,
    _user: LoggedUser,
    Json(body): Json<TaskBody>,
) -> Result<(StatusCode, Json<TaskView>), ProblemResponse> {
    let name = required("name", &body.name)?;
    let id = state
        .command_bus()
        .execute(CreateTaskCommand { name })
        .await
        .map_err(ProblemResponse::from_command)?;

    let view = state
        .query_bus()
        .execute(GetTaskByIdQuery { id })
        .await
        .map_err(ProblemResponse::from_query)?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn update(
    State(state): State<AppState>,
    _user: LoggedUser,
    Path(id): Path<Uuid>,
    Json(body): Json<TaskBody>,
) -> Result<Json<TaskView>, ProblemResponse> {
    let name = required("name", &body.name)?;
    state
        .command_bus()
        .execute(UpdateTaskCommand { id, name })
        .await
        .map(Json)
        .map_err(ProblemResponse::from_command)
}
