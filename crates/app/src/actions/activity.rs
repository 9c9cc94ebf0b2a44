use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use super::optional;
use crate::application::activity::{
    ActivityView, AddActivityCommand, DeleteActivityCommand, GetActivitiesByUserAndMonthQuery,
    GetActivityByIdQuery, MonthlyActivitiesView, UpdateActivityCommand,
};
use crate::auth::LoggedUser;
use crate::problem::ProblemResponse;
use crate::router::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityBody {
    date: NaiveDate,
    time: u32,
    #[serde(default)]
    summary: Option<String>,
    project_id: Uuid,
    task_id: Uuid,
}

/// Both fields default to the caller and the current month.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthFilter {
    #[serde(default)]
    user_id: Option<Uuid>,
    #[serde(default)]
    date: Option<NaiveDate>,
}

pub async fn month(
    State(state): State<AppState>,
    LoggedUser(user): LoggedUser,
    Query(filter): Query<MonthFilter>,
) -> Result<Json<MonthlyActivitiesView>, ProblemResponse> {
    let query = GetActivitiesByUserAndMonthQuery {
        user_id: filter.user_id.unwrap_or(user.id),
        date: filter.date.unwrap_or_else(|| state.now().date_naive()),
    };
    state
        .query_bus()
        .execute(query)
        .await
        .map(Json)
        .map_err(ProblemResponse::from_command)
}

pub async fn get(
    State(state): State<AppState>,
    _user: LoggedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ActivityView>, ProblemResponse> {
    state
        .query_bus()
        .execute(GetActivityByIdQuery { id })
        .await
        .map(Json)
        .map_err(ProblemResponse::from_query)
}

pub async fn add(
    State(state): State<AppState>,
    LoggedUser(user): LoggedUser,
    Json(body): Json<ActivityBody>,
) -> Result<(StatusCode, Json<ActivityView>), ProblemResponse> {
    let id = state
        .command_bus()
        .execute(AddActivityCommand {
            user_id: user.id,
            date: body.date,
            time: body.time,
            summary: optional(body.summary),
            project_id: body.project_id,
            task_id: body.task_id,
        })
        .await
        .map_err(ProblemResponse::from_command)?;

    let view = state
        .query_bus()
        .execute(GetActivityByIdQuery { id })
        .await
        .map_err(ProblemResponse::from_query)?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn update(
    State(state): State<AppState>,
    LoggedUser(user): LoggedUser,
    Path(id): Path<Uuid>,
    Json(body): Json<ActivityBody>,
) -> Result<Json<ActivityView>, ProblemResponse> {
    state
        .command_bus()
        .execute(UpdateActivityCommand {
            id,
            user_id: user.id,
            date: body.date,
            time: body.time,
            summary: optional(body.summary),
            project_id: body.project_id,
            task_id: body.task_id,
        })
        .await
        .map(Json)
        .map_err(ProblemResponse::from_command)
}

pub async fn delete(
    State(state): State<AppState>,
    LoggedUser(user): LoggedUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ProblemResponse> {
    state
        .command_bus()
        .execute(DeleteActivityCommand {
            id,
            user_id: user.id,
        })
        .await
        .map_err(ProblemResponse::from_command)?;
    Ok(StatusCode::NO_CONTENT)
}
