use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::required;
use crate::application::project::{
    CreateProjectCommand, GetProjectByIdQuery, GetProjectsQuery, ProjectView,
    UpdateProjectCommand,
};
use crate::auth::LoggedUser;
use crate::problem::ProblemResponse;
use crate::router::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectBody {
    name: String,
    customer_id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectsFilter {
    #[serde(default)]
    customer_id: Option<Uuid>,
}

pub async fn list(
    State(state): State<AppState>,
    _user: LoggedUser,
    Query(filter): Query<ProjectsFilter>,
) -> Result<Json<Vec<ProjectView>>, ProblemResponse> {
    state
        .query_bus()
        .execute(GetProjectsQuery {
            customer_id: filter.customer_id,
        })
        .await
        .map(Json)
        .map_err(ProblemResponse::from_query)
}

pub async fn get(
    State(state): State<AppState>,
    _user: LoggedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectView>, ProblemResponse> {
    state
        .query_bus()
        .execute(GetProjectByIdQuery { id })
        .await
        .map(Json)
        .map_err(ProblemResponse::from_query)
}

pub async fn create(
    State(state): State<AppState>,
    _user: LoggedUser,
    Json(body): Json<ProjectBody>,
) -> Result<(StatusCode, Json<ProjectView>), ProblemResponse> {
    let name = required("name", &body.name)?;
    let id = state
        .command_bus()
        .execute(CreateProjectCommand {
            name,
            customer_id: body.customer_id,
        })
        .await
        .map_err(ProblemResponse::from_command)?;

    let view = state
        .query_bus()
        .execute(GetProjectByIdQuery { id })
        .await
        .map_err(ProblemResponse::from_query)?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn update(
    State(state): State<AppState>,
    _user: LoggedUser,
    Path(id): Path<Uuid>,
    Json(body): Json<ProjectBody>,
) -> Result<Json<ProjectView>, ProblemResponse> {
    let name = required("name", &body.name)?;
    state
        .command_bus()
        .execute(UpdateProjectCommand {
            id,
            name,
            customer_id: body.customer_id,
        })
        .await
        .map(Json)
        .map_err(ProblemResponse::from_command)
}
