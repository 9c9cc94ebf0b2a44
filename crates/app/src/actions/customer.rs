use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::required;
use crate::application::customer::{
    CreateCustomerCommand, CustomerView, GetCustomerByIdQuery, GetCustomersQuery,
    UpdateCustomerCommand,
};
use crate::auth::LoggedUser;
use crate::problem::ProblemResponse;
use crate::router::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerBody {
    name: String,
}

pub async fn list(
    State(state): State<AppState>,
    _user: LoggedUser,
) -> Result<Json<Vec<CustomerView>>, ProblemResponse> {
    state
        .query_bus()
        .execute(GetCustomersQuery)
        .await
        .map(Json)
        .map_err(ProblemResponse::from_query)
}

pub async fn get(
    State(state): State<AppState>,
    _user: LoggedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CustomerView>, ProblemResponse> {
    state
        .query_bus()
        .execute(GetCustomerByIdQuery { id })
        .await
        .map(Json)
        .map_err(ProblemResponse::from_query)
}

pub async fn create(
    State(state): State<AppState>,
    _user: LoggedUser,
    Json(body): Json<CustomerBody>,
) -> Result<(StatusCode, Json<CustomerView>), ProblemResponse> {
    let name = required("name", &body.name)?;
    let id = state
        .command_bus()
        .execute(CreateCustomerCommand { name })
        .await
        .map_err(ProblemResponse::from_command)?;

    let view = state
        .query_bus()
        .execute(GetCustomerByIdQuery { id })
        .await
        .map_err(ProblemResponse::from_query)?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn update(
    State(state): State<AppState>,
    _user: LoggedUser,
    Path(id): Path<Uuid>,
    Json(body): Json<CustomerBody>,
) -> Result<Json<CustomerView>, ProblemResponse> {
    let name = required("name", &body.name)?;
    state
        .command_bus()
        .execute(UpdateCustomerCommand { id, name })
        .await
        .map(Json)
        .map_err(ProblemResponse::from_command)
}
