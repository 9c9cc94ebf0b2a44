use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use timetrack_core::{DomainError, ErrorKind};
use tracing::error;

use crate::application::ApplicationError;

#[derive(Debug, Serialize)]
struct ProblemDetails {
    #[serde(rename = "type")]
    problem_type: &'static str,
    title: &'static str,
    detail: String,
}

#[derive(Debug)]
pub struct ProblemResponse {
    status: StatusCode,
    body: ProblemDetails,
}

impl ProblemResponse {
    pub fn new<S: Into<String>>(status: StatusCode, problem_type: &'static str, detail: S) -> Self {
        Self {
            status,
            body: ProblemDetails {
                problem_type,
                title: status.canonical_reason().unwrap_or("error"),
                detail: detail.into(),
            },
        }
    }

    pub fn validation<S: Into<String>>(detail: S) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation", detail)
    }

    /// Failure of a read: missing resources become 404.
    pub fn from_query(err: ApplicationError) -> Self {
        Self::from_application(err, |kind| match kind {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::AlreadyExists | ErrorKind::Invalid => StatusCode::BAD_REQUEST,
        })
    }

    /// Failure of a write: every business rule violation is a bad request.
    pub fn from_command(err: ApplicationError) -> Self {
        Self::from_application(err, |_| StatusCode::BAD_REQUEST)
    }

    /// Any rejected login is a 401.
    pub fn from_login(err: ApplicationError) -> Self {
        Self::from_application(err, |_| StatusCode::UNAUTHORIZED)
    }

    fn from_application(err: ApplicationError, status_of: fn(ErrorKind) -> StatusCode) -> Self {
        match err {
            ApplicationError::Domain(domain) => Self::from_domain(&domain, status_of(domain.kind())),
            other => {
                error!(stage = "http", error = %other, "request failed");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "an unexpected error occurred",
                )
            }
        }
    }

    fn from_domain(err: &DomainError, status: StatusCode) -> Self {
        Self::new(status, err.key(), err.to_string())
    }

    #[cfg(test)]
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ProblemResponse {
    fn into_response(self) -> Response {
        let mut response = Json(self.body).into_response();
        *response.status_mut() = self.status;
        response.headers_mut().insert(
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderValue::from_static("application/problem+json"),
        );
        response
    }
}
