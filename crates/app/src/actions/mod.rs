//! Axum handlers translating HTTP requests into commands and queries.
//!
//! Every handler except login requires a [`LoggedUser`](crate::auth::LoggedUser).
//! Bodies are checked for shape here; business rules stay in the handlers.

pub mod activity;
pub mod customer;
pub mod project;
pub mod task;
pub mod user;

use crate::problem::ProblemResponse;

/// Trims `value` and rejects it when nothing is left.
pub(crate) fn required(field: &str, value: &str) -> Result<String, ProblemResponse> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ProblemResponse::validation(format!(
            "{field} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

/// Accepts `local@domain` with no whitespace; the address is lowercased.
pub(crate) fn email(value: &str) -> Result<String, ProblemResponse> {
    let email = required("email", value)?;
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(ProblemResponse::validation("email is not a valid address"));
    }
    Ok(email.to_lowercase())
}

/// Blank optional text counts as absent.
pub(crate) fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
