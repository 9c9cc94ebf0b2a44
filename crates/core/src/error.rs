use std::fmt;

use thiserror::Error;

/// Broad category of a domain error, used by the HTTP layer to pick a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    Invalid,
    Unauthorized,
}

/// Business rule violations raised by command and query handlers.
///
/// The display string is the translation key the web client renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    CustomerNotFound,
    CustomerAlreadyExist,
    ProjectNotFound,
    ProjectAlreadyExist,
    TaskNotFound,
    TaskAlreadyExist,
    UserNotFound,
    EmailAlreadyExist,
    PasswordNotMatch,
    ActivityNotFound,
    NotActivityOwner,
    MaximumTimeSpentReached,
    InvalidTimeSpent,
}

impl DomainError {
    /// Stable translation key, also used as the display string.
    pub fn key(&self) -> &'static str {
        match self {
            Self::CustomerNotFound => "customer.errors.not_found",
            Self::CustomerAlreadyExist => "customer.errors.already_exist",
            Self::ProjectNotFound => "project.errors.not_found",
            Self::ProjectAlreadyExist => "project.errors.already_exist",
            Self::TaskNotFound => "task.errors.not_found",
            Self::TaskAlreadyExist => "task.errors.already_exist",
            Self::UserNotFound => "user.errors.not_found",
            Self::EmailAlreadyExist => "user.errors.email_already_exist",
            Self::PasswordNotMatch => "user.errors.password_not_match",
            Self::ActivityNotFound => "activity.errors.not_found",
            Self::NotActivityOwner => "activity.errors.not_owner",
            Self::MaximumTimeSpentReached => "activity.errors.max_time_reached",
            Self::InvalidTimeSpent => "activity.errors.invalid_time",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CustomerNotFound
            | Self::ProjectNotFound
            | Self::TaskNotFound
            | Self::UserNotFound
            | Self::ActivityNotFound => ErrorKind::NotFound,
            Self::CustomerAlreadyExist
            | Self::ProjectAlreadyExist
            | Self::TaskAlreadyExist
            | Self::EmailAlreadyExist => ErrorKind::AlreadyExists,
            Self::PasswordNotMatch => ErrorKind::Unauthorized,
            Self::NotActivityOwner | Self::MaximumTimeSpentReached | Self::InvalidTimeSpent => {
                ErrorKind::Invalid
            }
        }
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl std::error::Error for DomainError {}

/// Persistence failure reported through a repository port.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("stored record is corrupt: {0}")]
    Corrupt(String),
    /// A unique index rejected the write.
    #[error("unique constraint violated: {0}")]
    Conflict(String),
    #[error("storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl RepositoryError {
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend(Box::new(err))
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_translation_key() {
        let errors = [
            DomainError::CustomerNotFound,
            DomainError::CustomerAlreadyExist,
            DomainError::ProjectNotFound,
            DomainError::ProjectAlreadyExist,
            DomainError::TaskNotFound,
            DomainError::TaskAlreadyExist,
            DomainError::UserNotFound,
            DomainError::EmailAlreadyExist,
            DomainError::PasswordNotMatch,
            DomainError::ActivityNotFound,
            DomainError::NotActivityOwner,
            DomainError::MaximumTimeSpentReached,
            DomainError::InvalidTimeSpent,
        ];

        for err in errors {
            assert_eq!(err.to_string(), err.key());
        }
    }

    #[test]
    fn customer_errors_use_expected_keys() {
        assert_eq!(DomainError::CustomerNotFound.key(), "customer.errors.not_found");
        assert_eq!(
            DomainError::CustomerAlreadyExist.key(),
            "customer.errors.already_exist"
        );
    }

    #[test]
    fn kinds_group_not_found_and_duplicates() {
        assert_eq!(DomainError::TaskNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(DomainError::EmailAlreadyExist.kind(), ErrorKind::AlreadyExists);
        assert_eq!(DomainError::PasswordNotMatch.kind(), ErrorKind::Unauthorized);
        assert_eq!(DomainError::MaximumTimeSpentReached.kind(), ErrorKind::Invalid);
    }
}
