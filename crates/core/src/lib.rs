//! Domain layer of the time tracking service.
//!
//! Entities, domain errors, the repository ports implemented by the storage
//! crate and the business rules checked before every write.

pub mod calendar;
pub mod error;
pub mod repository;
pub mod specification;
pub mod types;

pub use error::{DomainError, ErrorKind, RepositoryError, RepositoryResult};
pub use types::{Activity, Customer, Project, Task, User, MAXIMUM_TIME_SPENT_PER_DAY};

#[cfg(test)]
pub(crate) mod test_support;
