use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use timetrack_core::repository::CustomerRepository;
use timetrack_core::specification::IsCustomerAlreadyExist;
use timetrack_core::{Customer, DomainError};

use super::{on_conflict, ApplicationError, Clock};
use crate::bus::{Command, CommandHandler, Query, QueryHandler};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerView {
    pub id: Uuid,
    pub name: String,
}

impl From<&Customer> for CustomerView {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id,
            name: customer.name.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateCustomerCommand {
    pub name: String,
}

impl Command for CreateCustomerCommand {
    type Output = Uuid;
    const NAME: &'static str = "CreateCustomerCommand";
}

pub struct CreateCustomerCommandHandler {
    repository: Arc<dyn CustomerRepository>,
    is_customer_already_exist: IsCustomerAlreadyExist,
    clock: Clock,
}

impl CreateCustomerCommandHandler {
    pub fn new(
        repository: Arc<dyn CustomerRepository>,
        is_customer_already_exist: IsCustomerAlreadyExist,
        clock: Clock,
    ) -> Self {
        Self {
            repository,
            is_customer_already_exist,
            clock,
        }
    }
}

#[async_trait]
impl CommandHandler<CreateCustomerCommand> for CreateCustomerCommandHandler {
    async fn execute(&self, command: CreateCustomerCommand) -> Result<Uuid, ApplicationError> {
        if self
            .is_customer_already_exist
            .is_satisfied_by(&command.name)
            .await?
        {
            return Err(DomainError::CustomerAlreadyExist.into());
        }

        let customer = Customer::new(command.name, (self.clock)());
        self.repository.save(&customer)
            .await
            .map_err(on_conflict(DomainError::CustomerAlreadyExist))?;

        Ok(customer.id)
    }
}

#[derive(Debug, Clone)]
pub struct UpdateCustomerCommand {
    pub id: Uuid,
    pub name: String,
}

impl Command for UpdateCustomerCommand {
    type Output = CustomerView;
    const NAME: &'static str = "UpdateCustomerCommand";
}

pub struct UpdateCustomerCommandHandler {
    repository: Arc<dyn CustomerRepository>,
    is_customer_already_exist: IsCustomerAlreadyExist,
    clock: Clock,
}

impl UpdateCustomerCommandHandler {
    pub fn new(
        repository: Arc<dyn CustomerRepository>,
        is_customer_already_exist: IsCustomerAlreadyExist,
        clock: Clock,
    ) -> Self {
        Self {
            repository,
            is_customer_already_exist,
            clock,
        }
    }
}

#[async_trait]
impl CommandHandler<UpdateCustomerCommand> for UpdateCustomerCommandHandler {
    async fn execute(
        &self,
        command: UpdateCustomerCommand,
    ) -> Result<CustomerView, ApplicationError> {
        let mut customer = self
            .repository
            .find_one_by_id(command.id)
            .await?
            .ok_or(DomainError::CustomerNotFound)?;

        // Keeping the current name must not trip the uniqueness rule.
        if customer.name != command.name
            && self
                .is_customer_already_exist
                .is_satisfied_by(&command.name)
                .await?
        {
            return Err(DomainError::CustomerAlreadyExist.into());
        }

        customer.update_name(command.name, (self.clock)());
        self.repository.save(&customer)
            .await
            .map_err(on_conflict(DomainError::CustomerAlreadyExist))?;

        Ok(CustomerView::from(&customer))
    }
}

#[derive(Debug, Clone)]
pub struct GetCustomerByIdQuery {
    pub id: Uuid,
}

impl Query for GetCustomerByIdQuery {
    type Output = CustomerView;
    const NAME: &'static str = "GetCustomerByIdQuery";
}

pub struct GetCustomerByIdQueryHandler {
    repository: Arc<dyn CustomerRepository>,
}

impl GetCustomerByIdQueryHandler {
    pub fn new(repository: Arc<dyn CustomerRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl QueryHandler<GetCustomerByIdQuery> for GetCustomerByIdQueryHandler {
    async fn execute(
        &self,
        query: GetCustomerByIdQuery,
    ) -> Result<CustomerView, ApplicationError> {
        let customer = self
            .repository
            .find_one_by_id(query.id)
            .await?
            .ok_or(DomainError::CustomerNotFound)?;
        Ok(CustomerView::from(&customer))
    }
}

#[derive(Debug, Clone, Default)]
pub struct GetCustomersQuery;

impl Query for GetCustomersQuery {
    type Output = Vec<CustomerView>;
    const NAME: &'static str = "GetCustomersQuery";
}

pub struct GetCustomersQueryHandler {
    repository: Arc<dyn CustomerRepository>,
}

impl GetCustomersQueryHandler {
    pub fn new(repository: Arc<dyn CustomerRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl QueryHandler<GetCustomersQuery> for GetCustomersQueryHandler {
    async fn execute(
        &self,
        _query: GetCustomersQuery,
    ) -> Result<Vec<CustomerView>, ApplicationError> {
        let customers = self.repository.find_all().await?;
        Ok(customers.iter().map(CustomerView::from).collect())
    }
}
