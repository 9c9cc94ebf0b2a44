//! Typed command and query buses.
//!
//! Handlers are registered once per message type at start-up; dispatch looks
//! the handler up by the message's `TypeId`. Every dispatch is traced and
//! counted.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::Arc,
    time::Instant,
};

use async_trait::async_trait;
use metrics::{counter, histogram};
use tracing::{debug, warn};

use crate::application::ApplicationError;

/// A write operation. `Output` is what the handler hands back on success.
pub trait Command: Send + 'static {
    type Output: Send + 'static;
    const NAME: &'static str;
}

/// A read operation.
pub trait Query: Send + 'static {
    type Output: Send + 'static;
    const NAME: &'static str;
}

#[async_trait]
pub trait CommandHandler<C: Command>: Send + Sync {
    async fn execute(&self, command: C) -> Result<C::Output, ApplicationError>;
}

#[async_trait]
pub trait QueryHandler<Q: Query>: Send + Sync {
    async fn execute(&self, query: Q) -> Result<Q::Output, ApplicationError>;
}

#[derive(Default)]
struct HandlerRegistry {
    handlers: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl HandlerRegistry {
    fn insert<M: 'static, H: Send + Sync + 'static>(&mut self, handler: H) {
        self.handlers.insert(TypeId::of::<M>(), Box::new(handler));
    }

    fn get<M: 'static, H: Clone + 'static>(&self) -> Option<H> {
        self.handlers
            .get(&TypeId::of::<M>())
            .and_then(|entry| entry.downcast_ref::<H>())
            .cloned()
    }
}

/// Dispatches commands to their registered handler.
#[derive(Clone, Default)]
pub struct CommandBus {
    registry: Arc<HandlerRegistry>,
}

impl CommandBus {
    pub fn builder() -> CommandBusBuilder {
        CommandBusBuilder::default()
    }

    pub async fn execute<C: Command>(&self, command: C) -> Result<C::Output, ApplicationError> {
        let handler = self
            .registry
            .get::<C, Arc<dyn CommandHandler<C>>>()
            .ok_or(ApplicationError::UnregisteredHandler(C::NAME))?;

        let start = Instant::now();
        let result = handler.execute(command).await;
        observe("command", C::NAME, &result, start);
        result
    }
}

#[derive(Default)]
pub struct CommandBusBuilder {
    registry: HandlerRegistry,
}

impl CommandBusBuilder {
    pub fn register<C, H>(mut self, handler: H) -> Self
    where
        C: Command,
        H: CommandHandler<C> + 'static,
    {
        let handler: Arc<dyn CommandHandler<C>> = Arc::new(handler);
        self.registry.insert::<C, _>(handler);
        self
    }

    pub fn build(self) -> CommandBus {
        CommandBus {
            registry: Arc::new(self.registry),
        }
    }
}

/// Dispatches queries to their registered handler.
#[derive(Clone, Default)]
pub struct QueryBus {
    registry: Arc<HandlerRegistry>,
}

impl QueryBus {
    pub fn builder() -> QueryBusBuilder {
        QueryBusBuilder::default()
    }

    pub async fn execute<Q: Query>(&self, query: Q) -> Result<Q::Output, ApplicationError> {
        let handler = self
            .registry
            .get::<Q, Arc<dyn QueryHandler<Q>>>()
            .ok_or(ApplicationError::UnregisteredHandler(Q::NAME))?;

        let start = Instant::now();
        let result = handler.execute(query).await;
        observe("query", Q::NAME, &result, start);
        result
    }
}

#[derive(Default)]
pub struct QueryBusBuilder {
    registry: HandlerRegistry,
}

impl QueryBusBuilder {
    pub fn register<Q, H>(mut self, handler: H) -> Self
    where
        Q: Query,
        H: QueryHandler<Q> + 'static,
    {
        let handler: Arc<dyn QueryHandler<Q>> = Arc::new(handler);
        self.registry.insert::<Q, _>(handler);
        self
    }

    pub fn build(self) -> QueryBus {
        QueryBus {
            registry: Arc::new(self.registry),
        }
    }
}

fn observe<T>(
    bus: &'static str,
    name: &'static str,
    result: &Result<T, ApplicationError>,
    start: Instant,
) {
    let elapsed = start.elapsed().as_secs_f64();
    histogram!("bus_handler_duration_seconds", "bus" => bus, "name" => name).record(elapsed);

    let outcome = match result {
        Ok(_) => {
            debug!(stage = "bus", bus, name, elapsed, "message handled");
            "ok"
        }
        Err(ApplicationError::Domain(err)) => {
            debug!(stage = "bus", bus, name, error = %err, "message rejected");
            "rejected"
        }
        Err(err) => {
            warn!(stage = "bus", bus, name, error = %err, "message failed");
            "error"
        }
    };
    counter!("bus_messages_total", "bus" => bus, "name" => name, "result" => outcome).increment(1);
}
