use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use timetrack_core::repository::PasswordEncoder;
use timetrack_storage::Database;
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::actions::{activity, customer, project, task, user};
use crate::application::{self, Clock, Repositories};
use crate::auth::Argon2PasswordEncoder;
use crate::bus::{CommandBus, QueryBus};
use crate::telemetry;

#[derive(Clone)]
pub struct AppState {
    metrics: PrometheusHandle,
    storage: Database,
    clock: Clock,
    command_bus: CommandBus,
    query_bus: QueryBus,
}

impl AppState {
    pub fn new(metrics: PrometheusHandle, storage: Database) -> Self {
        Self::assemble(metrics, storage, Arc::new(Utc::now))
    }

    fn assemble(metrics: PrometheusHandle, storage: Database, clock: Clock) -> Self {
        let repositories = Repositories::from_database(&storage);
        let password_encoder: Arc<dyn PasswordEncoder> = Arc::new(Argon2PasswordEncoder);
        let command_bus =
            application::command_bus(&repositories, password_encoder.clone(), clock.clone());
        let query_bus = application::query_bus(&repositories, password_encoder);
        Self {
            metrics,
            storage,
            clock,
            command_bus,
            query_bus,
        }
    }

    #[cfg(test)]
    pub fn with_clock(self, clock: Clock) -> Self {
        Self::assemble(self.metrics, self.storage, clock)
    }

    pub fn metrics(&self) -> &PrometheusHandle {
        &self.metrics
    }

    pub fn storage(&self) -> &Database {
        &self.storage
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    pub fn command_bus(&self) -> &CommandBus {
        &self.command_bus
    }

    pub fn query_bus(&self) -> &QueryBus {
        &self.query_bus
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .route("/login", post(user::login))
        .route("/users", get(user::list).post(user::create))
        .route("/users/me", get(user::me).put(user::update_profile))
        .route("/users/:id", get(user::get))
        .route("/customers", get(customer::list).post(customer::create))
        .route("/customers/:id", get(customer::get).put(customer::update))
        .route("/projects", get(project::list).post(project::create))
        .route("/projects/:id", get(project::get).put(project::update))
        .route("/tasks", get(task::list).post(task::create))
        .route("/tasks/:id", get(task::get).put(task::update))
        .route("/activities", get(activity::month).post(activity::add))
        .route(
            "/activities/:id",
            get(activity::get)
                .put(activity::update)
                .delete(activity::delete),
        )
        .with_state(state)
}

/// Lets the web client at `origin` call the API with a bearer token.
pub fn cors_layer(origin: &str) -> Result<CorsLayer, header::InvalidHeaderValue> {
    let origin = HeaderValue::from_str(origin)?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]))
}

async fn healthz(State(state): State<AppState>) -> StatusCode {
    match state.storage().ping().await {
        Ok(()) => StatusCode::OK,
        Err(err) => {
            warn!(stage = "http", error = %err, "health check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = telemetry::render_metrics(state.metrics());
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
}
