mod actions;
mod application;
mod auth;
mod bus;
mod problem;
mod router;
mod telemetry;

#[cfg(test)]
mod test_support;

use std::net::SocketAddr;

use timetrack_core::DomainError;
use timetrack_storage::Database;
use timetrack_util::{load_env_file, AppConfig, BootstrapUser};
use tokio::signal;
use tracing::{info, warn};

use crate::application::user::CreateUserCommand;
use crate::application::ApplicationError;
use crate::router::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_env_file();
    let config = AppConfig::from_env()?;

    telemetry::init_tracing(&config)?;
    let metrics = telemetry::init_metrics()?;

    let database = Database::connect(&config.database_url).await?;
    database.run_migrations().await?;

    let state = AppState::new(metrics, database);
    if let Some(bootstrap) = &config.bootstrap_user {
        seed_bootstrap_user(&state, bootstrap).await?;
    }

    let app = router::app_router(state).layer(router::cors_layer(&config.cors_origin)?);

    let addr: SocketAddr = config.bind_addr;
    info!(stage = "app", %addr, env = %config.environment.as_str(), "starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| err.into())
}

/// Creates the configured account unless its e-mail is already registered.
async fn seed_bootstrap_user(
    state: &AppState,
    bootstrap: &BootstrapUser,
) -> Result<(), ApplicationError> {
    let command = CreateUserCommand {
        first_name: "Admin".to_string(),
        last_name: "Timetrack".to_string(),
        email: bootstrap.email.trim().to_lowercase(),
        password: bootstrap.password.clone(),
    };
    match state.command_bus().execute(command).await {
        Ok(id) => {
            info!(stage = "app", user_id = %id, email = %bootstrap.email, "bootstrap user created");
            Ok(())
        }
        Err(ApplicationError::Domain(DomainError::EmailAlreadyExist)) => {
            info!(stage = "app", email = %bootstrap.email, "bootstrap user already present");
            Ok(())
        }
        Err(err) => Err(err),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(stage = "app", error = %err, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => warn!(stage = "app", error = %err, "failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!(stage = "app", "shutdown signal received");
}
